//! Bounded in-process byte pipe.
//!
//! This crate pairs a fixed-capacity circular byte buffer with an async
//! [`Stream`] that turns it into a backpressured pipe between producers and
//! consumers running on independent tasks.
//!
//! - [`RingBuffer`]: fixed-size ring that overwrites the oldest bytes when full
//! - [`StrictRingBuffer`]: fixed-size ring that accepts only what fits
//! - [`Stream<B>`]: suspending `read`/`write` over any [`Buffer`]
//!
//! # Buffers
//!
//! Buffers are plain synchronous data structures. They never block and never
//! fail; a short count is the only signal that not everything was moved.
//!
//! ```
//! use giztoy_pipe::{Buffer, RingBuffer, StrictRingBuffer};
//!
//! let mut ring = RingBuffer::new(3);
//! assert_eq!(ring.write(&[1, 2, 3, 4, 5]), 5); // keeps 3, 4, 5
//! assert_eq!(ring.to_vec(), vec![3, 4, 5]);
//!
//! let mut strict = StrictRingBuffer::new(3);
//! assert_eq!(strict.write(&[1, 2, 3, 4, 5]), 3); // keeps 1, 2, 3
//! assert_eq!(strict.to_vec(), vec![1, 2, 3]);
//! ```
//!
//! # Streams
//!
//! A [`Stream`] waits instead of coming up short: a read on an empty stream
//! resolves on the next write, and a write that does not fit is queued until
//! readers make room. Queued writes are served strictly in submission order.
//!
//! ```
//! use giztoy_pipe::{Policy, StreamConfig};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> giztoy_pipe::Result<()> {
//! let stream = StreamConfig::new(1024).with_policy(Policy::Strict).build()?;
//!
//! stream.write(&b"hello"[..]).await?;
//!
//! let mut data = [0u8; 16];
//! let n = stream.read(&mut data).await.unwrap_or(0);
//! assert_eq!(&data[..n], b"hello");
//! # Ok(())
//! # }
//! ```
//!
//! # Closing Streams
//!
//! [`Stream::close`] is final and wakes every pending operation. Reads then
//! return `None` (end of stream) while writes fail with [`Error::Closed`].
//!
//! # Thread Safety
//!
//! `Stream<B>` is `Send + Sync` for any `B: Buffer + Send` and can be shared
//! between tasks and threads using `Clone` (which shares the underlying
//! stream via `Arc`).

mod buffer;
mod config;
mod error;
mod ring_buffer;
mod sizes;
mod stream;
mod strict_buffer;

pub use buffer::Buffer;
pub use config::{DynBuffer, Policy, StreamConfig};
pub use error::{Error, Result};
pub use ring_buffer::RingBuffer;
pub use sizes::*;
pub use stream::Stream;
pub use strict_buffer::StrictRingBuffer;
