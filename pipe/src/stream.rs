//! Backpressured byte stream over a [`Buffer`].

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use bytes::{Buf, Bytes};
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, trace};

use crate::buffer::Buffer;
use crate::error::{Error, Result};

/// A bounded in-process byte pipe with suspending reads and writes.
///
/// `Stream<B>` wraps a [`Buffer`] and turns its best-effort operations into
/// operations that wait for data or space. Clones share the same stream, so
/// one clone can be moved into a producer task and another into a consumer.
///
/// # Semantics
///
/// - **Read**: drains stored bytes, then bytes of queued writes in submission
///   order. Suspends only when nothing is available, and then resolves on
///   the very next write with whatever part of it fits.
/// - **Write**: hands bytes to a waiting reader first, then to the buffer.
///   Whatever the buffer does not accept is queued and delivered to later
///   reads, oldest write first.
/// - **Close**: wakes every pending operation. Reads observe end of stream
///   (`None`), writes fail with [`Error::Closed`].
///
/// With a [`RingBuffer`](crate::RingBuffer) writes never wait because the
/// buffer always accepts by evicting old bytes. Use a
/// [`StrictRingBuffer`](crate::StrictRingBuffer) for backpressure.
///
/// # Cancellation
///
/// Dropping a suspended `write` abandons the part of its payload that was
/// not delivered yet. Dropping a suspended `read` releases its slot; bytes
/// already handed to it are kept and returned first by the next read.
///
/// # Example
///
/// ```
/// use giztoy_pipe::{Stream, StrictRingBuffer};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> giztoy_pipe::Result<()> {
/// let stream = Stream::new(StrictRingBuffer::new(4));
/// let producer = stream.clone();
///
/// let writer = tokio::spawn(async move {
///     // Only 4 bytes fit; the rest waits for the reader.
///     producer.write(b"hello pipe".to_vec()).await
/// });
///
/// let mut out = Vec::new();
/// let mut chunk = [0u8; 3];
/// while out.len() < 10 {
///     let n = stream.read(&mut chunk).await.unwrap_or(0);
///     out.extend_from_slice(&chunk[..n]);
/// }
///
/// assert_eq!(writer.await.unwrap()?, 10);
/// assert_eq!(out, b"hello pipe");
/// # Ok(())
/// # }
/// ```
pub struct Stream<B> {
    inner: Arc<StreamInner<B>>,
}

struct StreamInner<B> {
    state: Mutex<StreamState<B>>,
    // Serializes suspending reads so at most one read task is pending.
    read_gate: tokio::sync::Mutex<()>,
}

struct StreamState<B> {
    buffer: B,
    closed: bool,
    pending_read: Option<ReadTask>,
    pending_writes: VecDeque<WriteTask>,
    // Bytes delivered to a read that was dropped before it claimed them.
    unclaimed: Option<Bytes>,
}

/// A suspended read, satisfied by exactly one delivery.
struct ReadTask {
    want: usize,
    tx: oneshot::Sender<Bytes>,
}

impl ReadTask {
    /// Hands up to `want` bytes of `src` to the reader.
    ///
    /// Returns 0 if the reader is gone, in which case nothing was consumed.
    fn deliver(self, src: &[u8]) -> usize {
        let n = self.want.min(src.len());
        match self.tx.send(Bytes::copy_from_slice(&src[..n])) {
            Ok(()) => n,
            Err(_) => 0,
        }
    }
}

/// The receiving side of a registered [`ReadTask`].
///
/// If the read future is dropped while waiting, bytes that were already sent
/// to it are parked in the stream instead of being lost.
struct PendingRead<'a, B> {
    state: &'a Mutex<StreamState<B>>,
    rx: Option<oneshot::Receiver<Bytes>>,
}

impl<B> PendingRead<'_, B> {
    async fn recv(&mut self) -> Option<Bytes> {
        let rx = self.rx.as_mut()?;
        let data = rx.await.ok();
        self.rx = None;
        data
    }
}

impl<B> Drop for PendingRead<'_, B> {
    fn drop(&mut self) {
        let Some(mut rx) = self.rx.take() else {
            return;
        };

        let mut state = self.state.lock();
        match rx.try_recv() {
            Ok(data) => {
                trace!(n = data.len(), "dropped read parked delivered bytes");
                state.unclaimed = Some(match state.unclaimed.take() {
                    Some(prev) => {
                        let mut joined = prev.to_vec();
                        joined.extend_from_slice(&data);
                        Bytes::from(joined)
                    }
                    None => data,
                });
            }
            Err(_) => {
                // Still registered; the read gate guarantees the slot is ours.
                state.pending_read = None;
            }
        }
    }
}

/// A suspended write holding the not yet accepted tail of its payload.
struct WriteTask {
    remaining: Bytes,
    accepted: usize,
    tx: oneshot::Sender<usize>,
}

impl WriteTask {
    fn drain_into(&mut self, dst: &mut [u8]) -> usize {
        let n = dst.len().min(self.remaining.len());
        dst[..n].copy_from_slice(&self.remaining[..n]);
        self.consume(n);
        n
    }

    fn flush_into<B: Buffer>(&mut self, buffer: &mut B) -> usize {
        let n = buffer.write(&self.remaining).min(self.remaining.len());
        self.consume(n);
        n
    }

    fn consume(&mut self, n: usize) {
        self.remaining.advance(n);
        self.accepted += n;
    }

    fn is_done(&self) -> bool {
        self.remaining.is_empty()
    }

    fn is_abandoned(&self) -> bool {
        self.tx.is_closed()
    }

    fn complete(self) {
        let _ = self.tx.send(self.accepted);
    }
}

impl<B> Clone for Stream<B> {
    fn clone(&self) -> Self {
        Stream {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: Buffer> StreamState<B> {
    fn try_read(&mut self, dst: &mut [u8]) -> Option<usize> {
        if self.closed {
            return None;
        }
        self.prune_abandoned();

        // Parked bytes are older than anything in the buffer.
        let mut n = 0;
        if let Some(mut parked) = self.unclaimed.take() {
            n = parked.len().min(dst.len());
            dst[..n].copy_from_slice(&parked[..n]);
            parked.advance(n);
            if !parked.is_empty() {
                self.unclaimed = Some(parked);
            }
        }

        let StreamState {
            buffer,
            pending_writes,
            ..
        } = self;

        n += buffer.read(&mut dst[n..]);

        // Completed writes always form a prefix of the queue.
        let mut completed = 0;
        for task in pending_writes.iter_mut() {
            if n == dst.len() {
                break;
            }
            n += task.drain_into(&mut dst[n..]);
            if !task.is_done() {
                break;
            }
            completed += 1;
        }

        // Move as much of the backlog as fits into the freed space.
        for task in pending_writes.iter_mut().skip(completed) {
            task.flush_into(buffer);
            if !task.is_done() {
                break;
            }
            completed += 1;
        }

        for task in pending_writes.drain(..completed) {
            task.complete();
        }
        if completed > 0 {
            trace!(completed, "pending writes completed");
        }

        Some(n)
    }

    fn try_write(&mut self, src: &[u8]) -> Result<usize> {
        if self.closed {
            return Err(Error::Closed);
        }
        if src.is_empty() {
            return Ok(0);
        }
        self.prune_abandoned();

        let mut n = 0;
        if let Some(task) = self.pending_read.take() {
            n = task.deliver(src);
            trace!(delivered = n, "write handed bytes to pending read");
        }

        // Earlier writes still waiting keep their place in line.
        if !self.pending_writes.is_empty() {
            return Ok(n);
        }

        n += self.buffer.write(&src[n..]);
        Ok(n)
    }

    fn prune_abandoned(&mut self) {
        self.pending_writes.retain(|task| !task.is_abandoned());
    }
}

impl<B: Buffer> Stream<B> {
    /// Creates a new Stream that owns `buffer`.
    pub fn new(buffer: B) -> Self {
        debug!(capacity = buffer.capacity(), "stream created");
        Stream {
            inner: Arc::new(StreamInner {
                state: Mutex::new(StreamState {
                    buffer,
                    closed: false,
                    pending_read: None,
                    pending_writes: VecDeque::new(),
                    unclaimed: None,
                }),
                read_gate: tokio::sync::Mutex::new(()),
            }),
        }
    }

    /// Returns the capacity of the underlying buffer.
    pub fn capacity(&self) -> usize {
        self.inner.state.lock().buffer.capacity()
    }

    /// Returns the number of bytes ready to be read without waiting.
    ///
    /// This is what the underlying buffer holds plus bytes left over by a
    /// dropped read. Bytes of queued writes are not counted.
    pub fn len(&self) -> usize {
        let state = self.inner.state.lock();
        state.buffer.len() + state.unclaimed.as_ref().map_or(0, Bytes::len)
    }

    /// Returns true if no bytes are ready to be read.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of writes waiting for space.
    pub fn pending_writes(&self) -> usize {
        self.inner
            .state
            .lock()
            .pending_writes
            .iter()
            .filter(|task| !task.is_abandoned())
            .count()
    }

    /// Returns true if a read is waiting for the next write.
    pub fn has_pending_read(&self) -> bool {
        self.inner.state.lock().pending_read.is_some()
    }

    /// Returns true once the stream has been closed.
    pub fn is_closed(&self) -> bool {
        self.inner.state.lock().closed
    }

    /// Closes the stream.
    ///
    /// A pending read resolves to `None` and every pending write fails with
    /// [`Error::Closed`]. Calling `close` again does nothing.
    pub fn close(&self) {
        let (read, writes) = {
            let mut state = self.inner.state.lock();
            if state.closed {
                return;
            }
            state.closed = true;
            (
                state.pending_read.take(),
                std::mem::take(&mut state.pending_writes),
            )
        };

        debug!(
            aborted_reads = usize::from(read.is_some()),
            aborted_writes = writes.len(),
            "stream closed"
        );

        // Dropping the completion handles wakes the waiters.
        drop(read);
        drop(writes);
    }

    /// Reads whatever is available without waiting.
    ///
    /// Returns the number of bytes copied into `dst`, possibly 0, or `None`
    /// if the stream is closed.
    pub fn try_read(&self, dst: &mut [u8]) -> Option<usize> {
        self.inner.state.lock().try_read(dst)
    }

    /// Reads into `dst`, waiting for a write if nothing is available.
    ///
    /// Returns `Some(n)` with `n > 0` once bytes were copied, or `None` if
    /// the stream is closed. A waiting read resolves on the next write even
    /// if that write is smaller than `dst`. An empty `dst` returns
    /// `Some(0)` immediately.
    pub async fn read(&self, dst: &mut [u8]) -> Option<usize> {
        let _gate = self.inner.read_gate.lock().await;

        let mut pending = {
            let mut state = self.inner.state.lock();
            let n = state.try_read(dst)?;
            if n > 0 || dst.is_empty() {
                return Some(n);
            }

            let (tx, rx) = oneshot::channel();
            state.pending_read = Some(ReadTask {
                want: dst.len(),
                tx,
            });
            PendingRead {
                state: &self.inner.state,
                rx: Some(rx),
            }
        };

        trace!(want = dst.len(), "read suspended");
        let data = pending.recv().await?;
        dst[..data.len()].copy_from_slice(&data);
        trace!(n = data.len(), "read resumed");
        Some(data.len())
    }

    /// Writes as much of `src` as possible without waiting.
    ///
    /// Returns the number of bytes accepted, which may be less than
    /// `src.len()` when the buffer refuses bytes or earlier writes are still
    /// queued.
    pub fn try_write(&self, src: &[u8]) -> Result<usize> {
        self.inner.state.lock().try_write(src)
    }

    /// Writes all of `src`, waiting for readers to make room if needed.
    ///
    /// Returns the number of bytes accepted, which is `src.len()` on
    /// success. Fails with [`Error::Closed`] if the stream is closed before
    /// or while waiting.
    pub async fn write(&self, src: impl Into<Bytes>) -> Result<usize> {
        let mut src: Bytes = src.into();
        let total = src.len();

        let rx = {
            let mut state = self.inner.state.lock();
            let n = state.try_write(&src)?;
            if n == total {
                return Ok(total);
            }

            src.advance(n);
            let (tx, rx) = oneshot::channel();
            state.pending_writes.push_back(WriteTask {
                remaining: src,
                accepted: n,
                tx,
            });
            rx
        };

        trace!(total, "write suspended");
        rx.await.map_err(|_| Error::Closed)
    }
}

impl<B: Buffer> fmt::Debug for Stream<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Stream")
            .field("capacity", &state.buffer.capacity())
            .field("len", &state.buffer.len())
            .field("closed", &state.closed)
            .field("pending_read", &state.pending_read.is_some())
            .field("pending_writes", &state.pending_writes.len())
            .finish()
    }
}
