//! Non-overwriting ring buffer.

use crate::buffer::Buffer;
use crate::ring_buffer::RingStore;

/// A fixed-size byte ring that never overwrites unread data.
///
/// A write larger than the free space is truncated to what fits and the
/// returned count says how much was accepted; the rest of the input is left
/// to the caller. A full buffer accepts nothing.
///
/// This is the policy that gives a [`Stream`](crate::Stream) backpressure.
///
/// # Example
///
/// ```
/// use giztoy_pipe::{Buffer, StrictRingBuffer};
///
/// let mut buf = StrictRingBuffer::new(5);
/// assert_eq!(buf.write(&[42, 32, 28, 31, 17, 41, 53]), 5);
/// assert_eq!(buf.write(&[1]), 0);
/// ```
#[derive(Debug, Clone)]
pub struct StrictRingBuffer {
    store: RingStore,
}

impl StrictRingBuffer {
    /// Creates a new StrictRingBuffer with the specified capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0.
    pub fn new(capacity: usize) -> Self {
        StrictRingBuffer {
            store: RingStore::new(capacity),
        }
    }

    /// Discards all unread bytes.
    pub fn clear(&mut self) {
        self.store.clear();
    }

    /// Returns a copy of the unread bytes without consuming them.
    pub fn to_vec(&self) -> Vec<u8> {
        self.store.to_vec()
    }
}

impl Buffer for StrictRingBuffer {
    fn capacity(&self) -> usize {
        self.store.capacity()
    }

    fn len(&self) -> usize {
        self.store.len()
    }

    fn read(&mut self, dst: &mut [u8]) -> usize {
        self.store.read(dst)
    }

    fn write(&mut self, src: &[u8]) -> usize {
        let space = self.store.capacity() - self.store.len();
        let n = src.len().min(space);
        if n == 0 {
            return 0;
        }

        self.store.append(&src[..n]);
        n
    }
}
