//! Fixed-size byte ring and its overwriting policy.

use tracing::trace;

use crate::buffer::Buffer;

/// Live region of the ring: `length` bytes starting at `offset`, wrapping
/// modulo the capacity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Window {
    offset: usize,
    length: usize,
}

/// Contiguous storage plus the window describing unread bytes.
///
/// This is the data-movement core shared by [`RingBuffer`] and
/// [`StrictRingBuffer`](crate::StrictRingBuffer). It does no capacity policy
/// of its own: callers decide how much to insert and whether to evict.
#[derive(Debug, Clone)]
pub(crate) struct RingStore {
    buf: Box<[u8]>,
    window: Window,
}

impl RingStore {
    pub(crate) fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be greater than 0");
        RingStore {
            buf: vec![0; capacity].into_boxed_slice(),
            window: Window::default(),
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.window.length
    }

    pub(crate) fn read(&mut self, dst: &mut [u8]) -> usize {
        let n = self.peek(dst);
        self.window.offset = (self.window.offset + n) % self.capacity();
        self.window.length -= n;
        n
    }

    /// Copies the oldest bytes into `dst` without consuming them.
    pub(crate) fn peek(&self, dst: &mut [u8]) -> usize {
        let n = self.window.length.min(dst.len());
        let offset = self.window.offset;

        // Tail of storage first, then wrap to the head.
        let first = n.min(self.capacity() - offset);
        dst[..first].copy_from_slice(&self.buf[offset..offset + first]);
        if n > first {
            dst[first..n].copy_from_slice(&self.buf[..n - first]);
        }
        n
    }

    /// Copies `src` right after the live region and grows the window.
    ///
    /// `src` must not be longer than the capacity. The window length may
    /// exceed the capacity afterwards; the caller evicts or guarantees it
    /// cannot.
    pub(crate) fn append(&mut self, src: &[u8]) {
        debug_assert!(src.len() <= self.capacity());
        let capacity = self.capacity();
        let beg = (self.window.offset + self.window.length) % capacity;

        let first = src.len().min(capacity - beg);
        self.buf[beg..beg + first].copy_from_slice(&src[..first]);
        if src.len() > first {
            self.buf[..src.len() - first].copy_from_slice(&src[first..]);
        }
        self.window.length += src.len();
    }

    /// Drops the oldest bytes until the window fits the capacity.
    ///
    /// Returns the number of evicted bytes.
    pub(crate) fn evict_overflow(&mut self) -> usize {
        let capacity = self.capacity();
        if self.window.length <= capacity {
            return 0;
        }
        let over = self.window.length - capacity;
        self.window = Window {
            offset: (self.window.offset + over) % capacity,
            length: capacity,
        };
        over
    }

    /// Replaces the whole content with the last `capacity` bytes of `src`.
    pub(crate) fn fill_from_tail(&mut self, src: &[u8]) {
        let capacity = self.capacity();
        debug_assert!(src.len() >= capacity);
        self.buf.copy_from_slice(&src[src.len() - capacity..]);
        self.window = Window {
            offset: 0,
            length: capacity,
        };
    }

    pub(crate) fn clear(&mut self) {
        self.window = Window::default();
    }

    pub(crate) fn to_vec(&self) -> Vec<u8> {
        let mut out = vec![0; self.window.length];
        self.peek(&mut out);
        out
    }
}

/// A fixed-size byte ring that overwrites the oldest data when full.
///
/// Writes never come up short: when there is not enough free space the oldest
/// unread bytes are evicted. A write at least as large as the capacity resets
/// the ring to the final `capacity` bytes of that write.
///
/// `write` always returns the requested length, including the bytes that were
/// discarded to make room.
///
/// # Example
///
/// ```
/// use giztoy_pipe::{Buffer, RingBuffer};
///
/// let mut buf = RingBuffer::new(5);
/// assert_eq!(buf.write(&[42, 32, 28, 31, 17]), 5);
/// assert_eq!(buf.write(&[41, 53]), 2); // evicts 42, 32
///
/// let mut data = [0u8; 5];
/// assert_eq!(buf.read(&mut data), 5);
/// assert_eq!(data, [28, 31, 17, 41, 53]);
/// ```
#[derive(Debug, Clone)]
pub struct RingBuffer {
    store: RingStore,
}

impl RingBuffer {
    /// Creates a new RingBuffer with the specified capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0.
    pub fn new(capacity: usize) -> Self {
        RingBuffer {
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

impl Buffer for RingBuffer {
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
        if src.len() >= self.store.capacity() {
            self.store.fill_from_tail(src);
            return src.len();
        }

        self.store.append(src);
        let evicted = self.store.evict_overflow();
        if evicted > 0 {
            trace!(evicted, "ring buffer overwrote oldest bytes");
        }
        src.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StrictRingBuffer;

    // Behavior both policies share as long as nothing overflows.

    fn check_read_write(mut b: impl Buffer) {
        // [*42, 32, 28, _, _]
        assert_eq!(b.write(&[42, 32, 28]), 3);
        assert_eq!(b.len(), 3);

        // [(42, 32), *28, _, _]
        let mut data = [0u8; 2];
        assert_eq!(b.read(&mut data), 2);
        assert_eq!(b.len(), 1);
        assert_eq!(data, [42, 32]);

        // [_, _, (28), _, _]
        let mut data = [0u8; 2];
        assert_eq!(b.read(&mut data), 1);
        assert_eq!(b.len(), 0);
        assert_eq!(data[0], 28);
    }

    fn check_read_write_fragmented(mut b: impl Buffer) {
        // [(42, 32), *28, _, _]
        assert_eq!(b.write(&[42, 32, 28]), 3);
        assert_eq!(b.read(&mut [0u8; 2]), 2);
        assert_eq!(b.len(), 1);

        // [41, 53, *28, 31, 17]
        assert_eq!(b.write(&[31, 17, 41, 53]), 4);
        assert_eq!(b.len(), 5);

        // [41, 53), (28, 31, 17]
        let mut data = [0u8; 5];
        assert_eq!(b.read(&mut data), 5);
        assert_eq!(b.len(), 0);
        assert_eq!(data, [28, 31, 17, 41, 53]);
    }

    fn check_write_more_on_fragmented(mut b: impl Buffer) {
        // [(42, 32, 28), *31, _]
        assert_eq!(b.write(&[42, 32, 28, 31]), 4);
        assert_eq!(b.read(&mut [0u8; 3]), 3);
        assert_eq!(b.len(), 1);

        // [41, _, _, *31, 17]
        assert_eq!(b.write(&[17, 41]), 2);
        assert_eq!(b.len(), 3);

        // [41, 53, _, *31, 17]
        assert_eq!(b.write(&[53]), 1);
        assert_eq!(b.len(), 4);

        let mut data = [0u8; 4];
        assert_eq!(b.read(&mut data), 4);
        assert_eq!(b.len(), 0);
        assert_eq!(data, [31, 17, 41, 53]);
    }

    fn check_read_write_at_the_edge(mut b: impl Buffer) {
        // [(42, 32, 28, 31), *17]
        assert_eq!(b.write(&[42, 32, 28, 31, 17]), 5);
        assert_eq!(b.read(&mut [0u8; 4]), 4);
        assert_eq!(b.len(), 1);

        // [41, 53, _, _, *17]
        assert_eq!(b.write(&[41, 53]), 2);
        assert_eq!(b.len(), 3);

        let mut data = [0u8; 1];
        assert_eq!(b.read(&mut data), 1);
        assert_eq!(b.len(), 2);
        assert_eq!(data, [17]);

        let mut data = [0u8; 5];
        assert_eq!(b.read(&mut data), 2);
        assert_eq!(b.len(), 0);
        assert_eq!(&data[..2], &[41, 53]);
    }

    fn check_read_into_larger_slice(mut b: impl Buffer) {
        assert_eq!(b.capacity(), 5);
        assert_eq!(b.write(&[42, 32, 28, 31, 17]), 5);
        assert_eq!(b.len(), 5);

        let mut data = vec![0u8; 523];
        assert_eq!(b.read(&mut data), 5);
        assert_eq!(b.len(), 0);
        assert_eq!(&data[..5], &[42, 32, 28, 31, 17]);
    }

    fn check_read_empty(mut b: impl Buffer) {
        assert_eq!(b.read(&mut [0u8; 5]), 0);

        assert_eq!(b.write(&[42]), 1);
        assert_eq!(b.read(&mut [0u8; 1]), 1);
        assert_eq!(b.len(), 0);

        assert_eq!(b.read(&mut [0u8; 5]), 0);
    }

    #[test]
    fn test_read_write() {
        check_read_write(RingBuffer::new(5));
        check_read_write(StrictRingBuffer::new(5));
    }

    #[test]
    fn test_read_write_fragmented() {
        check_read_write_fragmented(RingBuffer::new(5));
        check_read_write_fragmented(StrictRingBuffer::new(5));
    }

    #[test]
    fn test_write_more_on_fragmented() {
        check_write_more_on_fragmented(RingBuffer::new(5));
        check_write_more_on_fragmented(StrictRingBuffer::new(5));
    }

    #[test]
    fn test_read_write_at_the_edge() {
        check_read_write_at_the_edge(RingBuffer::new(5));
        check_read_write_at_the_edge(StrictRingBuffer::new(5));
    }

    #[test]
    fn test_read_into_larger_slice() {
        check_read_into_larger_slice(RingBuffer::new(5));
        check_read_into_larger_slice(StrictRingBuffer::new(5));
    }

    #[test]
    fn test_read_empty() {
        check_read_empty(RingBuffer::new(5));
        check_read_empty(StrictRingBuffer::new(5));
    }

    #[test]
    fn test_overwrite_old_data() {
        let mut b = RingBuffer::new(5);

        // [(42, 32), *28, 31, _]
        assert_eq!(b.write(&[42, 32, 28, 31]), 4);
        assert_eq!(b.read(&mut [0u8; 2]), 2);
        assert_eq!(b.len(), 2);

        // [41, 53, 21, *31, 17]
        assert_eq!(b.write(&[17, 41, 53, 21]), 4);
        assert_eq!(b.len(), 5);

        let mut data = [0u8; 1];
        assert_eq!(b.read(&mut data), 1);
        assert_eq!(b.len(), 4);
        assert_eq!(data, [31]);

        let mut data = [0u8; 2];
        assert_eq!(b.read(&mut data), 2);
        assert_eq!(b.len(), 2);
        assert_eq!(data, [17, 41]);
    }

    #[test]
    fn test_overwrite_at_the_edge() {
        let mut b = RingBuffer::new(5);

        // [*42, 32, 28, 31, 17]
        assert_eq!(b.write(&[42, 32, 28, 31, 17]), 5);
        assert_eq!(b.len(), 5);

        // [41, 53, *28, 31, 17]
        assert_eq!(b.write(&[41, 53]), 2);
        assert_eq!(b.len(), 5);

        let mut data = [0u8; 2];
        assert_eq!(b.read(&mut data), 2);
        assert_eq!(b.len(), 3);
        assert_eq!(data, [28, 31]);

        // [*41, 53, 21, 37, 91]
        assert_eq!(b.write(&[21, 37, 91]), 3);
        assert_eq!(b.len(), 5);

        let mut data = [0u8; 3];
        assert_eq!(b.read(&mut data), 3);
        assert_eq!(b.len(), 2);
        assert_eq!(data, [41, 53, 21]);
    }

    #[test]
    fn test_write_more_than_capacity() {
        let mut b = RingBuffer::new(5);

        // The window is reset to the tail of the input: [*28, 31, 17, 41, 53]
        assert_eq!(b.write(&[42, 32, 28, 31, 17, 41, 53]), 7);
        assert_eq!(b.len(), 5);

        let mut data = [0u8; 2];
        assert_eq!(b.read(&mut data), 2);
        assert_eq!(b.len(), 3);
        assert_eq!(data, [28, 31]);
        assert_eq!(b.to_vec(), vec![17, 41, 53]);
    }

    #[test]
    fn test_write_exactly_capacity_after_read() {
        let mut b = RingBuffer::new(3);
        b.write(&[1, 2]);
        b.read(&mut [0u8; 1]);

        assert_eq!(b.write(&[7, 8, 9]), 3);
        assert_eq!(b.to_vec(), vec![7, 8, 9]);
    }

    #[test]
    fn test_keeps_last_capacity_bytes() {
        let mut b = RingBuffer::new(4);
        for i in 0..10u8 {
            assert_eq!(b.write(&[i]), 1);
        }
        assert_eq!(b.len(), 4);

        let mut data = [0u8; 4];
        assert_eq!(b.read(&mut data), 4);
        assert_eq!(data, [6, 7, 8, 9]);
    }

    #[test]
    fn test_to_vec_does_not_consume() {
        let mut b = RingBuffer::new(4);
        b.write(&[1, 2, 3]);
        b.read(&mut [0u8; 2]);
        b.write(&[4, 5, 6]);

        assert_eq!(b.to_vec(), vec![3, 4, 5, 6]);
        assert_eq!(b.len(), 4);
    }

    #[test]
    fn test_clear() {
        let mut b = RingBuffer::new(4);
        b.write(&[1, 2, 3]);
        b.clear();
        assert!(b.is_empty());
        assert_eq!(b.read(&mut [0u8; 4]), 0);

        b.write(&[9]);
        assert_eq!(b.to_vec(), vec![9]);
    }

    #[test]
    #[should_panic(expected = "capacity must be greater than 0")]
    fn test_zero_capacity_panics() {
        let _ = RingBuffer::new(0);
    }
}
