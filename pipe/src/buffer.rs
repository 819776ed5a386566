//! Byte buffer capability shared by the storage policies.

/// A fixed-capacity byte store that a [`Stream`](crate::Stream) drives.
///
/// Implementations are plain data structures: they never block, never fail
/// and know nothing about concurrency. A short count is the only way a
/// buffer reports that it could not move everything it was asked to.
///
/// # Semantics
///
/// - **Read**: copies up to `dst.len()` of the oldest bytes, 0 when empty
/// - **Write**: the returned count is policy defined, see [`RingBuffer`] and
///   [`StrictRingBuffer`]
///
/// [`RingBuffer`]: crate::RingBuffer
/// [`StrictRingBuffer`]: crate::StrictRingBuffer
pub trait Buffer {
    /// Returns the fixed buffer capacity in bytes.
    fn capacity(&self) -> usize;

    /// Returns the number of unread bytes currently stored.
    fn len(&self) -> usize;

    /// Copies stored bytes into `dst`, oldest first.
    ///
    /// Returns the number of bytes copied.
    fn read(&mut self, dst: &mut [u8]) -> usize;

    /// Stores bytes from `src`.
    ///
    /// Returns the number of bytes the buffer accepted.
    fn write(&mut self, src: &[u8]) -> usize;

    /// Returns true if the buffer holds no unread bytes.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if the buffer is at capacity.
    fn is_full(&self) -> bool {
        self.len() == self.capacity()
    }

    /// Returns the number of bytes that fit without evicting anything.
    fn available(&self) -> usize {
        self.capacity() - self.len()
    }
}

impl<B: Buffer + ?Sized> Buffer for Box<B> {
    fn capacity(&self) -> usize {
        (**self).capacity()
    }

    fn len(&self) -> usize {
        (**self).len()
    }

    fn read(&mut self, dst: &mut [u8]) -> usize {
        (**self).read(dst)
    }

    fn write(&mut self, src: &[u8]) -> usize {
        (**self).write(src)
    }
}
