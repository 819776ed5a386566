//! Convenience functions for creating pipes of common sizes.

use crate::{RingBuffer, StrictRingBuffer, Stream};

// ============================================================================
// Overwriting pipes
// ============================================================================

/// Creates a 1KB pipe that overwrites the oldest bytes when full.
pub fn pipe_1kb() -> Stream<RingBuffer> {
    Stream::new(RingBuffer::new(1024))
}

/// Creates a 4KB pipe that overwrites the oldest bytes when full.
pub fn pipe_4kb() -> Stream<RingBuffer> {
    Stream::new(RingBuffer::new(4096))
}

/// Creates a 64KB pipe that overwrites the oldest bytes when full.
pub fn pipe_64kb() -> Stream<RingBuffer> {
    Stream::new(RingBuffer::new(65536))
}

// ============================================================================
// Strict (backpressured) pipes
// ============================================================================

/// Creates a 1KB pipe whose writes wait for free space.
pub fn strict_pipe_1kb() -> Stream<StrictRingBuffer> {
    Stream::new(StrictRingBuffer::new(1024))
}

/// Creates a 4KB pipe whose writes wait for free space.
pub fn strict_pipe_4kb() -> Stream<StrictRingBuffer> {
    Stream::new(StrictRingBuffer::new(4096))
}

/// Creates a 64KB pipe whose writes wait for free space.
pub fn strict_pipe_64kb() -> Stream<StrictRingBuffer> {
    Stream::new(StrictRingBuffer::new(65536))
}
