//! Stream configuration.

use crate::buffer::Buffer;
use crate::error::{Error, Result};
use crate::ring_buffer::RingBuffer;
use crate::strict_buffer::StrictRingBuffer;
use crate::stream::Stream;

/// A buffer whose policy is picked at runtime.
pub type DynBuffer = Box<dyn Buffer + Send>;

/// What a buffer does with a write that does not fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Policy {
    /// Evict the oldest unread bytes ([`RingBuffer`]).
    #[default]
    Overwrite,
    /// Accept only what fits ([`StrictRingBuffer`]).
    Strict,
}

impl std::fmt::Display for Policy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Policy::Overwrite => write!(f, "overwrite"),
            Policy::Strict => write!(f, "strict"),
        }
    }
}

/// Stream configuration.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Buffer capacity in bytes.
    pub capacity: usize,
    /// Buffer write policy.
    pub policy: Policy,
}

impl StreamConfig {
    /// Create a new stream config (defaults to [`Policy::Overwrite`]).
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            policy: Policy::default(),
        }
    }

    /// Set the buffer policy.
    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }

    /// Validate the config.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(Error::InvalidConfig(
                "capacity must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Build the buffer described by this config.
    pub fn build_buffer(&self) -> Result<DynBuffer> {
        self.validate()?;
        Ok(match self.policy {
            Policy::Overwrite => Box::new(RingBuffer::new(self.capacity)),
            Policy::Strict => Box::new(StrictRingBuffer::new(self.capacity)),
        })
    }

    /// Build a stream over the buffer described by this config.
    pub fn build(&self) -> Result<Stream<DynBuffer>> {
        Ok(Stream::new(self.build_buffer()?))
    }
}
