//! Error types for pipe operations.

/// Result type alias for pipe operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Pipe operation error.
///
/// Buffer-level operations never fail; they report a smaller byte count
/// instead. All failures come from the [`Stream`](crate::Stream) layer or from
/// building one out of a [`StreamConfig`](crate::StreamConfig).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The stream has been closed, either before the call or while the
    /// operation was pending.
    #[error("pipe: closed")]
    Closed,

    /// Invalid stream configuration.
    #[error("pipe: invalid config: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Returns true if this error signals a closed stream.
    pub fn is_closed(&self) -> bool {
        matches!(self, Error::Closed)
    }
}
