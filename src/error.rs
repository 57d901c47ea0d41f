//! Error types and result utilities for PCM analysis and dynamics operations.

use thiserror::Error;

/// Convenience type alias for results that may contain an [`AudioError`].
pub type AudioResult<T> = Result<T, AudioError>;

/// Error types that can occur while analysing or processing PCM audio.
///
/// Degenerate audio (empty or entirely silent buffers) is never an error:
/// those cases produce sentinel levels instead. Errors are reserved for
/// malformed input from a collaborator, invalid parameters and failures
/// inside the worker pool.
#[derive(Error, Debug)]
pub enum AudioError {
    /// Error that occurs when invalid parameters are provided to an operation.
    ///
    /// This includes cases like a compression ratio below 1.0, a non-positive
    /// release time or a zero-length silence window.
    #[error("Invalid parameter error: {0}")]
    InvalidParameter(String),

    /// The decoder handed over a sample width the core does not support.
    #[error("Unsupported sample width: {0} bytes (expected 1, 2 or 4)")]
    UnsupportedSampleWidth(usize),

    /// Error that occurs when buffer dimensions don't match expected values.
    ///
    /// This happens when a raw byte buffer is not a whole number of frames.
    #[error("Dimension mismatch error: {0}")]
    DimensionMismatch(String),

    /// A per-chunk computation failed; the whole reduction is abandoned.
    #[error("Chunk {index} failed: {source}")]
    ChunkFailed {
        /// Position of the failing chunk in partition order.
        index: usize,
        /// The underlying error.
        source: Box<AudioError>,
    },

    /// The worker pool could not be created or a worker panicked.
    #[error("Thread pool error: {0}")]
    ThreadPool(String),
}

impl AudioError {
    /// Create a new invalid parameter error.
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter(message.into())
    }

    /// Wrap an error raised while processing chunk `index`.
    pub fn chunk_failed(index: usize, source: AudioError) -> Self {
        Self::ChunkFailed {
            index,
            source: Box::new(source),
        }
    }
}
