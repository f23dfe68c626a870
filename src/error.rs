//! Error handling for Wavecore
//!
//! Load and save return `WaveError` for the failures a caller can act on
//! (missing file, wrong container markers, I/O). Recoverable conditions --
//! unsupported compression codes, truncated chunk bodies -- are logged as
//! warnings and do not abort the operation.

use thiserror::Error;

/// Result type alias for Wavecore operations
pub type Result<T> = std::result::Result<T, WaveError>;

/// Main error type for Wavecore operations
#[derive(Error, Debug)]
pub enum WaveError {
    #[error("File not found: {path}")]
    FileNotFound {
        path: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("{path} doesn't appear to be a RIFF file")]
    NotRiff { path: String },

    #[error("{path} doesn't appear to be a WAVE file")]
    NotWave { path: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl WaveError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            WaveError::FileNotFound { .. } => "FILE_NOT_FOUND",
            WaveError::NotRiff { .. } => "NOT_RIFF",
            WaveError::NotWave { .. } => "NOT_WAVE",
            WaveError::Io(_) => "IO_ERROR",
        }
    }

    /// Check if this error left the container in a usable state
    ///
    /// A format mismatch leaves everything except the outer envelope at its
    /// defaults; the caller can retry with a different file on the same
    /// container.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            WaveError::FileNotFound { .. } | WaveError::NotRiff { .. } | WaveError::NotWave { .. }
        )
    }
}
