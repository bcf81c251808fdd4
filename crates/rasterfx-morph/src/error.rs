//! Error types for rasterfx-morph

use thiserror::Error;

/// Errors that can occur while filtering a selection mask
#[derive(Debug, Error)]
pub enum MorphError {
    /// Core library error
    #[error("core error: {0}")]
    Core(#[from] rasterfx_core::Error),

    /// Convolution error (feathering)
    #[error("filter error: {0}")]
    Filter(#[from] rasterfx_filter::FilterError),
}

/// Result type for selection filters
pub type MorphResult<T> = Result<T, MorphError>;
