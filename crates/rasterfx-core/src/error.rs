//! Error types for rasterfx-core
//!
//! Provides a unified error type for the storage, channel and geometry
//! primitives. Each variant captures enough context for diagnostics without
//! exposing internal implementation details.

use thiserror::Error;

/// rasterfx-core error type
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid rectangle dimensions
    #[error("invalid rect dimensions: {width}x{height}")]
    InvalidDimension { width: i32, height: i32 },

    /// Buffer length does not match the region it describes
    #[error("buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSize { expected: usize, actual: usize },

    /// Pixel layout does not match the color space
    #[error("pixel size mismatch: color space uses {expected} bytes, got {actual}")]
    PixelSize { expected: usize, actual: usize },

    /// Channel flag array does not cover the color space channels
    #[error("channel flags cover {actual} channels, color space has {expected}")]
    ChannelFlagsMismatch { expected: usize, actual: usize },

    /// Operation requires a single-channel mask device
    #[error("expected a single-channel mask, got {0} bytes per pixel")]
    NotAMask(usize),
}

/// Result type alias for rasterfx-core operations
pub type Result<T> = std::result::Result<T, Error>;
