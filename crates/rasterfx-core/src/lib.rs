//! rasterfx Core - raster storage and channel primitives
//!
//! This crate provides the collaborators the filter engine is built on:
//!
//! - [`Rect`] / [`Point`] / [`Size`] - Integer raster geometry
//! - [`ColorSpace`] / [`ChannelInfo`] / [`ChannelFlags`] - Pixel layouts and
//!   per-channel conversion to and from `f64`
//! - [`PaintDevice`] - In-memory raster with lazy default-pixel semantics
//! - [`PixelSelection`] - Single-channel coverage mask
//! - [`HLineConstIterator`] / [`VLineConstIterator`] / [`RandomConstAccessor`]
//!   and their [`IteratorPolicy`] variants - Pixel access by scanline
//! - [`ProgressUpdater`] / [`CancellationToken`] - Progress and cooperative
//!   interruption

pub mod colorspace;
pub mod device;
pub mod error;
pub mod geometry;
pub mod iterators;
pub mod progress;
pub mod selection;

pub use colorspace::{ChannelFlags, ChannelInfo, ChannelType, ChannelValueType, ColorSpace};
pub use device::PaintDevice;
pub use error::{Error, Result};
pub use geometry::{Point, Rect, Size};
pub use iterators::{
    HLineConstIterator, HLineIterator, IteratorPolicy, NormalIteratorPolicy,
    RandomConstAccessor, RepeatIteratorPolicy, VLineConstIterator, VLineIterator,
};
pub use progress::{CancellationToken, ProgressState, ProgressUpdater};
pub use selection::{PixelSelection, SELECTED, UNSELECTED};
