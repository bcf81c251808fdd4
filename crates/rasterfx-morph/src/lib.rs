//! rasterfx-morph - Morphology filters for selection masks
//!
//! Every filter implements [`SelectionFilter`] and rewrites a
//! [`PixelSelection`](rasterfx_core::PixelSelection) in place over a
//! rectangle:
//!
//! - **Erode / Dilate**: radius-1 min/max over a 4-connected cross
//! - **Grow / Shrink**: elliptical running max/min, shrink optionally
//!   edge-locked
//! - **Border**: antialiased band around the selection edge
//! - **Feather**: separable Gaussian blur through the convolution engine
//! - **Smooth**: 3x3 box average
//! - **Invert**: flips every value, including the unstored background
//!
//! Call [`SelectionFilter::change_rect`] first to find the area a filter
//! needs to process; filters with a radius read that many extra pixels
//! around the requested rect.

pub mod border;
mod error;
pub mod erode_dilate;
pub mod feather;
pub mod filter;
pub mod grow_shrink;
pub mod invert;
pub mod smooth;

pub use border::BorderSelectionFilter;
pub use erode_dilate::{DilateSelectionFilter, ErodeSelectionFilter};
pub use error::{MorphError, MorphResult};
pub use feather::FeatherSelectionFilter;
pub use filter::{SelectionFilter, compute_border, compute_transition, rotate_rows};
pub use grow_shrink::{GrowSelectionFilter, ShrinkSelectionFilter};
pub use invert::InvertSelectionFilter;
pub use smooth::SmoothSelectionFilter;
