//! rasterfx - Convolution and selection morphology for raster images
//!
//! # Overview
//!
//! - Kernel convolution with a direct spatial engine and an FFT engine,
//!   alpha-aware across multi-channel pixels
//! - Morphology filters on single-channel selection masks (erode, dilate,
//!   grow, shrink, border, feather, smooth, invert)
//!
//! # Example
//!
//! ```
//! use rasterfx::morph::{GrowSelectionFilter, SelectionFilter};
//! use rasterfx::{PixelSelection, Rect, SELECTED};
//!
//! let bounds = Rect::new(0, 0, 32, 32).unwrap();
//! let mut mask = PixelSelection::new(bounds);
//! mask.set_value(16, 16, SELECTED);
//!
//! let grow = GrowSelectionFilter::new(3, 3);
//! let area = grow.change_rect(Rect::new(16, 16, 1, 1).unwrap(), bounds);
//! grow.process(&mut mask, area).unwrap();
//! assert_eq!(mask.value(18, 16), SELECTED);
//! ```

// Re-export core types (devices, masks, geometry)
pub use rasterfx_core::*;

// Re-export domain crates as modules to avoid name conflicts
pub use rasterfx_filter as filter;
pub use rasterfx_morph as morph;
