//! rasterfx-filter - Kernel convolution engine
//!
//! This crate applies a [`ConvolutionKernel`] to a region of a
//! [`PaintDevice`](rasterfx_core::PaintDevice):
//!
//! - **Kernel**: [`ConvolutionKernel`] - coefficients, factor and offset
//! - **Painter**: [`ConvolutionPainter`] - engine choice, border handling,
//!   selection restriction and in-place convolution
//! - **Engines**: [`SpatialConvolutionWorker`] (direct, sliding window) and
//!   [`FftConvolutionWorker`] (frequency domain, `fft` feature)
//!
//! Channel values are premultiplied by alpha while convolving and divided by
//! the convolved alpha afterwards, so transparent pixels do not bleed color.
//!
//! # Features
//!
//! - `fft` (default): enables the FFT engine through `rustfft`. Without it
//!   every request runs on the spatial engine.
//!
//! # Environment Variables
//!
//! - `RASTERFX_CONVOLUTION_ENGINE`: read by [`EnginePreference::from_env`];
//!   `"fft"` or `"spatial"`, anything else selects automatically.

pub mod error;
#[cfg(feature = "fft")]
pub mod fft;
pub mod kernel;
pub mod painter;
pub mod planner;
pub mod spatial;
pub mod worker;

pub use error::{FilterError, FilterResult};
#[cfg(feature = "fft")]
pub use fft::FftConvolutionWorker;
pub use kernel::ConvolutionKernel;
pub use painter::{BorderOp, ConvolutionPainter, ENGINE_ENV, EnginePreference, FFT_THRESHOLD};
pub use planner::{GlobalPlannerLock, NoopPlannerLock, PlannerGuard, PlannerLock};
pub use spatial::SpatialConvolutionWorker;
pub use worker::{ConvolutionWorker, WorkerContext, WorkerOutcome};
