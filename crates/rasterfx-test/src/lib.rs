//! rasterfx-test - Regression test framework for rasterfx
//!
//! This crate provides a regression test framework modelled on a
//! golden-file workflow, supporting three modes:
//!
//! - **Generate**: Create golden files for comparison
//! - **Compare**: Compare results with golden files
//! - **Display**: Run tests without comparison (visual inspection)
//!
//! It also carries the synthetic devices and masks the `*_reg` suites run
//! on, see [`fixtures`].
//!
//! # Usage
//!
//! ```ignore
//! use rasterfx_test::{RegParams, RegTestMode};
//!
//! let mut rp = RegParams::new("convolve");
//! rp.compare_values(255.0, value as f64, 0.0);
//! assert!(rp.cleanup());
//! ```
//!
//! # Environment Variables
//!
//! - `REGTEST_MODE`: Set to "generate", "compare", or "display"

mod error;
pub mod fixtures;
mod params;

pub use error::{TestError, TestResult};
pub use params::{RegParams, RegTestMode};

/// Get the path to the workspace root
fn workspace_root() -> String {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    // rasterfx-test is at crates/rasterfx-test, so go up two directories
    format!("{}/../..", manifest_dir)
}

/// Get the path to the golden files directory
pub fn golden_dir() -> String {
    format!("{}/tests/golden", workspace_root())
}

/// Get the path to the regout (regression output) directory
pub fn regout_dir() -> String {
    format!("{}/tests/regout", workspace_root())
}
