//! Progress reporting and cooperative cancellation
//!
//! Long-running workers report through a [`ProgressUpdater`] and poll
//! [`ProgressUpdater::interrupted`] at their own granularity. Interruption
//! is cooperative: a worker that observes it stops early and leaves the
//! pixels it already wrote in place.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

/// Sink for progress updates
pub trait ProgressUpdater: Send + Sync {
    /// Set overall completion in percent (0..=100)
    fn set_progress(&self, percent: i32);

    /// Define the range for subsequent [`ProgressUpdater::set_value`] calls
    fn set_range(&self, min: i32, max: i32);

    fn set_value(&self, value: i32);

    /// Whether the caller asked the operation to stop
    fn interrupted(&self) -> bool;
}

/// Shared cancellation flag
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; visible to every clone of this token
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Thread-safe progress state backed by atomics
#[derive(Debug, Default)]
pub struct ProgressState {
    min: AtomicI64,
    max: AtomicI64,
    value: AtomicI64,
    cancel: CancellationToken,
}

impl ProgressState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Progress state that reports interruption once `token` is cancelled
    pub fn with_token(token: CancellationToken) -> Self {
        Self {
            cancel: token,
            ..Self::default()
        }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Current completion in percent
    pub fn percent(&self) -> i32 {
        let min = self.min.load(Ordering::Relaxed);
        let max = self.max.load(Ordering::Relaxed);
        let value = self.value.load(Ordering::Relaxed);
        if max <= min {
            return 0;
        }
        (((value - min) * 100) / (max - min)).clamp(0, 100) as i32
    }
}

impl ProgressUpdater for ProgressState {
    fn set_progress(&self, percent: i32) {
        self.min.store(0, Ordering::Relaxed);
        self.max.store(100, Ordering::Relaxed);
        self.value.store(percent.into(), Ordering::Relaxed);
    }

    fn set_range(&self, min: i32, max: i32) {
        self.min.store(min.into(), Ordering::Relaxed);
        self.max.store(max.into(), Ordering::Relaxed);
        self.value.store(min.into(), Ordering::Relaxed);
    }

    fn set_value(&self, value: i32) {
        self.value.store(value.into(), Ordering::Relaxed);
    }

    fn interrupted(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
