//! FFT planner serialization
//!
//! FFT plan creation goes through a [`PlannerLock`]. The process-wide
//! [`GlobalPlannerLock`] serializes it across all workers; callers may
//! inject [`NoopPlannerLock`] or their own lock to observe or skip the
//! serialization. Only planning is serialized, never the transforms.

use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

/// Held while an FFT plan is being created
pub struct PlannerGuard<'a> {
    _guard: Option<MutexGuard<'a, ()>>,
}

impl<'a> PlannerGuard<'a> {
    /// A guard that holds nothing
    pub fn unlocked() -> Self {
        Self { _guard: None }
    }

    /// A guard keeping `guard` locked until dropped
    pub fn from_mutex_guard(guard: MutexGuard<'a, ()>) -> Self {
        Self {
            _guard: Some(guard),
        }
    }
}

/// Lock taken around FFT plan creation
pub trait PlannerLock: Send + Sync {
    fn lock(&self) -> PlannerGuard<'_>;
}

/// Process-wide planner mutex
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalPlannerLock;

fn planner_mutex() -> &'static Mutex<()> {
    static PLANNER: OnceLock<Mutex<()>> = OnceLock::new();
    PLANNER.get_or_init(|| Mutex::new(()))
}

impl PlannerLock for GlobalPlannerLock {
    fn lock(&self) -> PlannerGuard<'_> {
        // The mutex guards no data, so a poisoned lock is still usable
        let guard = planner_mutex()
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        PlannerGuard::from_mutex_guard(guard)
    }
}

/// Lock that never blocks
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPlannerLock;

impl PlannerLock for NoopPlannerLock {
    fn lock(&self) -> PlannerGuard<'_> {
        PlannerGuard::unlocked()
    }
}
