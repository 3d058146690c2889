use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{EngineError, EngineResult};

/// At-most-one-run rule for a spreadsheet host.
///
/// The host and its destination workbook cannot be shared between runs, so
/// a run must hold a [`RunGuard`] for its whole lifetime.
#[derive(Debug, Default)]
pub struct RunLock {
    held: AtomicBool,
}

impl RunLock {
    pub const fn new() -> Self {
        Self {
            held: AtomicBool::new(false),
        }
    }

    /// The process-wide lock used by the worker binary.
    pub fn global() -> &'static RunLock {
        static GLOBAL: RunLock = RunLock::new();
        &GLOBAL
    }

    /// Take the lock, failing with [`EngineError::AlreadyRunning`] if a run
    /// already holds it.
    pub fn acquire(&self) -> EngineResult<RunGuard<'_>> {
        self.held
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| EngineError::AlreadyRunning)?;
        Ok(RunGuard { lock: self })
    }

    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::Acquire)
    }
}

/// Proof that the holder owns the run lock. Released on drop.
#[derive(Debug)]
pub struct RunGuard<'a> {
    lock: &'a RunLock,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.lock.held.store(false, Ordering::Release);
    }
}
