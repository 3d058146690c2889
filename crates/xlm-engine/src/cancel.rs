use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use xlm_protocol::CancelFlag;

/// A cooperative cancellation condition, polled at safe points.
///
/// The engine checks it before opening each source file and before copying
/// each worksheet, so cancellation latency is bounded by one copy.
pub trait CancellationSignal {
    fn is_cancelled(&self) -> bool;
}

impl CancellationSignal for CancelFlag {
    fn is_cancelled(&self) -> bool {
        self.is_raised()
    }
}

impl<S: CancellationSignal + ?Sized> CancellationSignal for &S {
    fn is_cancelled(&self) -> bool {
        (**self).is_cancelled()
    }
}

/// In-process cancellation token. Clones share the same state.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

impl CancellationSignal for CancellationToken {
    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// A signal that is never raised.
#[derive(Clone, Copy, Debug, Default)]
pub struct NeverCancelled;

impl CancellationSignal for NeverCancelled {
    fn is_cancelled(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_clones_share_state() {
        let token = CancellationToken::new();
        let other = token.clone();
        assert!(!other.is_cancelled());
        token.cancel();
        assert!(other.is_cancelled());
    }

    #[test]
    fn flag_file_is_a_signal() {
        let dir = tempfile::tempdir().unwrap();
        let flag = CancelFlag::new(dir.path().join("cancel"));
        assert!(!flag.is_cancelled());
        flag.raise().unwrap();
        assert!((&flag).is_cancelled());
    }

    #[test]
    fn never() {
        assert!(!NeverCancelled.is_cancelled());
    }
}
