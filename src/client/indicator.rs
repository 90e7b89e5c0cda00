//! Loading indicator shown while admin requests are outstanding.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Something that can show "work in progress" to the operator.
pub trait ActivityIndicator: Send + Sync {
    fn show(&self, label: &str);
    fn hide(&self, label: &str);
}

/// Default indicator: counts outstanding requests.
#[derive(Debug, Default)]
pub struct InFlight(AtomicUsize);

impl InFlight {
    pub fn new() -> Self {
        Self(AtomicUsize::new(0))
    }

    pub fn pending(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl ActivityIndicator for InFlight {
    fn show(&self, label: &str) {
        let n = self.0.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::trace!(label, pending = n, "loading");
    }

    fn hide(&self, label: &str) {
        let n = self.0.fetch_sub(1, Ordering::SeqCst).saturating_sub(1);
        tracing::trace!(label, pending = n, "loaded");
    }
}

/// Shows the indicator on creation and hides it on drop, so every exit
/// path of a request (including a cancelled future) releases it.
pub struct LoadingGuard {
    indicator: Arc<dyn ActivityIndicator>,
    label: String,
}

impl LoadingGuard {
    pub fn acquire(indicator: Arc<dyn ActivityIndicator>, label: impl Into<String>) -> Self {
        let label = label.into();
        indicator.show(&label);
        Self { indicator, label }
    }
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.indicator.hide(&self.label);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_releases_on_drop() {
        let inflight = Arc::new(InFlight::new());
        {
            let _a = LoadingGuard::acquire(inflight.clone(), "GET /admin/users");
            let _b = LoadingGuard::acquire(inflight.clone(), "GET /admin/services");
            assert_eq!(inflight.pending(), 2);
        }
        assert_eq!(inflight.pending(), 0);
    }

    #[test]
    fn test_guard_released_when_closure_bails_early() {
        let inflight = Arc::new(InFlight::new());
        let run = |fail: bool| -> Result<(), &'static str> {
            let _guard = LoadingGuard::acquire(inflight.clone(), "PATCH /admin/tokens/1/status");
            if fail {
                return Err("boom");
            }
            Ok(())
        };
        assert!(run(true).is_err());
        assert!(run(false).is_ok());
        assert_eq!(inflight.pending(), 0);
    }
}
