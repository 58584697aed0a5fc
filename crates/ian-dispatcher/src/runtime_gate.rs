//! Pipeline step 3: a control flag external to the dispatch logic itself
//! that can take IAN fully offline without restarting the process.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// In-process on/off switch, checked once per message right after the admin
/// short-circuit. Cloning shares the same underlying flag — every channel
/// worker's `Dispatcher` clone observes a flip immediately.
#[derive(Clone)]
pub struct RuntimeGate(Arc<AtomicBool>);

impl RuntimeGate {
    pub fn new(enabled: bool) -> Self {
        Self(Arc::new(AtomicBool::new(enabled)))
    }

    pub fn is_enabled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.0.store(enabled, Ordering::Relaxed);
    }
}

impl Default for RuntimeGate {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_enabled() {
        assert!(RuntimeGate::default().is_enabled());
    }

    #[test]
    fn clones_share_state() {
        let gate = RuntimeGate::new(true);
        let clone = gate.clone();
        clone.set_enabled(false);
        assert!(!gate.is_enabled());
    }
}
