use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

/// Shared, clonable cancellation switch.
/// Flipping it stops new work from being issued; work already running finishes.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let flag = CancelFlag::new();
        let other = flag.clone();
        assert!(!other.is_cancelled());

        flag.cancel();
        assert!(other.is_cancelled());
    }
}
