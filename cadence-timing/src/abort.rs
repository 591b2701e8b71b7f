use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared abort request. Setting it is monotonic for the lifetime of a run;
/// there is no way to clear it. Cloning shares the underlying flag, so the
/// input thread and a blocking runner can poll the same state.
#[derive(Debug, Clone, Default)]
pub struct AbortFlag(Arc<AtomicBool>);

impl AbortFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let flag = AbortFlag::new();
        let other = flag.clone();
        assert!(!other.is_set());
        flag.request();
        assert!(other.is_set());
    }
}
