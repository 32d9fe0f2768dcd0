use std::sync::atomic::{AtomicUsize, Ordering};

/// In-flight marker for one operation. Counts overlapping runs, so the flag
/// stays set until the last one finishes.
#[derive(Debug, Default)]
pub struct LoadingFlag(AtomicUsize);

impl LoadingFlag {
    pub fn is_loading(&self) -> bool {
        self.0.load(Ordering::SeqCst) > 0
    }

    /// Set the flag until the returned guard is dropped.
    pub fn begin(&self) -> LoadingGuard<'_> {
        self.0.fetch_add(1, Ordering::SeqCst);
        LoadingGuard(&self.0)
    }
}

pub struct LoadingGuard<'a>(&'a AtomicUsize);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}
