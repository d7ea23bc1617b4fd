//! Scoped loading indicators.
//!
//! # Design
//! - A store holds one [`LoadingFlag`]; each operation takes a [`LoadingGuard`]
//!   on entry and the flag clears when the last guard drops, on every exit path.
//! - Overlapping operations are counted, so one finishing does not hide another.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Counts in-flight operations for one store.
#[derive(Debug, Default)]
pub struct LoadingFlag {
    active: AtomicUsize,
}

impl LoadingFlag {
    /// A flag with nothing in flight.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            active: AtomicUsize::new(0),
        }
    }

    /// Mark an operation as started until the returned guard drops.
    #[must_use = "the flag clears as soon as the guard is dropped"]
    pub fn begin(&self) -> LoadingGuard<'_> {
        self.active.fetch_add(1, Ordering::SeqCst);
        LoadingGuard { flag: self }
    }

    /// Whether any operation is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.active.load(Ordering::SeqCst) > 0
    }
}

/// Keeps a [`LoadingFlag`] raised while alive.
#[derive(Debug)]
pub struct LoadingGuard<'a> {
    flag: &'a LoadingFlag,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.flag.active.fetch_sub(1, Ordering::SeqCst);
    }
}
