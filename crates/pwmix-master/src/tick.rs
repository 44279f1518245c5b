//! The game's tick counter, as seen by the sound system.

use std::sync::atomic::{AtomicI32, Ordering};

/// Monotonically non-decreasing game tick. Only compared for relative age.
pub trait TickSource: Send + Sync {
    fn tic(&self) -> i32;
}

impl TickSource for AtomicI32 {
    fn tic(&self) -> i32 {
        self.load(Ordering::Relaxed)
    }
}
