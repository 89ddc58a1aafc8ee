//! Cooperative cancellation for export runs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Token that signals cancellation to a running export.
///
/// Cloning a token creates another handle to the same flag. The exporter
/// checks it between frames and still restores materials when it trips.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Whether cancellation has been signalled.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}
