use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

const NO_LIMIT: u64 = u64::MAX;

/// Shared start/pause/continue switch with an optional stop-after-N-turns
/// trigger. Pausing takes effect between ticks, never inside one.
#[derive(Debug, Clone)]
pub struct RunControl {
    paused: Arc<AtomicBool>,
    stop_after: Arc<AtomicU64>,
}

impl RunControl {
    pub fn new() -> Self {
        Self {
            paused: Arc::new(AtomicBool::new(false)),
            stop_after: Arc::new(AtomicU64::new(NO_LIMIT)),
        }
    }

    pub fn with_stop_after(self, turns: u64) -> Self {
        self.set_stop_after(Some(turns));
        self
    }

    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    pub fn set_stop_after(&self, turns: Option<u64>) {
        self.stop_after
            .store(turns.unwrap_or(NO_LIMIT), Ordering::SeqCst);
    }

    pub fn stop_after(&self) -> Option<u64> {
        match self.stop_after.load(Ordering::SeqCst) {
            NO_LIMIT => None,
            turns => Some(turns),
        }
    }

    pub fn stop_reached(&self, turn: u64) -> bool {
        self.stop_after().is_some_and(|limit| turn >= limit)
    }
}

impl Default for RunControl {
    fn default() -> Self {
        Self::new()
    }
}
