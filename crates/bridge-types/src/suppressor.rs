use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Default repeat-suppression window (§7: "repeating identical error
/// messages within a 10-minute window are emitted once per window").
const DEFAULT_WINDOW: Duration = Duration::from_secs(600);

/// Tracks the last time each distinct error message was emitted, so a
/// caller can log a recurring failure once per window instead of flooding
/// the log on every retry.
pub struct ErrorSuppressor {
    window: Duration,
    last_emitted: Mutex<HashMap<String, Instant>>,
}

impl ErrorSuppressor {
    pub fn new() -> Self {
        Self::with_window(DEFAULT_WINDOW)
    }

    pub fn with_window(window: Duration) -> Self {
        Self {
            window,
            last_emitted: Mutex::new(HashMap::new()),
        }
    }

    /// Returns `true` the first time `message` is seen, or once the
    /// suppression window has elapsed since it was last emitted; `false`
    /// otherwise.
    pub fn should_emit(&self, message: &str) -> bool {
        let now = Instant::now();
        let mut last_emitted = self.last_emitted.lock();
        match last_emitted.get(message) {
            Some(last) if now.duration_since(*last) < self.window => false,
            _ => {
                last_emitted.insert(message.to_string(), now);
                true
            }
        }
    }
}

impl Default for ErrorSuppressor {
    fn default() -> Self {
        Self::new()
    }
}
