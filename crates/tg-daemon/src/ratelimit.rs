//! Global request cooldown.

use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

/// Admits at most one request per `period`, across all callers.
///
/// Rejected requests do not extend the cooldown.
#[derive(Debug)]
pub struct Cooldown {
    period: Duration,
    last: Mutex<Option<Instant>>,
}

impl Cooldown {
    /// Create a cooldown of `period`.
    #[must_use]
    pub const fn new(period: Duration) -> Self {
        Self {
            period,
            last: Mutex::new(None),
        }
    }

    /// Try to admit a request now.
    pub fn try_acquire(&self) -> bool {
        self.try_acquire_at(Instant::now())
    }

    /// Try to admit a request at `now`.
    pub fn try_acquire_at(&self, now: Instant) -> bool {
        let mut last = self.last.lock();
        if last.is_some_and(|at| now.saturating_duration_since(at) < self.period) {
            return false;
        }
        *last = Some(now);
        true
    }

    /// Time until the next request would be admitted.
    #[must_use]
    pub fn wait_time(&self) -> Duration {
        self.last.lock().map_or(Duration::ZERO, |at| {
            self.period.saturating_sub(Instant::now().saturating_duration_since(at))
        })
    }
}
