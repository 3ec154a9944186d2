use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

/// Records when the process started. Uptime is measured on the monotonic clock,
/// so it never goes backwards even if the wall clock is adjusted.
#[derive(Clone, Copy, Debug)]
pub struct ProcessClock {
    started_at: DateTime<Utc>,
    started: Instant,
}

impl ProcessClock {
    pub fn start() -> Self {
        Self {
            started_at: Utc::now(),
            started: Instant::now(),
        }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn uptime_seconds(&self) -> f64 {
        self.uptime().as_secs_f64()
    }
}
