//! Time for the Finite Intent Executor
//!
//! All temporal logic is a comparison between a stored timestamp and the
//! current time read from a [`Clock`]. Nothing is scheduled.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};

/// Unix timestamp in whole seconds.
pub type Timestamp = i64;

pub const HOUR_SECS: i64 = 60 * 60;
pub const DAY_SECS: i64 = 24 * HOUR_SECS;

/// Fixed mandate length between activation and sunset eligibility (20 years).
pub const SUNSET_DURATION_SECS: i64 = 20 * 365 * DAY_SECS;

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall clock backed by `chrono::Utc`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now().timestamp()
    }
}

/// Manually driven clock for tests and simulations.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: AtomicI64::new(start),
        }
    }

    pub fn set(&self, now: Timestamp) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, secs: i64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}

/// Render a timestamp as RFC 3339 for logs and audit payloads.
pub fn format_timestamp(ts: Timestamp) -> String {
    DateTime::<Utc>::from_timestamp(ts, 0)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| ts.to_string())
}
