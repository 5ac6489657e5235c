use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// The clock consensus compares block timestamps against. Swappable so that
/// delay and expiry behavior is testable.
pub trait TimeSource: Send + Sync {
    /// Adjusted network time as Unix seconds
    fn unix_now(&self) -> i64;
}

pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn unix_now(&self) -> i64 {
        SystemTime::now().duration_since(UNIX_EPOCH).expect("the system clock is set before 1970").as_secs() as i64
    }
}

pub fn system_time_source() -> Arc<dyn TimeSource> {
    Arc::new(SystemTimeSource)
}

/// A manually driven clock for tests.
pub struct ManualTimeSource {
    now: std::sync::atomic::AtomicI64,
}

impl ManualTimeSource {
    pub fn new(now: i64) -> Self {
        Self { now: std::sync::atomic::AtomicI64::new(now) }
    }

    pub fn set(&self, now: i64) {
        self.now.store(now, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn advance(&self, seconds: i64) {
        self.now.fetch_add(seconds, std::sync::atomic::Ordering::SeqCst);
    }
}

impl TimeSource for ManualTimeSource {
    fn unix_now(&self) -> i64 {
        self.now.load(std::sync::atomic::Ordering::SeqCst)
    }
}
