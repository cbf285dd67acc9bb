// Time Provider Port (for testability)

/// Time provider interface (allows mocking in tests)
pub trait TimeProvider: Send + Sync {
    /// Get current time in microseconds since epoch
    fn now_micros(&self) -> i64;

    /// Get current time in milliseconds since epoch
    fn now_millis(&self) -> i64 {
        self.now_micros().div_euclid(1000)
    }

    /// Get current time in whole seconds since epoch
    fn now_secs(&self) -> i64 {
        self.now_micros().div_euclid(1_000_000)
    }
}

/// System time provider (production)
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now_micros(&self) -> i64 {
        chrono::Utc::now().timestamp_micros()
    }
}

pub mod mocks {
    use super::*;
    use std::sync::atomic::{AtomicI64, Ordering};

    /// Clock that only moves when told to
    pub struct ManualTimeProvider {
        micros: AtomicI64,
    }

    impl ManualTimeProvider {
        pub fn at_secs(secs: i64) -> Self {
            Self {
                micros: AtomicI64::new(secs * 1_000_000),
            }
        }

        pub fn advance_secs(&self, secs: i64) {
            self.micros.fetch_add(secs * 1_000_000, Ordering::SeqCst);
        }
    }

    impl TimeProvider for ManualTimeProvider {
        fn now_micros(&self) -> i64 {
            self.micros.load(Ordering::SeqCst)
        }
    }

    /// System clock shifted by a fixed offset (simulates the passage of time)
    pub struct OffsetTimeProvider {
        pub offset_secs: i64,
    }

    impl TimeProvider for OffsetTimeProvider {
        fn now_micros(&self) -> i64 {
            SystemTimeProvider.now_micros() + self.offset_secs * 1_000_000
        }
    }
}
