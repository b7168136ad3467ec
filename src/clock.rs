use std::time::{Duration, SystemTime};

/// Source of wall-clock time for a [`Generator`](crate::Generator).
///
/// The generator reads `now` once per allocation and calls `sleep` when the
/// sequence of the current time bucket is used up. Implement this to freeze
/// or step time in tests.
///
/// ```
/// use std::time::{Duration, SystemTime, UNIX_EPOCH};
/// use hostflake::Clock;
///
/// struct FixedTime;
///
/// impl Clock for FixedTime {
///     fn now(&self) -> SystemTime {
///         UNIX_EPOCH + Duration::from_secs(1_700_000_000)
///     }
///
///     fn sleep(&self, _dur: Duration) {}
/// }
///
/// assert_eq!(FixedTime.now(), UNIX_EPOCH + Duration::from_secs(1_700_000_000));
/// ```
pub trait Clock: Send + Sync {
    fn now(&self) -> SystemTime;

    /// Blocks the calling thread for `dur`.
    fn sleep(&self, dur: Duration) {
        std::thread::sleep(dur);
    }
}

/// The operating system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}
