use std::time::Duration;
use tokio::time::sleep;

/// Minimum-interval pacer between provider calls.
///
/// The provider rate-limits bursts, so bulk operations wait this long
/// after every attempt. The interval is policy, not a hard-coded sleep:
/// binaries read it from `UPLOAD_DELAY_MS` and tests use a zero
/// interval.
#[derive(Debug, Clone)]
pub struct Pacer {
    interval: Duration,
}

impl Pacer {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Waits out the configured interval.
    pub async fn pause(&self) {
        if !self.interval.is_zero() {
            sleep(self.interval).await;
        }
    }
}

impl Default for Pacer {
    /// One second between provider calls.
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}
