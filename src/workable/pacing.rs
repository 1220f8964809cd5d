//! Self-imposed pacing between successive page requests.
//! This is a throttle to stay under upstream rate limits, not a reaction to 429s.

use std::time::Duration;

use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagePacer {
    interval: Duration,
}

impl PagePacer {
    pub fn fixed(interval: Duration) -> Self {
        Self { interval }
    }

    /// No delay at all; used by tests and bulk tooling.
    pub fn disabled() -> Self {
        Self::fixed(Duration::ZERO)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait before requesting the next page. Callers skip this after the last page.
    pub async fn pause(&self) {
        if self.interval.is_zero() {
            return;
        }
        debug!(delay_ms = self.interval.as_millis() as u64, "pacing before next page");
        tokio::time::sleep(self.interval).await;
    }
}

impl Default for PagePacer {
    fn default() -> Self {
        Self::fixed(Duration::from_secs(2))
    }
}
