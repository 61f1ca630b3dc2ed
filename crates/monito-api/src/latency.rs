//! Synthetic network latency for the mock endpoints.

use std::time::Duration;

use rand::Rng;

/// Uniform delay applied before each response. Zero width disables it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Latency {
    min: Duration,
    max: Duration,
}

impl Latency {
    pub const DISABLED: Latency = Latency {
        min: Duration::ZERO,
        max: Duration::ZERO,
    };

    /// The dashboard's historical 100–300 ms.
    pub const DEFAULT_MOCK: Latency = Latency {
        min: Duration::from_millis(100),
        max: Duration::from_millis(300),
    };

    /// Delay drawn from `[min_ms, max_ms]`. A reversed range is collapsed to `min_ms`.
    pub fn between(min_ms: u64, max_ms: u64) -> Self {
        let min = Duration::from_millis(min_ms);
        let max = Duration::from_millis(max_ms.max(min_ms));
        Self { min, max }
    }

    pub fn is_disabled(&self) -> bool {
        self.max.is_zero()
    }

    pub fn min(&self) -> Duration {
        self.min
    }

    pub fn max(&self) -> Duration {
        self.max
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        let ms = rng.random_range(self.min.as_millis() as u64..=self.max.as_millis() as u64);
        Duration::from_millis(ms)
    }

    /// Sleep for one sampled delay.
    pub async fn pause(&self) {
        if self.is_disabled() {
            return;
        }
        let delay = self.sample(&mut rand::rng());
        tokio::time::sleep(delay).await;
    }
}
