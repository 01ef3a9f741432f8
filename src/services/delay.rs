use std::time::Duration;

/// Resolves after `duration`
pub async fn delay(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}

/// Simulated network latency for the local repositories
///
/// Single-record reads and deletes wait `short`, list reads and writes wait
/// `medium`, label filters wait `long`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Latency {
    pub short: Duration,
    pub medium: Duration,
    pub long: Duration,
}

impl Default for Latency {
    fn default() -> Self {
        Self {
            short: Duration::from_millis(200),
            medium: Duration::from_millis(300),
            long: Duration::from_millis(400),
        }
    }
}

impl Latency {
    pub fn none() -> Self {
        Self {
            short: Duration::ZERO,
            medium: Duration::ZERO,
            long: Duration::ZERO,
        }
    }

    pub fn simulated(enabled: bool) -> Self {
        if enabled {
            Self::default()
        } else {
            Self::none()
        }
    }

    pub async fn short(&self) {
        delay(self.short).await
    }

    pub async fn medium(&self) {
        delay(self.medium).await
    }

    pub async fn long(&self) {
        delay(self.long).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_delay_waits_full_interval() {
        let start = tokio::time::Instant::now();
        delay(Duration::from_millis(300)).await;
        assert!(start.elapsed() >= Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_none_does_not_wait() {
        let start = tokio::time::Instant::now();
        let latency = Latency::none();
        latency.long().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_zero_delay_is_ready_on_first_poll() {
        let mut task = tokio_test::task::spawn(delay(Duration::ZERO));
        tokio_test::assert_ready!(task.poll());
    }

    #[test]
    fn test_simulated_toggle() {
        assert_eq!(Latency::simulated(false), Latency::none());
        assert_eq!(Latency::simulated(true).long, Duration::from_millis(400));
    }
}
