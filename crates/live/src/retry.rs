use std::time::Duration;

use tokio::time::{sleep_until, Instant};

/// Fixed-delay reconnect timer.
///
/// At most one timer is armed at a time: scheduling while one is pending
/// replaces it, so a close event produces exactly one fire. There is no
/// backoff and no attempt limit. Dropping the retry drops the timer.
#[derive(Debug)]
pub struct ManagedRetry {
    delay: Duration,
    deadline: Option<Instant>,
}

impl ManagedRetry {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Arm the timer `delay` from now, replacing any pending one.
    pub fn schedule(&mut self) {
        self.deadline = Some(Instant::now() + self.delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Resolves once when the armed timer elapses and disarms it. Never
    /// resolves while nothing is scheduled.
    ///
    /// Cancel-safe: dropping the future before it resolves keeps the timer
    /// armed, so it can be polled again from a `select!` loop.
    pub async fn fired(&mut self) {
        match self.deadline {
            Some(deadline) => {
                sleep_until(deadline).await;
                self.deadline = None;
            }
            None => std::future::pending::<()>().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    async fn fires_within(retry: &mut ManagedRetry, window: Duration) -> bool {
        timeout(window, retry.fired()).await.is_ok()
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_once_after_delay() {
        let mut retry = ManagedRetry::new(Duration::from_secs(2));
        retry.schedule();
        assert!(retry.is_pending());

        assert!(!fires_within(&mut retry, Duration::from_millis(1999)).await);
        assert!(retry.is_pending());
        assert!(fires_within(&mut retry, Duration::from_millis(10)).await);
        assert!(!retry.is_pending());

        // Nothing scheduled again: no second fire.
        assert!(!fires_within(&mut retry, Duration::from_secs(60)).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rescheduling_replaces_pending_timer() {
        let mut retry = ManagedRetry::new(Duration::from_secs(2));
        retry.schedule();
        tokio::time::advance(Duration::from_secs(1)).await;
        retry.schedule();

        let mut fires = 0;
        for _ in 0..5 {
            if fires_within(&mut retry, Duration::from_secs(10)).await {
                fires += 1;
            }
        }
        assert_eq!(fires, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_clears_timer() {
        let mut retry = ManagedRetry::new(Duration::from_secs(2));
        retry.schedule();
        retry.cancel();
        assert!(!retry.is_pending());
        assert!(!fires_within(&mut retry, Duration::from_secs(10)).await);
    }
}
