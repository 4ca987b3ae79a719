//! Login throttling
//!
//! Limits failed sign-in attempts per e-mail address within a fixed window.

use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::error::AppError;

const DEFAULT_MAX_TRACKED_KEYS: usize = 10_000;

#[derive(Debug, Clone)]
struct AttemptEntry {
    /// Failures in current window
    count: u32,
    window_start: Instant,
}

impl AttemptEntry {
    fn is_new_window(&self, window_duration: Duration) -> bool {
        self.window_start.elapsed() >= window_duration
    }
}

/// Failed-login limiter
pub struct LoginThrottle {
    entries: RwLock<HashMap<String, AttemptEntry>>,
    max_failures: u32,
    window_duration: Duration,
    max_tracked_keys: usize,
}

impl LoginThrottle {
    pub fn new(max_failures: u32, window_duration: Duration) -> Self {
        Self::with_max_tracked_keys(max_failures, window_duration, DEFAULT_MAX_TRACKED_KEYS)
    }

    /// Create a limiter with an explicit in-memory key cap
    pub fn with_max_tracked_keys(
        max_failures: u32,
        window_duration: Duration,
        max_tracked_keys: usize,
    ) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_failures: max_failures.max(1),
            window_duration,
            max_tracked_keys: max_tracked_keys.max(1),
        }
    }

    fn prune_expired_locked(
        entries: &mut HashMap<String, AttemptEntry>,
        window_duration: Duration,
    ) -> usize {
        let before = entries.len();
        entries.retain(|_, value| !value.is_new_window(window_duration));
        before - entries.len()
    }

    fn evict_oldest_locked(entries: &mut HashMap<String, AttemptEntry>) {
        let oldest_key = entries
            .iter()
            .min_by_key(|(_, value)| value.window_start)
            .map(|(key, _)| key.clone());
        if let Some(key) = oldest_key {
            entries.remove(&key);
        }
    }

    /// Fail with `AppError::RateLimited` while `key` is locked out
    pub async fn check(&self, key: &str) -> Result<(), AppError> {
        let entries = self.entries.read().await;
        match entries.get(key) {
            Some(entry)
                if !entry.is_new_window(self.window_duration)
                    && entry.count >= self.max_failures =>
            {
                Err(AppError::RateLimited)
            }
            _ => Ok(()),
        }
    }

    /// Count one failed attempt for `key`
    pub async fn record_failure(&self, key: &str) {
        let mut entries = self.entries.write().await;

        if !entries.contains_key(key) && entries.len() >= self.max_tracked_keys {
            Self::prune_expired_locked(&mut entries, self.window_duration);
            if entries.len() >= self.max_tracked_keys {
                Self::evict_oldest_locked(&mut entries);
            }
        }

        let entry = entries.entry(key.to_string()).or_insert_with(|| AttemptEntry {
            count: 0,
            window_start: Instant::now(),
        });

        if entry.is_new_window(self.window_duration) {
            entry.count = 1;
            entry.window_start = Instant::now();
        } else {
            entry.count += 1;
        }
    }

    /// Forget failures for `key` after a successful sign-in
    pub async fn reset(&self, key: &str) {
        self.entries.write().await.remove(key);
    }

    /// Failures counted for `key` in the current window
    pub async fn failures(&self, key: &str) -> u32 {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|e| !e.is_new_window(self.window_duration))
            .map(|e| e.count)
            .unwrap_or(0)
    }

    /// Drop entries whose window has passed
    pub async fn prune_old(&self) {
        let mut entries = self.entries.write().await;
        let removed = Self::prune_expired_locked(&mut entries, self.window_duration);

        if removed > 0 {
            tracing::debug!(removed, "Pruned expired login throttle entries");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn locks_out_after_max_failures() {
        let throttle = LoginThrottle::new(3, Duration::from_secs(1));

        for _ in 0..3 {
            assert!(throttle.check("a@example.com").await.is_ok());
            throttle.record_failure("a@example.com").await;
        }
        assert!(matches!(
            throttle.check("a@example.com").await,
            Err(AppError::RateLimited)
        ));

        // Other keys are unaffected
        assert!(throttle.check("b@example.com").await.is_ok());

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert!(throttle.check("a@example.com").await.is_ok());
    }

    #[tokio::test]
    async fn reset_clears_failures() {
        let throttle = LoginThrottle::new(2, Duration::from_secs(60));
        throttle.record_failure("a@example.com").await;
        throttle.record_failure("a@example.com").await;
        assert!(throttle.check("a@example.com").await.is_err());

        throttle.reset("a@example.com").await;
        assert_eq!(throttle.failures("a@example.com").await, 0);
        assert!(throttle.check("a@example.com").await.is_ok());
    }

    #[tokio::test]
    async fn max_tracked_keys_evicts_oldest_entry() {
        let throttle = LoginThrottle::with_max_tracked_keys(10, Duration::from_secs(60), 2);

        throttle.record_failure("k1").await;
        tokio::time::sleep(Duration::from_millis(1)).await;
        throttle.record_failure("k2").await;
        tokio::time::sleep(Duration::from_millis(1)).await;
        throttle.record_failure("k3").await;

        assert_eq!(throttle.failures("k1").await, 0);
        assert_eq!(throttle.failures("k2").await, 1);
        assert_eq!(throttle.failures("k3").await, 1);
    }
}
