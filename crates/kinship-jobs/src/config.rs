//! Batch run configuration.

use std::time::Duration;

use kinship_core::defaults;

/// Immutable parameters for one batch run.
///
/// Threaded explicitly through the batch processor; there is no ambient
/// global configuration.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Number of contacts processed together in one batch.
    pub batch_size: usize,
    /// Pause between consecutive batches.
    pub delay_between_batches: Duration,
    /// Stagger offset applied per contact within a batch.
    pub delay_between_contacts: Duration,
    /// Hard ceiling on contacts handled in a single invocation.
    pub max_contacts_per_run: usize,
    /// In-run attempts for a transiently failing contact.
    pub retry_attempts: u32,
    /// Base retry delay before backoff is applied.
    pub retry_delay: Duration,
    /// Upper bound on any single backoff or cooldown delay.
    pub max_retry_delay: Duration,
    /// Exponential backoff multiplier.
    pub backoff_multiplier: f64,
    /// HTTP status codes treated as upstream rate-limit signals.
    pub rate_limit_status_codes: Vec<u16>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: defaults::BATCH_SIZE,
            delay_between_batches: Duration::from_millis(defaults::DELAY_BETWEEN_BATCHES_MS),
            delay_between_contacts: Duration::from_millis(defaults::DELAY_BETWEEN_CONTACTS_MS),
            max_contacts_per_run: defaults::MAX_CONTACTS_PER_RUN,
            retry_attempts: defaults::RETRY_ATTEMPTS,
            retry_delay: Duration::from_millis(defaults::RETRY_DELAY_MS),
            max_retry_delay: Duration::from_millis(defaults::MAX_RETRY_DELAY_MS),
            backoff_multiplier: defaults::BACKOFF_MULTIPLIER,
            rate_limit_status_codes: defaults::RATE_LIMIT_STATUS_CODES.to_vec(),
        }
    }
}

fn env_usize(name: &str, default: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_millis(name: &str, default_ms: u64) -> Duration {
    let ms = std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default_ms);
    Duration::from_millis(ms)
}

impl BatchConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `BATCH_SIZE` | `20` | Contacts per batch |
    /// | `DELAY_BETWEEN_BATCHES_MS` | `5000` | Pause between batches |
    /// | `DELAY_BETWEEN_CONTACTS_MS` | `1000` | Per-contact stagger within a batch |
    /// | `MAX_CONTACTS_PER_RUN` | `100` | Ceiling per invocation |
    /// | `RETRY_ATTEMPTS` | `3` | In-run attempts per contact |
    /// | `RETRY_DELAY_MS` | `2000` | Base backoff delay |
    /// | `MAX_RETRY_DELAY_MS` | `30000` | Backoff/cooldown cap |
    /// | `BACKOFF_MULTIPLIER` | `2.0` | Exponential backoff factor |
    /// | `RATE_LIMIT_STATUS_CODES` | `429,503` | Comma-separated status list |
    pub fn from_env() -> Self {
        let defaults_config = Self::default();

        let rate_limit_status_codes = std::env::var("RATE_LIMIT_STATUS_CODES")
            .ok()
            .map(|v| {
                v.split(',')
                    .filter_map(|s| s.trim().parse().ok())
                    .collect::<Vec<u16>>()
            })
            .filter(|codes| !codes.is_empty())
            .unwrap_or(defaults_config.rate_limit_status_codes);

        Self {
            batch_size: env_usize("BATCH_SIZE", defaults::BATCH_SIZE).max(1),
            delay_between_batches: env_millis(
                "DELAY_BETWEEN_BATCHES_MS",
                defaults::DELAY_BETWEEN_BATCHES_MS,
            ),
            delay_between_contacts: env_millis(
                "DELAY_BETWEEN_CONTACTS_MS",
                defaults::DELAY_BETWEEN_CONTACTS_MS,
            ),
            max_contacts_per_run: env_usize("MAX_CONTACTS_PER_RUN", defaults::MAX_CONTACTS_PER_RUN),
            retry_attempts: std::env::var("RETRY_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults::RETRY_ATTEMPTS)
                .max(1),
            retry_delay: env_millis("RETRY_DELAY_MS", defaults::RETRY_DELAY_MS),
            max_retry_delay: env_millis("MAX_RETRY_DELAY_MS", defaults::MAX_RETRY_DELAY_MS),
            backoff_multiplier: std::env::var("BACKOFF_MULTIPLIER")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults::BACKOFF_MULTIPLIER),
            rate_limit_status_codes,
        }
    }

    /// Set the batch size.
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Set the pause between batches.
    pub fn with_delay_between_batches(mut self, delay: Duration) -> Self {
        self.delay_between_batches = delay;
        self
    }

    /// Set the per-contact stagger within a batch.
    pub fn with_delay_between_contacts(mut self, delay: Duration) -> Self {
        self.delay_between_contacts = delay;
        self
    }

    /// Set the per-invocation contact ceiling.
    pub fn with_max_contacts_per_run(mut self, max: usize) -> Self {
        self.max_contacts_per_run = max;
        self
    }

    /// Set the in-run retry attempts.
    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts.max(1);
        self
    }

    /// Set the base retry delay.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// True when the status code is configured as a rate-limit signal.
    pub fn is_rate_limit(&self, status: Option<u16>) -> bool {
        status
            .map(|s| self.rate_limit_status_codes.contains(&s))
            .unwrap_or(false)
    }

    /// Backoff delay for the given attempt number (1-based), without jitter.
    ///
    /// `min(max_retry_delay, retry_delay × multiplier^(attempt−1))`
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let ms = self.retry_delay.as_millis() as f64 * self.backoff_multiplier.powi(exponent);
        Duration::from_millis((ms as u64).min(self.max_retry_delay.as_millis() as u64))
    }

    /// Extra cross-batch cooldown applied after a rate-limited batch.
    ///
    /// `min(max_retry_delay, delay_between_batches × multiplier)`
    pub fn cooldown_delay(&self) -> Duration {
        let ms = self.delay_between_batches.as_millis() as f64 * self.backoff_multiplier;
        Duration::from_millis((ms as u64).min(self.max_retry_delay.as_millis() as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = BatchConfig::default();
        assert_eq!(config.batch_size, 20);
        assert_eq!(config.delay_between_batches, Duration::from_millis(5000));
        assert_eq!(config.delay_between_contacts, Duration::from_millis(1000));
        assert_eq!(config.max_contacts_per_run, 100);
        assert_eq!(config.retry_attempts, 3);
        assert_eq!(config.retry_delay, Duration::from_millis(2000));
        assert_eq!(config.max_retry_delay, Duration::from_millis(30000));
        assert_eq!(config.backoff_multiplier, 2.0);
        assert_eq!(config.rate_limit_status_codes, vec![429, 503]);
    }

    #[test]
    fn test_config_builder() {
        let config = BatchConfig::default()
            .with_batch_size(5)
            .with_retry_attempts(2)
            .with_delay_between_batches(Duration::from_millis(100))
            .with_delay_between_contacts(Duration::from_millis(10))
            .with_max_contacts_per_run(7)
            .with_retry_delay(Duration::from_millis(50));

        assert_eq!(config.batch_size, 5);
        assert_eq!(config.retry_attempts, 2);
        assert_eq!(config.delay_between_batches, Duration::from_millis(100));
        assert_eq!(config.delay_between_contacts, Duration::from_millis(10));
        assert_eq!(config.max_contacts_per_run, 7);
        assert_eq!(config.retry_delay, Duration::from_millis(50));
    }

    #[test]
    fn test_zero_batch_size_clamped_to_one() {
        let config = BatchConfig::default().with_batch_size(0);
        assert_eq!(config.batch_size, 1);
    }

    #[test]
    fn test_backoff_delay_grows_exponentially() {
        let config = BatchConfig::default();
        assert_eq!(config.backoff_delay(1), Duration::from_millis(2000));
        assert_eq!(config.backoff_delay(2), Duration::from_millis(4000));
        assert_eq!(config.backoff_delay(3), Duration::from_millis(8000));
    }

    #[test]
    fn test_backoff_delay_caps_at_max() {
        let config = BatchConfig::default();
        assert_eq!(config.backoff_delay(10), Duration::from_millis(30000));
    }

    #[test]
    fn test_cooldown_delay_is_scaled_batch_delay() {
        let config = BatchConfig::default();
        // min(30000, 5000 × 2.0)
        assert_eq!(config.cooldown_delay(), Duration::from_millis(10000));
    }

    #[test]
    fn test_cooldown_delay_caps_at_max() {
        let config = BatchConfig::default()
            .with_delay_between_batches(Duration::from_millis(20000));
        assert_eq!(config.cooldown_delay(), Duration::from_millis(30000));
    }

    #[test]
    fn test_is_rate_limit() {
        let config = BatchConfig::default();
        assert!(config.is_rate_limit(Some(429)));
        assert!(config.is_rate_limit(Some(503)));
        assert!(!config.is_rate_limit(Some(500)));
        assert!(!config.is_rate_limit(None));
    }
}
