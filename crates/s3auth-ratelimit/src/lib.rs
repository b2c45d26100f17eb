//! Per-IP login rate limiting.
//!
//! A sharded concurrent map from client IP to `(count, first_try, last_try)`
//! gates login attempts before credentials are ever checked. `DashMap`
//! supplies the per-shard locking directly — the map itself is the only
//! shared mutable state here, so there is nothing above it to additionally
//! guard.

use std::time::Duration;

use dashmap::DashMap;
use s3auth_core::AuthConfig;
use tracing::debug;

const DEFAULT_WINDOW_SECONDS: i64 = 60;
const EVICTION_INTERVAL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, Copy)]
struct Entry {
    count: u32,
    first_try: i64,
    last_try: i64,
}

/// A per-IP sliding-window login rate limiter.
#[derive(Debug)]
pub struct RateLimiter {
    entries: DashMap<String, Entry>,
    max_attempts: u32,
    window_seconds: i64,
}

impl RateLimiter {
    /// Build a limiter with explicit `max_attempts`/`window_seconds`.
    #[must_use]
    pub fn new(max_attempts: u32, window_seconds: i64) -> Self {
        Self { entries: DashMap::new(), max_attempts, window_seconds }
    }

    /// Build a limiter from config defaults (`max_attempts` from
    /// `ratelimit_login_per_minute`; the window is fixed at 60 s).
    #[must_use]
    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(config.ratelimit_login_per_minute, DEFAULT_WINDOW_SECONDS)
    }

    /// The gate consulted before accepting a login attempt.
    ///
    /// On first contact, initializes the entry (count=1) and returns `true`.
    /// If the window has elapsed since `first_try`, the entry slides forward
    /// and returns `true`. If `count >= max_attempts`, returns `false`
    /// without updating state. Otherwise increments the count and returns `true`.
    #[must_use]
    pub fn allow(&self, ip: &str, now: i64) -> bool {
        let mut entry = self.entries.entry(ip.to_owned()).or_insert(Entry { count: 0, first_try: now, last_try: now });

        if entry.count == 0 {
            entry.count = 1;
            entry.first_try = now;
            entry.last_try = now;
            return true;
        }

        if now - entry.first_try > self.window_seconds {
            entry.count = 1;
            entry.first_try = now;
            entry.last_try = now;
            return true;
        }

        if entry.count >= self.max_attempts {
            return false;
        }

        entry.count += 1;
        entry.last_try = now;
        true
    }

    /// Record a failed verification, independent of `allow`'s bookkeeping.
    /// Shares the same window-slide semantics.
    pub fn record_failed(&self, ip: &str, now: i64) {
        let mut entry = self.entries.entry(ip.to_owned()).or_insert(Entry { count: 0, first_try: now, last_try: now });

        if entry.count == 0 || now - entry.first_try > self.window_seconds {
            entry.count = 1;
            entry.first_try = now;
        } else {
            entry.count += 1;
        }
        entry.last_try = now;
    }

    /// Remove an IP's entry entirely (e.g. after a successful login).
    pub fn reset(&self, ip: &str) {
        self.entries.remove(ip);
    }

    /// Current attempt count for an IP, `0` if absent.
    #[must_use]
    pub fn get_attempts(&self, ip: &str) -> u32 {
        self.entries.get(ip).map_or(0, |e| e.count)
    }

    /// Evict entries whose `last_try` is older than the window.
    fn evict_stale(&self, now: i64) {
        let window = self.window_seconds;
        self.entries.retain(|_, entry| now - entry.last_try <= window);
    }

    /// Number of tracked IPs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no IPs are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Spawn the background eviction sweep, running every 5 minutes for the
/// lifetime of the returned task.
pub fn spawn_eviction_task(limiter: std::sync::Arc<RateLimiter>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(EVICTION_INTERVAL).await;
            let now = chrono_now();
            debug!(tracked = limiter.len(), "running rate-limiter eviction sweep");
            limiter.evict_stale(now);
        }
    })
}

fn chrono_now() -> i64 {
    chrono::Utc::now().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_allow_first_attempt() {
        let limiter = RateLimiter::new(5, 60);
        assert!(limiter.allow("1.2.3.4", 1000));
        assert_eq!(limiter.get_attempts("1.2.3.4"), 1);
    }

    #[test]
    fn test_should_deny_after_max_attempts() {
        let limiter = RateLimiter::new(2, 60);
        assert!(limiter.allow("1.2.3.4", 1000));
        assert!(limiter.allow("1.2.3.4", 1001));
        assert!(!limiter.allow("1.2.3.4", 1002));
    }

    #[test]
    fn test_should_slide_window_after_expiry() {
        let limiter = RateLimiter::new(1, 60);
        assert!(limiter.allow("1.2.3.4", 1000));
        assert!(!limiter.allow("1.2.3.4", 1010));
        assert!(limiter.allow("1.2.3.4", 1100));
    }

    #[test]
    fn test_should_reset_entry() {
        let limiter = RateLimiter::new(1, 60);
        limiter.allow("1.2.3.4", 1000);
        limiter.reset("1.2.3.4");
        assert_eq!(limiter.get_attempts("1.2.3.4"), 0);
    }

    #[test]
    fn test_should_record_failed_independent_of_allow() {
        let limiter = RateLimiter::new(3, 60);
        limiter.record_failed("1.2.3.4", 1000);
        limiter.record_failed("1.2.3.4", 1001);
        assert_eq!(limiter.get_attempts("1.2.3.4"), 2);
    }

    #[test]
    fn test_should_evict_stale_entries() {
        let limiter = RateLimiter::new(5, 60);
        limiter.allow("1.2.3.4", 1000);
        limiter.evict_stale(2000);
        assert!(limiter.is_empty());
    }

    #[test]
    fn test_should_isolate_entries_by_ip() {
        let limiter = RateLimiter::new(1, 60);
        assert!(limiter.allow("1.1.1.1", 1000));
        assert!(limiter.allow("2.2.2.2", 1000));
        assert_eq!(limiter.len(), 2);
    }
}
