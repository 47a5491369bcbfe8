//! Per-identity request rate limiting.
//!
//! Fixed window, not a token bucket: the window starts at the first request
//! and up to 2x the limit can land across a window boundary. That burst is
//! accepted behavior and must stay observable to callers relying on it.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

pub const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(5 * 60);
pub const RATE_LIMIT_MAX_REQUESTS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Denied,
}

#[derive(Debug, Clone)]
struct RateLimitRecord {
    count: u32,
    window_start: Instant,
}

/// Shared counter map. Every read-modify-write happens under one mutex so
/// concurrent requests for the same identity cannot both slip past the limit.
pub struct RateLimiter {
    window: Duration,
    max_requests: u32,
    entries: Mutex<HashMap<String, RateLimitRecord>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RATE_LIMIT_WINDOW, RATE_LIMIT_MAX_REQUESTS)
    }
}

impl RateLimiter {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            window,
            max_requests,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn check_and_record(&self, identity: &str) -> Decision {
        self.check_and_record_at(identity, Instant::now())
    }

    /// First request creates the record with `count = 1`. A lapsed window
    /// resets it. At the limit the request is denied without incrementing;
    /// otherwise the count goes up and the request is allowed.
    pub fn check_and_record_at(&self, identity: &str, now: Instant) -> Decision {
        let mut entries = self.entries.lock().expect("rate limiter mutex poisoned");

        match entries.get_mut(identity) {
            None => {
                entries.insert(
                    identity.to_string(),
                    RateLimitRecord {
                        count: 1,
                        window_start: now,
                    },
                );
                Decision::Allowed
            }
            Some(record) => {
                if now.duration_since(record.window_start) > self.window {
                    record.count = 1;
                    record.window_start = now;
                    Decision::Allowed
                } else if record.count >= self.max_requests {
                    Decision::Denied
                } else {
                    record.count += 1;
                    Decision::Allowed
                }
            }
        }
    }

    /// Drops records whose window has lapsed. Called by the background
    /// sweeper; without it the map grows with every identity ever seen.
    pub fn evict_expired(&self) -> usize {
        self.evict_expired_at(Instant::now())
    }

    pub fn evict_expired_at(&self, now: Instant) -> usize {
        let mut entries = self.entries.lock().expect("rate limiter mutex poisoned");
        let before = entries.len();
        entries.retain(|_, record| now.duration_since(record.window_start) <= self.window);
        before - entries.len()
    }

    pub fn tracked_identities(&self) -> usize {
        self.entries.lock().expect("rate limiter mutex poisoned").len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IDENTITY: &str = "6281234567890";

    #[test]
    fn test_first_requests_allowed_up_to_limit() {
        let limiter = RateLimiter::default();
        let now = Instant::now();
        for _ in 0..RATE_LIMIT_MAX_REQUESTS {
            assert_eq!(limiter.check_and_record_at(IDENTITY, now), Decision::Allowed);
        }
    }

    #[test]
    fn test_fourth_request_in_window_denied() {
        let limiter = RateLimiter::default();
        let now = Instant::now();
        for _ in 0..3 {
            limiter.check_and_record_at(IDENTITY, now);
        }
        assert_eq!(limiter.check_and_record_at(IDENTITY, now), Decision::Denied);
        // Denial does not consume a slot, so the next one is still denied.
        assert_eq!(limiter.check_and_record_at(IDENTITY, now), Decision::Denied);
    }

    #[test]
    fn test_window_lapse_resets_counter() {
        let limiter = RateLimiter::default();
        let start = Instant::now();
        for _ in 0..3 {
            limiter.check_and_record_at(IDENTITY, start);
        }
        assert_eq!(limiter.check_and_record_at(IDENTITY, start), Decision::Denied);

        let after_window = start + RATE_LIMIT_WINDOW + Duration::from_secs(1);
        assert_eq!(
            limiter.check_and_record_at(IDENTITY, after_window),
            Decision::Allowed
        );
        // The reset opened a fresh window with two slots left.
        assert_eq!(
            limiter.check_and_record_at(IDENTITY, after_window),
            Decision::Allowed
        );
    }

    #[test]
    fn test_identities_are_independent() {
        let limiter = RateLimiter::default();
        let now = Instant::now();
        for _ in 0..3 {
            limiter.check_and_record_at(IDENTITY, now);
        }
        assert_eq!(limiter.check_and_record_at(IDENTITY, now), Decision::Denied);
        assert_eq!(
            limiter.check_and_record_at("6289876543210", now),
            Decision::Allowed
        );
    }

    #[test]
    fn test_evict_expired_drops_lapsed_windows() {
        let limiter = RateLimiter::default();
        let start = Instant::now();
        limiter.check_and_record_at(IDENTITY, start);
        limiter.check_and_record_at("6289876543210", start);
        assert_eq!(limiter.tracked_identities(), 2);

        let evicted =
            limiter.evict_expired_at(start + RATE_LIMIT_WINDOW + Duration::from_secs(1));
        assert_eq!(evicted, 2);
        assert_eq!(limiter.tracked_identities(), 0);
    }

    #[test]
    fn test_evict_keeps_live_windows() {
        let limiter = RateLimiter::default();
        let start = Instant::now();
        limiter.check_and_record_at(IDENTITY, start);

        let evicted = limiter.evict_expired_at(start + Duration::from_secs(60));
        assert_eq!(evicted, 0);
        assert_eq!(limiter.tracked_identities(), 1);
    }
}
