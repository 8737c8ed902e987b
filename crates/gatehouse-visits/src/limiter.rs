//! Fixed-window rate limiter for the public scan path, which has no
//! other abuse control — physical possession of a pass is its only
//! credential.

use std::time::{Duration, Instant};

use dashmap::DashMap;

struct Window {
    started: Instant,
    count: u32,
}

/// Small fixed quota per time window per caller key.
pub struct FixedWindowLimiter {
    max: u32,
    window: Duration,
    hits: DashMap<String, Window>,
}

impl FixedWindowLimiter {
    pub fn new(max: u32, window: Duration) -> Self {
        Self {
            max,
            window,
            hits: DashMap::new(),
        }
    }

    /// Record a hit for `caller` and report whether it is within quota.
    pub fn allow(&self, caller: &str) -> bool {
        let now = Instant::now();
        // Caller keys are unauthenticated input, so lapsed windows are
        // swept on every hit; otherwise the map grows with every
        // distinct key ever seen.
        self.hits
            .retain(|_, w| now.duration_since(w.started) < self.window);
        let mut entry = self.hits.entry(caller.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });
        entry.count += 1;
        entry.count <= self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_enforced_per_caller() {
        let limiter = FixedWindowLimiter::new(3, Duration::from_secs(60));
        for _ in 0..3 {
            assert!(limiter.allow("kiosk-1"));
        }
        assert!(!limiter.allow("kiosk-1"));
        // Independent caller unaffected.
        assert!(limiter.allow("kiosk-2"));
    }

    #[test]
    fn lapsed_windows_are_evicted() {
        let limiter = FixedWindowLimiter::new(1, Duration::from_millis(20));
        for i in 0..50 {
            limiter.allow(&format!("spoofed-{i}"));
        }
        assert_eq!(limiter.hits.len(), 50);

        std::thread::sleep(Duration::from_millis(25));
        limiter.allow("fresh");
        // Only the live window survives the sweep.
        assert_eq!(limiter.hits.len(), 1);
    }

    #[test]
    fn window_resets() {
        let limiter = FixedWindowLimiter::new(1, Duration::from_millis(20));
        assert!(limiter.allow("kiosk"));
        assert!(!limiter.allow("kiosk"));
        std::thread::sleep(Duration::from_millis(25));
        assert!(limiter.allow("kiosk"));
    }
}
