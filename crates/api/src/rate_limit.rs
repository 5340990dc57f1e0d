use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Sliding-window request counter keyed by client address.
#[derive(Debug, Clone)]
pub struct IpRateLimiter {
    hits: Arc<Mutex<HashMap<String, VecDeque<Instant>>>>,
    window: Duration,
    max_requests: usize,
}

impl IpRateLimiter {
    pub fn new(window: Duration, max_requests: usize) -> Self {
        Self {
            hits: Arc::new(Mutex::new(HashMap::new())),
            window,
            max_requests,
        }
    }

    pub fn allow(&self, client: &str) -> bool {
        self.allow_at(client, Instant::now())
    }

    fn allow_at(&self, client: &str, now: Instant) -> bool {
        let mut hits = self.hits.lock();
        let queue = hits.entry(client.to_string()).or_default();

        while queue
            .front()
            .is_some_and(|seen| now.duration_since(*seen) > self.window)
        {
            queue.pop_front();
        }

        if queue.len() >= self.max_requests {
            return false;
        }
        queue.push_back(now);

        // Drop idle clients so the map does not grow with every address seen.
        if hits.len() > 4_096 {
            let window = self.window;
            hits.retain(|_, queue| {
                queue
                    .back()
                    .is_some_and(|last| now.duration_since(*last) <= window)
            });
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_after_limit_within_window() {
        let limiter = IpRateLimiter::new(Duration::from_secs(60), 2);
        let start = Instant::now();

        assert!(limiter.allow_at("10.0.0.1", start));
        assert!(limiter.allow_at("10.0.0.1", start));
        assert!(!limiter.allow_at("10.0.0.1", start));
        assert!(limiter.allow_at("10.0.0.2", start));
    }

    #[test]
    fn window_expiry_frees_capacity() {
        let limiter = IpRateLimiter::new(Duration::from_secs(1), 1);
        let start = Instant::now();

        assert!(limiter.allow_at("local", start));
        assert!(!limiter.allow_at("local", start + Duration::from_millis(500)));
        assert!(limiter.allow_at("local", start + Duration::from_secs(2)));
    }
}
