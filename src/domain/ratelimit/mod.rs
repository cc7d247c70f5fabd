use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Per-user sliding-window request admission control.
///
/// State is in-memory only; a process restart resets all windows. The whole
/// table sits behind one mutex, which is enough at the request rates this
/// service sees. The prune-check-append sequence for a user happens entirely
/// under the lock, so concurrent requests from the same user cannot both
/// slip under the limit.
pub struct RateLimiter {
    window: Duration,
    limit: usize,
    buckets: Mutex<HashMap<String, Vec<Instant>>>,
}

#[derive(Debug, PartialEq)]
pub enum Admission {
    Allowed,
    RateLimited,
}

impl RateLimiter {
    pub fn new(window: Duration, limit: usize) -> Self {
        Self {
            window,
            limit,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Prune timestamps older than the window, then admit or reject.
    pub fn admit(&self, user: &str) -> Admission {
        let now = Instant::now();
        let mut buckets = self.buckets.lock().unwrap();
        let timestamps = buckets.entry(user.to_string()).or_default();

        timestamps.retain(|t| now.duration_since(*t) < self.window);

        if timestamps.len() >= self.limit {
            tracing::warn!(
                user = %user,
                requests_in_window = timestamps.len(),
                limit = self.limit,
                "Rate limit exceeded"
            );
            return Admission::RateLimited;
        }

        timestamps.push(now);
        Admission::Allowed
    }
}
