// Sliding-window rate limiting per client address

use super::{Middleware, Next};
use crate::logging::{debug, warn};
use crate::{Error, HttpResponse, RequestContext};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

/// Configuration for [`RateLimitMiddleware`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Requests allowed per window
    pub limit: usize,
    /// Window length in seconds
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            limit: 60,
            window_secs: 60,
        }
    }
}

/// Limits each client address to `limit` requests per sliding window.
///
/// Requests without a known remote address share one bucket.
#[derive(Debug, Default)]
pub struct RateLimitMiddleware {
    config: RateLimitConfig,
    hits: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl RateLimitMiddleware {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            hits: Mutex::new(HashMap::new()),
        }
    }

    fn window(&self) -> Duration {
        Duration::from_secs(self.config.window_secs)
    }

    /// Record a hit for `client` at `now`, or return how long until the
    /// oldest hit in the window expires.
    fn check(&self, client: &str, now: Instant) -> Result<usize, Duration> {
        let window = self.window();
        let mut hits = self.hits.lock();

        // Drop buckets that have gone quiet
        hits.retain(|_, times| {
            while times.front().is_some_and(|t| now.duration_since(*t) >= window) {
                times.pop_front();
            }
            !times.is_empty()
        });

        let times = hits.entry(client.to_string()).or_default();
        if times.len() >= self.config.limit {
            let oldest = times.front().copied().unwrap_or(now);
            return Err(window.saturating_sub(now.duration_since(oldest)));
        }

        times.push_back(now);
        Ok(self.config.limit - times.len())
    }

    /// Number of clients with hits inside the current window
    pub fn tracked_clients(&self) -> usize {
        self.hits.lock().len()
    }
}

impl Middleware for RateLimitMiddleware {
    fn handle(&self, ctx: &mut RequestContext, next: Next<'_>) -> Result<HttpResponse, Error> {
        let client = ctx
            .remote_addr
            .map(|addr| addr.to_string())
            .unwrap_or_else(|| "unknown".to_string());

        match self.check(&client, Instant::now()) {
            Ok(remaining) => {
                debug!(client = %client, remaining, "Rate limit check passed");
                let response = next.run(ctx)?;
                Ok(response
                    .with_header("X-RateLimit-Limit", self.config.limit.to_string())
                    .with_header("X-RateLimit-Remaining", remaining.to_string()))
            }
            Err(retry_after) => {
                let seconds = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
                warn!(client = %client, retry_after = seconds, "Rate limit exceeded");
                Ok(HttpResponse::too_many_requests()
                    .with_json(&json!({ "error": "Too Many Requests", "status": 429 }))?
                    .with_header("Retry-After", seconds.max(1).to_string())
                    .with_header("X-RateLimit-Limit", self.config.limit.to_string())
                    .with_header("X-RateLimit-Remaining", "0"))
            }
        }
    }

    fn name(&self) -> &str {
        "rate_limit"
    }
}
