//! Fixed-window rate limiting per client.
//!
//! # Design Decisions
//! - One limiter per policy (login, api), each with its own table
//! - The read-check-increment for a key runs under the DashMap shard lock
//!   held by `entry()`, so concurrent requests never lose an update
//! - In-process only; counters do not survive a restart and are not shared
//!   between instances
//! - Table size is bounded: expired entries are swept when full, and a new
//!   client is denied if the table is still full (fail closed). The bound is
//!   re-checked after inserting, so racing new clients back out their own
//!   entry instead of growing the table past `max_entries`

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::Response,
};
use dashmap::{mapref::entry::Entry, DashMap};

use crate::config::RatePolicy;
use crate::error::GateError;
use crate::observability::metrics;

/// Outcome of a rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    Denied { retry_after_secs: u64 },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

#[derive(Debug)]
struct WindowEntry {
    count: u32,
    reset_at: Instant,
}

/// Counts requests per client key within a fixed window.
pub struct FixedWindowLimiter {
    name: &'static str,
    entries: DashMap<String, WindowEntry>,
    max_requests: u32,
    window: Duration,
    max_entries: usize,
}

impl FixedWindowLimiter {
    pub fn new(name: &'static str, max_requests: u32, window: Duration, max_entries: usize) -> Self {
        Self {
            name,
            entries: DashMap::new(),
            max_requests,
            window,
            max_entries,
        }
    }

    pub fn from_policy(name: &'static str, policy: &RatePolicy, max_entries: usize) -> Self {
        Self::new(
            name,
            policy.max_requests,
            Duration::from_secs(policy.window_secs),
            max_entries,
        )
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Record one request from `key` and decide whether it may proceed.
    pub fn check(&self, key: &str) -> RateDecision {
        self.check_at(key, Instant::now())
    }

    pub fn check_at(&self, key: &str, now: Instant) -> RateDecision {
        // len() takes every shard lock: never call it while an entry is held
        if !self.entries.contains_key(key) && self.entries.len() >= self.max_entries {
            self.sweep(now);
            if self.entries.len() >= self.max_entries {
                return self.deny_new_client();
            }
        }

        let (decision, inserted) = match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => (self.count(occupied.get_mut(), now), false),
            Entry::Vacant(vacant) => {
                let mut entry = vacant.insert(WindowEntry {
                    count: 0,
                    reset_at: now + self.window,
                });
                (self.count(&mut entry, now), true)
            }
        };

        if inserted {
            // concurrent new clients can all pass the check above
            let len = self.entries.len();
            if len > self.max_entries {
                self.entries.remove(key);
                return self.deny_new_client();
            }
            metrics::record_limiter_entries(self.name, len);
        }

        decision
    }

    fn count(&self, entry: &mut WindowEntry, now: Instant) -> RateDecision {
        if now >= entry.reset_at {
            entry.count = 0;
            entry.reset_at = now + self.window;
        }

        entry.count = entry.count.saturating_add(1);
        if entry.count <= self.max_requests {
            RateDecision::Allowed
        } else {
            let remaining = entry.reset_at.saturating_duration_since(now);
            RateDecision::Denied {
                retry_after_secs: ceil_secs(remaining).max(1),
            }
        }
    }

    fn deny_new_client(&self) -> RateDecision {
        tracing::warn!(
            policy = self.name,
            entries = self.max_entries,
            "Rate limit table full; denying new client"
        );
        RateDecision::Denied {
            retry_after_secs: ceil_secs(self.window),
        }
    }

    /// Drop entries whose window has ended. Returns how many were removed.
    pub fn sweep(&self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.reset_at > now);
        let after = self.entries.len();
        metrics::record_limiter_entries(self.name, after);
        before.saturating_sub(after)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn ceil_secs(d: Duration) -> u64 {
    let secs = d.as_secs();
    if d.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}

/// Middleware applying one limiter, keyed by the peer IP address.
pub async fn rate_limit_middleware(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(limiter): State<Arc<FixedWindowLimiter>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, GateError> {
    let key = addr.ip().to_string();

    match limiter.check(&key) {
        RateDecision::Allowed => Ok(next.run(request).await),
        RateDecision::Denied { retry_after_secs } => {
            tracing::warn!(
                client = %key,
                policy = limiter.name(),
                path = %request.uri().path(),
                retry_after_secs,
                "Rate limit exceeded"
            );
            Err(GateError::RateLimited { retry_after_secs })
        }
    }
}
