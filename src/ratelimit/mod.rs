//! Per-client token-bucket rate limiting.
//!
//! One [`RateLimiter`] is built at start-up and shared through application
//! state. Buckets are created lazily per client IP and reclaimed by a
//! background sweep once the client has been idle for [`IDLE_TIMEOUT`].

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::config::LimiterConfig;
use crate::errors::AppError;
use crate::AppState;

/// How long a bucket may sit untouched before the sweep drops it.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(3 * 60);

/// Interval between sweeps.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy)]
struct Bucket {
    tokens: f64,
    last_seen: Instant,
}

/// In-memory token-bucket limiter keyed by client IP.
#[derive(Debug)]
pub struct RateLimiter {
    config: LimiterConfig,
    clients: Mutex<HashMap<IpAddr, Bucket>>,
}

impl RateLimiter {
    pub fn new(config: LimiterConfig) -> Self {
        Self {
            config,
            clients: Mutex::new(HashMap::new()),
        }
    }

    pub fn enabled(&self) -> bool {
        self.config.enabled
    }

    /// Admit or reject one request from `client`.
    pub fn check(&self, client: IpAddr) -> bool {
        self.check_at(client, Instant::now())
    }

    /// Admit or reject one request from `client` observed at `now`.
    pub fn check_at(&self, client: IpAddr, now: Instant) -> bool {
        if !self.config.enabled {
            return true;
        }

        let burst = f64::from(self.config.burst);
        let mut clients = self.lock();
        let bucket = clients.entry(client).or_insert(Bucket {
            tokens: burst,
            last_seen: now,
        });

        let elapsed = now.saturating_duration_since(bucket.last_seen).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.config.rps).min(burst);
        bucket.last_seen = now;

        if bucket.tokens < 1.0 {
            return false;
        }
        bucket.tokens -= 1.0;
        true
    }

    /// Drop buckets idle for longer than [`IDLE_TIMEOUT`] as of `now`.
    /// Returns the number of buckets removed.
    pub fn sweep_idle(&self, now: Instant) -> usize {
        let mut clients = self.lock();
        let before = clients.len();
        clients.retain(|_, bucket| now.saturating_duration_since(bucket.last_seen) <= IDLE_TIMEOUT);
        before - clients.len()
    }

    /// Number of clients currently holding a bucket.
    pub fn tracked_clients(&self) -> usize {
        self.lock().len()
    }

    /// Run [`sweep_idle`](Self::sweep_idle) every [`SWEEP_INTERVAL`] until the
    /// limiter is dropped.
    pub fn spawn_sweeper(limiter: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let weak: Weak<Self> = Arc::downgrade(limiter);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(SWEEP_INTERVAL);
            interval.tick().await;
            loop {
                interval.tick().await;
                let Some(limiter) = weak.upgrade() else {
                    break;
                };
                let removed = limiter.sweep_idle(Instant::now());
                if removed > 0 {
                    tracing::debug!(removed, "evicted idle rate limiter buckets");
                }
            }
        })
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<IpAddr, Bucket>> {
        // A panic while holding the lock leaves the map consistent; keep serving.
        self.clients.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Rate limiting middleware keyed on the peer address of the connection.
pub async fn rate_limit_layer(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if !state.limiter.enabled() {
        return next.run(request).await;
    }

    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    if !state.limiter.check(client) {
        tracing::warn!(%client, "rate limit exceeded");
        return AppError::RateLimitExceeded.into_response();
    }

    next.run(request).await
}
