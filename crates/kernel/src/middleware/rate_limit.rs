//! Sliding-window rate limiting for mutating requests.
//!
//! Each (client, route) pair keeps the instants of its recent accepted
//! requests. A request is admitted when fewer than `max` of them fall inside
//! the trailing window. State is process-local.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderMap, Method, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use dashmap::DashMap;
use tracing::debug;

use crate::error::AppError;
use crate::state::AppState;

/// Rate limiter keyed by client and route.
pub struct RateLimiter {
    max: usize,
    window: Duration,
    hits: DashMap<(String, String), VecDeque<Instant>>,
}

impl RateLimiter {
    /// Create a limiter admitting `max` requests per `window`.
    pub fn new(max: usize, window: Duration) -> Self {
        Self {
            max,
            window,
            hits: DashMap::new(),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Check and record a request at the current instant.
    ///
    /// Returns Ok(()) if allowed, Err with retry-after seconds if limited.
    pub fn check(&self, client: &str, route: &str) -> Result<(), u64> {
        self.check_at(client, route, Instant::now())
    }

    /// Check and record a request at `now`.
    ///
    /// The entry lock is held across prune, count and append, so concurrent
    /// requests from one client never both take the last slot.
    pub fn check_at(&self, client: &str, route: &str, now: Instant) -> Result<(), u64> {
        let mut entry = self
            .hits
            .entry((client.to_string(), route.to_string()))
            .or_default();
        let hits = entry.value_mut();

        while let Some(&oldest) = hits.front() {
            if now.saturating_duration_since(oldest) >= self.window {
                hits.pop_front();
            } else {
                break;
            }
        }

        if hits.len() >= self.max {
            let retry_after = hits
                .front()
                .map(|&oldest| self.window.saturating_sub(now.saturating_duration_since(oldest)))
                .unwrap_or(self.window);
            // Rounded up, at least one second.
            let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
            debug!(client, route, count = hits.len(), "rate limit exceeded");
            return Err(secs.max(1));
        }

        hits.push_back(now);
        Ok(())
    }

    /// Drop entries whose hits have all left the window.
    pub fn sweep(&self) {
        self.sweep_at(Instant::now());
    }

    fn sweep_at(&self, now: Instant) {
        self.hits.retain(|_, hits| {
            hits.back()
                .is_some_and(|&newest| now.saturating_duration_since(newest) < self.window)
        });
    }

    /// Number of tracked (client, route) pairs.
    pub fn tracked(&self) -> usize {
        self.hits.len()
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("max", &self.max)
            .field("window", &self.window)
            .field("tracked", &self.hits.len())
            .finish()
    }
}

/// Periodically sweep idle entries until the process exits.
pub fn spawn_sweeper(limiter: Arc<RateLimiter>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        // `interval` panics on a zero period.
        let period = limiter.window().max(Duration::from_secs(1));
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            limiter.sweep();
        }
    })
}

fn is_mutation(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

/// Middleware throttling mutating requests per client and route.
pub async fn throttle_mutations(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !is_mutation(request.method()) {
        return next.run(request).await;
    }

    let addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0);
    let client = get_client_id(addr, request.headers());
    let route = request.uri().path().to_string();

    match state.rate_limiter().check(&client, &route) {
        Ok(()) => next.run(request).await,
        Err(retry_after) => AppError::RateLimited { retry_after }.into_response(),
    }
}

/// Get the client identifier (IP address) for rate limiting.
pub fn get_client_id(addr: Option<SocketAddr>, headers: &HeaderMap) -> String {
    // Check X-Forwarded-For header first (for proxied requests)
    if let Some(forwarded) = headers.get("x-forwarded-for")
        && let Ok(value) = forwarded.to_str()
        && let Some(ip) = value.split(',').next()
        && !ip.trim().is_empty()
    {
        return ip.trim().to_string();
    }

    if let Some(real_ip) = headers.get("x-real-ip")
        && let Ok(value) = real_ip.to_str()
    {
        return value.trim().to_string();
    }

    addr.map(|a| a.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
