//! Per-client request limits.
//!
//! Each (client IP, tier) pair gets a budget of requests per window. Unused
//! budget trickles back in proportion to idle time, so a client that paces
//! itself is never locked out for a whole window.

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::RateLimitConfig;
use crate::AppState;

use super::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateLimitTier {
    /// Everything under `/api`
    Api,
    /// Admin login
    Auth,
    /// Contact form submissions
    Contact,
}

#[derive(Debug, Clone)]
struct Budget {
    remaining: u32,
    window_start: Instant,
    last_seen: Instant,
}

/// Outcome of an allowed request, reported in `X-RateLimit-*` headers
#[derive(Debug, Clone, Copy)]
pub struct Allowance {
    pub limit: u32,
    pub remaining: u32,
    pub reset_after: u64,
}

#[derive(Debug)]
pub struct RateLimiter {
    budgets: DashMap<(IpAddr, RateLimitTier), Budget>,
    config: RateLimitConfig,
    window: Duration,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            budgets: DashMap::new(),
            window: Duration::from_secs(config.window_seconds),
            config,
        }
    }

    pub fn limit(&self, tier: RateLimitTier) -> u32 {
        match tier {
            RateLimitTier::Api => self.config.api_requests_per_window,
            RateLimitTier::Auth => self.config.auth_requests_per_window,
            RateLimitTier::Contact => self.config.contact_requests_per_window,
        }
    }

    /// Spend one request from the client's budget.
    ///
    /// `Err` carries the number of seconds to wait before retrying.
    pub fn check(&self, ip: IpAddr, tier: RateLimitTier) -> Result<Allowance, u64> {
        if !self.config.enabled {
            return Ok(Allowance {
                limit: u32::MAX,
                remaining: u32::MAX,
                reset_after: 0,
            });
        }

        let limit = self.limit(tier);
        let now = Instant::now();
        let mut budget = self.budgets.entry((ip, tier)).or_insert_with(|| Budget {
            remaining: limit,
            window_start: now,
            last_seen: now,
        });

        let elapsed = now.duration_since(budget.window_start);
        if elapsed >= self.window {
            budget.remaining = limit;
            budget.window_start = now;
        } else {
            let idle = now.duration_since(budget.last_seen).as_secs_f64();
            let refill = (idle * limit as f64 / self.window.as_secs_f64()) as u32;
            budget.remaining = budget.remaining.saturating_add(refill).min(limit);
        }
        budget.last_seen = now;

        let reset_after = self.window.saturating_sub(elapsed).as_secs();
        if budget.remaining == 0 {
            return Err(reset_after.max(1));
        }

        budget.remaining -= 1;
        Ok(Allowance {
            limit,
            remaining: budget.remaining,
            reset_after,
        })
    }

    /// Forget clients idle for two windows
    pub fn cleanup_expired(&self) {
        let now = Instant::now();
        let expiry = self.window * 2;
        self.budgets
            .retain(|_, budget| now.duration_since(budget.window_start) < expiry);
    }

    pub fn tracked_clients(&self) -> usize {
        self.budgets.len()
    }
}

/// Client IP used as the rate limit key.
///
/// Forwarding headers are only honoured when `trust_proxy` is set, otherwise a
/// caller could pick a fresh key for every request.
fn extract_client_ip(request: &Request<Body>, trust_proxy: bool) -> IpAddr {
    if trust_proxy {
        if let Some(ip) = forwarded_ip(request.headers()) {
            return ip;
        }
    }

    // Peer address of the TCP connection
    if let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip();
    }

    IpAddr::from([127, 0, 0, 1])
}

/// Client address as reported by a reverse proxy
fn forwarded_ip(headers: &HeaderMap) -> Option<IpAddr> {
    let header_ip = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            // First entry of X-Forwarded-For is the original client
            .and_then(|v| v.split(',').next())
            .and_then(|ip| ip.trim().parse::<IpAddr>().ok())
    };

    header_ip("x-forwarded-for").or_else(|| header_ip("x-real-ip"))
}

fn set_limit_headers(headers: &mut HeaderMap, limit: u32, remaining: u32, reset_after: u64) {
    headers.insert("X-RateLimit-Limit", HeaderValue::from(limit));
    headers.insert("X-RateLimit-Remaining", HeaderValue::from(remaining));
    headers.insert("X-RateLimit-Reset", HeaderValue::from(reset_after));
}

async fn enforce(
    state: Arc<AppState>,
    request: Request<Body>,
    next: Next,
    tier: RateLimitTier,
) -> Response {
    let ip = extract_client_ip(&request, state.config.rate_limit.trust_proxy_headers);

    match state.rate_limiter.check(ip, tier) {
        Ok(allowance) => {
            let mut response = next.run(request).await;
            set_limit_headers(
                response.headers_mut(),
                allowance.limit,
                allowance.remaining,
                allowance.reset_after,
            );
            response
        }
        Err(retry_after) => {
            tracing::warn!(ip = %ip, tier = ?tier, "Rate limit exceeded");
            let mut response = ApiError::rate_limited(format!(
                "Too many requests, try again in {retry_after} seconds"
            ))
            .into_response();
            let headers = response.headers_mut();
            headers.insert("Retry-After", HeaderValue::from(retry_after));
            set_limit_headers(headers, state.rate_limiter.limit(tier), 0, retry_after);
            response
        }
    }
}

pub async fn rate_limit_api(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    enforce(state, request, next, RateLimitTier::Api).await
}

pub async fn rate_limit_auth(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    enforce(state, request, next, RateLimitTier::Auth).await
}

pub async fn rate_limit_contact(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    enforce(state, request, next, RateLimitTier::Contact).await
}

/// Periodically drop budgets of clients that went away
pub fn spawn_cleanup_task(rate_limiter: Arc<RateLimiter>, cleanup_interval_secs: u64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(cleanup_interval_secs.max(1)));
        // The first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            rate_limiter.cleanup_expired();
            tracing::debug!(
                clients = rate_limiter.tracked_clients(),
                "Rate limiter cleanup complete"
            );
        }
    });
}
