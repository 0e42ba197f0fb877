//! HTTP middleware components.
//!
//! Provides admin authentication and rate limiting.

pub mod admin_auth;
pub mod rate_limit;

pub use admin_auth::AdminSession;
pub use rate_limit::{RateLimiter, get_client_id, spawn_sweeper, throttle_mutations};
