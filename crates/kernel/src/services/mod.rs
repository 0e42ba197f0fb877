//! Application services.

pub mod auth;
pub mod lead;
pub mod notify;
