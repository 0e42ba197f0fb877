//! Vetrina CMS Kernel Library
//!
//! Content store, collections, page composer, admin auth, rate limiting and
//! lead intake behind an axum HTTP server. The `vetrina` binary is the
//! entry point for running the server.

pub mod app;
pub mod config;
pub mod content;
pub mod db;
pub mod error;
pub mod file;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod seed;
pub mod services;
pub mod state;
pub mod storage;
