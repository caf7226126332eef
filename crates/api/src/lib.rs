//! HTTP API layer for quad.
//!
//! This crate provides the REST API:
//!
//! - **Endpoints**: accounts, posts, votes, reports, polls, moderation
//! - **Extractors**: bearer-token authentication
//! - **Middleware**: auth, request metrics
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
