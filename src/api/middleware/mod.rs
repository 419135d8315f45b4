//! HTTP middleware for request processing.
//!
//! Provides cookie identity, gzip and observability middleware.

pub mod auth;
pub mod compression;
pub mod tracing;
