//! Infrastructure layer for external integrations.
//!
//! Implements the storage interface defined by the domain layer.

pub mod persistence;
