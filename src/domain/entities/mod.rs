//! Core domain entities.
//!
//! [`Link`] is the only persisted entity: a mapping from a short code to an
//! original URL, owned by a user and soft-deletable.

pub mod link;

pub use link::Link;
