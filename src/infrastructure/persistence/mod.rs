//! Link repository implementations.
//!
//! - [`MemoryLinkRepository`] - process-local map, lost on shutdown
//! - [`FileLinkRepository`] - JSON lines file with an in-memory index
//! - [`PgLinkRepository`] - PostgreSQL table with schema-enforced uniqueness

mod link_index;

pub mod file_link_repository;
pub mod memory_link_repository;
pub mod pg_link_repository;

pub use file_link_repository::FileLinkRepository;
pub use memory_link_repository::MemoryLinkRepository;
pub use pg_link_repository::PgLinkRepository;
