//! Repository trait for short link storage.

use crate::domain::context::RequestContext;
use crate::domain::entities::Link;
use async_trait::async_trait;

/// Errors returned by [`LinkRepository`] implementations.
///
/// Repositories never log; every failure is reported through this type.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("empty key")]
    EmptyKey,

    #[error("key not found")]
    KeyNotFound,

    #[error("key {0} is already taken")]
    KeyAlreadyExists(String),

    /// The original URL is already stored. Carries the existing record.
    #[error("original url already exists")]
    OriginalUrlAlreadyExists(Box<Link>),

    #[error("batch is empty")]
    BatchIsEmpty,

    #[error("operation cancelled")]
    Cancelled,

    #[error("deadline exceeded")]
    DeadlineExceeded,

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed storage record: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Storage interface for short links.
///
/// Every operation first checks the [`RequestContext`] and fails with
/// [`StoreError::Cancelled`] or [`StoreError::DeadlineExceeded`] once it fires.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::MemoryLinkRepository`] - in-process map
/// - [`crate::infrastructure::persistence::FileLinkRepository`] - append-only JSON lines file
/// - [`crate::infrastructure::persistence::PgLinkRepository`] - PostgreSQL
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Stores a new link.
    ///
    /// At most one record exists per original URL, soft-deleted records
    /// included. The check and the insert are atomic with respect to
    /// concurrent saves.
    ///
    /// # Errors
    ///
    /// - [`StoreError::EmptyKey`] if `id` or `short_code` is blank
    /// - [`StoreError::OriginalUrlAlreadyExists`] with the existing record if
    ///   the original URL is already stored; nothing is written
    /// - [`StoreError::KeyAlreadyExists`] if the id belongs to another URL
    async fn save(&self, ctx: &RequestContext, link: Link) -> Result<Link, StoreError>;

    /// Stores a non-empty set of links atomically: all rows commit or none do.
    ///
    /// A row whose id already exists for the same live original URL is
    /// rewritten in place, which makes retries idempotent.
    ///
    /// # Errors
    ///
    /// - [`StoreError::BatchIsEmpty`] for an empty slice
    /// - [`StoreError::EmptyKey`], [`StoreError::KeyAlreadyExists`] and
    ///   [`StoreError::OriginalUrlAlreadyExists`] as for [`Self::save`]
    async fn batch_save(&self, ctx: &RequestContext, links: &[Link]) -> Result<(), StoreError>;

    /// Finds a live link by short code.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::KeyNotFound`] if the code is unknown or the link
    /// has been soft-deleted.
    async fn get(&self, ctx: &RequestContext, short_code: &str) -> Result<Link, StoreError>;

    /// Lists every live link owned by `user_id`, in no particular order.
    async fn get_user_links(
        &self,
        ctx: &RequestContext,
        user_id: &str,
    ) -> Result<Vec<Link>, StoreError>;

    /// Soft-deletes the listed ids owned by `user_id`.
    ///
    /// Ids owned by someone else or unknown are skipped. Deleting an already
    /// deleted link is a no-op.
    async fn delete(
        &self,
        ctx: &RequestContext,
        ids: &[String],
        user_id: &str,
    ) -> Result<(), StoreError>;

    /// Checks that the backing medium is reachable.
    async fn ping(&self, ctx: &RequestContext) -> Result<(), StoreError>;
}
