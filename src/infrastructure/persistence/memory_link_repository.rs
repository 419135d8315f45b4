//! In-memory implementation of link repository.

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::link_index::LinkIndex;
use crate::domain::context::RequestContext;
use crate::domain::entities::Link;
use crate::domain::repositories::{LinkRepository, StoreError};

/// Process-local link storage.
///
/// Records live in a map behind a read-write lock. Links are cloned on the
/// way in and out, so callers never alias stored state. Data is lost when
/// the repository is dropped.
#[derive(Debug, Default)]
pub struct MemoryLinkRepository {
    index: RwLock<LinkIndex>,
}

impl MemoryLinkRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records, soft-deleted ones included.
    pub async fn len(&self) -> usize {
        self.index.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl LinkRepository for MemoryLinkRepository {
    async fn save(&self, ctx: &RequestContext, link: Link) -> Result<Link, StoreError> {
        ctx.run(async {
            let mut index = self.index.write().await;
            index.check_insert(&link)?;
            index.insert(link.clone());
            Ok(link)
        })
        .await
    }

    async fn batch_save(&self, ctx: &RequestContext, links: &[Link]) -> Result<(), StoreError> {
        ctx.run(async {
            let mut index = self.index.write().await;
            let fresh: Vec<Link> = index.plan_batch(links)?.into_iter().cloned().collect();
            for link in fresh {
                index.insert(link);
            }
            Ok(())
        })
        .await
    }

    async fn get(&self, ctx: &RequestContext, short_code: &str) -> Result<Link, StoreError> {
        ctx.run(async {
            self.index
                .read()
                .await
                .get_live(short_code)
                .cloned()
                .ok_or(StoreError::KeyNotFound)
        })
        .await
    }

    async fn get_user_links(
        &self,
        ctx: &RequestContext,
        user_id: &str,
    ) -> Result<Vec<Link>, StoreError> {
        ctx.run(async { Ok(self.index.read().await.user_links(user_id)) })
            .await
    }

    async fn delete(
        &self,
        ctx: &RequestContext,
        ids: &[String],
        user_id: &str,
    ) -> Result<(), StoreError> {
        ctx.run(async {
            let mut index = self.index.write().await;
            let owned = index.deletable(ids, user_id);
            index.mark_deleted(&owned);
            Ok(())
        })
        .await
    }

    async fn ping(&self, ctx: &RequestContext) -> Result<(), StoreError> {
        ctx.check()
    }
}
