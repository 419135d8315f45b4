//! PostgreSQL implementation of link repository.

use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::context::RequestContext;
use crate::domain::entities::Link;
use crate::domain::repositories::{LinkRepository, StoreError};
use crate::utils::db_error::is_unique_violation_on;

/// Unique index guarding `links.original_url`.
const ORIGINAL_URL_KEY: &str = "links_original_url_key";

#[derive(Debug, sqlx::FromRow)]
struct LinkRow {
    id: String,
    short_code: String,
    original_url: String,
    user_id: String,
    is_deleted: bool,
}

impl From<LinkRow> for Link {
    fn from(row: LinkRow) -> Self {
        Self {
            id: row.id,
            short_code: row.short_code,
            short_url: String::new(),
            original_url: row.original_url,
            user_id: row.user_id,
            is_deleted: row.is_deleted,
        }
    }
}

/// PostgreSQL repository for link storage and retrieval.
///
/// Every statement is bound with parameters. Uniqueness of ids and original
/// URLs is enforced by the schema, so concurrent writers across processes
/// observe the same guarantees as the in-process backends.
pub struct PgLinkRepository {
    pool: Arc<PgPool>,
}

impl PgLinkRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Applies pending schema migrations.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(self.pool.as_ref())
            .await
            .map_err(sqlx::Error::from)?;
        Ok(())
    }

    async fn find_by_original_url(&self, original_url: &str) -> Result<Option<Link>, StoreError> {
        let row = sqlx::query_as::<_, LinkRow>(
            r#"
            SELECT id, short_code, original_url, user_id, is_deleted
            FROM links
            WHERE original_url = $1
            "#,
        )
        .bind(original_url)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(Link::from))
    }

    /// Explains why `link` could not be written.
    async fn conflict_for(&self, link: &Link, url_taken: bool) -> Result<StoreError, StoreError> {
        Ok(match self.find_by_original_url(&link.original_url).await? {
            Some(existing) => StoreError::OriginalUrlAlreadyExists(Box::new(existing)),
            // Taken by an earlier row of the rolled back batch.
            None if url_taken => StoreError::OriginalUrlAlreadyExists(Box::new(link.clone())),
            None => StoreError::KeyAlreadyExists(link.id.clone()),
        })
    }
}

#[async_trait]
impl LinkRepository for PgLinkRepository {
    async fn save(&self, ctx: &RequestContext, link: Link) -> Result<Link, StoreError> {
        if link.has_blank_key() {
            return Err(StoreError::EmptyKey);
        }

        ctx.run(async {
            let inserted = sqlx::query(
                r#"
                INSERT INTO links (id, short_code, original_url, user_id, is_deleted)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(&link.id)
            .bind(&link.short_code)
            .bind(&link.original_url)
            .bind(&link.user_id)
            .bind(link.is_deleted)
            .execute(self.pool.as_ref())
            .await?
            .rows_affected();

            if inserted == 0 {
                return Err(self.conflict_for(&link, false).await?);
            }
            Ok(link)
        })
        .await
    }

    async fn batch_save(&self, ctx: &RequestContext, links: &[Link]) -> Result<(), StoreError> {
        if links.is_empty() {
            return Err(StoreError::BatchIsEmpty);
        }
        if links.iter().any(Link::has_blank_key) {
            return Err(StoreError::EmptyKey);
        }

        ctx.run(async {
            let mut tx = self.pool.begin().await?;

            for link in links {
                let result = sqlx::query(
                    r#"
                    INSERT INTO links (id, short_code, original_url, user_id, is_deleted)
                    VALUES ($1, $2, $3, $4, $5)
                    ON CONFLICT (id) DO UPDATE SET short_code = EXCLUDED.short_code
                    WHERE links.original_url = EXCLUDED.original_url AND NOT links.is_deleted
                    "#,
                )
                .bind(&link.id)
                .bind(&link.short_code)
                .bind(&link.original_url)
                .bind(&link.user_id)
                .bind(link.is_deleted)
                .execute(&mut *tx)
                .await;

                let url_taken = match result {
                    Ok(done) if done.rows_affected() > 0 => continue,
                    Ok(_) => false,
                    Err(e) if is_unique_violation_on(&e, ORIGINAL_URL_KEY) => true,
                    Err(e) => return Err(e.into()),
                };

                tx.rollback().await?;
                return Err(self.conflict_for(link, url_taken).await?);
            }

            tx.commit().await?;
            Ok(())
        })
        .await
    }

    async fn get(&self, ctx: &RequestContext, short_code: &str) -> Result<Link, StoreError> {
        ctx.run(async {
            sqlx::query_as::<_, LinkRow>(
                r#"
                SELECT id, short_code, original_url, user_id, is_deleted
                FROM links
                WHERE short_code = $1 AND NOT is_deleted
                "#,
            )
            .bind(short_code)
            .fetch_optional(self.pool.as_ref())
            .await?
            .map(Link::from)
            .ok_or(StoreError::KeyNotFound)
        })
        .await
    }

    async fn get_user_links(
        &self,
        ctx: &RequestContext,
        user_id: &str,
    ) -> Result<Vec<Link>, StoreError> {
        ctx.run(async {
            let rows = sqlx::query_as::<_, LinkRow>(
                r#"
                SELECT id, short_code, original_url, user_id, is_deleted
                FROM links
                WHERE user_id = $1 AND NOT is_deleted
                ORDER BY created_at, id
                "#,
            )
            .bind(user_id)
            .fetch_all(self.pool.as_ref())
            .await?;

            Ok(rows.into_iter().map(Link::from).collect())
        })
        .await
    }

    async fn delete(
        &self,
        ctx: &RequestContext,
        ids: &[String],
        user_id: &str,
    ) -> Result<(), StoreError> {
        if ids.is_empty() {
            return Ok(());
        }

        ctx.run(async {
            sqlx::query(
                r#"
                UPDATE links
                SET is_deleted = TRUE
                WHERE id = ANY($1) AND user_id = $2 AND NOT is_deleted
                "#,
            )
            .bind(ids)
            .bind(user_id)
            .execute(self.pool.as_ref())
            .await?;
            Ok(())
        })
        .await
    }

    async fn ping(&self, ctx: &RequestContext) -> Result<(), StoreError> {
        ctx.run(async {
            sqlx::query("SELECT 1").execute(self.pool.as_ref()).await?;
            Ok(())
        })
        .await
    }
}
