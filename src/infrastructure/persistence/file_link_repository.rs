//! Append-only file implementation of link repository.
//!
//! Each record is one JSON object per line:
//!
//! ```text
//! {"uuid":"aB3xY9","short":"aB3xY9","original_url":"https://example.com","user_id":"42","is_deleted":false}
//! ```
//!
//! The file is read once, on first use, into an in-memory index that is kept
//! current by every write. Saves append; deletes rewrite the whole file into a
//! sibling `.tmp` file and rename it over the original.

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use super::link_index::LinkIndex;
use crate::domain::context::RequestContext;
use crate::domain::entities::Link;
use crate::domain::repositories::{LinkRepository, StoreError};

/// On-disk shape of a link.
#[derive(Debug, Serialize, Deserialize)]
struct FileRecord {
    uuid: String,
    short: String,
    original_url: String,
    #[serde(default)]
    user_id: String,
    #[serde(default)]
    is_deleted: bool,
}

impl From<&Link> for FileRecord {
    fn from(link: &Link) -> Self {
        Self {
            uuid: link.id.clone(),
            short: link.short_code.clone(),
            original_url: link.original_url.clone(),
            user_id: link.user_id.clone(),
            is_deleted: link.is_deleted,
        }
    }
}

impl From<FileRecord> for Link {
    fn from(record: FileRecord) -> Self {
        Self {
            id: record.uuid,
            short_code: record.short,
            short_url: String::new(),
            original_url: record.original_url,
            user_id: record.user_id,
            is_deleted: record.is_deleted,
        }
    }
}

/// Link storage backed by a JSON lines file.
///
/// Writes are serialized by a single lock that also guards the lazy index
/// load. Mutations run to completion on a spawned task even if the caller
/// stops waiting, and re-check the context right before touching the file,
/// so a cancelled request either commits fully or leaves the file as it was.
#[derive(Debug, Clone)]
pub struct FileLinkRepository {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    path: PathBuf,
    index: RwLock<Option<LinkIndex>>,
}

impl FileLinkRepository {
    /// Creates a repository for `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(Inner {
                path: path.into(),
                index: RwLock::new(None),
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Runs `query` against the index, loading it from disk on first use.
    async fn with_index<T>(&self, query: impl FnOnce(&LinkIndex) -> T) -> Result<T, StoreError> {
        {
            let slot = self.inner.index.read().await;
            if let Some(index) = slot.as_ref() {
                return Ok(query(index));
            }
        }

        let mut slot = self.inner.index.write().await;
        let index = loaded(&self.inner.path, &mut slot).await?;
        Ok(query(index))
    }
}

/// Spawns a mutation and waits for it under the caller's context.
async fn spawn_mutation<T, F>(ctx: &RequestContext, mutation: F) -> Result<T, StoreError>
where
    T: Send + 'static,
    F: Future<Output = Result<T, StoreError>> + Send + 'static,
{
    ctx.check()?;
    let handle = tokio::spawn(mutation);
    ctx.run(async move { handle.await.map_err(|e| StoreError::Io(io::Error::other(e)))? })
        .await
}

async fn loaded<'a>(
    path: &Path,
    slot: &'a mut Option<LinkIndex>,
) -> Result<&'a mut LinkIndex, StoreError> {
    let index = match slot.take() {
        Some(index) => index,
        None => load_index(path).await?,
    };
    Ok(slot.insert(index))
}

async fn load_index(path: &Path) -> Result<LinkIndex, StoreError> {
    let contents = match fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(LinkIndex::default()),
        Err(e) => return Err(e.into()),
    };

    let mut index = LinkIndex::default();
    for line in contents.lines().filter(|line| !line.trim().is_empty()) {
        let record: FileRecord = serde_json::from_str(line)?;
        index.insert(record.into());
    }
    Ok(index)
}

fn encode(links: impl IntoIterator<Item = FileRecord>) -> Result<Vec<u8>, StoreError> {
    let mut buf = Vec::new();
    for record in links {
        serde_json::to_writer(&mut buf, &record)?;
        buf.push(b'\n');
    }
    Ok(buf)
}

impl Inner {
    fn temp_path(&self) -> PathBuf {
        let mut path = self.path.clone().into_os_string();
        path.push(".tmp");
        PathBuf::from(path)
    }

    /// Appends encoded records, truncating back to the previous length if the
    /// write fails part way.
    async fn append(&self, buf: &[u8]) -> Result<(), StoreError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        let previous_len = file.metadata().await?.len();

        let written = async {
            file.write_all(buf).await?;
            file.flush().await?;
            file.sync_data().await
        }
        .await;

        if let Err(e) = written {
            let _ = file.set_len(previous_len).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn replace_with(&self, buf: &[u8], ctx: &RequestContext) -> Result<(), StoreError> {
        let temp_path = self.temp_path();

        let written = async {
            let mut file = File::create(&temp_path).await?;
            file.write_all(buf).await?;
            file.flush().await?;
            file.sync_all().await?;
            ctx.check()
        }
        .await;

        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e);
        }

        fs::rename(&temp_path, &self.path).await?;
        Ok(())
    }

    async fn save(&self, ctx: &RequestContext, link: Link) -> Result<Link, StoreError> {
        let mut slot = self.index.write().await;
        let index = loaded(&self.path, &mut slot).await?;

        index.check_insert(&link)?;
        let buf = encode([FileRecord::from(&link)])?;

        ctx.check()?;
        self.append(&buf).await?;
        index.insert(link.clone());
        Ok(link)
    }

    async fn batch_save(&self, ctx: &RequestContext, links: Vec<Link>) -> Result<(), StoreError> {
        let mut slot = self.index.write().await;
        let index = loaded(&self.path, &mut slot).await?;

        let fresh: Vec<Link> = index.plan_batch(&links)?.into_iter().cloned().collect();
        if fresh.is_empty() {
            return Ok(());
        }
        let buf = encode(fresh.iter().map(FileRecord::from))?;

        ctx.check()?;
        self.append(&buf).await?;
        for link in fresh {
            index.insert(link);
        }
        Ok(())
    }

    async fn delete(
        &self,
        ctx: &RequestContext,
        ids: Vec<String>,
        user_id: String,
    ) -> Result<(), StoreError> {
        let mut slot = self.index.write().await;
        let index = loaded(&self.path, &mut slot).await?;

        let owned = index.deletable(&ids, &user_id);
        if owned.is_empty() {
            return Ok(());
        }

        let buf = encode(index.iter().map(|link| {
            let mut record = FileRecord::from(link);
            if owned.binary_search(&link.id).is_ok() {
                record.is_deleted = true;
            }
            record
        }))?;

        self.replace_with(&buf, ctx).await?;
        index.mark_deleted(&owned);
        Ok(())
    }
}

#[async_trait]
impl LinkRepository for FileLinkRepository {
    async fn save(&self, ctx: &RequestContext, link: Link) -> Result<Link, StoreError> {
        let inner = Arc::clone(&self.inner);
        let task_ctx = ctx.clone();
        spawn_mutation(ctx, async move { inner.save(&task_ctx, link).await }).await
    }

    async fn batch_save(&self, ctx: &RequestContext, links: &[Link]) -> Result<(), StoreError> {
        if links.is_empty() {
            return Err(StoreError::BatchIsEmpty);
        }
        let inner = Arc::clone(&self.inner);
        let task_ctx = ctx.clone();
        let links = links.to_vec();
        spawn_mutation(ctx, async move { inner.batch_save(&task_ctx, links).await }).await
    }

    async fn get(&self, ctx: &RequestContext, short_code: &str) -> Result<Link, StoreError> {
        ctx.run(self.with_index(|index| index.get_live(short_code).cloned()))
            .await?
            .ok_or(StoreError::KeyNotFound)
    }

    async fn get_user_links(
        &self,
        ctx: &RequestContext,
        user_id: &str,
    ) -> Result<Vec<Link>, StoreError> {
        ctx.run(self.with_index(|index| index.user_links(user_id)))
            .await
    }

    async fn delete(
        &self,
        ctx: &RequestContext,
        ids: &[String],
        user_id: &str,
    ) -> Result<(), StoreError> {
        let inner = Arc::clone(&self.inner);
        let task_ctx = ctx.clone();
        let ids = ids.to_vec();
        let user_id = user_id.to_string();
        spawn_mutation(ctx, async move { inner.delete(&task_ctx, ids, user_id).await }).await
    }

    async fn ping(&self, ctx: &RequestContext) -> Result<(), StoreError> {
        ctx.run(async {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.inner.path)
                .await?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ctx() -> RequestContext {
        RequestContext::new()
    }

    fn repo_in(dir: &TempDir) -> FileLinkRepository {
        FileLinkRepository::new(dir.path().join("links.json"))
    }

    #[tokio::test]
    async fn test_save_appends_json_line() {
        let dir = TempDir::new().unwrap();
        let repo = repo_in(&dir);

        repo.save(&ctx(), Link::new("abc123", "https://example.com", "u1"))
            .await
            .unwrap();

        let contents = std::fs::read_to_string(repo.path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 1);

        let value: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(value["uuid"], "abc123");
        assert_eq!(value["short"], "abc123");
        assert_eq!(value["original_url"], "https://example.com");
        assert_eq!(value["user_id"], "u1");
        assert_eq!(value["is_deleted"], false);
    }

    #[tokio::test]
    async fn test_records_survive_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let repo = repo_in(&dir);
            repo.save(&ctx(), Link::new("abc", "https://a.com", "u1"))
                .await
                .unwrap();
            repo.batch_save(
                &ctx(),
                &[
                    Link::new("def", "https://d.com", "u1"),
                    Link::new("ghi", "https://g.com", "u2"),
                ],
            )
            .await
            .unwrap();
        }

        let reopened = repo_in(&dir);
        assert_eq!(
            reopened.get(&ctx(), "def").await.unwrap().original_url,
            "https://d.com"
        );
        assert_eq!(reopened.get_user_links(&ctx(), "u1").await.unwrap().len(), 2);
        assert!(matches!(
            reopened
                .save(&ctx(), Link::new("zzz", "https://a.com", ""))
                .await,
            Err(StoreError::OriginalUrlAlreadyExists(existing)) if existing.short_code == "abc"
        ));
    }

    #[tokio::test]
    async fn test_reads_records_without_owner_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("links.json");
        std::fs::write(
            &path,
            "{\"uuid\":\"old\",\"short\":\"old\",\"original_url\":\"https://old.com\"}\n\n",
        )
        .unwrap();

        let repo = FileLinkRepository::new(&path);
        let link = repo.get(&ctx(), "old").await.unwrap();

        assert_eq!(link.original_url, "https://old.com");
        assert_eq!(link.user_id, "");
        assert!(!link.is_deleted);
    }

    #[tokio::test]
    async fn test_malformed_line_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("links.json");
        std::fs::write(&path, "not json\n").unwrap();

        let repo = FileLinkRepository::new(&path);
        assert!(matches!(
            repo.get(&ctx(), "x").await,
            Err(StoreError::Serialization(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_file_is_empty_store() {
        let dir = TempDir::new().unwrap();
        let repo = repo_in(&dir);

        assert!(matches!(
            repo.get(&ctx(), "abc").await,
            Err(StoreError::KeyNotFound)
        ));
        assert!(repo.get_user_links(&ctx(), "u1").await.unwrap().is_empty());
        assert!(!repo.path().exists());
    }

    #[tokio::test]
    async fn test_failed_batch_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let repo = repo_in(&dir);
        repo.save(&ctx(), Link::new("taken", "https://taken.com", ""))
            .await
            .unwrap();
        let before = std::fs::read_to_string(repo.path()).unwrap();

        let result = repo
            .batch_save(
                &ctx(),
                &[
                    Link::new("fresh", "https://fresh.com", ""),
                    Link::new("taken", "https://other.com", ""),
                ],
            )
            .await;

        assert!(matches!(result, Err(StoreError::KeyAlreadyExists(_))));
        assert_eq!(std::fs::read_to_string(repo.path()).unwrap(), before);
        assert!(matches!(
            repo.get(&ctx(), "fresh").await,
            Err(StoreError::KeyNotFound)
        ));
    }

    #[tokio::test]
    async fn test_delete_rewrites_file_and_persists_flag() {
        let dir = TempDir::new().unwrap();
        let repo = repo_in(&dir);
        repo.save(&ctx(), Link::new("mine", "https://mine.com", "alice"))
            .await
            .unwrap();
        repo.save(&ctx(), Link::new("theirs", "https://theirs.com", "bob"))
            .await
            .unwrap();

        let ids = vec!["mine".to_string(), "theirs".to_string()];
        repo.delete(&ctx(), &ids, "alice").await.unwrap();
        repo.delete(&ctx(), &ids, "alice").await.unwrap();

        let temp = dir.path().join("links.json.tmp");
        assert!(!temp.exists());

        let reopened = repo_in(&dir);
        assert!(matches!(
            reopened.get(&ctx(), "mine").await,
            Err(StoreError::KeyNotFound)
        ));
        assert!(reopened.get(&ctx(), "theirs").await.is_ok());

        let contents = std::fs::read_to_string(repo.path()).unwrap();
        let ids_in_file: Vec<String> = contents
            .lines()
            .map(|line| serde_json::from_str::<serde_json::Value>(line).unwrap()["uuid"].to_string())
            .collect();
        assert_eq!(ids_in_file, vec!["\"mine\"", "\"theirs\""]);
    }

    #[tokio::test]
    async fn test_cancelled_delete_leaves_file_untouched() {
        let dir = TempDir::new().unwrap();
        let repo = repo_in(&dir);
        repo.save(&ctx(), Link::new("mine", "https://mine.com", "alice"))
            .await
            .unwrap();
        let before = std::fs::read_to_string(repo.path()).unwrap();

        let cancelled = RequestContext::with_user("alice");
        cancelled.cancel();
        let result = repo
            .delete(&cancelled, &["mine".to_string()], "alice")
            .await;

        assert!(matches!(result, Err(StoreError::Cancelled)));
        assert_eq!(std::fs::read_to_string(repo.path()).unwrap(), before);
        assert!(repo.get(&ctx(), "mine").await.is_ok());
    }

    #[tokio::test]
    async fn test_concurrent_saves_of_same_url_store_one_record() {
        let dir = TempDir::new().unwrap();
        let repo = repo_in(&dir);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let repo = repo.clone();
                tokio::spawn(async move {
                    repo.save(
                        &RequestContext::new(),
                        Link::new(format!("code{i}"), "https://same.com", ""),
                    )
                    .await
                })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => created += 1,
                Err(StoreError::OriginalUrlAlreadyExists(_)) => {}
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }

        assert_eq!(created, 1);
        let contents = std::fs::read_to_string(repo.path()).unwrap();
        assert_eq!(contents.lines().count(), 1);
    }

    #[tokio::test]
    async fn test_ping_creates_file() {
        let dir = TempDir::new().unwrap();
        let repo = repo_in(&dir);

        repo.ping(&ctx()).await.unwrap();

        assert!(repo.path().exists());
    }
}
