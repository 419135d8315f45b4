//! Link creation, lookup and removal service.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::context::RequestContext;
use crate::domain::entities::Link;
use crate::domain::repositories::{LinkRepository, StoreError};
use crate::utils::code_generator::{CodeGenerator, GeneratorError};
use crate::utils::url_validator::{is_valid_url, parse_absolute_url};

/// Attempts made before a short code collision is reported.
const MAX_ATTEMPTS: usize = 5;

/// Errors returned by [`LinkService`].
#[derive(Debug, thiserror::Error)]
pub enum ShortenerError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("short code is required")]
    IdIsRequired,

    #[error("no links in batch")]
    NoLinksInBatch,

    #[error("no valid links in batch")]
    NoValidLinksInBatch,

    #[error("failed to create short link: {0}")]
    CreateShortLink(#[source] StoreError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Generator(#[from] GeneratorError),
}

/// Result of shortening a single URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShortenOutcome {
    /// A new record was stored.
    Created(String),
    /// The URL was already stored; carries the existing short URL.
    Conflict(String),
}

impl ShortenOutcome {
    pub fn short_url(&self) -> &str {
        match self {
            Self::Created(url) | Self::Conflict(url) => url,
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

/// Generator input for the given attempt. Later attempts salt the URL so
/// deterministic generators produce a different code.
fn seed(url: &str, attempt: usize) -> String {
    if attempt == 0 {
        url.to_string()
    } else {
        format!("{url}#{attempt}")
    }
}

/// Service for creating and resolving short links.
///
/// Validates input, asks the generator for codes, persists through the
/// repository and formats every returned short URL from one base URL.
pub struct LinkService {
    repository: Arc<dyn LinkRepository>,
    generator: Arc<dyn CodeGenerator>,
    base_url: String,
}

impl LinkService {
    /// Creates a new link service.
    ///
    /// Trailing slashes are stripped from `base_url` once, here.
    ///
    /// # Errors
    ///
    /// Returns [`ShortenerError::InvalidBaseUrl`] if `base_url` is not an
    /// absolute URL with a host.
    pub fn new(
        repository: Arc<dyn LinkRepository>,
        generator: Arc<dyn CodeGenerator>,
        base_url: &str,
    ) -> Result<Self, ShortenerError> {
        parse_absolute_url(base_url)
            .map_err(|e| ShortenerError::InvalidBaseUrl(format!("{base_url}: {e}")))?;

        Ok(Self {
            repository,
            generator,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Formats the public short URL for `code`.
    pub fn short_url(&self, code: &str) -> String {
        format!("{}/{}", self.base_url, code)
    }

    fn with_short_url(&self, mut link: Link) -> Link {
        link.short_url = self.short_url(&link.short_code);
        link
    }

    /// Shortens `url` on behalf of the context's user.
    ///
    /// If the URL is already stored, returns [`ShortenOutcome::Conflict`] with
    /// the existing record's short URL and writes nothing. A code collision
    /// with another URL triggers regeneration.
    ///
    /// # Errors
    ///
    /// - [`ShortenerError::InvalidUrl`] if `url` is not an absolute URL
    /// - [`ShortenerError::CreateShortLink`] for any storage failure, including
    ///   running out of attempts on colliding codes
    pub async fn generate_short_link(
        &self,
        ctx: &RequestContext,
        url: &str,
    ) -> Result<ShortenOutcome, ShortenerError> {
        let url = url.trim();
        if !is_valid_url(url) {
            return Err(ShortenerError::InvalidUrl(url.to_string()));
        }

        let mut last_collision = String::new();
        for attempt in 0..MAX_ATTEMPTS {
            let code = self.generator.generate(&seed(url, attempt))?;
            let link = Link::new(code, url, ctx.user_id());

            match self.repository.save(ctx, link).await {
                Ok(saved) => {
                    debug!(code = %saved.short_code, "short link created");
                    return Ok(ShortenOutcome::Created(self.short_url(&saved.short_code)));
                }
                Err(StoreError::OriginalUrlAlreadyExists(existing)) => {
                    debug!(code = %existing.short_code, "original url already shortened");
                    return Ok(ShortenOutcome::Conflict(
                        self.short_url(&existing.short_code),
                    ));
                }
                Err(StoreError::KeyAlreadyExists(code)) => {
                    debug!(%code, attempt, "short code collision, regenerating");
                    last_collision = code;
                }
                Err(e) => return Err(ShortenerError::CreateShortLink(e)),
            }
        }

        warn!(attempts = MAX_ATTEMPTS, "gave up on colliding short codes");
        Err(ShortenerError::CreateShortLink(
            StoreError::KeyAlreadyExists(last_collision),
        ))
    }

    /// Shortens a batch of URLs in one atomic write.
    ///
    /// Items with an invalid URL, or for which no code can be generated, are
    /// dropped. Items sharing an original URL share one record. Returned links
    /// keep the caller's `id` as a correlation id and carry the stored code.
    ///
    /// # Errors
    ///
    /// - [`ShortenerError::NoLinksInBatch`] for empty input
    /// - [`ShortenerError::NoValidLinksInBatch`] when every item was dropped
    /// - [`ShortenerError::Store`] when the batch write fails; nothing is stored
    pub async fn generate_batch_short_link(
        &self,
        ctx: &RequestContext,
        links: Vec<Link>,
    ) -> Result<Vec<Link>, ShortenerError> {
        if links.is_empty() {
            return Err(ShortenerError::NoLinksInBatch);
        }

        let valid: Vec<Link> = links
            .into_iter()
            .filter_map(|mut link| {
                link.original_url = link.original_url.trim().to_string();
                if is_valid_url(&link.original_url) {
                    Some(link)
                } else {
                    debug!(id = %link.id, "dropping batch item with invalid url");
                    None
                }
            })
            .collect();

        let mut codes = self.codes_for(&valid);
        let mut attempt = 0;
        loop {
            if codes.is_empty() {
                return Err(ShortenerError::NoValidLinksInBatch);
            }

            let mut records: Vec<Link> = codes
                .iter()
                .map(|(url, code)| Link::new(code.as_str(), *url, ctx.user_id()))
                .collect();
            records.sort_by(|a, b| a.id.cmp(&b.id));

            match self.repository.batch_save(ctx, &records).await {
                Ok(()) => {
                    debug!(count = records.len(), "batch stored");
                    return Ok(valid
                        .iter()
                        .filter_map(|link| {
                            let code = codes.get(link.original_url.as_str())?;
                            Some(Link {
                                id: link.id.clone(),
                                short_code: code.clone(),
                                short_url: self.short_url(code),
                                original_url: link.original_url.clone(),
                                user_id: ctx.user_id().to_string(),
                                is_deleted: false,
                            })
                        })
                        .collect());
                }
                Err(StoreError::KeyAlreadyExists(code)) => {
                    attempt += 1;
                    if attempt == MAX_ATTEMPTS {
                        warn!(attempts = MAX_ATTEMPTS, "gave up on colliding batch codes");
                        return Err(StoreError::KeyAlreadyExists(code).into());
                    }
                    debug!(%code, attempt, "short code collision in batch, regenerating");
                    if !self.regenerate(&mut codes, &code, attempt) {
                        return Err(StoreError::KeyAlreadyExists(code).into());
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Generates one code per distinct original URL, skipping URLs the
    /// generator rejects.
    fn codes_for<'a>(&self, links: &'a [Link]) -> HashMap<&'a str, String> {
        let mut codes = HashMap::new();
        for link in links {
            let url = link.original_url.as_str();
            if codes.contains_key(url) {
                continue;
            }
            match self.generator.generate(url) {
                Ok(code) => {
                    codes.insert(url, code);
                }
                Err(e) => debug!(id = %link.id, error = %e, "dropping batch item"),
            }
        }
        codes
    }

    /// Gives a new code to every URL holding `colliding`, leaving the other
    /// rows untouched. URLs the generator rejects are dropped.
    ///
    /// Returns false if no URL held the colliding code.
    fn regenerate(
        &self,
        codes: &mut HashMap<&str, String>,
        colliding: &str,
        attempt: usize,
    ) -> bool {
        let urls: Vec<&str> = codes
            .iter()
            .filter(|(_, code)| code.as_str() == colliding)
            .map(|(url, _)| *url)
            .collect();
        let found = !urls.is_empty();

        for url in urls {
            match self.generator.generate(&seed(url, attempt)) {
                Ok(code) => {
                    codes.insert(url, code);
                }
                Err(e) => {
                    debug!(error = %e, "dropping batch item");
                    codes.remove(url);
                }
            }
        }

        found
    }

    /// Resolves a short code to its live link.
    ///
    /// # Errors
    ///
    /// - [`ShortenerError::IdIsRequired`] if `code` is blank
    /// - [`ShortenerError::Store`] with [`StoreError::KeyNotFound`] for unknown
    ///   or deleted codes
    pub async fn get_full_link_by_short_code(
        &self,
        ctx: &RequestContext,
        code: &str,
    ) -> Result<Link, ShortenerError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(ShortenerError::IdIsRequired);
        }

        let link = self.repository.get(ctx, code).await?;
        Ok(self.with_short_url(link))
    }

    /// Lists the live links owned by `user_id`.
    pub async fn get_user_links(
        &self,
        ctx: &RequestContext,
        user_id: &str,
    ) -> Result<Vec<Link>, ShortenerError> {
        let links = self.repository.get_user_links(ctx, user_id).await?;
        Ok(links
            .into_iter()
            .map(|link| self.with_short_url(link))
            .collect())
    }

    /// Soft-deletes the links among `ids` owned by `user_id`.
    pub async fn delete_user_links(
        &self,
        ctx: &RequestContext,
        ids: &[String],
        user_id: &str,
    ) -> Result<(), ShortenerError> {
        self.repository.delete(ctx, ids, user_id).await?;
        Ok(())
    }

    /// Checks that the repository is reachable.
    pub async fn ping(&self, ctx: &RequestContext) -> Result<(), ShortenerError> {
        self.repository.ping(ctx).await?;
        Ok(())
    }
}
