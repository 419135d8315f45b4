//! In-memory link index shared by the memory and file repositories.
//!
//! Holds every record, soft-deleted ones included, keyed by id with secondary
//! lookups by short code and original URL. The index only answers questions
//! and applies already-validated changes; callers provide locking.

use std::collections::HashMap;

use crate::domain::entities::Link;
use crate::domain::repositories::StoreError;

#[derive(Debug, Default)]
pub(crate) struct LinkIndex {
    links: HashMap<String, Link>,
    by_code: HashMap<String, String>,
    by_original_url: HashMap<String, String>,
    /// Ids in insertion order, used when the whole index is written out.
    order: Vec<String>,
}

impl LinkIndex {
    pub(crate) fn len(&self) -> usize {
        self.links.len()
    }

    /// Checks that `link` can be inserted as a new record.
    pub(crate) fn check_insert(&self, link: &Link) -> Result<(), StoreError> {
        if link.has_blank_key() {
            return Err(StoreError::EmptyKey);
        }
        if let Some(existing) = self.find_by_original_url(&link.original_url) {
            return Err(StoreError::OriginalUrlAlreadyExists(Box::new(existing.clone())));
        }
        if self.links.contains_key(&link.id) || self.by_code.contains_key(&link.short_code) {
            return Err(StoreError::KeyAlreadyExists(link.id.clone()));
        }
        Ok(())
    }

    /// Validates a batch against the index and against itself.
    ///
    /// Returns the links that are not yet stored. Rows matching a live record
    /// with the same id and original URL are idempotent rewrites and are left
    /// out.
    pub(crate) fn plan_batch<'a>(&self, links: &'a [Link]) -> Result<Vec<&'a Link>, StoreError> {
        if links.is_empty() {
            return Err(StoreError::BatchIsEmpty);
        }

        let mut staged_ids: HashMap<&str, &Link> = HashMap::new();
        let mut staged_urls: HashMap<&str, &Link> = HashMap::new();
        let mut fresh = Vec::with_capacity(links.len());

        for link in links {
            if link.has_blank_key() {
                return Err(StoreError::EmptyKey);
            }

            if let Some(existing) = self.links.get(&link.id) {
                if existing.original_url != link.original_url {
                    return Err(StoreError::KeyAlreadyExists(link.id.clone()));
                }
                if existing.is_deleted {
                    return Err(StoreError::OriginalUrlAlreadyExists(Box::new(existing.clone())));
                }
                continue;
            }

            if let Some(existing) = self.find_by_original_url(&link.original_url) {
                return Err(StoreError::OriginalUrlAlreadyExists(Box::new(existing.clone())));
            }
            if self.by_code.contains_key(&link.short_code) {
                return Err(StoreError::KeyAlreadyExists(link.id.clone()));
            }

            if let Some(staged) = staged_ids.get(link.id.as_str()) {
                if staged.original_url != link.original_url {
                    return Err(StoreError::KeyAlreadyExists(link.id.clone()));
                }
                continue;
            }
            if let Some(staged) = staged_urls.get(link.original_url.as_str()) {
                return Err(StoreError::OriginalUrlAlreadyExists(Box::new((*staged).clone())));
            }

            staged_ids.insert(&link.id, link);
            staged_urls.insert(&link.original_url, link);
            fresh.push(link);
        }

        Ok(fresh)
    }

    /// Inserts or replaces a record without validation.
    pub(crate) fn insert(&mut self, link: Link) {
        if !self.links.contains_key(&link.id) {
            self.order.push(link.id.clone());
        }
        self.by_code.insert(link.short_code.clone(), link.id.clone());
        self.by_original_url
            .insert(link.original_url.clone(), link.id.clone());
        self.links.insert(link.id.clone(), link);
    }

    /// Finds a live record by short code.
    pub(crate) fn get_live(&self, short_code: &str) -> Option<&Link> {
        self.by_code
            .get(short_code)
            .and_then(|id| self.links.get(id))
            .filter(|link| !link.is_deleted)
    }

    /// Finds any record, deleted or not, by original URL.
    pub(crate) fn find_by_original_url(&self, original_url: &str) -> Option<&Link> {
        self.by_original_url
            .get(original_url)
            .and_then(|id| self.links.get(id))
    }

    pub(crate) fn user_links(&self, user_id: &str) -> Vec<Link> {
        self.links
            .values()
            .filter(|link| !link.is_deleted && link.is_owned_by(user_id))
            .cloned()
            .collect()
    }

    /// Returns the ids among `ids` that are live and owned by `user_id`.
    pub(crate) fn deletable(&self, ids: &[String], user_id: &str) -> Vec<String> {
        let mut found: Vec<String> = ids
            .iter()
            .filter(|id| {
                self.links
                    .get(id.as_str())
                    .is_some_and(|link| !link.is_deleted && link.is_owned_by(user_id))
            })
            .cloned()
            .collect();
        found.sort();
        found.dedup();
        found
    }

    pub(crate) fn mark_deleted(&mut self, ids: &[String]) {
        for id in ids {
            if let Some(link) = self.links.get_mut(id) {
                link.is_deleted = true;
            }
        }
    }

    /// Iterates every record in insertion order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &Link> {
        self.order.iter().filter_map(|id| self.links.get(id))
    }
}
