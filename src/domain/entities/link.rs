//! Link entity representing a shortened URL mapping.

/// A shortened URL mapping.
///
/// `id` is the primary key and never changes once the record exists. Records
/// created by [`crate::application::services::LinkService`] use the short code
/// as their id. `short_url` is derived from the configured base URL and is
/// never persisted; repositories return it empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Link {
    pub id: String,
    pub short_code: String,
    pub short_url: String,
    pub original_url: String,
    pub user_id: String,
    pub is_deleted: bool,
}

impl Link {
    /// Creates a live link whose id equals its short code.
    pub fn new(
        code: impl Into<String>,
        original_url: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        let code = code.into();
        Self {
            id: code.clone(),
            short_code: code,
            short_url: String::new(),
            original_url: original_url.into(),
            user_id: user_id.into(),
            is_deleted: false,
        }
    }

    /// Returns true if either storage key is blank.
    pub fn has_blank_key(&self) -> bool {
        self.id.trim().is_empty() || self.short_code.trim().is_empty()
    }

    /// Returns true if the link belongs to `user_id`.
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }
}
