//! DTOs for the per-user link endpoints.

use serde::{Deserialize, Serialize};

use crate::domain::entities::Link;

#[derive(Debug, Serialize, Deserialize)]
pub struct UserUrl {
    pub short_url: String,
    pub original_url: String,
}

impl From<Link> for UserUrl {
    fn from(link: Link) -> Self {
        Self {
            short_url: link.short_url,
            original_url: link.original_url,
        }
    }
}
