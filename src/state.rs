use std::sync::Arc;
use std::time::Duration;

use crate::application::services::{AuthService, LinkService};
use crate::domain::context::RequestContext;

#[derive(Clone)]
pub struct AppState {
    pub link_service: Arc<LinkService>,
    pub auth_service: Arc<AuthService>,
    pub cookie_secure: bool,
    pub store_timeout: Duration,
}

impl AppState {
    /// Builds the storage context for one request.
    pub fn context(&self, user_id: &str) -> RequestContext {
        RequestContext::with_user(user_id).timeout(self.store_timeout)
    }
}
