#![allow(dead_code)]

use axum_extra::extract::cookie::Cookie;
use axum_test::{TestRequest, TestResponse, TestServer};
use shortlink::api::middleware::auth::{USER_ID_COOKIE, USER_SIGN_COOKIE};
use shortlink::application::services::{AuthService, LinkService};
use shortlink::domain::repositories::LinkRepository;
use shortlink::infrastructure::persistence::MemoryLinkRepository;
use shortlink::routes::app_router;
use shortlink::state::AppState;
use shortlink::utils::code_generator::{CodeGenerator, HashGenerator, RandomGenerator};
use std::sync::Arc;
use std::time::Duration;

pub const BASE_URL: &str = "http://localhost:8080";
pub const CODE_LENGTH: usize = 6;

pub fn hash_generator() -> Arc<dyn CodeGenerator> {
    Arc::new(HashGenerator::new(CODE_LENGTH).unwrap())
}

pub fn random_generator() -> Arc<dyn CodeGenerator> {
    Arc::new(RandomGenerator::new(CODE_LENGTH).unwrap())
}

pub fn create_link_service(
    repository: Arc<dyn LinkRepository>,
    generator: Arc<dyn CodeGenerator>,
) -> LinkService {
    LinkService::new(repository, generator, BASE_URL).unwrap()
}

pub fn create_test_state_with(
    repository: Arc<dyn LinkRepository>,
    generator: Arc<dyn CodeGenerator>,
) -> AppState {
    AppState {
        link_service: Arc::new(create_link_service(repository, generator)),
        auth_service: Arc::new(AuthService::new("test-signing-secret".to_string())),
        cookie_secure: false,
        store_timeout: Duration::from_secs(5),
    }
}

pub fn create_test_state() -> AppState {
    create_test_state_with(Arc::new(MemoryLinkRepository::new()), hash_generator())
}

pub fn create_test_server() -> TestServer {
    TestServer::new(app_router(create_test_state())).unwrap()
}

pub fn create_random_code_server() -> TestServer {
    let state = create_test_state_with(Arc::new(MemoryLinkRepository::new()), random_generator());
    TestServer::new(app_router(state)).unwrap()
}

/// Short code at the end of a short URL.
pub fn code_of(short_url: &str) -> &str {
    short_url.rsplit('/').next().unwrap()
}

/// Identity cookies issued on `response`.
pub struct Identity {
    pub user_id: Cookie<'static>,
    pub sign: Cookie<'static>,
}

impl Identity {
    pub fn from_response(response: &TestResponse) -> Self {
        Self {
            user_id: response.cookie(USER_ID_COOKIE),
            sign: response.cookie(USER_SIGN_COOKIE),
        }
    }

    pub fn value(&self) -> &str {
        self.user_id.value()
    }

    /// Sends both cookies with `request`.
    pub fn attach(&self, request: TestRequest) -> TestRequest {
        request
            .add_cookie(self.user_id.clone())
            .add_cookie(self.sign.clone())
    }
}
