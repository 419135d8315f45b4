//! Signed cookie identity middleware.

use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use serde_json::json;

use crate::{error::AppError, state::AppState};

pub const USER_ID_COOKIE: &str = "USER_ID";
pub const USER_SIGN_COOKIE: &str = "USER_SIGN";

/// Identity of the caller, placed in request extensions by [`layer`].
///
/// Extracts as the anonymous (empty) user on routes without the middleware.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserId(pub String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_anonymous(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S> FromRequestParts<S> for UserId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<UserId>().cloned().unwrap_or_default())
    }
}

fn identity_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build()
}

/// Resolves the caller's identity from signed cookies.
///
/// # Cookie Format
///
/// ```text
/// Cookie: USER_ID=<32 hex chars>; USER_SIGN=<hex HMAC-SHA256 of USER_ID>
/// ```
///
/// A request with a missing or badly signed pair is given a fresh id, and
/// both cookies are set on its response. The id is inserted into request
/// extensions as [`UserId`].
///
/// # Errors
///
/// Returns `500 Internal Server Error` if no random id can be generated.
pub async fn layer(
    State(st): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let verified = match (jar.get(USER_ID_COOKIE), jar.get(USER_SIGN_COOKIE)) {
        (Some(id), Some(sign)) if st.auth_service.verify(id.value(), sign.value()) => {
            Some(id.value().to_string())
        }
        _ => None,
    };

    let (user_id, issued) = match verified {
        Some(user_id) => (user_id, false),
        None => {
            let user_id = st.auth_service.generate_user_id().map_err(|e| {
                tracing::error!(error = %e, "failed to generate user id");
                AppError::internal("Internal server error", json!({}))
            })?;
            (user_id, true)
        }
    };

    req.extensions_mut().insert(UserId(user_id.clone()));
    let response = next.run(req).await;

    if !issued {
        return Ok(response);
    }

    let signature = st.auth_service.sign(&user_id);
    let jar = jar
        .add(identity_cookie(USER_ID_COOKIE, user_id, st.cookie_secure))
        .add(identity_cookie(USER_SIGN_COOKIE, signature, st.cookie_secure));

    Ok((jar, response).into_response())
}
