//! Request extractors: JSON bodies, query strings and path segments with
//! rejections mapped through [`ApiError`], and the optional bearer-token
//! [`Actor`].

use axum::extract::{FromRequest, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderValue;
use domains::{AppError, User};

use super::error::ApiError;
use super::state::AppState;

const BEARER: &str = "Bearer";

#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// The user behind the request's access token, if it carried one.
///
/// A request without an `Authorization: Bearer` header is anonymous; a
/// header that is present but does not verify fails with 401.
#[derive(Debug, Clone)]
pub struct Actor(pub Option<User>);

impl Actor {
    pub fn user(&self) -> Option<&User> {
        self.0.as_ref()
    }
}

impl FromRequestParts<AppState> for Actor {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = match parts.headers.get(AUTHORIZATION) {
            Some(value) => bearer_token(value)?,
            None => None,
        };
        let Some(token) = token else {
            return Ok(Actor(None));
        };
        let user = state.auth.authenticate(&token).await?;
        Ok(Actor(Some(user)))
    }
}

/// `Ok(None)` for other schemes, so they fall through as anonymous.
fn bearer_token(value: &HeaderValue) -> Result<Option<String>, AppError> {
    let raw = value
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid Authorization header.".into()))?;
    let mut parts = raw.split_whitespace();
    match parts.next() {
        Some(scheme) if scheme.eq_ignore_ascii_case(BEARER) => {}
        _ => return Ok(None),
    }
    match (parts.next(), parts.next()) {
        (Some(token), None) => Ok(Some(token.to_owned())),
        (None, _) => Err(AppError::Unauthorized(
            "Invalid Authorization header. No credentials provided.".into(),
        )),
        (Some(_), Some(_)) => Err(AppError::Unauthorized(
            "Invalid Authorization header. Credentials string should not contain spaces.".into(),
        )),
    }
}
