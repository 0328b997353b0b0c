//! One function per route. Each one extracts, calls a service and wraps
//! the result in its wire form.

pub mod auth;
pub mod comments;
pub mod health;
pub mod reviews;
pub mod taxonomy;
pub mod titles;
pub mod users;

use axum::http::Uri;
use axum::Json;
use domains::Page;

use super::error::ApiError;
use super::pagination::{PageParams, Paginated};

pub(crate) type ApiResult<T> = Result<T, ApiError>;

/// Runs a page-returning lookup and wraps the result in the list envelope.
pub(crate) async fn paginate<T, V, F>(
    uri: &Uri,
    params: &PageParams,
    size: u32,
    fetch: impl FnOnce(domains::PageRequest) -> F,
) -> ApiResult<Json<Paginated<V>>>
where
    F: std::future::Future<Output = domains::Result<Page<T>>>,
    V: From<T>,
{
    let request = params.request(size)?;
    let page = fetch(request).await?.map(V::from);
    Ok(Json(Paginated::new(page, request, uri)?))
}

/// Treats `?field=` like an absent filter.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
