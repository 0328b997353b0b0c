//! `/categories/` and `/genres/`: identical shapes over two taxonomies.

use axum::extract::{OriginalUri, State};
use axum::http::{StatusCode, Uri};
use axum::Json;
use serde::Deserialize;
use services::taxonomy::TermInput;
use services::TaxonomyService;

use super::{non_blank, paginate, ApiResult};
use crate::http::dto::TermView;
use crate::http::extract::{Actor, ApiJson, ApiPath, ApiQuery};
use crate::http::pagination::{PageParams, Paginated};
use crate::http::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub search: Option<String>,
}

async fn list(
    service: &TaxonomyService,
    size: u32,
    uri: &Uri,
    page: &PageParams,
    search: SearchParams,
) -> ApiResult<Json<Paginated<TermView>>> {
    let search = non_blank(search.search);
    paginate(uri, page, size, |request| service.list(search, request)).await
}

async fn create(
    service: &TaxonomyService,
    actor: &Actor,
    input: TermInput,
) -> ApiResult<(StatusCode, Json<TermView>)> {
    let term = service.create(actor.user(), input).await?;
    Ok((StatusCode::CREATED, Json(term.into())))
}

async fn destroy(service: &TaxonomyService, actor: &Actor, slug: &str) -> ApiResult<StatusCode> {
    service.delete(actor.user(), slug).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_categories(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    ApiQuery(page): ApiQuery<PageParams>,
    ApiQuery(search): ApiQuery<SearchParams>,
) -> ApiResult<Json<Paginated<TermView>>> {
    list(&state.categories, state.page_size, &uri, &page, search).await
}

pub async fn create_category(
    State(state): State<AppState>,
    actor: Actor,
    ApiJson(input): ApiJson<TermInput>,
) -> ApiResult<(StatusCode, Json<TermView>)> {
    create(&state.categories, &actor, input).await
}

pub async fn destroy_category(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath(slug): ApiPath<String>,
) -> ApiResult<StatusCode> {
    destroy(&state.categories, &actor, &slug).await
}

pub async fn list_genres(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    ApiQuery(page): ApiQuery<PageParams>,
    ApiQuery(search): ApiQuery<SearchParams>,
) -> ApiResult<Json<Paginated<TermView>>> {
    list(&state.genres, state.page_size, &uri, &page, search).await
}

pub async fn create_genre(
    State(state): State<AppState>,
    actor: Actor,
    ApiJson(input): ApiJson<TermInput>,
) -> ApiResult<(StatusCode, Json<TermView>)> {
    create(&state.genres, &actor, input).await
}

pub async fn destroy_genre(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath(slug): ApiPath<String>,
) -> ApiResult<StatusCode> {
    destroy(&state.genres, &actor, &slug).await
}
