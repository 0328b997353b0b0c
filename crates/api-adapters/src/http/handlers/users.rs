//! `/users/` (admin) and `/users/me/` (any signed-in user).

use axum::extract::{OriginalUri, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use services::users::UserInput;

use super::{non_blank, paginate, ApiResult};
use crate::http::dto::UserView;
use crate::http::extract::{Actor, ApiJson, ApiPath, ApiQuery};
use crate::http::pagination::{PageParams, Paginated};
use crate::http::state::AppState;

/// `?search=<username substring>`
#[derive(Debug, Default, Deserialize)]
pub struct UserSearch {
    pub search: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    actor: Actor,
    OriginalUri(uri): OriginalUri,
    ApiQuery(page): ApiQuery<PageParams>,
    ApiQuery(params): ApiQuery<UserSearch>,
) -> ApiResult<Json<Paginated<UserView>>> {
    let search = non_blank(params.search);
    paginate(&uri, &page, state.page_size, |request| {
        state.users.list(actor.user(), search, request)
    })
    .await
}

pub async fn create(
    State(state): State<AppState>,
    actor: Actor,
    ApiJson(input): ApiJson<UserInput>,
) -> ApiResult<(StatusCode, Json<UserView>)> {
    let user = state.users.create(actor.user(), input).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

pub async fn retrieve(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath(username): ApiPath<String>,
) -> ApiResult<Json<UserView>> {
    Ok(Json(state.users.get(actor.user(), &username).await?.into()))
}

pub async fn update(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath(username): ApiPath<String>,
    ApiJson(input): ApiJson<UserInput>,
) -> ApiResult<Json<UserView>> {
    let user = state.users.update(actor.user(), &username, input).await?;
    Ok(Json(user.into()))
}

/// `PUT` is routed so that it answers 403 rather than 405.
pub async fn replace(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath(username): ApiPath<String>,
) -> ApiResult<Json<UserView>> {
    Ok(Json(state.users.replace(actor.user(), &username).await?.into()))
}

pub async fn destroy(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath(username): ApiPath<String>,
) -> ApiResult<StatusCode> {
    state.users.delete(actor.user(), &username).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn me(State(state): State<AppState>, actor: Actor) -> ApiResult<Json<UserView>> {
    Ok(Json(state.users.me(actor.user()).await?.into()))
}

pub async fn update_me(
    State(state): State<AppState>,
    actor: Actor,
    ApiJson(input): ApiJson<UserInput>,
) -> ApiResult<Json<UserView>> {
    Ok(Json(state.users.update_me(actor.user(), input).await?.into()))
}

pub async fn delete_me(State(state): State<AppState>, actor: Actor) -> ApiResult<StatusCode> {
    state.users.delete_me(actor.user()).await?;
    Ok(StatusCode::NO_CONTENT)
}
