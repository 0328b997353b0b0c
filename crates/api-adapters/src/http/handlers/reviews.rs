use axum::extract::{OriginalUri, State};
use axum::http::StatusCode;
use axum::Json;
use domains::Id;
use services::reviews::ReviewInput;

use super::{paginate, ApiResult};
use crate::http::dto::ReviewView;
use crate::http::extract::{Actor, ApiJson, ApiPath, ApiQuery};
use crate::http::pagination::{PageParams, Paginated};
use crate::http::state::AppState;

pub async fn list(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    ApiPath(title_id): ApiPath<Id>,
    ApiQuery(page): ApiQuery<PageParams>,
) -> ApiResult<Json<Paginated<ReviewView>>> {
    paginate(&uri, &page, state.page_size, |request| {
        state.reviews.list(title_id, request)
    })
    .await
}

pub async fn create(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath(title_id): ApiPath<Id>,
    ApiJson(input): ApiJson<ReviewInput>,
) -> ApiResult<(StatusCode, Json<ReviewView>)> {
    let review = state.reviews.create(actor.user(), title_id, input).await?;
    Ok((StatusCode::CREATED, Json(review.into())))
}

pub async fn retrieve(
    State(state): State<AppState>,
    ApiPath((title_id, review_id)): ApiPath<(Id, Id)>,
) -> ApiResult<Json<ReviewView>> {
    Ok(Json(state.reviews.get(title_id, review_id).await?.into()))
}

pub async fn update(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath((title_id, review_id)): ApiPath<(Id, Id)>,
    ApiJson(input): ApiJson<ReviewInput>,
) -> ApiResult<Json<ReviewView>> {
    let review = state
        .reviews
        .update(actor.user(), title_id, review_id, input)
        .await?;
    Ok(Json(review.into()))
}

pub async fn destroy(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath((title_id, review_id)): ApiPath<(Id, Id)>,
) -> ApiResult<StatusCode> {
    state.reviews.delete(actor.user(), title_id, review_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
