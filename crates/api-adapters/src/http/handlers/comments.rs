use axum::extract::{OriginalUri, State};
use axum::http::StatusCode;
use axum::Json;
use domains::Id;
use services::comments::CommentInput;

use super::{paginate, ApiResult};
use crate::http::dto::CommentView;
use crate::http::extract::{Actor, ApiJson, ApiPath, ApiQuery};
use crate::http::pagination::{PageParams, Paginated};
use crate::http::state::AppState;

pub async fn list(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    ApiPath((title_id, review_id)): ApiPath<(Id, Id)>,
    ApiQuery(page): ApiQuery<PageParams>,
) -> ApiResult<Json<Paginated<CommentView>>> {
    paginate(&uri, &page, state.page_size, |request| {
        state.comments.list(title_id, review_id, request)
    })
    .await
}

pub async fn create(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath((title_id, review_id)): ApiPath<(Id, Id)>,
    ApiJson(input): ApiJson<CommentInput>,
) -> ApiResult<(StatusCode, Json<CommentView>)> {
    let comment = state
        .comments
        .create(actor.user(), title_id, review_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(comment.into())))
}

pub async fn retrieve(
    State(state): State<AppState>,
    ApiPath((title_id, review_id, comment_id)): ApiPath<(Id, Id, Id)>,
) -> ApiResult<Json<CommentView>> {
    let comment = state.comments.get(title_id, review_id, comment_id).await?;
    Ok(Json(comment.into()))
}

pub async fn update(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath((title_id, review_id, comment_id)): ApiPath<(Id, Id, Id)>,
    ApiJson(input): ApiJson<CommentInput>,
) -> ApiResult<Json<CommentView>> {
    let comment = state
        .comments
        .update(actor.user(), title_id, review_id, comment_id, input)
        .await?;
    Ok(Json(comment.into()))
}

pub async fn destroy(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath((title_id, review_id, comment_id)): ApiPath<(Id, Id, Id)>,
) -> ApiResult<StatusCode> {
    state
        .comments
        .delete(actor.user(), title_id, review_id, comment_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
