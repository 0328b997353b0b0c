use axum::extract::{OriginalUri, State};
use axum::http::StatusCode;
use axum::Json;
use domains::{AppError, Id, TitleFilter};
use serde::Deserialize;
use services::titles::TitleInput;

use super::{non_blank, paginate, ApiResult};
use crate::http::dto::TitleView;
use crate::http::extract::{Actor, ApiJson, ApiPath, ApiQuery};
use crate::http::pagination::{PageParams, Paginated};
use crate::http::state::AppState;

/// `?category=<slug>&genre=<slug>&name=<substring>&year=<n>`
#[derive(Debug, Default, Deserialize)]
pub struct TitleParams {
    pub category: Option<String>,
    pub genre: Option<String>,
    pub name: Option<String>,
    pub year: Option<String>,
}

impl TitleParams {
    fn into_filter(self) -> domains::Result<TitleFilter> {
        let year = match non_blank(self.year) {
            Some(raw) => Some(
                raw.trim()
                    .parse::<i32>()
                    .map_err(|_| AppError::invalid("year", "Enter a number."))?,
            ),
            None => None,
        };
        Ok(TitleFilter {
            category: non_blank(self.category),
            genre: non_blank(self.genre),
            name: non_blank(self.name),
            year,
        })
    }
}

pub async fn list(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    ApiQuery(page): ApiQuery<PageParams>,
    ApiQuery(params): ApiQuery<TitleParams>,
) -> ApiResult<Json<Paginated<TitleView>>> {
    let filter = params.into_filter()?;
    paginate(&uri, &page, state.page_size, |request| {
        state.titles.list(filter, request)
    })
    .await
}

pub async fn create(
    State(state): State<AppState>,
    actor: Actor,
    ApiJson(input): ApiJson<TitleInput>,
) -> ApiResult<(StatusCode, Json<TitleView>)> {
    let title = state.titles.create(actor.user(), input).await?;
    Ok((StatusCode::CREATED, Json(title.into())))
}

pub async fn retrieve(
    State(state): State<AppState>,
    ApiPath(title_id): ApiPath<Id>,
) -> ApiResult<Json<TitleView>> {
    Ok(Json(state.titles.get(title_id).await?.into()))
}

pub async fn update(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath(title_id): ApiPath<Id>,
    ApiJson(input): ApiJson<TitleInput>,
) -> ApiResult<Json<TitleView>> {
    let title = state.titles.update(actor.user(), title_id, input).await?;
    Ok(Json(title.into()))
}

pub async fn destroy(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath(title_id): ApiPath<Id>,
) -> ApiResult<StatusCode> {
    state.titles.delete(actor.user(), title_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
