use axum::extract::State;
use axum::Json;
use services::auth::{SignupInput, SignupOutcome, TokenInput, TokenOutcome};

use super::ApiResult;
use crate::http::extract::ApiJson;
use crate::http::state::AppState;

/// `POST /signup/`: creates the account if needed and mails a code.
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<SignupInput>,
) -> ApiResult<Json<SignupOutcome>> {
    Ok(Json(state.auth.signup(input).await?))
}

/// `POST /token/`: trades a confirmation code for an access token.
pub async fn token(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<TokenInput>,
) -> ApiResult<Json<TokenOutcome>> {
    Ok(Json(state.auth.obtain_token(input).await?))
}
