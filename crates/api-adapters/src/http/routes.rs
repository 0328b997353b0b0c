//! Route table. Resource paths end in a slash and live under `/api/v1`.

use axum::middleware::from_fn_with_state;
use axum::routing::{delete, get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{auth, comments, health, reviews, taxonomy, titles, users};
use super::metrics;
use super::state::AppState;

pub const API_PREFIX: &str = "/api/v1";

fn api() -> Router<AppState> {
    Router::new()
        .route("/titles/", get(titles::list).post(titles::create))
        .route(
            "/titles/{title_id}/",
            get(titles::retrieve)
                .patch(titles::update)
                .delete(titles::destroy),
        )
        .route(
            "/titles/{title_id}/reviews/",
            get(reviews::list).post(reviews::create),
        )
        .route(
            "/titles/{title_id}/reviews/{review_id}/",
            get(reviews::retrieve)
                .patch(reviews::update)
                .delete(reviews::destroy),
        )
        .route(
            "/titles/{title_id}/reviews/{review_id}/comments/",
            get(comments::list).post(comments::create),
        )
        .route(
            "/titles/{title_id}/reviews/{review_id}/comments/{comment_id}/",
            get(comments::retrieve)
                .patch(comments::update)
                .delete(comments::destroy),
        )
        .route(
            "/categories/",
            get(taxonomy::list_categories).post(taxonomy::create_category),
        )
        .route("/categories/{slug}/", delete(taxonomy::destroy_category))
        .route(
            "/genres/",
            get(taxonomy::list_genres).post(taxonomy::create_genre),
        )
        .route("/genres/{slug}/", delete(taxonomy::destroy_genre))
        .route("/users/", get(users::list).post(users::create))
        .route(
            "/users/me/",
            get(users::me)
                .patch(users::update_me)
                .delete(users::delete_me),
        )
        .route(
            "/users/{username}/",
            get(users::retrieve)
                .patch(users::update)
                .put(users::replace)
                .delete(users::destroy),
        )
        .route("/signup/", post(auth::signup))
        .route("/token/", post(auth::token))
}

/// Builds the application with its middleware stack.
pub fn router(state: AppState) -> Router {
    Router::new()
        .nest(API_PREFIX, api())
        .route("/health", get(health::health))
        .route("/metrics", get(metrics::render))
        .fallback(health::not_found)
        .layer(from_fn_with_state(state.clone(), metrics::track))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
