//! axum adapter.

pub mod dto;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod metrics;
pub mod pagination;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::router;
pub use state::{AppState, Ports};
