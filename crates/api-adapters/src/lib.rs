//! # api-adapters
//!
//! Inbound transports for the review API. The `web-axum` feature builds the
//! JSON-over-HTTP surface: router, extractors, pagination envelope, error
//! mapping and request metrics. Handlers stay thin; validation and
//! permissions live in `services`.

#[cfg(feature = "web-axum")]
pub mod http;

#[cfg(feature = "web-axum")]
pub use http::{router, AppState, Ports};
