//! crates/domains/src/lib.rs
//!
//! Entities, validation rules, the shared error type and the port traits
//! that the services and adapters meet at.

pub mod error;
pub mod models;
pub mod ports;
pub mod query;
pub mod validators;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use ports::*;
pub use query::*;
