//! # storage-adapters
//!
//! Persistence and mail backends behind the `domains` ports.
//!
//! - [`MemoryStore`]: every repository in process memory.
//! - [`PgStore`]: PostgreSQL via `sqlx` (feature `db-postgres`).
//! - [`LogMailer`] / [`FileMailer`]: outgoing mail.

pub mod mail;
pub mod memory;
#[cfg(feature = "db-postgres")]
pub mod postgres;

pub use mail::{FileMailer, LogMailer};
pub use memory::MemoryStore;
#[cfg(feature = "db-postgres")]
pub use postgres::PgStore;
