//! crates/services/src/lib.rs
//!
//! Use cases of the review API. Each service validates incoming payloads,
//! applies the permission policy of its resource and drives the ports in
//! `domains`; transports only translate to and from the wire.

pub mod auth;
pub mod comments;
pub mod import;
pub mod permissions;
pub mod reviews;
pub mod taxonomy;
pub mod titles;
pub mod users;

pub use auth::AuthService;
pub use comments::CommentService;
pub use import::CsvImporter;
pub use permissions::{Access, Policy};
pub use reviews::ReviewService;
pub use taxonomy::TaxonomyService;
pub use titles::TitleService;
pub use users::UserService;

use domains::validators::Check;
use domains::ValidationErrors;
use serde::{Deserialize, Deserializer};

pub(crate) const REQUIRED: &str = "This field is required.";
pub(crate) const NOT_NULL: &str = "This field may not be null.";

/// Unwraps a required payload field, recording the miss in `errors`.
pub(crate) fn required<T>(errors: &mut ValidationErrors, field: &str, value: Option<T>) -> Option<T> {
    if value.is_none() {
        errors.add(field, REQUIRED);
    }
    value
}

/// Unwraps a field that was sent, recording an explicit `null` in `errors`.
pub(crate) fn not_null<T>(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<T>,
) -> Option<T> {
    if value.is_none() {
        errors.add(field, NOT_NULL);
    }
    value
}

/// Text fields are stored without surrounding whitespace.
pub(crate) fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_owned())
}

/// Tells an explicit `null` (`Some(None)`) from an absent field (`None`,
/// via `#[serde(default)]`).
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Runs `check` only when the optional value is present.
pub(crate) fn check_present<T>(
    errors: &mut ValidationErrors,
    value: Option<&T>,
    check: impl FnOnce(&T) -> Check,
) {
    if let Some(value) = value {
        errors.check(check(value));
    }
}
