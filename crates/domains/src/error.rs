//! # AppError
//!
//! Centralized error handling for the review API.
//! Maps domain-specific failures to actionable error types; adapters decide
//! how each variant surfaces on their transport.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Key used for messages that are not attached to a single field.
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

/// Field-keyed validation messages, e.g. `{"year": ["..."]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a single-message error set.
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Folds the outcome of a single check into this set.
    pub fn check(&mut self, outcome: std::result::Result<(), ValidationErrors>) {
        if let Err(other) = outcome {
            self.merge(other);
        }
    }

    pub fn merge(&mut self, other: ValidationErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// `Ok(())` when nothing was collected, otherwise the whole set as an error.
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

/// The primary error type for all domain operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (e.g., Title, Review, User)
    #[error("{0} not found with key {1}")]
    NotFound(String, String),

    /// Input failed one or more field checks
    #[error("validation error: {0}")]
    Validation(ValidationErrors),

    /// Missing or invalid credentials
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated, but the actor's role does not allow the action
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The resource exists but does not support the requested verb
    #[error("method not allowed: {0}")]
    MethodNotAllowed(String),

    /// A write collided with stored state (unique key, protected reference)
    #[error("conflict: {0}")]
    Conflict(String),

    /// Infrastructure failure (e.g., DB down, mail backend unreachable)
    #[error("internal service error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(entity: &str, key: impl fmt::Display) -> Self {
        Self::NotFound(entity.to_string(), key.to_string())
    }

    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::Validation(ValidationErrors::field(field, message))
    }

    pub fn internal(err: impl fmt::Display) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

/// A specialized Result type for review API logic.
pub type Result<T> = std::result::Result<T, AppError>;
