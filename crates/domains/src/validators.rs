//! Field validators.
//!
//! Each check returns the offending field keyed to its message so callers can
//! collect several failures into one [`ValidationErrors`].

use chrono::{Datelike, Utc};

use crate::error::ValidationErrors;

pub type Check = Result<(), ValidationErrors>;

pub const USERNAME_MAX: usize = 150;
pub const EMAIL_MAX: usize = 254;
pub const NAME_MAX: usize = 255;
pub const DESCRIPTION_MAX: usize = 255;
pub const SLUG_MAX: usize = 50;
pub const FIRST_NAME_MAX: usize = 30;
pub const LAST_NAME_MAX: usize = 150;
pub const SCORE_MIN: i32 = 1;
pub const SCORE_MAX: i32 = 10;

/// Path segment owned by the self-service profile endpoint.
pub const RESERVED_USERNAME: &str = "me";

pub fn current_year() -> i32 {
    Utc::now().year()
}

/// A title's year must lie between year zero and the current year.
pub fn validate_year(value: i32) -> Check {
    if value < 0 || value > current_year() {
        return Err(ValidationErrors::field(
            "year",
            "Check the year of the title: it must be between 0 and the current year.",
        ));
    }
    Ok(())
}

pub fn validate_score(value: i32) -> Check {
    if !(SCORE_MIN..=SCORE_MAX).contains(&value) {
        return Err(ValidationErrors::field(
            "score",
            format!("Score must be an integer from {SCORE_MIN} to {SCORE_MAX}."),
        ));
    }
    Ok(())
}

pub fn validate_username(value: &str) -> Check {
    if value.is_empty() {
        return Err(ValidationErrors::field("username", "This field may not be blank."));
    }
    if value.eq_ignore_ascii_case(RESERVED_USERNAME) {
        return Err(ValidationErrors::field(
            "username",
            format!("Username \"{value}\" is reserved."),
        ));
    }
    if value.chars().count() > USERNAME_MAX {
        return Err(ValidationErrors::field(
            "username",
            format!("Ensure this field has no more than {USERNAME_MAX} characters."),
        ));
    }
    let allowed = |ch: char| ch.is_alphanumeric() || matches!(ch, '.' | '@' | '+' | '-' | '_');
    if !value.chars().all(allowed) {
        return Err(ValidationErrors::field(
            "username",
            "Enter a valid username. It may contain only letters, numbers, and @/./+/-/_ characters.",
        ));
    }
    Ok(())
}

pub fn validate_email(value: &str) -> Check {
    if value.is_empty() {
        return Err(ValidationErrors::field("email", "This field may not be blank."));
    }
    if value.chars().count() > EMAIL_MAX {
        return Err(ValidationErrors::field(
            "email",
            format!("Ensure this field has no more than {EMAIL_MAX} characters."),
        ));
    }
    let well_formed = match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !value.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if !well_formed {
        return Err(ValidationErrors::field("email", "Enter a valid email address."));
    }
    Ok(())
}

pub fn validate_slug(value: &str) -> Check {
    if value.is_empty() {
        return Err(ValidationErrors::field("slug", "This field may not be blank."));
    }
    if value.chars().count() > SLUG_MAX {
        return Err(ValidationErrors::field(
            "slug",
            format!("Ensure this field has no more than {SLUG_MAX} characters."),
        ));
    }
    if !value
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
    {
        return Err(ValidationErrors::field(
            "slug",
            "Enter a valid slug consisting of letters, numbers, underscores or hyphens.",
        ));
    }
    Ok(())
}

/// Non-blank text no longer than `max` characters.
pub fn validate_text(field: &str, value: &str, max: Option<usize>) -> Check {
    if value.trim().is_empty() {
        return Err(ValidationErrors::field(field, "This field may not be blank."));
    }
    match max {
        Some(max) if value.chars().count() > max => Err(ValidationErrors::field(
            field,
            format!("Ensure this field has no more than {max} characters."),
        )),
        _ => Ok(()),
    }
}

/// Optional profile text: may be empty, but bounded.
pub fn validate_max_len(field: &str, value: &str, max: usize) -> Check {
    if value.chars().count() > max {
        return Err(ValidationErrors::field(
            field,
            format!("Ensure this field has no more than {max} characters."),
        ));
    }
    Ok(())
}
