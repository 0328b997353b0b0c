//! Role-based authorization gates.
//!
//! A policy is checked twice for resources that have an owner: once before
//! the object is loaded ([`Policy::check`]) and once against its author
//! ([`Policy::check_object`]).

use domains::{AppError, Id, Result, User};

const NOT_AUTHENTICATED: &str = "Authentication credentials were not provided.";
const NOT_PERMITTED: &str = "You do not have permission to perform this action.";

/// Whether a request only reads state or also changes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// User management.
    AdminOnly,
    /// Catalogue: categories, genres, titles.
    AdminOrReadOnly,
    /// Reviews and comments.
    OwnerModeratorAdminOrReadOnly,
    /// Self-service profile.
    Authenticated,
}

impl Policy {
    pub fn check(&self, actor: Option<&User>, access: Access) -> Result<()> {
        match self {
            Policy::AdminOnly => require_admin(actor),
            Policy::AdminOrReadOnly => match access {
                Access::Read => Ok(()),
                Access::Write => require_admin(actor),
            },
            Policy::OwnerModeratorAdminOrReadOnly => match access {
                Access::Read => Ok(()),
                Access::Write => require_authenticated(actor).map(|_| ()),
            },
            Policy::Authenticated => require_authenticated(actor).map(|_| ()),
        }
    }

    pub fn check_object(&self, actor: Option<&User>, access: Access, owner_id: Id) -> Result<()> {
        self.check(actor, access)?;
        if *self != Policy::OwnerModeratorAdminOrReadOnly || access == Access::Read {
            return Ok(());
        }
        let actor = require_authenticated(actor)?;
        if actor.id == owner_id || actor.is_moderator() || actor.is_admin() {
            Ok(())
        } else {
            tracing::debug!(actor = %actor.username, owner_id, "write on foreign object denied");
            Err(AppError::Forbidden(NOT_PERMITTED.into()))
        }
    }
}

pub fn require_authenticated(actor: Option<&User>) -> Result<&User> {
    actor.ok_or_else(|| AppError::Unauthorized(NOT_AUTHENTICATED.into()))
}

fn require_admin(actor: Option<&User>) -> Result<()> {
    let actor = require_authenticated(actor)?;
    if actor.is_admin() {
        Ok(())
    } else {
        tracing::debug!(actor = %actor.username, role = %actor.role, "admin-only action denied");
        Err(AppError::Forbidden(NOT_PERMITTED.into()))
    }
}
