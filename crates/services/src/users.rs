//! User management (admin) and the self-service profile.

use std::sync::Arc;

use domains::validators::{
    validate_email, validate_max_len, validate_username, FIRST_NAME_MAX, LAST_NAME_MAX,
};
use domains::{
    AppError, NewUser, Page, PageRequest, Result, Role, User, UserPatch, UserRepo,
    ValidationErrors,
};
use serde::Deserialize;

use crate::permissions::{require_authenticated, Access, Policy};
use crate::{check_present, required, trimmed};

const USERNAME_TAKEN: &str = "A user with that username already exists.";
const EMAIL_TAKEN: &str = "A user with that email already exists.";

/// User payload. `role` is kept as text so an unknown value becomes a field
/// error instead of a decoding failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserInput {
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub role: Option<String>,
}

impl UserInput {
    fn trimmed(self) -> Self {
        Self {
            first_name: trimmed(self.first_name),
            last_name: trimmed(self.last_name),
            bio: trimmed(self.bio),
            ..self
        }
    }
}

pub struct UserService {
    users: Arc<dyn UserRepo>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepo>) -> Self {
        Self { users }
    }

    pub async fn list(
        &self,
        actor: Option<&User>,
        search: Option<String>,
        page: PageRequest,
    ) -> Result<Page<User>> {
        Policy::AdminOnly.check(actor, Access::Read)?;
        let search = search.filter(|s| !s.trim().is_empty());
        self.users.list_users(search, page).await
    }

    pub async fn create(&self, actor: Option<&User>, input: UserInput) -> Result<User> {
        Policy::AdminOnly.check(actor, Access::Write)?;
        let user = self.create_unchecked(input, None).await?;
        tracing::info!(username = %user.username, role = %user.role, "user created");
        Ok(user)
    }

    /// Creates an admin account without an acting user, for bootstrapping.
    pub async fn create_admin(&self, username: String, email: String) -> Result<User> {
        let input = UserInput {
            username: Some(username),
            email: Some(email),
            ..UserInput::default()
        };
        let user = self.create_unchecked(input, Some(Role::Admin)).await?;
        tracing::info!(username = %user.username, "admin account created");
        Ok(user)
    }

    pub async fn get(&self, actor: Option<&User>, username: &str) -> Result<User> {
        Policy::AdminOnly.check(actor, Access::Read)?;
        self.by_username(username).await
    }

    pub async fn update(&self, actor: Option<&User>, username: &str, input: UserInput) -> Result<User> {
        Policy::AdminOnly.check(actor, Access::Write)?;
        let target = self.by_username(username).await?;
        self.apply(actor, &target, input).await
    }

    /// Full replacement of a user is not offered; only partial updates are.
    pub async fn replace(&self, actor: Option<&User>, username: &str) -> Result<User> {
        Policy::AdminOnly.check(actor, Access::Write)?;
        self.by_username(username).await?;
        Err(AppError::Forbidden(
            "Full update of a user is not allowed; use a partial update.".into(),
        ))
    }

    pub async fn delete(&self, actor: Option<&User>, username: &str) -> Result<()> {
        Policy::AdminOnly.check(actor, Access::Write)?;
        let target = self.by_username(username).await?;
        self.users.delete_user(target.id).await?;
        tracing::info!(username, "user deleted");
        Ok(())
    }

    pub async fn me(&self, actor: Option<&User>) -> Result<User> {
        Policy::Authenticated.check(actor, Access::Read)?;
        let actor = require_authenticated(actor)?;
        Ok(actor.clone())
    }

    pub async fn update_me(&self, actor: Option<&User>, input: UserInput) -> Result<User> {
        Policy::Authenticated.check(actor, Access::Write)?;
        let target = require_authenticated(actor)?.clone();
        self.apply(actor, &target, input).await
    }

    pub async fn delete_me(&self, actor: Option<&User>) -> Result<()> {
        Policy::Authenticated.check(actor, Access::Write)?;
        Err(AppError::MethodNotAllowed("DELETE".into()))
    }

    async fn by_username(&self, username: &str) -> Result<User> {
        self.users
            .find_by_username(username)
            .await?
            .ok_or_else(|| AppError::not_found("user", username))
    }

    async fn create_unchecked(&self, input: UserInput, forced_role: Option<Role>) -> Result<User> {
        let input = input.trimmed();
        let mut errors = ValidationErrors::new();
        let username = required(&mut errors, "username", input.username);
        let email = required(&mut errors, "email", input.email);
        check_present(&mut errors, username.as_ref(), |v| validate_username(v));
        check_present(&mut errors, email.as_ref(), |v| validate_email(v));
        validate_profile(&mut errors, &input.first_name, &input.last_name);
        let role = parse_role(&mut errors, input.role.as_deref());
        self.check_unique(&mut errors, username.as_deref(), email.as_deref(), None)
            .await?;
        errors.into_result()?;

        let (Some(username), Some(email)) = (username, email) else {
            return Err(AppError::internal("validated user fields missing"));
        };
        self.users
            .create_user(NewUser {
                username,
                email,
                role: forced_role.or(role).unwrap_or_default(),
                bio: input.bio.unwrap_or_default(),
                first_name: input.first_name.unwrap_or_default(),
                last_name: input.last_name.unwrap_or_default(),
            })
            .await
            .map_err(unique_violation)
    }

    async fn apply(&self, actor: Option<&User>, target: &User, input: UserInput) -> Result<User> {
        let input = input.trimmed();
        let mut errors = ValidationErrors::new();
        check_present(&mut errors, input.username.as_ref(), |v| validate_username(v));
        check_present(&mut errors, input.email.as_ref(), |v| validate_email(v));
        validate_profile(&mut errors, &input.first_name, &input.last_name);
        let mut role = parse_role(&mut errors, input.role.as_deref());
        self.check_unique(
            &mut errors,
            input.username.as_deref(),
            input.email.as_deref(),
            Some(target),
        )
        .await?;
        errors.into_result()?;

        let actor_is_admin = actor.is_some_and(User::is_admin);
        if role.is_some_and(|r| r != target.role) && !actor_is_admin {
            tracing::debug!(username = %target.username, "role change by non-admin ignored");
            role = None;
        }

        let patch = UserPatch {
            username: input.username,
            email: input.email,
            role,
            bio: input.bio,
            first_name: input.first_name,
            last_name: input.last_name,
        };
        let updated = self
            .users
            .update_user(target.id, patch)
            .await
            .map_err(unique_violation)?;
        tracing::info!(username = %updated.username, "user updated");
        Ok(updated)
    }

    /// Records collisions with accounts other than `current`.
    async fn check_unique(
        &self,
        errors: &mut ValidationErrors,
        username: Option<&str>,
        email: Option<&str>,
        current: Option<&User>,
    ) -> Result<()> {
        let is_other = |found: &User| current.map_or(true, |c| c.id != found.id);
        if let Some(username) = username.filter(|_| !errors.contains("username")) {
            if let Some(found) = self.users.find_by_username(username).await? {
                if is_other(&found) {
                    errors.add("username", USERNAME_TAKEN);
                }
            }
        }
        if let Some(email) = email.filter(|_| !errors.contains("email")) {
            if let Some(found) = self.users.find_by_email(email).await? {
                if is_other(&found) {
                    errors.add("email", EMAIL_TAKEN);
                }
            }
        }
        Ok(())
    }
}

fn validate_profile(errors: &mut ValidationErrors, first: &Option<String>, last: &Option<String>) {
    check_present(errors, first.as_ref(), |v| {
        validate_max_len("first_name", v, FIRST_NAME_MAX)
    });
    check_present(errors, last.as_ref(), |v| {
        validate_max_len("last_name", v, LAST_NAME_MAX)
    });
}

fn parse_role(errors: &mut ValidationErrors, raw: Option<&str>) -> Option<Role> {
    match raw.map(str::parse::<Role>) {
        Some(Ok(role)) => Some(role),
        Some(Err(AppError::Validation(e))) => {
            errors.merge(e);
            None
        }
        Some(Err(_)) | None => None,
    }
}

fn unique_violation(err: AppError) -> AppError {
    match err {
        AppError::Conflict(what) if what.contains("email") => AppError::invalid("email", EMAIL_TAKEN),
        AppError::Conflict(_) => AppError::invalid("username", USERNAME_TAKEN),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::user;
    use domains::MockUserRepo;

    fn repo_with(existing: Vec<User>) -> MockUserRepo {
        let mut repo = MockUserRepo::new();
        let by_name = existing.clone();
        repo.expect_find_by_username()
            .returning(move |name| Ok(by_name.iter().find(|u| u.username == name).cloned()));
        let by_email = existing;
        repo.expect_find_by_email()
            .returning(move |email| Ok(by_email.iter().find(|u| u.email == email).cloned()));
        repo
    }

    fn apply_patch(target: &User, patch: &UserPatch) -> User {
        let mut updated = target.clone();
        if let Some(role) = patch.role {
            updated.role = role;
        }
        if let Some(bio) = &patch.bio {
            updated.bio = bio.clone();
        }
        updated
    }

    #[tokio::test]
    async fn non_admin_cannot_promote_themselves() {
        let me = user(3, Role::User);
        let mut repo = repo_with(vec![me.clone()]);
        let target = me.clone();
        repo.expect_update_user()
            .withf(|id, patch| *id == 3 && patch.role.is_none())
            .returning(move |_, patch| Ok(apply_patch(&target, &patch)));
        let service = UserService::new(Arc::new(repo));

        let input = UserInput {
            role: Some("admin".into()),
            bio: Some("just a reader".into()),
            ..UserInput::default()
        };
        let updated = service.update_me(Some(&me), input).await.unwrap();
        assert_eq!(updated.role, Role::User);
        assert_eq!(updated.bio, "just a reader");
    }

    #[tokio::test]
    async fn admin_can_change_roles() {
        let admin = user(1, Role::Admin);
        let target = user(3, Role::User);
        let mut repo = repo_with(vec![admin.clone(), target.clone()]);
        let stored = target.clone();
        repo.expect_update_user()
            .withf(|_, patch| patch.role == Some(Role::Moderator))
            .returning(move |_, patch| Ok(apply_patch(&stored, &patch)));
        let service = UserService::new(Arc::new(repo));

        let input = UserInput {
            role: Some("moderator".into()),
            ..UserInput::default()
        };
        let updated = service
            .update(Some(&admin), &target.username, input)
            .await
            .unwrap();
        assert_eq!(updated.role, Role::Moderator);
    }

    #[tokio::test]
    async fn profile_text_is_trimmed_and_first_name_capped() {
        let me = user(3, Role::User);
        let mut repo = repo_with(vec![me.clone()]);
        repo.expect_update_user()
            .withf(|_, patch| {
                patch.first_name.as_deref() == Some("Anna")
                    && patch.last_name.as_deref() == Some("Karenina")
                    && patch.bio.as_deref() == Some("reader")
            })
            .times(1)
            .returning(move |_, patch| Ok(apply_patch(&me, &patch)));
        let service = UserService::new(Arc::new(repo));
        let me = user(3, Role::User);

        let input = UserInput {
            first_name: Some(" Anna ".into()),
            last_name: Some("Karenina  ".into()),
            bio: Some("\treader\n".into()),
            ..UserInput::default()
        };
        service.update_me(Some(&me), input).await.unwrap();

        let input = UserInput {
            first_name: Some("a".repeat(FIRST_NAME_MAX + 1)),
            ..UserInput::default()
        };
        let err = service.update_me(Some(&me), input).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(e) if e.contains("first_name")));
    }

    #[tokio::test]
    async fn reserved_username_is_rejected() {
        let service = UserService::new(Arc::new(repo_with(Vec::new())));
        for name in ["me", "ME"] {
            let input = UserInput {
                username: Some(name.into()),
                email: Some("me@example.com".into()),
                ..UserInput::default()
            };
            let err = service
                .create(Some(&user(1, Role::Admin)), input)
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Validation(e) if e.contains("username")));
        }
    }

    #[tokio::test]
    async fn unknown_role_is_a_field_error() {
        let service = UserService::new(Arc::new(repo_with(Vec::new())));
        let input = UserInput {
            username: Some("newbie".into()),
            email: Some("newbie@example.com".into()),
            role: Some("overlord".into()),
            ..UserInput::default()
        };
        let err = service
            .create(Some(&user(1, Role::Admin)), input)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(e) if e.contains("role")));
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let existing = user(2, Role::User);
        let service = UserService::new(Arc::new(repo_with(vec![existing.clone()])));
        let input = UserInput {
            username: Some("fresh".into()),
            email: Some(existing.email.clone()),
            ..UserInput::default()
        };
        let err = service
            .create(Some(&user(1, Role::Admin)), input)
            .await
            .unwrap_err();
        let AppError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert!(errors.contains("email"));
        assert!(!errors.contains("username"));
    }

    #[tokio::test]
    async fn full_update_is_forbidden_and_me_cannot_be_deleted() {
        let admin = user(1, Role::Admin);
        let service = UserService::new(Arc::new(repo_with(vec![admin.clone()])));

        let err = service.replace(Some(&admin), "user1").await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let err = service.delete_me(Some(&admin)).await.unwrap_err();
        assert!(matches!(err, AppError::MethodNotAllowed(_)));
    }

    #[tokio::test]
    async fn moderators_cannot_manage_users() {
        let service = UserService::new(Arc::new(MockUserRepo::new()));
        let err = service
            .list(Some(&user(2, Role::Moderator)), None, PageRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }
}
