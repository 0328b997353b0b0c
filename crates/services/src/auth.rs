//! Signup and token exchange.
//!
//! ```text
//! POST /signup/ {"username": "...", "email": "..."}   -> code mailed
//! POST /token/  {"username": "...", "confirmation_code": "..."} -> {"token": "..."}
//! ```

use std::sync::Arc;

use chrono::Utc;
use domains::validators::{validate_email, validate_username};
use domains::{
    AccessTokens, AppError, ConfirmationCodes, Email, Mailer, NewUser, Result, User, UserRepo,
    ValidationErrors,
};
use serde::{Deserialize, Serialize};

use crate::{check_present, required};

pub const CONFIRMATION_SUBJECT: &str = "Confirmation code";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignupInput {
    pub username: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignupOutcome {
    pub username: String,
    pub email: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenInput {
    pub username: Option<String>,
    pub confirmation_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenOutcome {
    pub token: String,
}

pub struct AuthService {
    users: Arc<dyn UserRepo>,
    codes: Arc<dyn ConfirmationCodes>,
    tokens: Arc<dyn AccessTokens>,
    mailer: Arc<dyn Mailer>,
    from_address: String,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepo>,
        codes: Arc<dyn ConfirmationCodes>,
        tokens: Arc<dyn AccessTokens>,
        mailer: Arc<dyn Mailer>,
        from_address: impl Into<String>,
    ) -> Self {
        Self {
            users,
            codes,
            tokens,
            mailer,
            from_address: from_address.into(),
        }
    }

    /// Registers a new account, or re-sends a code to an existing one whose
    /// username and email both match, and mails the confirmation code.
    pub async fn signup(&self, input: SignupInput) -> Result<SignupOutcome> {
        let mut errors = ValidationErrors::new();
        let username = required(&mut errors, "username", input.username);
        let email = required(&mut errors, "email", input.email);
        check_present(&mut errors, username.as_ref(), |v| validate_username(v));
        check_present(&mut errors, email.as_ref(), |v| validate_email(v));
        errors.into_result()?;
        let (Some(username), Some(email)) = (username, email) else {
            return Err(AppError::internal("validated signup fields missing"));
        };

        let by_name = self.users.find_by_username(&username).await?;
        let by_email = self.users.find_by_email(&email).await?;
        let user = match (by_name, by_email) {
            (Some(a), Some(b)) if a.id == b.id => {
                tracing::info!(username = %a.username, "confirmation code re-requested");
                a
            }
            (None, None) => {
                let user = self
                    .users
                    .create_user(NewUser::basic(username.as_str(), email.as_str()))
                    .await
                    .map_err(|err| match err {
                        AppError::Conflict(_) => AppError::invalid(
                            "username",
                            "A user with that username already exists.",
                        ),
                        other => other,
                    })?;
                tracing::info!(username = %user.username, "user signed up");
                user
            }
            (by_name, by_email) => {
                let mut errors = ValidationErrors::new();
                if by_name.is_some() {
                    errors.add("username", "A user with that username already exists.");
                }
                if by_email.is_some() {
                    errors.add("email", "A user with that email already exists.");
                }
                return Err(errors.into());
            }
        };

        self.send_code(&user).await?;
        Ok(SignupOutcome { username, email })
    }

    /// Exchanges a confirmation code for an access token. A successful
    /// exchange stamps `last_login`, which retires the code.
    pub async fn obtain_token(&self, input: TokenInput) -> Result<TokenOutcome> {
        let mut errors = ValidationErrors::new();
        let username = required(&mut errors, "username", input.username);
        let code = required(&mut errors, "confirmation_code", input.confirmation_code);
        errors.into_result()?;
        let (Some(username), Some(code)) = (username, code) else {
            return Err(AppError::internal("validated token fields missing"));
        };

        let user = self
            .users
            .find_by_username(&username)
            .await?
            .ok_or_else(|| AppError::not_found("user", &username))?;
        if !self.codes.check_code(&user, &code) {
            tracing::debug!(username = %user.username, "confirmation code rejected");
            return Err(AppError::invalid(
                "confirmation_code",
                "Invalid confirmation code.",
            ));
        }

        let token = self.tokens.issue(&user)?;
        self.users.set_last_login(user.id, Utc::now()).await?;
        tracing::info!(username = %user.username, "access token issued");
        Ok(TokenOutcome { token })
    }

    /// Resolves a bearer token to the user it was issued for.
    pub async fn authenticate(&self, token: &str) -> Result<User> {
        let user_id = self.tokens.verify(token)?;
        self.users
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("User not found.".into()))
    }

    async fn send_code(&self, user: &User) -> Result<()> {
        let code = self.codes.make_code(user);
        self.mailer
            .send(Email {
                from: self.from_address.clone(),
                to: user.email.clone(),
                subject: CONFIRMATION_SUBJECT.into(),
                body: code,
            })
            .await
    }
}
