//! Verify Code Use Case
//!
//! Exchanges a confirmation code for an access token. A code works once.

use chrono::Utc;
use kernel::error::field::FieldErrors;
use std::sync::Arc;

use crate::application::access_token::TokenIssuer;
use crate::application::config::AuthConfig;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{confirmation::ConfirmationCode, username::Username};
use crate::error::{AuthError, AuthResult};

#[derive(Debug, Clone, Default)]
pub struct VerifyCodeInput {
    pub username: Option<String>,
    pub confirmation_code: Option<String>,
}

#[derive(Debug, Clone)]
pub struct VerifyCodeOutput {
    pub access: String,
}

/// Verify code use case
pub struct VerifyCodeUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
    tokens: Arc<TokenIssuer>,
    config: Arc<AuthConfig>,
}

impl<U> VerifyCodeUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>, tokens: Arc<TokenIssuer>, config: Arc<AuthConfig>) -> Self {
        Self {
            user_repo,
            tokens,
            config,
        }
    }

    pub async fn execute(&self, input: VerifyCodeInput) -> AuthResult<VerifyCodeOutput> {
        let mut errors = FieldErrors::new();
        let username = input.username.filter(|u| !u.trim().is_empty());
        let code = input.confirmation_code.filter(|c| !c.trim().is_empty());
        if username.is_none() {
            errors.required("username");
        }
        if code.is_none() {
            errors.required("confirmation_code");
        }
        let (Some(username), Some(code)) = (username, code) else {
            return Err(errors.into());
        };

        let user = self
            .user_repo
            .find_by_username(&Username::normalize(&username))
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let now = Utc::now();
        let candidate =
            ConfirmationCode::from_input(code).digest(&self.config.confirmation_secret, &user.username);

        let expected = user
            .confirmation
            .verify(&candidate, now, self.config.confirmation_code_ttl())
            .map_err(|reason| {
                tracing::debug!(user_id = %user.id, reason = %reason, "Confirmation code rejected");
                AuthError::InvalidConfirmationCode
            })?;

        // Lost race with a concurrent exchange of the same code.
        if !self.user_repo.consume_code(user.id, expected, now).await? {
            return Err(AuthError::InvalidConfirmationCode);
        }

        let access = self.tokens.issue(&user, now)?;

        tracing::info!(user_id = %user.id, username = %user.username, "Access token issued");

        Ok(VerifyCodeOutput { access })
    }
}
