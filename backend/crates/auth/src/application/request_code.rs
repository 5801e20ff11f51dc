//! Request Code Use Case
//!
//! Registers `(username, email)` if needed and mails a fresh confirmation
//! code to the address.

use chrono::Utc;
use kernel::error::field::FieldErrors;
use platform::mail::{MailMessage, MailSender};
use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::domain::repository::{IssueOutcome, UserRepository};
use crate::domain::value_object::{
    confirmation::ConfirmationCode, email::Email, username::Username,
};
use crate::error::{AuthError, AuthResult};

/// Subject line of the confirmation mail
pub const CONFIRMATION_SUBJECT: &str = "Confirmation code";

/// Request code input (fields are optional so absence is reported per field)
#[derive(Debug, Clone, Default)]
pub struct RequestCodeInput {
    pub username: Option<String>,
    pub email: Option<String>,
}

/// Echo of the submitted identity
#[derive(Debug, Clone)]
pub struct RequestCodeOutput {
    pub username: String,
    pub email: String,
}

/// Request code use case
pub struct RequestCodeUseCase<U, M>
where
    U: UserRepository,
    M: MailSender,
{
    user_repo: Arc<U>,
    mailer: Arc<M>,
    config: Arc<AuthConfig>,
}

impl<U, M> RequestCodeUseCase<U, M>
where
    U: UserRepository,
    M: MailSender,
{
    pub fn new(user_repo: Arc<U>, mailer: Arc<M>, config: Arc<AuthConfig>) -> Self {
        Self {
            user_repo,
            mailer,
            config,
        }
    }

    pub async fn execute(&self, input: RequestCodeInput) -> AuthResult<RequestCodeOutput> {
        let mut errors = FieldErrors::new();
        let username = match input.username {
            Some(raw) => errors.check("username", Username::new(raw)),
            None => {
                errors.required("username");
                None
            }
        };
        let email = match input.email {
            Some(raw) => errors.check("email", Email::new(raw)),
            None => {
                errors.required("email");
                None
            }
        };
        let (Some(username), Some(email)) = (username, email) else {
            return Err(errors.into());
        };

        // Friendly pre-checks; the upsert below is what enforces the rule.
        if self
            .user_repo
            .find_by_email(&email)
            .await?
            .is_some_and(|u| u.username != username)
        {
            return Err(AuthError::email_taken());
        }
        if self
            .user_repo
            .find_by_username(username.as_str())
            .await?
            .is_some_and(|u| u.email != email)
        {
            return Err(AuthError::username_taken());
        }

        let code = ConfirmationCode::generate();
        let digest = code.digest(&self.config.confirmation_secret, &username);

        let user = match self
            .user_repo
            .issue_code(&username, &email, digest, Utc::now())
            .await?
        {
            IssueOutcome::Issued(user) => user,
            IssueOutcome::UsernameTaken => return Err(AuthError::username_taken()),
            IssueOutcome::EmailTaken => return Err(AuthError::email_taken()),
        };

        self.mailer
            .send(MailMessage::new(
                &self.config.mail_from,
                email.as_str(),
                CONFIRMATION_SUBJECT,
                code.as_str(),
            ))
            .await?;

        tracing::info!(
            user_id = %user.id,
            username = %user.username,
            "Confirmation code issued"
        );

        Ok(RequestCodeOutput {
            username: username.into_inner(),
            email: email.into_db(),
        })
    }
}
