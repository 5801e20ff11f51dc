//! Application Configuration
//!
//! Configuration for the Auth application layer.

use std::time::Duration;

use kernel::pagination::DEFAULT_PAGE_SIZE;
use platform::crypto::random_key;

/// Auth application configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HS256 signing key for access tokens (32 bytes)
    pub jwt_secret: [u8; 32],
    /// HMAC key for confirmation code digests (32 bytes)
    pub confirmation_secret: [u8; 32],
    /// Access token lifetime (1 day)
    pub access_token_ttl: Duration,
    /// Confirmation code lifetime (3 days)
    pub confirmation_code_ttl: Duration,
    /// Sender address of confirmation mails
    pub mail_from: String,
    /// Users per page on `/users`
    pub page_size: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: [0u8; 32],
            confirmation_secret: [0u8; 32],
            access_token_ttl: Duration::from_secs(24 * 3600), // 1 day
            confirmation_code_ttl: Duration::from_secs(3 * 24 * 3600), // 3 days
            mail_from: "noreply@yamdb.local".to_string(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl AuthConfig {
    /// Create config with random secrets
    pub fn with_random_secrets() -> Self {
        Self {
            jwt_secret: random_key(),
            confirmation_secret: random_key(),
            ..Default::default()
        }
    }

    /// Create config for development
    ///
    /// Secrets change on every restart, so issued tokens and codes do not
    /// survive one.
    pub fn development() -> Self {
        Self::with_random_secrets()
    }

    pub fn access_token_ttl(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.access_token_ttl).unwrap_or(chrono::Duration::days(1))
    }

    pub fn confirmation_code_ttl(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.confirmation_code_ttl).unwrap_or(chrono::Duration::days(3))
    }
}
