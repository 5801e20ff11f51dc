//! Access Tokens
//!
//! HS256 JWTs handed out by `/auth/token` and presented as
//! `Authorization: Bearer <token>`.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::config::AuthConfig;
use crate::domain::entity::user::User;
use crate::domain::value_object::user_id::UserId;
use crate::error::{AuthError, AuthResult};

/// Value of the `token_type` claim
pub const ACCESS_TOKEN_TYPE: &str = "access";

/// JWT claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// User id
    pub sub: String,
    pub username: String,
    pub token_type: String,
    /// Unique token id
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

impl AccessClaims {
    pub fn user_id(&self) -> AuthResult<UserId> {
        self.sub
            .parse::<i64>()
            .map(UserId::new)
            .map_err(|_| AuthError::InvalidToken("subject is not a user id".to_string()))
    }
}

/// Signs and verifies access tokens
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: chrono::Duration,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(&config.jwt_secret),
            decoding_key: DecodingKey::from_secret(&config.jwt_secret),
            validation,
            ttl: config.access_token_ttl(),
        }
    }

    /// Sign a token for `user`, valid from `now`
    pub fn issue(&self, user: &User, now: DateTime<Utc>) -> AuthResult<String> {
        let claims = AccessClaims {
            sub: user.id.to_string(),
            username: user.username.to_string(),
            token_type: ACCESS_TOKEN_TYPE.to_string(),
            jti: Uuid::new_v4().simple().to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?)
    }

    /// Check signature, expiry and token type
    pub fn verify(&self, token: &str) -> AuthResult<AccessClaims> {
        let claims = decode::<AccessClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?
            .claims;

        if claims.token_type != ACCESS_TOKEN_TYPE {
            return Err(AuthError::InvalidToken(format!(
                "unexpected token type {}",
                claims.token_type
            )));
        }
        Ok(claims)
    }
}
