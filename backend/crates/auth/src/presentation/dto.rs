//! API DTOs (Data Transfer Objects)

use serde::{Deserialize, Serialize};

use crate::application::{RequestCodeInput, RequestCodeOutput, UserInput, VerifyCodeInput};
use crate::domain::entity::user::User;
use crate::domain::value_object::user_role::UserRole;

// ============================================================================
// Sign Up
// ============================================================================

/// Confirmation code request
///
/// Fields are optional so a missing one is reported as a field error
/// instead of a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignUpRequest {
    pub username: Option<String>,
    pub email: Option<String>,
}

impl From<SignUpRequest> for RequestCodeInput {
    fn from(req: SignUpRequest) -> Self {
        Self {
            username: req.username,
            email: req.email,
        }
    }
}

/// Echo of the identity the code was sent for
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignUpResponse {
    pub username: String,
    pub email: String,
}

impl From<RequestCodeOutput> for SignUpResponse {
    fn from(output: RequestCodeOutput) -> Self {
        Self {
            username: output.username,
            email: output.email,
        }
    }
}

// ============================================================================
// Token
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenRequest {
    pub username: Option<String>,
    pub confirmation_code: Option<String>,
}

impl From<TokenRequest> for VerifyCodeInput {
    fn from(req: TokenRequest) -> Self {
        Self {
            username: req.username,
            confirmation_code: req.confirmation_code,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access: String,
}

// ============================================================================
// Users
// ============================================================================

/// Create or partial-update body for `/users` and `/users/me`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
}

impl From<UserRequest> for UserInput {
    fn from(req: UserRequest) -> Self {
        Self {
            username: req.username,
            email: req.email,
            role: req.role,
            first_name: req.first_name,
            last_name: req.last_name,
            bio: req.bio,
        }
    }
}

/// Public user representation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: String,
    pub role: UserRole,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            username: user.username.into_inner(),
            email: user.email.into_db(),
            first_name: user.profile.first_name,
            last_name: user.profile.last_name,
            bio: user.profile.bio,
            role: user.role,
        }
    }
}

/// `GET /users` query string
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserListQuery {
    pub page: Option<u32>,
    pub search: Option<String>,
}
