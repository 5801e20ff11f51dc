//! Auth (Authentication) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Business logic, entities, permissions, repository traits
//! - `application/` - Use cases and application services
//! - `infra/` - Database implementations
//! - `presentation/` - HTTP handlers, DTOs, router, bearer middleware
//!
//! ## Features
//! - Passwordless signup: a one-time confirmation code is mailed to the user
//! - Code exchange for an HS256 access token (`Authorization: Bearer`)
//! - Roles (User, Moderator, Admin) and composable permission checks
//! - Admin user management and `/users/me` self-service
//!
//! ## Security Model
//! - Only an HMAC-SHA256 digest of the confirmation code is stored
//! - A code is consumed by compare-and-set, so it verifies at most once
//! - Every failed code exchange reports the same generic error
//! - The requester is reloaded on every request, so role changes apply at once

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

#[cfg(test)]
mod tests;

// Re-exports for convenience
pub use application::config::AuthConfig;
pub use domain::policy::{Access, Owned, Permission, Policy, Requester};
pub use error::{AuthError, AuthResult};
pub use infra::postgres::PgAuthRepository;
pub use presentation::middleware::{AuthLayerState, with_authentication};
pub use presentation::router::auth_router;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

// Convenience re-exports
pub mod config {
    pub use crate::application::config::*;
}

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}

pub mod handlers {
    pub use crate::presentation::handlers::*;
}

pub mod store {
    pub use crate::infra::postgres::PgAuthRepository as AuthStore;
}

pub mod router {
    pub use crate::presentation::router::*;
}

pub mod middleware {
    pub use crate::presentation::middleware::*;
}
