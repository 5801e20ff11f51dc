//! Reviews Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, validated values, rating service, repository traits
//! - `application/` - Use cases for terms, titles, reviews and comments
//! - `infra/` - Database implementations
//! - `presentation/` - HTTP handlers, DTOs, router
//!
//! ## Features
//! - Categories and genres addressed by slug
//! - Titles filtered by name, category, genre and year, with a mean rating
//! - One review per user and title, scored 1 to 10
//! - Comments on reviews
//!
//! Permissions come from the `auth` crate: the catalogue is admin-managed,
//! reviews and comments belong to their author and may also be changed by
//! moderators and admins.

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

#[cfg(test)]
mod tests;

// Re-exports for convenience
pub use application::config::ReviewsConfig;
pub use error::{ReviewsError, ReviewsResult};
pub use infra::postgres::PgReviewsRepository;
pub use presentation::router::reviews_router;

// Convenience re-exports
pub mod models {
    pub use crate::domain::entities::*;
    pub use crate::domain::value_objects::*;
    pub use crate::presentation::dto::*;
}

pub mod store {
    pub use crate::infra::postgres::PgReviewsRepository as ReviewsStore;
}
