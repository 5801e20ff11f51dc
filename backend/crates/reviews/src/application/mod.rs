//! Application Layer
//!
//! Use cases for the catalogue and its reviews.

pub mod comments;
pub mod config;
pub mod reviews;
pub mod terms;
pub mod titles;

// Re-exports
pub use comments::{CommentInput, CommentsUseCase};
pub use config::ReviewsConfig;
pub use reviews::{ReviewInput, ReviewsUseCase};
pub use terms::{TermInput, TermsUseCase};
pub use titles::{TitleInput, TitlesUseCase, WriteMode};
