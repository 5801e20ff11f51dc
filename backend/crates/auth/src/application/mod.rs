//! Application Layer
//!
//! Use cases and application services.

pub mod access_token;
pub mod config;
pub mod request_code;
pub mod users;
pub mod verify_code;

// Re-exports
pub use access_token::{AccessClaims, TokenIssuer};
pub use config::AuthConfig;
pub use request_code::{RequestCodeInput, RequestCodeOutput, RequestCodeUseCase};
pub use users::{UserInput, UsersUseCase};
pub use verify_code::{VerifyCodeInput, VerifyCodeOutput, VerifyCodeUseCase};
