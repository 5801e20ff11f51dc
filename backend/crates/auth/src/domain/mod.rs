//! Domain Layer
//!
//! Contains entities, value objects, the authorization policy and
//! repository traits.

pub mod entity;
pub mod policy;
pub mod repository;
pub mod value_object;

// Re-exports
pub use entity::user::{NewUser, User, UserPatch};
pub use policy::{Access, Denied, Owned, Permission, Policy, Requester};
pub use repository::{IssueOutcome, UserRepository};
