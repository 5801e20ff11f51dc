//! Presentation Layer
//!
//! HTTP handlers, DTOs and router.

pub mod dto;
pub mod handlers;
pub mod router;

pub use handlers::ReviewsAppState;
pub use router::{reviews_router, reviews_router_generic};
