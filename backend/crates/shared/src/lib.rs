//! Shared Kernel - Domain-crossing minimal core
//!
//! This crate contains the "smallest core" of domain vocabulary:
//! - Common error types and result aliases
//! - Field-level validation error maps
//! - Typed numeric IDs for persisted entities
//! - Page-number pagination shared by every list endpoint
//! - Substring search helpers for list filters
//!
//! **Design Principle**: Only include things that are "hard to change"
//! and have consistent meaning across all domains.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod field;
    pub mod kind;
}
pub mod id;
pub mod pagination;
pub mod search;
