//! Value Object Module

pub mod confirmation;
pub mod email;
pub mod profile;
pub mod user_id;
pub mod user_role;
pub mod username;
