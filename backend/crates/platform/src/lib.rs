//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (SHA-256, HMAC, Base64)
//! - Bearer token extraction
//! - Mail delivery (SMTP, console, in-memory)

pub mod bearer;
pub mod crypto;
pub mod mail;
