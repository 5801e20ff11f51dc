//! Repository Traits
//!
//! Interfaces for data persistence. Implementation is in infrastructure layer.

use chrono::{DateTime, Utc};
use kernel::pagination::PageRequest;

use crate::domain::entity::user::{NewUser, User};
use crate::domain::value_object::{
    confirmation::CodeDigest, email::Email, user_id::UserId, username::Username,
};
use crate::error::AuthResult;

/// Result of the signup upsert
#[derive(Debug)]
pub enum IssueOutcome {
    /// User found or created, new code stored
    Issued(User),
    /// The username belongs to an account with another email
    UsernameTaken,
    /// The email belongs to an account with another username
    EmailTaken,
}

/// User repository trait
#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// Find user by ID
    async fn find_by_id(&self, id: UserId) -> AuthResult<Option<User>>;

    /// Find user by username (exact, case-sensitive)
    async fn find_by_username(&self, username: &str) -> AuthResult<Option<User>>;

    /// Find user by email
    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>>;

    /// Get-or-create the `(username, email)` account and store an issued
    /// code digest, atomically
    async fn issue_code(
        &self,
        username: &Username,
        email: &Email,
        digest: CodeDigest,
        issued_at: DateTime<Utc>,
    ) -> AuthResult<IssueOutcome>;

    /// Compare-and-set `Issued(expected)` to `Consumed`, recording the login
    ///
    /// Returns false when the stored state no longer matches.
    async fn consume_code(
        &self,
        id: UserId,
        expected: CodeDigest,
        at: DateTime<Utc>,
    ) -> AuthResult<bool>;

    /// One page of users ordered by id, optionally filtered by username
    /// substring, with the total match count
    async fn list(&self, search: Option<&str>, page: PageRequest) -> AuthResult<(Vec<User>, u64)>;

    /// Create a user
    async fn create(&self, user: &NewUser) -> AuthResult<User>;

    /// Persist username, email, role and profile
    async fn update(&self, user: &User) -> AuthResult<User>;

    /// Delete a user; false if it did not exist
    async fn delete(&self, id: UserId) -> AuthResult<bool>;
}
