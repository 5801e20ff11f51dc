//! In-Memory Repository
//!
//! Mirrors the PostgreSQL adapter's semantics (unique username/email,
//! atomic upsert, compare-and-set consumption) for router tests.

use chrono::{DateTime, Utc};
use kernel::pagination::PageRequest;
use kernel::search::icontains;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::entity::user::{NewUser, User};
use crate::domain::repository::{IssueOutcome, UserRepository};
use crate::domain::value_object::{
    confirmation::{CodeDigest, Confirmation},
    email::Email,
    profile::Profile,
    user_id::UserId,
    user_role::UserRole,
    username::Username,
};
use crate::error::{AuthError, AuthResult};

#[derive(Default)]
struct State {
    users: Vec<User>,
    next_id: i64,
}

impl State {
    fn insert(
        &mut self,
        username: Username,
        email: Email,
        role: UserRole,
        profile: Profile,
    ) -> &mut User {
        self.next_id += 1;
        self.users.push(User {
            id: UserId::new(self.next_id),
            username,
            email,
            role,
            is_staff: false,
            profile,
            confirmation: Confirmation::NotIssued,
            last_login: None,
            date_joined: Utc::now(),
        });
        let last = self.users.len() - 1;
        &mut self.users[last]
    }

    fn conflict(&self, username: &Username, email: &Email, except: Option<UserId>) -> Option<AuthError> {
        let others = || self.users.iter().filter(move |u| Some(u.id) != except);
        if others().any(|u| u.username == *username) {
            return Some(AuthError::username_taken());
        }
        if others().any(|u| u.email == *email) {
            return Some(AuthError::email_taken());
        }
        None
    }
}

/// Shared in-memory user store
#[derive(Clone, Default)]
pub struct MemoryUserRepository {
    state: Arc<Mutex<State>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a user directly
    pub async fn seed(&self, username: &str, email: &str, role: UserRole, is_staff: bool) -> User {
        let mut state = self.state.lock().await;
        let user = state.insert(
            Username::from_db(username),
            Email::from_db(email),
            role,
            Profile::default(),
        );
        user.is_staff = is_staff;
        user.clone()
    }

    /// Snapshot of a stored user
    pub async fn get(&self, username: &str) -> Option<User> {
        let state = self.state.lock().await;
        state.users.iter().find(|u| u.username == *username).cloned()
    }
}

impl UserRepository for MemoryUserRepository {
    async fn find_by_id(&self, id: UserId) -> AuthResult<Option<User>> {
        let state = self.state.lock().await;
        Ok(state.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> AuthResult<Option<User>> {
        let state = self.state.lock().await;
        Ok(state.users.iter().find(|u| u.username == *username).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        let state = self.state.lock().await;
        Ok(state.users.iter().find(|u| u.email == *email).cloned())
    }

    async fn issue_code(
        &self,
        username: &Username,
        email: &Email,
        digest: CodeDigest,
        issued_at: DateTime<Utc>,
    ) -> AuthResult<IssueOutcome> {
        let mut state = self.state.lock().await;

        if let Some(user) = state.users.iter_mut().find(|u| u.username == *username) {
            if user.email != *email {
                return Ok(IssueOutcome::UsernameTaken);
            }
            user.confirmation = Confirmation::issue(digest, issued_at);
            return Ok(IssueOutcome::Issued(user.clone()));
        }
        if state.users.iter().any(|u| u.email == *email) {
            return Ok(IssueOutcome::EmailTaken);
        }

        let user = state.insert(username.clone(), email.clone(), UserRole::User, Profile::default());
        user.confirmation = Confirmation::issue(digest, issued_at);
        Ok(IssueOutcome::Issued(user.clone()))
    }

    async fn consume_code(
        &self,
        id: UserId,
        expected: CodeDigest,
        at: DateTime<Utc>,
    ) -> AuthResult<bool> {
        let mut state = self.state.lock().await;
        let Some(user) = state.users.iter_mut().find(|u| u.id == id) else {
            return Ok(false);
        };
        if !user.confirmation.consume(&expected, at) {
            return Ok(false);
        }
        user.last_login = Some(at);
        Ok(true)
    }

    async fn list(&self, search: Option<&str>, page: PageRequest) -> AuthResult<(Vec<User>, u64)> {
        let state = self.state.lock().await;
        let matching: Vec<User> = state
            .users
            .iter()
            .filter(|u| search.is_none_or(|s| icontains(u.username.as_str(), s)))
            .cloned()
            .collect();
        Ok((page.slice(&matching), matching.len() as u64))
    }

    async fn create(&self, user: &NewUser) -> AuthResult<User> {
        let mut state = self.state.lock().await;
        if let Some(err) = state.conflict(&user.username, &user.email, None) {
            return Err(err);
        }
        let created = state.insert(
            user.username.clone(),
            user.email.clone(),
            user.role,
            user.profile.clone(),
        );
        Ok(created.clone())
    }

    async fn update(&self, user: &User) -> AuthResult<User> {
        let mut state = self.state.lock().await;
        if let Some(err) = state.conflict(&user.username, &user.email, Some(user.id)) {
            return Err(err);
        }
        let stored = state
            .users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or(AuthError::UserNotFound)?;
        stored.username = user.username.clone();
        stored.email = user.email.clone();
        stored.role = user.role;
        stored.profile = user.profile.clone();
        Ok(stored.clone())
    }

    async fn delete(&self, id: UserId) -> AuthResult<bool> {
        let mut state = self.state.lock().await;
        let before = state.users.len();
        state.users.retain(|u| u.id != id);
        Ok(state.users.len() < before)
    }
}
