//! User Administration Use Cases
//!
//! `/users` is admin-only. `/users/me` lets any authenticated user read and
//! edit their own profile; only admins may change their own role there.

use kernel::error::field::FieldErrors;
use kernel::pagination::{Page, PageQuery, PageRequest};
use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::domain::entity::user::{NewUser, User, UserPatch};
use crate::domain::policy::{ADMIN_ONLY, AUTHENTICATED, Access, Requester};
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{
    email::Email, profile::person_name, profile::Profile, user_id::UserId, user_role::UserRole,
    username::Username,
};
use crate::error::{AuthError, AuthResult, EMAIL_TAKEN_MESSAGE, USERNAME_TAKEN_MESSAGE};

/// Raw user fields from a create or patch request
#[derive(Debug, Clone, Default)]
pub struct UserInput {
    pub username: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
}

impl UserInput {
    /// Validate every present field
    pub fn into_patch(self) -> Result<UserPatch, FieldErrors> {
        let mut errors = FieldErrors::new();
        let patch = UserPatch {
            username: self
                .username
                .and_then(|v| errors.check("username", Username::new(v))),
            email: self.email.and_then(|v| errors.check("email", Email::new(v))),
            role: self
                .role
                .and_then(|v| errors.check("role", v.parse::<UserRole>())),
            first_name: self
                .first_name
                .and_then(|v| errors.check("first_name", person_name(v))),
            last_name: self
                .last_name
                .and_then(|v| errors.check("last_name", person_name(v))),
            bio: self.bio,
        };
        errors.into_result().map(|()| patch)
    }

    /// Validate for creation: username and email are required
    pub fn into_new_user(self) -> Result<NewUser, FieldErrors> {
        let mut errors = FieldErrors::new();
        if self.username.is_none() {
            errors.required("username");
        }
        if self.email.is_none() {
            errors.required("email");
        }
        let patch = match self.into_patch() {
            Ok(patch) => Some(patch),
            Err(e) => {
                errors.merge(e);
                None
            }
        };
        errors.into_result()?;

        match patch {
            Some(UserPatch {
                username: Some(username),
                email: Some(email),
                role,
                first_name,
                last_name,
                bio,
            }) => Ok(NewUser {
                username,
                email,
                role: role.unwrap_or_default(),
                profile: Profile {
                    first_name: first_name.unwrap_or_default(),
                    last_name: last_name.unwrap_or_default(),
                    bio: bio.unwrap_or_default(),
                },
            }),
            _ => Err(FieldErrors::single(
                kernel::error::field::NON_FIELD,
                "Invalid input.",
            )),
        }
    }
}

/// User administration use cases
pub struct UsersUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
    config: Arc<AuthConfig>,
}

impl<U> UsersUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>, config: Arc<AuthConfig>) -> Self {
        Self { user_repo, config }
    }

    /// GET /users
    pub async fn list(
        &self,
        requester: &Requester,
        search: Option<&str>,
        query: PageQuery,
    ) -> AuthResult<Page<User>> {
        ADMIN_ONLY.check(requester, Access::Read)?;

        let request = PageRequest::from_query(query, self.config.page_size)?;
        let search = search.map(str::trim).filter(|s| !s.is_empty());
        let (users, count) = self.user_repo.list(search, request).await?;
        Ok(Page::new(users, count, request)?)
    }

    /// POST /users
    pub async fn create(&self, requester: &Requester, input: UserInput) -> AuthResult<User> {
        ADMIN_ONLY.check(requester, Access::Write)?;

        let new_user = input.into_new_user()?;
        self.ensure_unique(Some(&new_user.username), Some(&new_user.email), None)
            .await?;

        let user = self.user_repo.create(&new_user).await?;
        tracing::info!(
            user_id = %user.id,
            username = %user.username,
            role = %user.role,
            by = ?requester.id(),
            "User created"
        );
        Ok(user)
    }

    /// GET /users/{username}
    pub async fn get(&self, requester: &Requester, username: &str) -> AuthResult<User> {
        self.load(requester, username, Access::Read).await
    }

    /// PATCH /users/{username}
    pub async fn update(
        &self,
        requester: &Requester,
        username: &str,
        input: UserInput,
    ) -> AuthResult<User> {
        let mut user = self.load(requester, username, Access::Write).await?;
        let patch = input.into_patch()?;
        self.save(&mut user, patch, true).await
    }

    /// DELETE /users/{username}
    pub async fn delete(&self, requester: &Requester, username: &str) -> AuthResult<()> {
        let user = self.load(requester, username, Access::Write).await?;
        if !self.user_repo.delete(user.id).await? {
            return Err(AuthError::UserNotFound);
        }
        tracing::info!(user_id = %user.id, by = ?requester.id(), "User deleted");
        Ok(())
    }

    /// GET /users/me
    pub async fn me(&self, requester: &Requester) -> AuthResult<User> {
        AUTHENTICATED.check(requester, Access::Read)?;
        requester.user().cloned().ok_or(AuthError::Unauthenticated)
    }

    /// PATCH /users/me
    ///
    /// `role` is ignored unless the requester is an admin.
    pub async fn update_me(&self, requester: &Requester, mut input: UserInput) -> AuthResult<User> {
        AUTHENTICATED.check(requester, Access::Write)?;
        let mut user = requester.user().cloned().ok_or(AuthError::Unauthenticated)?;

        let allow_role = user.is_admin();
        if !allow_role {
            input.role = None;
        }
        let patch = input.into_patch()?;
        self.save(&mut user, patch, allow_role).await
    }

    async fn load(&self, requester: &Requester, username: &str, access: Access) -> AuthResult<User> {
        ADMIN_ONLY.check(requester, access)?;
        let user = self
            .user_repo
            .find_by_username(&Username::normalize(username))
            .await?
            .ok_or(AuthError::UserNotFound)?;
        ADMIN_ONLY.check_object(requester, access, &user)?;
        Ok(user)
    }

    async fn save(&self, user: &mut User, patch: UserPatch, allow_role: bool) -> AuthResult<User> {
        let changed_username = patch.username.as_ref().filter(|u| **u != user.username);
        let changed_email = patch.email.as_ref().filter(|e| **e != user.email);
        self.ensure_unique(changed_username, changed_email, Some(user.id))
            .await?;

        user.apply(patch, allow_role);
        let saved = self.user_repo.update(user).await?;
        tracing::info!(user_id = %saved.id, "User updated");
        Ok(saved)
    }

    /// Pre-check unique fields so both conflicts are reported at once
    async fn ensure_unique(
        &self,
        username: Option<&Username>,
        email: Option<&Email>,
        except: Option<UserId>,
    ) -> AuthResult<()> {
        let mut errors = FieldErrors::new();
        if let Some(username) = username {
            let existing = self.user_repo.find_by_username(username.as_str()).await?;
            if existing.is_some_and(|u| Some(u.id) != except) {
                errors.add("username", USERNAME_TAKEN_MESSAGE);
            }
        }
        if let Some(email) = email {
            let existing = self.user_repo.find_by_email(email).await?;
            if existing.is_some_and(|u| Some(u.id) != except) {
                errors.add("email", EMAIL_TAKEN_MESSAGE);
            }
        }
        Ok(errors.into_result()?)
    }
}
