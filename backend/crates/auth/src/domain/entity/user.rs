//! User Entity
//!
//! Account record: identity, role, profile and confirmation state.

use chrono::{DateTime, Utc};

use crate::domain::value_object::{
    confirmation::Confirmation, email::Email, profile::Profile, user_id::UserId,
    user_role::UserRole, username::Username,
};

/// User entity
#[derive(Debug, Clone)]
pub struct User {
    /// Database-assigned key
    pub id: UserId,
    /// Public handle, unique
    pub username: Username,
    /// Unique
    pub email: Email,
    pub role: UserRole,
    /// Operator flag; accepted as admin by the `IsAdmin` permission only
    pub is_staff: bool,
    pub profile: Profile,
    pub confirmation: Confirmation,
    /// Last successful code exchange
    pub last_login: Option<DateTime<Utc>>,
    pub date_joined: DateTime<Utc>,
}

impl User {
    #[inline]
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    #[inline]
    pub fn is_moderator(&self) -> bool {
        self.role.is_moderator()
    }

    #[inline]
    pub fn is_user(&self) -> bool {
        self.role.is_user()
    }

    /// Apply a validated patch
    ///
    /// `role` is dropped unless `allow_role` is set.
    pub fn apply(&mut self, patch: UserPatch, allow_role: bool) {
        if let Some(username) = patch.username {
            self.username = username;
        }
        if let Some(email) = patch.email {
            self.email = email;
        }
        if let Some(role) = patch.role.filter(|_| allow_role) {
            self.role = role;
        }
        if let Some(first_name) = patch.first_name {
            self.profile.first_name = first_name;
        }
        if let Some(last_name) = patch.last_name {
            self.profile.last_name = last_name;
        }
        if let Some(bio) = patch.bio {
            self.profile.bio = bio;
        }
    }
}

/// Account to be created by an admin
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: Username,
    pub email: Email,
    pub role: UserRole,
    pub profile: Profile,
}

/// Validated partial update
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub username: Option<Username>,
    pub email: Option<Email>,
    pub role: Option<UserRole>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.role.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
            && self.bio.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: UserId::new(1),
            username: Username::new("bob").unwrap(),
            email: Email::new("bob@x.com").unwrap(),
            role: UserRole::User,
            is_staff: false,
            profile: Profile::default(),
            confirmation: Confirmation::NotIssued,
            last_login: None,
            date_joined: Utc::now(),
        }
    }

    #[test]
    fn test_role_predicates() {
        let mut u = user();
        assert!(u.is_user());
        u.role = UserRole::Moderator;
        assert!(u.is_moderator() && !u.is_admin());
    }

    #[test]
    fn test_apply_without_role_permission_keeps_role() {
        let mut u = user();
        u.apply(
            UserPatch {
                role: Some(UserRole::Admin),
                bio: Some("hi".into()),
                ..Default::default()
            },
            false,
        );
        assert_eq!(u.role, UserRole::User);
        assert_eq!(u.profile.bio, "hi");
    }

    #[test]
    fn test_apply_with_role_permission() {
        let mut u = user();
        u.apply(
            UserPatch {
                role: Some(UserRole::Moderator),
                ..Default::default()
            },
            true,
        );
        assert_eq!(u.role, UserRole::Moderator);
        assert!(UserPatch::default().is_empty());
    }
}
