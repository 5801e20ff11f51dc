//! Authorization Policy
//!
//! Permissions are small stateless checks. An endpoint picks the ones it
//! needs and composes them into a [`Policy`]; every permission must pass.
//!
//! Checks run in two phases:
//! 1. [`Policy::check`] before anything is loaded (collection level)
//! 2. [`Policy::check_object`] once the target object is loaded
//!
//! A missing object is reported as 404 before phase 2 runs.

use http::Method;

use crate::domain::entity::user::User;
use crate::domain::value_object::user_id::UserId;

// ============================================================================
// Request context
// ============================================================================

/// Read for safe methods, Write for everything else
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

impl Access {
    pub fn from_method(method: &Method) -> Self {
        if *method == Method::GET || *method == Method::HEAD || *method == Method::OPTIONS {
            Access::Read
        } else {
            Access::Write
        }
    }

    #[inline]
    pub fn is_read(&self) -> bool {
        matches!(self, Access::Read)
    }
}

/// Who is making the request
#[derive(Debug, Clone, Default)]
pub enum Requester {
    #[default]
    Anonymous,
    User(User),
}

impl Requester {
    pub fn user(&self) -> Option<&User> {
        match self {
            Requester::Anonymous => None,
            Requester::User(user) => Some(user),
        }
    }

    pub fn id(&self) -> Option<UserId> {
        self.user().map(|u| u.id)
    }

    #[inline]
    pub fn is_authenticated(&self) -> bool {
        self.user().is_some()
    }

    /// Role admin (the `is_staff` flag does not count here)
    pub fn is_admin(&self) -> bool {
        self.user().is_some_and(User::is_admin)
    }
}

impl From<Option<User>> for Requester {
    fn from(user: Option<User>) -> Self {
        user.map_or(Requester::Anonymous, Requester::User)
    }
}

/// Something with an author
pub trait Owned {
    fn author_id(&self) -> UserId;
}

impl Owned for User {
    fn author_id(&self) -> UserId {
        self.id
    }
}

// ============================================================================
// Permissions
// ============================================================================

pub trait Permission: Sync {
    /// Collection-level check
    fn has_permission(&self, _requester: &Requester, _access: Access) -> bool {
        true
    }

    /// Object-level check, after the object is loaded
    fn has_object_permission(
        &self,
        _requester: &Requester,
        _access: Access,
        _object: &dyn Owned,
    ) -> bool {
        true
    }
}

/// Requester must be authenticated
pub struct IsAuthenticated;

impl Permission for IsAuthenticated {
    fn has_permission(&self, requester: &Requester, _access: Access) -> bool {
        requester.is_authenticated()
    }
}

/// Reads always; writes need authentication
pub struct IsAuthenticatedOrReadOnly;

impl Permission for IsAuthenticatedOrReadOnly {
    fn has_permission(&self, requester: &Requester, access: Access) -> bool {
        access.is_read() || requester.is_authenticated()
    }
}

/// Role admin or staff flag, at both levels
pub struct IsAdmin;

impl IsAdmin {
    fn allows(requester: &Requester) -> bool {
        requester.user().is_some_and(|u| u.is_admin() || u.is_staff)
    }
}

impl Permission for IsAdmin {
    fn has_permission(&self, requester: &Requester, _access: Access) -> bool {
        Self::allows(requester)
    }

    fn has_object_permission(
        &self,
        requester: &Requester,
        _access: Access,
        _object: &dyn Owned,
    ) -> bool {
        Self::allows(requester)
    }
}

/// Reads always; writes need role admin
pub struct IsAdminOrReadOnly;

impl Permission for IsAdminOrReadOnly {
    fn has_permission(&self, requester: &Requester, access: Access) -> bool {
        access.is_read() || requester.is_admin()
    }
}

/// Reads always; object writes need the author, a moderator or an admin
pub struct IsAuthorOrModeratorOrAdmin;

impl Permission for IsAuthorOrModeratorOrAdmin {
    fn has_object_permission(
        &self,
        requester: &Requester,
        access: Access,
        object: &dyn Owned,
    ) -> bool {
        if access.is_read() {
            return true;
        }
        requester.user().is_some_and(|u| {
            u.id == object.author_id() || u.is_moderator() || u.is_admin()
        })
    }
}

// ============================================================================
// Policy
// ============================================================================

/// Outcome of a failed check
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Denied {
    #[error("Authentication credentials were not provided.")]
    Unauthenticated,
    #[error("You do not have permission to perform this action.")]
    Forbidden,
}

impl Denied {
    fn for_requester(requester: &Requester) -> Self {
        if requester.is_authenticated() {
            Denied::Forbidden
        } else {
            Denied::Unauthenticated
        }
    }
}

/// Ordered set of permissions, all of which must pass
#[derive(Clone, Copy)]
pub struct Policy(&'static [&'static dyn Permission]);

impl Policy {
    pub const fn new(permissions: &'static [&'static dyn Permission]) -> Self {
        Self(permissions)
    }

    pub fn check(&self, requester: &Requester, access: Access) -> Result<(), Denied> {
        if self.0.iter().all(|p| p.has_permission(requester, access)) {
            Ok(())
        } else {
            Err(Denied::for_requester(requester))
        }
    }

    pub fn check_object(
        &self,
        requester: &Requester,
        access: Access,
        object: &dyn Owned,
    ) -> Result<(), Denied> {
        if self
            .0
            .iter()
            .all(|p| p.has_object_permission(requester, access, object))
        {
            Ok(())
        } else {
            Err(Denied::for_requester(requester))
        }
    }
}

/// Categories, genres, titles
pub const ADMIN_OR_READ_ONLY: Policy = Policy::new(&[&IsAdminOrReadOnly]);

/// Reviews, comments
pub const AUTHOR_OR_STAFF: Policy =
    Policy::new(&[&IsAuthenticatedOrReadOnly, &IsAuthorOrModeratorOrAdmin]);

/// User administration
pub const ADMIN_ONLY: Policy = Policy::new(&[&IsAuthenticated, &IsAdmin]);

/// `/users/me`
pub const AUTHENTICATED: Policy = Policy::new(&[&IsAuthenticated]);
