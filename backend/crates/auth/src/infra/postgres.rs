//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use kernel::error::conversions::unique_violation;
use kernel::pagination::PageRequest;
use kernel::search::ilike_contains;
use sqlx::PgPool;

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

const USER_COLUMNS: &str = r#"
    id,
    username,
    email,
    role,
    is_staff,
    first_name,
    last_name,
    bio,
    confirmation_digest,
    confirmation_issued_at,
    confirmation_consumed_at,
    last_login,
    date_joined
"#;

/// Constraint names from the users table
const USERNAME_KEY: &str = "users_username_key";
const EMAIL_KEY: &str = "users_email_key";

/// PostgreSQL-backed auth repository
#[derive(Clone)]
pub struct PgAuthRepository {
    pool: PgPool,
}

impl PgAuthRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Translate unique violations on username/email into field errors
fn map_write_error(err: sqlx::Error) -> AuthError {
    let constraint = unique_violation(&err).map(str::to_owned);
    match constraint.as_deref() {
        Some(USERNAME_KEY) => AuthError::username_taken(),
        Some(EMAIL_KEY) => AuthError::email_taken(),
        _ => AuthError::Database(err),
    }
}

// ============================================================================
// User Repository Implementation
// ============================================================================

impl UserRepository for PgAuthRepository {
    async fn find_by_id(&self, id: UserId) -> AuthResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await?;

        row.map(UserRow::into_user).transpose()
    }

    async fn find_by_username(&self, username: &str) -> AuthResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        row.map(UserRow::into_user).transpose()
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(UserRow::into_user).transpose()
    }

    async fn issue_code(
        &self,
        username: &Username,
        email: &Email,
        digest: CodeDigest,
        issued_at: DateTime<Utc>,
    ) -> AuthResult<IssueOutcome> {
        // Conflict on username with a different email updates nothing and
        // returns no row; a new username with a taken email violates
        // users_email_key.
        let sql = format!(
            r#"
            INSERT INTO users (username, email, confirmation_digest, confirmation_issued_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (username) DO UPDATE SET
                confirmation_digest = EXCLUDED.confirmation_digest,
                confirmation_issued_at = EXCLUDED.confirmation_issued_at,
                confirmation_consumed_at = NULL
            WHERE users.email = EXCLUDED.email
            RETURNING {USER_COLUMNS}
            "#
        );
        let result = sqlx::query_as::<_, UserRow>(&sql)
            .bind(username.as_str())
            .bind(email.as_str())
            .bind(digest.as_bytes().as_slice())
            .bind(issued_at)
            .fetch_optional(&self.pool)
            .await;

        match result {
            Ok(Some(row)) => Ok(IssueOutcome::Issued(row.into_user()?)),
            Ok(None) => Ok(IssueOutcome::UsernameTaken),
            Err(err) => match map_write_error(err) {
                AuthError::Validation(fields) if fields.contains("email") => {
                    Ok(IssueOutcome::EmailTaken)
                }
                other => Err(other),
            },
        }
    }

    async fn consume_code(
        &self,
        id: UserId,
        expected: CodeDigest,
        at: DateTime<Utc>,
    ) -> AuthResult<bool> {
        let updated = sqlx::query(
            r#"
            UPDATE users SET
                confirmation_digest = NULL,
                confirmation_issued_at = NULL,
                confirmation_consumed_at = $3,
                last_login = $3
            WHERE id = $1
              AND confirmation_digest = $2
              AND confirmation_consumed_at IS NULL
            "#,
        )
        .bind(id.get())
        .bind(expected.as_bytes().as_slice())
        .bind(at)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(updated == 1)
    }

    async fn list(&self, search: Option<&str>, page: PageRequest) -> AuthResult<(Vec<User>, u64)> {
        let pattern = search.map(ilike_contains);

        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users WHERE ($1::TEXT IS NULL OR username ILIKE $1)",
        )
        .bind(pattern.as_deref())
        .fetch_one(&self.pool)
        .await?;

        let sql = format!(
            r#"
            SELECT {USER_COLUMNS} FROM users
            WHERE ($1::TEXT IS NULL OR username ILIKE $1)
            ORDER BY id
            LIMIT $2 OFFSET $3
            "#
        );
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .bind(pattern.as_deref())
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        let users = rows
            .into_iter()
            .map(UserRow::into_user)
            .collect::<AuthResult<Vec<_>>>()?;
        Ok((users, count.max(0) as u64))
    }

    async fn create(&self, user: &NewUser) -> AuthResult<User> {
        let sql = format!(
            r#"
            INSERT INTO users (username, email, role, first_name, last_name, bio)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(user.username.as_str())
            .bind(user.email.as_str())
            .bind(user.role.code())
            .bind(&user.profile.first_name)
            .bind(&user.profile.last_name)
            .bind(&user.profile.bio)
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)?;

        row.into_user()
    }

    async fn update(&self, user: &User) -> AuthResult<User> {
        let sql = format!(
            r#"
            UPDATE users SET
                username = $2,
                email = $3,
                role = $4,
                first_name = $5,
                last_name = $6,
                bio = $7
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(user.id.get())
            .bind(user.username.as_str())
            .bind(user.email.as_str())
            .bind(user.role.code())
            .bind(&user.profile.first_name)
            .bind(&user.profile.last_name)
            .bind(&user.profile.bio)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_write_error)?;

        row.ok_or(AuthError::UserNotFound)?.into_user()
    }

    async fn delete(&self, id: UserId) -> AuthResult<bool> {
        let deleted = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.get())
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted == 1)
    }
}

// ============================================================================
// Row Types
// ============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    email: String,
    role: String,
    is_staff: bool,
    first_name: String,
    last_name: String,
    bio: String,
    confirmation_digest: Option<Vec<u8>>,
    confirmation_issued_at: Option<DateTime<Utc>>,
    confirmation_consumed_at: Option<DateTime<Utc>>,
    last_login: Option<DateTime<Utc>>,
    date_joined: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> AuthResult<User> {
        let role = UserRole::from_code(&self.role)
            .ok_or_else(|| AuthError::Internal(format!("Invalid role: {}", self.role)))?;

        Ok(User {
            id: UserId::new(self.id),
            username: Username::from_db(self.username),
            email: Email::from_db(self.email),
            role,
            is_staff: self.is_staff,
            profile: Profile {
                first_name: self.first_name,
                last_name: self.last_name,
                bio: self.bio,
            },
            confirmation: Confirmation::from_columns(
                self.confirmation_digest.as_deref(),
                self.confirmation_issued_at,
                self.confirmation_consumed_at,
            ),
            last_login: self.last_login,
            date_joined: self.date_joined,
        })
    }
}
