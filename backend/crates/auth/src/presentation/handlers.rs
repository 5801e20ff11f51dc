//! HTTP Handlers

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use kernel::pagination::{Page, PageQuery};
use platform::mail::Mailer;
use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::{RequestCodeUseCase, TokenIssuer, UsersUseCase, VerifyCodeUseCase};
use crate::domain::policy::Requester;
use crate::domain::repository::UserRepository;
use crate::error::AuthResult;
use crate::presentation::dto::{
    SignUpRequest, SignUpResponse, TokenRequest, TokenResponse, UserListQuery, UserRequest,
    UserResponse,
};

/// Shared state for auth handlers
#[derive(Clone)]
pub struct AuthAppState<R>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub mailer: Arc<Mailer>,
    pub tokens: Arc<TokenIssuer>,
    pub config: Arc<AuthConfig>,
}

impl<R> AuthAppState<R>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    pub fn new(repo: R, mailer: Mailer, config: AuthConfig) -> Self {
        Self {
            repo: Arc::new(repo),
            mailer: Arc::new(mailer),
            tokens: Arc::new(TokenIssuer::new(&config)),
            config: Arc::new(config),
        }
    }

    fn users(&self) -> UsersUseCase<R> {
        UsersUseCase::new(self.repo.clone(), self.config.clone())
    }
}

// ============================================================================
// Sign Up / Token
// ============================================================================

/// POST /api/v1/auth/signup
pub async fn sign_up<R>(
    State(state): State<AuthAppState<R>>,
    Json(req): Json<SignUpRequest>,
) -> AuthResult<Json<SignUpResponse>>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    let use_case =
        RequestCodeUseCase::new(state.repo.clone(), state.mailer.clone(), state.config.clone());

    let output = use_case.execute(req.into()).await?;

    Ok(Json(output.into()))
}

/// POST /api/v1/auth/token
pub async fn token<R>(
    State(state): State<AuthAppState<R>>,
    Json(req): Json<TokenRequest>,
) -> AuthResult<Json<TokenResponse>>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    let use_case =
        VerifyCodeUseCase::new(state.repo.clone(), state.tokens.clone(), state.config.clone());

    let output = use_case.execute(req.into()).await?;

    Ok(Json(TokenResponse {
        access: output.access,
    }))
}

// ============================================================================
// Users (admin)
// ============================================================================

/// GET /api/v1/users
pub async fn list_users<R>(
    State(state): State<AuthAppState<R>>,
    requester: Requester,
    Query(query): Query<UserListQuery>,
) -> AuthResult<Json<Page<UserResponse>>>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    let page = state
        .users()
        .list(
            &requester,
            query.search.as_deref(),
            PageQuery { page: query.page },
        )
        .await?;

    Ok(Json(page.map(UserResponse::from)))
}

/// POST /api/v1/users
pub async fn create_user<R>(
    State(state): State<AuthAppState<R>>,
    requester: Requester,
    Json(req): Json<UserRequest>,
) -> AuthResult<(StatusCode, Json<UserResponse>)>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    let user = state.users().create(&requester, req.into()).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// GET /api/v1/users/{username}
pub async fn get_user<R>(
    State(state): State<AuthAppState<R>>,
    requester: Requester,
    Path(username): Path<String>,
) -> AuthResult<Json<UserResponse>>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    let user = state.users().get(&requester, &username).await?;
    Ok(Json(user.into()))
}

/// PATCH /api/v1/users/{username}
pub async fn patch_user<R>(
    State(state): State<AuthAppState<R>>,
    requester: Requester,
    Path(username): Path<String>,
    Json(req): Json<UserRequest>,
) -> AuthResult<Json<UserResponse>>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    let user = state
        .users()
        .update(&requester, &username, req.into())
        .await?;
    Ok(Json(user.into()))
}

/// DELETE /api/v1/users/{username}
pub async fn delete_user<R>(
    State(state): State<AuthAppState<R>>,
    requester: Requester,
    Path(username): Path<String>,
) -> AuthResult<StatusCode>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    state.users().delete(&requester, &username).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Me
// ============================================================================

/// GET /api/v1/users/me
pub async fn me<R>(
    State(state): State<AuthAppState<R>>,
    requester: Requester,
) -> AuthResult<Json<UserResponse>>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    let user = state.users().me(&requester).await?;
    Ok(Json(user.into()))
}

/// PATCH /api/v1/users/me
pub async fn patch_me<R>(
    State(state): State<AuthAppState<R>>,
    requester: Requester,
    Json(req): Json<UserRequest>,
) -> AuthResult<Json<UserResponse>>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    let user = state.users().update_me(&requester, req.into()).await?;
    Ok(Json(user.into()))
}
