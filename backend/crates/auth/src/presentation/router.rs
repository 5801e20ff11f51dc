//! Auth Router
//!
//! Routes are relative to the API root. The bearer layer is applied once
//! around the assembled API (see [`with_authentication`]).
//!
//! [`with_authentication`]: crate::presentation::middleware::with_authentication

use axum::{
    Router,
    routing::{get, post},
};
use platform::mail::Mailer;

use crate::application::config::AuthConfig;
use crate::domain::repository::UserRepository;
use crate::infra::postgres::PgAuthRepository;
use crate::presentation::handlers::{self, AuthAppState};

/// Create the Auth router with PostgreSQL repository
pub fn auth_router(repo: PgAuthRepository, mailer: Mailer, config: AuthConfig) -> Router {
    auth_router_generic(repo, mailer, config)
}

/// Create a generic Auth router for any repository implementation
pub fn auth_router_generic<R>(repo: R, mailer: Mailer, config: AuthConfig) -> Router
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    let state = AuthAppState::new(repo, mailer, config);

    Router::new()
        .route("/auth/signup", post(handlers::sign_up::<R>))
        .route("/auth/token", post(handlers::token::<R>))
        .route(
            "/users",
            get(handlers::list_users::<R>).post(handlers::create_user::<R>),
        )
        .route(
            "/users/me",
            get(handlers::me::<R>).patch(handlers::patch_me::<R>),
        )
        .route(
            "/users/{username}",
            get(handlers::get_user::<R>)
                .patch(handlers::patch_user::<R>)
                .delete(handlers::delete_user::<R>),
        )
        .with_state(state)
}
