//! Auth Middleware
//!
//! Resolves the bearer token on every request into a [`Requester`] stored
//! in the request extensions. Handlers pick it up with the `Requester`
//! extractor.

use axum::Router;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::middleware::{self, Next};
use axum::response::Response;
use platform::bearer::extract_bearer;
use std::convert::Infallible;
use std::sync::Arc;

use crate::application::access_token::TokenIssuer;
use crate::application::config::AuthConfig;
use crate::domain::policy::Requester;
use crate::domain::repository::UserRepository;
use crate::error::AuthError;

/// Middleware state
#[derive(Clone)]
pub struct AuthLayerState<R>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub tokens: Arc<TokenIssuer>,
}

impl<R> AuthLayerState<R>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    pub fn new(repo: Arc<R>, config: &AuthConfig) -> Self {
        Self {
            repo,
            tokens: Arc::new(TokenIssuer::new(config)),
        }
    }
}

/// Attach the requester to the request
///
/// No `Authorization` header means anonymous. A header that is present
/// but malformed, a token that fails verification, or a token whose user
/// no longer exists is rejected with 401.
pub async fn authenticate<R>(
    State(state): State<AuthLayerState<R>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    let token = extract_bearer(req.headers())
        .map_err(|e| AuthError::InvalidToken(e.to_string()))?
        .map(str::to_owned);

    let requester = match token {
        None => Requester::Anonymous,
        Some(token) => {
            let claims = state.tokens.verify(&token)?;
            let user = state
                .repo
                .find_by_id(claims.user_id()?)
                .await?
                .ok_or_else(|| AuthError::InvalidToken("user no longer exists".to_string()))?;
            Requester::User(user)
        }
    };

    req.extensions_mut().insert(requester);
    Ok(next.run(req).await)
}

/// Wrap `router` with [`authenticate`]
pub fn with_authentication<R>(router: Router, state: AuthLayerState<R>) -> Router
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    router.layer(middleware::from_fn_with_state(state, authenticate::<R>))
}

impl<S> FromRequestParts<S> for Requester
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<Requester>()
            .cloned()
            .unwrap_or_default())
    }
}
