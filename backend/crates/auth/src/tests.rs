//! Router tests over the in-memory repository

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use chrono::Utc;
use kernel::error::field::REQUIRED;
use platform::mail::{Mailer, MemoryMailer};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

use crate::application::access_token::TokenIssuer;
use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::user_role::UserRole;
use crate::error::{EMAIL_TAKEN_MESSAGE, INVALID_CODE_MESSAGE, USERNAME_TAKEN_MESSAGE};
use crate::infra::memory::MemoryUserRepository;
use crate::presentation::middleware::{AuthLayerState, with_authentication};
use crate::presentation::router::auth_router_generic;
use crate::AuthConfig;

struct TestApp {
    router: Router,
    repo: MemoryUserRepository,
    mailer: MemoryMailer,
    tokens: TokenIssuer,
}

impl TestApp {
    fn new() -> Self {
        Self::with_mailer(MemoryMailer::new())
    }

    fn with_mailer(mailer: MemoryMailer) -> Self {
        let repo = MemoryUserRepository::new();
        let config = AuthConfig::with_random_secrets();

        let router = auth_router_generic(repo.clone(), Mailer::Memory(mailer.clone()), config.clone());
        let router = with_authentication(router, AuthLayerState::new(Arc::new(repo.clone()), &config));

        Self {
            router,
            repo,
            mailer,
            tokens: TokenIssuer::new(&config),
        }
    }

    async fn seed(&self, username: &str, role: UserRole) -> (User, String) {
        let user = self
            .repo
            .seed(username, &format!("{username}@x.com"), role, false)
            .await;
        let token = self.tokens.issue(&user, Utc::now()).unwrap();
        (user, token)
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(serde_json::to_vec(&json).unwrap())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn sign_up(&self, username: &str, email: &str) -> (StatusCode, Value) {
        self.send(
            Method::POST,
            "/auth/signup",
            None,
            Some(json!({"username": username, "email": email})),
        )
        .await
    }

    async fn exchange(&self, username: &str, code: &str) -> (StatusCode, Value) {
        self.send(
            Method::POST,
            "/auth/token",
            None,
            Some(json!({"username": username, "confirmation_code": code})),
        )
        .await
    }

    async fn mailed_code(&self, email: &str) -> String {
        self.mailer.last_to(email).await.unwrap().body
    }
}

// ============================================================================
// Sign Up / Token
// ============================================================================

#[tokio::test]
async fn test_code_yields_a_token_exactly_once() {
    let app = TestApp::new();

    let (status, body) = app.sign_up("bob", "bob@x.com").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"username": "bob", "email": "bob@x.com"}));
    let code = app.mailed_code("bob@x.com").await;

    let (status, body) = app.exchange("bob", "wrong-code").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"]["confirmation_code"], json!([INVALID_CODE_MESSAGE]));

    let (status, body) = app.exchange("bob", &code).await;
    assert_eq!(status, StatusCode::OK);
    let access = body["access"].as_str().unwrap().to_string();

    let (status, body) = app.exchange("bob", &code).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"]["confirmation_code"], json!([INVALID_CODE_MESSAGE]));

    // The issued token authenticates
    let (status, body) = app.send(Method::GET, "/users/me", Some(&access), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "bob");
    assert_eq!(body["role"], "user");
    assert!(app.repo.get("bob").await.unwrap().last_login.is_some());
}

#[tokio::test]
async fn test_new_code_replaces_the_previous_one() {
    let app = TestApp::new();

    app.sign_up("bob", "bob@x.com").await;
    let first = app.mailed_code("bob@x.com").await;
    let (status, _) = app.sign_up("bob", "bob@x.com").await;
    assert_eq!(status, StatusCode::OK);
    let second = app.mailed_code("bob@x.com").await;
    assert_ne!(first, second);

    let (status, _) = app.exchange("bob", &first).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = app.exchange("bob", &second).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_fullwidth_username_signs_up_and_exchanges() {
    let app = TestApp::new();

    let (status, body) = app.sign_up("ｂｏｂ", "bob@x.com").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "bob");
    let code = app.mailed_code("bob@x.com").await;

    let (status, body) = app.exchange("ｂｏｂ", &code).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["access"].is_string());
}

#[tokio::test]
async fn test_sign_up_surfaces_mail_failure() {
    let app = TestApp::with_mailer(MemoryMailer::unreachable());

    let (status, body) = app.sign_up("bob", "bob@x.com").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["detail"], "Could not send the confirmation code");
    assert!(app.mailer.outbox().await.is_empty());
}

#[tokio::test]
async fn test_sign_up_rejects_reserved_username() {
    let app = TestApp::new();

    for name in ["me", "Me", "ME"] {
        let (status, body) = app.sign_up(name, "me@x.com").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["errors"]["username"].is_array());
    }
    assert!(app.mailer.outbox().await.is_empty());
}

#[tokio::test]
async fn test_sign_up_requires_both_fields() {
    let app = TestApp::new();

    let (status, body) = app
        .send(Method::POST, "/auth/signup", None, Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"]["username"], json!([REQUIRED]));
    assert_eq!(body["errors"]["email"], json!([REQUIRED]));
}

#[tokio::test]
async fn test_sign_up_conflicts_name_the_field() {
    let app = TestApp::new();
    app.seed("alice", UserRole::User).await;

    let (status, body) = app.sign_up("bob", "alice@x.com").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"]["email"], json!([EMAIL_TAKEN_MESSAGE]));

    let (status, body) = app.sign_up("alice", "other@x.com").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"]["username"], json!([USERNAME_TAKEN_MESSAGE]));

    // Same identity is fine and just gets a code
    let (status, _) = app.sign_up("alice", "alice@x.com").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_token_for_unknown_user_is_not_found() {
    let app = TestApp::new();

    let (status, _) = app.exchange("ghost", "whatever").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_token_requires_fields() {
    let app = TestApp::new();

    let (status, body) = app
        .send(
            Method::POST,
            "/auth/token",
            None,
            Some(json!({"username": "bob", "confirmation_code": "  "})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"]["confirmation_code"], json!([REQUIRED]));
}

// ============================================================================
// Bearer authentication
// ============================================================================

#[tokio::test]
async fn test_bad_tokens_are_unauthorized() {
    let app = TestApp::new();

    let (status, _) = app
        .send(Method::GET, "/users/me", Some("not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Signed by someone else
    let other = TokenIssuer::new(&AuthConfig::with_random_secrets());
    let (user, _) = app.seed("bob", UserRole::User).await;
    let forged = other.issue(&user, Utc::now()).unwrap();
    let (status, _) = app.send(Method::GET, "/users/me", Some(&forged), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_of_deleted_user_is_unauthorized() {
    let app = TestApp::new();
    let (user, token) = app.seed("bob", UserRole::User).await;
    assert!(app.repo.delete(user.id).await.unwrap());

    let (status, _) = app.send(Method::GET, "/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_anonymous_requests_reach_public_endpoints() {
    let app = TestApp::new();

    let (status, _) = app.send(Method::GET, "/users/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Signup is open to anonymous callers
    let (status, _) = app.sign_up("bob", "bob@x.com").await;
    assert_eq!(status, StatusCode::OK);
}

// ============================================================================
// Users
// ============================================================================

#[tokio::test]
async fn test_users_are_admin_only() {
    let app = TestApp::new();
    let (_, user_token) = app.seed("bob", UserRole::User).await;
    let (_, moderator_token) = app.seed("mod", UserRole::Moderator).await;
    let (_, admin_token) = app.seed("root", UserRole::Admin).await;

    let (status, _) = app.send(Method::GET, "/users", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.send(Method::GET, "/users", Some(&user_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .send(Method::GET, "/users", Some(&moderator_token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.send(Method::GET, "/users", Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 3);
    assert_eq!(body["next"], Value::Null);
    assert_eq!(body["results"][0]["username"], "bob");
}

#[tokio::test]
async fn test_staff_flag_grants_user_administration() {
    let app = TestApp::new();
    let staff = app.repo.seed("ops", "ops@x.com", UserRole::User, true).await;
    let token = app.tokens.issue(&staff, Utc::now()).unwrap();

    let (status, _) = app.send(Method::GET, "/users", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_list_users_search_and_pages() {
    let app = TestApp::new();
    let (_, admin_token) = app.seed("root", UserRole::Admin).await;
    app.seed("Bobby", UserRole::User).await;
    app.seed("carol", UserRole::User).await;

    let (status, body) = app
        .send(Method::GET, "/users?search=bob", Some(&admin_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["username"], "Bobby");

    let (status, _) = app
        .send(Method::GET, "/users?page=2", Some(&admin_token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_creates_reads_and_deletes_users() {
    let app = TestApp::new();
    let (_, admin_token) = app.seed("root", UserRole::Admin).await;

    let (status, body) = app
        .send(
            Method::POST,
            "/users",
            Some(&admin_token),
            Some(json!({"username": "dave", "email": "dave@x.com", "role": "moderator", "bio": "hi"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["role"], "moderator");
    assert_eq!(body["bio"], "hi");
    assert_eq!(body["first_name"], "");

    let (status, body) = app
        .send(
            Method::POST,
            "/users",
            Some(&admin_token),
            Some(json!({"username": "dave", "email": "root@x.com"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"]["username"], json!([USERNAME_TAKEN_MESSAGE]));
    assert_eq!(body["errors"]["email"], json!([EMAIL_TAKEN_MESSAGE]));

    let (status, body) = app
        .send(Method::GET, "/users/dave", Some(&admin_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "dave@x.com");

    let (status, body) = app
        .send(Method::DELETE, "/users/dave", Some(&admin_token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, _) = app
        .send(Method::GET, "/users/dave", Some(&admin_token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_user_reports_every_invalid_field() {
    let app = TestApp::new();
    let (_, admin_token) = app.seed("root", UserRole::Admin).await;

    let (status, body) = app
        .send(
            Method::POST,
            "/users",
            Some(&admin_token),
            Some(json!({"username": "bad name", "role": "root"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["username"].is_array());
    assert_eq!(body["errors"]["email"], json!([REQUIRED]));
    assert!(body["errors"]["role"].is_array());
}

#[tokio::test]
async fn test_admin_can_change_roles() {
    let app = TestApp::new();
    app.seed("bob", UserRole::User).await;
    let (_, admin_token) = app.seed("root", UserRole::Admin).await;

    let (status, body) = app
        .send(
            Method::PATCH,
            "/users/bob",
            Some(&admin_token),
            Some(json!({"role": "moderator"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "moderator");
    assert_eq!(app.repo.get("bob").await.unwrap().role, UserRole::Moderator);
}

// ============================================================================
// Me
// ============================================================================

#[tokio::test]
async fn test_user_cannot_change_own_role() {
    let app = TestApp::new();
    let (_, token) = app.seed("bob", UserRole::User).await;

    let (status, body) = app
        .send(
            Method::PATCH,
            "/users/me",
            Some(&token),
            Some(json!({"role": "admin", "bio": "reader"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "user");
    assert_eq!(body["bio"], "reader");
    assert_eq!(app.repo.get("bob").await.unwrap().role, UserRole::User);
}

#[tokio::test]
async fn test_admin_can_change_own_role() {
    let app = TestApp::new();
    let (_, token) = app.seed("root", UserRole::Admin).await;

    let (status, body) = app
        .send(
            Method::PATCH,
            "/users/me",
            Some(&token),
            Some(json!({"role": "moderator"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "moderator");
}

#[tokio::test]
async fn test_me_patch_rejects_taken_username() {
    let app = TestApp::new();
    app.seed("alice", UserRole::User).await;
    let (_, token) = app.seed("bob", UserRole::User).await;

    let (status, body) = app
        .send(
            Method::PATCH,
            "/users/me",
            Some(&token),
            Some(json!({"username": "alice"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"]["username"], json!([USERNAME_TAKEN_MESSAGE]));
}
