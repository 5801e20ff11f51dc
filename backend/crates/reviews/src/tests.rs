//! Router tests over the in-memory repositories

use auth::AuthConfig;
use auth::application::access_token::TokenIssuer;
use auth::domain::entity::user::User;
use auth::domain::value_object::user_role::UserRole;
use auth::infra::memory::MemoryUserRepository;
use auth::presentation::middleware::{AuthLayerState, with_authentication};
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use chrono::Utc;
use kernel::error::field::{NON_FIELD, REQUIRED};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

use crate::application::config::ReviewsConfig;
use crate::error::DUPLICATE_REVIEW_MESSAGE;
use crate::infra::memory::MemoryReviewsRepository;
use crate::presentation::router::reviews_router_generic;

struct TestApp {
    router: Router,
    users: MemoryUserRepository,
    tokens: TokenIssuer,
}

impl TestApp {
    fn new() -> Self {
        Self::with_page_size(10)
    }

    fn with_page_size(page_size: u32) -> Self {
        let users = MemoryUserRepository::new();
        let config = AuthConfig::with_random_secrets();

        let router = reviews_router_generic(
            MemoryReviewsRepository::new(users.clone()),
            ReviewsConfig::with_page_size(page_size),
        );
        let router = with_authentication(
            router,
            AuthLayerState::new(Arc::new(users.clone()), &config),
        );

        Self {
            router,
            users,
            tokens: TokenIssuer::new(&config),
        }
    }

    async fn seed(&self, username: &str, role: UserRole) -> (User, String) {
        let user = self
            .users
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

    /// Categories film and book, genres drama and comedy
    async fn catalogue(&self, admin: &str) {
        for (path, name, slug) in [
            ("/categories", "Film", "film"),
            ("/categories", "Book", "book"),
            ("/genres", "Drama", "drama"),
            ("/genres", "Comedy", "comedy"),
        ] {
            let (status, _) = self
                .send(
                    Method::POST,
                    path,
                    Some(admin),
                    Some(json!({"name": name, "slug": slug})),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED);
        }
    }

    async fn title(&self, admin: &str, body: Value) -> i64 {
        let (status, body) = self.send(Method::POST, "/titles", Some(admin), Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_i64().unwrap()
    }

    async fn review(&self, token: &str, title_id: i64, score: i64) -> (StatusCode, Value) {
        self.send(
            Method::POST,
            &format!("/titles/{title_id}/reviews"),
            Some(token),
            Some(json!({"text": "Worth it", "score": score})),
        )
        .await
    }
}

// ============================================================================
// Categories / Genres
// ============================================================================

#[tokio::test]
async fn test_terms_are_admin_managed_and_public() {
    let app = TestApp::new();
    let (_, admin) = app.seed("root", UserRole::Admin).await;
    let (_, user) = app.seed("bob", UserRole::User).await;
    let (_, moderator) = app.seed("mod", UserRole::Moderator).await;
    let body = json!({"name": "Film", "slug": "film"});

    let (status, _) = app.send(Method::POST, "/categories", None, Some(body.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    for token in [&user, &moderator] {
        let (status, _) = app
            .send(Method::POST, "/categories", Some(token), Some(body.clone()))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    let (status, created) = app
        .send(Method::POST, "/categories", Some(&admin), Some(body.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created, json!({"name": "Film", "slug": "film"}));

    let (status, page) = app.send(Method::GET, "/categories", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        page,
        json!({"count": 1, "next": null, "previous": null, "results": [{"name": "Film", "slug": "film"}]})
    );
}

#[tokio::test]
async fn test_term_slug_rules() {
    let app = TestApp::new();
    let (_, admin) = app.seed("root", UserRole::Admin).await;

    app.send(
        Method::POST,
        "/genres",
        Some(&admin),
        Some(json!({"name": "Drama", "slug": "drama"})),
    )
    .await;
    let (status, body) = app
        .send(
            Method::POST,
            "/genres",
            Some(&admin),
            Some(json!({"name": "Drama again", "slug": "drama"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["errors"]["slug"],
        json!(["genre with this slug already exists."])
    );

    let (status, body) = app
        .send(
            Method::POST,
            "/genres",
            Some(&admin),
            Some(json!({"slug": "no spaces"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"]["name"], json!([REQUIRED]));
    assert!(body["errors"]["slug"].is_array());
}

#[tokio::test]
async fn test_term_search_and_delete() {
    let app = TestApp::new();
    let (_, admin) = app.seed("root", UserRole::Admin).await;
    app.catalogue(&admin).await;

    let (_, page) = app.send(Method::GET, "/genres?search=COM", None, None).await;
    assert_eq!(page["count"], 1);
    assert_eq!(page["results"][0]["slug"], "comedy");

    let (status, _) = app.send(Method::DELETE, "/genres/comedy", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, body) = app
        .send(Method::DELETE, "/genres/comedy", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, _) = app
        .send(Method::DELETE, "/genres/comedy", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================================
// Titles
// ============================================================================

#[tokio::test]
async fn test_title_create_resolves_slugs() {
    let app = TestApp::new();
    let (_, admin) = app.seed("root", UserRole::Admin).await;
    app.catalogue(&admin).await;

    let (status, body) = app
        .send(
            Method::POST,
            "/titles",
            Some(&admin),
            Some(json!({
                "name": "Heat",
                "year": 1995,
                "category": "film",
                "genre": ["drama", "comedy"],
                "rating": 10
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "Heat");
    assert_eq!(body["rating"], Value::Null);
    assert_eq!(body["description"], Value::Null);
    assert_eq!(body["category"], json!({"name": "Film", "slug": "film"}));
    assert_eq!(
        body["genre"],
        json!([{"name": "Drama", "slug": "drama"}, {"name": "Comedy", "slug": "comedy"}])
    );

    let (status, body) = app
        .send(
            Method::POST,
            "/titles",
            Some(&admin),
            Some(json!({"name": "Heat", "year": 1995, "category": "opera", "genre": ["jazz"]})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["errors"]["category"],
        json!(["Object with slug=opera does not exist."])
    );
    assert_eq!(
        body["errors"]["genre"],
        json!(["Object with slug=jazz does not exist."])
    );
}

#[tokio::test]
async fn test_title_year_cannot_be_in_the_future() {
    let app = TestApp::new();
    let (_, admin) = app.seed("root", UserRole::Admin).await;
    let id = app.title(&admin, json!({"name": "Heat", "year": 1995})).await;

    let (status, body) = app
        .send(
            Method::PATCH,
            &format!("/titles/{id}"),
            Some(&admin),
            Some(json!({"year": 9999})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["year"].is_array());

    // Wider than the column still gets a field error, not a body rejection
    let (status, body) = app
        .send(
            Method::PATCH,
            &format!("/titles/{id}"),
            Some(&admin),
            Some(json!({"year": 99_999_999_999_i64})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["year"].is_array());

    let (_, body) = app.send(Method::GET, &format!("/titles/{id}"), None, None).await;
    assert_eq!(body["year"], 1995);
}

#[tokio::test]
async fn test_title_patch_keeps_and_put_resets() {
    let app = TestApp::new();
    let (_, admin) = app.seed("root", UserRole::Admin).await;
    app.catalogue(&admin).await;
    let id = app
        .title(
            &admin,
            json!({"name": "Heat", "year": 1995, "description": "LA crime", "category": "film", "genre": ["drama"]}),
        )
        .await;
    let uri = format!("/titles/{id}");

    let (status, body) = app
        .send(Method::PATCH, &uri, Some(&admin), Some(json!({"name": "Heat (1995)"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Heat (1995)");
    assert_eq!(body["description"], "LA crime");
    assert_eq!(body["category"]["slug"], "film");
    assert_eq!(body["genre"][0]["slug"], "drama");

    let (status, body) = app.send(Method::PUT, &uri, Some(&admin), Some(json!({"name": "Heat"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"]["year"], json!([REQUIRED]));

    let (status, body) = app
        .send(Method::PUT, &uri, Some(&admin), Some(json!({"name": "Heat", "year": 1995})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["description"], Value::Null);
    assert_eq!(body["category"], Value::Null);
    assert_eq!(body["genre"], json!([]));
}

#[tokio::test]
async fn test_title_filters() {
    let app = TestApp::new();
    let (_, admin) = app.seed("root", UserRole::Admin).await;
    app.catalogue(&admin).await;
    app.title(
        &admin,
        json!({"name": "Heat", "year": 1995, "category": "film", "genre": ["drama"]}),
    )
    .await;
    app.title(
        &admin,
        json!({"name": "Heathers", "year": 1988, "category": "film", "genre": ["comedy"]}),
    )
    .await;
    app.title(
        &admin,
        json!({"name": "Dune", "year": 1965, "category": "book", "genre": ["drama"]}),
    )
    .await;

    let names = |page: &Value| -> Vec<String> {
        page["results"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap().to_string())
            .collect()
    };

    let (_, page) = app.send(Method::GET, "/titles?name=heat", None, None).await;
    assert_eq!(names(&page), ["Heat", "Heathers"]);
    let (_, page) = app.send(Method::GET, "/titles?category=book", None, None).await;
    assert_eq!(names(&page), ["Dune"]);
    let (_, page) = app.send(Method::GET, "/titles?genre=drama", None, None).await;
    assert_eq!(names(&page), ["Heat", "Dune"]);
    let (_, page) = app
        .send(Method::GET, "/titles?genre=drama&year=1995", None, None)
        .await;
    assert_eq!(names(&page), ["Heat"]);
    let (_, page) = app.send(Method::GET, "/titles?genre=jazz", None, None).await;
    assert_eq!(page["count"], 0);
}

#[tokio::test]
async fn test_titles_paginate() {
    let app = TestApp::with_page_size(2);
    let (_, admin) = app.seed("root", UserRole::Admin).await;
    for year in [2001, 2002, 2003] {
        app.title(&admin, json!({"name": format!("T{year}"), "year": year}))
            .await;
    }

    let (_, page) = app.send(Method::GET, "/titles", None, None).await;
    assert_eq!(page["count"], 3);
    assert_eq!(page["next"], 2);
    assert_eq!(page["previous"], Value::Null);

    let (_, page) = app.send(Method::GET, "/titles?page=2", None, None).await;
    assert_eq!(page["results"][0]["name"], "T2003");
    assert_eq!(page["previous"], 1);
    assert_eq!(page["next"], Value::Null);

    let (status, _) = app.send(Method::GET, "/titles?page=3", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_or_malformed_title_is_404() {
    let app = TestApp::new();
    let (_, admin) = app.seed("root", UserRole::Admin).await;

    let (status, _) = app.send(Method::GET, "/titles/42", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.send(Method::GET, "/titles/abc", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.send(Method::DELETE, "/titles/42", Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================================
// Reviews
// ============================================================================

#[tokio::test]
async fn test_one_review_per_title_and_rating() {
    let app = TestApp::new();
    let (_, admin) = app.seed("root", UserRole::Admin).await;
    let (_, bob) = app.seed("bob", UserRole::User).await;
    let (_, eve) = app.seed("eve", UserRole::User).await;
    let id = app.title(&admin, json!({"name": "Heat", "year": 1995})).await;

    let (status, body) = app.review(&bob, id, 9).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["author"], "bob");
    assert_eq!(body["score"], 9);
    assert!(body["pub_date"].is_string());

    let (status, body) = app.review(&bob, id, 3).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][NON_FIELD], json!([DUPLICATE_REVIEW_MESSAGE]));

    let (status, _) = app.review(&eve, id, 4).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, title) = app.send(Method::GET, &format!("/titles/{id}"), None, None).await;
    assert_eq!(title["rating"], 6.5);

    let (_, page) = app
        .send(Method::GET, &format!("/titles/{id}/reviews"), None, None)
        .await;
    assert_eq!(page["count"], 2);
    assert_eq!(page["results"][0]["author"], "bob");
}

#[tokio::test]
async fn test_review_input_rules() {
    let app = TestApp::new();
    let (_, admin) = app.seed("root", UserRole::Admin).await;
    let (_, bob) = app.seed("bob", UserRole::User).await;
    let id = app.title(&admin, json!({"name": "Heat", "year": 1995})).await;

    let (status, _) = app.review(&bob, 999, 5).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send(
            Method::POST,
            &format!("/titles/{id}/reviews"),
            None,
            Some(json!({"text": "Anonymous", "score": 5})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app.review(&bob, id, 0).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["errors"]["score"],
        json!(["Ensure this value is greater than or equal to 1."])
    );

    let (status, body) = app.review(&bob, id, 99_999_999_999).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["errors"]["score"],
        json!(["Ensure this value is less than or equal to 10."])
    );

    let (status, body) = app
        .send(
            Method::POST,
            &format!("/titles/{id}/reviews"),
            Some(&bob),
            Some(json!({})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"]["text"], json!([REQUIRED]));
    assert_eq!(body["errors"]["score"], json!([REQUIRED]));
}

#[tokio::test]
async fn test_review_edit_permissions() {
    let app = TestApp::new();
    let (_, admin) = app.seed("root", UserRole::Admin).await;
    let (_, bob) = app.seed("bob", UserRole::User).await;
    let (_, eve) = app.seed("eve", UserRole::User).await;
    let (_, moderator) = app.seed("mod", UserRole::Moderator).await;
    let id = app.title(&admin, json!({"name": "Heat", "year": 1995})).await;
    let (_, review) = app.review(&bob, id, 9).await;
    let uri = format!("/titles/{id}/reviews/{}", review["id"]);

    let (status, _) = app
        .send(Method::PATCH, &uri, Some(&eve), Some(json!({"score": 1})))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.send(Method::PATCH, &uri, None, Some(json!({"score": 1}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .send(Method::PATCH, &uri, Some(&bob), Some(json!({"score": 7})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["score"], 7);
    assert_eq!(body["text"], "Worth it");
    assert_eq!(body["pub_date"], review["pub_date"]);

    let (status, body) = app
        .send(Method::PATCH, &uri, Some(&moderator), Some(json!({"text": "Edited"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["author"], "bob");

    let (status, _) = app.send(Method::DELETE, &uri, Some(&eve), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.send(Method::DELETE, &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.send(Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, title) = app.send(Method::GET, &format!("/titles/{id}"), None, None).await;
    assert_eq!(title["rating"], Value::Null);
}

#[tokio::test]
async fn test_review_under_wrong_title_is_404() {
    let app = TestApp::new();
    let (_, admin) = app.seed("root", UserRole::Admin).await;
    let (_, bob) = app.seed("bob", UserRole::User).await;
    let heat = app.title(&admin, json!({"name": "Heat", "year": 1995})).await;
    let dune = app.title(&admin, json!({"name": "Dune", "year": 1965})).await;
    let (_, review) = app.review(&bob, heat, 9).await;

    let (status, _) = app
        .send(
            Method::GET,
            &format!("/titles/{dune}/reviews/{}", review["id"]),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================================
// Comments
// ============================================================================

#[tokio::test]
async fn test_comment_lifecycle() {
    let app = TestApp::new();
    let (_, admin) = app.seed("root", UserRole::Admin).await;
    let (_, bob) = app.seed("bob", UserRole::User).await;
    let (_, eve) = app.seed("eve", UserRole::User).await;
    let id = app.title(&admin, json!({"name": "Heat", "year": 1995})).await;
    let (_, review) = app.review(&bob, id, 9).await;
    let comments = format!("/titles/{id}/reviews/{}/comments", review["id"]);

    let (status, _) = app
        .send(Method::POST, &comments, None, Some(json!({"text": "Hi"})))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .send(Method::POST, &comments, Some(&eve), Some(json!({"text": "Agreed"})))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["author"], "eve");
    let uri = format!("{comments}/{}", body["id"]);

    let (status, _) = app
        .send(Method::PUT, &uri, Some(&bob), Some(json!({"text": "Hijacked"})))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.send(Method::PATCH, &uri, Some(&eve), Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text"], "Agreed");

    let (status, body) = app.send(Method::PUT, &uri, Some(&eve), Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"]["text"], json!([REQUIRED]));

    let (_, page) = app.send(Method::GET, &comments, None, None).await;
    assert_eq!(page["count"], 1);

    let (status, _) = app.send(Method::DELETE, &uri, Some(&eve), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.send(Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_comments_scoped_by_title_and_review() {
    let app = TestApp::new();
    let (_, admin) = app.seed("root", UserRole::Admin).await;
    let (_, bob) = app.seed("bob", UserRole::User).await;
    let heat = app.title(&admin, json!({"name": "Heat", "year": 1995})).await;
    let dune = app.title(&admin, json!({"name": "Dune", "year": 1965})).await;
    let (_, review) = app.review(&bob, heat, 9).await;

    let (status, _) = app
        .send(
            Method::GET,
            &format!("/titles/{dune}/reviews/{}/comments", review["id"]),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send(
            Method::POST,
            &format!("/titles/{heat}/reviews/999/comments"),
            Some(&bob),
            Some(json!({"text": "Lost"})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
