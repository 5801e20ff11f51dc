//! Reviews Router
//!
//! Catalogue and review routes, relative to the API root. Requests reach
//! these handlers with a `Requester` already resolved by the bearer layer.

use axum::{Router, routing::get};

use crate::application::config::ReviewsConfig;
use crate::domain::repository::ReviewsStore;
use crate::infra::postgres::PgReviewsRepository;
use crate::presentation::handlers::{self, ReviewsAppState};

const REVIEWS: &str = "/titles/{title_id}/reviews";

/// Create the Reviews router with PostgreSQL repository
pub fn reviews_router(repo: PgReviewsRepository, config: ReviewsConfig) -> Router {
    reviews_router_generic(repo, config)
}

/// Create a generic Reviews router for any repository implementation
pub fn reviews_router_generic<R>(repo: R, config: ReviewsConfig) -> Router
where
    R: ReviewsStore,
{
    let state = ReviewsAppState::new(repo, config);

    Router::new()
        // Categories / Genres
        .route(
            "/categories",
            get(handlers::list_categories::<R>).post(handlers::create_category::<R>),
        )
        .route(
            "/categories/{slug}",
            axum::routing::delete(handlers::delete_category::<R>),
        )
        .route(
            "/genres",
            get(handlers::list_genres::<R>).post(handlers::create_genre::<R>),
        )
        .route(
            "/genres/{slug}",
            axum::routing::delete(handlers::delete_genre::<R>),
        )
        // Titles
        .route(
            "/titles",
            get(handlers::list_titles::<R>).post(handlers::create_title::<R>),
        )
        .route(
            "/titles/{title_id}",
            get(handlers::get_title::<R>)
                .put(handlers::put_title::<R>)
                .patch(handlers::patch_title::<R>)
                .delete(handlers::delete_title::<R>),
        )
        // Reviews
        .route(
            REVIEWS,
            get(handlers::list_reviews::<R>).post(handlers::create_review::<R>),
        )
        .route(
            &format!("{REVIEWS}/{{review_id}}"),
            get(handlers::get_review::<R>)
                .put(handlers::put_review::<R>)
                .patch(handlers::patch_review::<R>)
                .delete(handlers::delete_review::<R>),
        )
        // Comments
        .route(
            &format!("{REVIEWS}/{{review_id}}/comments"),
            get(handlers::list_comments::<R>).post(handlers::create_comment::<R>),
        )
        .route(
            &format!("{REVIEWS}/{{review_id}}/comments/{{comment_id}}"),
            get(handlers::get_comment::<R>)
                .put(handlers::put_comment::<R>)
                .patch(handlers::patch_comment::<R>)
                .delete(handlers::delete_comment::<R>),
        )
        .with_state(state)
}
