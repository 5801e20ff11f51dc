//! HTTP Handlers

use auth::domain::policy::Requester;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use kernel::id::Id;
use kernel::pagination::{Page, PageQuery};
use std::sync::Arc;

use crate::application::{
    CommentsUseCase, ReviewsConfig, ReviewsUseCase, TermsUseCase, TitlesUseCase, WriteMode,
};
use crate::domain::entities::TermKind;
use crate::domain::repository::ReviewsStore;
use crate::error::{ReviewsError, ReviewsResult};
use crate::presentation::dto::{
    CommentRequest, CommentResponse, ReviewRequest, ReviewResponse, TermListQuery, TermRequest,
    TermResponse, TitleListQuery, TitleRequest, TitleResponse,
};

/// Shared state for catalogue and review handlers
#[derive(Clone)]
pub struct ReviewsAppState<R>
where
    R: ReviewsStore,
{
    pub repo: Arc<R>,
    pub config: Arc<ReviewsConfig>,
}

impl<R> ReviewsAppState<R>
where
    R: ReviewsStore,
{
    pub fn new(repo: R, config: ReviewsConfig) -> Self {
        Self {
            repo: Arc::new(repo),
            config: Arc::new(config),
        }
    }

    fn terms(&self) -> TermsUseCase<R> {
        TermsUseCase::new(self.repo.clone(), self.config.clone())
    }

    fn titles(&self) -> TitlesUseCase<R> {
        TitlesUseCase::new(self.repo.clone(), self.config.clone())
    }

    fn reviews(&self) -> ReviewsUseCase<R> {
        ReviewsUseCase::new(self.repo.clone(), self.config.clone())
    }

    fn comments(&self) -> CommentsUseCase<R> {
        CommentsUseCase::new(self.repo.clone(), self.config.clone())
    }
}

/// Path segment as an id; anything non-numeric names nothing
fn parse_id<T>(raw: &str, resource: &'static str) -> ReviewsResult<Id<T>> {
    raw.parse::<i64>()
        .map(Id::new)
        .map_err(|_| ReviewsError::NotFound(resource))
}

// ============================================================================
// Categories / Genres
// ============================================================================

async fn list_terms<R>(
    state: ReviewsAppState<R>,
    requester: Requester,
    kind: TermKind,
    query: TermListQuery,
) -> ReviewsResult<Json<Page<TermResponse>>>
where
    R: ReviewsStore,
{
    let page = state
        .terms()
        .list(
            &requester,
            kind,
            query.search.as_deref(),
            PageQuery { page: query.page },
        )
        .await?;
    Ok(Json(page.map(TermResponse::from)))
}

async fn create_term<R>(
    state: ReviewsAppState<R>,
    requester: Requester,
    kind: TermKind,
    req: TermRequest,
) -> ReviewsResult<(StatusCode, Json<TermResponse>)>
where
    R: ReviewsStore,
{
    let term = state.terms().create(&requester, kind, req.into()).await?;
    Ok((StatusCode::CREATED, Json(term.into())))
}

async fn delete_term<R>(
    state: ReviewsAppState<R>,
    requester: Requester,
    kind: TermKind,
    slug: String,
) -> ReviewsResult<StatusCode>
where
    R: ReviewsStore,
{
    state.terms().delete(&requester, kind, &slug).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/categories
pub async fn list_categories<R>(
    State(state): State<ReviewsAppState<R>>,
    requester: Requester,
    Query(query): Query<TermListQuery>,
) -> ReviewsResult<Json<Page<TermResponse>>>
where
    R: ReviewsStore,
{
    list_terms(state, requester, TermKind::Category, query).await
}

/// POST /api/v1/categories
pub async fn create_category<R>(
    State(state): State<ReviewsAppState<R>>,
    requester: Requester,
    Json(req): Json<TermRequest>,
) -> ReviewsResult<(StatusCode, Json<TermResponse>)>
where
    R: ReviewsStore,
{
    create_term(state, requester, TermKind::Category, req).await
}

/// DELETE /api/v1/categories/{slug}
pub async fn delete_category<R>(
    State(state): State<ReviewsAppState<R>>,
    requester: Requester,
    Path(slug): Path<String>,
) -> ReviewsResult<StatusCode>
where
    R: ReviewsStore,
{
    delete_term(state, requester, TermKind::Category, slug).await
}

/// GET /api/v1/genres
pub async fn list_genres<R>(
    State(state): State<ReviewsAppState<R>>,
    requester: Requester,
    Query(query): Query<TermListQuery>,
) -> ReviewsResult<Json<Page<TermResponse>>>
where
    R: ReviewsStore,
{
    list_terms(state, requester, TermKind::Genre, query).await
}

/// POST /api/v1/genres
pub async fn create_genre<R>(
    State(state): State<ReviewsAppState<R>>,
    requester: Requester,
    Json(req): Json<TermRequest>,
) -> ReviewsResult<(StatusCode, Json<TermResponse>)>
where
    R: ReviewsStore,
{
    create_term(state, requester, TermKind::Genre, req).await
}

/// DELETE /api/v1/genres/{slug}
pub async fn delete_genre<R>(
    State(state): State<ReviewsAppState<R>>,
    requester: Requester,
    Path(slug): Path<String>,
) -> ReviewsResult<StatusCode>
where
    R: ReviewsStore,
{
    delete_term(state, requester, TermKind::Genre, slug).await
}

// ============================================================================
// Titles
// ============================================================================

/// GET /api/v1/titles
pub async fn list_titles<R>(
    State(state): State<ReviewsAppState<R>>,
    requester: Requester,
    Query(query): Query<TitleListQuery>,
) -> ReviewsResult<Json<Page<TitleResponse>>>
where
    R: ReviewsStore,
{
    let (filter, page) = query.into_parts();
    let page = state
        .titles()
        .list(&requester, filter, PageQuery { page })
        .await?;
    Ok(Json(page.map(TitleResponse::from)))
}

/// POST /api/v1/titles
pub async fn create_title<R>(
    State(state): State<ReviewsAppState<R>>,
    requester: Requester,
    Json(req): Json<TitleRequest>,
) -> ReviewsResult<(StatusCode, Json<TitleResponse>)>
where
    R: ReviewsStore,
{
    let title = state.titles().create(&requester, req.into()).await?;
    Ok((StatusCode::CREATED, Json(title.into())))
}

/// GET /api/v1/titles/{title_id}
pub async fn get_title<R>(
    State(state): State<ReviewsAppState<R>>,
    requester: Requester,
    Path(title_id): Path<String>,
) -> ReviewsResult<Json<TitleResponse>>
where
    R: ReviewsStore,
{
    let id = parse_id(&title_id, "Title")?;
    let title = state.titles().get(&requester, id).await?;
    Ok(Json(title.into()))
}

async fn update_title<R>(
    state: ReviewsAppState<R>,
    requester: Requester,
    title_id: String,
    req: TitleRequest,
    mode: WriteMode,
) -> ReviewsResult<Json<TitleResponse>>
where
    R: ReviewsStore,
{
    let id = parse_id(&title_id, "Title")?;
    let title = state
        .titles()
        .update(&requester, id, req.into(), mode)
        .await?;
    Ok(Json(title.into()))
}

/// PUT /api/v1/titles/{title_id}
pub async fn put_title<R>(
    State(state): State<ReviewsAppState<R>>,
    requester: Requester,
    Path(title_id): Path<String>,
    Json(req): Json<TitleRequest>,
) -> ReviewsResult<Json<TitleResponse>>
where
    R: ReviewsStore,
{
    update_title(state, requester, title_id, req, WriteMode::Full).await
}

/// PATCH /api/v1/titles/{title_id}
pub async fn patch_title<R>(
    State(state): State<ReviewsAppState<R>>,
    requester: Requester,
    Path(title_id): Path<String>,
    Json(req): Json<TitleRequest>,
) -> ReviewsResult<Json<TitleResponse>>
where
    R: ReviewsStore,
{
    update_title(state, requester, title_id, req, WriteMode::Partial).await
}

/// DELETE /api/v1/titles/{title_id}
pub async fn delete_title<R>(
    State(state): State<ReviewsAppState<R>>,
    requester: Requester,
    Path(title_id): Path<String>,
) -> ReviewsResult<StatusCode>
where
    R: ReviewsStore,
{
    let id = parse_id(&title_id, "Title")?;
    state.titles().delete(&requester, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Reviews
// ============================================================================

/// GET /api/v1/titles/{title_id}/reviews
pub async fn list_reviews<R>(
    State(state): State<ReviewsAppState<R>>,
    requester: Requester,
    Path(title_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> ReviewsResult<Json<Page<ReviewResponse>>>
where
    R: ReviewsStore,
{
    let title_id = parse_id(&title_id, "Title")?;
    let page = state.reviews().list(&requester, title_id, query).await?;
    Ok(Json(page.map(ReviewResponse::from)))
}

/// POST /api/v1/titles/{title_id}/reviews
pub async fn create_review<R>(
    State(state): State<ReviewsAppState<R>>,
    requester: Requester,
    Path(title_id): Path<String>,
    Json(req): Json<ReviewRequest>,
) -> ReviewsResult<(StatusCode, Json<ReviewResponse>)>
where
    R: ReviewsStore,
{
    let title_id = parse_id(&title_id, "Title")?;
    let review = state
        .reviews()
        .create(&requester, title_id, req.into())
        .await?;
    Ok((StatusCode::CREATED, Json(review.into())))
}

/// GET /api/v1/titles/{title_id}/reviews/{review_id}
pub async fn get_review<R>(
    State(state): State<ReviewsAppState<R>>,
    requester: Requester,
    Path((title_id, review_id)): Path<(String, String)>,
) -> ReviewsResult<Json<ReviewResponse>>
where
    R: ReviewsStore,
{
    let title_id = parse_id(&title_id, "Title")?;
    let review_id = parse_id(&review_id, "Review")?;
    let review = state.reviews().get(&requester, title_id, review_id).await?;
    Ok(Json(review.into()))
}

async fn update_review<R>(
    state: ReviewsAppState<R>,
    requester: Requester,
    (title_id, review_id): (String, String),
    req: ReviewRequest,
    mode: WriteMode,
) -> ReviewsResult<Json<ReviewResponse>>
where
    R: ReviewsStore,
{
    let title_id = parse_id(&title_id, "Title")?;
    let review_id = parse_id(&review_id, "Review")?;
    let review = state
        .reviews()
        .update(&requester, title_id, review_id, req.into(), mode)
        .await?;
    Ok(Json(review.into()))
}

/// PUT /api/v1/titles/{title_id}/reviews/{review_id}
pub async fn put_review<R>(
    State(state): State<ReviewsAppState<R>>,
    requester: Requester,
    Path(ids): Path<(String, String)>,
    Json(req): Json<ReviewRequest>,
) -> ReviewsResult<Json<ReviewResponse>>
where
    R: ReviewsStore,
{
    update_review(state, requester, ids, req, WriteMode::Full).await
}

/// PATCH /api/v1/titles/{title_id}/reviews/{review_id}
pub async fn patch_review<R>(
    State(state): State<ReviewsAppState<R>>,
    requester: Requester,
    Path(ids): Path<(String, String)>,
    Json(req): Json<ReviewRequest>,
) -> ReviewsResult<Json<ReviewResponse>>
where
    R: ReviewsStore,
{
    update_review(state, requester, ids, req, WriteMode::Partial).await
}

/// DELETE /api/v1/titles/{title_id}/reviews/{review_id}
pub async fn delete_review<R>(
    State(state): State<ReviewsAppState<R>>,
    requester: Requester,
    Path((title_id, review_id)): Path<(String, String)>,
) -> ReviewsResult<StatusCode>
where
    R: ReviewsStore,
{
    let title_id = parse_id(&title_id, "Title")?;
    let review_id = parse_id(&review_id, "Review")?;
    state
        .reviews()
        .delete(&requester, title_id, review_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Comments
// ============================================================================

/// GET /api/v1/titles/{title_id}/reviews/{review_id}/comments
pub async fn list_comments<R>(
    State(state): State<ReviewsAppState<R>>,
    requester: Requester,
    Path((title_id, review_id)): Path<(String, String)>,
    Query(query): Query<PageQuery>,
) -> ReviewsResult<Json<Page<CommentResponse>>>
where
    R: ReviewsStore,
{
    let title_id = parse_id(&title_id, "Title")?;
    let review_id = parse_id(&review_id, "Review")?;
    let page = state
        .comments()
        .list(&requester, title_id, review_id, query)
        .await?;
    Ok(Json(page.map(CommentResponse::from)))
}

/// POST /api/v1/titles/{title_id}/reviews/{review_id}/comments
pub async fn create_comment<R>(
    State(state): State<ReviewsAppState<R>>,
    requester: Requester,
    Path((title_id, review_id)): Path<(String, String)>,
    Json(req): Json<CommentRequest>,
) -> ReviewsResult<(StatusCode, Json<CommentResponse>)>
where
    R: ReviewsStore,
{
    let title_id = parse_id(&title_id, "Title")?;
    let review_id = parse_id(&review_id, "Review")?;
    let comment = state
        .comments()
        .create(&requester, title_id, review_id, req.into())
        .await?;
    Ok((StatusCode::CREATED, Json(comment.into())))
}

/// GET /api/v1/titles/{title_id}/reviews/{review_id}/comments/{comment_id}
pub async fn get_comment<R>(
    State(state): State<ReviewsAppState<R>>,
    requester: Requester,
    Path((title_id, review_id, comment_id)): Path<(String, String, String)>,
) -> ReviewsResult<Json<CommentResponse>>
where
    R: ReviewsStore,
{
    let title_id = parse_id(&title_id, "Title")?;
    let review_id = parse_id(&review_id, "Review")?;
    let comment_id = parse_id(&comment_id, "Comment")?;
    let comment = state
        .comments()
        .get(&requester, title_id, review_id, comment_id)
        .await?;
    Ok(Json(comment.into()))
}

async fn update_comment<R>(
    state: ReviewsAppState<R>,
    requester: Requester,
    (title_id, review_id, comment_id): (String, String, String),
    req: CommentRequest,
    mode: WriteMode,
) -> ReviewsResult<Json<CommentResponse>>
where
    R: ReviewsStore,
{
    let title_id = parse_id(&title_id, "Title")?;
    let review_id = parse_id(&review_id, "Review")?;
    let comment_id = parse_id(&comment_id, "Comment")?;
    let comment = state
        .comments()
        .update(&requester, title_id, review_id, comment_id, req.into(), mode)
        .await?;
    Ok(Json(comment.into()))
}

/// PUT /api/v1/titles/{title_id}/reviews/{review_id}/comments/{comment_id}
pub async fn put_comment<R>(
    State(state): State<ReviewsAppState<R>>,
    requester: Requester,
    Path(ids): Path<(String, String, String)>,
    Json(req): Json<CommentRequest>,
) -> ReviewsResult<Json<CommentResponse>>
where
    R: ReviewsStore,
{
    update_comment(state, requester, ids, req, WriteMode::Full).await
}

/// PATCH /api/v1/titles/{title_id}/reviews/{review_id}/comments/{comment_id}
pub async fn patch_comment<R>(
    State(state): State<ReviewsAppState<R>>,
    requester: Requester,
    Path(ids): Path<(String, String, String)>,
    Json(req): Json<CommentRequest>,
) -> ReviewsResult<Json<CommentResponse>>
where
    R: ReviewsStore,
{
    update_comment(state, requester, ids, req, WriteMode::Partial).await
}

/// DELETE /api/v1/titles/{title_id}/reviews/{review_id}/comments/{comment_id}
pub async fn delete_comment<R>(
    State(state): State<ReviewsAppState<R>>,
    requester: Requester,
    Path((title_id, review_id, comment_id)): Path<(String, String, String)>,
) -> ReviewsResult<StatusCode>
where
    R: ReviewsStore,
{
    let title_id = parse_id(&title_id, "Title")?;
    let review_id = parse_id(&review_id, "Review")?;
    let comment_id = parse_id(&comment_id, "Comment")?;
    state
        .comments()
        .delete(&requester, title_id, review_id, comment_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
