//! Repository Traits
//!
//! Interfaces for data persistence. Implementation is in infrastructure layer.

use auth::domain::value_object::user_id::UserId;
use kernel::pagination::PageRequest;

use crate::domain::entities::{
    Comment, NewTerm, Review, ReviewDraft, Term, TermKind, Title, TitleDraft, TitleFilter,
};
use crate::domain::value_objects::{CommentId, ReviewId, TitleId};
use crate::error::ReviewsResult;

/// Category and genre repository trait
#[trait_variant::make(TermRepository: Send)]
pub trait LocalTermRepository {
    /// Page of terms in creation order, optionally filtered by a name substring
    async fn list_terms(
        &self,
        kind: TermKind,
        search: Option<&str>,
        page: PageRequest,
    ) -> ReviewsResult<(Vec<Term>, u64)>;

    async fn find_term(&self, kind: TermKind, slug: &str) -> ReviewsResult<Option<Term>>;

    /// Insert a term; a taken slug fails with a `slug` field error
    async fn create_term(&self, kind: TermKind, term: &NewTerm) -> ReviewsResult<Term>;

    /// Returns false when no term has this slug
    async fn delete_term(&self, kind: TermKind, slug: &str) -> ReviewsResult<bool>;
}

/// Title repository trait
#[trait_variant::make(TitleRepository: Send)]
pub trait LocalTitleRepository {
    async fn list_titles(
        &self,
        filter: &TitleFilter,
        page: PageRequest,
    ) -> ReviewsResult<(Vec<Title>, u64)>;

    async fn find_title(&self, id: TitleId) -> ReviewsResult<Option<Title>>;

    /// Insert the title and its genre links together
    async fn create_title(&self, draft: &TitleDraft) -> ReviewsResult<Title>;

    /// Replace every field and the genre links together
    async fn update_title(&self, id: TitleId, draft: &TitleDraft) -> ReviewsResult<Option<Title>>;

    async fn delete_title(&self, id: TitleId) -> ReviewsResult<bool>;
}

/// Review repository trait
#[trait_variant::make(ReviewRepository: Send)]
pub trait LocalReviewRepository {
    /// Reviews of a title, oldest first
    async fn list_reviews(
        &self,
        title_id: TitleId,
        page: PageRequest,
    ) -> ReviewsResult<(Vec<Review>, u64)>;

    /// A review, only if it belongs to `title_id`
    async fn find_review(&self, title_id: TitleId, id: ReviewId) -> ReviewsResult<Option<Review>>;

    async fn has_reviewed(&self, title_id: TitleId, author_id: UserId) -> ReviewsResult<bool>;

    /// Insert a review; a second review by the same author fails with the
    /// duplicate-review error
    async fn create_review(
        &self,
        title_id: TitleId,
        author_id: UserId,
        draft: &ReviewDraft,
    ) -> ReviewsResult<Review>;

    /// Persist text and score (title, author and date never change)
    async fn update_review(&self, review: &Review) -> ReviewsResult<Review>;

    async fn delete_review(&self, id: ReviewId) -> ReviewsResult<bool>;
}

/// Comment repository trait
#[trait_variant::make(CommentRepository: Send)]
pub trait LocalCommentRepository {
    /// Comments of a review, oldest first
    async fn list_comments(
        &self,
        review_id: ReviewId,
        page: PageRequest,
    ) -> ReviewsResult<(Vec<Comment>, u64)>;

    /// A comment, only if it belongs to `review_id`
    async fn find_comment(
        &self,
        review_id: ReviewId,
        id: CommentId,
    ) -> ReviewsResult<Option<Comment>>;

    async fn create_comment(
        &self,
        review_id: ReviewId,
        author_id: UserId,
        text: &str,
    ) -> ReviewsResult<Comment>;

    async fn update_comment(&self, comment: &Comment) -> ReviewsResult<Comment>;

    async fn delete_comment(&self, id: CommentId) -> ReviewsResult<bool>;
}

/// Everything the HTTP layer needs from one backing store
pub trait ReviewsStore:
    TermRepository
    + TitleRepository
    + ReviewRepository
    + CommentRepository
    + Clone
    + Send
    + Sync
    + 'static
{
}

impl<T> ReviewsStore for T where
    T: TermRepository
        + TitleRepository
        + ReviewRepository
        + CommentRepository
        + Clone
        + Send
        + Sync
        + 'static
{
}
