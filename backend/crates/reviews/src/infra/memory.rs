//! In-Memory Repository
//!
//! Mirrors the PostgreSQL adapter for router tests: unique slugs, one
//! review per author and title, cascading deletes and a computed rating.
//! Author names come from the shared in-memory user store.

use auth::domain::repository::UserRepository;
use auth::domain::value_object::user_id::UserId;
use auth::infra::memory::MemoryUserRepository;
use chrono::Utc;
use kernel::pagination::PageRequest;
use kernel::search::icontains;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::entities::{
    Comment, NewTerm, Review, ReviewDraft, Term, TermKind, Title, TitleDraft, TitleFilter,
};
use crate::domain::repository::{
    CommentRepository, ReviewRepository, TermRepository, TitleRepository,
};
use crate::domain::services::mean_score;
use crate::domain::value_objects::{CommentId, ReviewId, TermId, TitleId};
use crate::error::{ReviewsError, ReviewsResult};

/// Title as stored: terms by id
#[derive(Clone)]
struct StoredTitle {
    id: TitleId,
    draft: TitleDraft,
}

#[derive(Default)]
struct State {
    categories: Vec<Term>,
    genres: Vec<Term>,
    titles: Vec<StoredTitle>,
    reviews: Vec<Review>,
    comments: Vec<Comment>,
    next_id: i64,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn terms(&self, kind: TermKind) -> &[Term] {
        match kind {
            TermKind::Category => &self.categories,
            TermKind::Genre => &self.genres,
        }
    }

    fn terms_mut(&mut self, kind: TermKind) -> &mut Vec<Term> {
        match kind {
            TermKind::Category => &mut self.categories,
            TermKind::Genre => &mut self.genres,
        }
    }

    /// Join the stored title with its terms and reviews
    fn hydrate(&self, stored: &StoredTitle) -> Title {
        let category = stored
            .draft
            .category
            .and_then(|id| self.categories.iter().find(|c| c.id == id).cloned());
        let mut genres: Vec<Term> = self
            .genres
            .iter()
            .filter(|g| stored.draft.genres.contains(&g.id))
            .cloned()
            .collect();
        genres.sort_by_key(|g| g.id);
        let rating = mean_score(
            self.reviews
                .iter()
                .filter(|r| r.title_id == stored.id)
                .map(|r| r.score),
        );

        Title {
            id: stored.id,
            name: stored.draft.name.clone(),
            year: stored.draft.year,
            description: stored.draft.description.clone(),
            category,
            genres,
            rating,
        }
    }

    fn drop_reviews(&mut self, doomed: impl Fn(&Review) -> bool) {
        let ids: Vec<ReviewId> = self
            .reviews
            .iter()
            .filter(|r| doomed(*r))
            .map(|r| r.id)
            .collect();
        self.reviews.retain(|r| !ids.contains(&r.id));
        self.comments.retain(|c| !ids.contains(&c.review_id));
    }
}

/// Shared in-memory catalogue and review store
#[derive(Clone)]
pub struct MemoryReviewsRepository {
    state: Arc<Mutex<State>>,
    users: MemoryUserRepository,
}

impl MemoryReviewsRepository {
    /// Store reading author names from `users`
    pub fn new(users: MemoryUserRepository) -> Self {
        Self {
            state: Arc::default(),
            users,
        }
    }

    async fn author_name(&self, id: UserId) -> ReviewsResult<String> {
        let user = self
            .users
            .find_by_id(id)
            .await
            .map_err(|err| ReviewsError::Internal(err.to_string()))?
            .ok_or_else(|| ReviewsError::Internal(format!("author {id} does not exist")))?;
        Ok(user.username.into_inner())
    }
}

impl TermRepository for MemoryReviewsRepository {
    async fn list_terms(
        &self,
        kind: TermKind,
        search: Option<&str>,
        page: PageRequest,
    ) -> ReviewsResult<(Vec<Term>, u64)> {
        let state = self.state.lock().await;
        let matching: Vec<Term> = state
            .terms(kind)
            .iter()
            .filter(|t| search.is_none_or(|s| icontains(&t.name, s)))
            .cloned()
            .collect();
        Ok((page.slice(&matching), matching.len() as u64))
    }

    async fn find_term(&self, kind: TermKind, slug: &str) -> ReviewsResult<Option<Term>> {
        let state = self.state.lock().await;
        Ok(state
            .terms(kind)
            .iter()
            .find(|t| t.slug.as_str() == slug)
            .cloned())
    }

    async fn create_term(&self, kind: TermKind, term: &NewTerm) -> ReviewsResult<Term> {
        let mut state = self.state.lock().await;
        if state.terms(kind).iter().any(|t| t.slug == term.slug) {
            return Err(ReviewsError::slug_taken(kind));
        }
        let term = Term {
            id: TermId::new(state.next_id()),
            name: term.name.clone(),
            slug: term.slug.clone(),
        };
        state.terms_mut(kind).push(term.clone());
        Ok(term)
    }

    async fn delete_term(&self, kind: TermKind, slug: &str) -> ReviewsResult<bool> {
        let mut state = self.state.lock().await;
        let Some(id) = state
            .terms(kind)
            .iter()
            .find(|t| t.slug.as_str() == slug)
            .map(|t| t.id)
        else {
            return Ok(false);
        };
        state.terms_mut(kind).retain(|t| t.id != id);

        // Titles outlive their terms
        for title in &mut state.titles {
            match kind {
                TermKind::Category if title.draft.category == Some(id) => {
                    title.draft.category = None;
                }
                TermKind::Genre => title.draft.genres.retain(|g| *g != id),
                TermKind::Category => {}
            }
        }
        Ok(true)
    }
}

impl TitleRepository for MemoryReviewsRepository {
    async fn list_titles(
        &self,
        filter: &TitleFilter,
        page: PageRequest,
    ) -> ReviewsResult<(Vec<Title>, u64)> {
        let state = self.state.lock().await;
        let matching: Vec<Title> = state
            .titles
            .iter()
            .map(|t| state.hydrate(t))
            .filter(|t| filter.matches(t))
            .collect();
        Ok((page.slice(&matching), matching.len() as u64))
    }

    async fn find_title(&self, id: TitleId) -> ReviewsResult<Option<Title>> {
        let state = self.state.lock().await;
        Ok(state
            .titles
            .iter()
            .find(|t| t.id == id)
            .map(|t| state.hydrate(t)))
    }

    async fn create_title(&self, draft: &TitleDraft) -> ReviewsResult<Title> {
        let mut state = self.state.lock().await;
        let stored = StoredTitle {
            id: TitleId::new(state.next_id()),
            draft: draft.clone(),
        };
        let title = state.hydrate(&stored);
        state.titles.push(stored);
        Ok(title)
    }

    async fn update_title(&self, id: TitleId, draft: &TitleDraft) -> ReviewsResult<Option<Title>> {
        let mut state = self.state.lock().await;
        let Some(index) = state.titles.iter().position(|t| t.id == id) else {
            return Ok(None);
        };
        state.titles[index].draft = draft.clone();
        Ok(Some(state.hydrate(&state.titles[index])))
    }

    async fn delete_title(&self, id: TitleId) -> ReviewsResult<bool> {
        let mut state = self.state.lock().await;
        let before = state.titles.len();
        state.titles.retain(|t| t.id != id);
        if state.titles.len() == before {
            return Ok(false);
        }
        state.drop_reviews(|r| r.title_id == id);
        Ok(true)
    }
}

impl ReviewRepository for MemoryReviewsRepository {
    async fn list_reviews(
        &self,
        title_id: TitleId,
        page: PageRequest,
    ) -> ReviewsResult<(Vec<Review>, u64)> {
        let state = self.state.lock().await;
        let matching: Vec<Review> = state
            .reviews
            .iter()
            .filter(|r| r.title_id == title_id)
            .cloned()
            .collect();
        Ok((page.slice(&matching), matching.len() as u64))
    }

    async fn find_review(&self, title_id: TitleId, id: ReviewId) -> ReviewsResult<Option<Review>> {
        let state = self.state.lock().await;
        Ok(state
            .reviews
            .iter()
            .find(|r| r.id == id && r.title_id == title_id)
            .cloned())
    }

    async fn has_reviewed(&self, title_id: TitleId, author_id: UserId) -> ReviewsResult<bool> {
        let state = self.state.lock().await;
        Ok(state
            .reviews
            .iter()
            .any(|r| r.title_id == title_id && r.author_id == author_id))
    }

    async fn create_review(
        &self,
        title_id: TitleId,
        author_id: UserId,
        draft: &ReviewDraft,
    ) -> ReviewsResult<Review> {
        let author = self.author_name(author_id).await?;

        let mut state = self.state.lock().await;
        if state
            .reviews
            .iter()
            .any(|r| r.title_id == title_id && r.author_id == author_id)
        {
            return Err(ReviewsError::duplicate_review());
        }
        let review = Review {
            id: ReviewId::new(state.next_id()),
            title_id,
            author_id,
            author,
            text: draft.text.clone(),
            score: draft.score,
            pub_date: Utc::now(),
        };
        state.reviews.push(review.clone());
        Ok(review)
    }

    async fn update_review(&self, review: &Review) -> ReviewsResult<Review> {
        let mut state = self.state.lock().await;
        let stored = state
            .reviews
            .iter_mut()
            .find(|r| r.id == review.id)
            .ok_or(ReviewsError::NotFound("Review"))?;
        stored.text = review.text.clone();
        stored.score = review.score;
        Ok(stored.clone())
    }

    async fn delete_review(&self, id: ReviewId) -> ReviewsResult<bool> {
        let mut state = self.state.lock().await;
        let before = state.reviews.len();
        state.drop_reviews(|r| r.id == id);
        Ok(state.reviews.len() < before)
    }
}

impl CommentRepository for MemoryReviewsRepository {
    async fn list_comments(
        &self,
        review_id: ReviewId,
        page: PageRequest,
    ) -> ReviewsResult<(Vec<Comment>, u64)> {
        let state = self.state.lock().await;
        let matching: Vec<Comment> = state
            .comments
            .iter()
            .filter(|c| c.review_id == review_id)
            .cloned()
            .collect();
        Ok((page.slice(&matching), matching.len() as u64))
    }

    async fn find_comment(
        &self,
        review_id: ReviewId,
        id: CommentId,
    ) -> ReviewsResult<Option<Comment>> {
        let state = self.state.lock().await;
        Ok(state
            .comments
            .iter()
            .find(|c| c.id == id && c.review_id == review_id)
            .cloned())
    }

    async fn create_comment(
        &self,
        review_id: ReviewId,
        author_id: UserId,
        text: &str,
    ) -> ReviewsResult<Comment> {
        let author = self.author_name(author_id).await?;

        let mut state = self.state.lock().await;
        let comment = Comment {
            id: CommentId::new(state.next_id()),
            review_id,
            author_id,
            author,
            text: text.to_string(),
            pub_date: Utc::now(),
        };
        state.comments.push(comment.clone());
        Ok(comment)
    }

    async fn update_comment(&self, comment: &Comment) -> ReviewsResult<Comment> {
        let mut state = self.state.lock().await;
        let stored = state
            .comments
            .iter_mut()
            .find(|c| c.id == comment.id)
            .ok_or(ReviewsError::NotFound("Comment"))?;
        stored.text = comment.text.clone();
        Ok(stored.clone())
    }

    async fn delete_comment(&self, id: CommentId) -> ReviewsResult<bool> {
        let mut state = self.state.lock().await;
        let before = state.comments.len();
        state.comments.retain(|c| c.id != id);
        Ok(state.comments.len() < before)
    }
}
