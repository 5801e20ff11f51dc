//! Review Use Cases
//!
//! Reviews are nested under a title. Anyone may read them; writing needs
//! a token, and changing an existing review needs its author, a moderator
//! or an admin.

use auth::domain::policy::{AUTHOR_OR_STAFF, Access, Requester};
use kernel::error::field::FieldErrors;
use kernel::pagination::{Page, PageQuery, PageRequest};
use std::sync::Arc;

use crate::application::config::ReviewsConfig;
use crate::application::titles::WriteMode;
use crate::domain::entities::{Review, ReviewDraft};
use crate::domain::repository::{ReviewRepository, TitleRepository};
use crate::domain::value_objects::{ReviewId, Score, TitleId, required_text};
use crate::error::{ReviewsError, ReviewsResult};

#[derive(Debug, Clone, Default)]
pub struct ReviewInput {
    pub text: Option<String>,
    pub score: Option<i64>,
}

impl ReviewInput {
    /// Validate on top of `base` (None for a full write)
    pub fn validate(self, base: Option<&Review>) -> Result<ReviewDraft, FieldErrors> {
        let mut errors = FieldErrors::new();
        let text = match (self.text, base) {
            (Some(raw), _) => errors.check("text", required_text(raw, None)),
            (None, Some(review)) => Some(review.text.clone()),
            (None, None) => {
                errors.required("text");
                None
            }
        };
        let score = match (self.score, base) {
            (Some(raw), _) => errors.check("score", Score::new(raw)),
            (None, Some(review)) => Some(review.score),
            (None, None) => {
                errors.required("score");
                None
            }
        };
        match (text, score) {
            (Some(text), Some(score)) => Ok(ReviewDraft { text, score }),
            _ => Err(errors),
        }
    }
}

/// Review use cases
pub struct ReviewsUseCase<R>
where
    R: TitleRepository + ReviewRepository,
{
    repo: Arc<R>,
    config: Arc<ReviewsConfig>,
}

impl<R> ReviewsUseCase<R>
where
    R: TitleRepository + ReviewRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<ReviewsConfig>) -> Self {
        Self { repo, config }
    }

    /// GET /titles/{title_id}/reviews
    pub async fn list(
        &self,
        requester: &Requester,
        title_id: TitleId,
        query: PageQuery,
    ) -> ReviewsResult<Page<Review>> {
        AUTHOR_OR_STAFF.check(requester, Access::Read)?;
        self.ensure_title(title_id).await?;

        let request = PageRequest::from_query(query, self.config.page_size)?;
        let (reviews, count) = self.repo.list_reviews(title_id, request).await?;
        Ok(Page::new(reviews, count, request)?)
    }

    /// GET /titles/{title_id}/reviews/{review_id}
    pub async fn get(
        &self,
        requester: &Requester,
        title_id: TitleId,
        id: ReviewId,
    ) -> ReviewsResult<Review> {
        self.load(requester, title_id, id, Access::Read).await
    }

    /// POST /titles/{title_id}/reviews
    ///
    /// One review per author and title. The pre-check gives the common case
    /// a clean error; the unique index settles races.
    pub async fn create(
        &self,
        requester: &Requester,
        title_id: TitleId,
        input: ReviewInput,
    ) -> ReviewsResult<Review> {
        AUTHOR_OR_STAFF.check(requester, Access::Write)?;
        let author = requester.id().ok_or(ReviewsError::Unauthenticated)?;
        self.ensure_title(title_id).await?;

        let draft = input.validate(None)?;
        if self.repo.has_reviewed(title_id, author).await? {
            return Err(ReviewsError::duplicate_review());
        }

        let review = self.repo.create_review(title_id, author, &draft).await?;
        tracing::info!(
            review_id = %review.id,
            title_id = %title_id,
            author_id = %author,
            score = review.score.get(),
            "Review created"
        );
        Ok(review)
    }

    /// PUT / PATCH /titles/{title_id}/reviews/{review_id}
    pub async fn update(
        &self,
        requester: &Requester,
        title_id: TitleId,
        id: ReviewId,
        input: ReviewInput,
        mode: WriteMode,
    ) -> ReviewsResult<Review> {
        let mut review = self.load(requester, title_id, id, Access::Write).await?;

        let base = (mode == WriteMode::Partial).then_some(&review);
        let draft = input.validate(base)?;
        review.text = draft.text;
        review.score = draft.score;

        let review = self.repo.update_review(&review).await?;
        tracing::info!(review_id = %review.id, by = ?requester.id(), "Review updated");
        Ok(review)
    }

    /// DELETE /titles/{title_id}/reviews/{review_id}
    pub async fn delete(
        &self,
        requester: &Requester,
        title_id: TitleId,
        id: ReviewId,
    ) -> ReviewsResult<()> {
        let review = self.load(requester, title_id, id, Access::Write).await?;
        if !self.repo.delete_review(review.id).await? {
            return Err(ReviewsError::NotFound("Review"));
        }
        tracing::info!(review_id = %review.id, by = ?requester.id(), "Review deleted");
        Ok(())
    }

    async fn ensure_title(&self, title_id: TitleId) -> ReviewsResult<()> {
        match self.repo.find_title(title_id).await? {
            Some(_) => Ok(()),
            None => Err(ReviewsError::NotFound("Title")),
        }
    }

    /// Collection check, then 404s, then the object check
    async fn load(
        &self,
        requester: &Requester,
        title_id: TitleId,
        id: ReviewId,
        access: Access,
    ) -> ReviewsResult<Review> {
        AUTHOR_OR_STAFF.check(requester, access)?;
        self.ensure_title(title_id).await?;
        let review = self
            .repo
            .find_review(title_id, id)
            .await?
            .ok_or(ReviewsError::NotFound("Review"))?;
        AUTHOR_OR_STAFF.check_object(requester, access, &review)?;
        Ok(review)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use auth::domain::value_object::user_id::UserId;
    use chrono::Utc;
    use kernel::error::field::REQUIRED;

    fn stored() -> Review {
        Review {
            id: ReviewId::new(1),
            title_id: TitleId::new(5),
            author_id: UserId::new(2),
            author: "bob".to_string(),
            text: "Solid".to_string(),
            score: Score::new(7).unwrap(),
            pub_date: Utc::now(),
        }
    }

    #[test]
    fn test_full_write_requires_fields() {
        let errors = ReviewInput::default().validate(None).unwrap_err();
        assert_eq!(errors.messages("text"), [REQUIRED]);
        assert_eq!(errors.messages("score"), [REQUIRED]);
    }

    #[test]
    fn test_score_out_of_range() {
        let errors = ReviewInput {
            text: Some("Meh".into()),
            score: Some(11),
        }
        .validate(None)
        .unwrap_err();
        assert_eq!(
            errors.messages("score"),
            ["Ensure this value is less than or equal to 10."]
        );
    }

    #[test]
    fn test_partial_write_keeps_stored_fields() {
        let review = stored();
        let draft = ReviewInput {
            score: Some(3),
            ..Default::default()
        }
        .validate(Some(&review))
        .unwrap();
        assert_eq!(draft.text, "Solid");
        assert_eq!(draft.score.get(), 3);
    }

    #[test]
    fn test_blank_text_rejected() {
        let errors = ReviewInput {
            text: Some("  ".into()),
            score: Some(5),
        }
        .validate(None)
        .unwrap_err();
        assert_eq!(errors.messages("text"), ["This field may not be blank."]);
    }
}
