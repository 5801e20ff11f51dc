//! Comment Use Cases
//!
//! Comments hang off a review, which must belong to the title in the path.

use auth::domain::policy::{AUTHOR_OR_STAFF, Access, Requester};
use kernel::error::field::FieldErrors;
use kernel::pagination::{Page, PageQuery, PageRequest};
use std::sync::Arc;

use crate::application::config::ReviewsConfig;
use crate::application::titles::WriteMode;
use crate::domain::entities::{Comment, Review};
use crate::domain::repository::{CommentRepository, ReviewRepository, TitleRepository};
use crate::domain::value_objects::{CommentId, ReviewId, TitleId, required_text};
use crate::error::{ReviewsError, ReviewsResult};

#[derive(Debug, Clone, Default)]
pub struct CommentInput {
    pub text: Option<String>,
}

impl CommentInput {
    pub fn validate(self) -> Result<String, FieldErrors> {
        let mut errors = FieldErrors::new();
        match self.text {
            Some(raw) => errors.check("text", required_text(raw, None)).ok_or(errors),
            None => {
                errors.required("text");
                Err(errors)
            }
        }
    }
}

/// Comment use cases
pub struct CommentsUseCase<R>
where
    R: TitleRepository + ReviewRepository + CommentRepository,
{
    repo: Arc<R>,
    config: Arc<ReviewsConfig>,
}

impl<R> CommentsUseCase<R>
where
    R: TitleRepository + ReviewRepository + CommentRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<ReviewsConfig>) -> Self {
        Self { repo, config }
    }

    /// GET .../reviews/{review_id}/comments
    pub async fn list(
        &self,
        requester: &Requester,
        title_id: TitleId,
        review_id: ReviewId,
        query: PageQuery,
    ) -> ReviewsResult<Page<Comment>> {
        AUTHOR_OR_STAFF.check(requester, Access::Read)?;
        let review = self.review(title_id, review_id).await?;

        let request = PageRequest::from_query(query, self.config.page_size)?;
        let (comments, count) = self.repo.list_comments(review.id, request).await?;
        Ok(Page::new(comments, count, request)?)
    }

    /// GET .../comments/{comment_id}
    pub async fn get(
        &self,
        requester: &Requester,
        title_id: TitleId,
        review_id: ReviewId,
        id: CommentId,
    ) -> ReviewsResult<Comment> {
        self.load(requester, title_id, review_id, id, Access::Read)
            .await
    }

    /// POST .../reviews/{review_id}/comments
    pub async fn create(
        &self,
        requester: &Requester,
        title_id: TitleId,
        review_id: ReviewId,
        input: CommentInput,
    ) -> ReviewsResult<Comment> {
        AUTHOR_OR_STAFF.check(requester, Access::Write)?;
        let author = requester.id().ok_or(ReviewsError::Unauthenticated)?;
        let review = self.review(title_id, review_id).await?;

        let text = input.validate()?;
        let comment = self.repo.create_comment(review.id, author, &text).await?;
        tracing::info!(
            comment_id = %comment.id,
            review_id = %review.id,
            author_id = %author,
            "Comment created"
        );
        Ok(comment)
    }

    /// PUT / PATCH .../comments/{comment_id}
    pub async fn update(
        &self,
        requester: &Requester,
        title_id: TitleId,
        review_id: ReviewId,
        id: CommentId,
        input: CommentInput,
        mode: WriteMode,
    ) -> ReviewsResult<Comment> {
        let mut comment = self
            .load(requester, title_id, review_id, id, Access::Write)
            .await?;
        // An empty PATCH leaves the text alone
        if mode == WriteMode::Full || input.text.is_some() {
            comment.text = input.validate()?;
        }

        let comment = self.repo.update_comment(&comment).await?;
        tracing::info!(comment_id = %comment.id, by = ?requester.id(), "Comment updated");
        Ok(comment)
    }

    /// DELETE .../comments/{comment_id}
    pub async fn delete(
        &self,
        requester: &Requester,
        title_id: TitleId,
        review_id: ReviewId,
        id: CommentId,
    ) -> ReviewsResult<()> {
        let comment = self
            .load(requester, title_id, review_id, id, Access::Write)
            .await?;
        if !self.repo.delete_comment(comment.id).await? {
            return Err(ReviewsError::NotFound("Comment"));
        }
        tracing::info!(comment_id = %comment.id, by = ?requester.id(), "Comment deleted");
        Ok(())
    }

    /// The review in the path, 404 unless it belongs to the title
    async fn review(&self, title_id: TitleId, review_id: ReviewId) -> ReviewsResult<Review> {
        if self.repo.find_title(title_id).await?.is_none() {
            return Err(ReviewsError::NotFound("Title"));
        }
        self.repo
            .find_review(title_id, review_id)
            .await?
            .ok_or(ReviewsError::NotFound("Review"))
    }

    async fn load(
        &self,
        requester: &Requester,
        title_id: TitleId,
        review_id: ReviewId,
        id: CommentId,
        access: Access,
    ) -> ReviewsResult<Comment> {
        AUTHOR_OR_STAFF.check(requester, access)?;
        let review = self.review(title_id, review_id).await?;
        let comment = self
            .repo
            .find_comment(review.id, id)
            .await?
            .ok_or(ReviewsError::NotFound("Comment"))?;
        AUTHOR_OR_STAFF.check_object(requester, access, &comment)?;
        Ok(comment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel::error::field::REQUIRED;

    #[test]
    fn test_validate_text() {
        assert_eq!(
            CommentInput {
                text: Some(" Agreed ".into())
            }
            .validate()
            .unwrap(),
            "Agreed"
        );
        assert_eq!(
            CommentInput::default().validate().unwrap_err().messages("text"),
            [REQUIRED]
        );
        assert!(
            CommentInput {
                text: Some(String::new())
            }
            .validate()
            .unwrap_err()
            .contains("text")
        );
    }
}
