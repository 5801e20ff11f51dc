//! Category and Genre Use Cases
//!
//! Both taxonomies share one flow: public listing, admin-only create and
//! delete, addressed by slug.

use auth::domain::policy::{ADMIN_OR_READ_ONLY, Access, Requester};
use kernel::error::field::FieldErrors;
use kernel::pagination::{Page, PageQuery, PageRequest};
use std::sync::Arc;

use crate::application::config::ReviewsConfig;
use crate::domain::entities::{NewTerm, Term, TermKind};
use crate::domain::repository::TermRepository;
use crate::domain::value_objects::{Slug, name};
use crate::error::{ReviewsError, ReviewsResult};

#[derive(Debug, Clone, Default)]
pub struct TermInput {
    pub name: Option<String>,
    pub slug: Option<String>,
}

impl TermInput {
    pub fn validate(self) -> Result<NewTerm, FieldErrors> {
        let mut errors = FieldErrors::new();
        let name = match self.name {
            Some(raw) => errors.check("name", name(raw)),
            None => {
                errors.required("name");
                None
            }
        };
        let slug = match self.slug {
            Some(raw) => errors.check("slug", Slug::new(raw)),
            None => {
                errors.required("slug");
                None
            }
        };
        match (name, slug) {
            (Some(name), Some(slug)) => Ok(NewTerm { name, slug }),
            _ => Err(errors),
        }
    }
}

/// Term use cases
pub struct TermsUseCase<R>
where
    R: TermRepository,
{
    repo: Arc<R>,
    config: Arc<ReviewsConfig>,
}

impl<R> TermsUseCase<R>
where
    R: TermRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<ReviewsConfig>) -> Self {
        Self { repo, config }
    }

    /// GET /categories, GET /genres
    pub async fn list(
        &self,
        requester: &Requester,
        kind: TermKind,
        search: Option<&str>,
        query: PageQuery,
    ) -> ReviewsResult<Page<Term>> {
        ADMIN_OR_READ_ONLY.check(requester, Access::Read)?;

        let request = PageRequest::from_query(query, self.config.page_size)?;
        let search = search.map(str::trim).filter(|s| !s.is_empty());
        let (terms, count) = self.repo.list_terms(kind, search, request).await?;
        Ok(Page::new(terms, count, request)?)
    }

    /// POST /categories, POST /genres
    pub async fn create(
        &self,
        requester: &Requester,
        kind: TermKind,
        input: TermInput,
    ) -> ReviewsResult<Term> {
        ADMIN_OR_READ_ONLY.check(requester, Access::Write)?;

        let term = input.validate()?;
        if self.repo.find_term(kind, term.slug.as_str()).await?.is_some() {
            return Err(ReviewsError::slug_taken(kind));
        }

        let term = self.repo.create_term(kind, &term).await?;
        tracing::info!(kind = kind.label(), slug = %term.slug, "Term created");
        Ok(term)
    }

    /// DELETE /categories/{slug}, DELETE /genres/{slug}
    pub async fn delete(
        &self,
        requester: &Requester,
        kind: TermKind,
        slug: &str,
    ) -> ReviewsResult<()> {
        ADMIN_OR_READ_ONLY.check(requester, Access::Write)?;

        if !self.repo.delete_term(kind, slug).await? {
            return Err(ReviewsError::NotFound(kind.resource()));
        }
        tracing::info!(kind = kind.label(), slug = %slug, "Term deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel::error::field::REQUIRED;

    #[test]
    fn test_validate_requires_both_fields() {
        let errors = TermInput::default().validate().unwrap_err();
        assert_eq!(errors.messages("name"), [REQUIRED]);
        assert_eq!(errors.messages("slug"), [REQUIRED]);
    }

    #[test]
    fn test_validate_checks_slug_format() {
        let errors = TermInput {
            name: Some("Science fiction".into()),
            slug: Some("sci fi".into()),
        }
        .validate()
        .unwrap_err();
        assert!(errors.contains("slug"));
        assert!(!errors.contains("name"));
    }

    #[test]
    fn test_validate_ok() {
        let term = TermInput {
            name: Some(" Rock ".into()),
            slug: Some("rock".into()),
        }
        .validate()
        .unwrap();
        assert_eq!(term.name, "Rock");
        assert_eq!(term.slug.as_str(), "rock");
    }
}
