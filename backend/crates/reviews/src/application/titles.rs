//! Title Use Cases

use auth::domain::policy::{ADMIN_OR_READ_ONLY, Access, Requester};
use kernel::error::field::FieldErrors;
use kernel::pagination::{Page, PageQuery, PageRequest};
use std::sync::Arc;

use crate::application::config::ReviewsConfig;
use crate::domain::entities::{TermKind, Title, TitleDraft, TitleFilter};
use crate::domain::repository::{TermRepository, TitleRepository};
use crate::domain::value_objects::{TermId, TitleId, name, release_year};
use crate::error::{ReviewsError, ReviewsResult};

/// Raw title fields; terms are referenced by slug
///
/// `rating` is never accepted from clients.
#[derive(Debug, Clone, Default)]
pub struct TitleInput {
    pub name: Option<String>,
    pub year: Option<i64>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub genre: Option<Vec<String>>,
}

/// How a write treats absent fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// POST and PUT: name and year are required, the rest is reset
    Full,
    /// PATCH: absent fields keep their stored value
    Partial,
}

/// Title use cases
pub struct TitlesUseCase<R>
where
    R: TermRepository + TitleRepository,
{
    repo: Arc<R>,
    config: Arc<ReviewsConfig>,
}

impl<R> TitlesUseCase<R>
where
    R: TermRepository + TitleRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<ReviewsConfig>) -> Self {
        Self { repo, config }
    }

    /// GET /titles
    pub async fn list(
        &self,
        requester: &Requester,
        filter: TitleFilter,
        query: PageQuery,
    ) -> ReviewsResult<Page<Title>> {
        ADMIN_OR_READ_ONLY.check(requester, Access::Read)?;

        let request = PageRequest::from_query(query, self.config.page_size)?;
        let (titles, count) = self.repo.list_titles(&filter, request).await?;
        Ok(Page::new(titles, count, request)?)
    }

    /// GET /titles/{title_id}
    pub async fn get(&self, requester: &Requester, id: TitleId) -> ReviewsResult<Title> {
        ADMIN_OR_READ_ONLY.check(requester, Access::Read)?;
        self.load(id).await
    }

    /// POST /titles
    pub async fn create(&self, requester: &Requester, input: TitleInput) -> ReviewsResult<Title> {
        ADMIN_OR_READ_ONLY.check(requester, Access::Write)?;

        let draft = self.draft(input, None).await?;
        let title = self.repo.create_title(&draft).await?;
        tracing::info!(title_id = %title.id, name = %title.name, "Title created");
        Ok(title)
    }

    /// PUT / PATCH /titles/{title_id}
    pub async fn update(
        &self,
        requester: &Requester,
        id: TitleId,
        input: TitleInput,
        mode: WriteMode,
    ) -> ReviewsResult<Title> {
        ADMIN_OR_READ_ONLY.check(requester, Access::Write)?;

        let current = self.load(id).await?;
        let base = match mode {
            WriteMode::Full => None,
            WriteMode::Partial => Some(TitleDraft::from(&current)),
        };
        let draft = self.draft(input, base).await?;

        let title = self
            .repo
            .update_title(id, &draft)
            .await?
            .ok_or(ReviewsError::NotFound("Title"))?;
        tracing::info!(title_id = %title.id, "Title updated");
        Ok(title)
    }

    /// DELETE /titles/{title_id}
    pub async fn delete(&self, requester: &Requester, id: TitleId) -> ReviewsResult<()> {
        ADMIN_OR_READ_ONLY.check(requester, Access::Write)?;

        if !self.repo.delete_title(id).await? {
            return Err(ReviewsError::NotFound("Title"));
        }
        tracing::info!(title_id = %id, "Title deleted");
        Ok(())
    }

    async fn load(&self, id: TitleId) -> ReviewsResult<Title> {
        self.repo
            .find_title(id)
            .await?
            .ok_or(ReviewsError::NotFound("Title"))
    }

    /// Validate `input` on top of `base` (None for a full write)
    async fn draft(&self, input: TitleInput, base: Option<TitleDraft>) -> ReviewsResult<TitleDraft> {
        let mut errors = FieldErrors::new();

        let name = match (input.name, &base) {
            (Some(raw), _) => errors.check("name", name(raw)),
            (None, Some(base)) => Some(base.name.clone()),
            (None, None) => {
                errors.required("name");
                None
            }
        };
        let year = match (input.year, &base) {
            (Some(year), _) => errors.check("year", release_year(year)),
            (None, Some(base)) => Some(base.year),
            (None, None) => {
                errors.required("year");
                None
            }
        };
        let description = match (input.description, &base) {
            (Some(text), _) => Some(text.trim().to_string()).filter(|t| !t.is_empty()),
            (None, Some(base)) => base.description.clone(),
            (None, None) => None,
        };
        let category = match (input.category, &base) {
            (Some(slug), _) => self
                .resolve(TermKind::Category, std::slice::from_ref(&slug), &mut errors)
                .await?
                .first()
                .copied(),
            (None, Some(base)) => base.category,
            (None, None) => None,
        };
        let genres = match (input.genre, &base) {
            (Some(slugs), _) => self.resolve(TermKind::Genre, &slugs, &mut errors).await?,
            (None, Some(base)) => base.genres.clone(),
            (None, None) => Vec::new(),
        };

        match (name, year) {
            (Some(name), Some(year)) if errors.is_empty() => Ok(TitleDraft {
                name,
                year,
                description,
                category,
                genres,
            }),
            _ => Err(errors.into()),
        }
    }

    /// Look up terms by slug, recording unknown ones under the kind's field
    async fn resolve(
        &self,
        kind: TermKind,
        slugs: &[String],
        errors: &mut FieldErrors,
    ) -> ReviewsResult<Vec<TermId>> {
        let mut ids = Vec::with_capacity(slugs.len());
        for slug in slugs {
            match self.repo.find_term(kind, slug.trim()).await? {
                Some(term) if !ids.contains(&term.id) => ids.push(term.id),
                Some(_) => {}
                None => errors.add(
                    kind.label(),
                    format!("Object with slug={slug} does not exist."),
                ),
            }
        }
        Ok(ids)
    }
}
