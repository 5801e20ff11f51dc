//! Domain Entities
//!
//! Core business entities for the catalogue and its reviews.

use auth::domain::policy::Owned;
use auth::domain::value_object::user_id::UserId;
use chrono::{DateTime, Utc};

use crate::domain::value_objects::{CommentId, ReviewId, Score, Slug, TermId, TitleId};

// ============================================================================
// Terms (categories and genres)
// ============================================================================

/// The two flat taxonomies a title is classified by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TermKind {
    Category,
    Genre,
}

impl TermKind {
    /// Table holding terms of this kind
    pub const fn table(self) -> &'static str {
        match self {
            TermKind::Category => "categories",
            TermKind::Genre => "genres",
        }
    }

    /// Noun used in messages
    pub const fn label(self) -> &'static str {
        match self {
            TermKind::Category => "category",
            TermKind::Genre => "genre",
        }
    }

    /// Resource name used in 404 messages
    pub const fn resource(self) -> &'static str {
        match self {
            TermKind::Category => "Category",
            TermKind::Genre => "Genre",
        }
    }
}

/// Category or genre
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    pub id: TermId,
    pub name: String,
    pub slug: Slug,
}

#[derive(Debug, Clone)]
pub struct NewTerm {
    pub name: String,
    pub slug: Slug,
}

// ============================================================================
// Title
// ============================================================================

/// Title with its classification and computed rating
#[derive(Debug, Clone)]
pub struct Title {
    pub id: TitleId,
    pub name: String,
    pub year: i32,
    pub description: Option<String>,
    pub category: Option<Term>,
    pub genres: Vec<Term>,
    /// Mean review score; `None` without reviews
    pub rating: Option<f64>,
}

/// Validated title fields, with terms resolved to ids
#[derive(Debug, Clone, PartialEq)]
pub struct TitleDraft {
    pub name: String,
    pub year: i32,
    pub description: Option<String>,
    pub category: Option<TermId>,
    pub genres: Vec<TermId>,
}

impl From<&Title> for TitleDraft {
    fn from(title: &Title) -> Self {
        Self {
            name: title.name.clone(),
            year: title.year,
            description: title.description.clone(),
            category: title.category.as_ref().map(|c| c.id),
            genres: title.genres.iter().map(|g| g.id).collect(),
        }
    }
}

/// List filters for `/titles`
#[derive(Debug, Clone, Default)]
pub struct TitleFilter {
    /// Case-insensitive substring of the name
    pub name: Option<String>,
    /// Category slug
    pub category: Option<String>,
    /// Genre slug
    pub genre: Option<String>,
    pub year: Option<i32>,
}

impl TitleFilter {
    /// Whether `title` passes every set filter
    pub fn matches(&self, title: &Title) -> bool {
        self.name
            .as_deref()
            .is_none_or(|n| kernel::search::icontains(&title.name, n))
            && self.category.as_deref().is_none_or(|slug| {
                title
                    .category
                    .as_ref()
                    .is_some_and(|c| c.slug.as_str() == slug)
            })
            && self
                .genre
                .as_deref()
                .is_none_or(|slug| title.genres.iter().any(|g| g.slug.as_str() == slug))
            && self.year.is_none_or(|year| title.year == year)
    }
}

// ============================================================================
// Review
// ============================================================================

/// Review of a title; one per (title, author)
#[derive(Debug, Clone)]
pub struct Review {
    pub id: ReviewId,
    pub title_id: TitleId,
    pub author_id: UserId,
    /// Author's username at read time
    pub author: String,
    pub text: String,
    pub score: Score,
    /// Set at creation, never changed
    pub pub_date: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ReviewDraft {
    pub text: String,
    pub score: Score,
}

impl Owned for Review {
    fn author_id(&self) -> UserId {
        self.author_id
    }
}

// ============================================================================
// Comment
// ============================================================================

/// Comment on a review
#[derive(Debug, Clone)]
pub struct Comment {
    pub id: CommentId,
    pub review_id: ReviewId,
    pub author_id: UserId,
    pub author: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
}

impl Owned for Comment {
    fn author_id(&self) -> UserId {
        self.author_id
    }
}
