//! API DTOs (Data Transfer Objects)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::application::{CommentInput, ReviewInput, TermInput, TitleInput};
use crate::domain::entities::{Comment, Review, Term, Title, TitleFilter};

// ============================================================================
// Categories / Genres
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TermRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
}

impl From<TermRequest> for TermInput {
    fn from(req: TermRequest) -> Self {
        Self {
            name: req.name,
            slug: req.slug,
        }
    }
}

/// Terms are exposed by name and slug only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermResponse {
    pub name: String,
    pub slug: String,
}

impl From<Term> for TermResponse {
    fn from(term: Term) -> Self {
        Self {
            name: term.name,
            slug: term.slug.as_str().to_string(),
        }
    }
}

/// `GET /categories` and `GET /genres` query string
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TermListQuery {
    pub page: Option<u32>,
    pub search: Option<String>,
}

// ============================================================================
// Titles
// ============================================================================

/// Title write body; `category` and `genre` are slugs
///
/// Unknown keys such as `rating` are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TitleRequest {
    pub name: Option<String>,
    pub year: Option<i64>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub genre: Option<Vec<String>>,
}

impl From<TitleRequest> for TitleInput {
    fn from(req: TitleRequest) -> Self {
        Self {
            name: req.name,
            year: req.year,
            description: req.description,
            category: req.category,
            genre: req.genre,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TitleResponse {
    pub id: i64,
    pub name: String,
    pub year: i32,
    pub rating: Option<f64>,
    pub description: Option<String>,
    pub genre: Vec<TermResponse>,
    pub category: Option<TermResponse>,
}

impl From<Title> for TitleResponse {
    fn from(title: Title) -> Self {
        Self {
            id: title.id.get(),
            name: title.name,
            year: title.year,
            rating: title.rating,
            description: title.description,
            genre: title.genres.into_iter().map(TermResponse::from).collect(),
            category: title.category.map(TermResponse::from),
        }
    }
}

/// `GET /titles` query string
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TitleListQuery {
    pub page: Option<u32>,
    pub name: Option<String>,
    pub category: Option<String>,
    pub genre: Option<String>,
    pub year: Option<i32>,
}

impl TitleListQuery {
    /// Split into the filter and the page number, dropping blank filters
    pub fn into_parts(self) -> (TitleFilter, Option<u32>) {
        let present = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        let filter = TitleFilter {
            name: present(self.name),
            category: present(self.category),
            genre: present(self.genre),
            year: self.year,
        };
        (filter, self.page)
    }
}

// ============================================================================
// Reviews
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewRequest {
    pub text: Option<String>,
    pub score: Option<i64>,
}

impl From<ReviewRequest> for ReviewInput {
    fn from(req: ReviewRequest) -> Self {
        Self {
            text: req.text,
            score: req.score,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewResponse {
    pub id: i64,
    pub text: String,
    /// Author's username
    pub author: String,
    pub score: u8,
    pub pub_date: DateTime<Utc>,
}

impl From<Review> for ReviewResponse {
    fn from(review: Review) -> Self {
        Self {
            id: review.id.get(),
            text: review.text,
            author: review.author,
            score: review.score.get(),
            pub_date: review.pub_date,
        }
    }
}

// ============================================================================
// Comments
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentRequest {
    pub text: Option<String>,
}

impl From<CommentRequest> for CommentInput {
    fn from(req: CommentRequest) -> Self {
        Self { text: req.text }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentResponse {
    pub id: i64,
    pub text: String,
    pub author: String,
    pub pub_date: DateTime<Utc>,
}

impl From<Comment> for CommentResponse {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id.get(),
            text: comment.text,
            author: comment.author,
            pub_date: comment.pub_date,
        }
    }
}
