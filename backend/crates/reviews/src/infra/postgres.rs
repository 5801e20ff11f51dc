//! PostgreSQL Repository Implementations

use auth::domain::value_object::user_id::UserId;
use chrono::{DateTime, Utc};
use kernel::error::conversions::unique_violation;
use kernel::pagination::PageRequest;
use kernel::search::ilike_contains;
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashMap;

use crate::domain::entities::{
    Comment, NewTerm, Review, ReviewDraft, Term, TermKind, Title, TitleDraft, TitleFilter,
};
use crate::domain::repository::{
    CommentRepository, ReviewRepository, TermRepository, TitleRepository,
};
use crate::domain::value_objects::{CommentId, ReviewId, Score, Slug, TermId, TitleId};
use crate::error::{ReviewsError, ReviewsResult};

/// Unique index on (title_id, author_id)
const REVIEW_KEY: &str = "reviews_title_author_key";

const TITLE_COLUMNS: &str = r#"
    t.id,
    t.name,
    t.year,
    t.description,
    c.id AS category_id,
    c.name AS category_name,
    c.slug AS category_slug,
    (SELECT AVG(r.score)::FLOAT8 FROM reviews r WHERE r.title_id = t.id) AS rating
"#;

/// $1 name pattern, $2 category slug, $3 genre slug, $4 year
const TITLE_FILTER: &str = r#"
    WHERE ($1::TEXT IS NULL OR t.name ILIKE $1)
      AND ($2::TEXT IS NULL OR c.slug = $2)
      AND ($3::TEXT IS NULL OR EXISTS (
            SELECT 1 FROM title_genres tg
            JOIN genres g ON g.id = tg.genre_id
            WHERE tg.title_id = t.id AND g.slug = $3
      ))
      AND ($4::INTEGER IS NULL OR t.year = $4)
"#;

const REVIEW_COLUMNS: &str =
    "r.id, r.title_id, r.author_id, u.username AS author, r.text, r.score, r.pub_date";

const COMMENT_COLUMNS: &str =
    "m.id, m.review_id, m.author_id, u.username AS author, m.text, m.pub_date";

/// PostgreSQL-backed reviews repository
#[derive(Clone)]
pub struct PgReviewsRepository {
    pool: PgPool,
}

impl PgReviewsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Genres of each listed title, keyed by title id
    async fn genres_of(&self, title_ids: &[i64]) -> ReviewsResult<HashMap<i64, Vec<Term>>> {
        let rows = sqlx::query_as::<_, TitleGenreRow>(
            r#"
            SELECT tg.title_id, g.id, g.name, g.slug
            FROM title_genres tg
            JOIN genres g ON g.id = tg.genre_id
            WHERE tg.title_id = ANY($1)
            ORDER BY g.id
            "#,
        )
        .bind(title_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut genres: HashMap<i64, Vec<Term>> = HashMap::new();
        for row in rows {
            genres.entry(row.title_id).or_default().push(Term {
                id: TermId::new(row.id),
                name: row.name,
                slug: Slug::from_db(row.slug),
            });
        }
        Ok(genres)
    }

    async fn assemble(&self, rows: Vec<TitleRow>) -> ReviewsResult<Vec<Title>> {
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let mut genres = self.genres_of(&ids).await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let genres = genres.remove(&row.id).unwrap_or_default();
                row.into_title(genres)
            })
            .collect())
    }

    async fn link_genres(
        tx: &mut Transaction<'_, Postgres>,
        title_id: i64,
        genres: &[TermId],
    ) -> ReviewsResult<()> {
        let ids: Vec<i64> = genres.iter().map(TermId::get).collect();
        sqlx::query(
            r#"
            INSERT INTO title_genres (title_id, genre_id)
            SELECT $1, UNNEST($2::BIGINT[])
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(title_id)
        .bind(&ids)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}

// ============================================================================
// Term Repository Implementation
// ============================================================================

impl TermRepository for PgReviewsRepository {
    async fn list_terms(
        &self,
        kind: TermKind,
        search: Option<&str>,
        page: PageRequest,
    ) -> ReviewsResult<(Vec<Term>, u64)> {
        let table = kind.table();
        let pattern = search.map(ilike_contains);

        let sql = format!("SELECT COUNT(*) FROM {table} WHERE ($1::TEXT IS NULL OR name ILIKE $1)");
        let count = sqlx::query_scalar::<_, i64>(&sql)
            .bind(pattern.as_deref())
            .fetch_one(&self.pool)
            .await?;

        let sql = format!(
            r#"
            SELECT id, name, slug FROM {table}
            WHERE ($1::TEXT IS NULL OR name ILIKE $1)
            ORDER BY id
            LIMIT $2 OFFSET $3
            "#
        );
        let rows = sqlx::query_as::<_, TermRow>(&sql)
            .bind(pattern.as_deref())
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok((
            rows.into_iter().map(TermRow::into_term).collect(),
            count.max(0) as u64,
        ))
    }

    async fn find_term(&self, kind: TermKind, slug: &str) -> ReviewsResult<Option<Term>> {
        let sql = format!("SELECT id, name, slug FROM {} WHERE slug = $1", kind.table());
        let row = sqlx::query_as::<_, TermRow>(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(TermRow::into_term))
    }

    async fn create_term(&self, kind: TermKind, term: &NewTerm) -> ReviewsResult<Term> {
        let sql = format!(
            "INSERT INTO {} (name, slug) VALUES ($1, $2) RETURNING id, name, slug",
            kind.table()
        );
        let row = sqlx::query_as::<_, TermRow>(&sql)
            .bind(&term.name)
            .bind(term.slug.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|err| {
                if unique_violation(&err).is_some() {
                    ReviewsError::slug_taken(kind)
                } else {
                    ReviewsError::Database(err)
                }
            })?;

        Ok(row.into_term())
    }

    async fn delete_term(&self, kind: TermKind, slug: &str) -> ReviewsResult<bool> {
        let sql = format!("DELETE FROM {} WHERE slug = $1", kind.table());
        let deleted = sqlx::query(&sql)
            .bind(slug)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted == 1)
    }
}

// ============================================================================
// Title Repository Implementation
// ============================================================================

impl TitleRepository for PgReviewsRepository {
    async fn list_titles(
        &self,
        filter: &TitleFilter,
        page: PageRequest,
    ) -> ReviewsResult<(Vec<Title>, u64)> {
        let pattern = filter.name.as_deref().map(ilike_contains);

        let sql = format!(
            "SELECT COUNT(*) FROM titles t LEFT JOIN categories c ON c.id = t.category_id {TITLE_FILTER}"
        );
        let count = sqlx::query_scalar::<_, i64>(&sql)
            .bind(pattern.as_deref())
            .bind(filter.category.as_deref())
            .bind(filter.genre.as_deref())
            .bind(filter.year)
            .fetch_one(&self.pool)
            .await?;

        let sql = format!(
            r#"
            SELECT {TITLE_COLUMNS}
            FROM titles t
            LEFT JOIN categories c ON c.id = t.category_id
            {TITLE_FILTER}
            ORDER BY t.id
            LIMIT $5 OFFSET $6
            "#
        );
        let rows = sqlx::query_as::<_, TitleRow>(&sql)
            .bind(pattern.as_deref())
            .bind(filter.category.as_deref())
            .bind(filter.genre.as_deref())
            .bind(filter.year)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok((self.assemble(rows).await?, count.max(0) as u64))
    }

    async fn find_title(&self, id: TitleId) -> ReviewsResult<Option<Title>> {
        let sql = format!(
            r#"
            SELECT {TITLE_COLUMNS}
            FROM titles t
            LEFT JOIN categories c ON c.id = t.category_id
            WHERE t.id = $1
            "#
        );
        let row = sqlx::query_as::<_, TitleRow>(&sql)
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(self.assemble(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn create_title(&self, draft: &TitleDraft) -> ReviewsResult<Title> {
        let mut tx = self.pool.begin().await?;

        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO titles (name, year, description, category_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&draft.name)
        .bind(draft.year)
        .bind(draft.description.as_deref())
        .bind(draft.category.map(|c| c.get()))
        .fetch_one(&mut *tx)
        .await?;
        Self::link_genres(&mut tx, id, &draft.genres).await?;

        tx.commit().await?;

        self.find_title(TitleId::new(id))
            .await?
            .ok_or_else(|| ReviewsError::Internal(format!("title {id} missing after insert")))
    }

    async fn update_title(&self, id: TitleId, draft: &TitleDraft) -> ReviewsResult<Option<Title>> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE titles SET
                name = $2,
                year = $3,
                description = $4,
                category_id = $5
            WHERE id = $1
            "#,
        )
        .bind(id.get())
        .bind(&draft.name)
        .bind(draft.year)
        .bind(draft.description.as_deref())
        .bind(draft.category.map(|c| c.get()))
        .execute(&mut *tx)
        .await?
        .rows_affected();
        if updated == 0 {
            return Ok(None);
        }

        sqlx::query("DELETE FROM title_genres WHERE title_id = $1")
            .bind(id.get())
            .execute(&mut *tx)
            .await?;
        Self::link_genres(&mut tx, id.get(), &draft.genres).await?;

        tx.commit().await?;

        self.find_title(id).await
    }

    async fn delete_title(&self, id: TitleId) -> ReviewsResult<bool> {
        let deleted = sqlx::query("DELETE FROM titles WHERE id = $1")
            .bind(id.get())
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted == 1)
    }
}

// ============================================================================
// Review Repository Implementation
// ============================================================================

impl ReviewRepository for PgReviewsRepository {
    async fn list_reviews(
        &self,
        title_id: TitleId,
        page: PageRequest,
    ) -> ReviewsResult<(Vec<Review>, u64)> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM reviews WHERE title_id = $1")
                .bind(title_id.get())
                .fetch_one(&self.pool)
                .await?;

        let sql = format!(
            r#"
            SELECT {REVIEW_COLUMNS}
            FROM reviews r
            JOIN users u ON u.id = r.author_id
            WHERE r.title_id = $1
            ORDER BY r.pub_date, r.id
            LIMIT $2 OFFSET $3
            "#
        );
        let rows = sqlx::query_as::<_, ReviewRow>(&sql)
            .bind(title_id.get())
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok((
            rows.into_iter().map(ReviewRow::into_review).collect(),
            count.max(0) as u64,
        ))
    }

    async fn find_review(&self, title_id: TitleId, id: ReviewId) -> ReviewsResult<Option<Review>> {
        let sql = format!(
            r#"
            SELECT {REVIEW_COLUMNS}
            FROM reviews r
            JOIN users u ON u.id = r.author_id
            WHERE r.id = $1 AND r.title_id = $2
            "#
        );
        let row = sqlx::query_as::<_, ReviewRow>(&sql)
            .bind(id.get())
            .bind(title_id.get())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(ReviewRow::into_review))
    }

    async fn has_reviewed(&self, title_id: TitleId, author_id: UserId) -> ReviewsResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM reviews WHERE title_id = $1 AND author_id = $2)",
        )
        .bind(title_id.get())
        .bind(author_id.get())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn create_review(
        &self,
        title_id: TitleId,
        author_id: UserId,
        draft: &ReviewDraft,
    ) -> ReviewsResult<Review> {
        let sql = format!(
            r#"
            WITH r AS (
                INSERT INTO reviews (title_id, author_id, text, score, pub_date)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING *
            )
            SELECT {REVIEW_COLUMNS}
            FROM r
            JOIN users u ON u.id = r.author_id
            "#
        );
        let row = sqlx::query_as::<_, ReviewRow>(&sql)
            .bind(title_id.get())
            .bind(author_id.get())
            .bind(&draft.text)
            .bind(i16::from(draft.score))
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await
            .map_err(|err| {
                if unique_violation(&err) == Some(REVIEW_KEY) {
                    ReviewsError::duplicate_review()
                } else {
                    ReviewsError::Database(err)
                }
            })?;

        Ok(row.into_review())
    }

    async fn update_review(&self, review: &Review) -> ReviewsResult<Review> {
        let sql = format!(
            r#"
            WITH r AS (
                UPDATE reviews SET text = $2, score = $3
                WHERE id = $1
                RETURNING *
            )
            SELECT {REVIEW_COLUMNS}
            FROM r
            JOIN users u ON u.id = r.author_id
            "#
        );
        let row = sqlx::query_as::<_, ReviewRow>(&sql)
            .bind(review.id.get())
            .bind(&review.text)
            .bind(i16::from(review.score))
            .fetch_optional(&self.pool)
            .await?;

        row.map(ReviewRow::into_review)
            .ok_or(ReviewsError::NotFound("Review"))
    }

    async fn delete_review(&self, id: ReviewId) -> ReviewsResult<bool> {
        let deleted = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id.get())
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted == 1)
    }
}

// ============================================================================
// Comment Repository Implementation
// ============================================================================

impl CommentRepository for PgReviewsRepository {
    async fn list_comments(
        &self,
        review_id: ReviewId,
        page: PageRequest,
    ) -> ReviewsResult<(Vec<Comment>, u64)> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM comments WHERE review_id = $1")
                .bind(review_id.get())
                .fetch_one(&self.pool)
                .await?;

        let sql = format!(
            r#"
            SELECT {COMMENT_COLUMNS}
            FROM comments m
            JOIN users u ON u.id = m.author_id
            WHERE m.review_id = $1
            ORDER BY m.pub_date, m.id
            LIMIT $2 OFFSET $3
            "#
        );
        let rows = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(review_id.get())
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok((
            rows.into_iter().map(CommentRow::into_comment).collect(),
            count.max(0) as u64,
        ))
    }

    async fn find_comment(
        &self,
        review_id: ReviewId,
        id: CommentId,
    ) -> ReviewsResult<Option<Comment>> {
        let sql = format!(
            r#"
            SELECT {COMMENT_COLUMNS}
            FROM comments m
            JOIN users u ON u.id = m.author_id
            WHERE m.id = $1 AND m.review_id = $2
            "#
        );
        let row = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(id.get())
            .bind(review_id.get())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(CommentRow::into_comment))
    }

    async fn create_comment(
        &self,
        review_id: ReviewId,
        author_id: UserId,
        text: &str,
    ) -> ReviewsResult<Comment> {
        let sql = format!(
            r#"
            WITH m AS (
                INSERT INTO comments (review_id, author_id, text, pub_date)
                VALUES ($1, $2, $3, $4)
                RETURNING *
            )
            SELECT {COMMENT_COLUMNS}
            FROM m
            JOIN users u ON u.id = m.author_id
            "#
        );
        let row = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(review_id.get())
            .bind(author_id.get())
            .bind(text)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await?;

        Ok(row.into_comment())
    }

    async fn update_comment(&self, comment: &Comment) -> ReviewsResult<Comment> {
        let sql = format!(
            r#"
            WITH m AS (
                UPDATE comments SET text = $2
                WHERE id = $1
                RETURNING *
            )
            SELECT {COMMENT_COLUMNS}
            FROM m
            JOIN users u ON u.id = m.author_id
            "#
        );
        let row = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(comment.id.get())
            .bind(&comment.text)
            .fetch_optional(&self.pool)
            .await?;

        row.map(CommentRow::into_comment)
            .ok_or(ReviewsError::NotFound("Comment"))
    }

    async fn delete_comment(&self, id: CommentId) -> ReviewsResult<bool> {
        let deleted = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id.get())
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted == 1)
    }
}

// ============================================================================
// Row Types
// ============================================================================

#[derive(sqlx::FromRow)]
struct TermRow {
    id: i64,
    name: String,
    slug: String,
}

impl TermRow {
    fn into_term(self) -> Term {
        Term {
            id: TermId::new(self.id),
            name: self.name,
            slug: Slug::from_db(self.slug),
        }
    }
}

#[derive(sqlx::FromRow)]
struct TitleRow {
    id: i64,
    name: String,
    year: i32,
    description: Option<String>,
    category_id: Option<i64>,
    category_name: Option<String>,
    category_slug: Option<String>,
    rating: Option<f64>,
}

impl TitleRow {
    fn into_title(self, genres: Vec<Term>) -> Title {
        let category = match (self.category_id, self.category_name, self.category_slug) {
            (Some(id), Some(name), Some(slug)) => Some(Term {
                id: TermId::new(id),
                name,
                slug: Slug::from_db(slug),
            }),
            _ => None,
        };
        Title {
            id: TitleId::new(self.id),
            name: self.name,
            year: self.year,
            description: self.description,
            category,
            genres,
            rating: self.rating,
        }
    }
}

#[derive(sqlx::FromRow)]
struct TitleGenreRow {
    title_id: i64,
    id: i64,
    name: String,
    slug: String,
}

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: i64,
    title_id: i64,
    author_id: i64,
    author: String,
    text: String,
    score: i16,
    pub_date: DateTime<Utc>,
}

impl ReviewRow {
    fn into_review(self) -> Review {
        Review {
            id: ReviewId::new(self.id),
            title_id: TitleId::new(self.title_id),
            author_id: UserId::new(self.author_id),
            author: self.author,
            text: self.text,
            score: Score::from_db(self.score),
            pub_date: self.pub_date,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CommentRow {
    id: i64,
    review_id: i64,
    author_id: i64,
    author: String,
    text: String,
    pub_date: DateTime<Utc>,
}

impl CommentRow {
    fn into_comment(self) -> Comment {
        Comment {
            id: CommentId::new(self.id),
            review_id: ReviewId::new(self.review_id),
            author_id: UserId::new(self.author_id),
            author: self.author,
            text: self.text,
            pub_date: self.pub_date,
        }
    }
}
