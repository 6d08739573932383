use crate::model::access::HasOwner;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

pub fn is_valid_rating(rating: i32) -> bool {
    (MIN_RATING..=MAX_RATING).contains(&rating)
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Review {
    id: Uuid,
    course_id: Uuid,
    user_id: Uuid,
    rating: i32,
    review_text: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct ReviewCreate {
    pub course_id: Uuid,
    pub rating: i32,
    pub review_text: Option<String>,
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct ReviewUpdate {
    pub rating: Option<i32>,
    pub review_text: Option<String>,
}

impl ResourceTyped for Review {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Review
    }
}

impl Review {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn rating(&self) -> i32 {
        self.rating
    }

    pub fn review_text(&self) -> Option<&str> {
        self.review_text.as_deref()
    }
}

#[async_trait]
impl CrudRepository<Review, ReviewCreate, ReviewUpdate, Uuid> for Review {
    async fn create(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        data: ReviewCreate,
    ) -> DatabaseResult<Self> {
        let review = sqlx::query_as(
            r#"
            INSERT INTO reviews (id, course_id, user_id, rating, review_text)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.course_id)
        .bind(actor.user_id())
        .bind(data.rating)
        .bind(&data.review_text)
        .fetch_one(mm.executor())
        .await?;
        Ok(review)
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: ReviewUpdate,
    ) -> DatabaseResult<Self> {
        if let Some(rating) = data.rating {
            self.rating = rating;
        }
        if data.review_text.is_some() {
            self.review_text = data.review_text;
        }
        self.updated_at = Utc::now();

        sqlx::query("UPDATE reviews SET rating = $1, review_text = $2, updated_at = $3 WHERE id = $4")
            .bind(self.rating)
            .bind(&self.review_text)
            .bind(self.updated_at)
            .bind(self.id)
            .execute(mm.executor())
            .await?;

        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(self.id)
            .execute(mm.executor())
            .await?;
        Ok(())
    }

    async fn find_by_id(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM reviews WHERE id = $1")
            .bind(id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    async fn list(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let result =
            sqlx::query_as("SELECT * FROM reviews ORDER BY created_at DESC LIMIT $1 OFFSET $2")
                .bind(limit)
                .bind(offset)
                .fetch_all(mm.executor())
                .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reviews")
            .fetch_one(mm.executor())
            .await?;
        Ok(result)
    }
}

#[async_trait]
impl HasOwner for Review {
    type OwnerId = Uuid;

    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        Ok(self.user_id)
    }
}

impl Review {
    pub async fn find_for(
        mm: &ModelManager,
        course_id: Uuid,
        user_id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM reviews WHERE course_id = $1 AND user_id = $2")
            .bind(course_id)
            .bind(user_id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    /// `(average rating, review count)`; the average is `None` without reviews.
    pub async fn stats(mm: &ModelManager, course_id: Uuid) -> DatabaseResult<(Option<f64>, i64)> {
        let stats = sqlx::query_as(
            "SELECT AVG(rating)::float8, COUNT(*) FROM reviews WHERE course_id = $1",
        )
        .bind(course_id)
        .fetch_one(mm.executor())
        .await?;
        Ok(stats)
    }
}

/// Review with its author.
#[derive(Debug, Serialize, FromRow, utoipa::ToSchema)]
pub struct ReviewRow {
    pub id: Uuid,
    pub course_id: Uuid,
    pub user_id: Uuid,
    pub rating: i32,
    pub review_text: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user_name: String,
    pub user_avatar: Option<String>,
}

impl ReviewRow {
    pub async fn for_course(mm: &ModelManager, course_id: Uuid) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as(
            r#"
            SELECT
                r.id, r.course_id, r.user_id, r.rating, r.review_text, r.created_at, r.updated_at,
                u.full_name AS user_name, u.avatar_url AS user_avatar
            FROM reviews r
            JOIN users u ON u.id = r.user_id
            WHERE r.course_id = $1
            ORDER BY r.created_at DESC
            "#,
        )
        .bind(course_id)
        .fetch_all(mm.executor())
        .await?;
        Ok(rows)
    }
}

/// Highly rated review for the landing page.
#[derive(Debug, Serialize, FromRow, utoipa::ToSchema)]
pub struct RecentReviewRow {
    pub id: Uuid,
    pub rating: i32,
    pub review_text: Option<String>,
    pub created_at: DateTime<Utc>,
    pub user_name: String,
    pub user_avatar: Option<String>,
    pub course_id: Uuid,
    pub course_title: String,
}

impl RecentReviewRow {
    pub async fn top_recent(mm: &ModelManager, limit: i64) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as(
            r#"
            SELECT
                r.id, r.rating, r.review_text, r.created_at,
                u.full_name AS user_name, u.avatar_url AS user_avatar,
                c.id AS course_id, c.title AS course_title
            FROM reviews r
            JOIN users u ON u.id = r.user_id
            JOIN courses c ON c.id = r.course_id
            WHERE r.rating >= 4
            ORDER BY r.created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(mm.executor())
        .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rating_bounds() {
        assert!(!is_valid_rating(0));
        assert!(is_valid_rating(1));
        assert!(is_valid_rating(5));
        assert!(!is_valid_rating(6));
    }
}
