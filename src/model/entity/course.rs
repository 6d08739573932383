use crate::model::access::HasOwner;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

pub const DEFAULT_CURRENCY: &str = "BDT";
pub const DEFAULT_DIFFICULTY: &str = "beginner";
pub const DEFAULT_MENTOR: &str = "Admin";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Course {
    id: Uuid,
    instructor_id: Option<Uuid>,
    title: String,
    description: Option<String>,
    price: f64,
    currency: String,
    thumbnail_url: Option<String>,
    difficulty_level: String,
    duration_hours: i32,
    mentor_name: String,
    mentor_image: Option<String>,
    is_free: bool,
    is_published: bool,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct CourseCreate {
    pub title: String,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub thumbnail_url: Option<String>,
    pub difficulty_level: Option<String>,
    pub duration_hours: Option<i32>,
    pub mentor_name: Option<String>,
    pub mentor_image: Option<String>,
    /// Defaults to `true`; free courses always cost 0.
    pub is_free: Option<bool>,
    pub is_published: Option<bool>,
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct CourseUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub thumbnail_url: Option<String>,
    pub difficulty_level: Option<String>,
    pub duration_hours: Option<i32>,
    pub mentor_name: Option<String>,
    pub mentor_image: Option<String>,
    pub is_free: Option<bool>,
    pub is_published: Option<bool>,
}

impl ResourceTyped for Course {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Course
    }
}

impl Course {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn instructor_id(&self) -> Option<Uuid> {
        self.instructor_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn is_free(&self) -> bool {
        self.is_free
    }

    pub fn is_published(&self) -> bool {
        self.is_published
    }

    /// Enrollment goes through the payment gateway.
    pub fn requires_payment(&self) -> bool {
        !self.is_free && self.price > 0.0
    }

    /// Applies a partial patch in place.
    fn apply(&mut self, data: CourseUpdate) {
        if let Some(v) = data.title {
            self.title = v;
        }
        if data.description.is_some() {
            self.description = data.description;
        }
        if let Some(v) = data.price {
            self.price = v;
        }
        if let Some(v) = data.currency {
            self.currency = v;
        }
        if data.thumbnail_url.is_some() {
            self.thumbnail_url = data.thumbnail_url;
        }
        if let Some(v) = data.difficulty_level {
            self.difficulty_level = v;
        }
        if let Some(v) = data.duration_hours {
            self.duration_hours = v;
        }
        if let Some(v) = data.mentor_name {
            self.mentor_name = v;
        }
        if data.mentor_image.is_some() {
            self.mentor_image = data.mentor_image;
        }
        if let Some(v) = data.is_free {
            self.is_free = v;
        }
        if let Some(v) = data.is_published {
            self.is_published = v;
        }
        if self.is_free {
            self.price = 0.0;
        }
    }
}

#[async_trait]
impl CrudRepository<Course, CourseCreate, CourseUpdate, Uuid> for Course {
    async fn create(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        data: CourseCreate,
    ) -> DatabaseResult<Self> {
        let is_free = data.is_free.unwrap_or(true);
        let price = if is_free { 0.0 } else { data.price.unwrap_or(0.0) };

        let course = sqlx::query_as(
            r#"
            INSERT INTO courses (
                id, instructor_id, title, description, price, currency, thumbnail_url,
                difficulty_level, duration_hours, mentor_name, mentor_image, is_free, is_published
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(actor.user_id())
        .bind(&data.title)
        .bind(&data.description)
        .bind(price)
        .bind(data.currency.as_deref().unwrap_or(DEFAULT_CURRENCY))
        .bind(&data.thumbnail_url)
        .bind(data.difficulty_level.as_deref().unwrap_or(DEFAULT_DIFFICULTY))
        .bind(data.duration_hours.unwrap_or(0))
        .bind(data.mentor_name.as_deref().unwrap_or(DEFAULT_MENTOR))
        .bind(&data.mentor_image)
        .bind(is_free)
        .bind(data.is_published.unwrap_or(false))
        .fetch_one(mm.executor())
        .await?;

        Ok(course)
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: CourseUpdate,
    ) -> DatabaseResult<Self> {
        self.apply(data);

        sqlx::query(
            r#"
            UPDATE courses SET
                title = $1, description = $2, price = $3, currency = $4, thumbnail_url = $5,
                difficulty_level = $6, duration_hours = $7, mentor_name = $8, mentor_image = $9,
                is_free = $10, is_published = $11
            WHERE id = $12
            "#,
        )
        .bind(&self.title)
        .bind(&self.description)
        .bind(self.price)
        .bind(&self.currency)
        .bind(&self.thumbnail_url)
        .bind(&self.difficulty_level)
        .bind(self.duration_hours)
        .bind(&self.mentor_name)
        .bind(&self.mentor_image)
        .bind(self.is_free)
        .bind(self.is_published)
        .bind(self.id)
        .execute(mm.executor())
        .await?;

        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM courses WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM courses WHERE id = $1")
            .bind(id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    async fn list(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as(
            r#"
            SELECT * FROM courses
            WHERE $1 OR instructor_id = $2
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(actor.is_admin())
        .bind(actor.user_id())
        .bind(limit)
        .bind(offset)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM courses WHERE $1 OR instructor_id = $2")
                .bind(actor.is_admin())
                .bind(actor.user_id())
                .fetch_one(mm.executor())
                .await?;

        Ok(result)
    }
}

#[async_trait]
impl HasOwner for Course {
    type OwnerId = Option<Uuid>;

    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        Ok(self.instructor_id)
    }
}

impl Course {
    /// Instructor of the course owning `course_id`, `None` when the course is
    /// missing or orphaned.
    pub async fn instructor_of(mm: &ModelManager, course_id: Uuid) -> DatabaseResult<Option<Uuid>> {
        let result: Option<Option<Uuid>> =
            sqlx::query_scalar("SELECT instructor_id FROM courses WHERE id = $1")
                .bind(course_id)
                .fetch_optional(mm.executor())
                .await?;
        Ok(result.flatten())
    }
}

// Listing rows

/// Public catalog entry.
#[derive(Debug, Serialize, FromRow, utoipa::ToSchema)]
pub struct CourseCatalogRow {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub price: f64,
    pub currency: String,
    pub thumbnail_url: Option<String>,
    pub difficulty_level: String,
    pub duration_hours: i32,
    pub mentor_name: String,
    pub mentor_image: Option<String>,
    pub is_free: bool,
    pub created_at: DateTime<Utc>,
    pub instructor_name: Option<String>,
    pub total_enrollments: i64,
}

impl CourseCatalogRow {
    pub async fn published(mm: &ModelManager) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as(
            r#"
            SELECT
                c.id, c.title, c.description, c.price, c.currency, c.thumbnail_url,
                c.difficulty_level, c.duration_hours, c.mentor_name, c.mentor_image,
                c.is_free, c.created_at,
                u.full_name AS instructor_name,
                COUNT(e.id) FILTER (WHERE e.enrollment_status = 'active') AS total_enrollments
            FROM courses c
            LEFT JOIN users u ON u.id = c.instructor_id
            LEFT JOIN enrollments e ON e.course_id = c.id
            WHERE c.is_published
            GROUP BY c.id, u.full_name
            ORDER BY c.created_at DESC
            "#,
        )
        .fetch_all(mm.executor())
        .await?;
        Ok(rows)
    }
}

/// Management listing for the admin panel.
#[derive(Debug, Serialize, FromRow, utoipa::ToSchema)]
pub struct CourseManageRow {
    pub id: Uuid,
    pub instructor_id: Option<Uuid>,
    pub title: String,
    pub price: f64,
    pub currency: String,
    pub thumbnail_url: Option<String>,
    pub difficulty_level: String,
    pub is_free: bool,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub instructor_name: Option<String>,
    pub enrollment_count: i64,
}

impl CourseManageRow {
    /// Every course for admins, own courses for instructors.
    pub async fn visible_to(mm: &ModelManager, actor: &AuthenticatedUser) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as(
            r#"
            SELECT
                c.id, c.instructor_id, c.title, c.price, c.currency, c.thumbnail_url,
                c.difficulty_level, c.is_free, c.is_published, c.created_at,
                u.full_name AS instructor_name,
                COUNT(e.id) AS enrollment_count
            FROM courses c
            LEFT JOIN users u ON u.id = c.instructor_id
            LEFT JOIN enrollments e ON e.course_id = c.id
            WHERE $1 OR c.instructor_id = $2
            GROUP BY c.id, u.full_name
            ORDER BY c.created_at DESC
            "#,
        )
        .bind(actor.is_admin())
        .bind(actor.user_id())
        .fetch_all(mm.executor())
        .await?;
        Ok(rows)
    }
}

#[derive(Debug, Serialize, FromRow, utoipa::ToSchema)]
pub struct CourseInstructorRow {
    pub instructor_name: Option<String>,
    pub instructor_email: Option<String>,
}

impl CourseInstructorRow {
    pub async fn find(mm: &ModelManager, course: &Course) -> DatabaseResult<Self> {
        let row = sqlx::query_as(
            "SELECT full_name AS instructor_name, email AS instructor_email FROM users WHERE id = $1",
        )
        .bind(course.instructor_id)
        .fetch_optional(mm.executor())
        .await?;

        Ok(row.unwrap_or(Self {
            instructor_name: None,
            instructor_email: None,
        }))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn course(is_free: bool, price: f64) -> Course {
        Course {
            id: Uuid::new_v4(),
            instructor_id: None,
            title: "Rust".into(),
            description: None,
            price,
            currency: DEFAULT_CURRENCY.into(),
            thumbnail_url: None,
            difficulty_level: DEFAULT_DIFFICULTY.into(),
            duration_hours: 0,
            mentor_name: DEFAULT_MENTOR.into(),
            mentor_image: None,
            is_free,
            is_published: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn patch_keeps_absent_fields() {
        let mut c = course(false, 500.0);
        c.apply(CourseUpdate {
            title: Some("Advanced Rust".into()),
            ..Default::default()
        });
        assert_eq!(c.title(), "Advanced Rust");
        assert_eq!(c.price(), 500.0);
        assert!(!c.is_free());
    }

    #[test]
    fn making_course_free_zeroes_price() {
        let mut c = course(false, 500.0);
        c.apply(CourseUpdate {
            is_free: Some(true),
            ..Default::default()
        });
        assert_eq!(c.price(), 0.0);
        assert!(!c.requires_payment());
    }

    #[test]
    fn paid_course_requires_payment() {
        assert!(course(false, 10.0).requires_payment());
        assert!(!course(false, 0.0).requires_payment());
    }
}
