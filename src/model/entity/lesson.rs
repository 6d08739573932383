use crate::model::access::{HasOwner, module_instructor};
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Lesson {
    id: Uuid,
    module_id: Uuid,
    title: String,
    content_type: String,
    content_url: Option<String>,
    content_text: Option<String>,
    duration_minutes: i32,
    order_index: i32,
    is_free: bool,
}

impl ResourceTyped for Lesson {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Lesson
    }
}

impl Lesson {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn module_id(&self) -> Uuid {
        self.module_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn is_free(&self) -> bool {
        self.is_free
    }

    pub fn order_index(&self) -> i32 {
        self.order_index
    }
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct LessonCreate {
    pub module_id: Uuid,
    pub title: String,
    /// `video`, `pdf`, `text`, ...; defaults to `text`.
    pub content_type: Option<String>,
    pub content_url: Option<String>,
    pub content_text: Option<String>,
    pub duration_minutes: Option<i32>,
    pub order_index: Option<i32>,
    pub is_free: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
pub struct LessonUpdate {
    pub title: Option<String>,
    pub content_type: Option<String>,
    pub content_url: Option<String>,
    pub content_text: Option<String>,
    pub duration_minutes: Option<i32>,
    pub order_index: Option<i32>,
    pub is_free: Option<bool>,
}

#[async_trait]
impl CrudRepository<Lesson, LessonCreate, LessonUpdate, Uuid> for Lesson {
    async fn create(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: LessonCreate,
    ) -> DatabaseResult<Self> {
        let lesson = sqlx::query_as(
            r#"
            INSERT INTO lessons (
                id, module_id, title, content_type, content_url, content_text,
                duration_minutes, order_index, is_free
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.module_id)
        .bind(&data.title)
        .bind(data.content_type.as_deref().unwrap_or("text"))
        .bind(&data.content_url)
        .bind(&data.content_text)
        .bind(data.duration_minutes.unwrap_or(0))
        .bind(data.order_index.unwrap_or(0))
        .bind(data.is_free.unwrap_or(false))
        .fetch_one(mm.executor())
        .await?;

        Ok(lesson)
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: LessonUpdate,
    ) -> DatabaseResult<Self> {
        if let Some(v) = data.title {
            self.title = v;
        }
        if let Some(v) = data.content_type {
            self.content_type = v;
        }
        if data.content_url.is_some() {
            self.content_url = data.content_url;
        }
        if data.content_text.is_some() {
            self.content_text = data.content_text;
        }
        if let Some(v) = data.duration_minutes {
            self.duration_minutes = v;
        }
        if let Some(v) = data.order_index {
            self.order_index = v;
        }
        if let Some(v) = data.is_free {
            self.is_free = v;
        }

        sqlx::query(
            r#"
            UPDATE lessons SET
                title = $1, content_type = $2, content_url = $3, content_text = $4,
                duration_minutes = $5, order_index = $6, is_free = $7
            WHERE id = $8
            "#,
        )
        .bind(&self.title)
        .bind(&self.content_type)
        .bind(&self.content_url)
        .bind(&self.content_text)
        .bind(self.duration_minutes)
        .bind(self.order_index)
        .bind(self.is_free)
        .bind(self.id)
        .execute(mm.executor())
        .await?;

        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM lessons WHERE id = $1")
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
        let result = sqlx::query_as("SELECT * FROM lessons WHERE id = $1")
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
        let result = sqlx::query_as(
            "SELECT * FROM lessons ORDER BY module_id, order_index LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM lessons")
            .fetch_one(mm.executor())
            .await?;

        Ok(result)
    }
}

#[async_trait]
impl HasOwner for Lesson {
    type OwnerId = Option<Uuid>;

    async fn get_owner_id(
        &self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        module_instructor(mm, self.module_id).await
    }
}

impl Lesson {
    /// Every lesson of a course, grouped by module order.
    pub async fn for_course(mm: &ModelManager, course_id: Uuid) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as(
            r#"
            SELECT l.*
            FROM lessons l
            JOIN modules m ON m.id = l.module_id
            WHERE m.course_id = $1
            ORDER BY m.order_index, l.order_index
            "#,
        )
        .bind(course_id)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    pub async fn course_id(&self, mm: &ModelManager) -> DatabaseResult<Uuid> {
        let id = sqlx::query_scalar("SELECT course_id FROM modules WHERE id = $1")
            .bind(self.module_id)
            .fetch_one(mm.executor())
            .await?;
        Ok(id)
    }
}
