use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::model::{
    ModelManager, ResourceType, access::HasOwner, error::DatabaseResult, repo::ResourceTyped,
};
use crate::web::AuthenticatedUser;

pub const DEFAULT_PASSING_SCORE: i32 = 70;
pub const DEFAULT_TIME_LIMIT_MINUTES: i32 = 30;
pub const DEFAULT_MAX_ATTEMPTS: i32 = 3;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Quiz {
    id: Uuid,
    module_id: Uuid,
    title: String,
    description: Option<String>,
    passing_score: i32,
    time_limit_minutes: i32,
    max_attempts: i32,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct QuizCreate {
    pub module_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub passing_score: Option<i32>,
    pub time_limit_minutes: Option<i32>,
    pub max_attempts: Option<i32>,
}

impl ResourceTyped for Quiz {
    fn get_resource_type() -> ResourceType {
        ResourceType::Quiz
    }
}

impl Quiz {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn module_id(&self) -> Uuid {
        self.module_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn passing_score(&self) -> i32 {
        self.passing_score
    }

    pub fn max_attempts(&self) -> i32 {
        self.max_attempts
    }

    pub async fn create(mm: &ModelManager, data: QuizCreate) -> DatabaseResult<Self> {
        let quiz = sqlx::query_as(
            r#"
            INSERT INTO quizzes (id, module_id, title, description, passing_score, time_limit_minutes, max_attempts)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.module_id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.passing_score.unwrap_or(DEFAULT_PASSING_SCORE))
        .bind(data.time_limit_minutes.unwrap_or(DEFAULT_TIME_LIMIT_MINUTES))
        .bind(data.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS))
        .fetch_one(mm.executor())
        .await?;
        Ok(quiz)
    }

    pub async fn find_by_id(mm: &ModelManager, id: Uuid) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM quizzes WHERE id = $1")
            .bind(id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    pub async fn for_course(mm: &ModelManager, course_id: Uuid) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as(
            r#"
            SELECT q.*
            FROM quizzes q
            JOIN modules m ON m.id = q.module_id
            WHERE m.course_id = $1
            ORDER BY m.order_index, q.title
            "#,
        )
        .bind(course_id)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }

    /// `(course id, course instructor)` the quiz belongs to.
    pub async fn course_of(&self, mm: &ModelManager) -> DatabaseResult<(Uuid, Option<Uuid>)> {
        let row = sqlx::query_as(
            r#"
            SELECT c.id, c.instructor_id
            FROM modules m
            JOIN courses c ON c.id = m.course_id
            WHERE m.id = $1
            "#,
        )
        .bind(self.module_id)
        .fetch_one(mm.executor())
        .await?;
        Ok(row)
    }
}

#[async_trait]
impl HasOwner for Quiz {
    type OwnerId = Option<Uuid>;

    async fn get_owner_id(
        &self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        let (_, instructor) = self.course_of(mm).await?;
        Ok(instructor)
    }
}
