use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::model::{ModelManager, ResourceType, error::DatabaseResult, repo::ResourceTyped};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct QuizAttempt {
    id: Uuid,
    quiz_id: Uuid,
    student_id: Uuid,
    score: f64,
    max_score: f64,
    passed: bool,
    answers: serde_json::Value,
    time_taken_seconds: Option<i32>,
    attempt_number: i32,
    completed_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct QuizAttemptCreate {
    pub quiz_id: Uuid,
    pub student_id: Uuid,
    /// Percentage score.
    pub score: f64,
    pub passed: bool,
    pub answers: serde_json::Value,
    pub time_taken_seconds: Option<i32>,
    pub attempt_number: i32,
}

impl ResourceTyped for QuizAttempt {
    fn get_resource_type() -> ResourceType {
        ResourceType::QuizAttempt
    }
}

impl QuizAttempt {
    pub fn attempt_number(&self) -> i32 {
        self.attempt_number
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn passed(&self) -> bool {
        self.passed
    }

    pub async fn create(mm: &ModelManager, data: QuizAttemptCreate) -> DatabaseResult<Self> {
        let attempt = sqlx::query_as(
            r#"
            INSERT INTO quiz_attempts (
                id, quiz_id, student_id, score, max_score, passed, answers,
                time_taken_seconds, attempt_number
            )
            VALUES ($1, $2, $3, $4, 100, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.quiz_id)
        .bind(data.student_id)
        .bind(data.score)
        .bind(data.passed)
        .bind(data.answers)
        .bind(data.time_taken_seconds)
        .bind(data.attempt_number)
        .fetch_one(mm.executor())
        .await?;
        Ok(attempt)
    }

    pub async fn count_for(mm: &ModelManager, quiz_id: Uuid, student_id: Uuid) -> DatabaseResult<i64> {
        let count = sqlx::query_scalar(
            "SELECT COUNT(*) FROM quiz_attempts WHERE quiz_id = $1 AND student_id = $2",
        )
        .bind(quiz_id)
        .bind(student_id)
        .fetch_one(mm.executor())
        .await?;
        Ok(count)
    }

    /// Attempts of one student, latest first.
    pub async fn list_for(
        mm: &ModelManager,
        quiz_id: Uuid,
        student_id: Uuid,
    ) -> DatabaseResult<Vec<Self>> {
        let result = sqlx::query_as(
            r#"
            SELECT * FROM quiz_attempts
            WHERE quiz_id = $1 AND student_id = $2
            ORDER BY attempt_number DESC
            "#,
        )
        .bind(quiz_id)
        .bind(student_id)
        .fetch_all(mm.executor())
        .await?;
        Ok(result)
    }
}
