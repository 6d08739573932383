use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::model::{ModelManager, ResourceType, error::DatabaseResult, repo::ResourceTyped};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct LearningProgress {
    id: Uuid,
    student_id: Uuid,
    lesson_id: Uuid,
    enrollment_id: Uuid,
    progress_percentage: f64,
    last_position_seconds: i32,
    time_spent_seconds: i32,
    is_completed: bool,
    completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug)]
pub struct LearningProgressUpsert {
    pub student_id: Uuid,
    pub lesson_id: Uuid,
    pub enrollment_id: Uuid,
    pub progress_percentage: f64,
    pub last_position_seconds: i32,
    /// Added to the stored total.
    pub time_spent_seconds: i32,
}

impl ResourceTyped for LearningProgress {
    fn get_resource_type() -> ResourceType {
        ResourceType::LearningProgress
    }
}

impl LearningProgress {
    pub async fn upsert(mm: &ModelManager, data: LearningProgressUpsert) -> DatabaseResult<Self> {
        let is_completed = data.progress_percentage >= 100.0;
        let result = sqlx::query_as(
            r#"
            INSERT INTO learning_progress (
                id, student_id, lesson_id, enrollment_id, progress_percentage,
                last_position_seconds, time_spent_seconds, is_completed, completed_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, CASE WHEN $8 THEN now() END)
            ON CONFLICT (student_id, lesson_id) DO UPDATE SET
                progress_percentage = EXCLUDED.progress_percentage,
                last_position_seconds = EXCLUDED.last_position_seconds,
                time_spent_seconds = learning_progress.time_spent_seconds + EXCLUDED.time_spent_seconds,
                is_completed = EXCLUDED.is_completed,
                completed_at = COALESCE(learning_progress.completed_at, EXCLUDED.completed_at)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.student_id)
        .bind(data.lesson_id)
        .bind(data.enrollment_id)
        .bind(data.progress_percentage)
        .bind(data.last_position_seconds)
        .bind(data.time_spent_seconds)
        .bind(is_completed)
        .fetch_one(mm.executor())
        .await?;
        Ok(result)
    }

    /// `(total lessons, completed lessons)` of a course for one student.
    pub async fn course_completion(
        mm: &ModelManager,
        student_id: Uuid,
        course_id: Uuid,
    ) -> DatabaseResult<(i64, i64)> {
        let counts = sqlx::query_as(
            r#"
            SELECT
                COUNT(l.id) AS total,
                COUNT(lp.id) FILTER (WHERE lp.is_completed) AS completed
            FROM lessons l
            JOIN modules m ON m.id = l.module_id
            LEFT JOIN learning_progress lp ON lp.lesson_id = l.id AND lp.student_id = $1
            WHERE m.course_id = $2
            "#,
        )
        .bind(student_id)
        .bind(course_id)
        .fetch_one(mm.executor())
        .await?;
        Ok(counts)
    }
}

/// Course progress in percent, zero for a course without lessons.
pub fn completion_percentage(total: i64, completed: i64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    completed as f64 / total as f64 * 100.0
}
