use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::model::{
    ModelManager, ResourceType, error::DatabaseResult, grading::GradableQuestion,
    repo::ResourceTyped,
};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct QuizQuestion {
    id: Uuid,
    quiz_id: Uuid,
    question_text: String,
    question_type: String,
    options: serde_json::Value,
    correct_answer: String,
    explanation: Option<String>,
    points: i32,
    order_index: i32,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct QuizQuestionCreate {
    pub quiz_id: Uuid,
    pub question_text: String,
    /// Defaults to `multiple_choice`.
    pub question_type: Option<String>,
    pub options: Option<serde_json::Value>,
    pub correct_answer: String,
    pub explanation: Option<String>,
    pub points: Option<i32>,
    pub order_index: Option<i32>,
}

/// A question as shown to a student, without its answer.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct QuizQuestionPublic {
    pub id: Uuid,
    pub question_text: String,
    pub question_type: String,
    pub options: serde_json::Value,
    pub points: i32,
    pub order_index: i32,
}

impl From<QuizQuestion> for QuizQuestionPublic {
    fn from(q: QuizQuestion) -> Self {
        Self {
            id: q.id,
            question_text: q.question_text,
            question_type: q.question_type,
            options: q.options,
            points: q.points,
            order_index: q.order_index,
        }
    }
}

impl From<QuizQuestion> for GradableQuestion {
    fn from(q: QuizQuestion) -> Self {
        Self {
            id: q.id,
            correct_answer: q.correct_answer,
            explanation: q.explanation,
            points: q.points,
        }
    }
}

impl ResourceTyped for QuizQuestion {
    fn get_resource_type() -> ResourceType {
        ResourceType::QuizQuestion
    }
}

impl QuizQuestion {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub async fn create(mm: &ModelManager, data: QuizQuestionCreate) -> DatabaseResult<Self> {
        let options = data.options.unwrap_or_else(|| serde_json::json!([]));
        let question = sqlx::query_as(
            r#"
            INSERT INTO quiz_questions (
                id, quiz_id, question_text, question_type, options,
                correct_answer, explanation, points, order_index
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.quiz_id)
        .bind(&data.question_text)
        .bind(data.question_type.as_deref().unwrap_or("multiple_choice"))
        .bind(options)
        .bind(&data.correct_answer)
        .bind(&data.explanation)
        .bind(data.points.unwrap_or(1))
        .bind(data.order_index.unwrap_or(0))
        .fetch_one(mm.executor())
        .await?;
        Ok(question)
    }

    pub async fn for_quiz(mm: &ModelManager, quiz_id: Uuid) -> DatabaseResult<Vec<Self>> {
        let result =
            sqlx::query_as("SELECT * FROM quiz_questions WHERE quiz_id = $1 ORDER BY order_index")
                .bind(quiz_id)
                .fetch_all(mm.executor())
                .await?;
        Ok(result)
    }
}
