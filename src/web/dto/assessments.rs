use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{
    entity::{Quiz, QuizQuestionPublic},
    grading::QuestionFeedback,
};

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct QuizView {
    #[serde(flatten)]
    pub quiz: Quiz,
    pub questions: Vec<QuizQuestionPublic>,
    pub attempts_count: i64,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SubmitBody {
    /// question id -> submitted answer
    pub answers: HashMap<Uuid, String>,
    pub time_taken_seconds: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SubmitResult {
    pub score: f64,
    pub passing_score: i32,
    pub passed: bool,
    pub feedback: Vec<QuestionFeedback>,
    pub attempt_number: i32,
    pub remaining_attempts: i32,
}
