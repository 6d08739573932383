//! Quiz scoring.
//!
//! Pure functions over already loaded questions, so the arithmetic can be
//! tested without a database.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The parts of a question needed to grade it.
#[derive(Debug, Clone)]
pub struct GradableQuestion {
    pub id: Uuid,
    pub correct_answer: String,
    pub explanation: Option<String>,
    pub points: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct QuestionFeedback {
    pub question_id: Uuid,
    pub student_answer: Option<String>,
    pub correct_answer: String,
    pub is_correct: bool,
    pub explanation: Option<String>,
    pub points_earned: i32,
}

#[derive(Debug, Clone)]
pub struct GradeReport {
    pub earned: i32,
    pub max: i32,
    /// `earned / max * 100`, zero when `max` is zero.
    pub percentage: f64,
    pub passed: bool,
    pub feedback: Vec<QuestionFeedback>,
}

pub fn grade(
    questions: &[GradableQuestion],
    answers: &HashMap<Uuid, String>,
    passing_score: i32,
) -> GradeReport {
    let mut earned = 0;
    let mut max = 0;
    let mut feedback = Vec::with_capacity(questions.len());

    for question in questions {
        max += question.points;
        let student_answer = answers.get(&question.id).cloned();
        let is_correct = student_answer.as_deref() == Some(question.correct_answer.as_str());
        let points_earned = if is_correct { question.points } else { 0 };
        earned += points_earned;

        feedback.push(QuestionFeedback {
            question_id: question.id,
            student_answer,
            correct_answer: question.correct_answer.clone(),
            is_correct,
            explanation: question.explanation.clone(),
            points_earned,
        });
    }

    let percentage = if max > 0 {
        f64::from(earned) / f64::from(max) * 100.0
    } else {
        0.0
    };
    // an empty quiz can't be passed
    let passed = max > 0 && percentage >= f64::from(passing_score);

    GradeReport {
        earned,
        max,
        percentage,
        passed,
        feedback,
    }
}

/// Rounds to `digits` decimal places.
pub fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}

#[cfg(test)]
mod test {
    use super::*;

    fn question(points: i32, answer: &str) -> GradableQuestion {
        GradableQuestion {
            id: Uuid::new_v4(),
            correct_answer: answer.to_string(),
            explanation: None,
            points,
        }
    }

    #[test]
    fn partial_score_below_threshold_fails() {
        let questions = vec![question(1, "A"), question(1, "B"), question(2, "C")];
        let mut answers = HashMap::new();
        answers.insert(questions[0].id, "A".to_string());
        answers.insert(questions[1].id, "X".to_string());
        answers.insert(questions[2].id, "C".to_string());

        let report = grade(&questions, &answers, 80);
        assert_eq!(report.earned, 3);
        assert_eq!(report.max, 4);
        assert_eq!(report.percentage, 75.0);
        assert!(!report.passed);
        assert!(!report.feedback[1].is_correct);
        assert_eq!(report.feedback[2].points_earned, 2);
    }

    #[test]
    fn threshold_is_inclusive() {
        let questions = vec![question(1, "A"), question(1, "B")];
        let mut answers = HashMap::new();
        answers.insert(questions[0].id, "A".to_string());

        let report = grade(&questions, &answers, 50);
        assert_eq!(report.percentage, 50.0);
        assert!(report.passed);
        assert_eq!(report.feedback[1].student_answer, None);
    }

    #[test]
    fn answers_must_match_exactly() {
        let questions = vec![question(1, "Paris")];
        let mut answers = HashMap::new();
        answers.insert(questions[0].id, "paris".to_string());

        let report = grade(&questions, &answers, 0);
        assert_eq!(report.earned, 0);
    }

    #[test]
    fn empty_quiz_scores_zero() {
        let report = grade(&[], &HashMap::new(), 0);
        assert_eq!(report.percentage, 0.0);
        assert!(!report.passed);
    }

    #[test]
    fn rounding() {
        assert_eq!(round_to(66.666_666, 2), 66.67);
        assert_eq!(round_to(4.25, 1), 4.3);
        assert_eq!(round_to(49.5, 0), 50.0);
    }
}
