use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::entity::{Course, LearningProgress, Lesson, Module, Quiz};

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ModuleContent {
    #[serde(flatten)]
    pub module: Module,
    pub lessons: Vec<Lesson>,
    pub quizzes: Vec<Quiz>,
}

impl ModuleContent {
    /// Distributes lessons and quizzes over their modules, keeping module order.
    pub fn group(modules: Vec<Module>, lessons: Vec<Lesson>, quizzes: Vec<Quiz>) -> Vec<Self> {
        let mut grouped: Vec<Self> = modules
            .into_iter()
            .map(|module| Self {
                module,
                lessons: vec![],
                quizzes: vec![],
            })
            .collect();

        for lesson in lessons {
            if let Some(m) = grouped.iter_mut().find(|m| m.module.id() == lesson.module_id()) {
                m.lessons.push(lesson);
            }
        }
        for quiz in quizzes {
            if let Some(m) = grouped.iter_mut().find(|m| m.module.id() == quiz.module_id()) {
                m.quizzes.push(quiz);
            }
        }
        for m in grouped.iter_mut() {
            m.lessons.sort_by_key(|l| l.order_index());
        }

        grouped
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CourseDetail {
    #[serde(flatten)]
    pub course: Course,
    pub instructor_name: Option<String>,
    pub instructor_email: Option<String>,
    pub modules: Vec<ModuleContent>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct LessonView {
    #[serde(flatten)]
    pub lesson: Lesson,
    pub course_id: Uuid,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct EnrollResponse {
    pub enrollment_id: Uuid,
    pub enrollment_status: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ProgressBody {
    pub lesson_id: Uuid,
    pub progress_percentage: f64,
    pub last_position_seconds: Option<i32>,
    pub time_spent_seconds: Option<i32>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ProgressResponse {
    pub lesson_progress: LearningProgress,
    /// Course progress in percent, two decimals.
    pub overall_progress: f64,
}
