use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::model::{ModelManager, ResourceType, error::DatabaseResult, repo::ResourceTyped};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollmentStatus {
    /// Waiting for a payment to clear.
    OnHold,
    Active,
    Completed,
    Cancelled,
}

impl EnrollmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OnHold => "on_hold",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether the student may read lessons and take quizzes.
    pub fn grants_access(&self) -> bool {
        matches!(self, Self::Active | Self::Completed)
    }
}

impl From<&str> for EnrollmentStatus {
    fn from(value: &str) -> Self {
        match value {
            "active" => Self::Active,
            "completed" => Self::Completed,
            "cancelled" => Self::Cancelled,
            _ => Self::OnHold,
        }
    }
}

impl std::fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Enrollment {
    id: Uuid,
    student_id: Uuid,
    course_id: Uuid,
    enrollment_status: String,
    progress_percentage: f64,
    enrollment_date: DateTime<Utc>,
    last_accessed: DateTime<Utc>,
}

impl ResourceTyped for Enrollment {
    fn get_resource_type() -> ResourceType {
        ResourceType::Enrollment
    }
}

impl Enrollment {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn course_id(&self) -> Uuid {
        self.course_id
    }

    pub fn status(&self) -> EnrollmentStatus {
        EnrollmentStatus::from(self.enrollment_status.as_str())
    }

    pub async fn find(
        mm: &ModelManager,
        student_id: Uuid,
        course_id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result =
            sqlx::query_as("SELECT * FROM enrollments WHERE student_id = $1 AND course_id = $2")
                .bind(student_id)
                .bind(course_id)
                .fetch_optional(mm.executor())
                .await?;
        Ok(result)
    }

    /// True when the student has an `active` or `completed` enrollment.
    pub async fn grants_access(
        mm: &ModelManager,
        student_id: Uuid,
        course_id: Uuid,
    ) -> DatabaseResult<bool> {
        let found = Self::find(mm, student_id, course_id).await?;
        Ok(found.is_some_and(|e| e.status().grants_access()))
    }

    /// Returns the existing enrollment or creates an `on_hold` one.
    pub async fn hold(mm: &ModelManager, student_id: Uuid, course_id: Uuid) -> DatabaseResult<Self> {
        let result = sqlx::query_as(
            r#"
            INSERT INTO enrollments (id, student_id, course_id, enrollment_status)
            VALUES ($1, $2, $3, 'on_hold')
            ON CONFLICT (student_id, course_id) DO UPDATE SET last_accessed = now()
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(student_id)
        .bind(course_id)
        .fetch_one(mm.executor())
        .await?;
        Ok(result)
    }

    /// Creates the enrollment as `active`, or activates an existing one.
    pub async fn activate_for(
        mm: &ModelManager,
        student_id: Uuid,
        course_id: Uuid,
    ) -> DatabaseResult<Self> {
        let result = sqlx::query_as(
            r#"
            INSERT INTO enrollments (id, student_id, course_id, enrollment_status)
            VALUES ($1, $2, $3, 'active')
            ON CONFLICT (student_id, course_id)
            DO UPDATE SET enrollment_status = 'active', last_accessed = now()
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(student_id)
        .bind(course_id)
        .fetch_one(mm.executor())
        .await?;
        Ok(result)
    }

    pub async fn activate(mm: &ModelManager, id: Uuid) -> DatabaseResult<()> {
        sqlx::query(
            "UPDATE enrollments SET enrollment_status = 'active', last_accessed = now() WHERE id = $1",
        )
        .bind(id)
        .execute(mm.executor())
        .await?;
        Ok(())
    }

    pub async fn touch(&self, mm: &ModelManager) -> DatabaseResult<()> {
        sqlx::query("UPDATE enrollments SET last_accessed = now() WHERE id = $1")
            .bind(self.id)
            .execute(mm.executor())
            .await?;
        Ok(())
    }

    /// Stores the course progress; reaching 100% completes the enrollment.
    pub async fn set_progress(mut self, mm: &ModelManager, percentage: f64) -> DatabaseResult<Self> {
        if percentage >= 100.0 {
            self.enrollment_status = EnrollmentStatus::Completed.to_string();
        }

        sqlx::query(
            "UPDATE enrollments SET progress_percentage = $1, enrollment_status = $2 WHERE id = $3",
        )
        .bind(percentage)
        .bind(&self.enrollment_status)
        .bind(self.id)
        .execute(mm.executor())
        .await?;

        self.progress_percentage = percentage;
        Ok(self)
    }
}

/// Enrollment joined with its course, for the learner dashboard.
#[derive(Debug, Serialize, FromRow, utoipa::ToSchema)]
pub struct MyCourseRow {
    pub enrollment_id: Uuid,
    pub enrollment_status: String,
    pub progress_percentage: f64,
    pub enrollment_date: DateTime<Utc>,
    pub last_accessed: DateTime<Utc>,
    pub course_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub difficulty_level: String,
    pub duration_hours: i32,
    pub instructor_name: Option<String>,
}

impl MyCourseRow {
    pub async fn for_student(mm: &ModelManager, student_id: Uuid) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as(
            r#"
            SELECT
                e.id AS enrollment_id, e.enrollment_status, e.progress_percentage,
                e.enrollment_date, e.last_accessed,
                c.id AS course_id, c.title, c.description, c.thumbnail_url,
                c.difficulty_level, c.duration_hours,
                u.full_name AS instructor_name
            FROM enrollments e
            JOIN courses c ON c.id = e.course_id
            LEFT JOIN users u ON u.id = c.instructor_id
            WHERE e.student_id = $1 AND e.enrollment_status IN ('active', 'completed')
            ORDER BY e.last_accessed DESC
            "#,
        )
        .bind(student_id)
        .fetch_all(mm.executor())
        .await?;
        Ok(rows)
    }
}

/// Student listing for a course roster.
#[derive(Debug, Serialize, FromRow, utoipa::ToSchema)]
pub struct CourseStudentRow {
    pub user_id: Uuid,
    pub full_name: String,
    pub email: String,
    pub enrollment_status: String,
    pub progress_percentage: f64,
    pub enrollment_date: DateTime<Utc>,
    pub last_accessed: DateTime<Utc>,
}

impl CourseStudentRow {
    pub async fn for_course(mm: &ModelManager, course_id: Uuid) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as(
            r#"
            SELECT
                u.id AS user_id, u.full_name, u.email,
                e.enrollment_status, e.progress_percentage, e.enrollment_date, e.last_accessed
            FROM enrollments e
            JOIN users u ON u.id = e.student_id
            WHERE e.course_id = $1
            ORDER BY e.enrollment_date DESC
            "#,
        )
        .bind(course_id)
        .fetch_all(mm.executor())
        .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn status_access_rules() {
        assert!(EnrollmentStatus::Active.grants_access());
        assert!(EnrollmentStatus::Completed.grants_access());
        assert!(!EnrollmentStatus::OnHold.grants_access());
        assert!(!EnrollmentStatus::Cancelled.grants_access());
    }

    #[test]
    fn status_text_mapping() {
        for status in [
            EnrollmentStatus::OnHold,
            EnrollmentStatus::Active,
            EnrollmentStatus::Completed,
            EnrollmentStatus::Cancelled,
        ] {
            assert_eq!(EnrollmentStatus::from(status.as_str()), status);
        }
        assert_eq!(EnrollmentStatus::from("garbage"), EnrollmentStatus::OnHold);
    }
}
