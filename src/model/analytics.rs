//! Aggregate queries behind the dashboards.

use serde::Serialize;
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::model::{ModelManager, error::DatabaseResult};

/// Platform totals, optionally narrowed to one instructor's courses.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlatformStats {
    pub total_students: i64,
    pub total_revenue: f64,
    /// Mean enrollment progress rounded to a whole percent.
    pub avg_completion_rate: i64,
}

impl PlatformStats {
    pub async fn fetch(mm: &ModelManager, instructor: Option<Uuid>) -> DatabaseResult<Self> {
        let (total_students, total_revenue, avg_progress) = match instructor {
            None => tokio::try_join!(
                fetch_i64(mm, "SELECT COUNT(*) FROM users WHERE role = 'student'", None),
                fetch_f64(
                    mm,
                    "SELECT COALESCE(SUM(amount), 0)::float8 FROM transactions WHERE payment_status = 'success'",
                    None,
                ),
                fetch_f64(
                    mm,
                    "SELECT COALESCE(AVG(progress_percentage), 0)::float8 FROM enrollments",
                    None,
                ),
            )?,
            Some(id) => tokio::try_join!(
                fetch_i64(
                    mm,
                    r#"
                    SELECT COUNT(DISTINCT e.student_id)
                    FROM enrollments e JOIN courses c ON c.id = e.course_id
                    WHERE c.instructor_id = $1
                    "#,
                    Some(id),
                ),
                fetch_f64(
                    mm,
                    r#"
                    SELECT COALESCE(SUM(t.amount), 0)::float8
                    FROM transactions t JOIN courses c ON c.id = t.course_id
                    WHERE t.payment_status = 'success' AND c.instructor_id = $1
                    "#,
                    Some(id),
                ),
                fetch_f64(
                    mm,
                    r#"
                    SELECT COALESCE(AVG(e.progress_percentage), 0)::float8
                    FROM enrollments e JOIN courses c ON c.id = e.course_id
                    WHERE c.instructor_id = $1
                    "#,
                    Some(id),
                ),
            )?,
        };

        Ok(Self {
            total_students,
            total_revenue,
            avg_completion_rate: avg_progress.round() as i64,
        })
    }
}

async fn fetch_i64(mm: &ModelManager, sql: &str, id: Option<Uuid>) -> DatabaseResult<i64> {
    let mut query = sqlx::query_scalar::<_, i64>(sql);
    if let Some(id) = id {
        query = query.bind(id);
    }
    Ok(query.fetch_one(mm.executor()).await?)
}

async fn fetch_f64(mm: &ModelManager, sql: &str, id: Option<Uuid>) -> DatabaseResult<f64> {
    let mut query = sqlx::query_scalar::<_, f64>(sql);
    if let Some(id) = id {
        query = query.bind(id);
    }
    Ok(query.fetch_one(mm.executor()).await?)
}

#[derive(Debug, Serialize, FromRow, utoipa::ToSchema)]
pub struct EnrollmentStats {
    pub total_enrollments: i64,
    pub active_enrollments: i64,
    pub completed_enrollments: i64,
    pub average_progress: Option<f64>,
}

#[derive(Debug, Serialize, FromRow, utoipa::ToSchema)]
pub struct EngagementStats {
    /// Active enrollments accessed within the last week.
    pub active_last_7_days: i64,
}

#[derive(Debug, Serialize, FromRow, utoipa::ToSchema)]
pub struct ModuleCompletion {
    pub module_id: Uuid,
    pub title: String,
    pub total_lessons: i64,
    pub completed_lessons: i64,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CourseAnalytics {
    pub enrollments: EnrollmentStats,
    pub engagement: EngagementStats,
    pub modules: Vec<ModuleCompletion>,
}

impl CourseAnalytics {
    pub async fn fetch(mm: &ModelManager, course_id: Uuid) -> DatabaseResult<Self> {
        let enrollments = sqlx::query_as::<_, EnrollmentStats>(
            r#"
            SELECT
                COUNT(*) AS total_enrollments,
                COUNT(*) FILTER (WHERE enrollment_status = 'active') AS active_enrollments,
                COUNT(*) FILTER (WHERE enrollment_status = 'completed') AS completed_enrollments,
                AVG(progress_percentage)::float8 AS average_progress
            FROM enrollments
            WHERE course_id = $1
            "#,
        )
        .bind(course_id)
        .fetch_one(mm.executor());

        let engagement = sqlx::query_as::<_, EngagementStats>(
            r#"
            SELECT COUNT(*) AS active_last_7_days
            FROM enrollments
            WHERE course_id = $1
              AND enrollment_status = 'active'
              AND last_accessed >= now() - INTERVAL '7 days'
            "#,
        )
        .bind(course_id)
        .fetch_one(mm.executor());

        let modules = sqlx::query_as::<_, ModuleCompletion>(
            r#"
            SELECT
                m.id AS module_id,
                m.title,
                COUNT(DISTINCT l.id) AS total_lessons,
                COUNT(DISTINCT lp.lesson_id) FILTER (WHERE lp.is_completed) AS completed_lessons
            FROM modules m
            LEFT JOIN lessons l ON l.module_id = m.id
            LEFT JOIN learning_progress lp ON lp.lesson_id = l.id
            WHERE m.course_id = $1
            GROUP BY m.id, m.title, m.order_index
            ORDER BY m.order_index
            "#,
        )
        .bind(course_id)
        .fetch_all(mm.executor());

        let (enrollments, engagement, modules) = tokio::try_join!(enrollments, engagement, modules)?;

        Ok(Self {
            enrollments,
            engagement,
            modules,
        })
    }
}
