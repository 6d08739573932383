use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::model::{ModelManager, ResourceType, error::DatabaseResult, repo::ResourceTyped};

/// A learner activity record shaped after xAPI (actor, verb, object).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct XapiStatement {
    id: Uuid,
    student_id: Uuid,
    verb: String,
    object_type: String,
    object_id: String,
    result: serde_json::Value,
    context: serde_json::Value,
    timestamp: DateTime<Utc>,
}

#[derive(Debug)]
pub struct XapiStatementCreate {
    pub student_id: Uuid,
    pub verb: String,
    pub object_type: String,
    pub object_id: String,
    pub result: Option<serde_json::Value>,
    pub context: Option<serde_json::Value>,
}

impl ResourceTyped for XapiStatement {
    fn get_resource_type() -> ResourceType {
        ResourceType::XapiStatement
    }
}

impl XapiStatement {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn verb(&self) -> &str {
        &self.verb
    }

    pub async fn create(mm: &ModelManager, data: XapiStatementCreate) -> DatabaseResult<Self> {
        let empty = || serde_json::json!({});
        let statement = sqlx::query_as(
            r#"
            INSERT INTO xapi_statements (id, student_id, verb, object_type, object_id, result, context)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.student_id)
        .bind(&data.verb)
        .bind(&data.object_type)
        .bind(&data.object_id)
        .bind(data.result.unwrap_or_else(empty))
        .bind(data.context.unwrap_or_else(empty))
        .fetch_one(mm.executor())
        .await?;
        Ok(statement)
    }

    /// Statements of one student, newest first.
    pub async fn history(
        mm: &ModelManager,
        student_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as(
            r#"
            SELECT * FROM xapi_statements
            WHERE student_id = $1
            ORDER BY timestamp DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(student_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(mm.executor())
        .await?;
        Ok(rows)
    }
}
