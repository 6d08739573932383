use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::model::{ModelManager, ResourceType, error::DatabaseResult, repo::ResourceTyped};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct DiscussionReply {
    id: Uuid,
    discussion_id: Uuid,
    user_id: Uuid,
    content: String,
    is_instructor_reply: bool,
    created_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct DiscussionReplyCreate {
    pub discussion_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub is_instructor_reply: bool,
}

impl ResourceTyped for DiscussionReply {
    fn get_resource_type() -> ResourceType {
        ResourceType::DiscussionReply
    }
}

impl DiscussionReply {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_instructor_reply(&self) -> bool {
        self.is_instructor_reply
    }

    pub async fn create(mm: &ModelManager, data: DiscussionReplyCreate) -> DatabaseResult<Self> {
        let reply = sqlx::query_as(
            r#"
            INSERT INTO discussion_replies (id, discussion_id, user_id, content, is_instructor_reply)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.discussion_id)
        .bind(data.user_id)
        .bind(&data.content)
        .bind(data.is_instructor_reply)
        .fetch_one(mm.executor())
        .await?;
        Ok(reply)
    }
}

#[derive(Debug, Serialize, FromRow, utoipa::ToSchema)]
pub struct DiscussionReplyRow {
    pub id: Uuid,
    pub discussion_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub is_instructor_reply: bool,
    pub created_at: DateTime<Utc>,
    pub author_name: String,
    pub author_role: String,
}

impl DiscussionReplyRow {
    /// Replies oldest first.
    pub async fn for_discussion(mm: &ModelManager, discussion_id: Uuid) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as(
            r#"
            SELECT
                r.id, r.discussion_id, r.user_id, r.content, r.is_instructor_reply, r.created_at,
                u.full_name AS author_name, u.role AS author_role
            FROM discussion_replies r
            JOIN users u ON u.id = r.user_id
            WHERE r.discussion_id = $1
            ORDER BY r.created_at ASC
            "#,
        )
        .bind(discussion_id)
        .fetch_all(mm.executor())
        .await?;
        Ok(rows)
    }
}
