use crate::model::access::{HasOwner, module_instructor};
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Discussion {
    id: Uuid,
    module_id: Uuid,
    user_id: Uuid,
    title: String,
    content: String,
    is_qa: bool,
    is_resolved: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct DiscussionCreate {
    pub module_id: Uuid,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub is_qa: bool,
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct DiscussionUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub is_qa: Option<bool>,
}

impl ResourceTyped for Discussion {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Discussion
    }
}

impl Discussion {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn module_id(&self) -> Uuid {
        self.module_id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn is_resolved(&self) -> bool {
        self.is_resolved
    }
}

#[async_trait]
impl CrudRepository<Discussion, DiscussionCreate, DiscussionUpdate, Uuid> for Discussion {
    async fn create(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        data: DiscussionCreate,
    ) -> DatabaseResult<Self> {
        let discussion = sqlx::query_as(
            r#"
            INSERT INTO discussions (id, module_id, user_id, title, content, is_qa)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.module_id)
        .bind(actor.user_id())
        .bind(&data.title)
        .bind(&data.content)
        .bind(data.is_qa)
        .fetch_one(mm.executor())
        .await?;
        Ok(discussion)
    }

    async fn update(
        mut self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: DiscussionUpdate,
    ) -> DatabaseResult<Self> {
        if let Some(title) = data.title {
            self.title = title;
        }
        if let Some(content) = data.content {
            self.content = content;
        }
        if let Some(is_qa) = data.is_qa {
            self.is_qa = is_qa;
        }
        self.updated_at = Utc::now();

        sqlx::query(
            "UPDATE discussions SET title = $1, content = $2, is_qa = $3, updated_at = $4 WHERE id = $5",
        )
        .bind(&self.title)
        .bind(&self.content)
        .bind(self.is_qa)
        .bind(self.updated_at)
        .bind(self.id)
        .execute(mm.executor())
        .await?;

        Ok(self)
    }

    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("DELETE FROM discussions WHERE id = $1")
            .bind(self.id)
            .execute(mm.executor())
            .await?;
        Ok(())
    }

    async fn find_by_id(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM discussions WHERE id = $1")
            .bind(id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    async fn list(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let result =
            sqlx::query_as("SELECT * FROM discussions ORDER BY created_at DESC LIMIT $1 OFFSET $2")
                .bind(limit)
                .bind(offset)
                .fetch_all(mm.executor())
                .await?;
        Ok(result)
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        let result: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM discussions")
            .fetch_one(mm.executor())
            .await?;
        Ok(result)
    }
}

#[async_trait]
impl HasOwner for Discussion {
    type OwnerId = Uuid;

    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        Ok(self.user_id)
    }
}

impl Discussion {
    /// Instructor of the course the discussion's module belongs to.
    pub async fn course_instructor(&self, mm: &ModelManager) -> DatabaseResult<Option<Uuid>> {
        module_instructor(mm, self.module_id).await
    }

    pub async fn resolve(mut self, mm: &ModelManager) -> DatabaseResult<Self> {
        self.is_resolved = true;
        self.updated_at = Utc::now();
        sqlx::query("UPDATE discussions SET is_resolved = TRUE, updated_at = $1 WHERE id = $2")
            .bind(self.updated_at)
            .bind(self.id)
            .execute(mm.executor())
            .await?;
        Ok(self)
    }
}

/// Discussion with its author and reply count.
#[derive(Debug, Serialize, FromRow, utoipa::ToSchema)]
pub struct DiscussionRow {
    pub id: Uuid,
    pub module_id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub is_qa: bool,
    pub is_resolved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub author_name: String,
    pub author_role: String,
    pub reply_count: i64,
}

const DISCUSSION_ROW_SELECT: &str = r#"
    SELECT
        d.id, d.module_id, d.user_id, d.title, d.content, d.is_qa, d.is_resolved,
        d.created_at, d.updated_at,
        u.full_name AS author_name, u.role AS author_role,
        (SELECT COUNT(*) FROM discussion_replies r WHERE r.discussion_id = d.id) AS reply_count
    FROM discussions d
    JOIN users u ON u.id = d.user_id
"#;

impl DiscussionRow {
    pub async fn for_module(
        mm: &ModelManager,
        module_id: Uuid,
        is_qa: Option<bool>,
    ) -> DatabaseResult<Vec<Self>> {
        let sql = format!(
            "{DISCUSSION_ROW_SELECT} WHERE d.module_id = $1 AND ($2::bool IS NULL OR d.is_qa = $2) ORDER BY d.created_at DESC"
        );
        let rows = sqlx::query_as(&sql)
            .bind(module_id)
            .bind(is_qa)
            .fetch_all(mm.executor())
            .await?;
        Ok(rows)
    }

    pub async fn find(mm: &ModelManager, id: Uuid) -> DatabaseResult<Option<Self>> {
        let sql = format!("{DISCUSSION_ROW_SELECT} WHERE d.id = $1");
        let row = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(row)
    }
}
