use serde::Deserialize;

#[derive(Debug, Deserialize, utoipa::ToSchema, utoipa::IntoParams)]
pub struct DiscussionQuery {
    /// Only Q&A threads (`true`) or only general ones (`false`).
    pub is_qa: Option<bool>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ReplyBody {
    pub content: String,
}
