use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CourseCreated {
    pub course_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct UploadResponse {
    pub url: String,
    pub filename: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UserStatusBody {
    pub is_active: bool,
}
