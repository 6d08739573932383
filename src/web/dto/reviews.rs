use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::entity::ReviewRow;

pub const DEFAULT_RECENT_LIMIT: i64 = 10;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ReviewBody {
    pub rating: i32,
    pub review_text: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema, utoipa::IntoParams)]
pub struct RecentReviewsQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ReviewCreated {
    pub review_id: Uuid,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CourseReviews {
    pub reviews: Vec<ReviewRow>,
    /// One decimal, `null` without reviews.
    pub avg_rating: Option<f64>,
    pub total_reviews: i64,
}
