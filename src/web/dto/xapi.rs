use serde::Deserialize;

use crate::web::{error::FieldError, validate::Validator};

pub const DEFAULT_HISTORY_LIMIT: i64 = 50;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct StatementBody {
    pub verb: String,
    pub object_type: String,
    pub object_id: String,
    pub result: Option<serde_json::Value>,
    pub context: Option<serde_json::Value>,
}

impl StatementBody {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        Validator::new()
            .not_blank("verb", &self.verb)
            .not_blank("object_type", &self.object_type)
            .not_blank("object_id", &self.object_id)
            .finish()
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema, utoipa::IntoParams)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
