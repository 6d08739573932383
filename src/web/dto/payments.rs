use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct InitiateBody {
    pub course_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct InitiateResponse {
    pub gateway_url: String,
    /// Session id handed to the gateway as `tran_id`.
    pub transaction_id: String,
    pub amount: f64,
    pub currency: String,
}

/// Form fields posted back by SSLCommerz. Only the ones used are listed.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct GatewayCallback {
    pub tran_id: Option<String>,
    pub val_id: Option<String>,
    pub bank_tran_id: Option<String>,
    pub card_type: Option<String>,
}
