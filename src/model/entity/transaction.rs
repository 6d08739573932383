use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::model::{ModelManager, ResourceType, error::DatabaseResult, repo::ResourceTyped};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    Pending,
    Success,
    Failed,
    Cancelled,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl From<&str> for TransactionStatus {
    fn from(value: &str) -> Self {
        match value {
            "success" => Self::Success,
            "failed" => Self::Failed,
            "cancelled" => Self::Cancelled,
            _ => Self::Pending,
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Transaction {
    id: Uuid,
    enrollment_id: Uuid,
    student_id: Uuid,
    course_id: Uuid,
    amount: f64,
    currency: String,
    payment_status: String,
    session_id: String,
    gateway_transaction_id: Option<String>,
    #[serde(skip)]
    validation_token: Option<String>,
    payment_method: Option<String>,
    payment_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct TransactionCreate {
    pub enrollment_id: Uuid,
    pub student_id: Uuid,
    pub course_id: Uuid,
    pub amount: f64,
    pub currency: String,
    pub session_id: String,
}

/// Gateway data stored on a validated payment.
#[derive(Debug)]
pub struct TransactionSettlement {
    pub gateway_transaction_id: Option<String>,
    pub validation_token: String,
    pub payment_method: Option<String>,
}

impl ResourceTyped for Transaction {
    fn get_resource_type() -> ResourceType {
        ResourceType::Transaction
    }
}

impl Transaction {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn enrollment_id(&self) -> Uuid {
        self.enrollment_id
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn status(&self) -> TransactionStatus {
        TransactionStatus::from(self.payment_status.as_str())
    }

    pub async fn create_pending(mm: &ModelManager, data: TransactionCreate) -> DatabaseResult<Self> {
        let transaction = sqlx::query_as(
            r#"
            INSERT INTO transactions (id, enrollment_id, student_id, course_id, amount, currency, payment_status, session_id)
            VALUES ($1, $2, $3, $4, $5, $6, 'pending', $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.enrollment_id)
        .bind(data.student_id)
        .bind(data.course_id)
        .bind(data.amount)
        .bind(&data.currency)
        .bind(&data.session_id)
        .fetch_one(mm.executor())
        .await?;
        Ok(transaction)
    }

    pub async fn find_by_session(mm: &ModelManager, session_id: &str) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM transactions WHERE session_id = $1")
            .bind(session_id)
            .fetch_optional(mm.executor())
            .await?;
        Ok(result)
    }

    pub async fn settle(
        mut self,
        mm: &ModelManager,
        data: TransactionSettlement,
    ) -> DatabaseResult<Self> {
        let now = Utc::now();
        sqlx::query(
            r#"
            UPDATE transactions SET
                payment_status = 'success', gateway_transaction_id = $1, validation_token = $2,
                payment_method = $3, payment_date = $4
            WHERE id = $5 AND payment_status <> 'success'
            "#,
        )
        .bind(&data.gateway_transaction_id)
        .bind(&data.validation_token)
        .bind(&data.payment_method)
        .bind(now)
        .bind(self.id)
        .execute(mm.executor())
        .await?;

        self.payment_status = TransactionStatus::Success.to_string();
        self.gateway_transaction_id = data.gateway_transaction_id;
        self.validation_token = Some(data.validation_token);
        self.payment_method = data.payment_method;
        self.payment_date = Some(now);
        Ok(self)
    }

    /// Closes a `pending` transaction with the given status. Returns false when
    /// there is no pending transaction for the session id; settled ones are
    /// never rewritten.
    pub async fn close_pending(
        mm: &ModelManager,
        session_id: &str,
        status: TransactionStatus,
    ) -> DatabaseResult<bool> {
        let result = sqlx::query(
            "UPDATE transactions SET payment_status = $1 WHERE session_id = $2 AND payment_status = 'pending'",
        )
        .bind(status.as_str())
        .bind(session_id)
        .execute(mm.executor())
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Session id sent to the gateway as `tran_id`.
pub fn new_session_id() -> String {
    format!(
        "EDTECH-{}-{}",
        Utc::now().timestamp_millis(),
        crate::auth::generate_secure_token(8)
    )
}

#[derive(Debug, Serialize, FromRow, utoipa::ToSchema)]
pub struct TransactionHistoryRow {
    pub id: Uuid,
    pub course_id: Uuid,
    pub course_title: String,
    pub amount: f64,
    pub currency: String,
    pub payment_status: String,
    pub session_id: String,
    pub payment_method: Option<String>,
    pub payment_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl TransactionHistoryRow {
    pub async fn for_student(mm: &ModelManager, student_id: Uuid) -> DatabaseResult<Vec<Self>> {
        let rows = sqlx::query_as(
            r#"
            SELECT
                t.id, t.course_id, c.title AS course_title, t.amount, t.currency,
                t.payment_status, t.session_id, t.payment_method, t.payment_date, t.created_at
            FROM transactions t
            JOIN courses c ON c.id = t.course_id
            WHERE t.student_id = $1
            ORDER BY t.created_at DESC
            "#,
        )
        .bind(student_id)
        .fetch_all(mm.executor())
        .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn session_id_shape() {
        let id = new_session_id();
        let parts: Vec<&str> = id.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "EDTECH");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 16);
        assert_ne!(new_session_id(), id);
    }

    #[test]
    fn unknown_status_is_pending() {
        assert_eq!(TransactionStatus::from("success"), TransactionStatus::Success);
        assert_eq!(TransactionStatus::from("completed"), TransactionStatus::Pending);
    }
}
