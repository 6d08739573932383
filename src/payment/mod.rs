//! Payment gateway seam.
//!
//! Handlers talk to [`PaymentGateway`] only, so the SSLCommerz client can be
//! swapped for a stub in tests.

use async_trait::async_trait;
use serde::Deserialize;

mod error;
pub use error::{PaymentError, PaymentResult};

mod sslcommerz;
pub use sslcommerz::SslCommerzGateway;

#[derive(Debug, Clone)]
pub struct SessionRequest {
    pub tran_id: String,
    pub total_amount: f64,
    pub currency: String,
    pub product_name: String,
    pub cus_name: String,
    pub cus_email: String,
    pub cus_phone: String,
    pub success_url: String,
    pub fail_url: String,
    pub cancel_url: String,
    pub ipn_url: String,
    /// Local transaction id.
    pub value_a: String,
    /// Enrollment id.
    pub value_b: String,
    /// Course id.
    pub value_c: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionResponse {
    pub status: String,
    #[serde(rename = "GatewayPageURL", default)]
    pub gateway_page_url: Option<String>,
    #[serde(rename = "failedreason", default)]
    pub failed_reason: Option<String>,
}

impl SessionResponse {
    pub fn is_success(&self) -> bool {
        self.status == "SUCCESS" && self.gateway_page_url.is_some()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValidationResponse {
    pub status: String,
    #[serde(default)]
    pub tran_id: Option<String>,
    /// Amount and currency of the original session request.
    #[serde(default, deserialize_with = "lenient_amount")]
    pub currency_amount: Option<f64>,
    #[serde(default)]
    pub currency_type: Option<String>,
}

impl ValidationResponse {
    pub fn is_valid(&self) -> bool {
        matches!(self.status.as_str(), "VALID" | "VALIDATED")
    }

    /// The validated payment belongs to `tran_id` and covers `amount` in `currency`.
    pub fn confirms(&self, tran_id: &str, amount: f64, currency: &str) -> bool {
        let same_session = self.tran_id.as_deref() == Some(tran_id);
        let same_amount = self
            .currency_amount
            .is_some_and(|paid| (paid - amount).abs() < 0.01);
        let same_currency = self
            .currency_type
            .as_deref()
            .is_some_and(|c| c.eq_ignore_ascii_case(currency));
        same_session && same_amount && same_currency
    }
}

/// The gateway sends amounts as decimal strings, e.g. `"1500.00"`.
fn lenient_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Amount {
        Number(f64),
        Text(String),
    }

    Ok(match Option::<Amount>::deserialize(deserializer)? {
        Some(Amount::Number(n)) => Some(n),
        Some(Amount::Text(s)) => s.trim().parse().ok(),
        None => None,
    })
}

#[async_trait]
pub trait PaymentGateway: std::fmt::Debug + Send + Sync {
    async fn create_session(&self, request: &SessionRequest) -> PaymentResult<SessionResponse>;
    async fn validate(&self, val_id: &str) -> PaymentResult<ValidationResponse>;
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn session_response_parses_gateway_fields() {
        let raw = r#"{"status":"SUCCESS","GatewayPageURL":"https://sandbox/pay","sessionkey":"x"}"#;
        let resp: SessionResponse = serde_json::from_str(raw).unwrap();
        assert!(resp.is_success());
        assert_eq!(resp.gateway_page_url.as_deref(), Some("https://sandbox/pay"));

        let raw = r#"{"status":"FAILED","failedreason":"Store Credential Error"}"#;
        let resp: SessionResponse = serde_json::from_str(raw).unwrap();
        assert!(!resp.is_success());
        assert_eq!(resp.failed_reason.as_deref(), Some("Store Credential Error"));
    }

    #[test]
    fn validation_accepts_both_valid_states() {
        for (status, expected) in [("VALID", true), ("VALIDATED", true), ("INVALID_TRANSACTION", false)] {
            let resp = ValidationResponse {
                status: status.to_string(),
                tran_id: None,
                currency_amount: None,
                currency_type: None,
            };
            assert_eq!(resp.is_valid(), expected, "{status}");
        }
    }

    #[test]
    fn validation_must_name_the_session_and_amount() {
        let raw = r#"{"status":"VALID","tran_id":"EDTECH-1-ab","currency_amount":"1500.00","currency_type":"BDT"}"#;
        let resp: ValidationResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(resp.currency_amount, Some(1500.0));
        assert!(resp.confirms("EDTECH-1-ab", 1500.0, "BDT"));
        assert!(!resp.confirms("EDTECH-2-cd", 1500.0, "BDT"));
        assert!(!resp.confirms("EDTECH-1-ab", 1200.0, "BDT"));
        assert!(!resp.confirms("EDTECH-1-ab", 1500.0, "USD"));

        let anonymous: ValidationResponse = serde_json::from_str(r#"{"status":"VALID"}"#).unwrap();
        assert!(!anonymous.confirms("EDTECH-1-ab", 1500.0, "BDT"));
    }
}
