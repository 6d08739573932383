use async_trait::async_trait;

use crate::config::Payment;

use super::{
    PaymentError, PaymentGateway, PaymentResult, SessionRequest, SessionResponse,
    ValidationResponse,
};

const SANDBOX_HOST: &str = "https://sandbox.sslcommerz.com";
const LIVE_HOST: &str = "https://securepay.sslcommerz.com";

#[derive(Debug, Clone)]
pub struct SslCommerzGateway {
    client: reqwest::Client,
    store_id: String,
    store_password: String,
    host: &'static str,
}

impl SslCommerzGateway {
    pub fn new(store_id: &str, store_password: &str, sandbox: bool) -> Self {
        Self {
            client: reqwest::Client::new(),
            store_id: store_id.to_string(),
            store_password: store_password.to_string(),
            host: if sandbox { SANDBOX_HOST } else { LIVE_HOST },
        }
    }

    pub fn from_config(config: &Payment) -> Self {
        Self::new(config.store_id(), config.store_password(), config.sandbox())
    }

    fn session_url(&self) -> String {
        format!("{}/gwprocess/v4/api.php", self.host)
    }

    fn validation_url(&self) -> String {
        format!("{}/validator/api/validationserverAPI.php", self.host)
    }

    fn ensure_configured(&self) -> PaymentResult<()> {
        if self.store_id.is_empty() || self.store_password.is_empty() {
            return Err(PaymentError::NotConfigured);
        }
        Ok(())
    }
}

fn session_form(
    store_id: &str,
    store_password: &str,
    request: &SessionRequest,
) -> Vec<(&'static str, String)> {
    vec![
        ("store_id", store_id.to_string()),
        ("store_passwd", store_password.to_string()),
        ("total_amount", format!("{:.2}", request.total_amount)),
        ("currency", request.currency.clone()),
        ("tran_id", request.tran_id.clone()),
        ("success_url", request.success_url.clone()),
        ("fail_url", request.fail_url.clone()),
        ("cancel_url", request.cancel_url.clone()),
        ("ipn_url", request.ipn_url.clone()),
        ("product_name", request.product_name.clone()),
        ("product_category", String::from("Education")),
        ("product_profile", String::from("non-physical-goods")),
        ("cus_name", request.cus_name.clone()),
        ("cus_email", request.cus_email.clone()),
        ("cus_phone", request.cus_phone.clone()),
        ("cus_add1", String::from("Dhaka, Bangladesh")),
        ("cus_city", String::from("Dhaka")),
        ("cus_country", String::from("Bangladesh")),
        ("shipping_method", String::from("NO")),
        ("multi_card_name", String::from("mastercard,visacard,amexcard")),
        ("value_a", request.value_a.clone()),
        ("value_b", request.value_b.clone()),
        ("value_c", request.value_c.clone()),
    ]
}

#[async_trait]
impl PaymentGateway for SslCommerzGateway {
    #[tracing::instrument(skip(self, request), fields(tran_id = %request.tran_id))]
    async fn create_session(&self, request: &SessionRequest) -> PaymentResult<SessionResponse> {
        self.ensure_configured()?;
        let form = session_form(&self.store_id, &self.store_password, request);

        let response = self
            .client
            .post(self.session_url())
            .form(&form)
            .send()
            .await?
            .json::<SessionResponse>()
            .await?;

        tracing::debug!("gateway session status: {}", response.status);
        Ok(response)
    }

    #[tracing::instrument(skip(self))]
    async fn validate(&self, val_id: &str) -> PaymentResult<ValidationResponse> {
        self.ensure_configured()?;
        let response = self
            .client
            .get(self.validation_url())
            .query(&[
                ("val_id", val_id),
                ("store_id", self.store_id.as_str()),
                ("store_passwd", self.store_password.as_str()),
                ("format", "json"),
            ])
            .send()
            .await?
            .json::<ValidationResponse>()
            .await?;

        tracing::debug!("gateway validation status: {}", response.status);
        Ok(response)
    }
}
