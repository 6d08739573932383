use std::sync::Arc;

use crate::{Config, model::ModelManager, payment::PaymentGateway};

#[derive(Debug, Clone)]
pub struct AppState {
    mm: ModelManager,
    gateway: Arc<dyn PaymentGateway>,
    config: &'static Config,
}

impl AppState {
    pub fn new(mm: ModelManager, gateway: Arc<dyn PaymentGateway>, config: &'static Config) -> Self {
        Self {
            mm,
            gateway,
            config,
        }
    }

    pub fn pool(&self) -> &ModelManager {
        &self.mm
    }

    pub fn gateway(&self) -> &dyn PaymentGateway {
        self.gateway.as_ref()
    }

    pub fn config(&self) -> &'static Config {
        self.config
    }
}
