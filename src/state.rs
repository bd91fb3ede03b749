use std::sync::Arc;

use crate::config::Config;
use crate::database::Store;
use crate::services::payment_gateway::PaymentGateway;

/// Shared state injected into every handler via `web::Data<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub payments: Arc<dyn PaymentGateway>,
    pub config: Config,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, payments: Arc<dyn PaymentGateway>, config: Config) -> Self {
        Self {
            store,
            payments,
            config,
        }
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }
}
