use crate::client::BackendClient;
use crate::config::GeneratorConfig;
use crate::error::GeneratorResult;
use seedline::synth::{CustomerFactory, TransactionFactory};
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct GeneratorState {
    pub config: Arc<GeneratorConfig>,
    pub client: BackendClient,
    pub customers: CustomerFactory,
    pub transactions: TransactionFactory,
}

impl GeneratorState {
    pub fn new(config: GeneratorConfig) -> GeneratorResult<Self> {
        let client = BackendClient::new(config.backend_url(), config.request_timeout())?;
        Ok(Self {
            config: Arc::new(config),
            client,
            customers: CustomerFactory,
            transactions: TransactionFactory::default(),
        })
    }
}
