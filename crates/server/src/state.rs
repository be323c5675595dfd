use crate::config::ServerConfig;
use crate::error::ServerResult;
use metrics_exporter_prometheus::PrometheusHandle;
use seedline::{IngestPipeline, Store};
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// Ingestion pipeline (processor, store and reducer), shared across requests
    pub pipeline: IngestPipeline,

    /// Prometheus render handle, present once a recorder is installed
    pub metrics: Option<PrometheusHandle>,
}

impl ServerState {
    /// Create new server state, opening the configured store
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        config.pipeline.validate()?;
        let store = config.storage.build(config.pipeline.insert_chunk_size)?;
        Ok(Self::with_store(config, store))
    }

    /// Create state around an existing store
    pub fn with_store(config: ServerConfig, store: Arc<dyn Store>) -> Self {
        let pipeline = IngestPipeline::new(&config.pipeline, store, config.limits);
        Self {
            config: Arc::new(config),
            pipeline,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        self.pipeline.store()
    }
}

/// Server metadata for health checks
#[derive(Debug, serde::Serialize)]
pub struct ServerMetadata {
    pub version: String,
    pub uptime_seconds: u64,
    pub workers: usize,
    pub max_customer_batch: usize,
    pub max_transaction_batch: usize,
}
