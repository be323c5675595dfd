use seedline::RetryConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

/// Generator configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneratorConfig {
    /// Bind address
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Base URL of the ingestion server
    #[serde(default = "default_backend_endpoint")]
    pub backend_endpoint: String,

    /// Timeout for a single backend request, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Upper bound on `num` for customer generation. The retry loop sends
    /// the whole batch at once, so keep this within the server's
    /// `max_customer_batch`.
    #[serde(default = "default_max_customers")]
    pub max_customers: usize,

    /// Upper bound on `transactions_num`
    #[serde(default = "default_max_transactions")]
    pub max_transactions: usize,

    /// Transactions per request to the backend; must not exceed the
    /// server's `max_transaction_batch`
    #[serde(default = "default_transaction_batch_size")]
    pub transaction_batch_size: usize,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Adaptive retry settings
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            backend_endpoint: default_backend_endpoint(),
            request_timeout_secs: default_request_timeout_secs(),
            max_customers: default_max_customers(),
            max_transactions: default_max_transactions(),
            transaction_batch_size: default_transaction_batch_size(),
            enable_cors: default_true(),
            log_level: default_log_level(),
            retry: RetryConfig::default(),
        }
    }
}

impl GeneratorConfig {
    /// Load configuration from `.env`, an optional `generator.toml` and
    /// `SEEDLINE_GENERATOR__*` environment variables, in increasing precedence.
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let builder = config::Config::builder()
            .add_source(config::File::with_name("generator").required(false))
            .add_source(config::Environment::with_prefix("SEEDLINE_GENERATOR").separator("__"));

        let config: GeneratorConfig = builder.build()?.try_deserialize()?;
        config.retry.validate()?;
        if config.transaction_batch_size == 0 {
            anyhow::bail!("transaction_batch_size must be positive");
        }
        if config.max_customers == 0 {
            anyhow::bail!("max_customers must be positive");
        }
        Ok(config)
    }

    /// Backend base URL without a trailing slash
    pub fn backend_url(&self) -> &str {
        self.backend_endpoint.trim_end_matches('/')
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.bind_addr, self.port);
        Ok(addr_str.parse()?)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8081
}

fn default_backend_endpoint() -> String {
    "http://localhost:8080".to_string()
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_max_customers() -> usize {
    2_000
}

fn default_max_transactions() -> usize {
    10_000
}

fn default_transaction_batch_size() -> usize {
    5_000
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}
