//! HTTP client for the ingestion server.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use seedline::{BatchResult, CandidateRecord, CustomerSummary, IngestSink, TransactionDraft, TransportError};
use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

/// Talks to `seedline-server`. Cheap to clone; the connection pool is shared.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| TransportError::Request(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `POST /customers/multi`, expecting `201`.
    pub async fn create_customers(
        &self,
        batch: &[CandidateRecord],
    ) -> Result<BatchResult, TransportError> {
        self.post_json("/customers/multi", batch, StatusCode::CREATED)
            .await
    }

    /// Ids of up to `limit` existing customers.
    pub async fn fetch_customer_ids(&self, limit: usize) -> Result<Vec<Uuid>, TransportError> {
        let url = format!("{}/customers/limit/{limit}", self.base_url);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| TransportError::Request(format!("GET {url}: {e}")))?;
        let customers: Vec<CustomerSummary> = decode(response, StatusCode::OK).await?;
        Ok(customers.into_iter().map(|c| c.id).collect())
    }

    /// `POST /transactions/multi`, expecting `201`.
    pub async fn create_transactions(
        &self,
        drafts: &[TransactionDraft],
    ) -> Result<BatchResult, TransportError> {
        self.post_json("/transactions/multi", drafts, StatusCode::CREATED)
            .await
    }

    async fn post_json<B, T>(
        &self,
        path: &str,
        body: &B,
        expected: StatusCode,
    ) -> Result<T, TransportError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| TransportError::Request(format!("POST {url}: {e}")))?;
        decode(response, expected).await
    }
}

async fn decode<T: DeserializeOwned>(
    response: reqwest::Response,
    expected: StatusCode,
) -> Result<T, TransportError> {
    let status = response.status();
    if status != expected {
        let body = response.text().await.unwrap_or_default();
        return Err(TransportError::Status {
            status: status.as_u16(),
            body,
        });
    }
    response
        .json::<T>()
        .await
        .map_err(|e| TransportError::Decode(e.to_string()))
}

#[async_trait]
impl IngestSink for BackendClient {
    async fn submit(&self, batch: Vec<CandidateRecord>) -> Result<BatchResult, TransportError> {
        self.create_customers(&batch).await
    }
}
