use crate::error::{ServerError, ServerResult};
use crate::state::ServerState;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use seedline::{BatchResult, Transaction, TransactionDraft, store};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

/// Bulk-create transactions. Drafts pointing at unknown customers are
/// skipped and counted as failures.
pub async fn create_multi(
    State(state): State<Arc<ServerState>>,
    Json(drafts): Json<Vec<TransactionDraft>>,
) -> ServerResult<(StatusCode, Json<BatchResult>)> {
    let report = state.pipeline.ingest_transactions(drafts).await?;
    metrics::counter!("seedline_transactions_ingested_total")
        .increment(report.result.success_count as u64);
    Ok((StatusCode::CREATED, Json(report.into_result()?)))
}

#[derive(Debug, Deserialize)]
pub struct DateRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

/// A customer's transactions with `from <= time <= to` (RFC 3339 bounds).
pub async fn list_in_range(
    State(state): State<Arc<ServerState>>,
    Path(customer_id): Path<Uuid>,
    Query(range): Query<DateRange>,
) -> ServerResult<Json<Vec<Transaction>>> {
    if range.from > range.to {
        return Err(ServerError::BadRequest(
            "'from' must not be later than 'to'".to_string(),
        ));
    }
    let DateRange { from, to } = range;
    let transactions = store::blocking(state.store(), move |s| {
        s.transactions_between(customer_id, from, to)
    })
    .await??;
    Ok(Json(transactions))
}
