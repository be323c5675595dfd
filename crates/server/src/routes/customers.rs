use crate::error::ServerResult;
use crate::state::ServerState;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use seedline::{BatchResult, CandidateRecord, CustomerReport, CustomerSummary, report, store};
use serde_json::json;
use std::sync::Arc;

/// Bulk-create customers.
///
/// Every record is validated and its secret derived on the bounded worker
/// pool; duplicates are skipped by the store. The response always accounts
/// for every submitted record:
///
/// ```json
/// { "successCount": 1998, "failCount": 2 }
/// ```
///
/// A hard storage failure responds `500` with the same counts under
/// `error.details`.
pub async fn create_multi(
    State(state): State<Arc<ServerState>>,
    Json(batch): Json<Vec<CandidateRecord>>,
) -> ServerResult<(StatusCode, Json<BatchResult>)> {
    let report = state.pipeline.ingest_customers(batch).await?;

    metrics::counter!("seedline_customers_ingested_total").increment(report.result.success_count as u64);
    metrics::counter!("seedline_customers_failed_total").increment(report.result.fail_count as u64);
    metrics::gauge!("seedline_processor_peak_in_flight").set(report.peak_in_flight as f64);

    let result = report.into_result()?;
    Ok((StatusCode::CREATED, Json(result)))
}

/// At most `num` customers, without secrets.
pub async fn list_limited(
    State(state): State<Arc<ServerState>>,
    Path(num): Path<usize>,
) -> ServerResult<Json<Vec<CustomerSummary>>> {
    let customers = store::blocking(state.store(), move |s| s.customers(Some(num))).await??;
    Ok(Json(customers))
}

/// All customers with their trailing-12-month transaction totals.
pub async fn list_with_totals(
    State(state): State<Arc<ServerState>>,
) -> ServerResult<Json<Vec<CustomerReport>>> {
    let now = Utc::now();
    let reports =
        store::blocking(state.store(), move |s| report::customer_reports(s, now)).await??;
    Ok(Json(reports))
}

/// Remove every customer and transaction.
pub async fn reset(State(state): State<Arc<ServerState>>) -> ServerResult<impl IntoResponse> {
    store::blocking(state.store(), |s| s.reset()).await??;
    tracing::warn!("all customer data reset");
    Ok(Json(json!({ "message": "All customer data reset successfully" })))
}
