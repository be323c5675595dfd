use crate::error::{GeneratorError, GeneratorResult};
use crate::state::GeneratorState;
use axum::Json;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use chrono::Utc;
use seedline::{AdaptiveRetryLoop, BatchResult, PipelineError};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

/// Query parameters are taken as raw strings so that a missing or malformed
/// value gets the same JSON error body as a non-positive one.
#[derive(Debug, Deserialize)]
pub struct CustomerParams {
    pub num: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TransactionParams {
    pub transactions_num: Option<String>,
    pub customers_num: Option<String>,
}

fn parse_positive(name: &str, raw: Option<&str>) -> GeneratorResult<usize> {
    raw.and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|&n| n > 0)
        .ok_or_else(|| GeneratorError::BadRequest(format!("'{name}' must be a positive integer")))
}

/// Generate `num` customers (at most `max_customers`) and push them to the
/// backend, regenerating failures until none are left or progress stalls.
///
/// ```json
/// {
///   "status": "Customer data generated and sent to backend server",
///   "generation_time": "12.3ms",
///   "send_time": "1.52s",
///   "attempts": 2
/// }
/// ```
pub async fn generate_customers(
    State(state): State<Arc<GeneratorState>>,
    Query(params): Query<CustomerParams>,
) -> GeneratorResult<impl IntoResponse> {
    let num = parse_positive("num", params.num.as_deref())?;
    let max = state.config.max_customers;
    if num > max {
        return Err(GeneratorError::BadRequest(format!("'num' over {max}")));
    }
    tracing::info!(num, "customer generation requested");

    let report = AdaptiveRetryLoop::new(&state.customers, &state.client, state.config.retry)
        .run(num)
        .await?;

    Ok(Json(json!({
        "status": "Customer data generated and sent to backend server",
        "requested": report.requested,
        "attempts": report.attempts,
        "generation_time": format!("{:?}", report.timings.generate),
        "send_time": format!("{:?}", report.timings.send),
        "history": report.history,
    })))
}

/// Generate transactions over a pool of up to `customers_num` existing
/// customers and push them to the backend in batches.
pub async fn generate_transactions(
    State(state): State<Arc<GeneratorState>>,
    Query(params): Query<TransactionParams>,
) -> GeneratorResult<impl IntoResponse> {
    let transactions_num = parse_positive("transactions_num", params.transactions_num.as_deref())?;
    let max = state.config.max_transactions;
    if transactions_num > max {
        return Err(GeneratorError::BadRequest(format!(
            "'transactions_num' over {max}"
        )));
    }
    let customers_num = parse_positive("customers_num", params.customers_num.as_deref())?;

    let pool = state.client.fetch_customer_ids(customers_num).await?;
    tracing::info!(
        transactions_num,
        pool = pool.len(),
        "generating transactions"
    );

    let factory = state.transactions;
    let drafts = tokio::task::spawn_blocking(move || {
        factory.generate(transactions_num, &pool, Utc::now())
    })
    .await
    .map_err(|e| PipelineError::Task(e.to_string()))??;

    let mut total = BatchResult::default();
    for chunk in drafts.chunks(state.config.transaction_batch_size) {
        let result = state
            .client
            .create_transactions(chunk)
            .await
            .map_err(|source| GeneratorError::PartialSend { sent: total, source })?;
        total.success_count += result.success_count;
        total.fail_count += result.fail_count;
    }
    tracing::info!(result = %total, "transactions sent");

    Ok(Json(json!({
        "status": "Transactions generated and sent successfully",
        "successCount": total.success_count,
        "failCount": total.fail_count,
    })))
}
