//! Read-side aggregates over the store.

use chrono::{DateTime, Months, Utc};

use crate::error::StoreError;
use crate::record::CustomerReport;
use crate::store::Store;

/// Length of the trailing window used for customer totals.
pub const TRAILING_MONTHS: u32 = 12;

/// Every customer with the sum of their transaction amounts over the
/// [`TRAILING_MONTHS`] ending at `now`. Customers without transactions in the
/// window report `0.0`.
pub fn customer_reports(
    store: &dyn Store,
    now: DateTime<Utc>,
) -> Result<Vec<CustomerReport>, StoreError> {
    let since = now
        .checked_sub_months(Months::new(TRAILING_MONTHS))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    let totals = store.totals_since(since)?;

    Ok(store
        .customers(None)?
        .into_iter()
        .map(|c| CustomerReport {
            total_transaction_amount: totals.get(&c.id).copied().unwrap_or(0.0),
            id: c.id,
            name: c.name,
            email: c.email,
            gender: c.gender,
        })
        .collect())
}
