//! Reconciles processor outcomes with the store's affected-row count.
//!
//! Rows the store skipped as duplicates are failures: they count against
//! `fail_count`, never towards `success_count`, and are never dropped.

use crate::error::{PartialInsert, StoreError};
use crate::record::BatchResult;

/// Final counts for a batch plus the hard storage error, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reduced {
    pub result: BatchResult,
    pub error: Option<StoreError>,
}

/// Combine `validation_failures` with the store's result for a validated set
/// of `validated` records.
pub fn reduce(
    validation_failures: usize,
    validated: usize,
    written: Result<usize, PartialInsert>,
) -> Reduced {
    let (rows_written, error) = match written {
        Ok(rows) => (rows, None),
        Err(partial) => (partial.rows_written, Some(partial.error)),
    };

    let rows_written = if rows_written > validated {
        tracing::warn!(
            rows_written,
            validated,
            "store reported more rows than submitted; clamping"
        );
        validated
    } else {
        rows_written
    };

    Reduced {
        result: BatchResult::new(rows_written, validation_failures + (validated - rows_written)),
        error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_written() {
        let r = reduce(2, 8, Ok(8));
        assert_eq!(r.result, BatchResult::new(8, 2));
        assert!(r.error.is_none());
    }

    #[test]
    fn duplicate_skips_become_failures() {
        let r = reduce(0, 10, Ok(7));
        assert_eq!(r.result, BatchResult::new(7, 3));
    }

    #[test]
    fn partial_failure_keeps_counts_and_error() {
        let err = PartialInsert::new(4, StoreError::backend("disk full"));
        let r = reduce(1, 10, Err(err));
        assert_eq!(r.result, BatchResult::new(4, 7));
        assert_eq!(r.result.total(), 11);
        assert_eq!(r.error, Some(StoreError::backend("disk full")));
    }

    #[test]
    fn over_reporting_is_clamped() {
        let r = reduce(0, 3, Ok(5));
        assert_eq!(r.result, BatchResult::new(3, 0));
    }
}
