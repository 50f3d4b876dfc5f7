use async_trait::async_trait;
use serde::Serialize;

use crate::db::DbError;
use crate::models::CanonicalMeasurement;

/// Per-record tally reported back by a store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreOutcome {
    pub stored: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

/// Persistence collaborator for committed imports.
///
/// Individual rejected records are reported in `StoreOutcome`; an `Err` means the
/// batch as a whole could not be written.
#[async_trait]
pub trait MeasurementStore: Send + Sync {
    async fn store_batch(
        &self,
        records: &[CanonicalMeasurement],
    ) -> Result<StoreOutcome, DbError>;
}
