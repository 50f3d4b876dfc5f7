use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, instrument};

use crate::db::{DbError, MeasurementStore, StoreOutcome};
use crate::models::CanonicalMeasurement;

/// Process-local store used for dry runs and tests.
///
/// Rejects a second reading with the same date and time, like the Postgres table.
#[derive(Debug, Default)]
pub struct InMemoryMeasurementStore {
    records: Mutex<Vec<CanonicalMeasurement>>,
}

impl InMemoryMeasurementStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything stored so far
    pub fn records(&self) -> Vec<CanonicalMeasurement> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl MeasurementStore for InMemoryMeasurementStore {
    #[instrument(skip(self, records), fields(count = records.len()))]
    async fn store_batch(
        &self,
        records: &[CanonicalMeasurement],
    ) -> Result<StoreOutcome, DbError> {
        let mut stored_records = self
            .records
            .lock()
            .map_err(|e| DbError::Unavailable(e.to_string()))?;

        let mut seen: HashSet<(chrono::NaiveDate, String)> = stored_records
            .iter()
            .map(|m| (m.date, m.time.clone()))
            .collect();

        let mut outcome = StoreOutcome::default();
        for record in records {
            if seen.insert((record.date, record.time.clone())) {
                stored_records.push(record.clone());
                outcome.stored += 1;
            } else {
                outcome.failed += 1;
                outcome.errors.push(format!(
                    "Measurement for {} {} already exists",
                    record.date, record.time
                ));
            }
        }

        debug!(
            "Stored {} records, {} rejected",
            outcome.stored, outcome.failed
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn reading(time: &str) -> CanonicalMeasurement {
        CanonicalMeasurement::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            time,
            70.0,
            22.0,
            18.0,
        )
    }

    #[tokio::test]
    async fn test_stores_batch() {
        let store = InMemoryMeasurementStore::new();
        let outcome = store
            .store_batch(&[reading("07:00"), reading("21:00")])
            .await
            .unwrap();

        assert_eq!(outcome.stored, 2);
        assert_eq!(outcome.failed, 0);
        assert_eq!(store.records().len(), 2);
    }

    #[tokio::test]
    async fn test_rejects_same_date_and_time() {
        let store = InMemoryMeasurementStore::new();
        store.store_batch(&[reading("07:00")]).await.unwrap();

        let outcome = store
            .store_batch(&[reading("07:00"), reading("08:00")])
            .await
            .unwrap();
        assert_eq!(outcome.stored, 1);
        assert_eq!(outcome.failed, 1);
        assert!(outcome.errors[0].contains("already exists"));
        assert_eq!(store.records().len(), 2);
    }

    #[tokio::test]
    async fn test_snapshot_after_panicked_writer() {
        let store = std::sync::Arc::new(InMemoryMeasurementStore::new());
        store.store_batch(&[reading("07:00")]).await.unwrap();

        let writer = store.clone();
        let _ = std::thread::spawn(move || {
            let _guard = writer.records.lock().unwrap();
            panic!("writer panicked while holding the lock");
        })
        .join();

        assert_eq!(store.records().len(), 1);
    }
}
