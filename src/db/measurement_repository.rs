use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, info, instrument};

use crate::db::{DbError, MeasurementStore, StoreOutcome};
use crate::models::CanonicalMeasurement;

#[derive(Clone)]
pub struct MeasurementRepository {
    pool: PgPool,
}

impl MeasurementRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert measurements in a single transaction.
    ///
    /// A reading already stored for the same date and time counts as a failed record;
    /// any database error rolls back the whole batch.
    #[instrument(skip(self, records), fields(count = records.len()))]
    pub async fn insert_measurements(
        &self,
        records: &[CanonicalMeasurement],
    ) -> Result<StoreOutcome, DbError> {
        debug!(
            "Beginning transaction to insert {} measurements",
            records.len()
        );
        let mut tx = self.pool.begin().await?;
        let mut outcome = StoreOutcome::default();

        for m in records {
            let result = sqlx::query(
                r#"
                INSERT INTO measurements (
                    measured_on, measured_time, weight_kg, bmi, body_fat_pct,
                    skeletal_muscle_pct, fat_free_weight_kg, subcutaneous_fat_pct,
                    visceral_fat, body_water_pct, muscle_mass_kg, bone_mass_kg,
                    protein_pct, basal_metabolic_rate_kcal, metabolic_age, body_type, source
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
                ON CONFLICT (measured_on, measured_time) DO NOTHING
                "#,
            )
            .bind(m.date)
            .bind(m.time.as_str())
            .bind(m.weight_kg)
            .bind(m.bmi)
            .bind(m.body_fat_pct)
            .bind(m.skeletal_muscle_pct)
            .bind(m.fat_free_weight_kg)
            .bind(m.subcutaneous_fat_pct)
            .bind(m.visceral_fat)
            .bind(m.body_water_pct)
            .bind(m.muscle_mass_kg)
            .bind(m.bone_mass_kg)
            .bind(m.protein_pct)
            .bind(m.basal_metabolic_rate_kcal)
            .bind(m.metabolic_age)
            .bind(m.body_type)
            .bind(m.source.as_str())
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() > 0 {
                outcome.stored += 1;
            } else {
                outcome.failed += 1;
                outcome.errors.push(format!(
                    "Measurement for {} {} already exists",
                    m.date, m.time
                ));
            }
        }

        tx.commit().await?;
        info!(
            "Inserted {} new measurements, {} duplicates skipped",
            outcome.stored, outcome.failed
        );
        Ok(outcome)
    }
}

#[async_trait]
impl MeasurementStore for MeasurementRepository {
    async fn store_batch(
        &self,
        records: &[CanonicalMeasurement],
    ) -> Result<StoreOutcome, DbError> {
        self.insert_measurements(records).await
    }
}
