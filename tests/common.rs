// Shared fixtures for integration tests: vendor-shaped CSV exports

#![allow(dead_code)]

use async_trait::async_trait;
use scale_import_service::db::{DbError, MeasurementStore, StoreOutcome};
use scale_import_service::models::CanonicalMeasurement;

/// Full vendor header, including the whitespace-prefixed columns
pub const VENDOR_HEADER: &str = "Fecha, Hora, Peso(kg),IMC,Grasa corporal(%),Músculo esquelético(%),Peso corporal sin grasa(kg),Grasa subcutánea(%),Grasa visceral,Agua corporal(%),Masa muscular(kg),Masa ósea(kg),Proteína (%),Tasa Metabólica Basal(kcal),Edad metabólica,Tipo de cuerpo";

/// One vendor row with plausible advisory values
pub fn vendor_row(date: &str, time: &str, weight: f64, bmi: f64, body_fat: f64) -> String {
    format!("{date},{time},{weight},{bmi},{body_fat},40.1,57.4,16.2,7,55.3,54.5,2.9,17.8,1580,34,5")
}

/// Build a CSV export from rows
pub fn vendor_csv(rows: &[String]) -> String {
    let mut content = String::from(VENDOR_HEADER);
    content.push('\n');
    for row in rows {
        content.push_str(row);
        content.push('\n');
    }
    content
}

/// Two readings on 1 Jan 2024 plus one on 2 Jan 2024, all valid
pub fn export_with_duplicate_day() -> String {
    vendor_csv(&[
        vendor_row("01/01/24", "07:02", 70.0, 22.9, 18.0),
        vendor_row("01/01/24", "21:45", 72.0, 23.5, 18.6),
        vendor_row("02/01/24", "07:10", 70.4, 23.0, 18.1),
    ])
}

/// Store whose every batch fails, for persistence error paths
pub struct FailingStore;

#[async_trait]
impl MeasurementStore for FailingStore {
    async fn store_batch(
        &self,
        _records: &[CanonicalMeasurement],
    ) -> Result<StoreOutcome, DbError> {
        Err(DbError::Unavailable("connection refused".to_string()))
    }
}
