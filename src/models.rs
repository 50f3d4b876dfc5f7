use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::validation::ValidationOutcome;

/// One decoded vendor CSV row, still loosely typed.
///
/// Required columns are always present (possibly as empty strings). Optional columns
/// are `None` when the header lacks them or the cell is blank.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawVendorRecord {
    /// 1-based position among the data rows (header excluded)
    pub row_number: usize,
    pub date: String,
    pub time: String,
    pub weight: String,
    pub bmi: String,
    pub body_fat: String,
    pub skeletal_muscle: Option<String>,
    pub fat_free_weight: Option<String>,
    pub subcutaneous_fat: Option<String>,
    pub visceral_fat: Option<String>,
    pub body_water: Option<String>,
    pub muscle_mass: Option<String>,
    pub bone_mass: Option<String>,
    pub protein: Option<String>,
    pub basal_metabolic_rate: Option<String>,
    pub metabolic_age: Option<String>,
    pub body_type: Option<String>,
}

/// Provenance tag stored with every measurement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementSource {
    #[default]
    VendorImport,
}

impl MeasurementSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeasurementSource::VendorImport => "vendor_import",
        }
    }
}

/// Normalized scale reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalMeasurement {
    pub date: NaiveDate,
    /// Vendor-native time of day, not validated
    pub time: String,
    pub weight_kg: f64,
    pub bmi: f64,
    pub body_fat_pct: f64,
    pub skeletal_muscle_pct: Option<f64>,
    pub fat_free_weight_kg: Option<f64>,
    pub subcutaneous_fat_pct: Option<f64>,
    pub visceral_fat: Option<f64>,
    pub body_water_pct: Option<f64>,
    pub muscle_mass_kg: Option<f64>,
    pub bone_mass_kg: Option<f64>,
    pub protein_pct: Option<f64>,
    pub basal_metabolic_rate_kcal: Option<i32>,
    pub metabolic_age: Option<i32>,
    pub body_type: Option<i32>,
    pub source: MeasurementSource,
}

impl CanonicalMeasurement {
    /// Measurement carrying only the core fields; advisory fields start empty.
    pub fn new(
        date: NaiveDate,
        time: impl Into<String>,
        weight_kg: f64,
        bmi: f64,
        body_fat_pct: f64,
    ) -> Self {
        Self {
            date,
            time: time.into(),
            weight_kg,
            bmi,
            body_fat_pct,
            skeletal_muscle_pct: None,
            fat_free_weight_kg: None,
            subcutaneous_fat_pct: None,
            visceral_fat: None,
            body_water_pct: None,
            muscle_mass_kg: None,
            bone_mass_kg: None,
            protein_pct: None,
            basal_metabolic_rate_kcal: None,
            metabolic_age: None,
            body_type: None,
            source: MeasurementSource::VendorImport,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DuplicateGroup {
    pub date: NaiveDate,
    pub count: usize,
}

/// How same-day readings are resolved before persistence
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportStrategy {
    #[default]
    KeepAll,
    Average,
}

impl ImportStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportStrategy::KeepAll => "keep_all",
            ImportStrategy::Average => "average",
        }
    }
}

impl fmt::Display for ImportStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImportStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "keep_all" => Ok(ImportStrategy::KeepAll),
            "average" => Ok(ImportStrategy::Average),
            other => Err(format!(
                "unknown strategy '{other}' (expected keep_all or average)"
            )),
        }
    }
}

/// Everything produced by parsing one file, before the user picks a strategy
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseResult {
    pub raw_records: Vec<RawVendorRecord>,
    pub canonical_records: Vec<CanonicalMeasurement>,
    pub grouped_by_date: BTreeMap<NaiveDate, Vec<CanonicalMeasurement>>,
    pub duplicate_groups: Vec<DuplicateGroup>,
    pub validation: ValidationOutcome,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    pub strategy: ImportStrategy,
    pub success_count: usize,
    pub failure_count: usize,
    pub errors: Vec<String>,
    pub final_records: Vec<CanonicalMeasurement>,
}
