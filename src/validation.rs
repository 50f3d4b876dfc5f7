//! Content validation for canonical measurements
//!
//! Never fails: every finding is collected so the caller can show them together.
//! Errors block an import, warnings are informational.

use chrono::{Months, NaiveDate};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::models::{CanonicalMeasurement, DuplicateGroup};

/// Result of validating one parsed file
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationOutcome {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub is_valid: bool,
}

impl ValidationOutcome {
    fn from_findings(findings: Findings) -> Self {
        Self {
            is_valid: findings.errors.is_empty(),
            errors: findings.errors,
            warnings: findings.warnings,
        }
    }
}

#[derive(Debug, Default)]
struct Findings {
    errors: Vec<String>,
    warnings: Vec<String>,
}

/// Inclusive plausibility band for one field
#[derive(Debug, Clone, Copy)]
pub struct FieldRange {
    pub label: &'static str,
    pub unit: &'static str,
    pub min: f64,
    pub max: f64,
}

impl FieldRange {
    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

pub const WEIGHT_RANGE: FieldRange = FieldRange {
    label: "weight",
    unit: " kg",
    min: 30.0,
    max: 300.0,
};

pub const BMI_RANGE: FieldRange = FieldRange {
    label: "BMI",
    unit: "",
    min: 10.0,
    max: 60.0,
};

pub const BODY_FAT_RANGE: FieldRange = FieldRange {
    label: "body fat",
    unit: "%",
    min: 3.0,
    max: 70.0,
};

pub const SKELETAL_MUSCLE_RANGE: FieldRange = FieldRange {
    label: "Skeletal muscle",
    unit: "%",
    min: 10.0,
    max: 60.0,
};

pub const BODY_WATER_RANGE: FieldRange = FieldRange {
    label: "Body water",
    unit: "%",
    min: 30.0,
    max: 80.0,
};

pub const VISCERAL_FAT_RANGE: FieldRange = FieldRange {
    label: "Visceral fat",
    unit: "",
    min: 1.0,
    max: 30.0,
};

pub const BMR_RANGE: FieldRange = FieldRange {
    label: "Basal metabolic rate",
    unit: " kcal",
    min: 800.0,
    max: 4000.0,
};

pub const METABOLIC_AGE_RANGE: FieldRange = FieldRange {
    label: "Metabolic age",
    unit: " years",
    min: 10.0,
    max: 100.0,
};

/// Implied height bounds (meters) for the BMI consistency check
pub const HEIGHT_RANGE_M: (f64, f64) = (1.2, 2.5);

/// Readings older than this many years draw a warning
pub const MAX_AGE_YEARS: u32 = 10;

/// Date spans longer than this many days draw a warning
pub const MAX_SPAN_DAYS: i64 = 365;

/// Validate measurements as of `today`.
#[instrument(skip(records, duplicates), fields(count = records.len()))]
pub fn validate(
    records: &[CanonicalMeasurement],
    duplicates: &[DuplicateGroup],
    today: NaiveDate,
) -> ValidationOutcome {
    let mut findings = Findings::default();

    if records.is_empty() {
        findings
            .errors
            .push("No measurements found in file".to_string());
        return ValidationOutcome::from_findings(findings);
    }

    check_ranges(records, &mut findings);
    check_dates(records, today, &mut findings);
    check_bmi_consistency(records, &mut findings);
    summarize_duplicates(duplicates, &mut findings);

    let outcome = ValidationOutcome::from_findings(findings);
    info!(
        "Validation finished: {} errors, {} warnings",
        outcome.errors.len(),
        outcome.warnings.len()
    );
    outcome
}

/// Hard limit: out-of-range values are errors tagged with the 1-based row
fn check_required(row: usize, value: f64, range: &FieldRange, findings: &mut Findings) {
    if value < range.min {
        findings.errors.push(format!(
            "Row {row}: Minimum {} is {}{} (got {value}{})",
            range.label, range.min, range.unit, range.unit
        ));
    } else if value > range.max {
        findings.errors.push(format!(
            "Row {row}: Maximum {} is {}{} (got {value}{})",
            range.label, range.max, range.unit, range.unit
        ));
    }
}

fn check_advisory(row: usize, value: Option<f64>, range: &FieldRange, findings: &mut Findings) {
    let Some(value) = value else {
        return;
    };
    if !range.contains(value) {
        findings.warnings.push(format!(
            "Row {row}: {} {value}{} is outside the expected range {}-{}{}",
            range.label, range.unit, range.min, range.max, range.unit
        ));
    }
}

fn check_ranges(records: &[CanonicalMeasurement], findings: &mut Findings) {
    for (idx, m) in records.iter().enumerate() {
        let row = idx + 1;
        check_required(row, m.weight_kg, &WEIGHT_RANGE, findings);
        check_required(row, m.bmi, &BMI_RANGE, findings);
        check_required(row, m.body_fat_pct, &BODY_FAT_RANGE, findings);

        check_advisory(row, m.skeletal_muscle_pct, &SKELETAL_MUSCLE_RANGE, findings);
        check_advisory(row, m.body_water_pct, &BODY_WATER_RANGE, findings);
        check_advisory(row, m.visceral_fat, &VISCERAL_FAT_RANGE, findings);
        check_advisory(
            row,
            m.basal_metabolic_rate_kcal.map(f64::from),
            &BMR_RANGE,
            findings,
        );
        check_advisory(
            row,
            m.metabolic_age.map(f64::from),
            &METABOLIC_AGE_RANGE,
            findings,
        );
    }
}

fn check_dates(records: &[CanonicalMeasurement], today: NaiveDate, findings: &mut Findings) {
    let future: Vec<NaiveDate> = records
        .iter()
        .map(|m| m.date)
        .filter(|d| *d > today)
        .collect();
    if let Some(latest) = future.iter().max() {
        findings.warnings.push(format!(
            "{} measurement(s) dated in the future (latest {latest})",
            future.len()
        ));
    }

    if let Some(cutoff) = today.checked_sub_months(Months::new(MAX_AGE_YEARS * 12)) {
        let stale: Vec<NaiveDate> = records
            .iter()
            .map(|m| m.date)
            .filter(|d| *d < cutoff)
            .collect();
        if let Some(oldest) = stale.iter().min() {
            findings.warnings.push(format!(
                "{} measurement(s) older than {MAX_AGE_YEARS} years (oldest {oldest})",
                stale.len()
            ));
        }
    }

    let first = records.iter().map(|m| m.date).min();
    let last = records.iter().map(|m| m.date).max();
    if let (Some(first), Some(last)) = (first, last) {
        let span = (last - first).num_days();
        debug!("Measurements span {} days", span);
        if span > MAX_SPAN_DAYS {
            findings.warnings.push(format!(
                "Data spans {span} days ({first} to {last})"
            ));
        }
    }
}

/// Implied height from weight and BMI, when both are positive
pub fn implied_height_m(weight_kg: f64, bmi: f64) -> Option<f64> {
    (weight_kg > 0.0 && bmi > 0.0).then(|| (weight_kg / bmi).sqrt())
}

fn check_bmi_consistency(records: &[CanonicalMeasurement], findings: &mut Findings) {
    let (min_height, max_height) = HEIGHT_RANGE_M;
    let inconsistent = records
        .iter()
        .filter_map(|m| implied_height_m(m.weight_kg, m.bmi))
        .filter(|h| !(min_height..=max_height).contains(h))
        .count();

    if inconsistent > 0 {
        findings.warnings.push(format!(
            "{inconsistent} measurement(s) have a BMI inconsistent with weight \
             (implied height outside {min_height}-{max_height} m)"
        ));
    }
}

fn summarize_duplicates(duplicates: &[DuplicateGroup], findings: &mut Findings) {
    if duplicates.is_empty() {
        return;
    }
    findings.warnings.push(format!(
        "{} date(s) have more than one measurement",
        duplicates.len()
    ));
    for group in duplicates {
        findings
            .warnings
            .push(format!("{}: {} measurements", group.date, group.count));
    }
}
