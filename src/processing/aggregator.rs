use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::{debug, info, instrument};

use crate::models::{CanonicalMeasurement, ImportStrategy, MeasurementSource};

/// Decimal value of a reading as it was written in the export
fn to_decimal(value: f64) -> Option<Decimal> {
    // `Display` yields the shortest text that reads back to the same f64
    Decimal::from_str(&value.to_string()).ok()
}

/// Exact mean rounded to `dp` places, halves away from zero; `None` when empty
fn rounded_mean(values: &[Decimal], dp: u32) -> Option<Decimal> {
    let sum = values
        .iter()
        .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(*v))?;
    let mean = sum.checked_div(Decimal::from(values.len()))?;
    Some(mean.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero))
}

/// Round to one decimal place, halves away from zero
///
/// ```
/// use scale_import_service::processing::aggregator::round_to_tenth;
///
/// assert_eq!(round_to_tenth(71.25), 71.3);
/// assert_eq!(round_to_tenth(128.15), 128.2);
/// assert_eq!(round_to_tenth(-0.25), -0.3);
/// assert_eq!(round_to_tenth(70.0), 70.0);
/// ```
pub fn round_to_tenth(value: f64) -> f64 {
    to_decimal(value)
        .and_then(|d| {
            d.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
                .to_f64()
        })
        // Beyond decimal range
        .unwrap_or_else(|| (value * 10.0).round() / 10.0)
}

/// Mean rounded to a tenth, computed in decimal so midpoints like 128.15 round up
fn mean_tenth(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let exact = values
        .iter()
        .map(|v| to_decimal(*v))
        .collect::<Option<Vec<_>>>()
        .and_then(|decimals| rounded_mean(&decimals, 1))
        .and_then(|mean| mean.to_f64());

    exact.or_else(|| Some(round_to_tenth(values.iter().sum::<f64>() / values.len() as f64)))
}

/// Mean over the readings that carry a value; `None` when none do
fn mean_present<F>(day: &[CanonicalMeasurement], field: F) -> Option<f64>
where
    F: Fn(&CanonicalMeasurement) -> Option<f64>,
{
    let values: Vec<f64> = day.iter().filter_map(field).collect();
    mean_tenth(&values)
}

fn mean_whole<F>(day: &[CanonicalMeasurement], field: F) -> Option<i32>
where
    F: Fn(&CanonicalMeasurement) -> Option<i32>,
{
    let values: Vec<Decimal> = day.iter().filter_map(field).map(Decimal::from).collect();
    rounded_mean(&values, 0).and_then(|mean| mean.to_i32())
}

/// Collapse one day's readings into a single averaged record
fn average_day(date: NaiveDate, day: &[CanonicalMeasurement]) -> Option<CanonicalMeasurement> {
    let first = day.first()?;
    let core = |field: fn(&CanonicalMeasurement) -> f64| {
        let values: Vec<f64> = day.iter().map(field).collect();
        mean_tenth(&values).unwrap_or_default()
    };

    Some(CanonicalMeasurement {
        date,
        time: first.time.clone(),
        weight_kg: core(|m| m.weight_kg),
        bmi: core(|m| m.bmi),
        body_fat_pct: core(|m| m.body_fat_pct),
        skeletal_muscle_pct: mean_present(day, |m| m.skeletal_muscle_pct),
        fat_free_weight_kg: mean_present(day, |m| m.fat_free_weight_kg),
        subcutaneous_fat_pct: mean_present(day, |m| m.subcutaneous_fat_pct),
        visceral_fat: mean_present(day, |m| m.visceral_fat),
        body_water_pct: mean_present(day, |m| m.body_water_pct),
        muscle_mass_kg: mean_present(day, |m| m.muscle_mass_kg),
        bone_mass_kg: mean_present(day, |m| m.bone_mass_kg),
        protein_pct: mean_present(day, |m| m.protein_pct),
        basal_metabolic_rate_kcal: mean_whole(day, |m| m.basal_metabolic_rate_kcal),
        metabolic_age: mean_whole(day, |m| m.metabolic_age),
        body_type: mean_whole(day, |m| m.body_type),
        source: MeasurementSource::VendorImport,
    })
}

/// Resolve grouped readings into the final record set.
///
/// `KeepAll` flattens every record in date order. `Average` emits one record per date.
#[instrument(skip(by_date), fields(dates = by_date.len(), strategy = %strategy))]
pub fn aggregate(
    by_date: &BTreeMap<NaiveDate, Vec<CanonicalMeasurement>>,
    strategy: ImportStrategy,
) -> Vec<CanonicalMeasurement> {
    let records: Vec<CanonicalMeasurement> = match strategy {
        ImportStrategy::KeepAll => by_date.values().flatten().cloned().collect(),
        ImportStrategy::Average => by_date
            .iter()
            .filter_map(|(date, day)| average_day(*date, day))
            .collect(),
    };

    debug!("Aggregated {} dates", by_date.len());
    info!("{} strategy produced {} records", strategy, records.len());
    records
}
