use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;
use tracing::{debug, info, instrument};

use crate::import_error::ImportError;
use crate::models::{CanonicalMeasurement, MeasurementSource, RawVendorRecord};

/// Two-digit years at or above this value belong to the 1900s
pub const CENTURY_PIVOT: u32 = 50;

fn vendor_date_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{2}|\d{4})$").expect("vendor date regex is valid")
    })
}

/// Expand a two-digit year around `CENTURY_PIVOT`
///
/// ```
/// use scale_import_service::importers::record_transformer::expand_two_digit_year;
///
/// assert_eq!(expand_two_digit_year(24), 2024);
/// assert_eq!(expand_two_digit_year(75), 1975);
/// assert_eq!(expand_two_digit_year(50), 1950);
/// assert_eq!(expand_two_digit_year(49), 2049);
/// ```
pub fn expand_two_digit_year(yy: u32) -> i32 {
    if yy >= CENTURY_PIVOT {
        1900 + yy as i32
    } else {
        2000 + yy as i32
    }
}

/// Parse a vendor `DD/MM/YY` date (a four-digit year is taken as-is)
pub fn parse_vendor_date(value: &str) -> Result<NaiveDate, String> {
    let value = value.trim();
    if value.is_empty() {
        return Err("missing date".to_string());
    }

    let caps = vendor_date_regex()
        .captures(value)
        .ok_or_else(|| format!("invalid date '{value}', expected DD/MM/YY"))?;

    // The regex only admits digits, so these parses cannot overflow
    let day: u32 = caps[1].parse().map_err(|_| format!("invalid day in '{value}'"))?;
    let month: u32 = caps[2].parse().map_err(|_| format!("invalid month in '{value}'"))?;
    let year_text = &caps[3];
    let year_digits: u32 = year_text
        .parse()
        .map_err(|_| format!("invalid year in '{value}'"))?;
    let year = if year_text.len() == 2 {
        expand_two_digit_year(year_digits)
    } else {
        year_digits as i32
    };

    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| format!("invalid calendar date '{value}'"))
}

/// Coerce a cell to a number, accepting a decimal comma
pub fn parse_number(value: Option<&str>) -> Option<f64> {
    let value = value?.trim();
    if value.is_empty() {
        return None;
    }
    value
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
}

/// Whole-number cell; values outside `i32` are treated as missing
fn parse_whole(value: Option<&str>) -> Option<i32> {
    parse_number(value).and_then(|n| i32::try_from(n.round() as i64).ok())
}

/// Convert one raw row into a canonical measurement
pub fn transform_record(raw: &RawVendorRecord) -> Result<CanonicalMeasurement, ImportError> {
    let date = parse_vendor_date(&raw.date).map_err(|reason| ImportError::Transform {
        row_index: raw.row_number,
        reason,
    })?;

    // Core fields fall back to zero so the validator flags them as out of range
    let core = |value: &str| parse_number(Some(value)).unwrap_or(0.0);

    Ok(CanonicalMeasurement {
        date,
        time: raw.time.trim().to_string(),
        weight_kg: core(&raw.weight),
        bmi: core(&raw.bmi),
        body_fat_pct: core(&raw.body_fat),
        skeletal_muscle_pct: parse_number(raw.skeletal_muscle.as_deref()),
        fat_free_weight_kg: parse_number(raw.fat_free_weight.as_deref()),
        subcutaneous_fat_pct: parse_number(raw.subcutaneous_fat.as_deref()),
        visceral_fat: parse_number(raw.visceral_fat.as_deref()),
        body_water_pct: parse_number(raw.body_water.as_deref()),
        muscle_mass_kg: parse_number(raw.muscle_mass.as_deref()),
        bone_mass_kg: parse_number(raw.bone_mass.as_deref()),
        protein_pct: parse_number(raw.protein.as_deref()),
        basal_metabolic_rate_kcal: parse_whole(raw.basal_metabolic_rate.as_deref()),
        metabolic_age: parse_whole(raw.metabolic_age.as_deref()),
        body_type: parse_whole(raw.body_type.as_deref()),
        source: MeasurementSource::VendorImport,
    })
}

/// Convert all raw rows, stopping at the first malformed date
#[instrument(skip(records), fields(count = records.len()))]
pub fn transform(records: &[RawVendorRecord]) -> Result<Vec<CanonicalMeasurement>, ImportError> {
    let measurements = records
        .iter()
        .map(transform_record)
        .collect::<Result<Vec<_>, _>>()?;

    debug!(
        "First measurement date: {:?}",
        measurements.first().map(|m| m.date)
    );
    info!("Transformed {} rows", measurements.len());
    Ok(measurements)
}
