use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::debug;

use crate::models::{CanonicalMeasurement, DuplicateGroup};

#[derive(Debug, Clone, Default)]
pub struct GroupedMeasurements {
    /// Records per calendar date, input order preserved within a date
    pub by_date: BTreeMap<NaiveDate, Vec<CanonicalMeasurement>>,
    /// Dates holding more than one record, in date order
    pub duplicates: Vec<DuplicateGroup>,
}

/// Partition measurements by calendar date.
///
/// Time of day is ignored: two readings on the same date are duplicates.
pub fn group_by_date(records: &[CanonicalMeasurement]) -> GroupedMeasurements {
    let mut by_date: BTreeMap<NaiveDate, Vec<CanonicalMeasurement>> = BTreeMap::new();
    for record in records {
        by_date.entry(record.date).or_default().push(record.clone());
    }

    let duplicates: Vec<DuplicateGroup> = by_date
        .iter()
        .filter(|(_, day)| day.len() > 1)
        .map(|(date, day)| DuplicateGroup {
            date: *date,
            count: day.len(),
        })
        .collect();

    debug!(
        "Grouped {} records into {} dates ({} with duplicates)",
        records.len(),
        by_date.len(),
        duplicates.len()
    );

    GroupedMeasurements {
        by_date,
        duplicates,
    }
}
