// Same-day grouping and duplicate resolution for canonical measurements

pub mod aggregator;
pub mod duplicate_grouper;

pub use aggregator::aggregate;
pub use duplicate_grouper::{group_by_date, GroupedMeasurements};
