pub mod error;
pub mod measurement_repository;
pub mod memory_store;
pub mod store;

pub use error::DbError;
pub use measurement_repository::MeasurementRepository;
pub use memory_store::InMemoryMeasurementStore;
pub use store::{MeasurementStore, StoreOutcome};
