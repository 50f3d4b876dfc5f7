use chrono::{Local, NaiveDate};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::config::Config;
use crate::db::MeasurementStore;
use crate::import_error::ImportError;
use crate::importers::{check_upload, decode, decode_text, transform};
use crate::models::{ImportResult, ImportStrategy, ParseResult};
use crate::processing::{aggregate, group_by_date};
use crate::validation::validate;

/// Orchestrates vendor CSV imports.
///
/// Holds no per-import state: `parse_*` produces a `ParseResult` and `commit_import`
/// turns one into an `ImportResult`, so a failed commit can be retried with the same
/// parse result.
#[derive(Debug, Clone)]
pub struct ImportService {
    max_upload_bytes: u64,
}

impl ImportService {
    pub fn new(max_upload_bytes: u64) -> Self {
        Self { max_upload_bytes }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.max_upload_bytes)
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_bytes
    }

    /// Read a file from disk and parse it
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn parse_file(&self, path: &Path) -> Result<ParseResult, ImportError> {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default();

        // Size and extension are checked before the file is read
        let metadata = tokio::fs::metadata(path).await.map_err(|e| {
            ImportError::InvalidFile(format!("cannot read '{}': {e}", path.display()))
        })?;
        check_upload(file_name, metadata.len(), self.max_upload_bytes)?;

        let bytes = tokio::fs::read(path).await.map_err(|e| {
            ImportError::InvalidFile(format!("cannot read '{}': {e}", path.display()))
        })?;
        self.parse_upload(file_name, &bytes)
    }

    /// Parse uploaded bytes after the boundary checks
    #[instrument(skip(self, bytes), fields(file_name = %file_name, size = bytes.len()))]
    pub fn parse_upload(&self, file_name: &str, bytes: &[u8]) -> Result<ParseResult, ImportError> {
        check_upload(file_name, bytes.len() as u64, self.max_upload_bytes)?;
        let content = decode_text(bytes);
        self.parse(&content)
    }

    /// Parse decoded text, validating dates against today's local date
    pub fn parse(&self, content: &str) -> Result<ParseResult, ImportError> {
        self.parse_as_of(content, Local::now().date_naive())
    }

    /// Decode, transform, group and validate
    pub fn parse_as_of(&self, content: &str, today: NaiveDate) -> Result<ParseResult, ImportError> {
        let start_time = Instant::now();

        let raw_records = decode(content)?;
        let canonical_records = transform(&raw_records)?;
        let grouped = group_by_date(&canonical_records);
        let validation = validate(&canonical_records, &grouped.duplicates, today);

        info!(
            "Parsed {} measurements across {} dates in {:.1}ms (valid: {})",
            canonical_records.len(),
            grouped.by_date.len(),
            start_time.elapsed().as_secs_f64() * 1000.0,
            validation.is_valid
        );

        Ok(ParseResult {
            raw_records,
            canonical_records,
            grouped_by_date: grouped.by_date,
            duplicate_groups: grouped.duplicates,
            validation,
        })
    }

    /// Aggregate a parse result with `strategy` and hand it to `store`.
    ///
    /// Refuses parse results that failed validation without touching the store.
    /// Store failures are returned as-is, never retried here.
    #[instrument(skip(self, parsed, store), fields(strategy = %strategy))]
    pub async fn commit_import(
        &self,
        parsed: &ParseResult,
        strategy: ImportStrategy,
        store: &dyn MeasurementStore,
    ) -> Result<ImportResult, ImportError> {
        if !parsed.validation.is_valid {
            let error_count = parsed.validation.errors.len();
            warn!("Refusing to import: {} validation errors", error_count);
            return Err(ImportError::ValidationBlocked { error_count });
        }

        let final_records = aggregate(&parsed.grouped_by_date, strategy);
        debug!("Handing {} records to store", final_records.len());

        let outcome = store.store_batch(&final_records).await?;

        info!(
            "✓ Import complete: {} stored, {} failed",
            outcome.stored, outcome.failed
        );

        Ok(ImportResult {
            strategy,
            success_count: outcome.stored,
            failure_count: outcome.failed,
            errors: outcome.errors,
            final_records,
        })
    }
}
