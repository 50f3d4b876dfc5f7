// Vendor file importers: upload checks, CSV field mapping and record normalization

pub mod record_transformer;
pub mod upload;
pub mod vendor_csv;

// Re-export commonly used items
pub use record_transformer::{parse_vendor_date, transform};
pub use upload::{check_upload, decode_text, DEFAULT_MAX_UPLOAD_BYTES};
pub use vendor_csv::{decode, VendorColumn};
