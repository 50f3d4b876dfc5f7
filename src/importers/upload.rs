use std::path::Path;

use encoding_rs::WINDOWS_1252;
use tracing::{debug, warn};

use crate::import_error::ImportError;

/// Default upload ceiling (10 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

const UTF8_BOM: &str = "\u{feff}";

/// Reject files before any pipeline stage sees them.
///
/// Checks the `.csv` extension (case-insensitive), emptiness, and the size ceiling.
pub fn check_upload(file_name: &str, len: u64, max_bytes: u64) -> Result<(), ImportError> {
    let has_csv_extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

    if !has_csv_extension {
        return Err(ImportError::InvalidFile(format!(
            "'{file_name}' is not a .csv file"
        )));
    }

    if len == 0 {
        return Err(ImportError::InvalidFile(format!("'{file_name}' is empty")));
    }

    if len > max_bytes {
        return Err(ImportError::InvalidFile(format!(
            "'{file_name}' is {len} bytes, limit is {max_bytes} bytes"
        )));
    }

    debug!("Accepted upload {} ({} bytes)", file_name, len);
    Ok(())
}

/// Decode file bytes to text.
///
/// UTF-8 is tried first; anything else is read as Windows-1252, which is what the
/// vendor app emits on some desktop exports. A leading BOM is dropped.
pub fn decode_text(bytes: &[u8]) -> String {
    let text = match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            warn!("File is not valid UTF-8, decoding as Windows-1252");
            let (decoded, _, _) = WINDOWS_1252.decode(bytes);
            decoded.into_owned()
        }
    };

    match text.strip_prefix(UTF8_BOM) {
        Some(stripped) => stripped.to_string(),
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_csv_case_insensitive() {
        assert!(check_upload("export.csv", 10, DEFAULT_MAX_UPLOAD_BYTES).is_ok());
        assert!(check_upload("EXPORT.CSV", 10, DEFAULT_MAX_UPLOAD_BYTES).is_ok());
    }

    #[test]
    fn test_rejects_wrong_extension() {
        let err = check_upload("export.xlsx", 10, DEFAULT_MAX_UPLOAD_BYTES).unwrap_err();
        assert!(matches!(err, ImportError::InvalidFile(_)));

        let err = check_upload("export", 10, DEFAULT_MAX_UPLOAD_BYTES).unwrap_err();
        assert!(matches!(err, ImportError::InvalidFile(_)));
    }

    #[test]
    fn test_rejects_zero_bytes() {
        let err = check_upload("export.csv", 0, DEFAULT_MAX_UPLOAD_BYTES).unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_size_limit_is_inclusive() {
        assert!(check_upload("export.csv", 100, 100).is_ok());
        let err = check_upload("export.csv", 101, 100).unwrap_err();
        assert!(matches!(err, ImportError::InvalidFile(_)));
    }

    #[test]
    fn test_decode_strips_bom() {
        let bytes = "\u{feff}Fecha,IMC".as_bytes();
        assert_eq!(decode_text(bytes), "Fecha,IMC");
    }

    #[test]
    fn test_decode_windows_1252_fallback() {
        // "Músculo" with ú encoded as 0xFA
        let bytes = b"M\xfasculo";
        assert_eq!(decode_text(bytes), "Músculo");
    }
}
