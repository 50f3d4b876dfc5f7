//! Vendor scale CSV decoder
//!
//! Maps the vendor's Spanish, partly whitespace-prefixed column headers onto
//! `RawVendorRecord`. Purely structural: values are kept as text, ranges are not checked.

use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::import_error::ImportError;
use crate::models::RawVendorRecord;

/// Known columns of the vendor export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VendorColumn {
    Date,
    Time,
    Weight,
    Bmi,
    BodyFat,
    SkeletalMuscle,
    FatFreeWeight,
    SubcutaneousFat,
    VisceralFat,
    BodyWater,
    MuscleMass,
    BoneMass,
    Protein,
    BasalMetabolicRate,
    MetabolicAge,
    BodyType,
}

impl VendorColumn {
    pub const ALL: [VendorColumn; 16] = [
        VendorColumn::Date,
        VendorColumn::Time,
        VendorColumn::Weight,
        VendorColumn::Bmi,
        VendorColumn::BodyFat,
        VendorColumn::SkeletalMuscle,
        VendorColumn::FatFreeWeight,
        VendorColumn::SubcutaneousFat,
        VendorColumn::VisceralFat,
        VendorColumn::BodyWater,
        VendorColumn::MuscleMass,
        VendorColumn::BoneMass,
        VendorColumn::Protein,
        VendorColumn::BasalMetabolicRate,
        VendorColumn::MetabolicAge,
        VendorColumn::BodyType,
    ];

    pub const REQUIRED: [VendorColumn; 5] = [
        VendorColumn::Date,
        VendorColumn::Time,
        VendorColumn::Weight,
        VendorColumn::Bmi,
        VendorColumn::BodyFat,
    ];

    /// Header exactly as the vendor writes it
    pub fn header(&self) -> &'static str {
        match self {
            VendorColumn::Date => "Fecha",
            VendorColumn::Time => " Hora",
            VendorColumn::Weight => " Peso(kg)",
            VendorColumn::Bmi => "IMC",
            VendorColumn::BodyFat => "Grasa corporal(%)",
            VendorColumn::SkeletalMuscle => "Músculo esquelético(%)",
            VendorColumn::FatFreeWeight => "Peso corporal sin grasa(kg)",
            VendorColumn::SubcutaneousFat => "Grasa subcutánea(%)",
            VendorColumn::VisceralFat => "Grasa visceral",
            VendorColumn::BodyWater => "Agua corporal(%)",
            VendorColumn::MuscleMass => "Masa muscular(kg)",
            VendorColumn::BoneMass => "Masa ósea(kg)",
            VendorColumn::Protein => "Proteína (%)",
            VendorColumn::BasalMetabolicRate => "Tasa Metabólica Basal(kcal)",
            VendorColumn::MetabolicAge => "Edad metabólica",
            VendorColumn::BodyType => "Tipo de cuerpo",
        }
    }

    /// Match a header cell, ignoring surrounding whitespace
    pub fn from_header(cell: &str) -> Option<Self> {
        let cell = cell.trim();
        Self::ALL
            .into_iter()
            .find(|column| column.header().trim() == cell)
    }
}

/// Pick the delimiter that occurs most often in the header line.
///
/// Exports from Spanish-locale phones use `;` so that decimal commas survive.
pub fn detect_delimiter(content: &str) -> u8 {
    let header = content.lines().next().unwrap_or_default();
    [b',', b';', b'\t']
        .into_iter()
        .map(|d| (d, header.bytes().filter(|b| *b == d).count()))
        .filter(|(_, count)| *count > 0)
        .max_by_key(|(_, count)| *count)
        .map(|(d, _)| d)
        .unwrap_or(b',')
}

/// Decode CSV text into raw vendor records.
///
/// Fails with `InvalidFormat` when required columns are missing, `EmptyInput` when
/// there are no data rows, and `Transform` when a row cannot be read.
pub fn decode(content: &str) -> Result<Vec<RawVendorRecord>, ImportError> {
    let delimiter = detect_delimiter(content);
    debug!("Using delimiter {:?}", delimiter as char);

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(content.as_bytes());

    let headers = reader.headers()?.clone();
    let columns = map_columns(&headers)?;

    let mut records = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let row_number = index + 1;
        let row = result.map_err(|e| ImportError::Transform {
            row_index: row_number,
            reason: format!("unreadable row: {e}"),
        })?;
        records.push(to_raw_record(row_number, &row, &columns));
    }

    if records.is_empty() {
        return Err(ImportError::EmptyInput);
    }

    info!(
        "Decoded {} rows ({} known columns)",
        records.len(),
        columns.len()
    );
    Ok(records)
}

fn map_columns(headers: &StringRecord) -> Result<HashMap<VendorColumn, usize>, ImportError> {
    let mut columns = HashMap::new();
    for (idx, cell) in headers.iter().enumerate() {
        match VendorColumn::from_header(cell) {
            Some(column) => {
                columns.entry(column).or_insert(idx);
            }
            None => debug!("Ignoring unknown column '{}'", cell),
        }
    }

    let missing: Vec<String> = VendorColumn::REQUIRED
        .iter()
        .filter(|column| !columns.contains_key(*column))
        .map(|column| column.header().trim().to_string())
        .collect();

    if !missing.is_empty() {
        return Err(ImportError::InvalidFormat { missing });
    }

    Ok(columns)
}

fn to_raw_record(
    row_number: usize,
    row: &StringRecord,
    columns: &HashMap<VendorColumn, usize>,
) -> RawVendorRecord {
    let cell = |column: VendorColumn| -> Option<String> {
        columns
            .get(&column)
            .and_then(|idx| row.get(*idx))
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    };
    let required = |column: VendorColumn| cell(column).unwrap_or_default();

    RawVendorRecord {
        row_number,
        date: required(VendorColumn::Date),
        time: required(VendorColumn::Time),
        weight: required(VendorColumn::Weight),
        bmi: required(VendorColumn::Bmi),
        body_fat: required(VendorColumn::BodyFat),
        skeletal_muscle: cell(VendorColumn::SkeletalMuscle),
        fat_free_weight: cell(VendorColumn::FatFreeWeight),
        subcutaneous_fat: cell(VendorColumn::SubcutaneousFat),
        visceral_fat: cell(VendorColumn::VisceralFat),
        body_water: cell(VendorColumn::BodyWater),
        muscle_mass: cell(VendorColumn::MuscleMass),
        bone_mass: cell(VendorColumn::BoneMass),
        protein: cell(VendorColumn::Protein),
        basal_metabolic_rate: cell(VendorColumn::BasalMetabolicRate),
        metabolic_age: cell(VendorColumn::MetabolicAge),
        body_type: cell(VendorColumn::BodyType),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Fecha, Hora, Peso(kg),IMC,Grasa corporal(%),Músculo esquelético(%),Edad metabólica";

    #[test]
    fn test_decode_maps_vendor_columns() {
        let content = format!("{HEADER}\n15/03/24,07:31,70.5,22.1,18.4,40.2,35\n");
        let records = decode(&content).unwrap();

        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.row_number, 1);
        assert_eq!(r.date, "15/03/24");
        assert_eq!(r.time, "07:31");
        assert_eq!(r.weight, "70.5");
        assert_eq!(r.bmi, "22.1");
        assert_eq!(r.body_fat, "18.4");
        assert_eq!(r.skeletal_muscle.as_deref(), Some("40.2"));
        assert_eq!(r.metabolic_age.as_deref(), Some("35"));
        assert_eq!(r.body_water, None);
    }

    #[test]
    fn test_missing_bmi_column_is_invalid_format() {
        let content = "Fecha, Hora, Peso(kg),Grasa corporal(%)\n15/03/24,07:31,70.5,18.4\n";
        match decode(content).unwrap_err() {
            ImportError::InvalidFormat { missing } => assert_eq!(missing, vec!["IMC"]),
            other => panic!("Expected InvalidFormat, got {other:?}"),
        }
    }

    #[test]
    fn test_header_only_is_empty_input() {
        let err = decode(&format!("{HEADER}\n")).unwrap_err();
        assert!(matches!(err, ImportError::EmptyInput));
    }

    #[test]
    fn test_headers_match_without_leading_whitespace() {
        let content = "Fecha,Hora,Peso(kg),IMC,Grasa corporal(%)\n01/01/24,08:00,70,22,18\n";
        let records = decode(content).unwrap();
        assert_eq!(records[0].time, "08:00");
        assert_eq!(records[0].weight, "70");
    }

    #[test]
    fn test_semicolon_export_with_decimal_commas() {
        let content = "Fecha; Hora; Peso(kg);IMC;Grasa corporal(%)\n01/01/24;08:00;70,5;22,1;18\n";
        assert_eq!(detect_delimiter(content), b';');
        let records = decode(content).unwrap();
        assert_eq!(records[0].weight, "70,5");
    }

    #[test]
    fn test_ragged_row_reports_row_number() {
        let content = format!("{HEADER}\n15/03/24,07:31,70.5,22.1,18.4,40.2,35\n16/03/24,07:31\n");
        match decode(&content).unwrap_err() {
            ImportError::Transform { row_index, .. } => assert_eq!(row_index, 2),
            other => panic!("Expected Transform, got {other:?}"),
        }
    }

    #[test]
    fn test_blank_optional_cell_is_none() {
        let content = format!("{HEADER}\n15/03/24,07:31,70.5,22.1,18.4,,35\n");
        let records = decode(&content).unwrap();
        assert_eq!(records[0].skeletal_muscle, None);
    }
}
