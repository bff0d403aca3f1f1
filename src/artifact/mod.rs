// src/artifact/mod.rs
//! The consolidated workbook handed from the batch run to everything that
//! browses, searches or reports on the data.

use calamine::{open_workbook_auto, Reader};
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use std::{fs, path::Path};
use tracing::{info, instrument};

use crate::error::ArtifactError;
use crate::record::{CanonicalField, CanonicalRecord, Dataset};
use crate::sheet::{Cell, RawSheet};

pub const SHEET_NAME: &str = "All Data";

fn write_cell(ws: &mut Worksheet, row: u32, col: u16, cell: &Cell) -> Result<(), XlsxError> {
    match cell {
        Cell::Empty => {}
        Cell::Int(i) => {
            ws.write_number(row, col, *i as f64)?;
        }
        Cell::Float(f) if f.is_finite() => {
            ws.write_number(row, col, *f)?;
        }
        Cell::Float(f) => {
            ws.write_string(row, col, f.to_string())?;
        }
        Cell::Text(s) => {
            ws.write_string(row, col, s)?;
        }
        Cell::Bool(b) => {
            ws.write_boolean(row, col, *b)?;
        }
    }
    Ok(())
}

/// Write every record under the canonical header row. Numbers stay numeric.
#[instrument(level = "info", skip(records, path), fields(path = %path.as_ref().display(), rows = records.len()))]
pub fn write_artifact<P: AsRef<Path>>(
    records: &[CanonicalRecord],
    path: P,
) -> Result<(), ArtifactError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let ws = workbook.add_worksheet();
    ws.set_name(SHEET_NAME)?;

    for (c, header) in CanonicalField::headers().into_iter().enumerate() {
        ws.write_string_with_format(0, c as u16, header, &bold)?;
    }
    for (r, record) in records.iter().enumerate() {
        let row = r as u32 + 1;
        for (c, cell) in record.cells().iter().enumerate() {
            write_cell(ws, row, c as u16, cell)?;
        }
    }

    workbook.save(path)?;
    info!("artifact written");
    Ok(())
}

/// Read every data row back, unfiltered. The header row must match the
/// canonical one exactly.
pub fn read_artifact<P: AsRef<Path>>(path: P) -> Result<Vec<CanonicalRecord>, ArtifactError> {
    let path = path.as_ref();
    let mut workbook = open_workbook_auto(path).map_err(|e| ArtifactError::Open {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ArtifactError::NoWorksheet(path.to_path_buf()))?
        .map_err(|e| ArtifactError::Open {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    let sheet = RawSheet::from_range(&range);

    let mut rows = sheet.rows.into_iter();
    let found: Vec<String> = rows
        .next()
        .unwrap_or_default()
        .iter()
        .map(|c| c.to_string().trim().to_string())
        .collect();
    let expected: Vec<String> = CanonicalField::headers()
        .into_iter()
        .map(String::from)
        .collect();
    if found != expected {
        return Err(ArtifactError::HeaderMismatch { expected, found });
    }

    Ok(rows
        .map(|row| CanonicalRecord::from_row(row.into_iter().map(Cell::normalized).collect()))
        .collect())
}

/// Read the artifact and drop rows that carry no real student ID.
#[instrument(level = "info", skip(path), fields(path = %path.as_ref().display()))]
pub fn load_dataset<P: AsRef<Path>>(path: P, min_id_len: usize) -> Result<Dataset, ArtifactError> {
    let records = read_artifact(path)?;
    let dataset = Dataset::from_records(records, min_id_len);
    info!("loaded {} records", dataset.len());
    Ok(dataset)
}
