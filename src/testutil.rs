use anyhow::Result;
use rust_xlsxwriter::Workbook;
use std::{fs, path::Path};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::sheet::{Cell, RawSheet};

pub fn init_test_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,transcripts=debug")),
        )
        .with_test_writer()
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

pub fn text_row(cells: &[&str]) -> Vec<Cell> {
    cells.iter().map(|s| Cell::from(*s)).collect()
}

pub fn sheet_of(rows: Vec<Vec<Cell>>) -> RawSheet {
    RawSheet::new(rows)
}

/// Write `rows` as the first worksheet of a fresh `.xlsx`, creating parent
/// directories. Empty cells are left unwritten.
pub fn write_xlsx(path: &Path, rows: &[Vec<Cell>]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (r, row) in rows.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            let (r, c) = (r as u32, c as u16);
            match cell {
                Cell::Empty => {}
                Cell::Int(i) => {
                    sheet.write_number(r, c, *i as f64)?;
                }
                Cell::Float(f) => {
                    sheet.write_number(r, c, *f)?;
                }
                Cell::Text(s) if s.is_empty() => {}
                Cell::Text(s) => {
                    sheet.write_string(r, c, s)?;
                }
                Cell::Bool(b) => {
                    sheet.write_boolean(r, c, *b)?;
                }
            }
        }
    }
    workbook.save(path)?;
    Ok(())
}

/// A faculty-style transcript sheet: title preamble, header with a split
/// name column, the given student rows, then a note and two footer rows.
pub fn transcript_rows(students: &[(&str, &str, &str, f64)]) -> Vec<Vec<Cell>> {
    let mut rows = vec![
        text_row(&["TRƯỜNG ĐẠI HỌC NGOẠI NGỮ"]),
        text_row(&["BẢNG ĐIỂM TỔNG HỢP HỌC KỲ"]),
        text_row(&[]),
        text_row(&[
            "STT",
            "Mã SV",
            "Họ và tên",
            "",
            "Tổng số\ntín chỉ",
            "Tổng số TCTL",
            "Điểm\nTBTL",
            "Số TC học/thi lại",
        ]),
    ];
    for (i, (id, family, given, score)) in students.iter().enumerate() {
        rows.push(vec![
            Cell::Float((i + 1) as f64),
            Cell::from(*id),
            Cell::from(*family),
            Cell::from(*given),
            Cell::Float(30.0),
            Cell::Float(27.0),
            Cell::Float(*score),
            Cell::Float(3.0),
        ]);
    }
    rows.push(text_row(&["Ghi chú: SV học lại liên hệ phòng đào tạo"]));
    rows.push(text_row(&["Tổng cộng"]));
    rows.push(text_row(&["Người lập biểu"]));
    while rows.len() < 10 {
        rows.insert(3, text_row(&[]));
    }
    rows
}
