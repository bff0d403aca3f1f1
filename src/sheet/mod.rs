// src/sheet/mod.rs
mod cell;

pub use cell::Cell;

use calamine::{open_workbook_auto, Data, Range, Reader};
use std::{fmt, path::Path};
use tracing::{debug, instrument};

use crate::config::ParseOptions;
use crate::error::SheetError;

/// Tokens that must both appear in the joined leading cells of the header row
/// (sequence-number and student-ID column titles).
pub const HEADER_MARKERS: [&str; 2] = ["STT", "Mã SV"];

/// Number of leading cells of a row joined together when looking for markers.
pub const MARKER_SCAN_WIDTH: usize = 5;

/// First worksheet of a source workbook, rows and columns at their physical
/// positions (leading empty rows/columns included).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSheet {
    pub rows: Vec<Vec<Cell>>,
}

/// A header cell: either a cleaned title, or a placeholder for an unlabeled
/// column. Placeholders are kept because they may carry pieces of a name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnLabel {
    Named(String),
    Missing,
}

impl ColumnLabel {
    /// Flatten embedded newlines and trim; empty titles become `Missing`.
    pub fn from_cell(cell: &Cell) -> Self {
        let text = cell.to_string().replace('\n', " ");
        let text = text.trim();
        if text.is_empty() {
            ColumnLabel::Missing
        } else {
            ColumnLabel::Named(text.to_string())
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, ColumnLabel::Missing)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ColumnLabel::Named(s) => Some(s),
            ColumnLabel::Missing => None,
        }
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.as_str().is_some_and(|s| s.contains(needle))
    }
}

impl fmt::Display for ColumnLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnLabel::Named(s) => f.write_str(s),
            ColumnLabel::Missing => f.write_str("<missing>"),
        }
    }
}

/// Header labels plus data rows of one sheet. Every row is as wide as
/// `headers`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedSheet {
    pub headers: Vec<ColumnLabel>,
    pub rows: Vec<Vec<Cell>>,
}

impl RawSheet {
    pub fn new(rows: Vec<Vec<Cell>>) -> Self {
        Self { rows }
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// calamine trims leading empty rows/columns off a range; pad them back so
    /// row counts and column positions match what the sheet actually holds.
    pub fn from_range(range: &Range<Data>) -> Self {
        let (row_off, col_off) = range
            .start()
            .map(|(r, c)| (r as usize, c as usize))
            .unwrap_or((0, 0));
        let width = col_off + range.width();

        let mut rows = Vec::with_capacity(row_off + range.height());
        rows.extend((0..row_off).map(|_| vec![Cell::Empty; width]));
        for row in range.rows() {
            let mut cells = Vec::with_capacity(width);
            cells.resize(col_off, Cell::Empty);
            cells.extend(row.iter().map(Cell::from));
            rows.push(cells);
        }
        Self { rows }
    }
}

/// Open `path` (any format calamine recognises) and read its first worksheet.
#[instrument(level = "debug", skip(path), fields(path = %path.as_ref().display()))]
pub fn load_first_sheet<P: AsRef<Path>>(path: P) -> Result<RawSheet, SheetError> {
    let path = path.as_ref();
    let unreadable = |reason: String| SheetError::UnreadableFile {
        path: path.to_path_buf(),
        reason,
    };

    let mut workbook = open_workbook_auto(path).map_err(|e| unreadable(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| unreadable("workbook has no worksheets".into()))?
        .map_err(|e| unreadable(e.to_string()))?;

    let sheet = RawSheet::from_range(&range);
    debug!(rows = sheet.height(), cols = sheet.width(), "loaded first worksheet");
    Ok(sheet)
}

/// Index of the first row among the leading `max_scan_depth` rows whose
/// first cells, joined with spaces, contain every header marker.
pub fn find_header_row(rows: &[Vec<Cell>], max_scan_depth: usize) -> Option<usize> {
    rows.iter().take(max_scan_depth).position(|row| {
        let joined = row
            .iter()
            .take(MARKER_SCAN_WIDTH)
            .map(Cell::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        HEADER_MARKERS.iter().all(|m| joined.contains(m))
    })
}

/// Locate the header row, label every column, and collect the data rows
/// between the header and the footer block.
pub fn parse_sheet(sheet: &RawSheet, opts: &ParseOptions) -> Result<ParsedSheet, SheetError> {
    // 1) reject sheets too small to hold a preamble, header and students
    let height = sheet.height();
    if height < opts.min_rows {
        return Err(SheetError::SheetTooSmall {
            rows: height,
            min: opts.min_rows,
        });
    }

    // 2) header row by marker scan
    let header_idx = find_header_row(&sheet.rows, opts.header_scan_depth).ok_or(
        SheetError::HeaderNotFound {
            depth: opts.header_scan_depth,
        },
    )?;

    // 3) one label per physical column, unlabeled ones included
    let width = sheet.width();
    let header_row = &sheet.rows[header_idx];
    let headers: Vec<ColumnLabel> = (0..width)
        .map(|c| {
            header_row
                .get(c)
                .map(ColumnLabel::from_cell)
                .unwrap_or(ColumnLabel::Missing)
        })
        .collect();

    // 4) data rows: after the header, before the footer block
    let data_end = height.saturating_sub(opts.footer_rows);
    let mut rows = Vec::new();
    for raw in sheet.rows.iter().take(data_end).skip(header_idx + 1) {
        let row: Vec<Cell> = (0..width)
            .map(|c| raw.get(c).cloned().unwrap_or_default().normalized())
            .collect();
        if row.iter().all(Cell::is_blank) {
            continue;
        }
        rows.push(row);
    }

    debug!(
        header_row = header_idx,
        columns = width,
        data_rows = rows.len(),
        "parsed sheet"
    );
    Ok(ParsedSheet { headers, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{init_test_logging, sheet_of, text_row, write_xlsx};
    use anyhow::Result;
    use tempfile::tempdir;

    fn transcript_sheet() -> RawSheet {
        sheet_of(vec![
            text_row(&["ĐẠI HỌC NGOẠI NGỮ"]),
            text_row(&["BẢNG ĐIỂM TỔNG HỢP"]),
            text_row(&[]),
            text_row(&["STT", "Mã SV", "Họ và tên", "", "Tổng số\ntín chỉ", "Điểm\nTBTL"]),
            vec![
                Cell::Float(1.0),
                Cell::from("21F7010001"),
                Cell::from("Nguyễn Văn"),
                Cell::from("An"),
                Cell::Float(30.0),
                Cell::Float(3.25),
            ],
            text_row(&["", "", "", "", "", ""]),
            vec![
                Cell::Float(2.0),
                Cell::from("21F7010002"),
                Cell::from("Trần Thị"),
                Cell::from("Bình"),
                Cell::Float(28.0),
                Cell::Float(2.0),
            ],
            text_row(&["", "  ", "", "", "", ""]),
            text_row(&["Ghi chú"]),
            text_row(&["Tổng cộng: 2"]),
            text_row(&["Người lập biểu"]),
        ])
    }

    #[test]
    fn header_row_found_by_markers() {
        let sheet = transcript_sheet();
        assert_eq!(find_header_row(&sheet.rows, 15), Some(3));
        assert_eq!(find_header_row(&sheet.rows, 3), None);
    }

    #[test]
    fn markers_must_sit_in_leading_cells() {
        let rows = vec![text_row(&["", "", "", "", "", "STT", "Mã SV"])];
        assert_eq!(find_header_row(&rows, 15), None);
        let rows = vec![text_row(&["STT", "", "", "", "Mã SV"])];
        assert_eq!(find_header_row(&rows, 15), Some(0));
    }

    #[test]
    fn small_sheets_are_rejected() {
        let mut rows = transcript_sheet().rows;
        rows.truncate(9);
        let err = parse_sheet(&sheet_of(rows), &ParseOptions::default()).unwrap_err();
        assert!(matches!(err, SheetError::SheetTooSmall { rows: 9, min: 10 }));
    }

    #[test]
    fn sheets_without_markers_are_rejected() {
        let rows: Vec<Vec<Cell>> = (0..20).map(|i| text_row(&["STT", &i.to_string()])).collect();
        let err = parse_sheet(&sheet_of(rows), &ParseOptions::default()).unwrap_err();
        assert!(matches!(err, SheetError::HeaderNotFound { depth: 15 }));
    }

    #[test]
    fn header_beyond_scan_depth_is_not_found() {
        let mut rows: Vec<Vec<Cell>> = (0..15).map(|_| text_row(&["tiêu đề"])).collect();
        rows.push(text_row(&["STT", "Mã SV", "Họ và tên"]));
        rows.extend((0..5).map(|_| text_row(&["1", "21F7010001", "A"])));
        let err = parse_sheet(&sheet_of(rows), &ParseOptions::default()).unwrap_err();
        assert!(matches!(err, SheetError::HeaderNotFound { .. }));
    }

    #[test]
    fn labels_and_rows_extracted() -> Result<()> {
        init_test_logging();
        let parsed = parse_sheet(&transcript_sheet(), &ParseOptions::default())?;

        assert_eq!(
            parsed.headers,
            vec![
                ColumnLabel::Named("STT".into()),
                ColumnLabel::Named("Mã SV".into()),
                ColumnLabel::Named("Họ và tên".into()),
                ColumnLabel::Missing,
                ColumnLabel::Named("Tổng số tín chỉ".into()),
                ColumnLabel::Named("Điểm TBTL".into()),
            ]
        );
        // blank rows dropped, "Ghi chú" kept, last two footer rows excluded
        assert_eq!(parsed.rows.len(), 3);
        assert_eq!(parsed.rows[0][0], Cell::Int(1));
        assert_eq!(parsed.rows[0][4].to_string(), "30");
        assert_eq!(parsed.rows[0][5], Cell::Float(3.25));
        assert_eq!(parsed.rows[2][0].to_string(), "Ghi chú");
        assert!(parsed.rows.iter().all(|r| r.len() == 6));
        Ok(())
    }

    #[test]
    fn loads_first_sheet_from_xlsx() -> Result<()> {
        init_test_logging();
        let dir = tempdir()?;
        let path = dir.path().join("anh.xlsx");
        write_xlsx(&path, &transcript_sheet().rows)?;

        let sheet = load_first_sheet(&path)?;
        assert_eq!(sheet.height(), 11);
        let parsed = parse_sheet(&sheet, &ParseOptions::default())?;
        assert_eq!(parsed.rows.len(), 3);
        assert_eq!(parsed.rows[1][1].to_string(), "21F7010002");
        Ok(())
    }

    #[test]
    fn offset_sheet_keeps_physical_positions() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("lech.xlsx");
        // empty first row and empty column A
        let mut rows = vec![Vec::new()];
        rows.extend(transcript_sheet().rows.into_iter().map(|row| {
            let mut shifted = vec![Cell::Empty];
            shifted.extend(row);
            shifted
        }));
        write_xlsx(&path, &rows)?;

        let sheet = load_first_sheet(&path)?;
        assert_eq!(sheet.height(), 12);
        assert_eq!(sheet.width(), 7);
        assert_eq!(find_header_row(&sheet.rows, 15), Some(4));
        assert_eq!(sheet.rows[4][1].to_string(), "STT");

        let parsed = parse_sheet(&sheet, &ParseOptions::default())?;
        assert_eq!(parsed.headers[0], ColumnLabel::Missing);
        assert_eq!(parsed.headers[1], ColumnLabel::Named("STT".into()));
        assert_eq!(parsed.headers[3], ColumnLabel::Named("Họ và tên".into()));
        assert_eq!(parsed.rows.len(), 3);
        assert_eq!(parsed.rows[0][2].to_string(), "21F7010001");
        assert_eq!(parsed.rows[0][4].to_string(), "An");
        Ok(())
    }

    #[test]
    fn garbage_file_is_unreadable() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("hong.xls");
        std::fs::write(&path, b"definitely not a workbook")?;
        let err = load_first_sheet(&path).unwrap_err();
        assert!(matches!(err, SheetError::UnreadableFile { .. }));
        Ok(())
    }
}
