//! Turns a parsed sheet with ragged, partly unlabeled headers into one with a
//! single full-name column and no placeholder columns.

use tracing::debug;

use crate::config::ReconcileOptions;
use crate::sheet::{Cell, ColumnLabel, ParsedSheet};

/// Label given to the reassembled name column.
pub const FULL_NAME_LABEL: &str = "Họ và tên";

/// Titles that identify the name column in source sheets.
pub const NAME_KEYWORDS: [&str; 2] = ["Họ và tên", "Họ tên"];

/// Position of the name column: the last column whose label carries one of
/// the name keywords.
pub fn find_name_anchor(headers: &[ColumnLabel]) -> Option<usize> {
    headers
        .iter()
        .rposition(|h| NAME_KEYWORDS.iter().any(|k| h.contains(k)))
}

/// Unlabeled columns close enough to `anchor` to hold spill-over name parts,
/// in column order.
pub fn fragment_columns(headers: &[ColumnLabel], anchor: usize, window: usize) -> Vec<usize> {
    headers
        .iter()
        .enumerate()
        .filter(|(i, h)| h.is_missing() && *i != anchor && i.abs_diff(anchor) <= window)
        .map(|(i, _)| i)
        .collect()
}

/// Digits and dots only, e.g. `10` or `3.5`: a stray credit or score value
/// rather than part of a name.
fn looks_numeric(s: &str) -> bool {
    let digits: String = s.chars().filter(|c| *c != '.').collect();
    !digits.is_empty() && digits.chars().all(char::is_numeric)
}

/// Anchor text followed by every usable fragment, single-space joined.
pub fn combine_name(row: &[Cell], anchor: usize, fragments: &[usize]) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(fragments.len() + 1);
    if let Some(head) = row.get(anchor).filter(|c| !c.is_empty()) {
        let head = head.to_string();
        let head = head.trim();
        if !head.is_empty() {
            parts.push(head.to_string());
        }
    }
    for &col in fragments {
        // booleans are stray 0/1 flags, never name parts
        let Some(cell) = row.get(col).filter(|c| !matches!(c, Cell::Bool(_))) else {
            continue;
        };
        let text = cell.to_string();
        let text = text.trim();
        if text.is_empty() || looks_numeric(text) {
            continue;
        }
        parts.push(text.to_string());
    }
    parts.join(" ")
}

/// Rebuild full names into the anchor column, then drop placeholder columns.
/// Without a recognisable name column the sheet is returned untouched.
pub fn reconcile(sheet: ParsedSheet, opts: &ReconcileOptions) -> ParsedSheet {
    let Some(anchor) = find_name_anchor(&sheet.headers) else {
        debug!("no name column; leaving sheet as parsed");
        return sheet;
    };
    let fragments = fragment_columns(&sheet.headers, anchor, opts.name_fragment_window);
    debug!(anchor, ?fragments, "reassembling names");

    let keep: Vec<usize> = sheet
        .headers
        .iter()
        .enumerate()
        .filter(|(i, h)| !h.is_missing() || *i == anchor)
        .map(|(i, _)| i)
        .collect();

    let headers = keep
        .iter()
        .map(|&i| match &sheet.headers[i] {
            ColumnLabel::Missing => ColumnLabel::Named(FULL_NAME_LABEL.to_string()),
            named => named.clone(),
        })
        .collect();

    let rows = sheet
        .rows
        .into_iter()
        .map(|mut row| {
            let name = combine_name(&row, anchor, &fragments);
            if let Some(slot) = row.get_mut(anchor) {
                *slot = Cell::from(name);
            }
            keep.iter()
                .map(|&i| row.get(i).cloned().unwrap_or_default())
                .collect()
        })
        .collect();

    ParsedSheet { headers, rows }
}
