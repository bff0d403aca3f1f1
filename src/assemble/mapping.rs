use tracing::debug;

use crate::record::{CanonicalField, CanonicalRecord, FIELD_COUNT};
use crate::sheet::{Cell, ColumnLabel};

/// A header belongs to `field` when it contains every keyword of at least one
/// of the `any_of` groups.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub field: CanonicalField,
    pub any_of: &'static [&'static [&'static str]],
}

impl FieldRule {
    pub fn matches(&self, label: &str) -> bool {
        self.any_of
            .iter()
            .any(|group| group.iter().all(|kw| label.contains(kw)))
    }
}

/// Evaluated top to bottom for each header; the first hit decides the field.
pub const FIELD_RULES: [FieldRule; 7] = [
    FieldRule {
        field: CanonicalField::Sequence,
        any_of: &[&["STT"]],
    },
    FieldRule {
        field: CanonicalField::StudentId,
        any_of: &[&["Mã SV"], &["MSSV"]],
    },
    FieldRule {
        field: CanonicalField::FullName,
        any_of: &[&["Họ và tên"], &["Họ tên"]],
    },
    FieldRule {
        field: CanonicalField::TotalCredits,
        any_of: &[&["Tổng số tín chỉ"]],
    },
    FieldRule {
        field: CanonicalField::PassedCredits,
        any_of: &[&["TCTL"]],
    },
    FieldRule {
        field: CanonicalField::AverageScore,
        any_of: &[&["Điểm", "TBTL"]],
    },
    FieldRule {
        field: CanonicalField::RetakeCredits,
        any_of: &[&["học/thi lại"]],
    },
];

/// Field a single header maps to, if any.
pub fn classify(label: &str) -> Option<CanonicalField> {
    let label = label.trim();
    FIELD_RULES
        .iter()
        .find(|rule| rule.matches(label))
        .map(|rule| rule.field)
}

/// Source column for each canonical field of one sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMapping {
    columns: [Option<usize>; FIELD_COUNT],
}

impl ColumnMapping {
    /// Scan headers left to right. When two headers classify to the same
    /// field, the later column replaces the earlier one.
    pub fn from_headers(headers: &[ColumnLabel]) -> Self {
        let mut columns = [None; FIELD_COUNT];
        for (i, label) in headers.iter().enumerate() {
            let Some(field) = label.as_str().and_then(classify) else {
                continue;
            };
            if let Some(prev) = columns[field.index()].replace(i) {
                debug!(?field, prev, now = i, "header remapped to later column");
            }
        }
        Self { columns }
    }

    pub fn column(&self, field: CanonicalField) -> Option<usize> {
        self.columns[field.index()]
    }

    pub fn mapped_fields(&self) -> impl Iterator<Item = (CanonicalField, usize)> + '_ {
        CanonicalField::ALL
            .into_iter()
            .filter_map(|f| self.column(f).map(|c| (f, c)))
    }

    /// Copy mapped cells into a fresh record; unmapped fields stay empty.
    pub fn apply(&self, row: &[Cell]) -> CanonicalRecord {
        let mut record = CanonicalRecord::default();
        for (field, col) in self.mapped_fields() {
            if let Some(cell) = row.get(col) {
                record.set(field, cell.clone());
            }
        }
        record
    }
}
