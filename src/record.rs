use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::debug;

use crate::sheet::Cell;

/// The fixed column set of the consolidated dataset, in artifact order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalField {
    Sequence,
    StudentId,
    FullName,
    TotalCredits,
    PassedCredits,
    AverageScore,
    RetakeCredits,
    Semester,
    Cohort,
    Subject,
}

pub const FIELD_COUNT: usize = 10;

impl CanonicalField {
    pub const ALL: [CanonicalField; FIELD_COUNT] = [
        CanonicalField::Sequence,
        CanonicalField::StudentId,
        CanonicalField::FullName,
        CanonicalField::TotalCredits,
        CanonicalField::PassedCredits,
        CanonicalField::AverageScore,
        CanonicalField::RetakeCredits,
        CanonicalField::Semester,
        CanonicalField::Cohort,
        CanonicalField::Subject,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Column title used in the artifact and in exports.
    pub fn header(self) -> &'static str {
        match self {
            CanonicalField::Sequence => "STT",
            CanonicalField::StudentId => "Mã SV",
            CanonicalField::FullName => "Họ và tên",
            CanonicalField::TotalCredits => "Tổng số tín chỉ",
            CanonicalField::PassedCredits => "Tổng số TCTL",
            CanonicalField::AverageScore => "Điểm TBTL",
            CanonicalField::RetakeCredits => "Số TC học/thi lại",
            CanonicalField::Semester => "Học kỳ",
            CanonicalField::Cohort => "Khóa",
            CanonicalField::Subject => "Môn học",
        }
    }

    pub fn headers() -> Vec<&'static str> {
        Self::ALL.iter().map(|f| f.header()).collect()
    }
}

/// One student line of the consolidated dataset. Values keep the cell type
/// they had in the source so numbers stay numbers in the artifact.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CanonicalRecord {
    values: [Cell; FIELD_COUNT],
}

impl CanonicalRecord {
    pub fn from_cells(values: [Cell; FIELD_COUNT]) -> Self {
        Self { values }
    }

    /// Build from a possibly short/long row; missing trailing cells are empty.
    pub fn from_row(row: Vec<Cell>) -> Self {
        let mut values: [Cell; FIELD_COUNT] = Default::default();
        for (slot, cell) in values.iter_mut().zip(row) {
            *slot = cell;
        }
        Self { values }
    }

    pub fn get(&self, field: CanonicalField) -> &Cell {
        &self.values[field.index()]
    }

    pub fn set(&mut self, field: CanonicalField, value: Cell) {
        self.values[field.index()] = value;
    }

    /// Display string of a field (empty for empty cells).
    pub fn text(&self, field: CanonicalField) -> String {
        self.get(field).to_string()
    }

    pub fn cells(&self) -> &[Cell] {
        &self.values
    }

    pub fn student_id(&self) -> String {
        self.text(CanonicalField::StudentId)
    }

    pub fn full_name(&self) -> String {
        self.text(CanonicalField::FullName)
    }

    /// Numeric average score, if the cell holds one (range not checked).
    pub fn score(&self) -> Option<f64> {
        self.get(CanonicalField::AverageScore).as_f64()
    }

    /// Footer notes, section titles and blank trailers carry no real ID;
    /// a genuine student ID is longer than `min_len` characters.
    pub fn has_student_id(&self, min_len: usize) -> bool {
        self.student_id().chars().count() > min_len
    }
}

impl Serialize for CanonicalRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(FIELD_COUNT))?;
        for field in CanonicalField::ALL {
            map.serialize_entry(field.header(), &self.text(field))?;
        }
        map.end()
    }
}

/// Default threshold for [`CanonicalRecord::has_student_id`].
pub const MIN_STUDENT_ID_LEN: usize = 5;

/// The immutable, post-filtered record set every query and report runs on.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<CanonicalRecord>,
}

impl Dataset {
    /// Keep only records with a real student ID, preserving order.
    pub fn from_records(records: Vec<CanonicalRecord>, min_id_len: usize) -> Self {
        let before = records.len();
        let records: Vec<CanonicalRecord> = records
            .into_iter()
            .filter(|r| r.has_student_id(min_id_len))
            .collect();
        debug!(
            kept = records.len(),
            dropped = before - records.len(),
            "filtered records without student id"
        );
        Self { records }
    }

    pub fn records(&self) -> &[CanonicalRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_id(id: &str) -> CanonicalRecord {
        let mut r = CanonicalRecord::default();
        r.set(CanonicalField::StudentId, Cell::from(id));
        r
    }

    #[test]
    fn header_order_is_fixed() {
        assert_eq!(
            CanonicalField::headers(),
            vec![
                "STT",
                "Mã SV",
                "Họ và tên",
                "Tổng số tín chỉ",
                "Tổng số TCTL",
                "Điểm TBTL",
                "Số TC học/thi lại",
                "Học kỳ",
                "Khóa",
                "Môn học",
            ]
        );
        for (i, f) in CanonicalField::ALL.iter().enumerate() {
            assert_eq!(f.index(), i);
        }
    }

    #[test]
    fn short_ids_are_dropped() {
        let records = vec![
            with_id("21F7010001"),
            with_id("12345"),
            with_id(""),
            with_id("123456"),
            with_id("Ghi chú"),
        ];
        let ds = Dataset::from_records(records, MIN_STUDENT_ID_LEN);
        let ids: Vec<String> = ds.records().iter().map(|r| r.student_id()).collect();
        assert_eq!(ids, vec!["21F7010001", "123456", "Ghi chú"]);
    }

    #[test]
    fn id_length_counts_characters_not_bytes() {
        // 10 bytes, 5 characters
        assert!(!with_id("ĐĐĐĐĐ").has_student_id(MIN_STUDENT_ID_LEN));
        assert!(with_id("ĐĐĐĐĐĐ").has_student_id(MIN_STUDENT_ID_LEN));
    }

    #[test]
    fn numeric_ids_are_measured_by_their_text() {
        let mut r = CanonicalRecord::default();
        r.set(CanonicalField::StudentId, Cell::Int(21701234));
        assert!(r.has_student_id(MIN_STUDENT_ID_LEN));
    }

    #[test]
    fn serializes_as_header_keyed_map() -> anyhow::Result<()> {
        let mut r = with_id("21F7010001");
        r.set(CanonicalField::AverageScore, Cell::Float(3.25));
        let v = serde_json::to_value(&r)?;
        assert_eq!(v["Mã SV"], "21F7010001");
        assert_eq!(v["Điểm TBTL"], "3.25");
        assert_eq!(v["Khóa"], "");
        Ok(())
    }
}
