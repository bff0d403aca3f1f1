// src/query/mod.rs
//! Read-only filtering and search over the loaded dataset. Nothing here
//! mutates or copies records; results borrow from the input slice.

use std::collections::BTreeSet;
use std::ops::RangeInclusive;

use crate::record::{CanonicalField, CanonicalRecord};

/// Default number of results shown when the caller does not ask for all.
pub const DEFAULT_DISPLAY_LIMIT: usize = 20;

/// Score bands on the 4-point scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    /// ≥ 2.0
    Pass,
    /// < 2.0
    Fail,
    /// ≥ 3.6
    Excellent,
    /// 3.2 – 3.59
    Good,
    /// 2.5 – 3.19
    Fair,
    /// 2.0 – 2.49
    Average,
}

impl ScoreBand {
    pub fn contains(self, score: f64) -> bool {
        match self {
            ScoreBand::Pass => score >= 2.0,
            ScoreBand::Fail => score < 2.0,
            ScoreBand::Excellent => score >= 3.6,
            ScoreBand::Good => (3.2..3.6).contains(&score),
            ScoreBand::Fair => (2.5..3.2).contains(&score),
            ScoreBand::Average => (2.0..2.5).contains(&score),
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pass" => Some(ScoreBand::Pass),
            "fail" => Some(ScoreBand::Fail),
            "excellent" => Some(ScoreBand::Excellent),
            "good" => Some(ScoreBand::Good),
            "fair" => Some(ScoreBand::Fair),
            "average" => Some(ScoreBand::Average),
            _ => None,
        }
    }
}

/// Filter on credits that must be retaken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetakeFilter {
    /// exactly 0
    None,
    /// more than 0
    Any,
    /// 10 or more
    Many,
}

impl RetakeFilter {
    pub fn contains(self, credits: f64) -> bool {
        match self {
            RetakeFilter::None => credits == 0.0,
            RetakeFilter::Any => credits > 0.0,
            RetakeFilter::Many => credits >= 10.0,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "none" => Some(RetakeFilter::None),
            "any" => Some(RetakeFilter::Any),
            "many" => Some(RetakeFilter::Many),
            _ => None,
        }
    }
}

/// Case-insensitive name match. A plain substring hit matches; otherwise
/// every search word must overlap some name word (either containing the
/// other), so "thế phú" finds "Lê Thế Phú".
pub fn name_matches(name: &str, search: &str) -> bool {
    let name = name.to_lowercase();
    let search = search.to_lowercase();
    if name.contains(&search) {
        return true;
    }
    let name_words: Vec<&str> = name.split_whitespace().collect();
    search.split_whitespace().all(|sw| {
        name_words
            .iter()
            .any(|nw| nw.contains(sw) || sw.contains(nw))
    })
}

/// Conjunction of optional criteria. An unset criterion matches everything.
#[derive(Debug, Clone, Default)]
pub struct RecordQuery {
    pub name: Option<String>,
    pub student_id: Option<String>,
    pub semester: Option<String>,
    pub cohort: Option<String>,
    pub subject: Option<String>,
    pub band: Option<ScoreBand>,
    pub score_range: Option<RangeInclusive<f64>>,
    pub credit_range: Option<RangeInclusive<f64>>,
    pub retake: Option<RetakeFilter>,
}

/// Numeric criteria skip records whose value does not parse.
fn numeric_ok(record: &CanonicalRecord, field: CanonicalField, pred: impl Fn(f64) -> bool) -> bool {
    record.get(field).as_f64().map_or(true, pred)
}

fn non_blank(opt: &Option<String>) -> Option<&str> {
    opt.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl RecordQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, s: impl Into<String>) -> Self {
        self.name = Some(s.into());
        self
    }

    pub fn student_id(mut self, s: impl Into<String>) -> Self {
        self.student_id = Some(s.into());
        self
    }

    pub fn semester(mut self, s: impl Into<String>) -> Self {
        self.semester = Some(s.into());
        self
    }

    pub fn cohort(mut self, s: impl Into<String>) -> Self {
        self.cohort = Some(s.into());
        self
    }

    pub fn subject(mut self, s: impl Into<String>) -> Self {
        self.subject = Some(s.into());
        self
    }

    pub fn band(mut self, band: ScoreBand) -> Self {
        self.band = Some(band);
        self
    }

    pub fn score_range(mut self, range: RangeInclusive<f64>) -> Self {
        self.score_range = Some(range);
        self
    }

    pub fn credit_range(mut self, range: RangeInclusive<f64>) -> Self {
        self.credit_range = Some(range);
        self
    }

    pub fn retake(mut self, retake: RetakeFilter) -> Self {
        self.retake = Some(retake);
        self
    }

    pub fn matches(&self, record: &CanonicalRecord) -> bool {
        if let Some(search) = non_blank(&self.name) {
            if !name_matches(&record.full_name(), search) {
                return false;
            }
        }
        if let Some(id) = non_blank(&self.student_id) {
            if !record
                .student_id()
                .to_lowercase()
                .contains(&id.to_lowercase())
            {
                return false;
            }
        }
        for (wanted, field) in [
            (&self.semester, CanonicalField::Semester),
            (&self.cohort, CanonicalField::Cohort),
            (&self.subject, CanonicalField::Subject),
        ] {
            if let Some(wanted) = wanted {
                if record.text(field) != *wanted {
                    return false;
                }
            }
        }
        if let Some(band) = self.band {
            if !numeric_ok(record, CanonicalField::AverageScore, |s| band.contains(s)) {
                return false;
            }
        }
        if let Some(range) = &self.score_range {
            if !numeric_ok(record, CanonicalField::AverageScore, |s| range.contains(&s)) {
                return false;
            }
        }
        if let Some(range) = &self.credit_range {
            if !numeric_ok(record, CanonicalField::TotalCredits, |c| range.contains(&c)) {
                return false;
            }
        }
        if let Some(retake) = self.retake {
            if !numeric_ok(record, CanonicalField::RetakeCredits, |c| retake.contains(c)) {
                return false;
            }
        }
        true
    }

    /// Matching records in dataset order.
    pub fn run<'a>(&self, records: &'a [CanonicalRecord]) -> Vec<&'a CanonicalRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}

/// Sorted distinct non-empty values of `field`, for filter option lists.
pub fn distinct_values(records: &[CanonicalRecord], field: CanonicalField) -> Vec<String> {
    records
        .iter()
        .map(|r| r.text(field).trim().to_string())
        .filter(|v| !v.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Smallest and largest positive total-credit value, for range sliders.
pub fn credit_bounds(records: &[CanonicalRecord]) -> Option<(f64, f64)> {
    records
        .iter()
        .filter_map(|r| r.get(CanonicalField::TotalCredits).as_f64())
        .filter(|c| *c > 0.0)
        .fold(None, |acc, c| match acc {
            None => Some((c, c)),
            Some((lo, hi)) => Some((lo.min(c), hi.max(c))),
        })
}
