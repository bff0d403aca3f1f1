// src/stats/mod.rs
mod frequency;

pub use frequency::FrequencyTable;

use serde::Serialize;

use crate::record::{CanonicalField, CanonicalRecord};

/// Average scores are on a 4-point scale; anything outside is a data error.
pub const SCORE_RANGE: std::ops::RangeInclusive<f64> = 0.0..=4.0;

/// Default pass mark on the 4-point scale.
pub const PASS_THRESHOLD: f64 = 2.0;

/// Summary figures for a record set. Built fresh from the records each time.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregateStats {
    pub total_records: usize,
    pub by_semester: FrequencyTable,
    pub by_cohort: FrequencyTable,
    pub by_subject: FrequencyTable,
    /// Every in-range, parseable average score, in record order.
    #[serde(skip)]
    pub scores: Vec<f64>,
    pub avg_score: f64,
    pub min_score: f64,
    pub max_score: f64,
    /// Percentage of valid scores at or above the pass mark.
    pub pass_rate: f64,
}

/// A record's score if it parses and lies on the 4-point scale.
pub fn valid_score(record: &CanonicalRecord) -> Option<f64> {
    record.score().filter(|s| SCORE_RANGE.contains(s))
}

pub fn aggregate(records: &[CanonicalRecord]) -> AggregateStats {
    aggregate_with(records, PASS_THRESHOLD)
}

pub fn aggregate_with(records: &[CanonicalRecord], pass_threshold: f64) -> AggregateStats {
    let mut by_semester = FrequencyTable::default();
    let mut by_cohort = FrequencyTable::default();
    let mut by_subject = FrequencyTable::default();
    let mut scores = Vec::new();

    for record in records {
        by_semester.add(record.text(CanonicalField::Semester));
        by_cohort.add(record.text(CanonicalField::Cohort));
        by_subject.add(record.text(CanonicalField::Subject));
        if let Some(score) = valid_score(record) {
            scores.push(score);
        }
    }

    let (avg_score, min_score, max_score, pass_rate) = if scores.is_empty() {
        (0.0, 0.0, 0.0, 0.0)
    } else {
        let n = scores.len() as f64;
        let sum: f64 = scores.iter().sum();
        let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
        let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let passed = scores.iter().filter(|s| **s >= pass_threshold).count() as f64;
        (sum / n, min, max, passed / n * 100.0)
    };

    AggregateStats {
        total_records: records.len(),
        by_semester,
        by_cohort,
        by_subject,
        scores,
        avg_score,
        min_score,
        max_score,
        pass_rate,
    }
}
