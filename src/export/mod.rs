// src/export/mod.rs
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use csv::Writer;
use serde::Serialize;
use std::{fs, path::Path};
use tracing::info;

use crate::record::{CanonicalField, CanonicalRecord};
use crate::stats::{AggregateStats, FrequencyTable};

pub const CSV_FILE: &str = "exported_data.csv";
pub const SUMMARY_FILE: &str = "statistics.json";

/// Shape of `statistics.json`.
#[derive(Debug, Serialize)]
pub struct SummaryReport<'a> {
    pub total_records: usize,
    pub avg_score: f64,
    pub pass_rate: f64,
    pub min_score: f64,
    pub max_score: f64,
    pub by_cohort: &'a FrequencyTable,
    pub by_semester: &'a FrequencyTable,
    pub by_subject: &'a FrequencyTable,
    pub generated_at: DateTime<Local>,
}

impl<'a> SummaryReport<'a> {
    pub fn new(stats: &'a AggregateStats) -> Self {
        Self {
            total_records: stats.total_records,
            avg_score: stats.avg_score,
            pass_rate: stats.pass_rate,
            min_score: stats.min_score,
            max_score: stats.max_score,
            by_cohort: &stats.by_cohort,
            by_semester: &stats.by_semester,
            by_subject: &stats.by_subject,
            generated_at: Local::now(),
        }
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {}", parent.display()))?;
    }
    Ok(())
}

/// Write records as CSV under the canonical column titles.
pub fn write_csv<P: AsRef<Path>>(records: &[CanonicalRecord], path: P) -> Result<()> {
    let path = path.as_ref();
    ensure_parent(path)?;
    let mut writer =
        Writer::from_path(path).with_context(|| format!("opening {}", path.display()))?;

    writer.write_record(CanonicalField::headers())?;
    for record in records {
        writer.write_record(record.cells().iter().map(|c| c.to_string()))?;
    }
    writer.flush()?;
    info!(path = %path.display(), rows = records.len(), "csv exported");
    Ok(())
}

/// Write the pretty-printed JSON summary. Non-ASCII names stay readable.
pub fn write_summary<P: AsRef<Path>>(stats: &AggregateStats, path: P) -> Result<()> {
    let path = path.as_ref();
    ensure_parent(path)?;
    let json = serde_json::to_string_pretty(&SummaryReport::new(stats))
        .context("serializing summary")?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), "summary exported");
    Ok(())
}
