// src/assemble/mod.rs
pub mod mapping;
pub mod provenance;

use anyhow::{bail, Context, Result};
use glob::glob;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, instrument, warn};

use crate::config::Config;
use crate::error::SheetError;
use crate::reconcile::reconcile;
use crate::record::CanonicalRecord;
use crate::sheet::{load_first_sheet, parse_sheet};

pub use mapping::{classify, ColumnMapping, FieldRule, FIELD_RULES};
pub use provenance::Provenance;

/// A workbook found at `raw/<semester>/<cohort>/<subject>.<ext>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub provenance: Provenance,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    Merged { rows: usize },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutcome {
    pub source: SourceFile,
    pub status: FileStatus,
}

/// Everything one batch run produced: records in file order plus a per-file
/// account of what happened.
#[derive(Debug, Clone, Default)]
pub struct Assembly {
    pub records: Vec<CanonicalRecord>,
    pub outcomes: Vec<FileOutcome>,
}

impl Assembly {
    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, FileStatus::Merged { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.attempted() - self.succeeded()
    }

    pub fn total_rows(&self) -> usize {
        self.records.len()
    }
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .is_some_and(|e| extensions.iter().any(|x| x.eq_ignore_ascii_case(&e.to_string_lossy())))
}

/// Every source workbook exactly three levels below `raw_root`, sorted by
/// path so runs are reproducible.
pub fn discover_sources(raw_root: &Path, extensions: &[String]) -> Result<Vec<SourceFile>> {
    if !raw_root.is_dir() {
        bail!("raw directory {:?} not found", raw_root);
    }
    let pattern = format!("{}/**/*", glob::Pattern::escape(&raw_root.to_string_lossy()));
    let mut sources = Vec::new();
    for entry in glob(&pattern).with_context(|| format!("bad glob pattern {}", pattern))? {
        let path = match entry {
            Ok(p) => p,
            Err(e) => {
                warn!("skipping unreadable path: {}", e);
                continue;
            }
        };
        if !path.is_file() || !has_extension(&path, extensions) {
            continue;
        }
        let Ok(rel) = path.strip_prefix(raw_root) else {
            continue;
        };
        match Provenance::from_relative(rel) {
            Some(provenance) => sources.push(SourceFile { path, provenance }),
            None => warn!(path = %rel.display(), "not at semester/cohort/subject depth, ignored"),
        }
    }
    sources.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(sources)
}

/// Parse, reconcile and map one workbook into provenance-stamped records.
#[instrument(level = "debug", skip(source, cfg), fields(file = %source.provenance.label()))]
pub fn process_file(source: &SourceFile, cfg: &Config) -> Result<Vec<CanonicalRecord>, SheetError> {
    let raw = load_first_sheet(&source.path)?;
    let parsed = parse_sheet(&raw, &cfg.parse)?;
    let sheet = reconcile(parsed, &cfg.reconcile);
    let mapping = ColumnMapping::from_headers(&sheet.headers);

    Ok(sheet
        .rows
        .iter()
        .map(|row| {
            let mut record = mapping.apply(row);
            source.provenance.stamp(&mut record);
            record
        })
        .collect())
}

/// Run every source through the pipeline. Files are processed on rayon's
/// pool but merged in discovery order; a bad file only adds to the failure
/// count.
pub fn assemble_sources(sources: Vec<SourceFile>, cfg: &Config) -> Assembly {
    let results: Vec<(SourceFile, Result<Vec<CanonicalRecord>, SheetError>)> = sources
        .into_par_iter()
        .map(|source| {
            let result = process_file(&source, cfg);
            match &result {
                Ok(rows) => info!("{} ✓ OK ({} rows)", source.provenance.label(), rows.len()),
                Err(e) => warn!("{} ✗ failed: {}", source.provenance.label(), e),
            }
            (source, result)
        })
        .collect();

    let mut assembly = Assembly::default();
    for (source, result) in results {
        let status = match result {
            Ok(rows) => {
                let n = rows.len();
                assembly.records.extend(rows);
                FileStatus::Merged { rows: n }
            }
            Err(e) => FileStatus::Failed {
                reason: e.to_string(),
            },
        };
        assembly.outcomes.push(FileOutcome { source, status });
    }
    assembly
}

/// Discover and assemble everything under `cfg.raw_path()`.
#[instrument(level = "info", skip(cfg), fields(raw = %cfg.raw_path().display()))]
pub fn assemble_tree(cfg: &Config) -> Result<Assembly> {
    let start = Instant::now();
    let sources = discover_sources(&cfg.raw_path(), &cfg.extensions)?;
    info!("{} source files found", sources.len());

    let assembly = assemble_sources(sources, cfg);
    info!(
        attempted = assembly.attempted(),
        succeeded = assembly.succeeded(),
        failed = assembly.failed(),
        rows = assembly.total_rows(),
        elapsed = ?start.elapsed(),
        "assembly complete"
    );
    Ok(assembly)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{CanonicalField, Dataset};
    use crate::testutil::{init_test_logging, transcript_rows, write_xlsx};
    use std::fs;
    use tempfile::tempdir;

    fn config_for(base: &Path) -> Config {
        Config::default().with_base_path(Some(base.to_path_buf()))
    }

    #[test]
    fn two_cohorts_of_one_subject() -> Result<()> {
        init_test_logging();
        let dir = tempdir()?;
        let raw = dir.path().join("raw");
        write_xlsx(
            &raw.join("hk1/k1/Toan.xlsx"),
            &transcript_rows(&[("21F7010001", "Nguyễn Văn", "An", 3.2)]),
        )?;
        write_xlsx(
            &raw.join("hk1/k2/Toan.xlsx"),
            &transcript_rows(&[("22F7010001", "Trần Thị", "Bình", 2.4)]),
        )?;

        let assembly = assemble_tree(&config_for(dir.path()))?;
        assert_eq!(assembly.attempted(), 2);
        assert_eq!(assembly.succeeded(), 2);

        let ds = Dataset::from_records(assembly.records, 5);
        assert_eq!(ds.len(), 2);
        let r0 = &ds.records()[0];
        let r1 = &ds.records()[1];
        assert_eq!(r0.text(CanonicalField::Subject), "Toan");
        assert_eq!(r1.text(CanonicalField::Subject), "Toan");
        assert_eq!(r0.text(CanonicalField::Semester), "HK1");
        assert_eq!(r1.text(CanonicalField::Semester), "HK1");
        assert_eq!(r0.text(CanonicalField::Cohort), "K1");
        assert_eq!(r1.text(CanonicalField::Cohort), "K2");
        assert_eq!(r0.full_name(), "Nguyễn Văn An");
        assert_eq!(r0.text(CanonicalField::TotalCredits), "30");
        assert_eq!(r1.text(CanonicalField::AverageScore), "2.4");
        Ok(())
    }

    #[test]
    fn footer_note_survives_assembly_but_not_the_dataset() -> Result<()> {
        let dir = tempdir()?;
        write_xlsx(
            &dir.path().join("raw/HK1/K1/anh.xlsx"),
            &transcript_rows(&[("21F7010001", "Lê", "Phú", 3.9)]),
        )?;
        let assembly = assemble_tree(&config_for(dir.path()))?;
        // student row plus the note row
        assert_eq!(assembly.total_rows(), 2);
        assert_eq!(Dataset::from_records(assembly.records, 5).len(), 1);
        Ok(())
    }

    #[test]
    fn unreadable_and_tiny_files_count_as_failures() -> Result<()> {
        init_test_logging();
        let dir = tempdir()?;
        let raw = dir.path().join("raw");
        write_xlsx(
            &raw.join("HK1/K1/anh.xlsx"),
            &transcript_rows(&[("21F7010001", "Lê", "Phú", 3.9)]),
        )?;
        fs::create_dir_all(raw.join("HK1/K1"))?;
        fs::write(raw.join("HK1/K1/hong.xls"), b"\x00\x01 not excel")?;
        // title rows only: too small to be a transcript
        let title_only: Vec<_> = transcript_rows(&[]).into_iter().take(4).collect();
        write_xlsx(&raw.join("HK1/K2/nho.xlsx"), &title_only)?;

        let assembly = assemble_tree(&config_for(dir.path()))?;
        assert_eq!(assembly.attempted(), 3);
        assert_eq!(assembly.succeeded(), 1);
        assert_eq!(assembly.failed(), 2);
        assert_eq!(assembly.succeeded() + assembly.failed(), assembly.attempted());
        let failed: Vec<&str> = assembly
            .outcomes
            .iter()
            .filter(|o| matches!(o.status, FileStatus::Failed { .. }))
            .map(|o| o.source.provenance.subject.as_str())
            .collect();
        assert_eq!(failed, vec!["hong", "nho"]);
        Ok(())
    }

    #[test]
    fn wrong_depth_and_extension_are_ignored() -> Result<()> {
        let dir = tempdir()?;
        let raw = dir.path().join("raw");
        let rows = transcript_rows(&[("21F7010001", "Lê", "Phú", 3.9)]);
        write_xlsx(&raw.join("HK1/anh.xlsx"), &rows)?;
        write_xlsx(&raw.join("HK1/K1/sub/anh.xlsx"), &rows)?;
        fs::write(raw.join("HK1/K1/notes.txt"), "ghi chú")?;
        write_xlsx(&raw.join("HK1/K1/phap.XLSX"), &rows)?;

        let sources = discover_sources(&raw, &Config::default().extensions)?;
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].provenance.subject, "phap");
        Ok(())
    }

    #[test]
    fn base_path_with_glob_metacharacters() -> Result<()> {
        let dir = tempdir()?;
        let base = dir.path().join("diem[2024]");
        write_xlsx(
            &base.join("raw/HK1/K1/anh.xlsx"),
            &transcript_rows(&[("21F7010001", "Lê", "Phú", 3.9)]),
        )?;

        let assembly = assemble_tree(&config_for(&base))?;
        assert_eq!(assembly.attempted(), 1);
        assert_eq!(assembly.succeeded(), 1);
        assert_eq!(Dataset::from_records(assembly.records, 5).len(), 1);
        Ok(())
    }

    #[test]
    fn missing_raw_dir_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(assemble_tree(&config_for(&dir.path().join("nowhere"))).is_err());
    }

    #[test]
    fn output_order_follows_sorted_paths() -> Result<()> {
        let dir = tempdir()?;
        let raw = dir.path().join("raw");
        for (cohort, id) in [("K3", "23F7010001"), ("K1", "21F7010001"), ("K2", "22F7010001")] {
            write_xlsx(
                &raw.join(format!("HK1/{}/anh.xlsx", cohort)),
                &transcript_rows(&[(id, "Lê", "Phú", 3.0)]),
            )?;
        }
        let assembly = assemble_tree(&config_for(dir.path()))?;
        let ds = Dataset::from_records(assembly.records, 5);
        let ids: Vec<String> = ds.records().iter().map(|r| r.student_id()).collect();
        assert_eq!(ids, vec!["21F7010001", "22F7010001", "23F7010001"]);
        Ok(())
    }
}
