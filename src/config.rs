use anyhow::{Context, Result};
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Knobs for locating the header row and slicing off preamble/footer rows.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ParseOptions {
    /// Sheets with fewer rows than this are rejected outright.
    pub min_rows: usize,
    /// How many leading rows are searched for the header markers.
    pub header_scan_depth: usize,
    /// Trailing summary/signature rows that never hold student data.
    pub footer_rows: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            min_rows: 10,
            header_scan_depth: 15,
            footer_rows: 2,
        }
    }
}

/// Default distance (in columns) from the name anchor within which unlabeled
/// columns are treated as spill-over pieces of the student name. Tuned for
/// the faculty export layout; other institutions may need a different value.
pub const NAME_FRAGMENT_WINDOW: usize = 5;

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReconcileOptions {
    pub name_fragment_window: usize,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            name_fragment_window: NAME_FRAGMENT_WINDOW,
        }
    }
}

/// Top-level run configuration. Every field has a default, so an empty (or
/// absent) YAML file is valid.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub base_path: PathBuf,
    pub raw_dir: String,
    pub processing_dir: String,
    pub artifact_name: String,
    /// Source file extensions, lower-case, without the dot.
    pub extensions: Vec<String>,
    pub parse: ParseOptions,
    pub reconcile: ReconcileOptions,
    /// Student IDs must be strictly longer than this to count as a record.
    pub min_student_id_len: usize,
    pub pass_threshold: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("data_diem_dhnn"),
            raw_dir: "raw".into(),
            processing_dir: "processing".into(),
            artifact_name: "output_direct.xlsx".into(),
            extensions: vec!["xls".into(), "xlsx".into()],
            parse: ParseOptions::default(),
            reconcile: ReconcileOptions::default(),
            min_student_id_len: 5,
            pass_threshold: 2.0,
        }
    }
}

impl Config {
    /// Load from a YAML file, or fall back to defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config file {:?}", path))?;
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&text).with_context(|| format!("parsing config file {:?}", path))
    }

    pub fn with_base_path(mut self, base: Option<PathBuf>) -> Self {
        if let Some(base) = base {
            self.base_path = base;
        }
        self
    }

    pub fn raw_path(&self) -> PathBuf {
        self.base_path.join(&self.raw_dir)
    }

    pub fn processing_path(&self) -> PathBuf {
        self.base_path.join(&self.processing_dir)
    }

    pub fn artifact_path(&self) -> PathBuf {
        self.processing_path().join(&self.artifact_name)
    }
}
