use std::path::PathBuf;
use thiserror::Error;

/// Why a single source workbook was rejected. Every variant skips that file
/// only; the batch keeps going.
#[derive(Error, Debug)]
pub enum SheetError {
    #[error("cannot read workbook {path:?}: {reason}")]
    UnreadableFile { path: PathBuf, reason: String },

    #[error("sheet has {rows} rows, need at least {min}")]
    SheetTooSmall { rows: usize, min: usize },

    #[error("no row with STT and Mã SV markers in the first {depth} rows")]
    HeaderNotFound { depth: usize },
}

#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("cannot open artifact {path:?}: {reason}")]
    Open { path: PathBuf, reason: String },

    #[error("artifact {0:?} has no worksheet")]
    NoWorksheet(PathBuf),

    #[error("artifact header mismatch: expected {expected:?}, found {found:?}")]
    HeaderMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("writing artifact: {0}")]
    Write(#[from] rust_xlsxwriter::XlsxError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
