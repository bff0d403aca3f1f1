pub mod artifact;
pub mod assemble;
pub mod config;
pub mod error;
pub mod export;
pub mod query;
pub mod reconcile;
pub mod record;
pub mod sheet;
pub mod stats;

#[cfg(test)]
pub(crate) mod testutil;

pub use assemble::{assemble_tree, Assembly, FileOutcome};
pub use config::Config;
pub use error::{ArtifactError, SheetError};
pub use record::{CanonicalField, CanonicalRecord, Dataset};
pub use sheet::{Cell, ColumnLabel, ParsedSheet, RawSheet};
pub use stats::{aggregate, AggregateStats, FrequencyTable};
