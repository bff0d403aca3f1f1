use std::path::{Component, Path};

use crate::record::{CanonicalField, CanonicalRecord};
use crate::sheet::Cell;

/// Where a sheet came from, read off `semester/cohort/subject.ext`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provenance {
    pub semester: String,
    pub cohort: String,
    pub subject: String,
}

impl Provenance {
    /// `rel` is the path below the raw root. Anything other than exactly three
    /// components is not a source sheet. Names that are not valid UTF-8 are
    /// decoded lossily.
    pub fn from_relative(rel: &Path) -> Option<Self> {
        let parts: Vec<_> = rel
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy()),
                _ => None,
            })
            .collect();
        let [semester, cohort, _file] = parts.as_slice() else {
            return None;
        };
        let subject = rel.file_stem()?.to_string_lossy();
        Some(Self {
            semester: semester.to_uppercase(),
            cohort: cohort.to_uppercase(),
            subject: subject.into_owned(),
        })
    }

    pub fn stamp(&self, record: &mut CanonicalRecord) {
        record.set(CanonicalField::Semester, Cell::from(self.semester.as_str()));
        record.set(CanonicalField::Cohort, Cell::from(self.cohort.as_str()));
        record.set(CanonicalField::Subject, Cell::from(self.subject.as_str()));
    }

    /// `semester/cohort/subject`, as shown in progress logs.
    pub fn label(&self) -> String {
        format!("{}/{}/{}", self.semester, self.cohort, self.subject)
    }
}
