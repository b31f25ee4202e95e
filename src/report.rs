use crate::{ImportError, RowError};
use std::fmt;

#[derive(Debug)]
pub enum RowStatus {
    Imported { comment_id: u64, product_id: u64 },
    Skipped(RowError),
}

/// What happened to one data record.
#[derive(Debug)]
pub struct RowOutcome {
    pub line: u64,
    pub status: RowStatus,
}

impl RowOutcome {
    pub fn is_imported(&self) -> bool {
        matches!(self.status, RowStatus::Imported { .. })
    }

    pub fn error(&self) -> Option<&RowError> {
        match &self.status {
            RowStatus::Skipped(e) => Some(e),
            RowStatus::Imported { .. } => None,
        }
    }
}

/// Result of one import run, in file order. Rendering is left to the caller;
/// `Display` gives a plain-text version.
#[derive(Debug, Default)]
pub struct ImportReport {
    pub headers: Vec<String>,
    pub outcomes: Vec<RowOutcome>,
    /// Set when the run stopped before the end of the file.
    pub halted: Option<ImportError>,
}

impl ImportReport {
    pub fn imported(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_imported()).count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes.len() - self.imported()
    }

    pub fn is_complete(&self) -> bool {
        self.halted.is_none()
    }

    pub fn errors(&self) -> impl Iterator<Item = &RowError> {
        self.outcomes.iter().filter_map(RowOutcome::error)
    }
}

impl fmt::Display for ImportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for error in self.errors() {
            writeln!(f, "Error on line {}: {}", error.line(), error)?;
        }
        if let Some(halt) = &self.halted {
            writeln!(f, "Import halted: {halt}")?;
        }
        write!(
            f,
            "{} review(s) imported, {} row(s) skipped",
            self.imported(),
            self.skipped()
        )
    }
}
