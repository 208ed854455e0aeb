use std::path::PathBuf;

use thiserror::Error;

/// Fatal, file- or schema-level failures. Anything row-scoped is recovered
/// where it happens and never surfaces here.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("input file not found: {}", path.display())]
    MissingInput { path: PathBuf },

    #[error("required column missing from input: {column}")]
    MissingColumn { column: &'static str },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ReportError>;
