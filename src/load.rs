use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::de::DeserializeOwned;

use crate::error::{ReportError, Result};

/// Opens `filename` (or stdin for `-`) as a trimming CSV reader.
pub fn csv_reader(filename: &Path) -> Result<csv::Reader<Box<dyn Read>>> {
    let reader: Box<dyn Read> = if filename == Path::new("-") {
        Box::new(std::io::stdin())
    } else {
        let file = std::fs::File::open(filename).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ReportError::MissingInput {
                path: PathBuf::from(filename),
            },
            _ => ReportError::Io(e),
        })?;
        Box::new(file)
    };

    Ok(reader_builder().from_reader(reader))
}

/// Trimming and flexible: short rows keep their missing trailing fields as
/// `None` instead of being rejected.
fn reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder.trim(csv::Trim::All).flexible(true);
    builder
}

/// Fails on the first column of `required` absent from the header.
pub fn require_columns<R: Read>(
    csv_reader: &mut csv::Reader<R>,
    required: &[&'static str],
) -> Result<()> {
    let headers = csv_reader.headers()?;
    for &column in required {
        if !headers.iter().any(|h| h == column) {
            return Err(ReportError::MissingColumn { column });
        }
    }
    Ok(())
}

/// Checks the header, then deserializes every readable row. Rows the CSV
/// layer cannot read are logged and skipped.
pub fn read_rows<T, R>(
    mut csv_reader: csv::Reader<R>,
    required: &[&'static str],
) -> Result<Vec<T>>
where
    T: DeserializeOwned,
    R: Read,
{
    require_columns(&mut csv_reader, required)?;
    let mut rows = Vec::new();
    for result in csv_reader.deserialize() {
        match result {
            Ok(row) => rows.push(row),
            Err(e) => warn!("failed to read record: {e}"),
        }
    }
    debug!("loaded {} rows", rows.len());
    Ok(rows)
}
