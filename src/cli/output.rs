//! Table output.

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::Path;

use crate::error::AppError;
use crate::models::Table;

/// Writes `table` as CSV to `path`, or to stdout when no path is given.
pub fn write_table(table: &Table, path: Option<&Path>) -> Result<(), AppError> {
    match path {
        Some(path) => {
            table.write_csv(BufWriter::new(File::create(path)?))?;
            tracing::info!(
                "Wrote {} rows x {} columns to {}",
                table.len(),
                table.columns().len(),
                path.display()
            );
        }
        None => table.write_csv(io::stdout().lock())?,
    }
    Ok(())
}
