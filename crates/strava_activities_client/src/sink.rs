//! Semicolon-delimited file output for shaped activities.

use crate::StravaError;
use crate::shaping::ShapedRecord;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub const DELIMITER: u8 = b';';

/// Write a header row followed by one row per record.
pub fn write_records<W: Write>(writer: W, records: &[ShapedRecord]) -> Result<(), StravaError> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(DELIMITER)
        .from_writer(writer);
    // serde only emits the header together with the first row
    if records.is_empty() {
        wtr.write_record(ShapedRecord::COLUMNS)?;
    }
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write `records` to `path`, creating missing parent directories.
pub fn write_csv(path: &Path, records: &[ShapedRecord]) -> Result<(), StravaError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    write_records(BufWriter::new(file), records)
}
