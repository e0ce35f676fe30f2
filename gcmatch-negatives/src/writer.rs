use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use log::info;

use gcmatch_core::models::LocusSet;

use crate::error::Result;
use crate::report::SamplingReport;

///
/// Write the negatives as a three-column BED file, sorted, without header.
/// A path ending in `.gz` is gzip-compressed.
///
pub fn write_negatives<P: AsRef<Path>>(negatives: &LocusSet, path: P) -> Result<()> {
    let path = path.as_ref();
    let mut sorted = negatives.clone();
    sorted.sort();
    sorted.write_bed(path)?;
    info!("Wrote {} negatives to {}", sorted.len(), path.display());
    Ok(())
}

///
/// Write the run report as pretty-printed JSON.
///
pub fn write_report<P: AsRef<Path>>(report: &SamplingReport, path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, report)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
