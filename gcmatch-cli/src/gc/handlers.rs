use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use clap::ArgMatches;

use gcmatch_core::models::PeakSet;
use gcmatch_io::GenomeAssembly;
use gcmatch_negatives::LogReporter;
use gcmatch_negatives::composition::GcBinning;
use gcmatch_negatives::config::DEFAULT_BIN_WIDTH;
use gcmatch_negatives::histogram::{AnnotatedPositive, annotate_positives};

///
/// Write one `chr start end gc` line per positive.
///
pub fn write_gc_table<W: Write>(positives: &[AnnotatedPositive], writer: &mut W) -> io::Result<()> {
    for positive in positives {
        writeln!(
            writer,
            "{}\t{:.6}",
            positive.locus.as_string(),
            positive.gc_fraction
        )?;
    }
    Ok(())
}

pub fn run_gc(matches: &ArgMatches) -> Result<()> {
    let peaks_path = matches
        .get_one::<String>("peaks")
        .context("--peaks is required")?;
    let genome_path = matches
        .get_one::<String>("genome")
        .context("--genome is required")?;
    let window_width: u32 = matches
        .get_one::<String>("window-width")
        .context("--window-width is required")?
        .parse()
        .context("--window-width must be a positive integer")?;
    if window_width == 0 {
        anyhow::bail!("--window-width must be a positive integer");
    }
    let use_summit = matches.get_flag("use-summit");
    let output_path = matches.get_one::<String>("output");

    let peaks = PeakSet::try_from(Path::new(peaks_path))
        .with_context(|| format!("Failed to load peaks: {}", peaks_path))?;
    let genome = GenomeAssembly::try_from(Path::new(genome_path))
        .with_context(|| format!("Failed to load genome: {}", genome_path))?;

    let binning = GcBinning::new(DEFAULT_BIN_WIDTH)?;
    let positives = annotate_positives(
        &peaks,
        &genome,
        None,
        window_width,
        use_summit,
        &binning,
        &LogReporter,
    )?;

    let mut writer: BufWriter<Box<dyn Write>> = match output_path {
        Some(path) => BufWriter::new(Box::new(
            File::create(path).with_context(|| format!("Failed to create {}", path))?,
        )),
        None => BufWriter::new(Box::new(io::stdout().lock())),
    };
    write_gc_table(&positives, &mut writer)?;
    writer.flush()?;

    Ok(())
}
