//! # GC-matched negative loci
//!
//! Given positive loci (peaks) and a reference genome, pick background loci whose GC content
//! follows the same distribution as the positives. The run has four stages:
//!
//! 1. [`histogram`]: measure the GC fraction around every positive and count positives per
//!    GC bin.
//! 2. [`exclusion`]: index positives (plus margin) and blacklisted regions.
//! 3. [`scanner`]: tile the genome into windows and keep those that avoid the exclusion index
//!    and are not dominated by ambiguous bases, grouped by GC bin.
//! 4. [`matcher`]: draw as many windows per bin as there are positives in it, optionally
//!    capped by a signal ceiling.
//!
//! [`sample_negatives`] runs all of them on a dedicated thread pool.
//!
//! ```no_run
//! use std::path::Path;
//!
//! use gcmatch_core::models::PeakSet;
//! use gcmatch_io::GenomeAssembly;
//! use gcmatch_negatives::{LogReporter, SamplerConfig, SamplerInputs, sample_negatives};
//!
//! let peaks = PeakSet::try_from(Path::new("peaks.narrowPeak")).unwrap();
//! let genome = GenomeAssembly::try_from(Path::new("hg38.fa")).unwrap();
//! let inputs = SamplerInputs::new(&peaks, &genome);
//!
//! let output = sample_negatives(&inputs, &SamplerConfig::default(), &LogReporter).unwrap();
//! output.negatives.write_bed("negatives.bed").unwrap();
//! ```
pub mod composition;
pub mod config;
pub mod error;
pub mod events;
pub mod exclusion;
pub mod histogram;
pub mod matcher;
pub mod report;
pub mod scanner;
pub mod writer;

use std::collections::HashSet;

use log::info;

use gcmatch_core::models::{Locus, LocusSet, PeakSet};
use gcmatch_io::{GenomeAccessor, GenomeError, SignalAccessor};

pub use config::{ConfigError, SamplerConfig};
pub use error::{Result, SamplerError};
pub use events::{CollectingReporter, LogReporter, Reporter, SamplerEvent};
pub use report::{BinReport, SamplingReport};

use composition::GcBinning;
use exclusion::ExclusionIndex;
use histogram::{annotate_positives, build_bin_table};
use matcher::{match_bins, signal_threshold};
use scanner::CandidateScanner;

///
/// The data a run works on. The signal track is optional; without it no signal ceiling
/// applies.
///
pub struct SamplerInputs<'a> {
    pub peaks: &'a PeakSet,
    pub genome: &'a dyn GenomeAccessor,
    pub signal: Option<&'a dyn SignalAccessor>,
    /// Regions excluded as-is, without the positive margin.
    pub blacklist: &'a [Locus],
}

impl<'a> SamplerInputs<'a> {
    pub fn new(peaks: &'a PeakSet, genome: &'a dyn GenomeAccessor) -> Self {
        SamplerInputs {
            peaks,
            genome,
            signal: None,
            blacklist: &[],
        }
    }

    pub fn with_signal(mut self, signal: &'a dyn SignalAccessor) -> Self {
        self.signal = Some(signal);
        self
    }

    pub fn with_blacklist(mut self, blacklist: &'a [Locus]) -> Self {
        self.blacklist = blacklist;
        self
    }
}

#[derive(Debug, Clone)]
pub struct SamplingOutput {
    /// Negatives sorted by (chromosome, start).
    pub negatives: LocusSet,
    pub report: SamplingReport,
}

///
/// Sample GC-matched negatives for `inputs.peaks`.
///
/// The configuration is validated before any data is read. Coverage shortfalls and clipped
/// positive windows are not errors: they go to `reporter` and into the returned report.
///
/// # Arguments
/// - inputs: positives, genome, optional signal track and blacklist
/// - config: run parameters
/// - reporter: receiver of recoverable events
///
pub fn sample_negatives(
    inputs: &SamplerInputs,
    config: &SamplerConfig,
    reporter: &dyn Reporter,
) -> Result<SamplingOutput> {
    config.validate(inputs.signal.is_some())?;
    let binning = GcBinning::new(config.bin_width)?;
    let chromosomes = select_chromosomes(inputs, config)?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.num_threads())
        .build()?;

    pool.install(|| -> Result<SamplingOutput> {
        let positives = annotate_positives(
            inputs.peaks,
            inputs.genome,
            inputs.signal,
            config.window_width,
            config.use_summit,
            &binning,
            reporter,
        )?;
        let table = build_bin_table(&positives);
        info!(
            "Binned {} positives into {} GC bins",
            table.total(),
            table.len()
        );

        let threshold = config
            .beta
            .and_then(|beta| signal_threshold(beta, &positives));
        if let Some(threshold) = threshold {
            info!("Signal ceiling for negatives: {:.4}", threshold);
        }

        let exclusion = ExclusionIndex::new(inputs.peaks, config.exclusion_margin, inputs.blacklist);

        let scanner = CandidateScanner {
            genome: inputs.genome,
            signal: inputs.signal,
            exclusion: &exclusion,
            binning,
            window_width: config.window_width,
            stride: config.stride,
            max_n_perc: config.max_n_perc,
            progress: config.progress,
        };
        let candidates = scanner.scan(&chromosomes, reporter)?;
        info!(
            "Found {} candidate windows on {} chromosomes",
            candidates.len(),
            chromosomes.len()
        );

        let result = match_bins(&table, &candidates, threshold, config.seed, reporter);
        let report = SamplingReport::new(
            positives.len(),
            candidates.len(),
            &binning,
            threshold,
            config.seed,
            &result,
        );
        info!(
            "Sampled {} negatives for {} positives",
            report.n_negatives, report.n_positives
        );

        Ok(SamplingOutput {
            negatives: result.negatives,
            report,
        })
    })
}

///
/// Chromosomes to scan, in reference order. With a subset configured, every listed name
/// must exist in the genome.
///
fn select_chromosomes(inputs: &SamplerInputs, config: &SamplerConfig) -> Result<Vec<(String, u32)>> {
    let all = inputs.genome.chromosomes();
    let Some(subset) = &config.chromosome_subset else {
        return Ok(all);
    };

    let known: HashSet<&str> = all.iter().map(|(chr, _)| chr.as_str()).collect();
    if let Some(missing) = subset.iter().find(|chr| !known.contains(chr.as_str())) {
        return Err(GenomeError::ChromosomeNotFound(missing.clone()).into());
    }

    let wanted: HashSet<&str> = subset.iter().map(String::as_str).collect();
    let outside = inputs
        .peaks
        .iter()
        .filter(|peak| !wanted.contains(peak.locus.chr.as_str()))
        .count();
    if outside > 0 {
        info!(
            "{} positives lie outside the chromosome subset; they still count toward targets",
            outside
        );
    }

    Ok(all
        .into_iter()
        .filter(|(chr, _)| wanted.contains(chr.as_str()))
        .collect())
}
