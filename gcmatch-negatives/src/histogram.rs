use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use gcmatch_core::models::{Locus, Peak, PeakSet};
use gcmatch_io::{GenomeAccessor, GenomeError, SignalAccessor};

use crate::composition::{Composition, GcBinning};
use crate::error::Result;
use crate::events::{Reporter, SamplerEvent};

///
/// A positive locus with the measurements taken over its composition window.
///
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedPositive {
    pub locus: Locus,
    /// The window GC and signal were measured over, after clipping.
    pub window: Locus,
    pub gc_fraction: f64,
    pub bin: usize,
    pub signal_total: Option<f64>,
}

///
/// Number of positives per GC bin. Bins without positives are absent.
///
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinTable {
    targets: BTreeMap<usize, usize>,
}

impl BinTable {
    pub fn target(&self, bin: usize) -> usize {
        self.targets.get(&bin).copied().unwrap_or(0)
    }

    /// `(bin, target)` pairs in ascending bin order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.targets.iter().map(|(bin, target)| (*bin, *target))
    }

    /// Sum of all targets, equal to the number of positives binned.
    pub fn total(&self) -> usize {
        self.targets.values().sum()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    fn merge(mut self, other: BinTable) -> BinTable {
        for (bin, count) in other.targets {
            *self.targets.entry(bin).or_insert(0) += count;
        }
        self
    }
}

impl FromIterator<usize> for BinTable {
    /// Count bin indices.
    fn from_iter<T: IntoIterator<Item = usize>>(iter: T) -> Self {
        let mut table = BinTable::default();
        for bin in iter {
            *table.targets.entry(bin).or_insert(0) += 1;
        }
        table
    }
}

///
/// Measure GC content (and signal, when a track is given) of every positive.
///
/// Each positive gets a `window_width` window centered on its midpoint, or on its summit
/// when `use_summit` is set. Windows running past a chromosome edge are clipped and a
/// [`SamplerEvent::BoundaryClip`] is reported. The output keeps the order of `peaks`.
///
pub fn annotate_positives(
    peaks: &PeakSet,
    genome: &dyn GenomeAccessor,
    signal: Option<&dyn SignalAccessor>,
    window_width: u32,
    use_summit: bool,
    binning: &GcBinning,
    reporter: &dyn Reporter,
) -> Result<Vec<AnnotatedPositive>> {
    peaks
        .peaks
        .par_iter()
        .map(|peak| {
            annotate_positive(
                peak,
                genome,
                signal,
                window_width,
                use_summit,
                binning,
                reporter,
            )
        })
        .collect()
}

fn annotate_positive(
    peak: &Peak,
    genome: &dyn GenomeAccessor,
    signal: Option<&dyn SignalAccessor>,
    window_width: u32,
    use_summit: bool,
    binning: &GcBinning,
    reporter: &dyn Reporter,
) -> Result<AnnotatedPositive> {
    let chr = peak.locus.chr.as_str();
    let chrom_len = genome.length(chr)?;
    if peak.locus.start >= chrom_len {
        return Err(GenomeError::RangeError {
            chr: chr.to_string(),
            start: peak.locus.start,
            end: peak.locus.end,
            length: chrom_len,
        }
        .into());
    }
    // a locus straddling the chromosome end may have its center past it
    let center = peak.center(use_summit).min(chrom_len - 1);

    let (window, clipped) = Locus::centered_window(chr, center, window_width, chrom_len);
    if clipped {
        reporter.report(SamplerEvent::BoundaryClip {
            locus: peak.locus.clone(),
            window: window.clone(),
        });
    }

    let seq = genome.sequence(chr, window.start, window.end)?;
    let gc_fraction = Composition::count(&seq).gc_fraction();
    let signal_total = match signal {
        Some(track) => Some(track.sum(chr, window.start, window.end)?),
        None => None,
    };

    Ok(AnnotatedPositive {
        locus: peak.locus.clone(),
        window,
        gc_fraction,
        bin: binning.bin(gc_fraction),
        signal_total,
    })
}

///
/// Count positives per GC bin. Per-thread partial tables are folded and then summed,
/// so the result does not depend on the order of `positives`.
///
pub fn build_bin_table(positives: &[AnnotatedPositive]) -> BinTable {
    positives
        .par_iter()
        .fold(BinTable::default, |mut table, positive| {
            *table.targets.entry(positive.bin).or_insert(0) += 1;
            table
        })
        .reduce(BinTable::default, BinTable::merge)
}
