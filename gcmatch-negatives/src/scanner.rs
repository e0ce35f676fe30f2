use std::collections::BTreeMap;

use indicatif::ProgressBar;
use rayon::prelude::*;

use gcmatch_core::models::Locus;
use gcmatch_io::{GenomeAccessor, SignalAccessor};

use crate::composition::{Composition, GcBinning};
use crate::error::Result;
use crate::events::{Reporter, SamplerEvent};
use crate::exclusion::ExclusionIndex;

///
/// One eligible genome window. `locus` is the region that would be written out; the
/// measurements cover the full composition window around it.
///
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub locus: Locus,
    pub gc_fraction: f64,
    pub n_fraction: f64,
    pub signal_total: Option<f64>,
}

///
/// Candidates grouped by GC bin. Within a bin, candidates keep genome scan order.
///
#[derive(Debug, Clone, Default)]
pub struct CandidatePool {
    bins: BTreeMap<usize, Vec<Candidate>>,
}

impl CandidatePool {
    pub fn push(&mut self, bin: usize, candidate: Candidate) {
        self.bins.entry(bin).or_default().push(candidate);
    }

    /// Candidates of one bin, empty when the bin never received any.
    pub fn get(&self, bin: usize) -> &[Candidate] {
        self.bins.get(&bin).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn bins(&self) -> impl Iterator<Item = (usize, &[Candidate])> + '_ {
        self.bins.iter().map(|(bin, cands)| (*bin, cands.as_slice()))
    }

    /// Total number of candidates over all bins.
    pub fn len(&self) -> usize {
        self.bins.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

///
/// Tiles chromosomes into windows and keeps the ones fit to serve as negatives.
///
pub struct CandidateScanner<'a> {
    pub genome: &'a dyn GenomeAccessor,
    pub signal: Option<&'a dyn SignalAccessor>,
    pub exclusion: &'a ExclusionIndex,
    pub binning: GcBinning,
    pub window_width: u32,
    pub stride: u32,
    pub max_n_perc: f64,
    pub progress: bool,
}

impl CandidateScanner<'_> {
    ///
    /// Scan every chromosome in `chromosomes`, in parallel on the current rayon pool.
    ///
    /// Per-chromosome results are merged in the order of `chromosomes`, so the pool is
    /// identical whatever the thread count.
    ///
    pub fn scan(&self, chromosomes: &[(String, u32)], reporter: &dyn Reporter) -> Result<CandidatePool> {
        let bar = if self.progress {
            ProgressBar::new(chromosomes.len() as u64)
        } else {
            ProgressBar::hidden()
        };

        let per_chrom: Vec<Vec<(usize, Candidate)>> = chromosomes
            .par_iter()
            .map(|(chr, length)| {
                let candidates = self.scan_chromosome(chr, *length, reporter);
                bar.inc(1);
                candidates
            })
            .collect::<Result<Vec<_>>>()?;
        bar.finish_and_clear();

        let mut pool = CandidatePool::default();
        for (bin, candidate) in per_chrom.into_iter().flatten() {
            pool.push(bin, candidate);
        }
        Ok(pool)
    }

    ///
    /// Evaluate every full window `[s, s + window_width)` with `s = 0, stride, 2 * stride, ...`
    ///
    pub fn scan_chromosome(
        &self,
        chr: &str,
        length: u32,
        reporter: &dyn Reporter,
    ) -> Result<Vec<(usize, Candidate)>> {
        let width = self.window_width as usize;
        let stride = self.stride as usize;
        let len = length as usize;

        if len < width {
            reporter.report(SamplerEvent::ChromosomeSkipped {
                chr: chr.to_string(),
                length,
            });
            return Ok(Vec::new());
        }

        let seq = self.genome.sequence(chr, 0, length)?;
        let seq: &[u8] = &seq;
        let sliding = stride < width;

        let mut candidates = Vec::new();
        let mut composition = Composition::count(&seq[..width]);
        let mut start = 0usize;

        loop {
            if let Some(candidate) = self.evaluate(chr, length, seq, start as u32, &composition)? {
                candidates.push(candidate);
            }

            let next = start + stride;
            if next + width > len {
                break;
            }

            if sliding {
                for &base in &seq[start..next] {
                    composition.remove(base);
                }
                for &base in &seq[start + width..next + width] {
                    composition.add(base);
                }
            } else {
                composition = Composition::count(&seq[next..next + width]);
            }
            start = next;
        }

        Ok(candidates)
    }

    fn evaluate(
        &self,
        chr: &str,
        length: u32,
        seq: &[u8],
        start: u32,
        composition: &Composition,
    ) -> Result<Option<(usize, Candidate)>> {
        let end = start + self.window_width;
        let center = start + self.window_width / 2;
        let (locus, _) = Locus::centered_window(chr, center, self.stride, length);

        // the emitted locus may stick out of the window when stride > window_width
        let span_start = start.min(locus.start);
        let span_end = end.max(locus.end);
        if self.exclusion.overlaps(chr, span_start, span_end) {
            return Ok(None);
        }

        // N and signal cover everything that gets written out, GC only the window
        let n_fraction = if span_start == start && span_end == end {
            composition.n_fraction()
        } else {
            Composition::count(&seq[span_start as usize..span_end as usize]).n_fraction()
        };
        if n_fraction > self.max_n_perc {
            return Ok(None);
        }

        let gc_fraction = composition.gc_fraction();
        let signal_total = match self.signal {
            Some(track) => Some(track.sum(chr, span_start, span_end)?),
            None => None,
        };

        Ok(Some((
            self.binning.bin(gc_fraction),
            Candidate {
                locus,
                gc_fraction,
                n_fraction,
                signal_total,
            },
        )))
    }
}
