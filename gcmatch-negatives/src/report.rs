use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::composition::GcBinning;
use crate::matcher::MatchResult;

/// Per-bin line of a [`SamplingReport`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinReport {
    pub bin: usize,
    /// Lower GC fraction edge of the bin.
    pub gc_lower: f64,
    pub target: usize,
    pub available: usize,
    pub drawn: usize,
    pub shortfall: usize,
}

///
/// Summary of one sampling run, written next to the negatives as JSON on request.
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingReport {
    pub n_positives: usize,
    pub n_negatives: usize,
    /// Size of the candidate pool before the signal ceiling.
    pub n_candidates: usize,
    pub bin_width: f64,
    pub signal_threshold: Option<f64>,
    pub seed: u64,
    pub bins: Vec<BinReport>,
}

impl SamplingReport {
    pub fn new(
        n_positives: usize,
        n_candidates: usize,
        binning: &GcBinning,
        signal_threshold: Option<f64>,
        seed: u64,
        result: &MatchResult,
    ) -> Self {
        let bins = result
            .draws
            .iter()
            .map(|draw| BinReport {
                bin: draw.bin,
                gc_lower: binning.lower_edge(draw.bin),
                target: draw.target,
                available: draw.available,
                drawn: draw.drawn.len(),
                shortfall: draw.shortfall(),
            })
            .collect();

        SamplingReport {
            n_positives,
            n_negatives: result.negatives.len(),
            n_candidates,
            bin_width: binning.bin_width(),
            signal_threshold,
            seed,
            bins,
        }
    }

    /// Unmet count of every bin that came up short.
    pub fn shortfalls(&self) -> BTreeMap<usize, usize> {
        self.bins
            .iter()
            .filter(|b| b.shortfall > 0)
            .map(|b| (b.bin, b.shortfall))
            .collect()
    }

    pub fn total_shortfall(&self) -> usize {
        self.bins.iter().map(|b| b.shortfall).sum()
    }
}
