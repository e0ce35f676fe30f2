//! Regions no negative may touch.
//!
//! The [`ExclusionIndex`] keeps one sorted list of merged intervals per chromosome. Since
//! merged intervals are disjoint, both their starts and their ends are sorted, and an overlap
//! query is a single `partition_point` over the ends followed by one comparison.

use std::collections::HashMap;

use gcmatch_core::models::{Locus, PeakSet};

#[derive(Debug, Default, Clone)]
pub struct ExclusionIndex {
    intervals: HashMap<String, Vec<(u32, u32)>>,
}

impl ExclusionIndex {
    ///
    /// Build the index from the positives, each expanded by `margin` bases on both sides,
    /// plus extra regions such as a blacklist, taken as-is.
    ///
    pub fn new(peaks: &PeakSet, margin: u32, extra: &[Locus]) -> Self {
        let expanded = peaks.iter().map(|peak| peak.locus.expand(margin));
        ExclusionIndex::from_loci(expanded.chain(extra.iter().cloned()))
    }

    ///
    /// Build the index from arbitrary loci. Overlapping and adjacent loci are merged.
    ///
    pub fn from_loci<I: IntoIterator<Item = Locus>>(loci: I) -> Self {
        let mut per_chrom: HashMap<String, Vec<(u32, u32)>> = HashMap::new();
        for locus in loci {
            per_chrom
                .entry(locus.chr)
                .or_default()
                .push((locus.start, locus.end));
        }

        for intervals in per_chrom.values_mut() {
            intervals.sort_unstable();
            let mut merged: Vec<(u32, u32)> = Vec::with_capacity(intervals.len());
            for &(start, end) in intervals.iter() {
                match merged.last_mut() {
                    Some(last) if start <= last.1 => last.1 = last.1.max(end),
                    _ => merged.push((start, end)),
                }
            }
            *intervals = merged;
        }

        ExclusionIndex {
            intervals: per_chrom,
        }
    }

    ///
    /// True when `[start, end)` on `chr` shares at least one base with an excluded interval.
    ///
    pub fn overlaps(&self, chr: &str, start: u32, end: u32) -> bool {
        if start >= end {
            return false;
        }
        let Some(intervals) = self.intervals.get(chr) else {
            return false;
        };
        let i = intervals.partition_point(|&(_, e)| e <= start);
        i < intervals.len() && intervals[i].0 < end
    }

    /// Number of merged intervals across all chromosomes.
    pub fn len(&self) -> usize {
        self.intervals.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
