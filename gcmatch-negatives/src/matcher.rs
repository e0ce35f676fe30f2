use std::collections::BTreeMap;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rayon::prelude::*;

use gcmatch_core::models::{Locus, LocusSet};

use crate::events::{Reporter, SamplerEvent};
use crate::histogram::{AnnotatedPositive, BinTable};
use crate::scanner::{Candidate, CandidatePool};

const SEED_MIX: u64 = 0x9E37_79B9_7F4A_7C15;

///
/// Seed of the random stream of one GC bin. Every bin draws from its own stream, so the
/// draws do not depend on which thread samples which bin, or in what order.
///
pub fn derive_bin_seed(seed: u64, bin: usize) -> u64 {
    seed ^ (bin as u64).wrapping_add(1).wrapping_mul(SEED_MIX)
}

///
/// `beta` times the smallest signal total among the positives. `None` when no positive
/// carries a signal measurement.
///
pub fn signal_threshold(beta: f64, positives: &[AnnotatedPositive]) -> Option<f64> {
    positives
        .iter()
        .filter_map(|p| p.signal_total)
        .reduce(f64::min)
        .map(|min| beta * min)
}

/// Outcome of sampling one bin.
#[derive(Debug, Clone, PartialEq)]
pub struct BinDraw {
    pub bin: usize,
    pub target: usize,
    /// Candidates in the bin that passed the signal ceiling.
    pub available: usize,
    pub drawn: Vec<Locus>,
}

impl BinDraw {
    pub fn shortfall(&self) -> usize {
        self.target - self.drawn.len()
    }
}

///
/// The sampled negatives, sorted by (chromosome, start), with the per-bin breakdown.
///
#[derive(Debug, Clone, Default)]
pub struct MatchResult {
    pub negatives: LocusSet,
    pub draws: Vec<BinDraw>,
}

impl MatchResult {
    /// Unmet count of every bin that came up short.
    pub fn shortfalls(&self) -> BTreeMap<usize, usize> {
        self.draws
            .iter()
            .filter(|draw| draw.shortfall() > 0)
            .map(|draw| (draw.bin, draw.shortfall()))
            .collect()
    }
}

///
/// Draw, for every bin of `table`, up to its target count of candidates from the same bin
/// of `pool`, uniformly and without replacement.
///
/// Candidates above `threshold` are ineligible. A bin without enough eligible candidates
/// gives all it has and a [`SamplerEvent::CoverageShortfall`] is reported; bins never borrow
/// from each other.
///
pub fn match_bins(
    table: &BinTable,
    pool: &CandidatePool,
    threshold: Option<f64>,
    seed: u64,
    reporter: &dyn Reporter,
) -> MatchResult {
    let targets: Vec<(usize, usize)> = table.iter().filter(|(_, target)| *target > 0).collect();

    let draws: Vec<BinDraw> = targets
        .par_iter()
        .map(|&(bin, target)| draw_bin(bin, target, pool.get(bin), threshold, seed))
        .collect();

    for draw in draws.iter().filter(|draw| draw.shortfall() > 0) {
        reporter.report(SamplerEvent::CoverageShortfall {
            bin: draw.bin,
            target: draw.target,
            drawn: draw.drawn.len(),
        });
    }

    let mut loci: Vec<Locus> = draws.iter().flat_map(|d| d.drawn.iter().cloned()).collect();
    loci.sort();

    MatchResult {
        negatives: LocusSet::from(loci),
        draws,
    }
}

fn draw_bin(
    bin: usize,
    target: usize,
    candidates: &[Candidate],
    threshold: Option<f64>,
    seed: u64,
) -> BinDraw {
    let mut eligible: Vec<&Candidate> = candidates
        .iter()
        .filter(|c| match threshold {
            Some(t) => c.signal_total.unwrap_or(0.0) <= t,
            None => true,
        })
        .collect();
    let available = eligible.len();

    if available > target {
        let mut rng = StdRng::seed_from_u64(derive_bin_seed(seed, bin));
        eligible.shuffle(&mut rng);
        eligible.truncate(target);
    }

    BinDraw {
        bin,
        target,
        available,
        drawn: eligible.into_iter().map(|c| c.locus.clone()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashSet;

    use pretty_assertions::assert_eq;
    use rstest::*;

    use crate::events::CollectingReporter;

    fn candidate(start: u32, signal_total: Option<f64>) -> Candidate {
        Candidate {
            locus: Locus::new("chr1", start, start + 10).unwrap(),
            gc_fraction: 0.5,
            n_fraction: 0.0,
            signal_total,
        }
    }

    fn pool_of(bins: &[(usize, Vec<Candidate>)]) -> CandidatePool {
        let mut pool = CandidatePool::default();
        for (bin, candidates) in bins {
            for c in candidates {
                pool.push(*bin, c.clone());
            }
        }
        pool
    }

    #[rstest]
    fn test_scenario_a_one_per_bin() {
        let table: BinTable = [4usize, 5, 7].into_iter().collect();
        let pool = pool_of(&[
            (4, vec![candidate(0, None), candidate(100, None)]),
            (5, vec![candidate(200, None)]),
            (6, vec![candidate(300, None)]),
            (7, vec![candidate(400, None), candidate(500, None)]),
        ]);
        let reporter = CollectingReporter::new();
        let result = match_bins(&table, &pool, None, 1234, &reporter);

        assert_eq!(result.negatives.len(), 3);
        let per_bin: Vec<(usize, usize)> = result.draws.iter().map(|d| (d.bin, d.drawn.len())).collect();
        assert_eq!(per_bin, vec![(4, 1), (5, 1), (7, 1)]);
        assert!(result.shortfalls().is_empty());
        assert!(reporter.events().is_empty());
    }

    #[rstest]
    fn test_scenario_b_shortfall() {
        let table: BinTable = [3usize; 5].into_iter().collect();
        let pool = pool_of(&[(3, vec![candidate(0, None), candidate(100, None)])]);
        let reporter = CollectingReporter::new();
        let result = match_bins(&table, &pool, None, 1234, &reporter);

        assert_eq!(result.negatives.len(), 2);
        assert_eq!(result.shortfalls(), BTreeMap::from([(3, 3)]));
        assert_eq!(
            reporter.into_events(),
            vec![SamplerEvent::CoverageShortfall {
                bin: 3,
                target: 5,
                drawn: 2
            }]
        );
    }

    fn positive(start: u32, signal_total: f64) -> AnnotatedPositive {
        let locus = Locus::new("chr2", start, start + 10).unwrap();
        AnnotatedPositive {
            locus: locus.clone(),
            window: locus,
            gc_fraction: 0.5,
            bin: 5,
            signal_total: Some(signal_total),
        }
    }

    #[rstest]
    fn test_threshold_is_beta_times_weakest_positive() {
        let positives = vec![positive(0, 300.0), positive(50, 100.0)];
        assert_eq!(signal_threshold(0.5, &positives), Some(50.0));
        assert_eq!(signal_threshold(0.5, &[]), None);
    }

    #[rstest]
    fn test_signal_ceiling_filters_candidates() {
        let positives = vec![positive(0, 200.0), positive(50, 400.0)];
        let threshold = signal_threshold(0.5, &positives);
        assert_eq!(threshold, Some(100.0));

        let table: BinTable = [5usize, 5].into_iter().collect();
        let pool = pool_of(&[(5, vec![candidate(0, Some(60.0)), candidate(100, Some(120.0))])]);
        let reporter = CollectingReporter::new();
        let result = match_bins(&table, &pool, threshold, 1234, &reporter);

        assert_eq!(result.negatives.loci, vec![Locus::new("chr1", 0, 10).unwrap()]);
        assert_eq!(result.draws[0].available, 1);
        assert_eq!(result.shortfalls(), BTreeMap::from([(5, 1)]));
    }

    #[rstest]
    fn test_empty_bin_is_full_shortfall() {
        let table: BinTable = [2usize, 2].into_iter().collect();
        let pool = CandidatePool::default();
        let reporter = CollectingReporter::new();
        let result = match_bins(&table, &pool, None, 1, &reporter);
        assert!(result.negatives.is_empty());
        assert_eq!(result.shortfalls(), BTreeMap::from([(2, 2)]));
    }

    #[rstest]
    fn test_draws_are_seeded() {
        let table: BinTable = [1usize; 5].into_iter().collect();
        let pool = pool_of(&[(1, (0..50).map(|i| candidate(i * 100, None)).collect())]);
        let reporter = CollectingReporter::new();

        let a = match_bins(&table, &pool, None, 42, &reporter);
        let b = match_bins(&table, &pool, None, 42, &reporter);
        let c = match_bins(&table, &pool, None, 43, &reporter);

        assert_eq!(a.negatives.loci, b.negatives.loci);
        assert_ne!(a.negatives.loci, c.negatives.loci);

        // no candidate is drawn twice
        let unique: HashSet<&Locus> = a.negatives.loci.iter().collect();
        assert_eq!(unique.len(), 5);
    }

    #[rstest]
    fn test_output_is_sorted() {
        let table: BinTable = [1usize, 1, 1, 2, 2].into_iter().collect();
        let pool = pool_of(&[
            (1, (0..20).rev().map(|i| candidate(i * 100, None)).collect()),
            (2, (20..40).map(|i| candidate(i * 100, None)).collect()),
        ]);
        let reporter = CollectingReporter::new();
        let result = match_bins(&table, &pool, None, 9, &reporter);

        let mut sorted = result.negatives.loci.clone();
        sorted.sort();
        assert_eq!(result.negatives.loci, sorted);
    }

    #[rstest]
    fn test_bin_seeds_differ() {
        assert_ne!(derive_bin_seed(1234, 0), derive_bin_seed(1234, 1));
        assert_ne!(derive_bin_seed(1234, 0), 1234);
    }
}
