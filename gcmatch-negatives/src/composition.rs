use gcmatch_io::is_unambiguous_base;

use crate::config::{ConfigError, ConfigResult};

/// Guards bin boundaries against float error, e.g. `0.7 / 0.1 == 6.999...`.
const BIN_EPSILON: f64 = 1e-9;

#[inline]
fn is_gc(base: u8) -> bool {
    matches!(base, b'G' | b'C' | b'g' | b'c')
}

///
/// Base counts of a window. Supports sliding: add the base that enters, remove the one
/// that leaves.
///
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Composition {
    pub gc: u32,
    pub ambiguous: u32,
    pub len: u32,
}

impl Composition {
    pub fn count(seq: &[u8]) -> Self {
        let mut composition = Composition::default();
        for &base in seq {
            composition.add(base);
        }
        composition
    }

    #[inline]
    pub fn add(&mut self, base: u8) {
        self.len += 1;
        if is_gc(base) {
            self.gc += 1;
        } else if !is_unambiguous_base(base) {
            self.ambiguous += 1;
        }
    }

    #[inline]
    pub fn remove(&mut self, base: u8) {
        self.len -= 1;
        if is_gc(base) {
            self.gc -= 1;
        } else if !is_unambiguous_base(base) {
            self.ambiguous -= 1;
        }
    }

    /// `(#G + #C) / len`; an empty window has GC fraction 0.
    pub fn gc_fraction(&self) -> f64 {
        if self.len == 0 {
            return 0.0;
        }
        f64::from(self.gc) / f64::from(self.len)
    }

    /// Fraction of bases that are not A/C/G/T.
    pub fn n_fraction(&self) -> f64 {
        if self.len == 0 {
            return 0.0;
        }
        f64::from(self.ambiguous) / f64::from(self.len)
    }
}

/// GC fraction of a sequence.
pub fn gc_fraction(seq: &[u8]) -> f64 {
    Composition::count(seq).gc_fraction()
}

///
/// Maps a GC fraction to its bin: `floor(gc / bin_width)`, clamped to
/// `[0, floor(1 / bin_width)]`.
///
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GcBinning {
    bin_width: f64,
    max_bin: usize,
}

impl GcBinning {
    pub fn new(bin_width: f64) -> ConfigResult<Self> {
        if !(bin_width > 0.0 && bin_width <= 1.0) {
            return Err(ConfigError::InvalidBinWidth(bin_width));
        }
        let max_bin = (1.0 / bin_width + BIN_EPSILON).floor() as usize;
        Ok(GcBinning { bin_width, max_bin })
    }

    pub fn bin(&self, gc_fraction: f64) -> usize {
        let raw = (gc_fraction / self.bin_width + BIN_EPSILON).floor();
        if raw <= 0.0 {
            0
        } else {
            (raw as usize).min(self.max_bin)
        }
    }

    pub fn bin_width(&self) -> f64 {
        self.bin_width
    }

    pub fn max_bin(&self) -> usize {
        self.max_bin
    }

    /// Lower GC fraction edge of a bin.
    pub fn lower_edge(&self, bin: usize) -> f64 {
        bin as f64 * self.bin_width
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    #[case(b"GGCC", 1.0)]
    #[case(b"ATAT", 0.0)]
    #[case(b"ACGT", 0.5)]
    #[case(b"acgN", 0.5)]
    #[case(b"", 0.0)]
    fn test_gc_fraction(#[case] seq: &[u8], #[case] expected: f64) {
        assert_eq!(gc_fraction(seq), expected);
    }

    #[rstest]
    fn test_ambiguous_count() {
        let composition = Composition::count(b"ACNNRT");
        assert_eq!(composition.ambiguous, 3);
        assert_eq!(composition.gc, 1);
        assert_eq!(composition.n_fraction(), 0.5);
    }

    #[rstest]
    fn test_sliding_matches_direct_count() {
        let seq = b"ACGTNNGGCCATATGCGCNA";
        let width = 7;
        let mut sliding = Composition::count(&seq[..width]);
        for start in 1..=seq.len() - width {
            sliding.remove(seq[start - 1]);
            sliding.add(seq[start + width - 1]);
            assert_eq!(sliding, Composition::count(&seq[start..start + width]));
        }
    }

    #[rstest]
    #[case(0.41, 4)]
    #[case(0.55, 5)]
    #[case(0.71, 7)]
    #[case(0.7, 7)]
    #[case(0.0, 0)]
    #[case(1.0, 10)]
    fn test_bins_of_width_one_tenth(#[case] gc: f64, #[case] expected: usize) {
        let binning = GcBinning::new(0.1).unwrap();
        assert_eq!(binning.bin(gc), expected);
    }

    #[rstest]
    fn test_bin_is_clamped() {
        let binning = GcBinning::new(0.3).unwrap();
        assert_eq!(binning.max_bin(), 3);
        assert_eq!(binning.bin(1.0), 3);
        assert_eq!(binning.bin(-0.5), 0);
    }

    #[rstest]
    #[case(0.0)]
    #[case(1.1)]
    fn test_invalid_bin_width(#[case] bin_width: f64) {
        assert!(GcBinning::new(bin_width).is_err());
    }
}
