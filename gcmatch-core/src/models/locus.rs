use std::fmt::{self, Display};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::errors::{LocusSetError, Result};

///
/// Locus struct, one half-open genomic interval `[start, end)` on a chromosome.
///
/// Loci order by chromosome name first, then start, then end, which is the order
/// every output file of gcmatch is written in.
///
#[derive(Eq, PartialEq, Hash, Debug, Clone, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Locus {
    pub chr: String,
    pub start: u32,
    pub end: u32,
}

impl Locus {
    ///
    /// Create a new locus, rejecting empty or inverted intervals.
    ///
    pub fn new<S: Into<String>>(chr: S, start: u32, end: u32) -> Result<Self> {
        let chr = chr.into();
        if start >= end {
            return Err(LocusSetError::InvalidLocus { chr, start, end });
        }
        Ok(Locus { chr, start, end })
    }

    ///
    /// Get length of the locus
    ///
    pub fn width(&self) -> u32 {
        self.end - self.start
    }

    /// Midpoint of the locus: `start + width / 2`.
    pub fn mid_point(&self) -> u32 {
        self.start + self.width() / 2
    }

    ///
    /// True when both loci sit on the same chromosome and share at least one base.
    ///
    pub fn overlaps(&self, other: &Locus) -> bool {
        self.chr == other.chr && self.start < other.end && other.start < self.end
    }

    ///
    /// Grow the locus by `margin` bases on both sides. The start saturates at zero;
    /// the end is not clipped since chromosome lengths are unknown here.
    ///
    pub fn expand(&self, margin: u32) -> Locus {
        Locus {
            chr: self.chr.clone(),
            start: self.start.saturating_sub(margin),
            end: self.end.saturating_add(margin),
        }
    }

    ///
    /// A window of `width` bases centered on `center`, clipped to `[0, chrom_len)`.
    ///
    /// Returns the window together with a flag telling whether clipping happened.
    ///
    pub fn centered_window(chr: &str, center: u32, width: u32, chrom_len: u32) -> (Locus, bool) {
        let half = width / 2;
        let raw_start = i64::from(center) - i64::from(half);
        let raw_end = raw_start + i64::from(width);

        let start = raw_start.clamp(0, i64::from(chrom_len)) as u32;
        let end = raw_end.clamp(0, i64::from(chrom_len)) as u32;
        let clipped = raw_start < 0 || raw_end > i64::from(chrom_len);

        (
            Locus {
                chr: chr.to_string(),
                start,
                end,
            },
            clipped,
        )
    }

    ///
    /// Get file string of Locus: the three BED columns, tab separated.
    ///
    pub fn as_string(&self) -> String {
        format!("{}\t{}\t{}", self.chr, self.start, self.end)
    }
}

impl Display for Locus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.chr, self.start, self.end)
    }
}
