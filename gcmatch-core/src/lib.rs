//! Core data model for gcmatch.
//!
//! This crate holds the types every other gcmatch crate speaks in: a [`Locus`](models::Locus)
//! (a half-open genomic interval), a [`LocusSet`](models::LocusSet) read from or written to a
//! BED file, and a [`PeakSet`](models::PeakSet) that additionally keeps the narrowPeak summit
//! of each positive locus.
//!
//! ```rust
//! use gcmatch_core::models::{Locus, LocusSet};
//!
//! let loci = LocusSet::from(vec![
//!     Locus::new("chr2", 10, 20).unwrap(),
//!     Locus::new("chr1", 50, 60).unwrap(),
//! ]);
//! assert_eq!(loci.len(), 2);
//! ```
pub mod errors;
pub mod models;
pub mod utils;

pub use errors::{LocusSetError, Result};
