//! # gcmatch
//!
//! Sample background loci whose GC content matches a set of peaks. Each part lives in its own
//! crate and is re-exported here behind a feature of the same name:
//!
//! - `core`: loci, locus sets and peak sets
//! - `io`: reference genome and signal track access
//! - `negatives`: the GC-matched sampler itself
#[cfg(feature = "core")]
#[doc(inline)]
pub use gcmatch_core as core;

#[cfg(feature = "io")]
#[doc(inline)]
pub use gcmatch_io as io;

#[cfg(feature = "negatives")]
#[doc(inline)]
pub use gcmatch_negatives as negatives;
