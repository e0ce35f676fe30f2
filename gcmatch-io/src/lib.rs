//! # Reference genome and signal track access.
//!
//! This crate provides the two read-only collaborators the negative sampler queries while it
//! scans a genome:
//!
//! - [`GenomeAccessor`]: random access to reference bases by `(chromosome, start, end)`,
//!   implemented in memory by [`GenomeAssembly`] from a (gzipped) FASTA file.
//! - [`SignalAccessor`]: aggregate signal over an interval, implemented by
//!   [`BedGraphSignal`] and, with the `bigwig` feature, [`BigWigSignal`].
//!
//! Both traits are `Send + Sync` so a single handle can be shared by every scanning thread.
pub mod error;
pub mod genome;
pub mod signal;

pub use error::*;
pub use genome::{GenomeAccessor, GenomeAssembly, is_unambiguous_base};
#[cfg(feature = "bigwig")]
pub use signal::BigWigSignal;
pub use signal::{BedGraphSignal, SignalAccessor, SignalFormat, open_signal};
