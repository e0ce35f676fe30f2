use std::io;
use thiserror::Error;

/// Errors raised by a [`GenomeAccessor`](crate::GenomeAccessor).
#[derive(Error, Debug)]
pub enum GenomeError {
    /// The chromosome is not part of the reference.
    #[error("Unknown chromosome: {0}")]
    ChromosomeNotFound(String),

    /// The requested range does not fit the chromosome. Callers must clip.
    #[error("Invalid range {start}-{end} for chromosome {chr} with length {length}")]
    RangeError {
        chr: String,
        start: u32,
        end: u32,
        length: u32,
    },

    /// The chromosome is longer than a `u32` coordinate can address.
    #[error("Chromosome {0} is too long for 32-bit coordinates")]
    ChromosomeTooLong(String),

    /// The reference file could not be parsed.
    #[error("Error reading genome file {path}: {message}")]
    ReadError { path: String, message: String },

    /// IO error occurred while reading the reference.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Errors raised by a [`SignalAccessor`](crate::SignalAccessor).
#[derive(Error, Debug)]
pub enum SignalError {
    /// The signal file could not be opened.
    #[error("Failed to open signal track {path}: {message}")]
    OpenError { path: String, message: String },

    /// Reading values from an open track failed.
    #[error("Failed to read signal for {chr}:{start}-{end}: {message}")]
    ReadError {
        chr: String,
        start: u32,
        end: u32,
        message: String,
    },

    /// A bedGraph line could not be parsed.
    #[error("Error parsing bedGraph line {line}: {message}")]
    ParseError { line: usize, message: String },

    /// Two bedGraph records on one chromosome overlap.
    #[error("Overlapping bedGraph records on {chr} at position {position}")]
    OverlappingRecords { chr: String, position: u32 },

    /// IO error occurred while reading the track.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Result type alias for genome access.
pub type GenomeResult<T> = std::result::Result<T, GenomeError>;

/// Result type alias for signal access.
pub type SignalResult<T> = std::result::Result<T, SignalError>;
