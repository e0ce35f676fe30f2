use thiserror::Error;

use gcmatch_core::LocusSetError;
use gcmatch_io::{GenomeError, SignalError};

use crate::config::ConfigError;

#[derive(Error, Debug)]
pub enum SamplerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Locus error: {0}")]
    LocusSet(#[from] LocusSetError),

    #[error("Genome access error: {0}")]
    Genome(#[from] GenomeError),

    #[error("Signal access error: {0}")]
    Signal(#[from] SignalError),

    #[error("Failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Failed to serialize run report: {0}")]
    Report(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SamplerError>;
