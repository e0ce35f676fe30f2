use thiserror::Error;

#[derive(Error, Debug)]
pub enum LocusSetError {
    #[error("Can't read file: {0}")]
    FileReadError(String),

    #[error("Error parsing locus on line {line}: {message}")]
    LocusParseError { line: usize, message: String },

    #[error("Invalid locus {chr}:{start}-{end}: start must be smaller than end")]
    InvalidLocus { chr: String, start: u32, end: u32 },

    #[error("Corrupted file. 0 loci found in the file: {0}")]
    EmptyLocusSet(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LocusSetError>;
