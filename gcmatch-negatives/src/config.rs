use std::fs::read_to_string;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use gcmatch_core::models::{Locus, LocusSet};

use crate::error::Result;

pub const DEFAULT_BIN_WIDTH: f64 = 0.02;
pub const DEFAULT_MAX_N_PERC: f64 = 0.1;
pub const DEFAULT_WINDOW_WIDTH: u32 = 2114;
pub const DEFAULT_STRIDE: u32 = 1000;
pub const DEFAULT_SEED: u64 = 1234;

fn default_bin_width() -> f64 {
    DEFAULT_BIN_WIDTH
}

fn default_max_n_perc() -> f64 {
    DEFAULT_MAX_N_PERC
}

fn default_window_width() -> u32 {
    DEFAULT_WINDOW_WIDTH
}

fn default_stride() -> u32 {
    DEFAULT_STRIDE
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("bin_width must be in (0, 1], got {0}")]
    InvalidBinWidth(f64),
    #[error("max_n_perc must be in [0, 1], got {0}")]
    InvalidMaxNPerc(f64),
    #[error("stride must be greater than 0")]
    ZeroStride,
    #[error("window_width must be greater than 0")]
    ZeroWindowWidth,
    #[error("beta must be a positive finite number, got {0}")]
    InvalidBeta(f64),
    #[error("beta is set but no signal track was provided")]
    BetaWithoutSignal,
    #[error("threads must be greater than 0")]
    ZeroThreads,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

///
/// Every tunable of a negative sampling run.
///
/// All fields have defaults, so an empty TOML file is a valid configuration.
///
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SamplerConfig {
    /// Width of one GC bin, in GC fraction units.
    #[serde(default = "default_bin_width")]
    pub bin_width: f64,
    /// Largest tolerated fraction of non-ACGT bases in a candidate window.
    #[serde(default = "default_max_n_perc")]
    pub max_n_perc: f64,
    /// Candidates with more than `beta` times the weakest positive's signal are dropped.
    #[serde(default)]
    pub beta: Option<f64>,
    /// Width of the window GC content and signal are measured over.
    #[serde(default = "default_window_width")]
    pub window_width: u32,
    /// Step between candidate windows, and the width of the emitted negative loci.
    #[serde(default = "default_stride")]
    pub stride: u32,
    #[serde(default)]
    pub chromosome_subset: Option<Vec<String>>,
    /// Bases added on both sides of every positive before it is excluded.
    #[serde(default)]
    pub exclusion_margin: u32,
    /// Center positive windows on the narrowPeak summit instead of the midpoint.
    #[serde(default)]
    pub use_summit: bool,
    #[serde(default)]
    pub blacklist: Vec<PathBuf>,
    #[serde(default)]
    pub threads: Option<usize>,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default)]
    pub progress: bool,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        SamplerConfig {
            bin_width: DEFAULT_BIN_WIDTH,
            max_n_perc: DEFAULT_MAX_N_PERC,
            beta: None,
            window_width: DEFAULT_WINDOW_WIDTH,
            stride: DEFAULT_STRIDE,
            chromosome_subset: None,
            exclusion_margin: 0,
            use_summit: false,
            blacklist: Vec::new(),
            threads: None,
            seed: DEFAULT_SEED,
            progress: false,
        }
    }
}

impl TryFrom<&Path> for SamplerConfig {
    type Error = ConfigError;

    fn try_from(path: &Path) -> ConfigResult<Self> {
        let toml_str = read_to_string(path)?;
        let config = toml::from_str(&toml_str)?;
        Ok(config)
    }
}

impl SamplerConfig {
    ///
    /// Check every parameter before any data is touched.
    ///
    /// # Arguments
    /// - has_signal: whether a signal track accompanies this run
    ///
    pub fn validate(&self, has_signal: bool) -> ConfigResult<()> {
        if !(self.bin_width > 0.0 && self.bin_width <= 1.0) {
            return Err(ConfigError::InvalidBinWidth(self.bin_width));
        }
        if !(0.0..=1.0).contains(&self.max_n_perc) {
            return Err(ConfigError::InvalidMaxNPerc(self.max_n_perc));
        }
        if self.stride == 0 {
            return Err(ConfigError::ZeroStride);
        }
        if self.window_width == 0 {
            return Err(ConfigError::ZeroWindowWidth);
        }
        if let Some(beta) = self.beta {
            if !(beta.is_finite() && beta > 0.0) {
                return Err(ConfigError::InvalidBeta(beta));
            }
            if !has_signal {
                return Err(ConfigError::BetaWithoutSignal);
            }
        }
        if self.threads == Some(0) {
            return Err(ConfigError::ZeroThreads);
        }
        Ok(())
    }

    /// Worker threads to use: the configured count, else the machine's parallelism.
    pub fn num_threads(&self) -> usize {
        self.threads.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1)
        })
    }

    ///
    /// Read every configured blacklist file into one list of loci.
    ///
    pub fn load_blacklist(&self) -> Result<Vec<Locus>> {
        let mut loci = Vec::new();
        for path in &self.blacklist {
            let set = LocusSet::try_from(path.as_path())?;
            loci.extend(set.loci);
        }
        Ok(loci)
    }
}
