//! Aggregate signal over genomic intervals.
//!
//! A [`SignalAccessor`] answers one question: the per-base sum of a signal track over
//! `[start, end)`. Regions without data contribute zero, and so do chromosomes the track has
//! never heard of.

use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

use log::info;

use gcmatch_core::utils::get_dynamic_reader;

use crate::error::{SignalError, SignalResult};

///
/// Interval-sum queries against a signal track.
///
pub trait SignalAccessor: Send + Sync {
    /// Per-base sum of the signal over `[start, end)`; 0 where the track has no data.
    fn sum(&self, chr: &str, start: u32, end: u32) -> SignalResult<f64>;
}

/// Sorted, non-overlapping records of one chromosome with running totals.
#[derive(Debug, Default)]
struct ChromTrack {
    starts: Vec<u32>,
    ends: Vec<u32>,
    values: Vec<f64>,
    /// `prefix[i]` is the signal mass of records `0..i`.
    prefix: Vec<f64>,
}

impl ChromTrack {
    fn build(chr: &str, mut records: Vec<(u32, u32, f64)>) -> SignalResult<Self> {
        records.sort_by_key(|r| (r.0, r.1));

        let mut track = ChromTrack {
            starts: Vec::with_capacity(records.len()),
            ends: Vec::with_capacity(records.len()),
            values: Vec::with_capacity(records.len()),
            prefix: Vec::with_capacity(records.len() + 1),
        };
        track.prefix.push(0.0);

        for (start, end, value) in records {
            if let Some(&previous_end) = track.ends.last() {
                if start < previous_end {
                    return Err(SignalError::OverlappingRecords {
                        chr: chr.to_string(),
                        position: start,
                    });
                }
            }
            let mass = value * f64::from(end - start);
            let total = track.prefix[track.prefix.len() - 1] + mass;
            track.starts.push(start);
            track.ends.push(end);
            track.values.push(value);
            track.prefix.push(total);
        }

        Ok(track)
    }

    fn sum(&self, start: u32, end: u32) -> f64 {
        if start >= end {
            return 0.0;
        }
        // records are disjoint and sorted, so ends are sorted too
        let lo = self.ends.partition_point(|&e| e <= start);
        let hi = self.starts.partition_point(|&s| s < end);
        if lo >= hi {
            return 0.0;
        }

        let mut total = self.prefix[hi] - self.prefix[lo];

        // trim the parts of the edge records that stick out of the query
        let head = start.saturating_sub(self.starts[lo]);
        total -= self.values[lo] * f64::from(head);
        let tail = self.ends[hi - 1].saturating_sub(end);
        total -= self.values[hi - 1] * f64::from(tail);

        total
    }
}

///
/// A bedGraph track (`chr start end value`) held in memory.
///
#[derive(Debug, Default)]
pub struct BedGraphSignal {
    tracks: HashMap<String, ChromTrack>,
}

impl BedGraphSignal {
    ///
    /// Build a track from `(chr, start, end, value)` records. Records must be non-empty
    /// (`start < end`) and records on one chromosome must not overlap. `ParseError::line`
    /// is the 1-based index of the offending record.
    ///
    pub fn from_records<I, S>(records: I) -> SignalResult<Self>
    where
        I: IntoIterator<Item = (S, u32, u32, f64)>,
        S: Into<String>,
    {
        let mut per_chrom: HashMap<String, Vec<(u32, u32, f64)>> = HashMap::new();
        for (idx, (chr, start, end, value)) in records.into_iter().enumerate() {
            if start >= end {
                return Err(SignalError::ParseError {
                    line: idx + 1,
                    message: format!("empty record {}-{}", start, end),
                });
            }
            per_chrom
                .entry(chr.into())
                .or_default()
                .push((start, end, value));
        }

        let mut tracks = HashMap::with_capacity(per_chrom.len());
        for (chr, records) in per_chrom {
            let track = ChromTrack::build(&chr, records)?;
            tracks.insert(chr, track);
        }

        Ok(BedGraphSignal { tracks })
    }

    /// Number of chromosomes with at least one record.
    pub fn n_chromosomes(&self) -> usize {
        self.tracks.len()
    }
}

impl TryFrom<&Path> for BedGraphSignal {
    type Error = SignalError;

    ///
    /// Read a bedGraph file (optionally gzipped). `track`, `browser` and `#` lines are skipped.
    ///
    fn try_from(value: &Path) -> SignalResult<Self> {
        let reader = get_dynamic_reader(value).map_err(|e| SignalError::OpenError {
            path: value.display().to_string(),
            message: e.to_string(),
        })?;

        let mut records: Vec<(String, u32, u32, f64)> = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty()
                || line.starts_with('#')
                || line.starts_with("track")
                || line.starts_with("browser")
            {
                continue;
            }

            let parse_error = |message: String| SignalError::ParseError {
                line: idx + 1,
                message,
            };

            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 4 {
                return Err(parse_error(format!(
                    "expected 4 columns, found {}",
                    fields.len()
                )));
            }
            let start: u32 = fields[1]
                .parse()
                .map_err(|_| parse_error(format!("invalid start: {:?}", fields[1])))?;
            let end: u32 = fields[2]
                .parse()
                .map_err(|_| parse_error(format!("invalid end: {:?}", fields[2])))?;
            let value: f64 = fields[3]
                .parse()
                .map_err(|_| parse_error(format!("invalid value: {:?}", fields[3])))?;

            if start >= end {
                return Err(parse_error(format!("empty record {}-{}", start, end)));
            }

            records.push((fields[0].to_string(), start, end, value));
        }

        let signal = BedGraphSignal::from_records(records)?;
        info!(
            "Loaded bedGraph signal for {} chromosomes from {}",
            signal.n_chromosomes(),
            value.display()
        );
        Ok(signal)
    }
}

impl SignalAccessor for BedGraphSignal {
    fn sum(&self, chr: &str, start: u32, end: u32) -> SignalResult<f64> {
        Ok(self
            .tracks
            .get(chr)
            .map_or(0.0, |track| track.sum(start, end)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalFormat {
    BigWig,
    BedGraph,
}

impl SignalFormat {
    ///
    /// Determine the format of a signal track from its extension: `bw`/`bigwig` or
    /// `bedgraph`/`bg`, the latter optionally followed by `.gz`. Case-insensitive.
    ///
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_ascii_lowercase();
        let name = name.strip_suffix(".gz").unwrap_or(&name);
        let (_, ext) = name.rsplit_once('.')?;
        match ext {
            "bw" | "bigwig" => Some(SignalFormat::BigWig),
            "bedgraph" | "bg" => Some(SignalFormat::BedGraph),
            _ => None,
        }
    }
}

///
/// Open a signal track, picking the reader from the file extension.
///
pub fn open_signal(path: &Path) -> SignalResult<Box<dyn SignalAccessor>> {
    let open_error = |message: &str| SignalError::OpenError {
        path: path.display().to_string(),
        message: message.to_string(),
    };

    match SignalFormat::from_path(path) {
        Some(SignalFormat::BedGraph) => Ok(Box::new(BedGraphSignal::try_from(path)?)),
        #[cfg(feature = "bigwig")]
        Some(SignalFormat::BigWig) => Ok(Box::new(BigWigSignal::open(path)?)),
        #[cfg(not(feature = "bigwig"))]
        Some(SignalFormat::BigWig) => Err(open_error("bigWig support is not compiled in")),
        None => Err(open_error(
            "unknown signal format, expected .bw, .bigwig, .bedGraph or .bg",
        )),
    }
}

#[cfg(feature = "bigwig")]
pub use self::bigwig::BigWigSignal;

#[cfg(feature = "bigwig")]
mod bigwig {
    use std::collections::HashSet;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    use bigtools::BigWigRead;
    use bigtools::utils::reopen::ReopenableFile;

    use super::SignalAccessor;
    use crate::error::{SignalError, SignalResult};

    ///
    /// A bigWig track. Readers are pooled so concurrent queries never share a file cursor;
    /// a thread that finds the pool empty opens its own reader and returns it afterwards.
    ///
    pub struct BigWigSignal {
        path: PathBuf,
        chroms: HashSet<String>,
        readers: Mutex<Vec<BigWigRead<ReopenableFile>>>,
    }

    impl BigWigSignal {
        pub fn open<P: AsRef<Path>>(path: P) -> SignalResult<Self> {
            let path = path.as_ref().to_path_buf();
            let reader = Self::open_reader(&path)?;
            let chroms = reader
                .chroms()
                .iter()
                .map(|chrom| chrom.name.clone())
                .collect();

            Ok(BigWigSignal {
                path,
                chroms,
                readers: Mutex::new(vec![reader]),
            })
        }

        fn open_reader(path: &Path) -> SignalResult<BigWigRead<ReopenableFile>> {
            let open_error = |message: String| SignalError::OpenError {
                path: path.display().to_string(),
                message,
            };
            let path_str = path
                .to_str()
                .ok_or_else(|| open_error("path is not valid UTF-8".to_string()))?;
            BigWigRead::open_file(path_str).map_err(|e| open_error(format!("{:?}", e)))
        }

        fn checkout(&self) -> SignalResult<BigWigRead<ReopenableFile>> {
            let pooled = self
                .readers
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .pop();
            match pooled {
                Some(reader) => Ok(reader),
                None => Self::open_reader(&self.path),
            }
        }

        fn checkin(&self, reader: BigWigRead<ReopenableFile>) {
            self.readers
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .push(reader);
        }
    }

    impl SignalAccessor for BigWigSignal {
        fn sum(&self, chr: &str, start: u32, end: u32) -> SignalResult<f64> {
            if start >= end || !self.chroms.contains(chr) {
                return Ok(0.0);
            }

            let read_error = |message: String| SignalError::ReadError {
                chr: chr.to_string(),
                start,
                end,
                message,
            };

            let mut reader = self.checkout()?;
            let mut total = 0.0;
            {
                let intervals = reader
                    .get_interval(chr, start, end)
                    .map_err(|e| read_error(format!("{:?}", e)))?;
                for value in intervals {
                    let value = value.map_err(|e| read_error(format!("{:?}", e)))?;
                    let overlap = value.end.min(end).saturating_sub(value.start.max(start));
                    if !value.value.is_nan() {
                        total += f64::from(value.value) * f64::from(overlap);
                    }
                }
            }
            self.checkin(reader);

            Ok(total)
        }
    }
}
