use std::collections::HashSet;
use std::fmt::{self, Display};
use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;

use crate::errors::{LocusSetError, Result};
use crate::models::Locus;
use crate::utils::get_dynamic_reader;

/// narrowPeak keeps the summit offset (relative to start) in its 10th column.
const NARROWPEAK_SUMMIT_COLUMN: usize = 9;

///
/// LocusSet struct, an ordered collection of loci such as a BED file.
///
#[derive(Clone, Debug, Default)]
pub struct LocusSet {
    pub loci: Vec<Locus>,
    pub path: Option<PathBuf>,
}

///
/// A positive locus together with its summit offset, if the file carried one.
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Peak {
    pub locus: Locus,
    pub summit: Option<u32>,
}

impl Peak {
    ///
    /// The base the composition window of this peak is centered on. The summit is used
    /// only when asked for and when it falls inside the locus; otherwise the midpoint.
    ///
    pub fn center(&self, use_summit: bool) -> u32 {
        match self.summit {
            Some(summit) if use_summit && summit < self.locus.width() => self.locus.start + summit,
            _ => self.locus.mid_point(),
        }
    }
}

///
/// PeakSet struct, the positive loci of a run, deduplicated by exact coordinates
/// and sorted by (chromosome, start).
///
#[derive(Clone, Debug, Default)]
pub struct PeakSet {
    pub peaks: Vec<Peak>,
    pub path: Option<PathBuf>,
}

/// One parsed data line of a BED-like file.
struct BedLine {
    locus: Locus,
    summit: Option<u32>,
}

fn is_header_line(line: &str) -> bool {
    line.starts_with("browser") || line.starts_with("track") || line.starts_with('#')
}

///
/// Parse every data line of a BED-like file. Comment lines (`#`, `track`, `browser`) are
/// skipped, as is a first line whose start column is not a number (a column header).
///
fn read_bed_lines(path: &Path) -> Result<Vec<BedLine>> {
    let reader = get_dynamic_reader(path)
        .map_err(|e| LocusSetError::FileReadError(format!("{}: {}", path.display(), e)))?;

    let mut lines = Vec::new();
    let mut first_line = true;

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line_number = idx + 1;

        if line.trim().is_empty() || is_header_line(&line) {
            continue;
        }

        let parts: Vec<&str> = line.split('\t').collect();

        if first_line {
            first_line = false;
            if parts.len() >= 3 && parts[1].parse::<u32>().is_err() {
                continue;
            }
        }

        if parts.len() < 3 {
            return Err(LocusSetError::LocusParseError {
                line: line_number,
                message: format!("expected at least 3 columns, found {}", parts.len()),
            });
        }

        let start: u32 = parts[1].parse().map_err(|_| LocusSetError::LocusParseError {
            line: line_number,
            message: format!("invalid start position: {:?}", parts[1]),
        })?;
        let end: u32 = parts[2].parse().map_err(|_| LocusSetError::LocusParseError {
            line: line_number,
            message: format!("invalid end position: {:?}", parts[2]),
        })?;

        let locus = Locus::new(parts[0], start, end)?;

        // a summit of -1 means "not called" in narrowPeak
        let summit = parts
            .get(NARROWPEAK_SUMMIT_COLUMN)
            .and_then(|s| s.trim().parse::<i64>().ok())
            .and_then(|s| u32::try_from(s).ok());

        lines.push(BedLine { locus, summit });
    }

    Ok(lines)
}

impl TryFrom<&Path> for LocusSet {
    type Error = LocusSetError;

    ///
    /// Create a new [LocusSet] from a bed file (optionally gzipped). Extra columns are ignored.
    ///
    fn try_from(value: &Path) -> Result<Self> {
        let loci = read_bed_lines(value)?
            .into_iter()
            .map(|line| line.locus)
            .collect();

        Ok(LocusSet {
            loci,
            path: Some(value.to_owned()),
        })
    }
}

impl TryFrom<&str> for LocusSet {
    type Error = LocusSetError;

    fn try_from(value: &str) -> Result<Self> {
        LocusSet::try_from(Path::new(value))
    }
}

impl TryFrom<PathBuf> for LocusSet {
    type Error = LocusSetError;

    fn try_from(value: PathBuf) -> Result<Self> {
        LocusSet::try_from(value.as_path())
    }
}

impl From<Vec<Locus>> for LocusSet {
    fn from(loci: Vec<Locus>) -> Self {
        LocusSet { loci, path: None }
    }
}

impl<'a> IntoIterator for &'a LocusSet {
    type Item = &'a Locus;
    type IntoIter = std::slice::Iter<'a, Locus>;

    fn into_iter(self) -> Self::IntoIter {
        self.loci.iter()
    }
}

impl LocusSet {
    ///
    /// Sort loci by chromosome, then start. Original order is overwritten.
    ///
    pub fn sort(&mut self) {
        self.loci.sort();
    }

    ///
    /// Drop loci whose coordinates were already seen, keeping the first occurrence.
    ///
    pub fn dedup(&mut self) {
        let mut seen: HashSet<Locus> = HashSet::with_capacity(self.loci.len());
        self.loci.retain(|locus| seen.insert(locus.clone()));
    }

    pub fn len(&self) -> usize {
        self.loci.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loci.is_empty()
    }

    ///
    /// Write the set as tab-separated `chr start end` lines, no header. A path ending in
    /// `.gz` is gzip-compressed.
    ///
    /// # Arguments
    /// - path: the path to the file to dump to
    pub fn write_bed<T: AsRef<Path>>(&self, path: T) -> std::io::Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = File::create(path)?;
        let is_gzipped = path.extension().is_some_and(|ext| ext == "gz");

        if is_gzipped {
            let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::best());
            self.write_records(&mut encoder)?;
            encoder.finish()?.flush()?;
        } else {
            let mut writer = BufWriter::new(file);
            self.write_records(&mut writer)?;
            writer.flush()?;
        }

        Ok(())
    }

    ///
    /// Write the records to any sink, one locus per line.
    ///
    pub fn write_records<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for locus in &self.loci {
            writeln!(writer, "{}", locus.as_string())?;
        }
        Ok(())
    }
}

impl Display for LocusSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LocusSet with {} loci.", self.len())
    }
}

impl TryFrom<&Path> for PeakSet {
    type Error = LocusSetError;

    ///
    /// Create a new [PeakSet] from a BED or narrowPeak file. The result is deduplicated by
    /// exact coordinates and sorted. A file without any locus is an error.
    ///
    fn try_from(value: &Path) -> Result<Self> {
        let peaks: Vec<Peak> = read_bed_lines(value)?
            .into_iter()
            .map(|line| Peak {
                locus: line.locus,
                summit: line.summit,
            })
            .collect();

        if peaks.is_empty() {
            return Err(LocusSetError::EmptyLocusSet(value.display().to_string()));
        }

        let mut peak_set = PeakSet::from(peaks);
        peak_set.path = Some(value.to_owned());
        Ok(peak_set)
    }
}

impl TryFrom<&str> for PeakSet {
    type Error = LocusSetError;

    fn try_from(value: &str) -> Result<Self> {
        PeakSet::try_from(Path::new(value))
    }
}

impl From<Vec<Peak>> for PeakSet {
    ///
    /// Build a peak set from in-memory peaks; duplicates are dropped and the result sorted.
    ///
    fn from(peaks: Vec<Peak>) -> Self {
        let mut seen: HashSet<Locus> = HashSet::with_capacity(peaks.len());
        let mut peaks: Vec<Peak> = peaks
            .into_iter()
            .filter(|peak| seen.insert(peak.locus.clone()))
            .collect();
        peaks.sort_by(|a, b| a.locus.cmp(&b.locus));

        PeakSet { peaks, path: None }
    }
}

impl From<Vec<Locus>> for PeakSet {
    fn from(loci: Vec<Locus>) -> Self {
        PeakSet::from(
            loci.into_iter()
                .map(|locus| Peak {
                    locus,
                    summit: None,
                })
                .collect::<Vec<Peak>>(),
        )
    }
}

impl PeakSet {
    pub fn len(&self) -> usize {
        self.peaks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peaks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Peak> {
        self.peaks.iter()
    }

    ///
    /// Plain loci of the peaks, without summits.
    ///
    pub fn to_locus_set(&self) -> LocusSet {
        LocusSet::from(
            self.peaks
                .iter()
                .map(|peak| peak.locus.clone())
                .collect::<Vec<Locus>>(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    fn get_test_path(file_name: &str) -> PathBuf {
        std::env::current_dir()
            .unwrap()
            .join("../tests/data")
            .join(file_name)
    }

    #[fixture]
    fn loci() -> Vec<Locus> {
        vec![
            Locus::new("chr2", 100, 200).unwrap(),
            Locus::new("chr1", 300, 400).unwrap(),
            Locus::new("chr1", 100, 200).unwrap(),
            Locus::new("chr2", 100, 200).unwrap(),
        ]
    }

    #[rstest]
    fn test_open_peaks_narrowpeak() {
        let peaks = PeakSet::try_from(get_test_path("peaks.narrowPeak").as_path()).unwrap();
        assert_eq!(peaks.len(), 4);
        // sorted by chromosome, then start
        assert_eq!(peaks.peaks[0].locus.chr, "chr1");
        assert_eq!(peaks.peaks[0].summit, Some(100));
        // chr1:1500-1700 has summit -1
        assert_eq!(peaks.peaks[2].locus, Locus::new("chr1", 1500, 1700).unwrap());
        assert_eq!(peaks.peaks[2].summit, None);
        assert_eq!(peaks.peaks[2].center(true), 1600);
    }

    #[rstest]
    fn test_summit_out_of_range_is_dropped() {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("peaks.narrowPeak");
        std::fs::write(
            &path,
            "chr1\t0\t100\tp\t0\t.\t0\t0\t0\t4294967296\nchr1\t200\t300\tq\t0\t.\t0\t0\t0\t20\n",
        )
        .unwrap();
        let peaks = PeakSet::try_from(path.as_path()).unwrap();
        assert_eq!(peaks.peaks[0].summit, None);
        assert_eq!(peaks.peaks[1].summit, Some(20));
    }

    #[rstest]
    fn test_open_peaks_drops_duplicates() {
        // the narrowPeak fixture lists chr1:1000-1200 twice
        let peaks = PeakSet::try_from(get_test_path("peaks.narrowPeak").as_path()).unwrap();
        let unique: HashSet<&Locus> = peaks.iter().map(|p| &p.locus).collect();
        assert_eq!(unique.len(), peaks.len());
    }

    #[rstest]
    fn test_open_bed_with_header() {
        let set = LocusSet::try_from(get_test_path("blacklist.bed").as_path()).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.loci[0], Locus::new("chr2", 0, 500).unwrap());
    }

    #[rstest]
    fn test_empty_peak_file_is_error() {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("empty.bed");
        std::fs::write(&path, "#nothing here\n").unwrap();
        let result = PeakSet::try_from(path.as_path());
        assert!(matches!(result, Err(LocusSetError::EmptyLocusSet(_))));
    }

    #[rstest]
    fn test_bad_line_reports_line_number() {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("bad.bed");
        std::fs::write(&path, "chr1\t10\t20\nchr1\tten\t30\n").unwrap();
        match LocusSet::try_from(path.as_path()) {
            Err(LocusSetError::LocusParseError { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[rstest]
    fn test_dedup_and_sort(loci: Vec<Locus>) {
        let mut set = LocusSet::from(loci);
        set.dedup();
        set.sort();
        assert_eq!(set.len(), 3);
        assert_eq!(set.loci[0], Locus::new("chr1", 100, 200).unwrap());
        assert_eq!(set.loci[2], Locus::new("chr2", 100, 200).unwrap());
    }

    #[rstest]
    fn test_peak_set_from_vec_dedups(loci: Vec<Locus>) {
        let peaks = PeakSet::from(loci);
        assert_eq!(peaks.len(), 3);
        assert_eq!(peaks.peaks[0].locus, Locus::new("chr1", 100, 200).unwrap());
    }

    #[rstest]
    #[case(true, 150)]
    #[case(false, 200)]
    fn test_peak_center(#[case] use_summit: bool, #[case] expected: u32) {
        let peak = Peak {
            locus: Locus::new("chr1", 100, 300).unwrap(),
            summit: Some(50),
        };
        assert_eq!(peak.center(use_summit), expected);
    }

    #[rstest]
    fn test_peak_center_ignores_summit_outside_locus() {
        let peak = Peak {
            locus: Locus::new("chr1", 100, 300).unwrap(),
            summit: Some(500),
        };
        assert_eq!(peak.center(true), 200);
    }

    #[rstest]
    #[case("out.bed")]
    #[case("out.bed.gz")]
    fn test_write_bed_round_trip(loci: Vec<Locus>, #[case] file_name: &str) {
        let mut set = LocusSet::from(loci);
        set.dedup();
        set.sort();

        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join(file_name);
        set.write_bed(&path).unwrap();

        let reread = LocusSet::try_from(path.as_path()).unwrap();
        assert_eq!(reread.loci, set.loci);
    }

    #[rstest]
    fn test_write_records_has_no_header(loci: Vec<Locus>) {
        let set = LocusSet::from(loci[..1].to_vec());
        let mut buffer: Vec<u8> = Vec::new();
        set.write_records(&mut buffer).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), "chr2\t100\t200\n");
    }
}
