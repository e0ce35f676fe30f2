use std::borrow::Cow;
use std::collections::HashMap;
use std::path::Path;

use bio::io::fasta;
use log::info;

use gcmatch_core::utils::get_dynamic_reader;

use crate::error::{GenomeError, GenomeResult};

/// True for `A`, `C`, `G` and `T` in either case; every other symbol counts as ambiguous.
#[inline]
pub fn is_unambiguous_base(base: u8) -> bool {
    matches!(base, b'A' | b'C' | b'G' | b'T' | b'a' | b'c' | b'g' | b't')
}

///
/// Random access to the bases of a reference genome.
///
/// Implementations are shared read-only between scanning threads.
///
pub trait GenomeAccessor: Send + Sync {
    /// Chromosome names with their lengths, in reference order.
    fn chromosomes(&self) -> Vec<(String, u32)>;

    /// Length of one chromosome.
    fn length(&self, chr: &str) -> GenomeResult<u32>;

    /// Bases of `[start, end)`. Fails with [`GenomeError::RangeError`] when the range does
    /// not fit the chromosome.
    fn sequence(&self, chr: &str, start: u32, end: u32) -> GenomeResult<Cow<'_, [u8]>>;

    /// Number of bases in `[start, end)` that are not A/C/G/T.
    fn ambiguous_bases(&self, chr: &str, start: u32, end: u32) -> GenomeResult<u32> {
        let seq = self.sequence(chr, start, end)?;
        Ok(seq.iter().filter(|b| !is_unambiguous_base(**b)).count() as u32)
    }
}

///
/// A reference genome held fully in memory, upper-cased on load.
///
#[derive(Debug, Clone, Default)]
pub struct GenomeAssembly {
    seq_map: HashMap<String, Vec<u8>>,
    order: Vec<String>,
}

impl TryFrom<&Path> for GenomeAssembly {
    type Error = GenomeError;

    ///
    /// Create a new [GenomeAssembly] from a fasta file (optionally gzipped).
    ///
    fn try_from(value: &Path) -> GenomeResult<GenomeAssembly> {
        let read_error = |message: String| GenomeError::ReadError {
            path: value.display().to_string(),
            message,
        };

        let reader = get_dynamic_reader(value).map_err(|e| read_error(e.to_string()))?;
        let records = fasta::Reader::new(reader).records();

        let mut genome = GenomeAssembly::default();
        for record in records {
            let record = record.map_err(|e| read_error(e.to_string()))?;
            genome.insert(record.id().to_string(), record.seq().to_ascii_uppercase())?;
        }

        if genome.is_empty() {
            return Err(read_error("no sequences found".to_string()));
        }

        info!(
            "Loaded {} sequences ({} bp) from {}",
            genome.order.len(),
            genome.total_length(),
            value.display()
        );

        Ok(genome)
    }
}

impl TryFrom<&str> for GenomeAssembly {
    type Error = GenomeError;

    fn try_from(value: &str) -> GenomeResult<Self> {
        GenomeAssembly::try_from(Path::new(value))
    }
}

impl GenomeAssembly {
    ///
    /// Build a genome from in-memory `(name, bases)` pairs. Bases are upper-cased.
    ///
    pub fn from_sequences<I, S>(sequences: I) -> GenomeResult<Self>
    where
        I: IntoIterator<Item = (S, Vec<u8>)>,
        S: Into<String>,
    {
        let mut genome = GenomeAssembly::default();
        for (name, seq) in sequences {
            genome.insert(name.into(), seq.to_ascii_uppercase())?;
        }
        Ok(genome)
    }

    fn insert(&mut self, name: String, seq: Vec<u8>) -> GenomeResult<()> {
        if u32::try_from(seq.len()).is_err() {
            return Err(GenomeError::ChromosomeTooLong(name));
        }
        if self.seq_map.insert(name.clone(), seq).is_none() {
            self.order.push(name);
        }
        Ok(())
    }

    pub fn contains_chr(&self, chr: &str) -> bool {
        self.seq_map.contains_key(chr)
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Sum of all chromosome lengths.
    pub fn total_length(&self) -> u64 {
        self.seq_map.values().map(|s| s.len() as u64).sum()
    }
}

impl GenomeAccessor for GenomeAssembly {
    fn chromosomes(&self) -> Vec<(String, u32)> {
        self.order
            .iter()
            .map(|name| (name.clone(), self.seq_map[name].len() as u32))
            .collect()
    }

    fn length(&self, chr: &str) -> GenomeResult<u32> {
        self.seq_map
            .get(chr)
            .map(|seq| seq.len() as u32)
            .ok_or_else(|| GenomeError::ChromosomeNotFound(chr.to_string()))
    }

    fn sequence(&self, chr: &str, start: u32, end: u32) -> GenomeResult<Cow<'_, [u8]>> {
        let seq = self
            .seq_map
            .get(chr)
            .ok_or_else(|| GenomeError::ChromosomeNotFound(chr.to_string()))?;

        if start > end || end as usize > seq.len() {
            return Err(GenomeError::RangeError {
                chr: chr.to_string(),
                start,
                end,
                length: seq.len() as u32,
            });
        }

        Ok(Cow::Borrowed(&seq[start as usize..end as usize]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs::File;
    use std::io::Write;
    use std::path::PathBuf;

    use flate2::Compression;
    use flate2::write::GzEncoder;
    use pretty_assertions::assert_eq;
    use rstest::*;

    fn get_test_path(file_name: &str) -> PathBuf {
        std::env::current_dir()
            .unwrap()
            .join("../tests/data")
            .join(file_name)
    }

    #[fixture]
    fn genome() -> GenomeAssembly {
        GenomeAssembly::from_sequences(vec![
            ("chr1", b"acgtNNacgt".to_vec()),
            ("chr2", b"GGGGCCCCAT".to_vec()),
        ])
        .unwrap()
    }

    #[rstest]
    fn test_chromosomes_keep_order(genome: GenomeAssembly) {
        assert_eq!(
            genome.chromosomes(),
            vec![("chr1".to_string(), 10), ("chr2".to_string(), 10)]
        );
    }

    #[rstest]
    fn test_sequence_is_upper_cased(genome: GenomeAssembly) {
        let seq = genome.sequence("chr1", 0, 4).unwrap();
        assert_eq!(seq.as_ref(), b"ACGT");
    }

    #[rstest]
    fn test_unknown_chromosome(genome: GenomeAssembly) {
        assert!(matches!(
            genome.sequence("chr3", 0, 1),
            Err(GenomeError::ChromosomeNotFound(_))
        ));
        assert!(matches!(
            genome.length("chr3"),
            Err(GenomeError::ChromosomeNotFound(_))
        ));
    }

    #[rstest]
    fn test_range_past_end(genome: GenomeAssembly) {
        assert!(matches!(
            genome.sequence("chr1", 5, 11),
            Err(GenomeError::RangeError { length: 10, .. })
        ));
        assert!(genome.sequence("chr1", 5, 10).is_ok());
    }

    #[rstest]
    fn test_ambiguous_bases(genome: GenomeAssembly) {
        assert_eq!(genome.ambiguous_bases("chr1", 0, 10).unwrap(), 2);
        assert_eq!(genome.ambiguous_bases("chr2", 0, 10).unwrap(), 0);
    }

    #[rstest]
    fn test_open_fasta_fixture() {
        let genome = GenomeAssembly::try_from(get_test_path("genome.fa").as_path()).unwrap();
        let names: Vec<String> = genome.chromosomes().into_iter().map(|c| c.0).collect();
        assert_eq!(names, vec!["chr1".to_string(), "chr2".to_string()]);
        assert_eq!(genome.length("chr1").unwrap(), 2000);
        assert_eq!(genome.length("chr2").unwrap(), 1000);
    }

    #[rstest]
    fn test_open_gzipped_fasta() {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("tiny.fa.gz");
        let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        encoder.write_all(b">chrA some description\nACGT\nacgt\n").unwrap();
        encoder.finish().unwrap();

        let genome = GenomeAssembly::try_from(path.as_path()).unwrap();
        assert_eq!(genome.sequence("chrA", 0, 8).unwrap().as_ref(), b"ACGTACGT");
    }

    #[rstest]
    fn test_missing_fasta() {
        assert!(GenomeAssembly::try_from("/not/a/genome.fa").is_err());
    }
}
