use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::ArgMatches;
use log::info;

use gcmatch_core::models::PeakSet;
use gcmatch_io::{GenomeAssembly, SignalAccessor, open_signal};
use gcmatch_negatives::writer::{write_negatives, write_report};
use gcmatch_negatives::{LogReporter, SamplerConfig, SamplerInputs, sample_negatives};

///
/// Parse an optional flag value into `T`.
///
fn parse_flag<T>(matches: &ArgMatches, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    matches
        .get_one::<String>(name)
        .map(|value| {
            value
                .parse::<T>()
                .with_context(|| format!("Invalid value for --{}: {}", name, value))
        })
        .transpose()
}

///
/// Start from the `--config` file (or the defaults) and apply every flag given on top.
///
pub fn build_config(matches: &ArgMatches) -> Result<SamplerConfig> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => SamplerConfig::try_from(Path::new(path))
            .with_context(|| format!("Failed to load config file: {}", path))?,
        None => SamplerConfig::default(),
    };

    if let Some(bin_width) = parse_flag(matches, "bin-width")? {
        config.bin_width = bin_width;
    }
    if let Some(max_n_perc) = parse_flag(matches, "max-n-perc")? {
        config.max_n_perc = max_n_perc;
    }
    if let Some(beta) = parse_flag(matches, "beta")? {
        config.beta = Some(beta);
    }
    if let Some(window_width) = parse_flag(matches, "window-width")? {
        config.window_width = window_width;
    }
    if let Some(stride) = parse_flag(matches, "stride")? {
        config.stride = stride;
    }
    if let Some(margin) = parse_flag(matches, "exclusion-margin")? {
        config.exclusion_margin = margin;
    }
    if let Some(threads) = parse_flag(matches, "threads")? {
        config.threads = Some(threads);
    }
    if let Some(seed) = parse_flag(matches, "seed")? {
        config.seed = seed;
    }
    if let Some(chromosomes) = matches.get_many::<String>("chromosomes") {
        config.chromosome_subset = Some(chromosomes.cloned().collect());
    }
    if let Some(blacklist) = matches.get_many::<String>("blacklist") {
        config.blacklist.extend(blacklist.map(PathBuf::from));
    }
    if matches.get_flag("use-summit") {
        config.use_summit = true;
    }
    if matches.get_flag("progress") {
        config.progress = true;
    }

    Ok(config)
}

pub fn run_negatives(matches: &ArgMatches) -> Result<()> {
    let peaks_path = matches
        .get_one::<String>("peaks")
        .context("--peaks is required")?;
    let genome_path = matches
        .get_one::<String>("genome")
        .context("--genome is required")?;
    let output = matches
        .get_one::<String>("output")
        .context("--output is required")?;
    let signal_path = matches.get_one::<String>("signal");
    let report_path = matches.get_one::<String>("report");

    let config = build_config(matches)?;
    config.validate(signal_path.is_some())?;

    let peaks = PeakSet::try_from(Path::new(peaks_path))
        .with_context(|| format!("Failed to load peaks: {}", peaks_path))?;
    info!("Loaded {} peaks from {}", peaks.len(), peaks_path);

    let genome = GenomeAssembly::try_from(Path::new(genome_path))
        .with_context(|| format!("Failed to load genome: {}", genome_path))?;

    let signal: Option<Box<dyn SignalAccessor>> = signal_path
        .map(|path| {
            open_signal(Path::new(path))
                .with_context(|| format!("Failed to open signal track: {}", path))
        })
        .transpose()?;

    let blacklist = config.load_blacklist()?;

    let mut inputs = SamplerInputs::new(&peaks, &genome).with_blacklist(&blacklist);
    if let Some(signal) = signal.as_deref() {
        inputs = inputs.with_signal(signal);
    }

    let result = sample_negatives(&inputs, &config, &LogReporter)?;

    write_negatives(&result.negatives, output)?;
    if let Some(report_path) = report_path {
        write_report(&result.report, report_path)?;
        info!("Wrote run report to {}", report_path);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    use crate::negatives::cli::create_negatives_cli;

    fn matches_from(args: &[&str]) -> ArgMatches {
        let mut argv = vec!["negatives"];
        argv.extend_from_slice(args);
        create_negatives_cli().try_get_matches_from(argv).unwrap()
    }

    const REQUIRED: [&str; 6] = [
        "--peaks",
        "p.bed",
        "--genome",
        "g.fa",
        "--output",
        "out.bed",
    ];

    #[rstest]
    fn test_defaults_without_flags() {
        let config = build_config(&matches_from(&REQUIRED)).unwrap();
        assert_eq!(config, SamplerConfig::default());
    }

    #[rstest]
    fn test_flags_override_config_file() {
        let mut args = REQUIRED.to_vec();
        args.extend([
            "--config",
            "../tests/data/sampler.toml",
            "--stride",
            "50",
            "--chromosomes",
            "chr1",
            "chr2",
            "--use-summit",
        ]);
        let config = build_config(&matches_from(&args)).unwrap();

        // from the file
        assert_eq!(config.bin_width, 0.1);
        assert_eq!(config.seed, 7);
        // from the flags
        assert_eq!(config.stride, 50);
        assert_eq!(
            config.chromosome_subset,
            Some(vec!["chr1".to_string(), "chr2".to_string()])
        );
        assert!(config.use_summit);
    }

    #[rstest]
    fn test_blacklist_flags_extend_config() {
        let mut args = REQUIRED.to_vec();
        args.extend([
            "--config",
            "../tests/data/sampler.toml",
            "--blacklist",
            "extra.bed",
        ]);
        let config = build_config(&matches_from(&args)).unwrap();
        assert_eq!(
            config.blacklist,
            vec![
                PathBuf::from("../tests/data/blacklist.bed"),
                PathBuf::from("extra.bed")
            ]
        );
    }

    #[rstest]
    fn test_bad_number_is_error() {
        let mut args = REQUIRED.to_vec();
        args.extend(["--beta", "half"]);
        assert!(build_config(&matches_from(&args)).is_err());
    }

    #[rstest]
    fn test_run_negatives_end_to_end() {
        let tempdir = tempfile::tempdir().unwrap();
        let output = tempdir.path().join("negatives.bed");
        let report = tempdir.path().join("report.json");
        let output_str = output.to_str().unwrap();
        let report_str = report.to_str().unwrap();

        let matches = matches_from(&[
            "--peaks",
            "../tests/data/peaks.narrowPeak",
            "--genome",
            "../tests/data/genome.fa",
            "--output",
            output_str,
            "--report",
            report_str,
            "--window-width",
            "100",
            "--stride",
            "50",
            "--bin-width",
            "0.1",
            "--threads",
            "2",
        ]);
        run_negatives(&matches).unwrap();

        let negatives = gcmatch_core::models::LocusSet::try_from(output.as_path()).unwrap();
        assert!(negatives.len() <= 4);
        let json = std::fs::read_to_string(&report).unwrap();
        assert!(json.contains("\"n_positives\": 4"));
    }
}
