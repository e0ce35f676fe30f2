use clap::{Arg, ArgAction, Command, arg};

pub const NEGATIVES_CMD: &str = "negatives";

pub fn create_negatives_cli() -> Command {
    Command::new(NEGATIVES_CMD)
        .about("Sample negative loci whose GC content matches a set of peaks.")
        .arg(
            arg!(--peaks <PEAKS>)
                .required(true)
                .help("Positive loci: BED or narrowPeak file, optionally gzipped"),
        )
        .arg(
            arg!(--genome <GENOME>)
                .required(true)
                .help("Reference genome FASTA, optionally gzipped"),
        )
        .arg(
            arg!(--output <OUTPUT>)
                .required(true)
                .help("Output BED file for the negatives (.gz to compress)"),
        )
        .arg(
            arg!(--signal <SIGNAL>)
                .required(false)
                .help("Signal track (.bw, .bigWig, .bedGraph or .bg) used with --beta"),
        )
        .arg(
            arg!(--config <CONFIG>)
                .required(false)
                .help("TOML file with sampler parameters; flags below override it"),
        )
        .arg(
            arg!(--report <REPORT>)
                .required(false)
                .help("Write a JSON run report (bin targets, draws and shortfalls) here"),
        )
        .arg(
            Arg::new("bin-width")
                .long("bin-width")
                .required(false)
                .help("Width of a GC bin, in (0, 1]"),
        )
        .arg(
            Arg::new("max-n-perc")
                .long("max-n-perc")
                .required(false)
                .help("Largest fraction of non-ACGT bases allowed in a candidate window"),
        )
        .arg(
            arg!(--beta <BETA>)
                .required(false)
                .help("Drop candidates with more signal than beta times the weakest peak"),
        )
        .arg(
            Arg::new("window-width")
                .long("window-width")
                .required(false)
                .help("Width of the window GC content and signal are measured over"),
        )
        .arg(
            arg!(--stride <STRIDE>)
                .required(false)
                .help("Step between candidate windows and width of the emitted negatives"),
        )
        .arg(
            Arg::new("chromosomes")
                .long("chromosomes")
                .required(false)
                .num_args(1..)
                .help("Only scan these chromosomes"),
        )
        .arg(
            Arg::new("exclusion-margin")
                .long("exclusion-margin")
                .required(false)
                .help("Bases added on both sides of each peak before it is excluded"),
        )
        .arg(
            Arg::new("use-summit")
                .long("use-summit")
                .action(ArgAction::SetTrue)
                .help("Center peak windows on the narrowPeak summit"),
        )
        .arg(
            arg!(--blacklist <BLACKLIST>)
                .required(false)
                .num_args(1..)
                .help("BED files of regions no negative may overlap"),
        )
        .arg(
            arg!(--threads <THREADS>)
                .required(false)
                .help("Number of worker threads (default: all cores)"),
        )
        .arg(
            arg!(--seed <SEED>)
                .required(false)
                .help("Seed of the random draws"),
        )
        .arg(
            arg!(--progress)
                .action(ArgAction::SetTrue)
                .help("Show a progress bar while scanning chromosomes"),
        )
}
