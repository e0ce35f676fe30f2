use clap::{Arg, ArgAction, Command, arg};

pub const GC_CMD: &str = "gc";

pub fn create_gc_cli() -> Command {
    Command::new(GC_CMD)
        .about("Print the GC fraction of the window around each peak.")
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
            Arg::new("window-width")
                .long("window-width")
                .required(false)
                .default_value("2114")
                .help("Width of the window around each peak"),
        )
        .arg(
            Arg::new("use-summit")
                .long("use-summit")
                .action(ArgAction::SetTrue)
                .help("Center windows on the narrowPeak summit"),
        )
        .arg(
            arg!(--output <OUTPUT>)
                .required(false)
                .help("Output file (default: stdout)"),
        )
}
