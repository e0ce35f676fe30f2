mod gc;
mod negatives;

use anyhow::Result;
use clap::Command;

pub mod consts {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
    pub const BIN_NAME: &str = "gcmatch";
    pub const DEFAULT_LOG_FILTER: &str = "info";
}

fn build_parser() -> Command {
    Command::new(consts::BIN_NAME)
        .bin_name(consts::BIN_NAME)
        .version(consts::VERSION)
        .about("Sample background loci whose GC content matches a set of peaks.")
        .subcommand_required(true)
        .subcommand(negatives::cli::create_negatives_cli())
        .subcommand(gc::cli::create_gc_cli())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(consts::DEFAULT_LOG_FILTER),
    )
    .init();

    let app = build_parser();
    let matches = app.get_matches();

    match matches.subcommand() {
        //
        // NEGATIVES
        //
        Some((negatives::cli::NEGATIVES_CMD, matches)) => {
            negatives::handlers::run_negatives(matches)?;
        }

        //
        // GC
        //
        Some((gc::cli::GC_CMD, matches)) => {
            gc::handlers::run_gc(matches)?;
        }

        _ => unreachable!("Subcommand not found"),
    };

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::*;

    #[rstest]
    fn test_parser_is_valid() {
        build_parser().debug_assert();
    }

    #[rstest]
    fn test_subcommand_required() {
        assert!(build_parser().try_get_matches_from(["gcmatch"]).is_err());
    }
}
