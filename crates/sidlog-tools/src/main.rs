use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod dump;
use dump::{
    events as dump_events, info as dump_info, read_dump, test_roundtrip as dump_test_roundtrip,
};

/// sidlog command line tools
#[derive(Parser)]
#[command(
    name = "sidlog",
    version = env!("CARGO_PKG_VERSION"),
    about = env!("CARGO_PKG_DESCRIPTION"),
    long_about = None
)]
struct Cli {
    /// Increase log output (-v debug, -vv trace). RUST_LOG overrides it.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show header and per-chip summary of a dump (accepts .gz; use '-' for stdin)
    Info {
        /// Input file to read (use '-' for stdin)
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Clock frequency in Hz used to convert cycles to seconds
        #[arg(long, value_name = "HZ")]
        clock: Option<f32>,
    },
    /// List every logged access with its absolute clock
    Events {
        /// Input file to read (use '-' for stdin)
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Only show accesses of this chip (0-7)
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..8))]
        chip: Option<u8>,
        /// Stop after this many accesses
        #[arg(long, value_name = "N")]
        limit: Option<usize>,
    },
    /// Run parse -> serialize roundtrip test and compare the text
    Test {
        /// Input file to read (use '-' for stdin)
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Info { file, clock } => {
            let text = read_dump(&file)?;
            dump_info(&file, &text, clock)?;
        }
        Commands::Events { file, chip, limit } => {
            let text = read_dump(&file)?;
            dump_events(&file, &text, chip, limit)?;
        }
        Commands::Test { file } => {
            let text = read_dump(&file)?;
            dump_test_roundtrip(&file, &text)?;
        }
    }

    Ok(())
}
