use clap::Parser;
use dirbackup::commands::{self, Cli};
use dirbackup::sysexits;
use std::io::{self, IsTerminal};
use std::process;
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Entry point for the dirbackup CLI application.
/// Parses command-line arguments and dispatches the backup.
fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    let code = match commands::execute(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{e:#}");
            sysexits::EX_CONFIG
        }
    };
    process::exit(code);
}

/// Warnings and errors go to stderr, everything else to stdout.
/// `RUST_LOG` takes precedence over `-v`/`-q`.
fn init_logging(cli: &Cli) {
    let default_level = if cli.quiet {
        "warn"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let writer = io::stderr.with_max_level(Level::WARN).or_else(io::stdout);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_target(false)
        .without_time()
        .with_ansi(io::stdout().is_terminal())
        .init();
}
