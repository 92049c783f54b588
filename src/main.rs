mod aggregator;
mod categorizer;
mod cli;
mod error;
mod fmt;
mod loader;
mod models;
mod normalizer;
mod report;
mod settings;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{prelude::*, EnvFilter};

use cli::{Cli, Commands};

fn init_logging(verbose: bool) {
    // Priority: RUST_LOG env var > --verbose flag > default (warn)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    // Reports go to stdout, so logs stay on stderr.
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .compact()
                .with_writer(std::io::stderr),
        )
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config_file = cli.config.as_deref();
    let load = || settings::load_config(config_file).context("loading configuration");

    match cli.command {
        Commands::Analyze { file } => cli::analyze::run(&file, &load()?)
            .with_context(|| format!("analyzing {file}"))?,
        Commands::Report { file, output } => {
            cli::report::run(&file, output.as_deref(), &load()?)
                .with_context(|| format!("reporting on {file}"))?
        }
        Commands::Preview { file, limit } => cli::preview::run(&file, limit, &load()?)
            .with_context(|| format!("previewing {file}"))?,
        Commands::Categories => cli::categories::list(&load()?)?,
        // Runs without loading the current configuration file.
        Commands::InitConfig { force } => cli::init::run(config_file, force)?,
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
