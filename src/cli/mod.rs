pub mod analyze;
pub mod categories;
pub mod init;
pub mod preview;
pub mod report;
pub mod view;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::error::Result;
use crate::loader::load_table;
use crate::models::{CanonicalTransaction, RawTable};
use crate::normalizer::normalize;

/// Load and normalize one statement file.
pub(crate) fn load_statement(file: &str) -> Result<(RawTable, Vec<CanonicalTransaction>)> {
    let raw = load_table(Path::new(file))?;
    let transactions = normalize(&raw)?;
    Ok((raw, transactions))
}

#[derive(Parser)]
#[command(
    name = "taxlens",
    version,
    about = "Find potential tax deductions in bank statement exports."
)]
pub struct Cli {
    /// Configuration file (default: ~/.config/taxlens/config.json)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log debug details to stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a statement and show deductions by category.
    Analyze {
        /// Path to a CSV or spreadsheet export
        file: String,
    },
    /// Write the detailed deduction report.
    Report {
        /// Path to a CSV or spreadsheet export
        file: String,
        /// Write the report here instead of stdout
        #[arg(long, short)]
        output: Option<String>,
    },
    /// Show how a statement was read and how each transaction is classified.
    Preview {
        /// Path to a CSV or spreadsheet export
        file: String,
        /// Number of transactions to show
        #[arg(long, default_value = "5")]
        limit: usize,
    },
    /// List deduction categories, keywords and scheme caps.
    Categories,
    /// Write the default configuration file for editing.
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
