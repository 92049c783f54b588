use std::path::Path;

use crate::aggregator::analyze;
use crate::cli::load_statement;
use crate::error::{Result, TaxlensError};
use crate::report::render_report;
use crate::settings::DeductionConfig;

pub fn run(file: &str, output: Option<&str>, config: &DeductionConfig) -> Result<()> {
    let (_, transactions) = load_statement(file)?;
    let report = render_report(&analyze(&transactions, config));

    match output {
        Some(path) => {
            let path = Path::new(path);
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                std::fs::create_dir_all(dir).map_err(|source| TaxlensError::Write {
                    path: dir.display().to_string(),
                    source,
                })?;
            }
            std::fs::write(path, &report).map_err(|source| TaxlensError::Write {
                path: path.display().to_string(),
                source,
            })?;
            tracing::info!(path = %path.display(), bytes = report.len(), "report written");
            println!("Report written to {}", path.display());
        }
        None => print!("{report}"),
    }
    Ok(())
}
