use crate::aggregator::overview;
use crate::cli::load_statement;
use crate::cli::view::{format_overview, format_preview};
use crate::error::Result;
use crate::settings::DeductionConfig;

pub fn run(file: &str, limit: usize, config: &DeductionConfig) -> Result<()> {
    let (raw, transactions) = load_statement(file)?;
    println!("{}", format_overview(&raw, &overview(&transactions)));
    println!();
    println!("{}", format_preview(&transactions, limit, config));
    Ok(())
}
