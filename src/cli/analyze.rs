use crate::aggregator::{analyze, overview};
use crate::cli::load_statement;
use crate::cli::view::{format_categories, format_overview, format_uncertain};
use crate::error::Result;
use crate::fmt::money;
use crate::settings::DeductionConfig;

pub fn run(file: &str, config: &DeductionConfig) -> Result<()> {
    let (raw, transactions) = load_statement(file)?;
    let result = analyze(&transactions, config);

    println!("{}", format_overview(&raw, &overview(&transactions)));
    println!();
    println!("{}", format_categories(&result));
    println!(
        "\nEstimated potential tax savings: {}",
        money(result.potential_savings, &result.currency)
    );
    println!();
    println!("{}", format_uncertain(&result));
    Ok(())
}
