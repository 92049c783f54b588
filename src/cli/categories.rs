use crate::cli::view::format_taxonomy;
use crate::error::Result;
use crate::settings::DeductionConfig;

pub fn list(config: &DeductionConfig) -> Result<()> {
    println!("{}", format_taxonomy(config));
    Ok(())
}
