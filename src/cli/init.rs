use std::path::{Path, PathBuf};

use crate::error::{Result, TaxlensError};
use crate::settings::{config_path, save_config, DeductionConfig};

pub fn run(target: Option<&Path>, force: bool) -> Result<()> {
    let path: PathBuf = target.map(Path::to_path_buf).unwrap_or_else(config_path);
    if path.exists() && !force {
        return Err(TaxlensError::Settings(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }
    save_config(&DeductionConfig::default(), &path)?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}
