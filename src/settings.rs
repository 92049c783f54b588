use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TaxlensError};

/// A bucket of similar expenses and the statutory sections it maps to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeductionCategory {
    pub name: String,
    /// Case-insensitive substrings, in match order.
    pub keywords: Vec<String>,
    /// Scheme codes; only the first one's cap is applied.
    pub schemes: Vec<String>,
}

/// Everything the pipeline treats as configuration. Built once at startup
/// and passed by reference; nothing mutates it afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeductionConfig {
    /// Declaration order is match priority.
    pub categories: Vec<DeductionCategory>,
    /// Annual cap per scheme code. `null` and unregistered codes are uncapped.
    pub scheme_limits: BTreeMap<String, Option<f64>>,
    pub exclude_keywords: Vec<String>,
    pub materiality_threshold: f64,
    /// Flat rate applied to deductible amounts. An approximation of the
    /// highest bracket, not a computed liability.
    pub marginal_rate: f64,
    pub currency_symbol: String,
}

fn category(name: &str, keywords: &[&str], schemes: &[&str]) -> DeductionCategory {
    DeductionCategory {
        name: name.to_string(),
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
        schemes: schemes.iter().map(|s| s.to_string()).collect(),
    }
}

impl Default for DeductionConfig {
    fn default() -> Self {
        let categories = vec![
            category(
                "Medical",
                &[
                    "hospital", "clinic", "doctor", "pharmacy", "medical", "health", "medicine",
                    "healthcare", "dental",
                ],
                &["80D", "80DD", "80DDB", "80U"],
            ),
            category(
                "Education",
                &[
                    "school", "college", "university", "tuition", "education", "course",
                    "training", "books", "stationery",
                ],
                &["80E"],
            ),
            category(
                "Housing",
                &[
                    "rent", "housing", "accommodation", "property tax", "maintenance", "repair",
                    "home loan", "mortgage",
                ],
                &["80EE", "80EEA", "80G", "24(b)"],
            ),
            category(
                "Insurance",
                &[
                    "insurance", "premium", "policy", "life", "health", "medical insurance",
                    "vehicle insurance",
                ],
                &["80C", "80D"],
            ),
            category(
                "Investments",
                &[
                    "mutual fund", "fixed deposit", "FD", "PPF", "NPS", "ELSS", "shares", "stocks",
                    "investment",
                ],
                &["80C", "80CCC", "80CCD"],
            ),
            category(
                "Charity",
                &["donation", "charitable", "charity", "relief fund", "donations", "ngo"],
                &["80G"],
            ),
            category(
                "Business Expenses",
                &[
                    "office", "supplies", "utilities", "internet", "phone", "mobile", "broadband",
                    "business", "professional",
                ],
                &["Business Income Deductions"],
            ),
        ];

        let scheme_limits = BTreeMap::from([
            ("80C".to_string(), Some(150_000.0)),
            ("80D".to_string(), Some(100_000.0)),
            ("80E".to_string(), None),
            ("80G".to_string(), None),
            ("24(b)".to_string(), Some(200_000.0)),
        ]);

        let exclude_keywords = [
            "salary",
            "income",
            "dividend",
            "interest received",
            "cash deposit",
            "atm",
            "transfer",
        ]
        .iter()
        .map(|k| k.to_string())
        .collect();

        Self {
            categories,
            scheme_limits,
            exclude_keywords,
            materiality_threshold: 1000.0,
            marginal_rate: 0.30,
            currency_symbol: "\u{20b9}".to_string(),
        }
    }
}

impl DeductionConfig {
    /// Registered cap for a scheme code; `None` means uncapped.
    pub fn scheme_cap(&self, code: &str) -> Option<f64> {
        self.scheme_limits.get(code).copied().flatten()
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.marginal_rate) {
            return Err(TaxlensError::Settings(format!(
                "marginal_rate must be between 0 and 1, got {}",
                self.marginal_rate
            )));
        }
        if !self.materiality_threshold.is_finite() || self.materiality_threshold < 0.0 {
            return Err(TaxlensError::Settings(format!(
                "materiality_threshold must be a non-negative number, got {}",
                self.materiality_threshold
            )));
        }
        for (code, cap) in &self.scheme_limits {
            if let Some(cap) = cap {
                if !cap.is_finite() || *cap < 0.0 {
                    return Err(TaxlensError::Settings(format!(
                        "cap for scheme {code} must be non-negative, got {cap}"
                    )));
                }
            }
        }
        if self.exclude_keywords.iter().any(|k| k.trim().is_empty()) {
            return Err(TaxlensError::Settings(
                "exclude_keywords must not contain empty entries".to_string(),
            ));
        }
        for (i, cat) in self.categories.iter().enumerate() {
            if cat.name.trim().is_empty() {
                return Err(TaxlensError::Settings(format!("category #{} has no name", i + 1)));
            }
            if cat.keywords.iter().any(|k| k.trim().is_empty()) {
                return Err(TaxlensError::Settings(format!(
                    "category {} has an empty keyword",
                    cat.name
                )));
            }
            if self.categories[..i].iter().any(|c| c.name == cat.name) {
                return Err(TaxlensError::Settings(format!(
                    "category {} is declared twice",
                    cat.name
                )));
            }
        }
        Ok(())
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("taxlens")
}

pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

fn read_config(path: &Path) -> Result<DeductionConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| TaxlensError::Settings(format!("cannot read {}: {e}", path.display())))?;
    let config: DeductionConfig = serde_json::from_str(&content)
        .map_err(|e| TaxlensError::Settings(format!("invalid {}: {e}", path.display())))?;
    config.validate()?;
    Ok(config)
}

/// Load configuration. An explicit path must exist; otherwise the user
/// config file is used when present and the built-in tables when not.
pub fn load_config(explicit: Option<&Path>) -> Result<DeductionConfig> {
    if let Some(path) = explicit {
        tracing::debug!(path = %path.display(), "loading configuration");
        return read_config(path);
    }
    let path = config_path();
    if path.exists() {
        tracing::debug!(path = %path.display(), "loading configuration");
        read_config(&path)
    } else {
        tracing::debug!("no configuration file, using built-in tables");
        Ok(DeductionConfig::default())
    }
}

pub fn save_config(config: &DeductionConfig, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(config)
        .map_err(|e| TaxlensError::Settings(e.to_string()))?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_category_order() {
        let config = DeductionConfig::default();
        let names: Vec<&str> = config.categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Medical",
                "Education",
                "Housing",
                "Insurance",
                "Investments",
                "Charity",
                "Business Expenses"
            ]
        );
        assert_eq!(config.materiality_threshold, 1000.0);
        assert_eq!(config.marginal_rate, 0.30);
    }

    #[test]
    fn test_scheme_cap_lookup() {
        let config = DeductionConfig::default();
        assert_eq!(config.scheme_cap("80C"), Some(150_000.0));
        assert_eq!(config.scheme_cap("80D"), Some(100_000.0));
        assert_eq!(config.scheme_cap("80E"), None);
        assert_eq!(config.scheme_cap("80EE"), None);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let mut config = DeductionConfig::default();
        config.marginal_rate = 0.2;
        config.currency_symbol = "$".to_string();
        save_config(&config, &path).unwrap();
        let loaded = load_config(Some(&path)).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_merges_with_defaults() {
        let json = r#"{"marginal_rate": 0.2}"#;
        let config: DeductionConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.marginal_rate, 0.2);
        assert_eq!(config.categories.len(), 7);
        assert_eq!(config.scheme_cap("80C"), Some(150_000.0));
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(Some(&dir.path().join("missing.json"))).unwrap_err();
        assert!(matches!(err, TaxlensError::Settings(_)));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = DeductionConfig::default();
        config.marginal_rate = 1.5;
        assert!(config.validate().is_err());

        let mut config = DeductionConfig::default();
        config.materiality_threshold = -1.0;
        assert!(config.validate().is_err());

        let mut config = DeductionConfig::default();
        config.scheme_limits.insert("80X".to_string(), Some(-5.0));
        assert!(config.validate().is_err());

        let mut config = DeductionConfig::default();
        let dup = config.categories[0].clone();
        config.categories.push(dup);
        assert!(config.validate().is_err());

        assert!(DeductionConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_keywords() {
        let mut config = DeductionConfig::default();
        config.categories[1].keywords.push("  ".to_string());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Education"));

        let mut config = DeductionConfig::default();
        config.exclude_keywords.push(String::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_keyword_in_file_is_rejected_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"exclude_keywords": ["salary", ""]}"#).unwrap();
        let err = load_config(Some(&path)).unwrap_err();
        assert!(matches!(err, TaxlensError::Settings(_)));
    }
}
