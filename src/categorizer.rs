use crate::models::{CanonicalTransaction, ClassifiedTransaction, UncertainTransaction};
use crate::settings::{DeductionCategory, DeductionConfig};

/// Plain substring test. An empty keyword matches everything, which is why
/// `DeductionConfig::validate` rejects them.
fn contains_keyword(desc_lower: &str, keyword: &str) -> bool {
    desc_lower.contains(&keyword.to_lowercase())
}

/// What happened to a single transaction.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict<'a> {
    /// Credits never take part in deduction analysis.
    Credit,
    /// Hit the exclude list (salary, transfers, ...).
    Excluded,
    Categorized {
        category: &'a DeductionCategory,
        matched_keywords: Vec<String>,
    },
    /// No category and above the materiality threshold.
    Uncertain,
    /// No category and too small to flag.
    Immaterial,
}

impl Verdict<'_> {
    pub fn label(&self) -> String {
        match self {
            Self::Credit => "credit".to_string(),
            Self::Excluded => "excluded".to_string(),
            Self::Categorized { category, .. } => category.name.clone(),
            Self::Uncertain => "uncertain".to_string(),
            Self::Immaterial => "immaterial".to_string(),
        }
    }
}

/// Classify one transaction. Precedence is fixed: credit, then the exclude
/// list, then the first category in declaration order with a keyword hit,
/// then the materiality threshold.
pub fn classify_one<'a>(txn: &CanonicalTransaction, config: &'a DeductionConfig) -> Verdict<'a> {
    if !txn.is_debit {
        return Verdict::Credit;
    }
    let desc = txn.description.to_lowercase();
    if config
        .exclude_keywords
        .iter()
        .any(|kw| contains_keyword(&desc, kw))
    {
        return Verdict::Excluded;
    }
    for category in &config.categories {
        let matched_keywords: Vec<String> = category
            .keywords
            .iter()
            .filter(|kw| contains_keyword(&desc, kw))
            .cloned()
            .collect();
        if !matched_keywords.is_empty() {
            return Verdict::Categorized {
                category,
                matched_keywords,
            };
        }
    }
    if txn.amount > config.materiality_threshold {
        Verdict::Uncertain
    } else {
        Verdict::Immaterial
    }
}

pub struct Classification {
    /// One bucket per configured category, in configuration order.
    pub categories: Vec<(String, Vec<ClassifiedTransaction>)>,
    pub uncertain: Vec<UncertainTransaction>,
}

pub fn classify(transactions: &[CanonicalTransaction], config: &DeductionConfig) -> Classification {
    let mut categories: Vec<(String, Vec<ClassifiedTransaction>)> = config
        .categories
        .iter()
        .map(|c| (c.name.clone(), Vec::new()))
        .collect();
    let mut uncertain = Vec::new();
    let (mut excluded, mut immaterial) = (0usize, 0usize);

    for txn in transactions {
        match classify_one(txn, config) {
            Verdict::Credit => {}
            Verdict::Excluded => excluded += 1,
            Verdict::Immaterial => immaterial += 1,
            Verdict::Uncertain => uncertain.push(UncertainTransaction {
                transaction: txn.clone(),
            }),
            Verdict::Categorized {
                category,
                matched_keywords,
            } => {
                // Category names are unique (validated), so the first bucket is it.
                if let Some((_, bucket)) = categories.iter_mut().find(|(n, _)| *n == category.name) {
                    bucket.push(ClassifiedTransaction {
                        transaction: txn.clone(),
                        category: category.name.clone(),
                        matched_keywords,
                    });
                }
            }
        }
    }

    tracing::debug!(
        categorized = categories.iter().map(|(_, b)| b.len()).sum::<usize>(),
        uncertain = uncertain.len(),
        excluded,
        immaterial,
        "classified transactions"
    );

    Classification {
        categories,
        uncertain,
    }
}
