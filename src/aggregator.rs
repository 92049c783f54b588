use crate::categorizer::{classify, Classification};
use crate::models::{
    AnalysisResult, CanonicalTransaction, CategoryTotal, ClassifiedTransaction, StatementOverview,
};
use crate::report::render_summary;
use crate::settings::DeductionConfig;

// ---------------------------------------------------------------------------
// Deductible amounts
// ---------------------------------------------------------------------------

/// Portion of a category total that counts as deductible. Only the first
/// scheme code's cap is consulted, so a category spanning several
/// independently-capped sections is approximated by its first one.
pub fn deductible_amount(total: f64, schemes: &[String], config: &DeductionConfig) -> f64 {
    match schemes.first().and_then(|code| config.scheme_cap(code)) {
        Some(cap) => total.min(cap),
        None => total,
    }
}

pub fn aggregate(
    buckets: Vec<(String, Vec<ClassifiedTransaction>)>,
    config: &DeductionConfig,
) -> Vec<CategoryTotal> {
    buckets
        .into_iter()
        .map(|(name, transactions)| {
            let schemes = config
                .categories
                .iter()
                .find(|c| c.name == name)
                .map(|c| c.schemes.clone())
                .unwrap_or_default();
            let total: f64 = transactions.iter().map(|t| t.transaction.amount).sum();
            let (deductible, savings) = if total > 0.0 {
                let deductible = deductible_amount(total, &schemes, config);
                (deductible, deductible * config.marginal_rate)
            } else {
                (0.0, 0.0)
            };
            CategoryTotal {
                name,
                schemes,
                total,
                deductible,
                savings,
                transactions,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// analyze
// ---------------------------------------------------------------------------

/// Run classification and aggregation over one statement. Pure: the same
/// transactions and configuration always produce an equal result.
pub fn analyze(transactions: &[CanonicalTransaction], config: &DeductionConfig) -> AnalysisResult {
    let Classification {
        categories,
        uncertain,
    } = classify(transactions, config);
    let categories = aggregate(categories, config);
    let potential_savings: f64 = categories
        .iter()
        .filter(|c| c.total > 0.0)
        .map(|c| c.savings)
        .sum();

    tracing::info!(
        transactions = transactions.len(),
        potential_savings,
        uncertain = uncertain.len(),
        "analysis complete"
    );

    let mut result = AnalysisResult {
        categories,
        potential_savings,
        uncertain,
        summary: String::new(),
        currency: config.currency_symbol.clone(),
    };
    result.summary = render_summary(&result);
    result
}

// ---------------------------------------------------------------------------
// Statement overview
// ---------------------------------------------------------------------------

pub fn overview(transactions: &[CanonicalTransaction]) -> StatementOverview {
    let debit_count = transactions.iter().filter(|t| t.is_debit).count();
    StatementOverview {
        total_transactions: transactions.len(),
        debit_count,
        credit_count: transactions.len() - debit_count,
        first_date: transactions.iter().map(|t| t.date).min(),
        last_date: transactions.iter().map(|t| t.date).max(),
    }
}
