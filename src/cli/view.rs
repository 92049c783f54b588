use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::categorizer::classify_one;
use crate::fmt::money;
use crate::models::{AnalysisResult, CanonicalTransaction, RawTable, StatementOverview};
use crate::settings::DeductionConfig;

// ---------------------------------------------------------------------------
// Pure formatting functions (data → String) for terminal output
// ---------------------------------------------------------------------------

pub fn format_overview(raw: &RawTable, ov: &StatementOverview) -> String {
    let range = match (ov.first_date, ov.last_date) {
        (Some(first), Some(last)) => format!("{first} to {last}"),
        _ => "n/a".to_string(),
    };
    let fingerprint = if raw.checksum.is_empty() {
        "n/a".to_string()
    } else {
        raw.checksum.chars().take(12).collect()
    };

    let mut table = Table::new();
    table.set_header(vec!["Item", "Value"]);
    table.add_row(vec![Cell::new("Source"), Cell::new(&raw.source)]);
    table.add_row(vec![Cell::new("SHA-256"), Cell::new(fingerprint)]);
    table.add_row(vec![Cell::new("Transactions"), Cell::new(ov.total_transactions)]);
    table.add_row(vec![Cell::new("Debits (expenses)"), Cell::new(ov.debit_count)]);
    table.add_row(vec![Cell::new("Credits"), Cell::new(ov.credit_count)]);
    table.add_row(vec![Cell::new("Date range"), Cell::new(range)]);
    format!("Statement Overview\n{table}")
}

pub fn format_categories(result: &AnalysisResult) -> String {
    let cur = result.currency.as_str();
    let mut positive: Vec<_> = result.categories.iter().filter(|c| c.total > 0.0).collect();
    if positive.is_empty() {
        return "No potentially deductible expenses identified.".to_string();
    }
    // Largest first, ties kept in configuration order.
    positive.sort_by(|a, b| b.total.total_cmp(&a.total));

    let mut table = Table::new();
    table.set_header(vec!["Category", "Count", "Total", "Deductible", "Est. Savings", "Sections"]);
    for cat in positive {
        let deductible = if cat.deductible < cat.total {
            format!("{} (capped)", money(cat.deductible, cur))
        } else {
            money(cat.deductible, cur)
        };
        table.add_row(vec![
            Cell::new(&cat.name),
            Cell::new(cat.transactions.len()),
            Cell::new(money(cat.total, cur)),
            Cell::new(deductible),
            Cell::new(money(cat.savings, cur)),
            Cell::new(cat.schemes.join(", ")),
        ]);
    }
    table.add_row(vec![
        Cell::new("Estimated Savings".green().bold()),
        Cell::new(""),
        Cell::new(""),
        Cell::new(""),
        Cell::new(money(result.potential_savings, cur)),
        Cell::new(""),
    ]);
    format!("Potential Deductions\n{table}")
}

pub fn format_uncertain(result: &AnalysisResult) -> String {
    if result.uncertain.is_empty() {
        return "No uncertain transactions.".to_string();
    }
    let mut rows: Vec<&CanonicalTransaction> =
        result.uncertain.iter().map(|u| &u.transaction).collect();
    rows.sort_by_key(|t| t.date);

    let mut table = Table::new();
    table.set_header(vec!["Date", "Description", "Amount", "Reference"]);
    for t in rows {
        table.add_row(vec![
            Cell::new(t.date),
            Cell::new(&t.description),
            Cell::new(money(t.amount, &result.currency)),
            Cell::new(t.reference.as_deref().unwrap_or("")),
        ]);
    }
    format!(
        "{}\n{table}",
        format!("Uncertain Transactions ({}): review manually", result.uncertain.len())
            .yellow()
    )
}

pub fn format_preview(
    transactions: &[CanonicalTransaction],
    limit: usize,
    config: &DeductionConfig,
) -> String {
    if transactions.is_empty() {
        return "No transactions could be read from this file.".to_string();
    }
    let mut table = Table::new();
    table.set_header(vec!["Date", "Description", "Amount", "Dr/Cr", "Reference", "Outcome"]);
    for t in transactions.iter().take(limit) {
        let side = if t.is_debit {
            "DR".red().to_string()
        } else {
            "CR".green().to_string()
        };
        table.add_row(vec![
            Cell::new(t.date),
            Cell::new(&t.description),
            Cell::new(money(t.amount, &config.currency_symbol)),
            Cell::new(side),
            Cell::new(t.reference.as_deref().unwrap_or("")),
            Cell::new(classify_one(t, config).label()),
        ]);
    }
    format!(
        "Sample Transactions ({} of {})\n{table}",
        limit.min(transactions.len()),
        transactions.len()
    )
}

pub fn format_taxonomy(config: &DeductionConfig) -> String {
    let cur = config.currency_symbol.as_str();
    let mut table = Table::new();
    table.set_header(vec!["Category", "Sections", "Applied Cap", "Keywords"]);
    for cat in &config.categories {
        let cap = match cat.schemes.first().and_then(|code| config.scheme_cap(code)) {
            Some(cap) => money(cap, cur),
            None => "uncapped".to_string(),
        };
        table.add_row(vec![
            Cell::new(&cat.name),
            Cell::new(cat.schemes.join(", ")),
            Cell::new(cap),
            Cell::new(cat.keywords.join(", ")),
        ]);
    }
    format!(
        "Deduction Categories (first match wins, in this order)\n{table}\n\n\
         Excluded: {}\nUncertain above: {}\nMarginal rate: {:.0}%",
        config.exclude_keywords.join(", "),
        money(config.materiality_threshold, cur),
        config.marginal_rate * 100.0
    )
}
