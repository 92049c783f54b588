use crate::fmt::money;
use crate::models::{AnalysisResult, ClassifiedTransaction, UncertainTransaction};

const RULE_WIDTH: usize = 80;

const NOTES: &[&str] = &[
    "This analysis is based on keyword matching and may not be 100% accurate",
    "Not all identified expenses may qualify for tax deductions",
    "Some deductions are only available in the old tax regime",
    "Please consult a tax professional for accurate advice",
];

const DISCLAIMER: &str = "This report is generated through automated analysis and keyword \
matching and is an approximation, not tax advice. Savings assume a flat marginal rate and \
apply only the first statutory section's cap per category. Not all identified expenses may \
qualify for tax deductions, and most deductions are only available under the old tax regime. \
Please consult a tax professional for accurate tax advice.";

fn heading(title: &str, underline: char) -> String {
    let rule: String = std::iter::repeat(underline).take(title.chars().count()).collect();
    format!("{title}\n{rule}\n")
}

fn sections(schemes: &[String]) -> String {
    if schemes.is_empty() {
        "none".to_string()
    } else {
        schemes.join(", ")
    }
}

/// Summary block: positive category totals, estimated savings and notes.
pub fn render_summary(result: &AnalysisResult) -> String {
    let cur = result.currency.as_str();
    let mut out = heading("Bank Statement Analysis Summary", '=');
    out.push('\n');

    out.push_str("Potentially Deductible Expenses by Category:\n");
    let positive: Vec<_> = result.categories.iter().filter(|c| c.total > 0.0).collect();
    if positive.is_empty() {
        out.push_str("- No potentially deductible expenses identified\n");
    }
    for cat in positive {
        out.push_str(&format!(
            "- {}: {} (Applicable Sections: {})\n",
            cat.name,
            money(cat.total, cur),
            sections(&cat.schemes)
        ));
    }

    out.push_str(&format!(
        "\nEstimated Potential Tax Savings: {}\n",
        money(result.potential_savings, cur)
    ));

    out.push_str("\nImportant Notes:\n");
    for (i, note) in NOTES.iter().enumerate() {
        out.push_str(&format!("{}. {note}\n", i + 1));
    }
    out
}

fn push_transaction(out: &mut String, idx: usize, txn: &ClassifiedTransaction, cur: &str) {
    let t = &txn.transaction;
    out.push_str(&format!("{idx}. Date: {}\n", t.date.format("%Y-%m-%d")));
    out.push_str(&format!("   Description: {}\n", t.description));
    out.push_str(&format!("   Amount: {}\n", money(t.amount, cur)));
    out.push_str(&format!(
        "   Matched Keywords: {}\n\n",
        txn.matched_keywords.join(", ")
    ));
}

fn push_uncertain(out: &mut String, idx: usize, txn: &UncertainTransaction, cur: &str) {
    let t = &txn.transaction;
    out.push_str(&format!("{idx}. Date: {}\n", t.date.format("%Y-%m-%d")));
    out.push_str(&format!("   Description: {}\n", t.description));
    out.push_str(&format!("   Amount: {}\n\n", money(t.amount, cur)));
}

/// Full deduction report. Pure: printing or saving it is up to the caller.
pub fn render_report(result: &AnalysisResult) -> String {
    let cur = result.currency.as_str();
    let mut out = heading("POTENTIAL TAX DEDUCTION REPORT", '=');
    out.push('\n');
    out.push_str(&result.summary);
    out.push_str("\n\n");

    out.push_str(&heading("DETAILED EXPENSE BREAKDOWN", '='));
    out.push('\n');
    if result.categorized_count() == 0 {
        out.push_str("No potentially deductible transactions were identified.\n\n");
    }
    for cat in result.categories.iter().filter(|c| !c.transactions.is_empty()) {
        out.push_str(&format!(
            "{} Expenses (Applicable Sections: {})\n",
            cat.name,
            sections(&cat.schemes)
        ));
        out.push_str(&"-".repeat(RULE_WIDTH));
        out.push('\n');

        let mut sorted: Vec<&ClassifiedTransaction> = cat.transactions.iter().collect();
        sorted.sort_by_key(|t| t.transaction.date);
        for (i, txn) in sorted.into_iter().enumerate() {
            push_transaction(&mut out, i + 1, txn, cur);
        }
        out.push_str(&format!("Total {} Expenses: {}\n\n", cat.name, money(cat.total, cur)));
    }

    if !result.uncertain.is_empty() {
        out.push_str(&heading("UNCERTAIN TRANSACTIONS", '='));
        out.push('\n');
        out.push_str(
            "The following transactions could not be categorized but may be eligible for deductions:\n\n",
        );
        let mut sorted: Vec<&UncertainTransaction> = result.uncertain.iter().collect();
        sorted.sort_by_key(|t| t.transaction.date);
        for (i, txn) in sorted.into_iter().enumerate() {
            push_uncertain(&mut out, i + 1, txn, cur);
        }
    }

    out.push_str(&heading("DISCLAIMER", '='));
    out.push_str(&textwrap::fill(DISCLAIMER, RULE_WIDTH));
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::analyze;
    use crate::models::CanonicalTransaction;
    use crate::settings::DeductionConfig;
    use chrono::NaiveDate;

    fn txn(day: u32, description: &str, amount: f64) -> CanonicalTransaction {
        CanonicalTransaction {
            date: NaiveDate::from_ymd_opt(2024, 4, day).unwrap(),
            description: description.to_string(),
            amount,
            is_debit: true,
            reference: None,
        }
    }

    fn sample() -> AnalysisResult {
        analyze(
            &[
                txn(20, "CITY HOSPITAL", 5000.0),
                txn(3, "DENTAL CLINIC", 1500.0),
                txn(10, "ABC TUITION FEES", 8000.0),
                txn(12, "RANDOM VENDOR 9999", 2000.0),
                txn(2, "ANOTHER VENDOR", 3000.0),
            ],
            &DeductionConfig::default(),
        )
    }

    fn pos(haystack: &str, needle: &str) -> usize {
        haystack
            .find(needle)
            .unwrap_or_else(|| panic!("missing {needle:?} in report"))
    }

    #[test]
    fn test_summary_lists_only_positive_categories() {
        let summary = sample().summary;
        assert!(summary.contains(
            "- Medical: \u{20b9}6,500.00 (Applicable Sections: 80D, 80DD, 80DDB, 80U)"
        ));
        assert!(summary.contains("- Education: \u{20b9}8,000.00 (Applicable Sections: 80E)"));
        assert!(!summary.contains("Housing"));
        assert!(summary.contains("Estimated Potential Tax Savings: \u{20b9}4,350.00"));
        assert!(summary.contains("4. Please consult a tax professional"));
    }

    #[test]
    fn test_summary_without_deductions() {
        let result = analyze(&[], &DeductionConfig::default());
        assert!(result
            .summary
            .contains("- No potentially deductible expenses identified"));
        assert!(result.summary.contains("\u{20b9}0.00"));
    }

    #[test]
    fn test_report_section_order() {
        let report = render_report(&sample());
        let header = pos(&report, "POTENTIAL TAX DEDUCTION REPORT");
        let summary = pos(&report, "Bank Statement Analysis Summary");
        let detail = pos(&report, "DETAILED EXPENSE BREAKDOWN");
        let medical = pos(&report, "Medical Expenses (Applicable Sections");
        let education = pos(&report, "Education Expenses (Applicable Sections");
        let uncertain = pos(&report, "UNCERTAIN TRANSACTIONS");
        let disclaimer = pos(&report, "DISCLAIMER");
        assert!(header < summary);
        assert!(summary < detail);
        assert!(detail < medical);
        assert!(medical < education);
        assert!(education < uncertain);
        assert!(uncertain < disclaimer);
    }

    #[test]
    fn test_report_sorts_each_group_by_date() {
        let report = render_report(&sample());
        assert!(pos(&report, "1. Date: 2024-04-03") < pos(&report, "2. Date: 2024-04-20"));
        assert!(report.contains("   Description: DENTAL CLINIC\n"));
        assert!(report.contains("   Matched Keywords: clinic, dental\n"));
        assert!(report.contains("Total Medical Expenses: \u{20b9}6,500.00"));

        let uncertain = &report[pos(&report, "UNCERTAIN TRANSACTIONS")..];
        assert!(pos(uncertain, "ANOTHER VENDOR") < pos(uncertain, "RANDOM VENDOR 9999"));
    }

    #[test]
    fn test_report_omits_empty_sections() {
        let result = analyze(&[txn(1, "HOSPITAL", 500.0)], &DeductionConfig::default());
        let report = render_report(&result);
        assert!(!report.contains("UNCERTAIN TRANSACTIONS"));
        assert!(!report.contains("Education Expenses"));
        assert!(report.contains("DISCLAIMER"));
    }

    #[test]
    fn test_report_for_empty_statement() {
        let result = analyze(&[], &DeductionConfig::default());
        let report = render_report(&result);
        assert!(report.contains("No potentially deductible transactions were identified."));
        assert!(report.contains("not tax advice"));
    }

    #[test]
    fn test_report_is_pure() {
        let result = sample();
        assert_eq!(render_report(&result), render_report(&result));
    }

    #[test]
    fn test_disclaimer_is_wrapped() {
        let report = render_report(&sample());
        let tail = &report[pos(&report, "DISCLAIMER")..];
        assert!(tail.lines().all(|l| l.chars().count() <= RULE_WIDTH));
    }
}
