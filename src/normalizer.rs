use std::sync::LazyLock;

use chrono::{Days, NaiveDate, NaiveDateTime};
use regex::Regex;

use crate::error::{Result, TaxlensError};
use crate::models::{CanonicalTransaction, Cell, RawTable};

/// How far down the file to look for the header row. Bank exports put a
/// letterhead and account details above the table, rarely more than a
/// dozen lines.
const HEADER_SCAN_ROWS: usize = 20;

/// Labels of the classic Indian retail-bank export. A row carrying all of
/// them (case-sensitive) is taken as the header.
const EXPECTED_HEADERS: &[&str] = &[
    "Date",
    "Narration",
    "Chq./Ref.No.",
    "Value Dt",
    "Withdrawal Amt.",
    "Deposit Amt.",
    "Closing Balance",
];

const DATE_COLUMNS: &[&str] = &["date", "txn date", "transaction date", "value dt"];
const DESCRIPTION_COLUMNS: &[&str] = &["narration", "description", "particulars", "details"];
const WITHDRAWAL_COLUMNS: &[&str] = &["withdrawal amt.", "withdrawal", "debit", "dr", "debit amount"];
const DEPOSIT_COLUMNS: &[&str] = &["deposit amt.", "deposit", "credit", "cr", "credit amount"];
const REFERENCE_COLUMNS: &[&str] = &["chq./ref.no.", "ref no", "reference", "cheque no"];
const INDICATOR_HINTS: &[&str] = &["type", "indicator", "dr/cr"];
const DEBIT_MARKERS: &[&str] = &["dr", "debit", "withdrawal", "-"];

// Day-first comes first: DD/MM/YYYY is the dominant convention in the
// exports this targets. Two-digit-year variants precede the four-digit
// ones because `%Y` would happily read "24" as the year 24.
const DAY_FIRST_FORMATS: &[&str] = &[
    "%d/%m/%y", "%d/%m/%Y", "%d-%m-%y", "%d-%m-%Y", "%d.%m.%y", "%d.%m.%Y", "%d-%b-%y", "%d-%b-%Y",
    "%d %b %y", "%d %b %Y", "%d %B %Y",
];
const ISO_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];
const MONTH_FIRST_FORMATS: &[&str] = &["%m/%d/%Y"];
const TIME_SUFFIXES: &[&str] = &[" %H:%M:%S", " %H:%M", "T%H:%M:%S", "T%H:%M:%S%.f"];

/// Every date layout above followed by a time of day, in the same order.
static DATETIME_FORMATS: LazyLock<Vec<String>> = LazyLock::new(|| {
    DAY_FIRST_FORMATS
        .iter()
        .chain(ISO_FORMATS)
        .chain(MONTH_FIRST_FORMATS)
        .flat_map(|date| TIME_SUFFIXES.iter().map(move |time| format!("{date}{time}")))
        .collect()
});

static CURRENCY_NOISE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("(?i)inr|rs\\.?|[\u{20b9}$\u{20ac}\u{a3},\\s]").expect("valid currency regex")
});

static EMPTY: Cell = Cell::Empty;

// ---------------------------------------------------------------------------
// Cell helpers
// ---------------------------------------------------------------------------

/// Parse a formatted number: thousands separators, currency markers and
/// accounting-style `(x)` negatives are accepted.
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned = CURRENCY_NOISE.replace_all(raw.trim(), "");
    let (body, negate) = match cleaned.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        Some(inner) => (inner, true),
        None => (&*cleaned, false),
    };
    let value: f64 = body.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(if negate { -value } else { value })
}

/// Amount from free text; anything unreadable counts as zero.
pub fn parse_amount(raw: &str) -> f64 {
    parse_number(raw).unwrap_or(0.0)
}

fn cell_amount(cell: &Cell) -> f64 {
    match cell {
        Cell::Number(n) if n.is_finite() => *n,
        Cell::Text(s) => parse_amount(s),
        _ => 0.0,
    }
}

/// Parse a date, trying day-first layouts before anything else.
pub fn parse_date_dayfirst(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    DAY_FIRST_FORMATS
        .iter()
        .chain(ISO_FORMATS)
        .chain(MONTH_FIRST_FORMATS)
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|dt| dt.date())
        })
}

pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    // Excel epoch is 1899-12-30 (accounting for the 1900 leap year bug);
    // 2958465 is 9999-12-31, the last date Excel can show.
    if !serial.is_finite() || !(1.0..=2_958_465.0).contains(&serial) {
        return None;
    }
    NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_days(Days::new(serial.floor() as u64))
}

fn cell_date(cell: &Cell) -> Option<NaiveDate> {
    match cell {
        Cell::Date(d) => Some(*d),
        Cell::Number(n) => excel_serial_to_date(*n),
        Cell::Text(s) => parse_date_dayfirst(s),
        Cell::Empty => None,
    }
}

fn cell_at(row: &[Cell], idx: usize) -> &Cell {
    row.get(idx).unwrap_or(&EMPTY)
}

// ---------------------------------------------------------------------------
// Header detection
// ---------------------------------------------------------------------------

/// Zero-based index of the header row among the first few physical rows.
/// Falls back to row 0 when no row carries the full expected label set:
/// most exports already start at their header, so this is a default, not
/// a failure.
pub fn find_header_row<R: AsRef<[Cell]>>(records: &[R]) -> usize {
    records
        .iter()
        .take(HEADER_SCAN_ROWS)
        .position(|row| {
            let labels: Vec<String> = row.as_ref().iter().map(Cell::as_text).collect();
            EXPECTED_HEADERS
                .iter()
                .all(|expected| labels.iter().any(|l| l == expected))
        })
        .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Column mapping
// ---------------------------------------------------------------------------

/// Lower-cased header labels by column index.
struct ColumnMap {
    lower: Vec<String>,
}

impl ColumnMap {
    fn new(headers: &[Cell]) -> Self {
        Self {
            lower: headers.iter().map(|c| c.as_text().to_lowercase()).collect(),
        }
    }

    fn is_blank(&self) -> bool {
        self.lower.iter().all(|h| h.is_empty())
    }

    /// First synonym (in priority order) naming a column; the earliest
    /// column wins on duplicate labels.
    fn resolve(&self, synonyms: &[&str]) -> Option<usize> {
        synonyms
            .iter()
            .find_map(|syn| self.lower.iter().position(|h| h == syn))
    }

    fn find_containing(&self, needles: &[&str]) -> Option<usize> {
        self.lower
            .iter()
            .position(|h| needles.iter().any(|n| h.contains(n)))
    }
}

fn is_text_column<R: AsRef<[Cell]>>(rows: &[R], idx: usize) -> bool {
    rows.iter().any(|row| match cell_at(row.as_ref(), idx) {
        Cell::Text(s) => parse_number(s).is_none(),
        _ => false,
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum AmountSource {
    /// Separate withdrawal and deposit columns.
    Split { withdrawal: usize, deposit: usize },
    /// One amount column, sign taken from an optional type/indicator column.
    Single { amount: usize, indicator: Option<usize> },
    /// Nothing usable: every row becomes a zero-amount debit. Deliberately
    /// kept so a badly-shaped file yields an empty analysis, not a crash.
    Missing,
}

impl AmountSource {
    fn resolve(columns: &ColumnMap) -> Self {
        let withdrawal = columns.resolve(WITHDRAWAL_COLUMNS);
        let deposit = columns.resolve(DEPOSIT_COLUMNS);
        if let (Some(withdrawal), Some(deposit)) = (withdrawal, deposit) {
            return Self::Split {
                withdrawal,
                deposit,
            };
        }
        match columns.find_containing(&["amount"]) {
            Some(amount) => Self::Single {
                amount,
                indicator: columns.find_containing(INDICATOR_HINTS),
            },
            None => Self::Missing,
        }
    }

    /// `(amount, is_debit)` for one row.
    fn read(&self, row: &[Cell]) -> (f64, bool) {
        match *self {
            Self::Split {
                withdrawal,
                deposit,
            } => {
                let w = cell_amount(cell_at(row, withdrawal));
                let d = cell_amount(cell_at(row, deposit));
                if w > 0.0 {
                    (w, true)
                } else {
                    (d.abs(), false)
                }
            }
            Self::Single { amount, indicator } => {
                let value = cell_amount(cell_at(row, amount)).abs();
                let is_debit = match indicator {
                    Some(idx) => {
                        let marker = cell_at(row, idx).as_text().to_lowercase();
                        DEBIT_MARKERS.iter().any(|m| marker.contains(m))
                    }
                    None => true,
                };
                (value, is_debit)
            }
            Self::Missing => (0.0, true),
        }
    }
}

#[derive(Debug)]
struct ColumnLayout {
    date: Option<usize>,
    description: Option<usize>,
    reference: Option<usize>,
    amounts: AmountSource,
}

impl ColumnLayout {
    fn resolve<R: AsRef<[Cell]>>(columns: &ColumnMap, rows: &[R]) -> Self {
        let date = columns.resolve(DATE_COLUMNS);
        let description = columns.resolve(DESCRIPTION_COLUMNS).or_else(|| {
            (0..columns.lower.len()).find(|&idx| Some(idx) != date && is_text_column(rows, idx))
        });
        Self {
            date,
            description,
            reference: columns.resolve(REFERENCE_COLUMNS),
            amounts: AmountSource::resolve(columns),
        }
    }

    fn transaction(&self, row: &[Cell]) -> Option<CanonicalTransaction> {
        let date = cell_date(cell_at(row, self.date?))?;
        let description = self
            .description
            .map(|idx| cell_at(row, idx).as_text())
            .unwrap_or_default();
        let reference = self
            .reference
            .map(|idx| cell_at(row, idx).as_text())
            .filter(|r| !r.is_empty());
        let (amount, is_debit) = self.amounts.read(row);
        Some(CanonicalTransaction {
            date,
            description,
            amount,
            is_debit,
            reference,
        })
    }
}

// ---------------------------------------------------------------------------
// normalize
// ---------------------------------------------------------------------------

/// Map a raw statement table onto canonical transactions. Rows whose date
/// cannot be read are dropped; every other per-cell problem degrades to a
/// default (empty description, zero amount).
pub fn normalize(raw: &RawTable) -> Result<Vec<CanonicalTransaction>> {
    if raw.is_empty() {
        return Err(TaxlensError::malformed(
            &raw.source,
            "detecting the header row",
            "the file contains no rows",
        ));
    }

    let records: Vec<&Vec<Cell>> = std::iter::once(&raw.headers).chain(raw.rows.iter()).collect();
    let header_idx = find_header_row(&records);
    let columns = ColumnMap::new(records[header_idx]);
    if columns.is_blank() {
        return Err(TaxlensError::malformed(
            &raw.source,
            "mapping columns",
            format!("row {} has no column labels", header_idx + 1),
        ));
    }

    let data = &records[header_idx + 1..];
    let layout = ColumnLayout::resolve(&columns, data);
    tracing::debug!(header_row = header_idx, ?layout, "resolved column layout");
    if layout.date.is_none() {
        tracing::warn!(source = %raw.source, "no date column found; every row will be dropped");
    }

    let mut transactions = Vec::with_capacity(data.len());
    let mut dropped = 0usize;
    for (offset, row) in data.iter().enumerate() {
        match layout.transaction(row) {
            Some(txn) => transactions.push(txn),
            None => {
                dropped += 1;
                tracing::debug!(line = header_idx + offset + 2, "dropped row without a readable date");
            }
        }
    }

    tracing::info!(
        kept = transactions.len(),
        dropped,
        header_row = header_idx,
        "normalized transactions"
    );
    Ok(transactions)
}
