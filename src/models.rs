use chrono::NaiveDate;

/// One untyped value read from a statement file.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl Cell {
    /// Build a cell from raw delimited text; blank text becomes `Empty`.
    pub fn from_text(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(trimmed.to_string())
        }
    }

    /// Display form of the cell. Integral numbers drop the trailing `.0`
    /// so cheque numbers read as `"123456"`.
    pub fn as_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Cell::Number(n) => n.to_string(),
            Cell::Date(d) => d.format("%Y-%m-%d").to_string(),
        }
    }
}

/// Rows of a statement file before any interpretation: `headers` is the
/// first physical row, `rows` everything after it.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub source: String,
    pub headers: Vec<Cell>,
    pub rows: Vec<Vec<Cell>>,
    /// Hex SHA-256 of the file bytes; empty for tables built in memory.
    pub checksum: String,
}

impl RawTable {
    /// Split physical records into a header row and data rows.
    pub fn from_records(source: &str, mut records: Vec<Vec<Cell>>) -> Self {
        let headers = if records.is_empty() {
            Vec::new()
        } else {
            records.remove(0)
        };
        Self {
            source: source.to_string(),
            headers,
            rows: records,
            checksum: String::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.rows.is_empty()
    }
}

/// Normalized transaction; the unit every later stage works on.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalTransaction {
    pub date: NaiveDate,
    pub description: String,
    /// Non-negative magnitude.
    pub amount: f64,
    pub is_debit: bool,
    pub reference: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedTransaction {
    pub transaction: CanonicalTransaction,
    pub category: String,
    pub matched_keywords: Vec<String>,
}

/// Debit that matched no category but is large enough to review by hand.
#[derive(Debug, Clone, PartialEq)]
pub struct UncertainTransaction {
    pub transaction: CanonicalTransaction,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    pub name: String,
    pub schemes: Vec<String>,
    pub total: f64,
    pub deductible: f64,
    pub savings: f64,
    pub transactions: Vec<ClassifiedTransaction>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    /// One entry per configured category, in configuration order.
    pub categories: Vec<CategoryTotal>,
    pub potential_savings: f64,
    pub uncertain: Vec<UncertainTransaction>,
    pub summary: String,
    pub currency: String,
}

impl AnalysisResult {
    #[cfg(test)]
    pub fn category(&self, name: &str) -> Option<&CategoryTotal> {
        self.categories.iter().find(|c| c.name == name)
    }

    pub fn categorized_count(&self) -> usize {
        self.categories.iter().map(|c| c.transactions.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatementOverview {
    pub total_transactions: usize,
    pub debit_count: usize,
    pub credit_count: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}
