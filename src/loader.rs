use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::{Result, TaxlensError};
use crate::models::{Cell, RawTable};

// ---------------------------------------------------------------------------
// Source kinds: enum dispatch on file extension
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SourceKind {
    Delimited,
    #[cfg(feature = "xlsx")]
    Workbook,
}

impl SourceKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Delimited => "delimited text",
            #[cfg(feature = "xlsx")]
            Self::Workbook => "spreadsheet",
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let display = path.display().to_string();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "csv" | "txt" => Ok(Self::Delimited),
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => workbook_kind(&display),
            "ofx" | "qfx" => Err(TaxlensError::unsupported(
                &display,
                "OFX/QFX support is not implemented",
            )),
            "pdf" => Err(TaxlensError::unsupported(&display, "PDF support is not implemented")),
            "" => Err(TaxlensError::unsupported(&display, "file has no extension")),
            other => Err(TaxlensError::unsupported(
                &display,
                format!("unrecognized extension .{other}"),
            )),
        }
    }

    fn read(&self, path: &Path, display: &str, bytes: &[u8]) -> Result<Vec<Vec<Cell>>> {
        match self {
            Self::Delimited => read_delimited(display, bytes),
            #[cfg(feature = "xlsx")]
            Self::Workbook => read_workbook(path, display),
        }
    }
}

#[cfg(feature = "xlsx")]
fn workbook_kind(_display: &str) -> Result<SourceKind> {
    Ok(SourceKind::Workbook)
}

#[cfg(not(feature = "xlsx"))]
fn workbook_kind(display: &str) -> Result<SourceKind> {
    Err(TaxlensError::unsupported(
        display,
        "spreadsheet support was not compiled in (enable the `xlsx` feature)",
    ))
}

fn compute_checksum(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

// ---------------------------------------------------------------------------
// load_table
// ---------------------------------------------------------------------------

/// Read a statement file into an uninterpreted table. The first physical
/// row becomes `headers`; locating the real header row is the normalizer's
/// job since many exports start with a letterhead.
pub fn load_table(path: &Path) -> Result<RawTable> {
    let kind = SourceKind::from_path(path)?;
    let display = path.display().to_string();
    let bytes = std::fs::read(path).map_err(|source| TaxlensError::Read {
        path: display.clone(),
        source,
    })?;

    let records = kind.read(path, &display, &bytes)?;
    tracing::info!(
        path = %path.display(),
        kind = kind.name(),
        rows = records.len(),
        "loaded statement"
    );

    let mut table = RawTable::from_records(&display, records);
    table.checksum = compute_checksum(&bytes);
    Ok(table)
}

// ---------------------------------------------------------------------------
// Delimited text
// ---------------------------------------------------------------------------

/// Lines inspected when guessing the delimiter. Letterhead lines above the
/// table often carry no delimiter at all, so the first line alone is not
/// enough.
const DELIMITER_SAMPLE_LINES: usize = 20;

/// Most frequent of `,` `;` tab `|` over the sampled lines; comma on ties
/// or when none appear.
fn detect_delimiter(bytes: &[u8]) -> u8 {
    let sample = bytes
        .split(|&b| b == b'\n')
        .take(DELIMITER_SAMPLE_LINES)
        .flatten();
    let mut counts = [(b',', 0usize), (b';', 0), (b'\t', 0), (b'|', 0)];
    for &b in sample {
        if let Some(entry) = counts.iter_mut().find(|(d, _)| *d == b) {
            entry.1 += 1;
        }
    }
    counts
        .iter()
        .fold((b',', 0), |best, &(d, n)| if n > best.1 { (d, n) } else { best })
        .0
}

fn read_delimited(display: &str, bytes: &[u8]) -> Result<Vec<Vec<Cell>>> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let delimiter = detect_delimiter(bytes);
    tracing::debug!(delimiter = %char::from(delimiter).escape_default(), "detected delimiter");
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut records = Vec::new();
    for result in rdr.byte_records() {
        let record = result.map_err(|e| TaxlensError::malformed(display, "reading csv", e))?;
        // Statements exported from older banking portals are often not UTF-8.
        records.push(
            record
                .iter()
                .map(|field| Cell::from_text(&String::from_utf8_lossy(field)))
                .collect(),
        );
    }
    Ok(records)
}

// ---------------------------------------------------------------------------
// Spreadsheets (feature-gated)
// ---------------------------------------------------------------------------

#[cfg(feature = "xlsx")]
fn read_workbook(path: &Path, display: &str) -> Result<Vec<Vec<Cell>>> {
    use calamine::Reader;

    let mut workbook = calamine::open_workbook_auto(path)
        .map_err(|e| TaxlensError::malformed(display, "opening workbook", e.to_string()))?;
    let Some(sheet) = workbook.sheet_names().first().cloned() else {
        return Ok(Vec::new());
    };
    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| TaxlensError::malformed(display, "reading workbook", e.to_string()))?;
    Ok(range
        .rows()
        .map(|row| row.iter().map(data_to_cell).collect())
        .collect())
}

#[cfg(feature = "xlsx")]
fn data_to_cell(data: &calamine::Data) -> Cell {
    use calamine::Data;

    match data {
        Data::String(s) | Data::DateTimeIso(s) => Cell::from_text(s),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTime(dt) => crate::normalizer::excel_serial_to_date(dt.as_f64())
            .map(Cell::Date)
            .unwrap_or(Cell::Empty),
        _ => Cell::Empty,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_file(dir: &Path, name: &str, content: &[u8]) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_csv_keeps_every_physical_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "stmt.csv",
            b"HDFC BANK LTD\n\
Date,Narration,Amount\n\
01/04/2024,HOSPITAL XYZ,5000\n",
        );
        let table = load_table(&path).unwrap();
        assert_eq!(table.headers, vec![Cell::Text("HDFC BANK LTD".into())]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1][1], Cell::Text("HOSPITAL XYZ".into()));
        assert_eq!(table.checksum.len(), 64);
    }

    #[test]
    fn test_blank_cells_become_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "stmt.csv", b"Date,Narration,Ref\n01/04/2024,  ,\n");
        let table = load_table(&path).unwrap();
        assert_eq!(table.rows[0][1], Cell::Empty);
        assert_eq!(table.rows[0][2], Cell::Empty);
    }

    #[test]
    fn test_bom_and_latin1_are_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "stmt.csv",
            b"\xEF\xBB\xBFDate,Narration\n01/04/2024,CAF\xC9 OFFICE\n",
        );
        let table = load_table(&path).unwrap();
        assert_eq!(table.headers[0], Cell::Text("Date".into()));
        let Cell::Text(desc) = &table.rows[0][1] else {
            panic!("expected text cell");
        };
        assert!(desc.starts_with("CAF"));
        assert!(desc.ends_with("OFFICE"));
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter(b"Date,Narration,Amount\n"), b',');
        assert_eq!(detect_delimiter(b"Date;Narration;Amount\n"), b';');
        assert_eq!(detect_delimiter(b"Date\tNarration\tAmount\n"), b'\t');
        assert_eq!(detect_delimiter(b"Date|Narration|Amount\n"), b'|');
        assert_eq!(detect_delimiter(b"no delimiters here"), b',');
        // Letterhead without delimiters, table below it.
        assert_eq!(
            detect_delimiter(b"BANK STATEMENT\nDate;Narration;Amount\n01/04/2024;A;1,50\n"),
            b';'
        );
    }

    #[test]
    fn test_tab_and_semicolon_exports_normalize() {
        use crate::normalizer::normalize;

        let dir = tempfile::tempdir().unwrap();
        let tab = write_file(
            dir.path(),
            "stmt.txt",
            b"Date\tNarration\tWithdrawal\tDeposit\n01/04/2024\tCITY HOSPITAL\t5000\t\n",
        );
        let semi = write_file(
            dir.path(),
            "stmt_semi.csv",
            b"Date;Narration;Withdrawal;Deposit\n01/04/2024;CITY HOSPITAL;5000;\n",
        );
        for path in [tab, semi] {
            let table = load_table(&path).unwrap();
            assert_eq!(table.headers.len(), 4);
            let txns = normalize(&table).unwrap();
            assert_eq!(txns.len(), 1);
            assert_eq!(txns[0].description, "CITY HOSPITAL");
            assert_eq!(txns[0].amount, 5000.0);
            assert!(txns[0].is_debit);
        }
    }

    #[test]
    fn test_checksum_is_stable() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_file(dir.path(), "a.csv", b"Date,Amount\n01/01/2024,5\n");
        let b = write_file(dir.path(), "b.csv", b"Date,Amount\n01/01/2024,5\n");
        assert_eq!(load_table(&a).unwrap().checksum, load_table(&b).unwrap().checksum);
    }

    #[test]
    fn test_unsupported_extensions() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["stmt.ofx", "stmt.QFX", "stmt.pdf", "stmt.json", "statement"] {
            let path = write_file(dir.path(), name, b"irrelevant");
            let err = load_table(&path).unwrap_err();
            assert!(
                matches!(err, TaxlensError::UnsupportedFormat { .. }),
                "{name} should be unsupported"
            );
        }
    }

    #[test]
    fn test_unsupported_checked_before_reading() {
        let err = load_table(Path::new("/nonexistent/stmt.pdf")).unwrap_err();
        assert!(matches!(err, TaxlensError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = load_table(Path::new("/nonexistent/stmt.csv")).unwrap_err();
        assert!(matches!(err, TaxlensError::Read { .. }));
        assert!(err.to_string().contains("/nonexistent/stmt.csv"));
    }

    #[test]
    fn test_extension_is_case_insensitive() {
        assert_eq!(
            SourceKind::from_path(Path::new("STMT.CSV")).unwrap(),
            SourceKind::Delimited
        );
    }

    #[cfg(feature = "xlsx")]
    #[test]
    fn test_corrupt_workbook_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "stmt.xlsx", b"this is not a zip archive");
        let err = load_table(&path).unwrap_err();
        assert!(matches!(err, TaxlensError::MalformedInput { .. }));
    }
}
