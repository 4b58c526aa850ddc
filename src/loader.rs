// 📥 Sheet Loader - Spreadsheet CSV export → typed expense records
// Coerces amounts and dates at the boundary. Rows without a usable amount are
// rejected here so untyped data never reaches the analysis passes.

use crate::expense::ExpenseRecord;
use crate::normalizer::normalize;
use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use csv::StringRecord;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

// ============================================================================
// LOAD REPORT
// ============================================================================

/// A row the loader refused, with the sheet line it came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedRow {
    /// 1-based line in the export (the header is line 1)
    pub line: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadReport {
    pub records: Vec<ExpenseRecord>,
    pub rejected: Vec<RejectedRow>,
}

impl LoadReport {
    /// Records whose date cell could not be parsed
    pub fn undated_count(&self) -> usize {
        self.records.iter().filter(|r| r.occurred_at.is_none()).count()
    }

    pub fn summary(&self) -> String {
        format!(
            "Loaded: {}, Undated: {}, Rejected: {}",
            self.records.len(),
            self.undated_count(),
            self.rejected.len()
        )
    }
}

// ============================================================================
// COLUMN MAPPING
// ============================================================================

// Header spellings seen in the project sheets, already normalized
const DATE_HEADERS: &[&str] = &["data", "date", "dia", "data da compra"];
const DESCRIPTION_HEADERS: &[&str] = &["descricao", "description", "item", "historico", "material"];
const AMOUNT_HEADERS: &[&str] = &["valor", "amount", "preco", "valor (r$)", "valor total", "total"];
const CATEGORY_HEADERS: &[&str] = &["categoria", "category", "etapa"];

#[derive(Debug, Clone, PartialEq)]
struct ColumnMap {
    description: usize,
    amount: usize,
    date: Option<usize>,
    category: Option<usize>,
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let find = |known: &[&str]| {
            headers
                .iter()
                .position(|h| known.contains(&normalize(h).as_str()))
        };

        let description = find(DESCRIPTION_HEADERS).ok_or_else(|| {
            anyhow!(
                "Missing description column (expected one of: {})",
                DESCRIPTION_HEADERS.join(", ")
            )
        })?;
        let amount = find(AMOUNT_HEADERS).ok_or_else(|| {
            anyhow!(
                "Missing amount column (expected one of: {})",
                AMOUNT_HEADERS.join(", ")
            )
        })?;

        Ok(ColumnMap {
            description,
            amount,
            date: find(DATE_HEADERS),
            category: find(CATEGORY_HEADERS),
        })
    }

    fn parse_row(&self, row: &StringRecord) -> std::result::Result<ExpenseRecord, String> {
        let cell = |index: Option<usize>| {
            index
                .and_then(|i| row.get(i))
                .map(str::trim)
                .filter(|s| !s.is_empty())
        };

        let raw_amount = cell(Some(self.amount)).ok_or_else(|| "empty amount".to_string())?;
        let amount =
            parse_amount(raw_amount).ok_or_else(|| format!("unparseable amount: {:?}", raw_amount))?;

        Ok(ExpenseRecord {
            description: cell(Some(self.description)).map(str::to_string),
            amount,
            occurred_at: cell(self.date).and_then(parse_date),
            category: cell(self.category).map(str::to_string),
        })
    }
}

// ============================================================================
// LOADING
// ============================================================================

/// Load an exported sheet from disk
pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<LoadReport> {
    let file = File::open(path.as_ref())
        .with_context(|| format!("Failed to open sheet export: {:?}", path.as_ref()))?;

    load_from_reader(file)
        .with_context(|| format!("Failed to load sheet export: {:?}", path.as_ref()))
}

/// Load an exported sheet from any reader (file, HTTP body, test string)
pub fn load_from_reader<R: Read>(reader: R) -> Result<LoadReport> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers().context("Failed to read header row")?.clone();
    let columns = ColumnMap::from_headers(&headers)?;

    let mut report = LoadReport::default();

    for (index, result) in rdr.records().enumerate() {
        let row = result.with_context(|| format!("Failed to read data row {}", index + 1))?;
        let line = row
            .position()
            .map(|pos| pos.line() as usize)
            .unwrap_or(index + 2);

        // Sheets export trailing blank rows
        if row.iter().all(|field| field.trim().is_empty()) {
            continue;
        }

        match columns.parse_row(&row) {
            Ok(record) => report.records.push(record),
            Err(reason) => {
                warn!(line, %reason, "Rejected sheet row");
                report.rejected.push(RejectedRow { line, reason });
            }
        }
    }

    debug!("{}", report.summary());
    Ok(report)
}

// ============================================================================
// CELL COERCION
// ============================================================================

/// Parse a money cell, returning its absolute value.
///
/// Accepts "R$ 1.234,56", "R$ 1.150", "1234.56", "1,234.56", "-45,90" and
/// "(45,90)". When both separators appear the last one is the decimal mark.
/// A lone comma is decimal unless it repeats. A lone dot is decimal unless it
/// repeats or splits off a single thousands group ("1.150", "12.500").
pub fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .replace("R$", "")
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '(' | ')'))
        .collect();

    if cleaned.is_empty() || cleaned == "-" {
        return None;
    }

    let last_comma = cleaned.rfind(',');
    let last_dot = cleaned.rfind('.');

    let canonical = match (last_comma, last_dot) {
        (Some(comma), Some(dot)) if comma > dot => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (Some(_), None) if cleaned.matches(',').count() == 1 => cleaned.replace(',', "."),
        (Some(_), None) => cleaned.replace(',', ""),
        (None, Some(_)) if cleaned.matches('.').count() > 1 => cleaned.replace('.', ""),
        (None, Some(dot)) if is_thousands_group(&cleaned, dot) => cleaned.replace('.', ""),
        _ => cleaned,
    };

    canonical
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .map(f64::abs)
}

// "1.150": one to three leading digits, then exactly three digits
fn is_thousands_group(cleaned: &str, separator: usize) -> bool {
    let (head, tail) = (&cleaned[..separator], &cleaned[separator + 1..]);
    let head_digits = head.trim_start_matches('-');

    tail.len() == 3
        && tail.bytes().all(|b| b.is_ascii_digit())
        && (1..=3).contains(&head_digits.len())
        && head_digits.bytes().all(|b| b.is_ascii_digit())
}

/// Parse a date cell (dd/mm/yyyy, yyyy-mm-dd, dd-mm-yyyy, dd/mm/yy).
///
/// A trailing time part ("2024-01-05 00:00:00") is ignored.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let date_part = raw.split_whitespace().next()?;

    ["%d/%m/%Y", "%Y-%m-%d", "%d-%m-%Y", "%d/%m/%y"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(date_part, format).ok())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_amount_formats() {
        assert_eq!(parse_amount("R$ 1.234,56"), Some(1234.56));
        assert_eq!(parse_amount("1234.56"), Some(1234.56));
        assert_eq!(parse_amount("1,234.56"), Some(1234.56));
        assert_eq!(parse_amount("36"), Some(36.0));
        assert_eq!(parse_amount("32,5"), Some(32.5));
        assert_eq!(parse_amount("1.234.567"), Some(1234567.0));
        assert_eq!(parse_amount("-45,90"), Some(45.9));
        assert_eq!(parse_amount("(45,90)"), Some(45.9));
    }

    #[test]
    fn test_parse_amount_dot_thousands() {
        assert_eq!(parse_amount("R$ 1.150"), Some(1150.0));
        assert_eq!(parse_amount("R$ 1.150,00"), Some(1150.0));
        assert_eq!(parse_amount("1.200"), Some(1200.0));
        assert_eq!(parse_amount("-12.500"), Some(12500.0));

        // Not a single thousands group, so the dot stays decimal
        assert_eq!(parse_amount("48.50"), Some(48.5));
        assert_eq!(parse_amount("1234.567"), Some(1234.567));
        assert_eq!(parse_amount(".150"), Some(0.15));
    }

    #[test]
    fn test_brazilian_amounts_keep_price_trend() {
        let csv = "Data,Descrição,Valor\n\
                   15/02/2024,Tijolo cerâmico,\"R$ 1.150,00\"\n\
                   15/03/2024,Tijolo cerâmico,R$ 1.200\n";

        let report = load_from_reader(csv.as_bytes()).unwrap();
        let amounts: Vec<f64> = report.records.iter().map(|r| r.amount).collect();
        assert_eq!(amounts, vec![1150.0, 1200.0]);
    }

    #[test]
    fn test_parse_amount_rejects_garbage() {
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("R$ "), None);
        assert_eq!(parse_amount("-"), None);
        assert_eq!(parse_amount("a combinar"), None);
        assert_eq!(parse_amount("inf"), None);
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("05/02/2024"), Some(date(2024, 2, 5)));
        assert_eq!(parse_date("2024-02-05"), Some(date(2024, 2, 5)));
        assert_eq!(parse_date("05-02-2024"), Some(date(2024, 2, 5)));
        assert_eq!(parse_date("2024-02-05 00:00:00"), Some(date(2024, 2, 5)));
        assert_eq!(parse_date("fevereiro"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_load_portuguese_export() {
        let csv = "Data,Descrição,Valor,Categoria\n\
                   01/01/2024,Cimento: saco 50kg,\"R$ 30,00\",Fundação\n\
                   01/02/2024,Cimento: saco 50kg,\"R$ 36,00\",Fundação\n\
                   sem data,Areia média,\"450,00\",\n";

        let report = load_from_reader(csv.as_bytes()).unwrap();

        assert_eq!(report.records.len(), 3);
        assert!(report.rejected.is_empty());

        let first = &report.records[0];
        assert_eq!(first.description.as_deref(), Some("Cimento: saco 50kg"));
        assert_eq!(first.amount, 30.0);
        assert_eq!(first.occurred_at, Some(date(2024, 1, 1)));
        assert_eq!(first.category.as_deref(), Some("Fundação"));

        let undated = &report.records[2];
        assert_eq!(undated.occurred_at, None);
        assert_eq!(undated.category, None);
        assert_eq!(report.undated_count(), 1);
    }

    #[test]
    fn test_rejects_rows_without_amount() {
        let csv = "date,description,amount\n\
                   2024-01-01,Cimento,30\n\
                   2024-01-02,Areia,\n\
                   2024-01-03,Brita,a combinar\n\
                   ,,\n";

        let report = load_from_reader(csv.as_bytes()).unwrap();

        assert_eq!(report.records.len(), 1);
        assert_eq!(report.rejected.len(), 2);
        assert_eq!(report.rejected[0].line, 3);
        assert_eq!(report.rejected[0].reason, "empty amount");
        assert_eq!(report.rejected[1].line, 4);
        assert!(report.rejected[1].reason.contains("a combinar"));
    }

    #[test]
    fn test_missing_required_column_is_an_error() {
        let csv = "Data,Descrição,Observação\n01/01/2024,Cimento,ok\n";

        let err = load_from_reader(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("Missing amount column"));
    }

    #[test]
    fn test_date_column_is_optional() {
        let csv = "Material,Valor Total\nTijolo,\"1.200,00\"\n";

        let report = load_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].amount, 1200.0);
        assert_eq!(report.records[0].occurred_at, None);
    }

    #[test]
    fn test_load_csv_missing_file() {
        let err = load_csv("/nonexistent/obra.csv").unwrap_err();
        assert!(err.to_string().contains("Failed to open sheet export"));
    }
}
