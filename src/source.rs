use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use csv::StringRecord;
use regex::Regex;
use sha2::{Digest, Sha256};

use crate::error::{MoveError, Result};
use crate::models::{
    BalanceKind, BalanceRecord, CategoryKind, CategoryRecord, OpeningBalances, TransactionRecord,
};

/// Where the importers get their rows from. Each method takes the source name the
/// caller was given (usually a file name) and returns decoded records.
pub trait DataSource {
    fn categories(&self, name: &str) -> Result<Vec<CategoryRecord>>;
    fn opening_balances(&self, name: &str) -> Result<OpeningBalances>;
    fn transactions(&self, name: &str) -> Result<Vec<TransactionRecord>>;

    /// Content fingerprint used to skip sources that were already imported.
    /// `None` disables de-duplication.
    fn checksum(&self, _name: &str) -> Result<Option<String>> {
        Ok(None)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parses a money string into minor units. Accepts `$`, thousands separators,
/// quotes, a leading sign and parenthesized negatives; at most two decimals.
pub fn parse_amount(raw: &str) -> Option<i64> {
    let s = raw.replace([',', '"', '$'], "");
    let mut s = s.trim();
    let mut negative = false;
    if let Some(inner) = s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        negative = true;
        s = inner.trim();
    }
    if let Some(rest) = s.strip_prefix('-') {
        negative = !negative;
        s = rest.trim_start();
    } else if let Some(rest) = s.strip_prefix('+') {
        s = rest.trim_start();
    }
    let (whole, frac) = match s.split_once('.') {
        Some((w, f)) => (w, f),
        None => (s, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return None;
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    if frac.len() > 2 {
        return None;
    }
    let whole: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let cents: i64 = match frac.len() {
        0 => 0,
        1 => frac.parse::<i64>().ok()? * 10,
        _ => frac.parse().ok()?,
    };
    let value = whole.checked_mul(100)?.checked_add(cents)?;
    Some(if negative { -value } else { value })
}

/// Accepts `YYYY-MM-DD` and `MM/DD/YYYY`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%m/%d/%Y"))
        .ok()
}

fn source_io(name: &str, source: std::io::Error) -> MoveError {
    MoveError::SourceIo {
        source_name: name.to_string(),
        source,
    }
}

/// Reads the as-of date from a file name such as `2016-12-31_balances.csv` or
/// `2016_12_31_balances.csv`.
pub fn as_of_from_name(name: &str) -> Option<NaiveDate> {
    let file_name = Path::new(name).file_name()?.to_str()?;
    let re = Regex::new(r"^(\d{4})[-_](\d{2})[-_](\d{2})").ok()?;
    let caps = re.captures(file_name)?;
    let y = caps[1].parse().ok()?;
    let m = caps[2].parse().ok()?;
    let d = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(y, m, d)
}

/// Column positions resolved from a header row, matched case-insensitively.
struct Columns<'a> {
    source_name: &'a str,
    header: Vec<String>,
}

impl<'a> Columns<'a> {
    fn new(source_name: &'a str, header: &StringRecord) -> Self {
        Self {
            source_name,
            header: header.iter().map(|h| h.trim().to_lowercase()).collect(),
        }
    }

    fn optional(&self, name: &str) -> Option<usize> {
        let name = name.to_lowercase();
        self.header.iter().position(|h| *h == name)
    }

    fn required(&self, name: &str) -> Result<usize> {
        self.optional(name).ok_or_else(|| MoveError::MissingColumn {
            source_name: self.source_name.to_string(),
            column: name.to_string(),
        })
    }
}

/// One data row plus enough context to report errors against it.
struct Row<'a> {
    source_name: &'a str,
    record: StringRecord,
    line: u64,
}

impl Row<'_> {
    fn get(&self, idx: usize) -> &str {
        self.record.get(idx).map(str::trim).unwrap_or("")
    }

    fn required(&self, idx: usize, field: &str) -> Result<String> {
        let value = self.get(idx);
        if value.is_empty() {
            return Err(MoveError::MissingField {
                source_name: self.source_name.to_string(),
                line: self.line,
                field: field.to_string(),
            });
        }
        Ok(value.to_string())
    }

    fn optional(&self, idx: Option<usize>) -> Option<String> {
        idx.map(|i| self.get(i)).filter(|v| !v.is_empty()).map(str::to_string)
    }

    fn amount(&self, idx: usize, field: &str) -> Result<i64> {
        let raw = self.required(idx, field)?;
        parse_amount(&raw).ok_or_else(|| MoveError::InvalidAmount {
            source_name: self.source_name.to_string(),
            line: self.line,
            raw,
        })
    }

    fn date(&self, idx: usize, field: &str) -> Result<NaiveDate> {
        let raw = self.required(idx, field)?;
        parse_date(&raw).ok_or_else(|| MoveError::InvalidDate {
            source_name: self.source_name.to_string(),
            line: self.line,
            raw,
        })
    }
}

// ---------------------------------------------------------------------------
// CSV source
// ---------------------------------------------------------------------------

/// Reads budgeting-tool CSV exports from a directory.
#[derive(Debug, Clone)]
pub struct CsvSource {
    base_dir: PathBuf,
    as_of_date: Option<NaiveDate>,
}

impl CsvSource {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            as_of_date: None,
        }
    }

    /// Uses `date` for opening balances instead of the file-name prefix.
    pub fn with_as_of_date(mut self, date: Option<NaiveDate>) -> Self {
        self.as_of_date = date;
        self
    }

    fn path(&self, name: &str) -> PathBuf {
        self.base_dir.join(name)
    }

    /// Reads `name` and hands every non-blank data row to `f` along with the
    /// resolved header.
    fn read_rows<T>(
        &self,
        name: &str,
        mut f: impl FnMut(&Columns<'_>, &Row<'_>) -> Result<T>,
    ) -> Result<Vec<T>> {
        let file = std::fs::File::open(self.path(name)).map_err(|e| source_io(name, e))?;
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(std::io::BufReader::new(file));
        let header = rdr.headers()?.clone();
        let columns = Columns::new(name, &header);

        let mut out = Vec::new();
        for result in rdr.records() {
            let record = result?;
            if record.iter().all(|field| field.trim().is_empty()) {
                continue;
            }
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            let row = Row {
                source_name: name,
                record,
                line,
            };
            out.push(f(&columns, &row)?);
        }
        Ok(out)
    }
}

impl DataSource for CsvSource {
    fn categories(&self, name: &str) -> Result<Vec<CategoryRecord>> {
        self.read_rows(name, |cols, row| {
            let category = row.required(cols.required("Category")?, "Category")?;
            let flag = row.get(cols.required("Type")?);
            let kind = CategoryKind::parse(&category, flag)?;
            Ok(CategoryRecord {
                name: category,
                kind,
            })
        })
    }

    fn opening_balances(&self, name: &str) -> Result<OpeningBalances> {
        let as_of_date = self
            .as_of_date
            .or_else(|| as_of_from_name(name))
            .ok_or_else(|| MoveError::MissingAsOfDate(name.to_string()))?;
        let data = self.read_rows(name, |cols, row| {
            let account = row.required(cols.required("Account")?, "Account")?;
            let flag = row.get(cols.required("Type")?);
            let kind = BalanceKind::parse(&account, flag)?;
            let amount = row.amount(cols.required("Balance")?, "Balance")?;
            Ok(BalanceRecord {
                account,
                kind,
                amount,
            })
        })?;
        Ok(OpeningBalances { as_of_date, data })
    }

    fn transactions(&self, name: &str) -> Result<Vec<TransactionRecord>> {
        self.read_rows(name, |cols, row| {
            let date = row.date(cols.required("Date")?, "Date")?;
            let account = row.required(cols.required("Account")?, "Account")?;
            let category = row.required(cols.required("Category")?, "Category")?;
            let amount = row.amount(cols.required("Amount")?, "Amount")?;
            let description = row
                .optional(cols.optional("Description"))
                .unwrap_or_else(|| category.clone());
            let memo = row.optional(cols.optional("Memo"));
            Ok(TransactionRecord {
                date,
                account,
                category,
                amount,
                description,
                memo,
            })
        })
    }

    fn checksum(&self, name: &str) -> Result<Option<String>> {
        let data = std::fs::read(self.path(name)).map_err(|e| source_io(name, e))?;
        let mut hasher = Sha256::new();
        hasher.update(&data);
        Ok(Some(hex::encode(hasher.finalize())))
    }
}

// ---------------------------------------------------------------------------
// In-memory source
// ---------------------------------------------------------------------------

/// Serves already-decoded records regardless of the name asked for.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    pub categories: Vec<CategoryRecord>,
    pub opening_balances: Option<OpeningBalances>,
    pub transactions: Vec<TransactionRecord>,
}

#[cfg(test)]
impl DataSource for StaticSource {
    fn categories(&self, _name: &str) -> Result<Vec<CategoryRecord>> {
        Ok(self.categories.clone())
    }

    fn opening_balances(&self, name: &str) -> Result<OpeningBalances> {
        self.opening_balances
            .clone()
            .ok_or_else(|| MoveError::MissingAsOfDate(name.to_string()))
    }

    fn transactions(&self, _name: &str) -> Result<Vec<TransactionRecord>> {
        Ok(self.transactions.clone())
    }
}
