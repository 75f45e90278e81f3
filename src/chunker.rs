//! Splits a flat spreadsheet export into prefix partitions plus a manifest.
//!
//! Loading one file with lakhs of rows in a lookup client is slow; grouping
//! rows by the first few digits of the account number keeps each partition
//! small enough to fetch on demand.
//!
//! Input is either a CSV file or a workbook (`.xlsb`, `.xlsx`, `.xlsm`, `.xls`,
//! `.ods`) read from one named sheet. Rows are buffered per prefix and merged
//! into the partition file once a bucket reaches `flush_every` accounts, so
//! memory stays bounded by the number of open buckets.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Reader};
use csv::ReaderBuilder;
use serde_json::{Map, Number, Value};

use crate::errors::ChunkError;
use crate::store::DEFAULT_MANIFEST;
use crate::types::{Manifest, RawRecord};
use crate::util::normalize_account;

pub const DEFAULT_SHEET: &str = "All NPA";
pub const DEFAULT_FLUSH_EVERY: usize = 5000;

const PROGRESS_EVERY: usize = 50_000;
const WORKBOOK_EXTENSIONS: [&str; 5] = ["xlsb", "xlsx", "xlsm", "xls", "ods"];

#[derive(Debug, Clone)]
pub struct ChunkOptions {
    pub prefix_len: usize,
    /// Accounts held for one prefix before they are merged to disk.
    pub flush_every: usize,
    /// Worksheet to read; ignored for CSV input.
    pub sheet: String,
}

impl Default for ChunkOptions {
    fn default() -> Self {
        Self {
            prefix_len: 3,
            flush_every: DEFAULT_FLUSH_EVERY,
            sheet: DEFAULT_SHEET.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkReport {
    pub total_rows: usize,
    pub skipped_rows: usize,
    /// Partition files written by this run, sorted.
    pub partitions: Vec<String>,
}

/// Header cleanup matching what the lookup side expects: trimmed, single-line,
/// no doubled spaces.
pub fn normalize_header(h: &str) -> String {
    let mut s = h.trim().replace(['\r', '\n'], " ");
    while s.contains("  ") {
        s = s.replace("  ", " ");
    }
    s
}

pub fn is_workbook(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| WORKBOOK_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

pub fn build_chunks(
    input: &Path,
    out_dir: &Path,
    options: &ChunkOptions,
) -> Result<ChunkReport, ChunkError> {
    fs::create_dir_all(out_dir)?;
    let mut writer = PartitionWriter::new(out_dir, options);

    if is_workbook(input) {
        chunk_workbook(input, &options.sheet, &mut writer)?;
    } else {
        chunk_csv(input, &mut writer)?;
    }

    let report = writer.finish()?;
    write_manifest(out_dir)?;
    log::info!(
        "wrote {} partitions from {} rows ({} skipped)",
        report.partitions.len(),
        report.total_rows,
        report.skipped_rows
    );
    Ok(report)
}

fn chunk_csv(input: &Path, writer: &mut PartitionWriter) -> Result<(), ChunkError> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_path(input)?;
    let headers: Vec<String> = rdr.headers()?.iter().map(normalize_header).collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(ChunkError::EmptyHeader);
    }

    for result in rdr.records() {
        let row = result?;
        let mut record = Map::new();
        for (key, cell) in headers.iter().zip(row.iter()) {
            if key.is_empty() {
                continue;
            }
            // Kept as text so mobile numbers and codes keep leading zeros.
            let value = if cell.trim().is_empty() {
                Value::Null
            } else {
                Value::String(cell.trim().to_string())
            };
            record.insert(key.clone(), value);
        }
        writer.push(row.get(0).unwrap_or(""), record)?;
    }
    Ok(())
}

fn chunk_workbook(input: &Path, sheet: &str, writer: &mut PartitionWriter) -> Result<(), ChunkError> {
    let mut workbook = open_workbook_auto(input)?;
    let names = workbook.sheet_names();
    if !names.iter().any(|n| n == sheet) {
        return Err(ChunkError::MissingSheet {
            sheet: sheet.to_string(),
            available: names.join(", "),
        });
    }
    let range = workbook.worksheet_range(sheet)?;
    let mut rows = range.rows();

    let headers: Vec<String> = match rows.next() {
        Some(row) => row.iter().map(|c| normalize_header(&c.to_string())).collect(),
        None => return Err(ChunkError::EmptyHeader),
    };
    if headers.iter().all(|h| h.is_empty()) {
        return Err(ChunkError::EmptyHeader);
    }
    log::info!("reading sheet '{}' ({} columns)", sheet, headers.len());

    for row in rows {
        let mut record = Map::new();
        for (key, cell) in headers.iter().zip(row.iter()) {
            if key.is_empty() {
                continue;
            }
            record.insert(key.clone(), cell_value(cell));
        }
        let account = row.first().map(account_text).unwrap_or_default();
        writer.push(&account, record)?;
    }
    Ok(())
}

/// Workbook cell as stored in a partition. Numbers stay numbers (dates as
/// their day serial), blank and error cells become null.
pub fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Int(i) => Value::from(*i),
        Data::Float(f) => float_value(*f),
        Data::DateTime(dt) => float_value(dt.as_f64()),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => {
            let s = s.trim();
            if s.is_empty() {
                Value::Null
            } else {
                Value::String(s.to_string())
            }
        }
        Data::Bool(b) => Value::Bool(*b),
        Data::Error(_) | Data::Empty => Value::Null,
    }
}

fn float_value(f: f64) -> Value {
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}

/// Account cell as text. Workbooks usually store account numbers as floats,
/// which must not pick up a `.0` or an exponent.
pub fn account_text(cell: &Data) -> String {
    match cell {
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.is_finite() && f.fract() == 0.0 => format!("{:.0}", f),
        Data::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

/// Per-prefix row buffers with bounded size.
struct PartitionWriter<'a> {
    out_dir: &'a Path,
    prefix_len: usize,
    flush_every: usize,
    buckets: HashMap<String, BTreeMap<String, RawRecord>>,
    written: BTreeSet<String>,
    total_rows: usize,
    skipped_rows: usize,
}

impl<'a> PartitionWriter<'a> {
    fn new(out_dir: &'a Path, options: &ChunkOptions) -> Self {
        Self {
            out_dir,
            prefix_len: options.prefix_len.max(1),
            flush_every: options.flush_every.max(1),
            buckets: HashMap::new(),
            written: BTreeSet::new(),
            total_rows: 0,
            skipped_rows: 0,
        }
    }

    fn push(&mut self, raw_account: &str, record: RawRecord) -> Result<(), ChunkError> {
        self.total_rows += 1;
        if self.total_rows % PROGRESS_EVERY == 0 {
            log::info!("processed {} rows...", self.total_rows);
        }

        let account = normalize_account(raw_account);
        if account.is_empty() {
            self.skipped_rows += 1;
            return Ok(());
        }

        let prefix: String = account.chars().take(self.prefix_len).collect();
        let bucket = self.buckets.entry(prefix.clone()).or_default();
        bucket.insert(account, record);
        if bucket.len() >= self.flush_every {
            self.flush(&prefix)?;
        }
        Ok(())
    }

    fn flush(&mut self, prefix: &str) -> Result<(), ChunkError> {
        let Some(rows) = self.buckets.remove(prefix) else {
            return Ok(());
        };
        let name = format!("{}.json", prefix);
        log::debug!("flushing {} accounts into {}", rows.len(), name);
        write_partition(&self.out_dir.join(&name), rows)?;
        self.written.insert(name);
        Ok(())
    }

    fn finish(mut self) -> Result<ChunkReport, ChunkError> {
        let pending: Vec<String> = self.buckets.keys().cloned().collect();
        for prefix in pending {
            self.flush(&prefix)?;
        }
        Ok(ChunkReport {
            total_rows: self.total_rows,
            skipped_rows: self.skipped_rows,
            partitions: self.written.into_iter().collect(),
        })
    }
}

/// Write rows into `path`, merging over any existing partition content.
fn write_partition(path: &Path, rows: BTreeMap<String, RawRecord>) -> Result<(), ChunkError> {
    let mut merged: BTreeMap<String, Value> = if path.exists() {
        serde_json::from_slice(&fs::read(path)?)?
    } else {
        BTreeMap::new()
    };
    for (account, record) in rows {
        merged.insert(account, Value::Object(record));
    }
    fs::write(path, serde_json::to_vec(&merged)?)?;
    Ok(())
}

/// List every partition in `out_dir` (all `*.json` except the manifest).
fn write_manifest(out_dir: &Path) -> Result<PathBuf, ChunkError> {
    let mut files: Vec<String> = fs::read_dir(out_dir)?
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
        .filter(|name| name.ends_with(".json") && name != DEFAULT_MANIFEST)
        .collect();
    files.sort();

    let path = out_dir.join(DEFAULT_MANIFEST);
    fs::write(&path, serde_json::to_vec_pretty(&Manifest { files })?)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn header_cleanup() {
        assert_eq!(normalize_header("  Acct Name "), "Acct Name");
        assert_eq!(normalize_header("Asset Code\n30.09.25"), "Asset Code 30.09.25");
        assert_eq!(normalize_header("O/S   Bal"), "O/S Bal");
    }

    #[test]
    fn workbook_detection_by_extension() {
        assert!(is_workbook(Path::new("npa.xlsb")));
        assert!(is_workbook(Path::new("NPA.XLSX")));
        assert!(is_workbook(Path::new("npa.ods")));
        assert!(!is_workbook(Path::new("npa.csv")));
        assert!(!is_workbook(Path::new("npa")));
    }

    #[test]
    fn workbook_cells_to_json() {
        assert_eq!(cell_value(&Data::Float(100000.0)), json!(100000.0));
        assert_eq!(cell_value(&Data::Int(-7)), json!(-7));
        assert_eq!(cell_value(&Data::String("  Ramesh ".into())), json!("Ramesh"));
        assert_eq!(cell_value(&Data::String("   ".into())), Value::Null);
        assert_eq!(cell_value(&Data::Empty), Value::Null);
        assert_eq!(cell_value(&Data::Bool(true)), json!(true));
    }

    #[test]
    fn float_account_cells_lose_the_fraction() {
        assert_eq!(account_text(&Data::Float(20012345.0)), "20012345");
        assert_eq!(account_text(&Data::Float(12345678901234.0)), "12345678901234");
        assert_eq!(account_text(&Data::Int(31055555)), "31055555");
        assert_eq!(account_text(&Data::String(" 00-123 ".into())), "00-123");
        assert_eq!(account_text(&Data::Empty), "");
    }
}
