//! Source table reading with format, encoding and delimiter auto-detection.
//!
//! Both CSV exports and workbooks are read into a plain grid of trimmed
//! strings. [`locate_header`] then finds the BOM header row (the original
//! sheets carry a title block above it) and splits the grid into headers and
//! data rows. Turning cells into typed rows is [`columns`]' job.

pub mod columns;
pub mod workbook;

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::ConvertOptions;
use crate::error::{SheetError, SheetResult};
use columns::normalize_header;

/// Supported source formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableFormat {
    Csv,
    /// xlsx / xlsm / xlsb / xls / ods
    Workbook,
}

impl TableFormat {
    /// Detect format from file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "csv" | "txt" | "tsv" => Some(Self::Csv),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Some(Self::Workbook),
            _ => None,
        }
    }
}

/// Every cell of the source sheet, before the header is located.
#[derive(Debug, Clone)]
pub struct Grid {
    pub format: TableFormat,
    /// Detected encoding (CSV only).
    pub encoding: Option<String>,
    /// Detected delimiter (CSV only).
    pub delimiter: Option<char>,
    /// Sheet that was read (workbooks only).
    pub sheet: Option<String>,
    /// Rows of cells, row 0 is the first line of the file or sheet.
    pub cells: Vec<Vec<String>>,
}

/// One data row below the header.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    /// 1-based line in the source.
    pub line: usize,
    pub cells: Vec<String>,
}

impl RawRow {
    /// Cell at `col`, empty when the row is shorter.
    pub fn get(&self, col: usize) -> &str {
        self.cells.get(col).map(String::as_str).unwrap_or("")
    }
}

/// Header plus data rows.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub headers: Vec<String>,
    /// 0-based index of the header row within the grid.
    pub header_index: usize,
    pub rows: Vec<RawRow>,
}

/// Detect the encoding of raw bytes.
///
/// Valid UTF-8 wins outright, then Shift_JIS when it decodes cleanly and
/// yields kana; chardet guesses for everything else. Short Japanese samples
/// are otherwise often taken for a Western charset.
pub fn detect_encoding(bytes: &[u8]) -> String {
    if std::str::from_utf8(bytes).is_ok() {
        return "utf-8".to_string();
    }
    if looks_like_shift_jis(bytes) {
        return "shift_jis".to_string();
    }
    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "" => "utf-8".to_string(),
        "shift_jis" | "sjis" | "cp932" | "windows-31j" => "shift_jis".to_string(),
        "euc-jp" => "euc-jp".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        other => other.to_string(),
    }
}

/// Kana only come out of 0x82/0x83 lead bytes, which Western text and
/// EUC-JP practically never contain.
fn looks_like_shift_jis(bytes: &[u8]) -> bool {
    encoding_rs::SHIFT_JIS
        .decode_without_bom_handling_and_without_replacement(bytes)
        .is_some_and(|text| text.chars().any(|c| ('\u{3040}'..='\u{30FF}').contains(&c)))
}

/// Decode bytes to string using the specified encoding
pub fn decode_content(bytes: &[u8], encoding: &str) -> SheetResult<String> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => Ok(String::from_utf8_lossy(bytes).to_string()),
        "shift_jis" => Ok(encoding_rs::SHIFT_JIS.decode(bytes).0.to_string()),
        "euc-jp" => Ok(encoding_rs::EUC_JP.decode(bytes).0.to_string()),
        "iso-8859-1" | "latin-1" | "latin1" => Ok(encoding_rs::ISO_8859_15.decode(bytes).0.to_string()),
        "windows-1252" | "cp1252" => Ok(encoding_rs::WINDOWS_1252.decode(bytes).0.to_string()),
        label => match encoding_rs::Encoding::for_label(label.as_bytes()) {
            Some(enc) => Ok(enc.decode(bytes).0.to_string()),
            None => Err(SheetError::EncodingError(format!("unknown encoding '{}'", label))),
        },
    }
}

/// Detect the delimiter by counting occurrences per line.
///
/// Looks at the first 20 lines and keeps the separator with the highest
/// count on any single line, so a title block above the header does not
/// hide it.
pub fn detect_delimiter(content: &str) -> char {
    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for line in content.lines().take(20) {
        for &sep in &separators {
            let count = line.matches(sep).count();
            if count > best_count {
                best_count = count;
                best_sep = sep;
            }
        }
    }

    best_sep
}

/// Parse CSV text into a grid. Ragged rows are kept as they are.
pub fn parse_csv_grid(content: &str, delimiter: char) -> SheetResult<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter as u8)
        .from_reader(content.as_bytes());

    let mut cells = Vec::new();
    for record in reader.records() {
        let record = record?;
        cells.push(record.iter().map(|v| v.trim().to_string()).collect());
    }
    Ok(cells)
}

/// Read CSV bytes with encoding and delimiter auto-detection.
pub fn read_csv_bytes(bytes: &[u8]) -> SheetResult<Grid> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;
    let delimiter = detect_delimiter(&content);
    let cells = parse_csv_grid(&content, delimiter)?;

    Ok(Grid {
        format: TableFormat::Csv,
        encoding: Some(encoding),
        delimiter: Some(delimiter),
        sheet: None,
        cells,
    })
}

/// Read a CSV file or workbook, chosen by extension.
pub fn read_table_file(path: &Path, options: &ConvertOptions) -> SheetResult<Grid> {
    match TableFormat::from_path(path) {
        Some(TableFormat::Csv) => read_csv_bytes(&std::fs::read(path)?),
        Some(TableFormat::Workbook) => workbook::read_workbook_file(path, options.sheet_name.as_deref()),
        None => Err(SheetError::UnsupportedFormat(path.display().to_string())),
    }
}

/// Same as [`read_table_file`] for uploaded bytes; `file_name` picks the format.
pub fn read_table_bytes(file_name: &str, bytes: &[u8], options: &ConvertOptions) -> SheetResult<Grid> {
    match TableFormat::from_path(Path::new(file_name)) {
        Some(TableFormat::Csv) => read_csv_bytes(bytes),
        Some(TableFormat::Workbook) => workbook::read_workbook_bytes(bytes, options.sheet_name.as_deref()),
        None => Err(SheetError::UnsupportedFormat(file_name.to_string())),
    }
}

/// Find the header row and split the grid.
///
/// An explicit `header_row` is used as is. Otherwise the first row within
/// `header_scan_rows` holding both an item and a serial header is taken.
/// Fully blank data rows are dropped.
pub fn locate_header(grid: &Grid, options: &ConvertOptions) -> SheetResult<RawTable> {
    if grid.cells.iter().all(|row| row.iter().all(|c| c.is_empty())) {
        return Err(SheetError::EmptyTable);
    }

    let header_index = match options.header_row {
        Some(index) if index < grid.cells.len() => index,
        Some(_) => return Err(SheetError::HeaderNotFound(grid.cells.len())),
        None => find_header_row(grid, options)?,
    };

    let headers: Vec<String> = grid.cells[header_index].clone();
    let rows = grid.cells[header_index + 1..]
        .iter()
        .enumerate()
        .filter(|(_, cells)| cells.iter().any(|c| !c.is_empty()))
        .map(|(offset, cells)| RawRow {
            line: header_index + offset + 2,
            cells: cells.clone(),
        })
        .collect();

    Ok(RawTable {
        headers,
        header_index,
        rows,
    })
}

fn find_header_row(grid: &Grid, options: &ConvertOptions) -> SheetResult<usize> {
    let item_names: Vec<String> = options.columns.item.names.iter().map(|n| normalize_header(n)).collect();
    let serial_names: Vec<String> = options.columns.serial.names.iter().map(|n| normalize_header(n)).collect();

    grid.cells
        .iter()
        .take(options.header_scan_rows)
        .position(|row| {
            let normalized: Vec<String> = row.iter().map(|c| normalize_header(c)).collect();
            normalized.iter().any(|c| item_names.contains(c)) && normalized.iter().any(|c| serial_names.contains(c))
        })
        .ok_or(SheetError::HeaderNotFound(options.header_scan_rows))
}
