//! Summary output.
//!
//! - CSV: two header rows (identification columns, then one super-column per
//!   category split into `部品数` and `重量`), one row per item.
//! - JSON: array of [`ItemSummary`], checked against the embedded schema.
//! - [`SheetLayout`]: cell coordinates and fills of the styled summary sheet,
//!   for renderers that reproduce it.

use serde_json::Value;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{WriteError, WriteResult};
use crate::models::{Category, ItemSummary};
use crate::validation::validate_item_summaries;

/// Identification columns, left to right.
pub const ITEM_COLUMNS: [&str; 4] = ["Order名", "Order＃", "Item＃", "Item名称"];

/// Sub-columns of every category super-column.
pub const SUB_COLUMNS: [&str; 2] = ["部品数", "重量"];

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

// =============================================================================
// CSV
// =============================================================================

/// The two header rows.
pub fn summary_header() -> [Vec<String>; 2] {
    let mut top: Vec<String> = ITEM_COLUMNS.iter().map(|c| c.to_string()).collect();
    let mut sub: Vec<String> = vec![String::new(); ITEM_COLUMNS.len()];

    for category in Category::ALL {
        top.push(category.code().to_string());
        top.push(String::new());
        sub.extend(SUB_COLUMNS.iter().map(|c| c.to_string()));
    }

    [top, sub]
}

/// One data row. Masses keep two decimals.
pub fn summary_record(summary: &ItemSummary) -> Vec<String> {
    let mut record = vec![
        summary.order_name.clone(),
        summary.order_number.clone(),
        summary.item_id.clone(),
        summary.item_name.clone(),
    ];
    for (_, totals) in summary.categories.iter() {
        record.push(totals.count.to_string());
        record.push(format!("{:.2}", totals.mass));
    }
    record
}

/// Write the CSV summary to any writer.
pub fn write_summary_csv<W: Write>(writer: W, summaries: &[ItemSummary]) -> WriteResult<()> {
    let mut csv_writer = csv::WriterBuilder::new().has_headers(false).from_writer(writer);

    for row in summary_header() {
        csv_writer.write_record(&row)?;
    }
    for summary in summaries {
        csv_writer.write_record(summary_record(summary))?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Write the CSV summary to a file, BOM-prefixed so spreadsheet tools pick
/// UTF-8 for the Japanese headers.
pub fn write_summary_csv_file(path: &Path, summaries: &[ItemSummary]) -> WriteResult<()> {
    let mut out = BufWriter::new(File::create(path)?);
    out.write_all(UTF8_BOM)?;
    write_summary_csv(&mut out, summaries)?;
    out.flush()?;
    Ok(())
}

// =============================================================================
// JSON
// =============================================================================

/// Serialize summaries and validate every record.
pub fn summaries_to_json(summaries: &[ItemSummary]) -> WriteResult<Value> {
    let records = summaries
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()?;

    validate_item_summaries(&records).map_err(|errors| WriteError::SchemaError { errors })?;

    Ok(Value::Array(records))
}

/// Write validated summaries as pretty JSON.
pub fn write_summary_json_file(path: &Path, summaries: &[ItemSummary]) -> WriteResult<()> {
    let json = summaries_to_json(summaries)?;
    let mut out = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut out, &json)?;
    out.flush()?;
    Ok(())
}

// =============================================================================
// Sheet layout
// =============================================================================

/// One category block of the styled sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryBlock {
    pub category: Category,
    /// 1-based column of `部品数`; `重量` sits two columns to the right.
    pub start_column: u32,
    /// RGB fill of the block.
    pub fill: &'static str,
}

impl CategoryBlock {
    pub fn count_column(&self) -> u32 {
        self.start_column
    }

    pub fn mass_column(&self) -> u32 {
        self.start_column + 2
    }
}

/// Coordinates of the styled summary sheet (all 1-based).
pub struct SheetLayout;

impl SheetLayout {
    /// Super-column labels.
    pub const TITLE_ROW: u32 = 1;
    /// `部品数` / `重量` labels.
    pub const SUB_HEADER_ROW: u32 = 2;
    pub const FIRST_DATA_ROW: u32 = 3;
    /// Columns per category block.
    pub const BLOCK_WIDTH: u32 = 4;
    /// Fill of the identification columns A–P.
    pub const BASE_FILL: &'static str = "FFFFFF";

    /// Identification columns and where each starts.
    pub const ITEM_FIELDS: [(&'static str, u32); 4] =
        [(ITEM_COLUMNS[0], 1), (ITEM_COLUMNS[1], 4), (ITEM_COLUMNS[2], 7), (ITEM_COLUMNS[3], 10)];

    pub const CATEGORY_BLOCKS: [CategoryBlock; 5] = [
        CategoryBlock { category: Category::D, start_column: 17, fill: "FFFFE0" },
        CategoryBlock { category: Category::Ds, start_column: 21, fill: "FFE0E0" },
        CategoryBlock { category: Category::Dm, start_column: 25, fill: "FFE5CC" },
        CategoryBlock { category: Category::De, start_column: 29, fill: "E0FFE0" },
        CategoryBlock { category: Category::Pd, start_column: 33, fill: "F0F0F0" },
    ];

    pub fn block(category: Category) -> CategoryBlock {
        Self::CATEGORY_BLOCKS[category.index()]
    }

    /// Last used column.
    pub fn last_column() -> u32 {
        Self::CATEGORY_BLOCKS[4].start_column + Self::BLOCK_WIDTH - 1
    }

    /// Sheet row of the `index`-th summary (0-based).
    pub fn data_row(index: usize) -> u32 {
        Self::FIRST_DATA_ROW + index as u32
    }
}

/// Spreadsheet column letters (`1` → `A`, `27` → `AA`).
pub fn column_letter(mut column: u32) -> String {
    let mut letters = Vec::new();
    while column > 0 {
        let rem = ((column - 1) % 26) as u8;
        letters.push((b'A' + rem) as char);
        column = (column - 1) / 26;
    }
    letters.iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CategoryTable;

    fn summary(item: &str, name: &str) -> ItemSummary {
        let mut categories = CategoryTable::default();
        categories.ds.add(3500.0);
        categories.pd.add(12.5);
        categories.pd.add(7.25);
        ItemSummary {
            order_name: "TNPR".into(),
            order_number: "1021K457".into(),
            item_id: item.into(),
            item_name: name.into(),
            categories,
        }
    }

    #[test]
    fn test_header_shape() {
        let [top, sub] = summary_header();

        assert_eq!(top.len(), 14);
        assert_eq!(sub.len(), 14);
        assert_eq!(&top[..4], &["Order名", "Order＃", "Item＃", "Item名称"]);
        assert_eq!(top[4], "d");
        assert_eq!(top[6], "Ds");
        assert_eq!(top[12], "PD");
        assert_eq!(sub[4], "部品数");
        assert_eq!(sub[5], "重量");
        assert_eq!(sub[0], "");
    }

    #[test]
    fn test_record_values() {
        let record = summary_record(&summary("3", "FRAME"));

        assert_eq!(record[2], "3");
        assert_eq!(record[4], "0");
        assert_eq!(record[5], "0.00");
        assert_eq!(record[6], "1");
        assert_eq!(record[7], "3500.00");
        assert_eq!(record[12], "2");
        assert_eq!(record[13], "19.75");
    }

    #[test]
    fn test_write_csv_quotes_commas() {
        let mut out = Vec::new();
        write_summary_csv(&mut out, &[summary("1", "FRAME, WELDED")]).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Order名,Order＃,Item＃,Item名称,d,,Ds"));
        assert!(lines[2].contains("\"FRAME, WELDED\""));
    }

    #[test]
    fn test_write_csv_file_with_bom() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.csv");

        write_summary_csv_file(&path, &[summary("1", "A"), summary("2", "B")]).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));
        let text = String::from_utf8(bytes[3..].to_vec()).unwrap();
        assert_eq!(text.lines().count(), 4);
    }

    #[test]
    fn test_json_output_validates() {
        let json = summaries_to_json(&[summary("1", "A")]).unwrap();

        assert_eq!(json[0]["itemId"], "1");
        assert_eq!(json[0]["categories"]["Ds"]["count"], 1);
        assert_eq!(json[0]["categories"]["PD"]["mass"], 19.75);
    }

    #[test]
    fn test_json_schema_rejects_empty_item_id() {
        let err = summaries_to_json(&[summary("", "A")]).unwrap_err();
        assert!(matches!(err, WriteError::SchemaError { .. }));
    }

    #[test]
    fn test_write_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");

        write_summary_json_file(&path, &[summary("1", "A")]).unwrap();

        let parsed: Vec<ItemSummary> = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed, vec![summary("1", "A")]);
    }

    #[test]
    fn test_layout_columns() {
        assert_eq!(column_letter(1), "A");
        assert_eq!(column_letter(16), "P");
        assert_eq!(column_letter(17), "Q");
        assert_eq!(column_letter(27), "AA");
        assert_eq!(column_letter(33), "AG");

        let de = SheetLayout::block(Category::De);
        assert_eq!(de.count_column(), 29);
        assert_eq!(de.mass_column(), 31);
        assert_eq!(de.fill, "E0FFE0");
        assert_eq!(SheetLayout::last_column(), 36);
        assert_eq!(SheetLayout::data_row(0), 3);
    }

    #[test]
    fn test_blocks_follow_output_order() {
        for (i, block) in SheetLayout::CATEGORY_BLOCKS.iter().enumerate() {
            assert_eq!(block.category, Category::ALL[i]);
        }
    }
}
