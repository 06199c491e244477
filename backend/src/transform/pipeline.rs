//! High-level conversion API: source table in, per-item summaries out.
//!
//! ```text
//! read grid → locate header → typed rows → group → classify → allocate → aggregate
//! ```
//!
//! Only structural problems (unreadable file, header or required columns
//! missing) fail the conversion. A part group that cannot be classified is
//! counted as `d`; an item that cannot be summarised is left out. Both are
//! reported as warnings and counted in [`ConversionStats`].
//!
//! # Example
//!
//! ```rust,ignore
//! use bomsummary::{convert_file, ConvertOptions};
//! use std::path::Path;
//!
//! let result = convert_file(Path::new("parts.xlsx"), &ConvertOptions::default())?;
//! for summary in &result.summaries {
//!     println!("{} {}", summary.item_id, summary.categories.total_count());
//! }
//! ```

use serde::Serialize;
use std::path::Path;

use super::aggregator::{summarize, OrderRef};
use super::allocator::allocate_unresolved;
use super::classifier::{classify, Outcome, Rule};
use super::grouper::{group_items, ItemGroup};
use crate::api::logs::{log_info, log_info_indent, log_success, log_warning, log_warning_indent};
use crate::config::ConvertOptions;
use crate::error::{AggregateResult, PipelineError, PipelineResult};
use crate::models::{BomRow, Category, CategoryTable, ItemSummary};
use crate::parser::columns::to_bom_rows;
use crate::parser::{locate_header, read_table_bytes, read_table_file, Grid, TableFormat};
use crate::transform::coerce::round2;

/// Where the rows came from.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceInfo {
    pub format: TableFormat,
    pub encoding: Option<String>,
    pub delimiter: Option<String>,
    pub sheet: Option<String>,
    /// 0-based header row within the sheet.
    pub header_row: usize,
    pub headers: Vec<String>,
}

/// Typed rows plus their origin.
#[derive(Debug, Clone)]
pub struct LoadedRows {
    pub rows: Vec<BomRow>,
    pub source: SourceInfo,
}

/// Counters for one conversion.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionStats {
    /// Data rows below the header.
    pub rows_read: usize,
    /// Rows without item, serial or parts id.
    pub rows_skipped: usize,
    pub items: usize,
    pub part_groups: usize,
    pub excluded: usize,
    /// Groups no rule placed (later split into Dm/De).
    pub unresolved: usize,
    /// Part groups and mass per final category over all emitted items.
    pub totals: CategoryTable,
    /// Groups that failed classification and were counted as `d`.
    pub group_failures: usize,
    /// Items left out of the output.
    pub item_failures: usize,
}

/// How one part group was placed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDecision {
    pub item_id: String,
    pub serial_id: String,
    pub parts_id: String,
    /// Source line of the representative row.
    pub line: usize,
    pub rows: usize,
    pub mass: f64,
    /// Procedure step that decided, `None` on failure.
    pub rule: Option<Rule>,
    pub step: Option<u8>,
    /// Final category; `None` when excluded.
    pub category: Option<Category>,
    pub excluded: bool,
    /// Placed by the Dm/De split.
    pub allocated: bool,
    pub failure: Option<String>,
}

/// Output of a conversion.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResult {
    /// One summary per item, first-occurrence order.
    pub summaries: Vec<ItemSummary>,
    pub stats: ConversionStats,
    /// Per-group decisions (only filled with `explain`).
    pub decisions: Vec<GroupDecision>,
    /// `None` when converting in-memory rows.
    pub source: Option<SourceInfo>,
}

/// Read and convert a CSV or workbook file.
pub fn convert_file(path: &Path, options: &ConvertOptions) -> PipelineResult<ConversionResult> {
    let loaded = load_file(path, options)?;
    Ok(convert_loaded(loaded, options))
}

/// Read and convert uploaded bytes; `file_name` picks the format.
pub fn convert_bytes(file_name: &str, bytes: &[u8], options: &ConvertOptions) -> PipelineResult<ConversionResult> {
    let loaded = load_bytes(file_name, bytes, options)?;
    Ok(convert_loaded(loaded, options))
}

/// Read typed rows from a file without classifying them.
pub fn load_file(path: &Path, options: &ConvertOptions) -> PipelineResult<LoadedRows> {
    log_info(format!("📖 Reading {}...", path.display()));
    let grid = read_table_file(path, options)?;
    load_grid(grid, options)
}

/// Read typed rows from uploaded bytes.
pub fn load_bytes(file_name: &str, bytes: &[u8], options: &ConvertOptions) -> PipelineResult<LoadedRows> {
    log_info(format!("📖 Reading {} ({} bytes)...", file_name, bytes.len()));
    let grid = read_table_bytes(file_name, bytes, options)?;
    load_grid(grid, options)
}

fn load_grid(grid: Grid, options: &ConvertOptions) -> PipelineResult<LoadedRows> {
    if let Some(ref encoding) = grid.encoding {
        log_success(format!("Detected encoding: {}", encoding));
    }
    if let Some(delimiter) = grid.delimiter {
        log_success(format!("Detected separator: '{}'", format_delimiter(delimiter)));
    }
    if let Some(ref sheet) = grid.sheet {
        log_success(format!("Sheet: {}", sheet));
    }

    let table = locate_header(&grid, options)?;
    log_success(format!("Header on row {}, {} data rows", table.header_index + 1, table.rows.len()));

    let rows = to_bom_rows(&table, &options.columns)?;
    if rows.is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    Ok(LoadedRows {
        rows,
        source: SourceInfo {
            format: grid.format,
            encoding: grid.encoding,
            delimiter: grid.delimiter.map(|d| format_delimiter(d).to_string()),
            sheet: grid.sheet,
            header_row: table.header_index,
            headers: table.headers,
        },
    })
}

fn convert_loaded(loaded: LoadedRows, options: &ConvertOptions) -> ConversionResult {
    let mut result = convert_rows(&loaded.rows, options);
    result.source = Some(loaded.source);
    result
}

/// Convert rows already in memory.
///
/// Never fails: group and item problems are recovered and counted.
pub fn convert_rows(rows: &[BomRow], options: &ConvertOptions) -> ConversionResult {
    let order = OrderRef {
        name: &options.order_name,
        number: &options.order_number,
    };
    let items = group_items(rows);

    let mut stats = ConversionStats {
        rows_read: rows.len(),
        rows_skipped: rows.iter().filter(|r| r.item_id.is_empty()).count(),
        items: items.len(),
        ..Default::default()
    };
    let mut summaries = Vec::with_capacity(items.len());
    let mut decisions = Vec::new();

    log_info(format!("🔄 Classifying {} items...", items.len()));

    for item in &items {
        stats.rows_skipped += item.skipped.len();
        stats.part_groups += item.part_group_count();

        let (summary, item_decisions) = convert_item(item, order);

        for decision in &item_decisions {
            if decision.failure.is_some() {
                stats.group_failures += 1;
            }
            if decision.excluded {
                stats.excluded += 1;
            }
            if decision.allocated {
                stats.unresolved += 1;
            }
        }

        match summary {
            Ok(summary) => {
                for (category, totals) in summary.categories.iter() {
                    let overall = stats.totals.get_mut(category);
                    overall.count += totals.count;
                    overall.mass = round2(overall.mass + totals.mass);
                }
                log_info_indent(
                    format!(
                        "Item {}: {} groups, {:.2} kg",
                        summary.item_id,
                        summary.categories.total_count(),
                        summary.categories.total_mass()
                    ),
                    1,
                );
                summaries.push(summary);
            }
            Err(e) => {
                stats.item_failures += 1;
                log_warning(format!("Item {} skipped: {}", item.item_id, e));
            }
        }

        if options.explain {
            decisions.extend(item_decisions);
        }
    }

    log_success(format!(
        "{} items, {} part groups ({} excluded, {} split Dm/De)",
        summaries.len(),
        stats.part_groups,
        stats.excluded,
        stats.unresolved
    ));
    if stats.rows_skipped > 0 {
        log_warning(format!("{} rows without item/serial/parts id skipped", stats.rows_skipped));
    }
    if stats.group_failures > 0 {
        log_warning(format!("{} part groups could not be classified (counted as d)", stats.group_failures));
    }

    ConversionResult {
        summaries,
        stats,
        decisions,
        source: None,
    }
}

/// Classify, allocate and aggregate one item.
fn convert_item(item: &ItemGroup<'_>, order: OrderRef<'_>) -> (AggregateResult<ItemSummary>, Vec<GroupDecision>) {
    let mut decisions = Vec::with_capacity(item.part_group_count());
    let mut unresolved: Vec<(usize, f64)> = Vec::new();

    for (serial, group) in item.part_groups() {
        let mut record = GroupDecision {
            item_id: item.item_id.clone(),
            serial_id: group.serial_id.clone(),
            parts_id: group.parts_id.clone(),
            line: group.representative().map(|r| r.line).unwrap_or(0),
            rows: group.rows.len(),
            mass: group.total_mass,
            rule: None,
            step: None,
            category: None,
            excluded: false,
            allocated: false,
            failure: None,
        };

        match classify(group, serial) {
            Ok(decision) => {
                record.rule = Some(decision.rule);
                record.step = Some(decision.rule.step());
                match decision.outcome {
                    Outcome::Category(category) => record.category = Some(category),
                    Outcome::Excluded => record.excluded = true,
                    Outcome::Unresolved => {
                        record.allocated = true;
                        unresolved.push((decisions.len(), group.total_mass));
                    }
                }
            }
            Err(e) => {
                log_warning_indent(format!("Item {}: {} → d", item.item_id, e), 1);
                if !record.mass.is_finite() {
                    record.mass = 0.0;
                }
                record.category = Some(Category::D);
                record.failure = Some(e.to_string());
            }
        }

        decisions.push(record);
    }

    let allocation = allocate_unresolved(unresolved, |(_, mass)| *mass);
    for (category, (index, _)) in allocation.assignments() {
        decisions[*index].category = Some(category);
    }

    let assignments = decisions
        .iter()
        .filter_map(|d| d.category.map(|c| (c, d.mass)));
    let summary = summarize(item, assignments, order);

    (summary, decisions)
}

/// Format delimiter for display
fn format_delimiter(d: char) -> &'static str {
    match d {
        ';' => ";",
        ',' => ",",
        '\t' => "TAB",
        '|' => "|",
        _ => "?",
    }
}
