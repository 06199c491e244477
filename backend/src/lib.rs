//! # BOM Summary - design-stage classification of bill-of-materials sheets
//!
//! Reads an assembly parts list (workbook or CSV), assigns every distinct part
//! of every item to a design-stage category and reports, per item, how many
//! parts and how much mass fall into each category.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ xlsx / CSV  │────▶│   Parser    │────▶│  Transform  │────▶│ CSV / JSON  │
//! │ (SJIS/UTF8) │     │ (header,    │     │ (group,     │     │ (per item)  │
//! │             │     │  columns)   │     │  classify)  │     │             │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Categories
//!
//! | code | meaning |
//! |------|---------|
//! | `d`  | detail design |
//! | `Ds` | design start |
//! | `Dm` | design middle |
//! | `De` | design end |
//! | `PD` | production drawing |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use bomsummary::{convert_file, write_summary_csv_file, ConvertOptions};
//! use std::path::Path;
//!
//! let options = ConvertOptions::load(None)?;
//! let result = convert_file(Path::new("parts.xlsx"), &options)?;
//! write_summary_csv_file(Path::new("summary.csv"), &result.summaries)?;
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`config`] - Conversion options (file, env, CLI)
//! - [`models`] - Rows, categories and item summaries
//! - [`parser`] - Table reading with format/encoding/header detection
//! - [`transform`] - Grouping, classification, allocation and aggregation
//! - [`writer`] - CSV/JSON output and sheet layout
//! - [`validation`] - Output schema validation
//! - [`api`] - HTTP API server and log channel

// Core modules
pub mod config;
pub mod error;
pub mod models;

// Reading
pub mod parser;

// Transformation
pub mod transform;

// Output
pub mod validation;
pub mod writer;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    AggregateError, ClassifyError, ColumnError, ConfigError, PipelineError, ServerError, SheetError, WriteError,
};

// =============================================================================
// Re-exports - Configuration & Models
// =============================================================================

pub use config::ConvertOptions;
pub use models::{BomRow, Category, CategoryTable, CategoryTotals, ItemSummary};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::columns::{to_bom_rows, ColumnMap, ColumnRule, ColumnSpec};
pub use parser::{detect_delimiter, detect_encoding, locate_header, read_table_bytes, read_table_file, RawTable};

// =============================================================================
// Re-exports - Transformation
// =============================================================================

pub use transform::{
    allocate_unresolved, classify, group_items, summarize, Allocation, Decision, ItemGroup, Outcome, PartGroup, Rule,
    SerialGroup,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{
    convert_bytes, convert_file, convert_rows, load_bytes, load_file, ConversionResult, ConversionStats,
    GroupDecision, LoadedRows, SourceInfo,
};

// =============================================================================
// Re-exports - Output
// =============================================================================

pub use validation::{validate_item_summaries, validate_item_summary};
pub use writer::{
    summaries_to_json, write_summary_csv, write_summary_csv_file, write_summary_json_file, SheetLayout,
};

// =============================================================================
// Re-exports - API
// =============================================================================

pub use api::types::{error_response, ConvertResponse, ResponseMetadata};

// Server
pub mod server {
    pub use crate::api::server::{router, start_server};
}
