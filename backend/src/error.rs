//! Error types for the BOM summary pipeline.
//!
//! One enum per layer, converted upward with `#[from]` so that `?` works
//! across boundaries:
//!
//! - [`SheetError`] - reading the source table (CSV or workbook)
//! - [`ColumnError`] - required columns missing (structural, fatal)
//! - [`ClassifyError`] - unexpected failure while classifying one part group
//! - [`AggregateError`] - unexpected failure while summarising one item
//! - [`WriteError`] - writing CSV/JSON output
//! - [`ConfigError`] - loading options from files or the environment
//! - [`PipelineError`] - top-level orchestration errors
//!
//! Only the variants wrapped by [`PipelineError`] abort a conversion.
//! [`ClassifyError`] and [`AggregateError`] are recovered inside the pipeline.

use thiserror::Error;

// =============================================================================
// Source Table Errors
// =============================================================================

/// Errors while reading the source table.
#[derive(Debug, Error)]
pub enum SheetError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to decode CSV bytes.
    #[error("Failed to decode content: {0}")]
    EncodingError(String),

    /// Malformed CSV.
    #[error("Invalid CSV format: {0}")]
    CsvError(#[from] csv::Error),

    /// Workbook could not be opened or a sheet could not be read.
    #[error("Workbook error: {0}")]
    WorkbookError(String),

    /// Requested worksheet does not exist.
    #[error("Worksheet not found: {0}")]
    SheetNotFound(String),

    /// File extension is not a supported table format.
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// Nothing to read.
    #[error("Source table is empty")]
    EmptyTable,

    /// No row within the scanned range looks like the BOM header.
    #[error("Header row not found in the first {0} rows")]
    HeaderNotFound(usize),
}

impl From<calamine::Error> for SheetError {
    fn from(err: calamine::Error) -> Self {
        SheetError::WorkbookError(err.to_string())
    }
}

// =============================================================================
// Structural Errors
// =============================================================================

/// A required column could not be located by name nor by position.
#[derive(Debug, Error)]
pub enum ColumnError {
    /// Missing required column.
    #[error("Missing required column: {0}")]
    MissingColumn(String),
}

// =============================================================================
// Classification Errors
// =============================================================================

/// Unexpected failure while classifying a single part group.
///
/// The pipeline maps these to category `d` and keeps going.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ClassifyError {
    /// Part group without any source row.
    #[error("Part group {serial}/{parts} has no rows")]
    EmptyGroup { serial: String, parts: String },

    /// Group mass overflowed or is otherwise not a finite number.
    #[error("Part group {serial}/{parts} has a non-finite mass")]
    NonFiniteMass { serial: String, parts: String },
}

// =============================================================================
// Aggregation Errors
// =============================================================================

/// Unexpected failure while summarising one item.
///
/// The pipeline drops that item's output row and keeps going.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AggregateError {
    /// Item without any source row.
    #[error("Item {0} has no rows")]
    EmptyItem(String),

    /// Accumulated category mass is not a finite number.
    #[error("Item {item}: total mass for category {category} is not finite")]
    NonFiniteTotal { item: String, category: String },
}

// =============================================================================
// Output Errors
// =============================================================================

/// Errors while writing results.
#[derive(Debug, Error)]
pub enum WriteError {
    /// IO error.
    #[error("Write IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// CSV writer error.
    #[error("CSV write error: {0}")]
    CsvError(#[from] csv::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Output failed schema validation.
    #[error("Output failed schema validation: {errors:?}")]
    SchemaError { errors: Vec<String> },
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while loading options.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("Cannot read config file: {0}")]
    IoError(#[from] std::io::Error),

    /// Config file is not valid JSON for [`crate::config::ConvertOptions`].
    #[error("Invalid config file: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Environment variable holds an unusable value.
    #[error("Invalid value for {name}: {value}")]
    InvalidEnv { name: String, value: String },
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level conversion errors.
///
/// This is the error type returned by [`crate::transform::pipeline::convert_file`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Source table error.
    #[error("Sheet error: {0}")]
    Sheet(#[from] SheetError),

    /// Structural input error.
    #[error("Column error: {0}")]
    Column(#[from] ColumnError),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Output error.
    #[error("Write error: {0}")]
    Write(#[from] WriteError),

    /// No data rows below the header.
    #[error("No rows to convert")]
    EmptyInput,
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for reading operations.
pub type SheetResult<T> = Result<T, SheetError>;

/// Result type for classification.
pub type ClassifyResult<T> = Result<T, ClassifyError>;

/// Result type for aggregation.
pub type AggregateResult<T> = Result<T, AggregateError>;

/// Result type for writing.
pub type WriteResult<T> = Result<T, WriteError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
