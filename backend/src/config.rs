//! Conversion options.
//!
//! Sources, lowest precedence first: built-in defaults, a JSON file, the
//! environment (a `.env` file is honoured through `dotenvy`), and finally
//! explicit overrides from the CLI.
//!
//! | variable | field |
//! |----------|-------|
//! | `BOMSUMMARY_ORDER_NAME` | `order_name` |
//! | `BOMSUMMARY_ORDER_NUMBER` | `order_number` |
//! | `BOMSUMMARY_SHEET` | `sheet_name` |
//! | `BOMSUMMARY_HEADER_ROW` | `header_row` |

use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

use crate::error::ConfigError;
use crate::parser::columns::ColumnSpec;

pub const DEFAULT_ORDER_NAME: &str = "TNPR";
pub const DEFAULT_ORDER_NUMBER: &str = "1021K457";
pub const DEFAULT_SHEET_NAME: &str = "組立部品リスト";
pub const DEFAULT_HEADER_SCAN_ROWS: usize = 20;

/// Options for one conversion run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    /// Emitted verbatim on every output row.
    pub order_name: String,

    /// Emitted verbatim on every output row.
    pub order_number: String,

    /// Worksheet to read. A named sheet must exist; `None` prefers
    /// [`DEFAULT_SHEET_NAME`] and falls back to the first sheet.
    pub sheet_name: Option<String>,

    /// 0-based header row. `None` scans for it.
    pub header_row: Option<usize>,

    /// How many leading rows the header scan looks at.
    pub header_scan_rows: usize,

    /// Column names and positional fallbacks.
    pub columns: ColumnSpec,

    /// Keep one decision record per part group.
    pub explain: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            order_name: DEFAULT_ORDER_NAME.to_string(),
            order_number: DEFAULT_ORDER_NUMBER.to_string(),
            sheet_name: None,
            header_row: None,
            header_scan_rows: DEFAULT_HEADER_SCAN_ROWS,
            columns: ColumnSpec::default(),
            explain: false,
        }
    }
}

impl ConvertOptions {
    /// Read options from a JSON file. Missing fields take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Defaults, then `path` if given, then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let options = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        options.with_env(|name| env::var(name).ok())
    }

    /// Apply overrides from a variable lookup.
    ///
    /// Takes the lookup as a function so tests do not touch the process
    /// environment.
    pub fn with_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("BOMSUMMARY_ORDER_NAME") {
            self.order_name = v;
        }
        if let Some(v) = lookup("BOMSUMMARY_ORDER_NUMBER") {
            self.order_number = v;
        }
        if let Some(v) = lookup("BOMSUMMARY_SHEET") {
            self.sheet_name = if v.trim().is_empty() { None } else { Some(v) };
        }
        if let Some(v) = lookup("BOMSUMMARY_HEADER_ROW") {
            let row = v.trim().parse::<usize>().map_err(|_| ConfigError::InvalidEnv {
                name: "BOMSUMMARY_HEADER_ROW".to_string(),
                value: v.clone(),
            })?;
            self.header_row = Some(row);
        }
        Ok(self)
    }
}
