//! REST API types.
//!
//! `items` carries the same records as the JSON file output, so clients can
//! reuse one parser for both.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::models::ItemSummary;
use crate::transform::pipeline::{ConversionResult, ConversionStats, SourceInfo};

/// Response sent after an upload has been converted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertResponse {
    /// Unique job identifier
    pub job_id: String,

    /// "ready", "warning" (something was recovered) or "error"
    pub status: String,

    /// One summary per item
    pub items: Vec<ItemSummary>,

    pub metadata: ResponseMetadata,
}

/// Metadata about the conversion
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    pub file_name: Option<String>,
    pub total_items: usize,
    pub stats: ConversionStats,
    pub source: Option<SourceInfo>,
    /// RFC 3339
    pub converted_at: String,
}

/// Query parameters accepted by `/api/convert`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertQuery {
    pub order_name: Option<String>,
    pub order_number: Option<String>,
    pub sheet: Option<String>,
    pub header_row: Option<usize>,
}

impl ConvertResponse {
    pub fn new(result: ConversionResult, file_name: Option<String>) -> Self {
        let recovered = result.stats.group_failures > 0 || result.stats.item_failures > 0;
        ConvertResponse {
            job_id: Uuid::new_v4().to_string(),
            status: if recovered { "warning" } else { "ready" }.to_string(),
            metadata: ResponseMetadata {
                file_name,
                total_items: result.summaries.len(),
                stats: result.stats,
                source: result.source,
                converted_at: chrono::Utc::now().to_rfc3339(),
            },
            items: result.summaries,
        }
    }
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "jobId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error,
        "items": [],
        "metadata": {
            "totalItems": 0
        }
    })
}
