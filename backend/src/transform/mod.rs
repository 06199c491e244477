//! Transformation module.
//!
//! Turns typed BOM rows into per-item category summaries:
//! - Coerce: lenient number, thickness and key parsing
//! - Grouper: rows to items, serials and part groups
//! - Classifier: design-stage category of one part group
//! - Allocator: Dm/De split of unresolved groups
//! - Aggregator: per-item totals
//! - Pipeline: the whole chain, from file or from rows

pub mod aggregator;
pub mod allocator;
pub mod classifier;
pub mod coerce;
pub mod grouper;
pub mod pipeline;

pub use aggregator::{item_name, summarize, OrderRef};
pub use allocator::{allocate_unresolved, Allocation};
pub use classifier::{classify, Decision, Outcome, Rule};
pub use grouper::{group_items, ItemGroup, PartGroup, SerialGroup};
pub use pipeline::*;
