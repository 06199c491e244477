//! Domain models for the BOM summary pipeline.
//!
//! - [`BomRow`] - Typed view over one source row
//! - [`Category`] - Design-stage bucket assigned to a part group
//! - [`CategoryTotals`] / [`CategoryTable`] - Per-category count and mass
//! - [`ItemSummary`] - One output record per top-level item

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Source Row
// =============================================================================

/// One bill-of-materials line.
///
/// Text fields are kept as read (trimmed); absent cells are empty strings.
/// `usage_quantity` and `unit_weight` are already coerced: anything that did
/// not parse as a number is `0.0`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BomRow {
    /// 1-based line in the source table (0 when built in memory).
    #[serde(default)]
    pub line: usize,
    /// Top-level assembly key.
    pub item_id: String,
    /// Sub-assembly / part-family key.
    pub serial_id: String,
    /// Part key within a serial.
    pub parts_id: String,
    #[serde(default)]
    pub parent_assembly_id: String,
    #[serde(default)]
    pub parts_name: String,
    #[serde(default)]
    pub material: String,
    #[serde(default)]
    pub supply_code: String,
    #[serde(default)]
    pub summary_text: String,
    #[serde(default)]
    pub size_text: String,
    #[serde(default)]
    pub usage_quantity: f64,
    #[serde(default)]
    pub unit_weight: f64,
}

impl BomRow {
    /// Mass contributed by this row (`usage_quantity × unit_weight`).
    pub fn mass(&self) -> f64 {
        self.usage_quantity * self.unit_weight
    }
}

// =============================================================================
// Category
// =============================================================================

/// Design-stage category of a part group.
///
/// Declaration order is the fixed output order: `d`, `Ds`, `Dm`, `De`, `PD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    /// Detail design (`d`).
    #[serde(rename = "d")]
    D,
    /// Design start (`Ds`).
    Ds,
    /// Design middle (`Dm`).
    Dm,
    /// Design end (`De`).
    De,
    /// Production drawing (`PD`).
    #[serde(rename = "PD")]
    Pd,
}

impl Category {
    /// All categories in output order.
    pub const ALL: [Category; 5] = [Category::D, Category::Ds, Category::Dm, Category::De, Category::Pd];

    /// Short code as printed in the summary header.
    pub fn code(&self) -> &'static str {
        match self {
            Self::D => "d",
            Self::Ds => "Ds",
            Self::Dm => "Dm",
            Self::De => "De",
            Self::Pd => "PD",
        }
    }

    /// Human-readable label.
    pub fn description(&self) -> &'static str {
        match self {
            Self::D => "Detail design",
            Self::Ds => "Design start",
            Self::Dm => "Design middle",
            Self::De => "Design end",
            Self::Pd => "Production drawing",
        }
    }

    /// Position in output order (0..5).
    pub fn index(&self) -> usize {
        match self {
            Self::D => 0,
            Self::Ds => 1,
            Self::Dm => 2,
            Self::De => 3,
            Self::Pd => 4,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// =============================================================================
// Category Totals
// =============================================================================

/// Part-group count and total mass for one category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotals {
    pub count: usize,
    pub mass: f64,
}

impl CategoryTotals {
    /// Account for one more part group.
    pub fn add(&mut self, mass: f64) {
        self.count += 1;
        self.mass += mass;
    }
}

/// Totals for all five categories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryTable {
    #[serde(rename = "d")]
    pub d: CategoryTotals,
    #[serde(rename = "Ds")]
    pub ds: CategoryTotals,
    #[serde(rename = "Dm")]
    pub dm: CategoryTotals,
    #[serde(rename = "De")]
    pub de: CategoryTotals,
    #[serde(rename = "PD")]
    pub pd: CategoryTotals,
}

impl CategoryTable {
    pub fn get(&self, category: Category) -> &CategoryTotals {
        match category {
            Category::D => &self.d,
            Category::Ds => &self.ds,
            Category::Dm => &self.dm,
            Category::De => &self.de,
            Category::Pd => &self.pd,
        }
    }

    pub fn get_mut(&mut self, category: Category) -> &mut CategoryTotals {
        match category {
            Category::D => &mut self.d,
            Category::Ds => &mut self.ds,
            Category::Dm => &mut self.dm,
            Category::De => &mut self.de,
            Category::Pd => &mut self.pd,
        }
    }

    /// Iterate `(category, totals)` in output order.
    pub fn iter(&self) -> impl Iterator<Item = (Category, &CategoryTotals)> + '_ {
        Category::ALL.into_iter().map(move |c| (c, self.get(c)))
    }

    /// Sum of counts over all categories.
    pub fn total_count(&self) -> usize {
        self.iter().map(|(_, t)| t.count).sum()
    }

    /// Sum of masses over all categories.
    pub fn total_mass(&self) -> f64 {
        self.iter().map(|(_, t)| t.mass).sum()
    }
}

// =============================================================================
// Item Summary
// =============================================================================

/// One output row: per-category totals for a top-level item.
///
/// Masses are rounded to two decimals when the summary is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSummary {
    pub order_name: String,
    pub order_number: String,
    pub item_id: String,
    pub item_name: String,
    pub categories: CategoryTable,
}

impl ItemSummary {
    pub fn totals(&self, category: Category) -> &CategoryTotals {
        self.categories.get(category)
    }
}
