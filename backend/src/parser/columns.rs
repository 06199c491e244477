//! Map header cells to BOM fields and build typed rows.
//!
//! Each field is looked up by header name first and then by a fixed column
//! position taken from the standard assembly parts list layout. A position is
//! only used when its header is not the name of some other field. `ITEM`,
//! `SERIAL` and `PARTS` are required; every other field degrades to an empty
//! string or `0.0` when it cannot be found.

use serde::{Deserialize, Serialize};

use super::{RawRow, RawTable};
use crate::error::ColumnError;
use crate::models::BomRow;
use crate::transform::coerce::{normalize_key, number_or_zero};

/// How to find one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRule {
    /// Accepted header names (compared after [`normalize_header`]).
    #[serde(default)]
    pub names: Vec<String>,
    /// 0-based fallback position.
    #[serde(default)]
    pub position: Option<usize>,
}

impl ColumnRule {
    fn new(names: &[&str], position: Option<usize>) -> Self {
        Self {
            names: names.iter().map(|n| n.to_string()).collect(),
            position,
        }
    }

    /// Whether a header cell carries one of this rule's names.
    pub fn matches(&self, header: &str) -> bool {
        let header = normalize_header(header);
        !header.is_empty() && self.names.iter().any(|n| normalize_header(n) == header)
    }

    /// Resolve against a header row.
    ///
    /// `named[i]` marks header cells that belong to some field by name; the
    /// positional fallback never lands on one of those.
    pub fn resolve(&self, headers: &[String], named: &[bool]) -> Option<usize> {
        headers
            .iter()
            .position(|h| self.matches(h))
            .or_else(|| self.position.filter(|&p| !named.get(p).copied().unwrap_or(false)))
    }
}

/// Column rules for every BOM field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnSpec {
    pub item: ColumnRule,
    pub serial: ColumnRule,
    pub parts: ColumnRule,
    pub parent_assembly: ColumnRule,
    pub parts_name: ColumnRule,
    pub size: ColumnRule,
    pub usage: ColumnRule,
    pub material: ColumnRule,
    pub supply: ColumnRule,
    pub summary: ColumnRule,
    pub unit_weight: ColumnRule,
}

impl Default for ColumnSpec {
    fn default() -> Self {
        Self {
            item: ColumnRule::new(&["ITEM"], None),
            serial: ColumnRule::new(&["SERIAL"], None),
            parts: ColumnRule::new(&["PARTS"], Some(3)),
            parent_assembly: ColumnRule::new(&["PARENT ASSY NO"], None),
            parts_name: ColumnRule::new(&["NAME OF PARTS"], Some(5)),
            size: ColumnRule::new(&["SIZE"], Some(6)),
            usage: ColumnRule::new(&["使用"], Some(7)),
            material: ColumnRule::new(&["材質", "MATERIAL"], Some(9)),
            supply: ColumnRule::new(&["SUPPLY"], Some(13)),
            summary: ColumnRule::new(&["SUMMARY"], Some(14)),
            unit_weight: ColumnRule::new(&["単重", "UNIT WEIGHT"], Some(22)),
        }
    }
}

impl ColumnSpec {
    /// Every rule, required fields first.
    pub fn rules(&self) -> [&ColumnRule; 11] {
        [
            &self.item,
            &self.serial,
            &self.parts,
            &self.parent_assembly,
            &self.parts_name,
            &self.size,
            &self.usage,
            &self.material,
            &self.supply,
            &self.summary,
            &self.unit_weight,
        ]
    }

    /// Mark the header cells some rule claims by name.
    pub fn named_columns(&self, headers: &[String]) -> Vec<bool> {
        let rules = self.rules();
        headers
            .iter()
            .map(|h| rules.iter().any(|rule| rule.matches(h)))
            .collect()
    }
}

/// Resolved column positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub item: usize,
    pub serial: usize,
    pub parts: usize,
    pub parent_assembly: Option<usize>,
    pub parts_name: Option<usize>,
    pub size: Option<usize>,
    pub usage: Option<usize>,
    pub material: Option<usize>,
    pub supply: Option<usize>,
    pub summary: Option<usize>,
    pub unit_weight: Option<usize>,
}

/// Upper-case and collapse whitespace (headers often contain line breaks).
pub fn normalize_header(header: &str) -> String {
    header.split_whitespace().collect::<Vec<_>>().join(" ").to_uppercase()
}

impl ColumnMap {
    /// Resolve every rule against `headers`.
    ///
    /// Fails only when a required column is missing.
    pub fn resolve(headers: &[String], rules: &ColumnSpec) -> Result<Self, ColumnError> {
        let named = rules.named_columns(headers);
        let optional = |rule: &ColumnRule| rule.resolve(headers, &named);
        let required = |rule: &ColumnRule, label: &str| {
            rule.resolve(headers, &named)
                .filter(|&i| i < headers.len())
                .ok_or_else(|| ColumnError::MissingColumn(label.to_string()))
        };

        Ok(Self {
            item: required(&rules.item, "ITEM")?,
            serial: required(&rules.serial, "SERIAL")?,
            parts: required(&rules.parts, "PARTS")?,
            parent_assembly: optional(&rules.parent_assembly),
            parts_name: optional(&rules.parts_name),
            size: optional(&rules.size),
            usage: optional(&rules.usage),
            material: optional(&rules.material),
            supply: optional(&rules.supply),
            summary: optional(&rules.summary),
            unit_weight: optional(&rules.unit_weight),
        })
    }

    /// Build a typed row. Never fails: bad numbers become `0.0`.
    pub fn row(&self, raw: &RawRow) -> BomRow {
        let text = |col: Option<usize>| col.map(|c| raw.get(c).trim().to_string()).unwrap_or_default();
        let number = |col: Option<usize>| col.map(|c| number_or_zero(raw.get(c))).unwrap_or(0.0);

        BomRow {
            line: raw.line,
            item_id: normalize_key(raw.get(self.item)),
            serial_id: normalize_key(raw.get(self.serial)),
            parts_id: normalize_key(raw.get(self.parts)),
            parent_assembly_id: text(self.parent_assembly),
            parts_name: text(self.parts_name),
            material: text(self.material),
            supply_code: text(self.supply),
            summary_text: text(self.summary),
            size_text: text(self.size),
            usage_quantity: number(self.usage),
            unit_weight: number(self.unit_weight),
        }
    }
}

/// Turn a located table into typed rows.
pub fn to_bom_rows(table: &RawTable, rules: &ColumnSpec) -> Result<Vec<BomRow>, ColumnError> {
    let map = ColumnMap::resolve(&table.headers, rules)?;
    Ok(table.rows.iter().map(|raw| map.row(raw)).collect())
}
