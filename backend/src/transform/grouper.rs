//! Group BOM rows into items, serials and part groups.
//!
//! A physical part often appears on several rows (one per usage site). All
//! rows sharing `(item, serial, parts)` collapse into one [`PartGroup`] whose
//! mass is the sum of `usage × unit weight` over those rows.
//!
//! # Architecture
//!
//! ```text
//! BOM rows (flat)                         →  ItemGroup "3"
//! ┌──────────────────────────────────┐       ├─ SerialGroup "10A01"
//! │ ITEM 3, SERIAL 10A01, PARTS 001  │       │   ├─ PartGroup 001 (2 rows)
//! │ ITEM 3, SERIAL 10A01, PARTS 001  │  →    │   └─ PartGroup 002 (1 row)
//! │ ITEM 3, SERIAL 10A01, PARTS 002  │       └─ SerialGroup "11B01"
//! │ ITEM 3, SERIAL 11B01, PARTS 001  │           └─ PartGroup 001 (1 row)
//! └──────────────────────────────────┘
//! ```
//!
//! Every level keeps first-occurrence order. Rows without a serial or parts
//! id are set aside as skipped; they are never classified.

use std::collections::HashMap;

use crate::models::BomRow;

/// All rows for one distinct part within one serial.
#[derive(Debug, Clone)]
pub struct PartGroup<'a> {
    pub item_id: String,
    pub serial_id: String,
    pub parts_id: String,
    /// Source rows in file order. The first one is the representative row.
    pub rows: Vec<&'a BomRow>,
    /// Σ usage × unit weight over `rows`.
    pub total_mass: f64,
}

impl<'a> PartGroup<'a> {
    /// Build a group from its rows, summing their masses.
    pub fn new(
        item_id: impl Into<String>,
        serial_id: impl Into<String>,
        parts_id: impl Into<String>,
        rows: Vec<&'a BomRow>,
    ) -> Self {
        let total_mass = rows.iter().map(|r| r.mass()).sum();
        Self {
            item_id: item_id.into(),
            serial_id: serial_id.into(),
            parts_id: parts_id.into(),
            rows,
            total_mass,
        }
    }

    /// Row used for all text-field lookups.
    pub fn representative(&self) -> Option<&'a BomRow> {
        self.rows.first().copied()
    }
}

/// All part groups sharing an item and a serial.
#[derive(Debug, Clone)]
pub struct SerialGroup<'a> {
    pub serial_id: String,
    pub parts: Vec<PartGroup<'a>>,
}

/// Everything read for one top-level item.
#[derive(Debug, Clone)]
pub struct ItemGroup<'a> {
    pub item_id: String,
    /// Every row of the item in file order, skipped ones included.
    pub rows: Vec<&'a BomRow>,
    pub serials: Vec<SerialGroup<'a>>,
    /// Rows without serial or parts id.
    pub skipped: Vec<&'a BomRow>,
}

impl<'a> ItemGroup<'a> {
    /// First row of the item in file order.
    pub fn first_row(&self) -> Option<&'a BomRow> {
        self.rows.first().copied()
    }

    /// Iterate `(serial, part group)` pairs in order.
    pub fn part_groups(&self) -> impl Iterator<Item = (&SerialGroup<'a>, &PartGroup<'a>)> + '_ {
        self.serials
            .iter()
            .flat_map(|serial| serial.parts.iter().map(move |part| (serial, part)))
    }

    /// Number of part groups across all serials.
    pub fn part_group_count(&self) -> usize {
        self.serials.iter().map(|s| s.parts.len()).sum()
    }
}

/// Partition rows into items, serials and part groups.
///
/// Rows with an empty `item_id` are dropped. Output order is first occurrence
/// of each key at every level.
pub fn group_items(rows: &[BomRow]) -> Vec<ItemGroup<'_>> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut builders: Vec<ItemBuilder<'_>> = Vec::new();

    for row in rows {
        if row.item_id.is_empty() {
            continue;
        }
        let pos = *index.entry(row.item_id.as_str()).or_insert_with(|| {
            builders.push(ItemBuilder::new(&row.item_id));
            builders.len() - 1
        });
        builders[pos].add_row(row);
    }

    builders.into_iter().map(ItemBuilder::build).collect()
}

/// Builder for accumulating one item's rows while grouping.
struct ItemBuilder<'a> {
    item_id: String,
    rows: Vec<&'a BomRow>,
    skipped: Vec<&'a BomRow>,
    serial_index: HashMap<&'a str, usize>,
    serials: Vec<SerialBuilder<'a>>,
}

struct SerialBuilder<'a> {
    serial_id: &'a str,
    parts_index: HashMap<&'a str, usize>,
    parts: Vec<(&'a str, Vec<&'a BomRow>)>,
}

impl<'a> ItemBuilder<'a> {
    fn new(item_id: &str) -> Self {
        Self {
            item_id: item_id.to_string(),
            rows: Vec::new(),
            skipped: Vec::new(),
            serial_index: HashMap::new(),
            serials: Vec::new(),
        }
    }

    fn add_row(&mut self, row: &'a BomRow) {
        self.rows.push(row);

        if row.serial_id.is_empty() || row.parts_id.is_empty() {
            self.skipped.push(row);
            return;
        }

        let serials = &mut self.serials;
        let s = *self.serial_index.entry(row.serial_id.as_str()).or_insert_with(|| {
            serials.push(SerialBuilder {
                serial_id: row.serial_id.as_str(),
                parts_index: HashMap::new(),
                parts: Vec::new(),
            });
            serials.len() - 1
        });

        let serial = &mut self.serials[s];
        let parts = &mut serial.parts;
        let p = *serial.parts_index.entry(row.parts_id.as_str()).or_insert_with(|| {
            parts.push((row.parts_id.as_str(), Vec::new()));
            parts.len() - 1
        });
        serial.parts[p].1.push(row);
    }

    fn build(self) -> ItemGroup<'a> {
        let item_id = self.item_id;
        let serials = self
            .serials
            .into_iter()
            .map(|serial| SerialGroup {
                serial_id: serial.serial_id.to_string(),
                parts: serial
                    .parts
                    .into_iter()
                    .map(|(parts_id, rows)| {
                        PartGroup::new(item_id.clone(), serial.serial_id, parts_id, rows)
                    })
                    .collect(),
            })
            .collect();

        ItemGroup {
            item_id,
            rows: self.rows,
            serials,
            skipped: self.skipped,
        }
    }
}
