//! Per-item totals.
//!
//! Takes the final `(category, mass)` of every non-excluded part group of an
//! item and produces its [`ItemSummary`]. Accumulation is done at full
//! precision; masses are rounded to two decimals only once all groups are in.

use crate::error::{AggregateError, AggregateResult};
use crate::models::{Category, CategoryTable, ItemSummary};
use crate::transform::coerce::{round2, truncate_chars};
use crate::transform::grouper::ItemGroup;

/// Longest item name kept, in characters.
pub const ITEM_NAME_MAX_CHARS: usize = 50;

/// Order identification copied onto every summary row.
#[derive(Debug, Clone, Copy)]
pub struct OrderRef<'a> {
    pub name: &'a str,
    pub number: &'a str,
}

/// Display name of an item: the parts name on its first row, or `Item {id}`.
pub fn item_name(item: &ItemGroup<'_>) -> String {
    item.first_row()
        .map(|row| row.parts_name.trim())
        .filter(|name| !name.is_empty())
        .map(|name| truncate_chars(name, ITEM_NAME_MAX_CHARS))
        .unwrap_or_else(|| format!("Item {}", item.item_id))
}

/// Sum `(category, mass)` assignments into a table, unrounded.
pub fn accumulate<I>(assignments: I) -> CategoryTable
where
    I: IntoIterator<Item = (Category, f64)>,
{
    let mut table = CategoryTable::default();
    for (category, mass) in assignments {
        table.get_mut(category).add(mass);
    }
    table
}

/// Build the summary row of one item.
pub fn summarize<I>(item: &ItemGroup<'_>, assignments: I, order: OrderRef<'_>) -> AggregateResult<ItemSummary>
where
    I: IntoIterator<Item = (Category, f64)>,
{
    if item.rows.is_empty() {
        return Err(AggregateError::EmptyItem(item.item_id.clone()));
    }

    let mut categories = accumulate(assignments);

    for category in Category::ALL {
        let totals = categories.get_mut(category);
        if !totals.mass.is_finite() {
            return Err(AggregateError::NonFiniteTotal {
                item: item.item_id.clone(),
                category: category.code().to_string(),
            });
        }
        totals.mass = round2(totals.mass);
    }

    Ok(ItemSummary {
        order_name: order.name.to_string(),
        order_number: order.number.to_string(),
        item_id: item.item_id.clone(),
        item_name: item_name(item),
        categories,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BomRow;
    use crate::transform::grouper::group_items;
    use proptest::prelude::*;

    const ORDER: OrderRef<'static> = OrderRef { name: "TNPR", number: "1021K457" };

    fn row(item: &str, name: &str) -> BomRow {
        BomRow {
            item_id: item.into(),
            serial_id: "S".into(),
            parts_id: "P".into(),
            parts_name: name.into(),
            usage_quantity: 1.0,
            unit_weight: 1.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_item_name_from_first_row() {
        let rows = vec![row("3", "  MAIN FRAME  "), row("3", "OTHER")];
        let items = group_items(&rows);
        assert_eq!(item_name(&items[0]), "MAIN FRAME");
    }

    #[test]
    fn test_item_name_fallback() {
        let rows = vec![row("12", "   ")];
        let items = group_items(&rows);
        assert_eq!(item_name(&items[0]), "Item 12");
    }

    #[test]
    fn test_item_name_truncated_by_chars() {
        let long = "架".repeat(60);
        let rows = vec![row("1", &long)];
        let items = group_items(&rows);
        assert_eq!(item_name(&items[0]).chars().count(), ITEM_NAME_MAX_CHARS);
    }

    #[test]
    fn test_summarize_totals_and_rounding() {
        let rows = vec![row("1", "FRAME")];
        let items = group_items(&rows);
        let assignments = vec![
            (Category::Ds, 3500.0),
            (Category::Pd, 10.004),
            (Category::Pd, 20.003),
            (Category::Dm, 80.0),
        ];

        let summary = summarize(&items[0], assignments, ORDER).unwrap();

        assert_eq!(summary.order_name, "TNPR");
        assert_eq!(summary.order_number, "1021K457");
        assert_eq!(summary.item_id, "1");
        assert_eq!(summary.item_name, "FRAME");
        assert_eq!(summary.totals(Category::Ds).count, 1);
        assert_eq!(summary.totals(Category::Pd).count, 2);
        assert_eq!(summary.totals(Category::Pd).mass, 30.01);
        assert_eq!(summary.totals(Category::De).count, 0);
        assert_eq!(summary.totals(Category::De).mass, 0.0);
        assert_eq!(summary.categories.total_count(), 4);
    }

    #[test]
    fn test_summarize_non_finite_total() {
        let rows = vec![row("1", "FRAME")];
        let items = group_items(&rows);

        let err = summarize(&items[0], vec![(Category::D, f64::MAX), (Category::D, f64::MAX)], ORDER).unwrap_err();

        assert_eq!(
            err,
            AggregateError::NonFiniteTotal { item: "1".into(), category: "d".into() }
        );
    }

    #[test]
    fn test_summarize_empty_item() {
        let item = ItemGroup {
            item_id: "9".into(),
            rows: vec![],
            serials: vec![],
            skipped: vec![],
        };
        assert_eq!(
            summarize(&item, Vec::new(), ORDER).unwrap_err(),
            AggregateError::EmptyItem("9".into())
        );
    }

    proptest! {
        /// Counts add up and rounded masses stay within rounding of the raw sum.
        #[test]
        fn prop_totals_match_inputs(
            entries in proptest::collection::vec((0usize..5, 0.0f64..5000.0), 0..30),
        ) {
            let rows = vec![row("1", "X")];
            let items = group_items(&rows);
            let assignments: Vec<(Category, f64)> =
                entries.iter().map(|(i, m)| (Category::ALL[*i], *m)).collect();
            let raw_total: f64 = entries.iter().map(|(_, m)| m).sum();

            let summary = summarize(&items[0], assignments, ORDER).unwrap();

            prop_assert_eq!(summary.categories.total_count(), entries.len());
            prop_assert!((summary.categories.total_mass() - raw_total).abs() <= 0.01 * 5.0);
        }
    }
}
