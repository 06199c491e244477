//! Split unresolved part groups between `Dm` and `De`.
//!
//! Groups are ranked by mass, heaviest first (stable, so equal masses keep
//! encounter order). The first `n / 2` go to `Dm`, the rest to `De`; with an
//! odd count `De` gets the extra group.

use crate::models::Category;

/// Where each unresolved group ended up.
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation<T> {
    /// Heavier half.
    pub dm: Vec<T>,
    /// Lighter half, middle element included.
    pub de: Vec<T>,
}

impl<T> Allocation<T> {
    /// Iterate `(category, entry)` pairs, `Dm` first.
    pub fn assignments(&self) -> impl Iterator<Item = (Category, &T)> + '_ {
        self.dm
            .iter()
            .map(|g| (Category::Dm, g))
            .chain(self.de.iter().map(|g| (Category::De, g)))
    }
}

/// Allocate unresolved groups given a mass accessor.
pub fn allocate_unresolved<T, F>(mut groups: Vec<T>, mass: F) -> Allocation<T>
where
    F: Fn(&T) -> f64,
{
    // sort_by is stable
    groups.sort_by(|a, b| mass(b).total_cmp(&mass(a)));

    let half = groups.len() / 2;
    let de = groups.split_off(half);

    Allocation { dm: groups, de }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_five_groups_split_two_three() {
        let alloc = allocate_unresolved(vec![40.0, 80.0, 10.0, 60.0, 20.0], |m: &f64| *m);

        assert_eq!(alloc.dm, vec![80.0, 60.0]);
        assert_eq!(alloc.de, vec![40.0, 20.0, 10.0]);
    }

    #[test]
    fn test_single_group_goes_to_de() {
        let alloc = allocate_unresolved(vec![75.0], |m: &f64| *m);

        assert!(alloc.dm.is_empty());
        assert_eq!(alloc.de, vec![75.0]);
    }

    #[test]
    fn test_empty_input() {
        let alloc = allocate_unresolved(Vec::<f64>::new(), |m| *m);
        assert!(alloc.dm.is_empty());
        assert!(alloc.de.is_empty());
    }

    #[test]
    fn test_ties_keep_encounter_order() {
        let groups = vec![("a", 100.0), ("b", 100.0), ("c", 100.0), ("d", 100.0)];
        let alloc = allocate_unresolved(groups, |g| g.1);

        let dm: Vec<&str> = alloc.dm.iter().map(|g| g.0).collect();
        let de: Vec<&str> = alloc.de.iter().map(|g| g.0).collect();
        assert_eq!(dm, vec!["a", "b"]);
        assert_eq!(de, vec!["c", "d"]);
    }

    #[test]
    fn test_assignments_order() {
        let alloc = allocate_unresolved(vec![1.0, 2.0, 3.0], |m: &f64| *m);
        let cats: Vec<Category> = alloc.assignments().map(|(c, _)| c).collect();
        assert_eq!(cats, vec![Category::Dm, Category::De, Category::De]);
    }

    proptest! {
        #[test]
        fn prop_split_sizes_and_ranking(masses in proptest::collection::vec(50.0f64..500.0, 0..40)) {
            let n = masses.len();
            let alloc = allocate_unresolved(masses, |m: &f64| *m);

            prop_assert_eq!(alloc.dm.len(), n / 2);
            prop_assert_eq!(alloc.de.len(), n - n / 2);

            let dm_min = alloc.dm.iter().cloned().fold(f64::INFINITY, f64::min);
            let de_max = alloc.de.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            if !alloc.dm.is_empty() && !alloc.de.is_empty() {
                prop_assert!(dm_min >= de_max);
            }
        }
    }
}
