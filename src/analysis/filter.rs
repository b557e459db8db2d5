//! Filter engine.
//!
//! A [`FilterSelection`] is a conjunction of four membership tests: the
//! row's year, product, seller and customer must each be selected. Every
//! dimension defaults to [`Selection::AllValues`]; an explicit empty set
//! selects nothing.

use crate::models::DenormalizedSale;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// Which values of one dimension are selected.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection<T: Ord> {
    /// Every value present in the data.
    #[default]
    AllValues,
    /// Exactly these values. An empty set matches no row.
    Only(BTreeSet<T>),
}

impl<T: Ord> Selection<T> {
    /// Select exactly the given values.
    pub fn only<I: IntoIterator<Item = T>>(values: I) -> Self {
        Selection::Only(values.into_iter().collect())
    }

    /// Select nothing.
    pub fn none() -> Self {
        Selection::Only(BTreeSet::new())
    }

    /// Membership test for a present value.
    pub fn contains(&self, value: &T) -> bool {
        match self {
            Selection::AllValues => true,
            Selection::Only(values) => values.contains(value),
        }
    }

    /// Membership test for a possibly-null value. Null only passes
    /// `AllValues`.
    pub fn contains_opt(&self, value: Option<&T>) -> bool {
        match (self, value) {
            (Selection::AllValues, _) => true,
            (Selection::Only(values), Some(v)) => values.contains(v),
            (Selection::Only(_), None) => false,
        }
    }

    /// Whether this selection can match no row at all.
    pub fn is_empty(&self) -> bool {
        matches!(self, Selection::Only(values) if values.is_empty())
    }
}

impl<T: Ord> From<Option<Vec<T>>> for Selection<T> {
    /// `None` selects every value; `Some` selects exactly the listed ones.
    fn from(values: Option<Vec<T>>) -> Self {
        match values {
            Some(values) => Selection::only(values),
            None => Selection::AllValues,
        }
    }
}

/// The four active filters.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FilterSelection {
    #[serde(default)]
    pub years: Selection<i32>,
    #[serde(default)]
    pub products: Selection<String>,
    #[serde(default)]
    pub sellers: Selection<String>,
    #[serde(default)]
    pub customers: Selection<String>,
}

impl FilterSelection {
    /// A selection with every dimension set to all values.
    pub fn all() -> Self {
        Self::default()
    }

    /// Whether the row passes all four predicates.
    pub fn matches(&self, row: &DenormalizedSale) -> bool {
        self.years.contains_opt(row.year.as_ref())
            && self.products.contains(&row.product_name)
            && self.sellers.contains(&row.seller_name)
            && self.customers.contains(&row.customer_name)
    }

    /// Whether any dimension is an explicit empty set.
    pub fn selects_nothing(&self) -> bool {
        self.years.is_empty()
            || self.products.is_empty()
            || self.sellers.is_empty()
            || self.customers.is_empty()
    }
}

/// Whether a row has every field aggregation relies on.
pub fn is_complete(row: &DenormalizedSale) -> bool {
    row.date.is_some() && row.total_value.is_some() && row.sale_id.is_some()
}

/// Apply the selection, then drop rows with a null date, total value or
/// sale id. The input is not modified.
pub fn apply_filters(
    rows: &[DenormalizedSale],
    selection: &FilterSelection,
) -> Vec<DenormalizedSale> {
    let mut matched = 0;
    let filtered: Vec<DenormalizedSale> = rows
        .iter()
        .filter(|row| selection.matches(row))
        .inspect(|_| matched += 1)
        .filter(|row| is_complete(row))
        .cloned()
        .collect();

    debug!(
        "Filter kept {} of {} rows ({} incomplete rows removed)",
        filtered.len(),
        rows.len(),
        matched - filtered.len()
    );

    filtered
}

/// The distinct values offered for each filter, sorted ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub years: Vec<i32>,
    pub products: Vec<String>,
    pub sellers: Vec<String>,
    pub customers: Vec<String>,
}

impl FilterOptions {
    /// Collect the distinct values present in a table. Null years are not
    /// offered.
    pub fn from_table(rows: &[DenormalizedSale]) -> Self {
        let mut years = BTreeSet::new();
        let mut products = BTreeSet::new();
        let mut sellers = BTreeSet::new();
        let mut customers = BTreeSet::new();

        for row in rows {
            if let Some(year) = row.year {
                years.insert(year);
            }
            products.insert(row.product_name.clone());
            sellers.insert(row.seller_name.clone());
            customers.insert(row.customer_name.clone());
        }

        Self {
            years: years.into_iter().collect(),
            products: products.into_iter().collect(),
            sellers: sellers.into_iter().collect(),
            customers: customers.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::join_dataset;
    use crate::dataset::tests::fixture_dataset;

    fn joined() -> Vec<DenormalizedSale> {
        join_dataset(&fixture_dataset()).rows
    }

    fn ids(rows: &[DenormalizedSale]) -> Vec<i64> {
        rows.iter().filter_map(|r| r.sale_id).collect()
    }

    #[test]
    fn test_select_all_drops_incomplete_rows() {
        let filtered = apply_filters(&joined(), &FilterSelection::all());
        // Sale 7 has an invalid date and sale 8 has no total value.
        assert_eq!(ids(&filtered), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_conjunctive_predicates() {
        let selection = FilterSelection {
            years: Selection::only([2024]),
            sellers: Selection::only(["Marcia".to_string()]),
            ..FilterSelection::default()
        };
        let filtered = apply_filters(&joined(), &selection);
        assert_eq!(ids(&filtered), vec![3, 5]);
    }

    #[test]
    fn test_membership_within_predicate() {
        let selection = FilterSelection {
            products: Selection::only(["Tablet".to_string(), "Notebook".to_string()]),
            ..FilterSelection::default()
        };
        let filtered = apply_filters(&joined(), &selection);
        assert_eq!(ids(&filtered), vec![2, 3, 5]);
    }

    #[test]
    fn test_empty_set_selects_nothing() {
        let rows = joined();
        for selection in [
            FilterSelection {
                years: Selection::none(),
                ..FilterSelection::default()
            },
            FilterSelection {
                products: Selection::none(),
                ..FilterSelection::default()
            },
            FilterSelection {
                sellers: Selection::none(),
                ..FilterSelection::default()
            },
            FilterSelection {
                customers: Selection::none(),
                ..FilterSelection::default()
            },
        ] {
            assert!(selection.selects_nothing());
            assert!(apply_filters(&rows, &selection).is_empty());
        }
    }

    #[test]
    fn test_null_year_only_passes_all_values() {
        let all: Selection<i32> = Selection::AllValues;
        let some = Selection::only([2023]);
        assert!(all.contains_opt(None));
        assert!(!some.contains_opt(None));
        assert!(some.contains_opt(Some(&2023)));
    }

    #[test]
    fn test_filtering_is_deterministic() {
        let rows = joined();
        let selection = FilterSelection {
            customers: Selection::only(["Empresa 1".to_string()]),
            ..FilterSelection::default()
        };
        assert_eq!(
            apply_filters(&rows, &selection),
            apply_filters(&rows, &selection)
        );
    }

    #[test]
    fn test_selection_from_option() {
        assert_eq!(Selection::<i32>::from(None), Selection::AllValues);
        assert_eq!(Selection::from(Some(Vec::<i32>::new())), Selection::none());
        assert_eq!(Selection::from(Some(vec![2023, 2023])), Selection::only([2023]));
    }

    #[test]
    fn test_filter_options() {
        let options = FilterOptions::from_table(&joined());
        assert_eq!(options.years, vec![2023, 2024]);
        assert_eq!(options.products, vec!["Notebook", "Smartphone", "Tablet"]);
        assert_eq!(options.sellers, vec!["Arthur", "Marcia"]);
        assert_eq!(options.customers, vec!["Empresa 1", "Empresa 2", "Empresa 3"]);
    }
}
