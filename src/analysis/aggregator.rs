//! KPI and grouped-sum aggregation.
//!
//! This module turns a filtered table into the scalar KPIs and the
//! per-dimension totals that feed the dashboard views. Every function is
//! pure over its input and tolerates an empty table.

use crate::models::{AggregateRow, DenormalizedSale, Dimension};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// Scalar KPIs of the filtered table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Kpis {
    /// "Total de Vendas": sum of total value.
    pub total_sales: f64,
    /// "Nº de Vendas": distinct sale ids.
    pub sale_count: usize,
    /// "Clientes Ativos": distinct customer ids.
    pub active_customers: usize,
}

impl Kpis {
    /// Compute the KPIs of a filtered table.
    pub fn from_rows(rows: &[DenormalizedSale]) -> Self {
        let total_sales: f64 = rows.iter().filter_map(|r| r.total_value).sum();
        let sale_count = rows
            .iter()
            .filter_map(|r| r.sale_id)
            .collect::<HashSet<_>>()
            .len();
        let active_customers = rows
            .iter()
            .map(|r| r.customer_id)
            .collect::<HashSet<_>>()
            .len();

        Self {
            total_sales,
            sale_count,
            active_customers,
        }
    }
}

/// The five grouped-sum tables, each in ascending key order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GroupedSums {
    pub by_product: Vec<AggregateRow<String>>,
    pub by_seller: Vec<AggregateRow<String>>,
    pub by_customer: Vec<AggregateRow<String>>,
    pub by_supplier: Vec<AggregateRow<String>>,
    pub by_year: Vec<AggregateRow<i32>>,
}

impl GroupedSums {
    /// Group a filtered table by every dimension.
    pub fn from_rows(rows: &[DenormalizedSale]) -> Self {
        Self {
            by_product: group_sum(rows, |r| Some(r.product_name.clone())),
            by_seller: group_sum(rows, |r| Some(r.seller_name.clone())),
            by_customer: group_sum(rows, |r| Some(r.customer_name.clone())),
            by_supplier: group_sum(rows, |r| Some(r.supplier_name.clone())),
            by_year: group_sum(rows, |r| r.year),
        }
    }

    /// A named table with its keys rendered as text.
    pub fn table(&self, dimension: Dimension) -> Vec<AggregateRow<String>> {
        match dimension {
            Dimension::Product => self.by_product.clone(),
            Dimension::Seller => self.by_seller.clone(),
            Dimension::Customer => self.by_customer.clone(),
            Dimension::Supplier => self.by_supplier.clone(),
            Dimension::Year => self
                .by_year
                .iter()
                .map(|row| AggregateRow {
                    key: row.key.to_string(),
                    total_value: row.total_value,
                })
                .collect(),
        }
    }
}

/// Compute the KPIs and all grouped tables of one filtered table.
pub fn compute_view(rows: &[DenormalizedSale]) -> (Kpis, GroupedSums) {
    (Kpis::from_rows(rows), GroupedSums::from_rows(rows))
}

/// Sum total value per distinct key.
///
/// Rows with a null key or a null total value do not contribute; keys
/// without contributing rows do not appear.
pub fn group_sum<K, F>(rows: &[DenormalizedSale], key: F) -> Vec<AggregateRow<K>>
where
    K: Ord,
    F: Fn(&DenormalizedSale) -> Option<K>,
{
    let mut totals: BTreeMap<K, f64> = BTreeMap::new();

    for row in rows {
        let (Some(k), Some(value)) = (key(row), row.total_value) else {
            continue;
        };
        *totals.entry(k).or_insert(0.0) += value;
    }

    totals
        .into_iter()
        .map(|(key, total_value)| AggregateRow { key, total_value })
        .collect()
}

/// Sort a grouped table by value, largest first. Ties keep key order.
pub fn sort_by_value_desc<K>(rows: &mut [AggregateRow<K>]) {
    rows.sort_by(|a, b| {
        b.total_value
            .partial_cmp(&a.total_value)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

/// Share of each row in the table total, as a fraction in `[0, 1]`.
/// An all-zero table yields zero shares.
pub fn shares<K: Clone>(rows: &[AggregateRow<K>]) -> Vec<(K, f64)> {
    let total: f64 = rows.iter().map(|r| r.total_value).sum();

    rows.iter()
        .map(|r| {
            let share = if total == 0.0 {
                0.0
            } else {
                r.total_value / total
            };
            (r.key.clone(), share)
        })
        .collect()
}

/// One customer location on the map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapPoint {
    pub customer_name: String,
    pub city: String,
    pub state: String,
    pub latitude: f64,
    pub longitude: f64,
    pub total_value: f64,
    pub sale_count: usize,
}

/// Rows whose customer has both coordinates.
pub fn geo_subset(rows: &[DenormalizedSale]) -> Vec<&DenormalizedSale> {
    rows.iter().filter(|r| r.coordinates().is_some()).collect()
}

/// Aggregate the geo subset into one point per customer, ordered by
/// customer id.
pub fn map_points(rows: &[DenormalizedSale]) -> Vec<MapPoint> {
    let mut points: BTreeMap<i64, MapPoint> = BTreeMap::new();

    for row in geo_subset(rows) {
        let Some((latitude, longitude)) = row.coordinates() else {
            continue;
        };
        let point = points.entry(row.customer_id).or_insert_with(|| MapPoint {
            customer_name: row.customer_name.clone(),
            city: row.city.clone(),
            state: row.state.clone(),
            latitude,
            longitude,
            total_value: 0.0,
            sale_count: 0,
        });
        point.total_value += row.total_value.unwrap_or(0.0);
        point.sale_count += 1;
    }

    points.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{apply_filters, join_dataset, FilterSelection};
    use crate::dataset::tests::fixture_dataset;

    fn filtered() -> Vec<DenormalizedSale> {
        let joined = join_dataset(&fixture_dataset()).rows;
        apply_filters(&joined, &FilterSelection::all())
    }

    fn total<K>(rows: &[AggregateRow<K>]) -> f64 {
        rows.iter().map(|r| r.total_value).sum()
    }

    #[test]
    fn test_kpis() {
        let kpis = Kpis::from_rows(&filtered());
        assert_eq!(kpis.total_sales, 12900.0);
        assert_eq!(kpis.sale_count, 5);
        assert_eq!(kpis.active_customers, 3);
    }

    #[test]
    fn test_kpis_empty() {
        assert_eq!(Kpis::from_rows(&[]), Kpis::default());
        assert_eq!(GroupedSums::from_rows(&[]), GroupedSums::default());
    }

    #[test]
    fn test_grouped_sums() {
        let groups = GroupedSums::from_rows(&filtered());

        let products: Vec<_> = groups
            .by_product
            .iter()
            .map(|r| (r.key.as_str(), r.total_value))
            .collect();
        assert_eq!(
            products,
            vec![("Notebook", 3000.0), ("Smartphone", 7500.0), ("Tablet", 2400.0)]
        );

        let years: Vec<_> = groups
            .by_year
            .iter()
            .map(|r| (r.key, r.total_value))
            .collect();
        assert_eq!(years, vec![(2023, 3800.0), (2024, 9100.0)]);

        assert_eq!(groups.by_seller.len(), 2);
        assert_eq!(groups.by_supplier.len(), 2);
    }

    #[test]
    fn test_grouping_partitions_total() {
        let rows = filtered();
        let kpis = Kpis::from_rows(&rows);
        let groups = GroupedSums::from_rows(&rows);

        for table in [
            &groups.by_product,
            &groups.by_seller,
            &groups.by_customer,
            &groups.by_supplier,
        ] {
            assert!((total(table) - kpis.total_sales).abs() < 1e-6);
        }
        assert!((total(&groups.by_year) - kpis.total_sales).abs() < 1e-6);
    }

    #[test]
    fn test_table_by_dimension() {
        let groups = GroupedSums::from_rows(&filtered());
        let years = groups.table(Dimension::Year);
        assert_eq!(years[0].key, "2023");
        assert_eq!(groups.table(Dimension::Customer).len(), 3);
    }

    #[test]
    fn test_shares() {
        let rows = vec![
            AggregateRow {
                key: "a",
                total_value: 30.0,
            },
            AggregateRow {
                key: "b",
                total_value: 10.0,
            },
        ];
        assert_eq!(shares(&rows), vec![("a", 0.75), ("b", 0.25)]);

        let zero = vec![AggregateRow {
            key: "a",
            total_value: 0.0,
        }];
        assert_eq!(shares(&zero), vec![("a", 0.0)]);
    }

    #[test]
    fn test_map_points_skip_missing_coordinates() {
        let rows = filtered();
        let points = map_points(&rows);

        // Empresa 3 has no coordinates but still counts in customer totals.
        assert_eq!(points.len(), 2);
        assert!(points.iter().all(|p| p.customer_name != "Empresa 3"));
        assert_eq!(points[0].customer_name, "Empresa 1");
        assert_eq!(points[0].total_value, 4600.0);
        assert_eq!(points[0].sale_count, 2);

        let groups = GroupedSums::from_rows(&rows);
        assert!(groups.by_customer.iter().any(|r| r.key == "Empresa 3"));
    }
}
