//! Star-schema join.
//!
//! Joins every fact row to its five dimensions by exact foreign-key
//! equality. A fact whose key does not resolve in any one dimension is
//! left out of the result; the number of such rows is counted per
//! dimension for diagnostics only.

use crate::dataset::{Dataset, SourceTable};
use crate::models::{Customer, DenormalizedSale, Product, SaleFact, Seller, Supplier, TimePoint};
use chrono::Datelike;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Row counts observed while joining.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JoinStats {
    /// Fact rows fed into the join.
    pub input_rows: usize,
    /// Rows that resolved in all five dimensions.
    pub joined_rows: usize,
    pub unmatched_product: usize,
    pub unmatched_customer: usize,
    pub unmatched_seller: usize,
    pub unmatched_supplier: usize,
    pub unmatched_time: usize,
}

impl JoinStats {
    /// Rows dropped by the join.
    pub fn dropped(&self) -> usize {
        self.input_rows - self.joined_rows
    }
}

/// Result of joining the fact table to all dimensions.
#[derive(Debug, Clone, Default)]
pub struct JoinOutput {
    pub rows: Vec<DenormalizedSale>,
    pub stats: JoinStats,
}

/// Lookup from key to dimension row. The first row wins on a repeated key.
struct KeyIndex<'a, T> {
    rows: HashMap<i64, &'a T>,
}

impl<'a, T: SourceTable> KeyIndex<'a, T> {
    fn build(rows: &'a [T], key: impl Fn(&T) -> Option<i64>) -> Self {
        let mut index = HashMap::with_capacity(rows.len());
        for row in rows {
            let Some(id) = key(row) else {
                continue;
            };
            if index.contains_key(&id) {
                warn!("Duplicate {} key {}; keeping the first row", T::TABLE, id);
                continue;
            }
            index.insert(id, row);
        }
        Self { rows: index }
    }

    fn get(&self, key: Option<i64>) -> Option<(i64, &'a T)> {
        let id = key?;
        self.rows.get(&id).map(|row| (id, *row))
    }
}

/// Join the fact table against all five dimensions.
pub fn join_dataset(dataset: &Dataset) -> JoinOutput {
    let products = KeyIndex::build(&dataset.products, |p: &Product| p.id);
    let customers = KeyIndex::build(&dataset.customers, |c: &Customer| c.id);
    let sellers = KeyIndex::build(&dataset.sellers, |s: &Seller| s.id);
    let suppliers = KeyIndex::build(&dataset.suppliers, |s: &Supplier| s.id);
    let time = KeyIndex::build(&dataset.time, |t: &TimePoint| t.id);

    let mut stats = JoinStats {
        input_rows: dataset.sales.len(),
        ..JoinStats::default()
    };
    let mut rows = Vec::with_capacity(dataset.sales.len());

    // Keys are checked in join order, so a row missing several keys is
    // counted against the first dimension it fails on.
    for fact in &dataset.sales {
        let Some(product) = products.get(fact.product_id) else {
            stats.unmatched_product += 1;
            continue;
        };
        let Some(customer) = customers.get(fact.customer_id) else {
            stats.unmatched_customer += 1;
            continue;
        };
        let Some(seller) = sellers.get(fact.seller_id) else {
            stats.unmatched_seller += 1;
            continue;
        };
        let Some(supplier) = suppliers.get(fact.supplier_id) else {
            stats.unmatched_supplier += 1;
            continue;
        };
        let Some(time_point) = time.get(fact.time_id) else {
            stats.unmatched_time += 1;
            continue;
        };

        rows.push(denormalize(fact, product, customer, seller, supplier, time_point));
    }

    stats.joined_rows = rows.len();
    debug!(
        "Joined {} of {} sales ({} dropped on unmatched keys)",
        stats.joined_rows,
        stats.input_rows,
        stats.dropped()
    );

    JoinOutput { rows, stats }
}

fn denormalize(
    fact: &SaleFact,
    (product_id, product): (i64, &Product),
    (customer_id, customer): (i64, &Customer),
    (seller_id, seller): (i64, &Seller),
    (supplier_id, supplier): (i64, &Supplier),
    (time_id, time_point): (i64, &TimePoint),
) -> DenormalizedSale {
    let mut row = DenormalizedSale {
        sale_id: fact.id,
        quantity: fact.quantity,
        unit_price: fact.unit_price,
        total_value: fact.total_value,
        product_id,
        product_name: product.name.clone(),
        category: product.category.clone(),
        list_price: product.unit_price,
        customer_id,
        customer_name: customer.name.clone(),
        city: customer.city.clone(),
        state: customer.state.clone(),
        latitude: customer.latitude,
        longitude: customer.longitude,
        seller_id,
        seller_name: seller.name.clone(),
        department: seller.department.clone(),
        supplier_id,
        supplier_name: supplier.name.clone(),
        country: supplier.country.clone(),
        time_id,
        date: time_point.date,
        year: time_point.year,
        month: time_point.month,
        weekday: time_point.weekday.clone(),
    };
    rederive_year(&mut row);
    row
}

/// Recompute the year from the joined date column.
///
/// The date dimension is normalized at load time, so this is normally a
/// no-op; it keeps the row consistent if the year was carried over from
/// a source that was never normalized.
pub fn rederive_year(row: &mut DenormalizedSale) {
    row.year = row.date.map(|d| d.year());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::tests::fixture_dataset;
    use chrono::NaiveDate;

    #[test]
    fn test_join_fixture() {
        let output = join_dataset(&fixture_dataset());

        assert_eq!(output.stats.input_rows, 8);
        assert_eq!(output.stats.joined_rows, 7);
        assert_eq!(output.stats.unmatched_product, 1);
        assert_eq!(output.stats.dropped(), 1);
        assert!(output.rows.iter().all(|r| r.sale_id != Some(6)));
    }

    #[test]
    fn test_join_copies_dimension_attributes() {
        let output = join_dataset(&fixture_dataset());
        let row = output.rows.iter().find(|r| r.sale_id == Some(4)).unwrap();

        assert_eq!(row.product_name, "Smartphone");
        assert_eq!(row.customer_name, "Empresa 2");
        assert_eq!(row.seller_name, "Arthur");
        assert_eq!(row.supplier_name, "Dell");
        assert_eq!(row.date, NaiveDate::from_ymd_opt(2024, 11, 5));
        assert_eq!(row.year, Some(2024));
        assert_eq!(row.total_value, Some(4500.0));
    }

    #[test]
    fn test_join_never_grows() {
        let mut dataset = fixture_dataset();
        // A repeated dimension key must not duplicate facts.
        let duplicate = dataset.products[0].clone();
        dataset.products.push(duplicate);

        let output = join_dataset(&dataset);
        assert!(output.rows.len() <= dataset.sales.len());
        assert_eq!(output.rows.len(), 7);
    }

    #[test]
    fn test_null_foreign_key_is_unmatched() {
        let mut dataset = fixture_dataset();
        dataset.sales[0].customer_id = None;
        dataset.sales[1].time_id = Some(404);

        let output = join_dataset(&dataset);
        assert_eq!(output.stats.unmatched_customer, 1);
        assert_eq!(output.stats.unmatched_time, 1);
        assert_eq!(output.stats.joined_rows, 5);
    }

    #[test]
    fn test_rederive_year() {
        let output = join_dataset(&fixture_dataset());
        let mut row = output.rows[0].clone();
        row.year = Some(1900);
        rederive_year(&mut row);
        assert_eq!(row.year, row.date.map(|d| d.year()));
    }
}
