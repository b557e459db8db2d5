//! Data models for the sales dashboard.
//!
//! This module contains the star-schema entities as they are read from
//! the source tables, plus the denormalized row produced by the join.
//! Field renames map each struct onto the column names of the CSV files.

use crate::dataset::parse::{lenient, lenient_date};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A product dimension row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "id_produto", default, deserialize_with = "lenient")]
    pub id: Option<i64>,
    #[serde(rename = "nome_produto", default)]
    pub name: String,
    #[serde(rename = "categoria", default)]
    pub category: String,
    #[serde(rename = "preco_unitario", default, deserialize_with = "lenient")]
    pub unit_price: Option<f64>,
}

/// A customer dimension row. Coordinates are optional and may be absent
/// from the source table entirely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    #[serde(rename = "id_cliente", default, deserialize_with = "lenient")]
    pub id: Option<i64>,
    #[serde(rename = "nome_cliente", default)]
    pub name: String,
    #[serde(rename = "cidade", default)]
    pub city: String,
    #[serde(rename = "estado", default)]
    pub state: String,
    #[serde(default, deserialize_with = "lenient")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub longitude: Option<f64>,
}

impl Customer {
    /// Returns both coordinates when they are present.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }
}

/// A seller dimension row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Seller {
    #[serde(rename = "id_vendedor", default, deserialize_with = "lenient")]
    pub id: Option<i64>,
    #[serde(rename = "nome_vendedor", default)]
    pub name: String,
    #[serde(rename = "departamento", default)]
    pub department: String,
}

/// A supplier dimension row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supplier {
    #[serde(rename = "id_fornecedor", default, deserialize_with = "lenient")]
    pub id: Option<i64>,
    #[serde(rename = "nome_fornecedor", default)]
    pub name: String,
    #[serde(rename = "pais", default)]
    pub country: String,
}

/// A date dimension row.
///
/// `year`, `month` and `weekday` are derived from `date` by
/// [`TimePoint::normalize`]; whatever the source file carried for them
/// is replaced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimePoint {
    #[serde(rename = "id_tempo", default, deserialize_with = "lenient")]
    pub id: Option<i64>,
    #[serde(rename = "data", default, deserialize_with = "lenient_date")]
    pub date: Option<NaiveDate>,
    #[serde(rename = "ano", default, deserialize_with = "lenient")]
    pub year: Option<i32>,
    #[serde(rename = "mes", default, deserialize_with = "lenient")]
    pub month: Option<u32>,
    #[serde(rename = "dia_semana", default)]
    pub weekday: Option<String>,
}

impl TimePoint {
    /// Build a time point for a calendar date with derived fields filled in.
    pub fn from_date(id: i64, date: NaiveDate) -> Self {
        let mut point = Self {
            id: Some(id),
            date: Some(date),
            year: None,
            month: None,
            weekday: None,
        };
        point.normalize();
        point
    }

    /// Re-derive year, month and weekday from the date column.
    pub fn normalize(&mut self) {
        self.year = self.date.map(|d| d.year());
        self.month = self.date.map(|d| d.month());
        self.weekday = self.date.map(|d| d.format("%A").to_string());
    }
}

/// A sales fact row. Foreign keys that fail to parse are `None` and can
/// never be joined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleFact {
    #[serde(rename = "id_venda", default, deserialize_with = "lenient")]
    pub id: Option<i64>,
    #[serde(rename = "id_produto", default, deserialize_with = "lenient")]
    pub product_id: Option<i64>,
    #[serde(rename = "id_cliente", default, deserialize_with = "lenient")]
    pub customer_id: Option<i64>,
    #[serde(rename = "id_vendedor", default, deserialize_with = "lenient")]
    pub seller_id: Option<i64>,
    #[serde(rename = "id_fornecedor", default, deserialize_with = "lenient")]
    pub supplier_id: Option<i64>,
    #[serde(rename = "id_tempo", default, deserialize_with = "lenient")]
    pub time_id: Option<i64>,
    #[serde(rename = "quantidade", default, deserialize_with = "lenient")]
    pub quantity: Option<i64>,
    #[serde(rename = "preco_unitario", default, deserialize_with = "lenient")]
    pub unit_price: Option<f64>,
    #[serde(rename = "valor_total", default, deserialize_with = "lenient")]
    pub total_value: Option<f64>,
}

/// Round a monetary value to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// One fact row joined against all five dimensions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DenormalizedSale {
    pub sale_id: Option<i64>,
    pub quantity: Option<i64>,
    /// Unit price captured on the fact row.
    pub unit_price: Option<f64>,
    pub total_value: Option<f64>,

    pub product_id: i64,
    pub product_name: String,
    pub category: String,
    /// Current list price from the product dimension.
    pub list_price: Option<f64>,

    pub customer_id: i64,
    pub customer_name: String,
    pub city: String,
    pub state: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    pub seller_id: i64,
    pub seller_name: String,
    pub department: String,

    pub supplier_id: i64,
    pub supplier_name: String,
    pub country: String,

    pub time_id: i64,
    pub date: Option<NaiveDate>,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub weekday: Option<String>,
}

impl DenormalizedSale {
    /// Returns the customer coordinates when both are present.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }
}

/// The dimension a grouped-sum table is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Product,
    Seller,
    Customer,
    Supplier,
    Year,
}

impl Dimension {
    /// Label used for table headers and chart axes.
    pub fn label(&self) -> &'static str {
        match self {
            Dimension::Product => "Produto",
            Dimension::Seller => "Vendedor",
            Dimension::Customer => "Cliente",
            Dimension::Supplier => "Fornecedor",
            Dimension::Year => "Ano",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::Product => write!(f, "product"),
            Dimension::Seller => write!(f, "seller"),
            Dimension::Customer => write!(f, "customer"),
            Dimension::Supplier => write!(f, "supplier"),
            Dimension::Year => write!(f, "year"),
        }
    }
}

/// One row of a grouped-sum table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow<K> {
    pub key: K,
    pub total_value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(3.0 * 1234.567), 3703.7);
        assert_eq!(round2(2.0 * 99.995), 199.99);
        assert_eq!(round2(0.0), 0.0);
    }

    #[test]
    fn test_time_point_from_date() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let point = TimePoint::from_date(7, date);
        assert_eq!(point.id, Some(7));
        assert_eq!(point.year, Some(2024));
        assert_eq!(point.month, Some(2));
        assert_eq!(point.weekday.as_deref(), Some("Thursday"));
    }

    #[test]
    fn test_normalize_clears_derived_fields_without_date() {
        let mut point = TimePoint {
            id: Some(1),
            date: None,
            year: Some(1999),
            month: Some(4),
            weekday: Some("Monday".to_string()),
        };
        point.normalize();
        assert_eq!(point.year, None);
        assert_eq!(point.month, None);
        assert_eq!(point.weekday, None);
    }

    #[test]
    fn test_customer_coordinates() {
        let mut customer = Customer {
            id: Some(1),
            name: "Empresa 1".to_string(),
            city: "Recife".to_string(),
            state: "PE".to_string(),
            latitude: Some(-8.05),
            longitude: None,
        };
        assert_eq!(customer.coordinates(), None);

        customer.longitude = Some(-34.9);
        assert_eq!(customer.coordinates(), Some((-8.05, -34.9)));
    }

    #[test]
    fn test_dimension_display() {
        assert_eq!(Dimension::Product.to_string(), "product");
        assert_eq!(Dimension::Year.label(), "Ano");
    }
}
