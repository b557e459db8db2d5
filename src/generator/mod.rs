//! Synthetic star-schema dataset.
//!
//! Produces the same shape of data the dashboard reads: five small
//! dimensions and a fact table of random sales. Generation is
//! deterministic for a given seed and date range.

pub mod geocode;

pub use geocode::{Geocoder, GeocoderSettings};

use crate::config::{DataConfig, GeneratorConfig};
use crate::dataset::{DataSources, Dataset};
use crate::models::{round2, Customer, Product, SaleFact, Seller, Supplier, TimePoint};
use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

const PRODUCTS: [&str; 5] = ["Smartphone", "Tablet", "Notebook", "Smartwatch", "Câmeras"];
const CATEGORIES: [&str; 3] = ["Eletrônicos", "Portáteis", "Fotografia"];

const CUSTOMERS: [(&str, &str, &str); 5] = [
    ("Empresa 1", "Recife", "PE"),
    ("Empresa 2", "Parnamirim", "RN"),
    ("Empresa 3", "Coxixola", "PB"),
    ("Empresa 4", "João Pessoa", "PB"),
    ("Empresa 5", "Caruaru", "PE"),
];

const SELLERS: [&str; 5] = ["Marcia", "Arthur", "Chico", "Matheus", "Luan"];
const DEPARTMENTS: [&str; 2] = ["Vendas", "Atendimento"];

const SUPPLIERS: [&str; 3] = ["Dell", "Xiaomi", "Samsung"];
const COUNTRIES: [&str; 3] = ["Brasil", "EUA", "China"];

const MIN_PRICE: f64 = 100.0;
const MAX_PRICE: f64 = 5000.0;
const MAX_QUANTITY: i64 = 10;

/// Parameters of one generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorSettings {
    pub seed: u64,
    pub sales: usize,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl From<&GeneratorConfig> for GeneratorSettings {
    fn from(config: &GeneratorConfig) -> Self {
        Self {
            seed: config.seed,
            sales: config.sales,
            start_date: config.start_date,
            end_date: config.effective_end_date(),
        }
    }
}

/// Generate a dataset. Customer coordinates are left empty; fill them
/// with [`Geocoder::geocode_customers`].
pub fn generate(settings: &GeneratorSettings) -> Result<Dataset> {
    if settings.start_date > settings.end_date {
        bail!(
            "Start date {} is after end date {}",
            settings.start_date,
            settings.end_date
        );
    }
    if settings.sales == 0 {
        bail!("At least one sale is required");
    }

    let mut rng = StdRng::seed_from_u64(settings.seed);

    let products = generate_products(&mut rng);
    let customers = generate_customers();
    let sellers = generate_sellers(&mut rng);
    let suppliers = generate_suppliers(&mut rng);
    let time = generate_time(settings.start_date, settings.end_date);
    let sales = generate_sales(&mut rng, settings.sales, &products, &time);

    debug!(
        "Generated {} products, {} customers, {} sellers, {} suppliers, {} days, {} sales",
        products.len(),
        customers.len(),
        sellers.len(),
        suppliers.len(),
        time.len(),
        sales.len()
    );

    Ok(Dataset {
        products,
        customers,
        sellers,
        suppliers,
        time,
        sales,
        has_coordinates: true,
    })
}

fn generate_products(rng: &mut StdRng) -> Vec<Product> {
    let categories: Vec<&str> = PRODUCTS.iter().map(|_| pick(rng, &CATEGORIES)).collect();

    PRODUCTS
        .iter()
        .zip(categories)
        .enumerate()
        .map(|(i, (name, category))| Product {
            id: Some(i as i64 + 1),
            name: name.to_string(),
            category: category.to_string(),
            unit_price: Some(round2(rng.gen_range(MIN_PRICE..MAX_PRICE))),
        })
        .collect()
}

fn generate_customers() -> Vec<Customer> {
    CUSTOMERS
        .iter()
        .enumerate()
        .map(|(i, (name, city, state))| Customer {
            id: Some(i as i64 + 1),
            name: name.to_string(),
            city: city.to_string(),
            state: state.to_string(),
            latitude: None,
            longitude: None,
        })
        .collect()
}

fn generate_sellers(rng: &mut StdRng) -> Vec<Seller> {
    SELLERS
        .iter()
        .enumerate()
        .map(|(i, name)| Seller {
            id: Some(i as i64 + 1),
            name: name.to_string(),
            department: pick(rng, &DEPARTMENTS).to_string(),
        })
        .collect()
}

fn generate_suppliers(rng: &mut StdRng) -> Vec<Supplier> {
    SUPPLIERS
        .iter()
        .enumerate()
        .map(|(i, name)| Supplier {
            id: Some(i as i64 + 1),
            name: name.to_string(),
            country: pick(rng, &COUNTRIES).to_string(),
        })
        .collect()
}

/// One row per day, both ends inclusive.
fn generate_time(start: NaiveDate, end: NaiveDate) -> Vec<TimePoint> {
    start
        .iter_days()
        .take_while(|day| *day <= end)
        .enumerate()
        .map(|(i, day)| TimePoint::from_date(i as i64 + 1, day))
        .collect()
}

fn generate_sales(
    rng: &mut StdRng,
    count: usize,
    products: &[Product],
    time: &[TimePoint],
) -> Vec<SaleFact> {
    (1..=count)
        .map(|id| {
            let product = &products[rng.gen_range(0..products.len())];
            let customer_id = rng.gen_range(1..=CUSTOMERS.len()) as i64;
            let seller_id = rng.gen_range(1..=SELLERS.len()) as i64;
            let supplier_id = rng.gen_range(1..=SUPPLIERS.len()) as i64;
            let time_id = rng.gen_range(1..=time.len()) as i64;
            let quantity = rng.gen_range(1..MAX_QUANTITY);
            let unit_price = product.unit_price;

            SaleFact {
                id: Some(id as i64),
                product_id: product.id,
                customer_id: Some(customer_id),
                seller_id: Some(seller_id),
                supplier_id: Some(supplier_id),
                time_id: Some(time_id),
                quantity: Some(quantity),
                unit_price,
                total_value: unit_price.map(|price| round2(quantity as f64 * price)),
            }
        })
        .collect()
}

fn pick<'a>(rng: &mut StdRng, values: &[&'a str]) -> &'a str {
    values.choose(rng).copied().unwrap_or_default()
}

/// Write every table of a dataset as CSV under `dir`, creating it if
/// needed. File names come from the data configuration.
pub fn write_dataset(dataset: &Dataset, dir: &Path, files: &DataConfig) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory {}", dir.display()))?;

    let sources = DataSources::in_dir(dir, files);
    write_table(&sources.products, &dataset.products)?;
    write_table(&sources.customers, &dataset.customers)?;
    write_table(&sources.sellers, &dataset.sellers)?;
    write_table(&sources.suppliers, &dataset.suppliers)?;
    write_table(&sources.time, &dataset.time)?;
    write_table(&sources.sales, &dataset.sales)?;

    info!("Wrote dataset to {}", dir.display());
    Ok(())
}

fn write_table<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    for row in rows {
        writer
            .serialize(row)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;

    debug!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}
