//! Dataset loading.
//!
//! Reads the five dimension tables and the fact table from a data
//! directory, normalizes the date dimension and records whether the
//! customer table carries coordinates. Loading happens once per session;
//! the resulting [`Dataset`] is never mutated afterwards.

pub mod parse;
pub mod reader;

pub use reader::{read_table, SourceTable, TableRead};

use crate::config::DataConfig;
use crate::error::LoadError;
use crate::models::{Customer, Product, SaleFact, Seller, Supplier, TimePoint};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Location of each source table.
#[derive(Debug, Clone)]
pub struct DataSources {
    pub products: PathBuf,
    pub customers: PathBuf,
    pub sellers: PathBuf,
    pub suppliers: PathBuf,
    pub time: PathBuf,
    pub sales: PathBuf,
}

impl DataSources {
    /// Resolve all table paths against a data directory.
    pub fn in_dir(dir: &Path, files: &DataConfig) -> Self {
        Self {
            products: dir.join(&files.products_file),
            customers: dir.join(&files.customers_file),
            sellers: dir.join(&files.sellers_file),
            suppliers: dir.join(&files.suppliers_file),
            time: dir.join(&files.time_file),
            sales: dir.join(&files.sales_file),
        }
    }

    /// Table paths from a data configuration, using its `dir`.
    pub fn from_config(config: &DataConfig) -> Self {
        Self::in_dir(Path::new(&config.dir), config)
    }
}

/// All source tables, loaded and normalized.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub products: Vec<Product>,
    pub customers: Vec<Customer>,
    pub sellers: Vec<Seller>,
    pub suppliers: Vec<Supplier>,
    pub time: Vec<TimePoint>,
    pub sales: Vec<SaleFact>,
    /// Whether the customer table had latitude and longitude columns.
    pub has_coordinates: bool,
}

impl Dataset {
    /// Load every table from disk. Any missing or unreadable table aborts
    /// the load.
    pub fn load(sources: &DataSources) -> Result<Self, LoadError> {
        info!("Loading dataset");

        let products = read_file::<Product>(&sources.products)?;
        let customers = read_file::<Customer>(&sources.customers)?;
        let sellers = read_file::<Seller>(&sources.sellers)?;
        let suppliers = read_file::<Supplier>(&sources.suppliers)?;
        let time = read_file::<TimePoint>(&sources.time)?;
        let sales = read_file::<SaleFact>(&sources.sales)?;

        let dataset = Self::assemble(products, customers, sellers, suppliers, time, sales);
        info!(
            "Loaded {} sales, {} products, {} customers, {} sellers, {} suppliers, {} dates",
            dataset.sales.len(),
            dataset.products.len(),
            dataset.customers.len(),
            dataset.sellers.len(),
            dataset.suppliers.len(),
            dataset.time.len()
        );

        Ok(dataset)
    }

    /// Load every table from in-memory readers, in the order
    /// products, customers, sellers, suppliers, time, sales.
    pub fn from_readers<P, C, S, U, T, F>(
        products: P,
        customers: C,
        sellers: S,
        suppliers: U,
        time: T,
        sales: F,
    ) -> Result<Self, LoadError>
    where
        P: Read,
        C: Read,
        S: Read,
        U: Read,
        T: Read,
        F: Read,
    {
        Ok(Self::assemble(
            read_table(products)?,
            read_table(customers)?,
            read_table(sellers)?,
            read_table(suppliers)?,
            read_table(time)?,
            read_table(sales)?,
        ))
    }

    fn assemble(
        products: TableRead<Product>,
        customers: TableRead<Customer>,
        sellers: TableRead<Seller>,
        suppliers: TableRead<Supplier>,
        time: TableRead<TimePoint>,
        sales: TableRead<SaleFact>,
    ) -> Self {
        let has_coordinates = customers.has_column("latitude") && customers.has_column("longitude");
        if !has_coordinates {
            debug!("Customer table has no coordinate columns");
        }

        let mut time_rows = time.rows;
        for point in &mut time_rows {
            point.normalize();
        }

        let invalid_dates = time_rows.iter().filter(|t| t.date.is_none()).count();
        if invalid_dates > 0 {
            warn!("{} date rows have a missing or invalid date", invalid_dates);
        }

        Self {
            products: products.rows,
            customers: customers.rows,
            sellers: sellers.rows,
            suppliers: suppliers.rows,
            time: time_rows,
            sales: sales.rows,
            has_coordinates,
        }
    }
}

/// Open and read one table file.
fn read_file<T: SourceTable>(path: &Path) -> Result<TableRead<T>, LoadError> {
    debug!("Reading {} table from {}", T::TABLE, path.display());

    let file = File::open(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => LoadError::MissingTable {
            table: T::TABLE,
            path: path.to_path_buf(),
        },
        _ => LoadError::Io {
            table: T::TABLE,
            source,
        },
    })?;

    read_table(BufReader::new(file))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::NaiveDate;

    /// Directory holding the shared CSV fixtures.
    pub(crate) fn fixture_dir() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/data")
    }

    pub(crate) fn fixture_dataset() -> Dataset {
        let sources = DataSources::in_dir(&fixture_dir(), &DataConfig::default());
        Dataset::load(&sources).unwrap()
    }

    #[test]
    fn test_load_fixture_dataset() {
        let dataset = fixture_dataset();
        assert_eq!(dataset.products.len(), 3);
        assert_eq!(dataset.customers.len(), 3);
        assert_eq!(dataset.sellers.len(), 2);
        assert_eq!(dataset.suppliers.len(), 2);
        assert_eq!(dataset.time.len(), 5);
        assert_eq!(dataset.sales.len(), 8);
        assert!(dataset.has_coordinates);
    }

    #[test]
    fn test_time_dimension_is_normalized() {
        let dataset = fixture_dataset();

        // The fixture carries a stale `ano` on the first row.
        let first = &dataset.time[0];
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2023, 1, 15));
        assert_eq!(first.year, Some(2023));

        let broken = dataset.time.iter().find(|t| t.id == Some(5)).unwrap();
        assert_eq!(broken.date, None);
        assert_eq!(broken.year, None);
    }

    #[test]
    fn test_missing_table_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let sources = DataSources::in_dir(dir.path(), &DataConfig::default());
        let err = Dataset::load(&sources).unwrap_err();
        assert!(matches!(err, LoadError::MissingTable { table: "product", .. }));
    }

    #[test]
    fn test_from_readers_without_coordinates() {
        let dataset = Dataset::from_readers(
            "id_produto,nome_produto\n1,Tablet\n".as_bytes(),
            "id_cliente,nome_cliente\n1,Empresa 1\n".as_bytes(),
            "id_vendedor,nome_vendedor\n1,Chico\n".as_bytes(),
            "id_fornecedor,nome_fornecedor\n1,Dell\n".as_bytes(),
            "id_tempo,data\n1,2024-05-01\n2,garbage\n".as_bytes(),
            "id_venda,id_produto,id_cliente,id_vendedor,id_fornecedor,id_tempo,valor_total\n1,1,1,1,1,1,10.5\n"
                .as_bytes(),
        )
        .unwrap();

        assert!(!dataset.has_coordinates);
        assert_eq!(dataset.time[0].year, Some(2024));
        assert_eq!(dataset.time[1].date, None);
        assert_eq!(dataset.sales[0].total_value, Some(10.5));
    }
}
