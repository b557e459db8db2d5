//! CSV table reading.
//!
//! Each source table is a CSV file with a header row. Rows are
//! deserialized by column name, so column order does not matter and
//! extra columns are ignored.

use crate::error::LoadError;
use crate::models::{Customer, Product, SaleFact, Seller, Supplier, TimePoint};
use serde::de::DeserializeOwned;
use std::io::Read;
use tracing::{debug, warn};

/// A row type that can be read from one of the source tables.
pub trait SourceTable: DeserializeOwned {
    /// Table name used in errors and logs.
    const TABLE: &'static str;

    /// Columns that must be present in the header row.
    const REQUIRED_COLUMNS: &'static [&'static str];
}

impl SourceTable for Product {
    const TABLE: &'static str = "product";
    const REQUIRED_COLUMNS: &'static [&'static str] = &["id_produto", "nome_produto"];
}

impl SourceTable for Customer {
    const TABLE: &'static str = "customer";
    const REQUIRED_COLUMNS: &'static [&'static str] = &["id_cliente", "nome_cliente"];
}

impl SourceTable for Seller {
    const TABLE: &'static str = "seller";
    const REQUIRED_COLUMNS: &'static [&'static str] = &["id_vendedor", "nome_vendedor"];
}

impl SourceTable for Supplier {
    const TABLE: &'static str = "supplier";
    const REQUIRED_COLUMNS: &'static [&'static str] = &["id_fornecedor", "nome_fornecedor"];
}

impl SourceTable for TimePoint {
    const TABLE: &'static str = "time";
    const REQUIRED_COLUMNS: &'static [&'static str] = &["id_tempo", "data"];
}

impl SourceTable for SaleFact {
    const TABLE: &'static str = "sales";
    const REQUIRED_COLUMNS: &'static [&'static str] = &[
        "id_venda",
        "id_produto",
        "id_cliente",
        "id_vendedor",
        "id_fornecedor",
        "id_tempo",
        "valor_total",
    ];
}

/// A table as read from its source, with the header row kept around.
#[derive(Debug, Clone)]
pub struct TableRead<T> {
    pub rows: Vec<T>,
    pub headers: Vec<String>,
    /// Rows skipped because they could not be decoded at all.
    pub skipped: usize,
}

impl<T> TableRead<T> {
    /// Whether the header row contains the given column.
    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|h| h == column)
    }
}

/// Read a whole table from a CSV reader.
///
/// A missing required column fails the table. A row that cannot be
/// decoded is skipped with a warning; bad cell values inside a decodable
/// row load as nulls.
pub fn read_table<T: SourceTable, R: Read>(reader: R) -> Result<TableRead<T>, LoadError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()
        .map_err(|source| LoadError::Csv {
            table: T::TABLE,
            source,
        })?
        .iter()
        .map(|h| h.trim_start_matches('\u{FEFF}').to_string())
        .collect();

    for &column in T::REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(LoadError::MissingColumn {
                table: T::TABLE,
                column,
            });
        }
    }

    // Re-apply the cleaned header so a BOM does not hide the first column.
    csv_reader.set_headers(csv::StringRecord::from(headers.clone()));

    let mut rows = Vec::new();
    let mut skipped = 0;
    for (line_num, result) in csv_reader.deserialize::<T>().enumerate() {
        match result {
            Ok(row) => rows.push(row),
            Err(e) => {
                warn!(
                    "Skipping {} row at line {}: {}",
                    T::TABLE,
                    line_num + 2,
                    e
                );
                skipped += 1;
            }
        }
    }

    debug!("Read {} rows from {} table", rows.len(), T::TABLE);

    Ok(TableRead {
        rows,
        headers,
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_products() {
        let csv = "\
id_produto,nome_produto,categoria,preco_unitario
1,Smartphone,Eletrônicos,1543.21
2,Tablet,Portáteis,abc
";
        let table = read_table::<Product, _>(csv.as_bytes()).unwrap();
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].name, "Smartphone");
        assert_eq!(table.rows[0].unit_price, Some(1543.21));
        assert_eq!(table.rows[1].unit_price, None);
        assert_eq!(table.skipped, 0);
    }

    #[test]
    fn test_missing_required_column() {
        let csv = "id_produto,categoria\n1,Fotografia\n";
        let err = read_table::<Product, _>(csv.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            LoadError::MissingColumn {
                table: "product",
                column: "nome_produto"
            }
        ));
    }

    #[test]
    fn test_optional_columns_absent() {
        let csv = "\
id_cliente,nome_cliente,cidade,estado
1,Empresa 1,Recife,PE
";
        let table = read_table::<Customer, _>(csv.as_bytes()).unwrap();
        assert!(!table.has_column("latitude"));
        assert_eq!(table.rows[0].coordinates(), None);
    }

    #[test]
    fn test_column_order_and_bom() {
        let csv = "\u{FEFF}nome_vendedor,departamento,id_vendedor\nMarcia,Vendas,3\n";
        let table = read_table::<Seller, _>(csv.as_bytes()).unwrap();
        assert_eq!(table.rows[0].id, Some(3));
        assert_eq!(table.rows[0].name, "Marcia");
    }

    #[test]
    fn test_fact_with_bad_foreign_key() {
        let csv = "\
id_venda,id_produto,id_cliente,id_vendedor,id_fornecedor,id_tempo,quantidade,preco_unitario,valor_total
1,x,1,1,1,1,2,10.0,20.0
2,1,1,1,1,1,3,10.0,
";
        let table = read_table::<SaleFact, _>(csv.as_bytes()).unwrap();
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].product_id, None);
        assert_eq!(table.rows[1].total_value, None);
    }
}
