//! Typed errors for the library layer.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading the source tables.
///
/// Every variant is fatal: the dashboard cannot render without all five
/// dimensions and the fact table. Bad cell values are not errors; they
/// load as nulls.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("source table '{table}' not found at {}", path.display())]
    MissingTable { table: &'static str, path: PathBuf },

    #[error("failed to read source table '{table}': {source}")]
    Io {
        table: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse source table '{table}': {source}")]
    Csv {
        table: &'static str,
        #[source]
        source: csv::Error,
    },

    #[error("source table '{table}' is missing required column '{column}'")]
    MissingColumn {
        table: &'static str,
        column: &'static str,
    },
}

/// Errors raised by the Nominatim geocoder.
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("geocoding request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("geocoder returned HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("geocoder returned an invalid coordinate: {0}")]
    InvalidCoordinate(String),
}
