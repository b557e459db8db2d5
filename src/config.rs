//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.salesdash.toml` files.

use crate::cli::{GenerateArgs, ReportArgs};
use crate::report::{OutputFormat, RenderOptions, ThemeName};
use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".salesdash.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Source table locations.
    #[serde(default)]
    pub data: DataConfig,

    /// Dashboard rendering settings.
    #[serde(default)]
    pub report: ReportConfig,

    /// Synthetic data settings.
    #[serde(default)]
    pub generator: GeneratorConfig,
}

/// Where the six source tables live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    /// Directory holding the CSV files.
    #[serde(default = "default_data_dir")]
    pub dir: String,

    #[serde(default = "default_products_file")]
    pub products_file: String,

    #[serde(default = "default_customers_file")]
    pub customers_file: String,

    #[serde(default = "default_sellers_file")]
    pub sellers_file: String,

    #[serde(default = "default_suppliers_file")]
    pub suppliers_file: String,

    #[serde(default = "default_time_file")]
    pub time_file: String,

    #[serde(default = "default_sales_file")]
    pub sales_file: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: default_data_dir(),
            products_file: default_products_file(),
            customers_file: default_customers_file(),
            sellers_file: default_sellers_file(),
            suppliers_file: default_suppliers_file(),
            time_file: default_time_file(),
            sales_file: default_sales_file(),
        }
    }
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_products_file() -> String {
    "dimen_produto.csv".to_string()
}

fn default_customers_file() -> String {
    "dimen_clientes.csv".to_string()
}

fn default_sellers_file() -> String {
    "dimen_vendedor.csv".to_string()
}

fn default_suppliers_file() -> String {
    "dimen_fornecedor.csv".to_string()
}

fn default_time_file() -> String {
    "dimen_tempo.csv".to_string()
}

fn default_sales_file() -> String {
    "vendas_fato.csv".to_string()
}

/// Dashboard rendering settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Output format.
    #[serde(default)]
    pub format: OutputFormat,

    /// Output file path. Defaults to `dashboard.md` or `dashboard.json`
    /// depending on the format.
    #[serde(default)]
    pub output: Option<String>,

    /// Chart theme.
    #[serde(default)]
    pub theme: ThemeName,

    /// Render the customer map section.
    #[serde(default = "default_true")]
    pub include_map: bool,

    /// Rows per chart table in Markdown; 0 keeps every row.
    #[serde(default)]
    pub max_rows: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            output: None,
            theme: ThemeName::default(),
            include_map: true,
            max_rows: 0,
        }
    }
}

impl ReportConfig {
    /// The file the report is written to.
    pub fn output_path(&self) -> PathBuf {
        match (&self.output, self.format) {
            (Some(path), _) => PathBuf::from(path),
            (None, OutputFormat::Markdown) => PathBuf::from("dashboard.md"),
            (None, OutputFormat::Json) => PathBuf::from("dashboard.json"),
        }
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            max_rows: self.max_rows,
            include_map: self.include_map,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Synthetic dataset settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// RNG seed.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Number of fact rows.
    #[serde(default = "default_sales")]
    pub sales: usize,

    /// First day of the time dimension.
    #[serde(default = "default_start_date")]
    pub start_date: NaiveDate,

    /// Last day of the time dimension; today when unset.
    #[serde(default)]
    pub end_date: Option<NaiveDate>,

    /// Look up customer coordinates with Nominatim.
    #[serde(default)]
    pub geocode: bool,

    /// Nominatim search endpoint.
    #[serde(default = "default_nominatim_url")]
    pub nominatim_url: String,

    /// User-Agent sent to Nominatim (its usage policy requires one).
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Delay between geocoding requests.
    #[serde(default = "default_request_interval")]
    pub request_interval_ms: u64,

    /// Per-request timeout.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            sales: default_sales(),
            start_date: default_start_date(),
            end_date: None,
            geocode: false,
            nominatim_url: default_nominatim_url(),
            user_agent: default_user_agent(),
            request_interval_ms: default_request_interval(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl GeneratorConfig {
    /// The last generated day.
    pub fn effective_end_date(&self) -> NaiveDate {
        self.end_date.unwrap_or_else(|| Local::now().date_naive())
    }
}

fn default_seed() -> u64 {
    10
}

fn default_sales() -> usize {
    100
}

fn default_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or_default()
}

fn default_nominatim_url() -> String {
    "https://nominatim.openstreetmap.org/search".to_string()
}

fn default_user_agent() -> String {
    format!("salesdash/{}", env!("CARGO_PKG_VERSION"))
}

fn default_request_interval() -> u64 {
    1000
}

fn default_timeout() -> u64 {
    10
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Apply `report`/`options` arguments. Only values given on the
    /// command line override the file.
    pub fn merge_report_args(&mut self, args: &ReportArgs) {
        if let Some(ref dir) = args.data_dir {
            self.data.dir = dir.display().to_string();
        }
        if let Some(format) = args.format {
            self.report.format = format;
        }
        if let Some(ref output) = args.output {
            self.report.output = Some(output.display().to_string());
        }
        if let Some(theme) = args.theme {
            self.report.theme = theme;
        }
        if let Some(max_rows) = args.max_rows {
            self.report.max_rows = max_rows;
        }
        if args.no_map {
            self.report.include_map = false;
        }
    }

    /// Apply `generate` arguments.
    pub fn merge_generate_args(&mut self, args: &GenerateArgs) {
        if let Some(ref dir) = args.out_dir {
            self.data.dir = dir.display().to_string();
        }
        if let Some(seed) = args.seed {
            self.generator.seed = seed;
        }
        if let Some(sales) = args.sales {
            self.generator.sales = sales;
        }
        if let Some(start) = args.start_date {
            self.generator.start_date = start;
        }
        if let Some(end) = args.end_date {
            self.generator.end_date = Some(end);
        }
        if args.geocode {
            self.generator.geocode = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.data.dir, "data");
        assert_eq!(config.data.sales_file, "vendas_fato.csv");
        assert_eq!(config.generator.seed, 10);
        assert_eq!(config.generator.sales, 100);
        assert_eq!(
            config.generator.start_date,
            NaiveDate::from_ymd_opt(2023, 1, 1).unwrap()
        );
        assert_eq!(config.report.output_path(), PathBuf::from("dashboard.md"));
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[data]
dir = "warehouse"
sales_file = "fatos.csv"

[report]
format = "json"
theme = "dark"
include_map = false

[generator]
seed = 42
end_date = "2023-12-31"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.data.dir, "warehouse");
        assert_eq!(config.data.sales_file, "fatos.csv");
        assert_eq!(config.data.products_file, "dimen_produto.csv");
        assert_eq!(config.report.format, OutputFormat::Json);
        assert_eq!(config.report.theme, ThemeName::Dark);
        assert!(!config.report.include_map);
        assert_eq!(config.report.output_path(), PathBuf::from("dashboard.json"));
        assert_eq!(config.generator.seed, 42);
        assert_eq!(
            config.generator.effective_end_date(),
            NaiveDate::from_ymd_opt(2023, 12, 31).unwrap()
        );
    }

    #[test]
    fn test_default_toml_round_trips() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[data]"));
        assert!(toml_str.contains("[report]"));
        assert!(toml_str.contains("[generator]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_load_reports_broken_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[report\nformat = ").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_merge_report_args() {
        let mut config = Config::default();
        let args = ReportArgs {
            data_dir: Some(PathBuf::from("/tmp/dados")),
            theme: Some(ThemeName::Minimal),
            no_map: true,
            ..ReportArgs::default()
        };

        config.merge_report_args(&args);

        assert_eq!(config.data.dir, "/tmp/dados");
        assert_eq!(config.report.theme, ThemeName::Minimal);
        assert!(!config.report.include_map);
        // Untouched values keep the file's settings.
        assert_eq!(config.report.format, OutputFormat::Markdown);
    }

    #[test]
    fn test_merge_generate_args() {
        let mut config = Config::default();
        let args = GenerateArgs {
            seed: Some(7),
            sales: Some(20),
            geocode: true,
            ..GenerateArgs::default()
        };

        config.merge_generate_args(&args);

        assert_eq!(config.generator.seed, 7);
        assert_eq!(config.generator.sales, 20);
        assert!(config.generator.geocode);
        assert_eq!(config.data.dir, "data");
    }
}
