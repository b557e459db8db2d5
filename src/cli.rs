//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::analysis::{FilterSelection, Selection};
use crate::report::{OutputFormat, ThemeName};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// salesdash - sales dashboard over a star-schema CSV dataset
///
/// Joins the product, customer, seller, supplier and time dimensions to
/// the sales fact table, applies filters and renders KPIs, charts and a
/// customer map as Markdown or JSON.
///
/// Examples:
///   salesdash generate --out-dir data
///   salesdash report --data-dir data --year 2024 --product Tablet,Notebook
///   salesdash report --format json --theme dark -o dashboard.json
///   salesdash options --data-dir data
///   salesdash init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file
    ///
    /// If not specified, looks for .salesdash.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Render the dashboard for a filter selection
    Report(ReportArgs),

    /// List the values each filter can take
    Options(OptionsArgs),

    /// Write a synthetic star-schema dataset
    Generate(GenerateArgs),

    /// Generate a default .salesdash.toml configuration file
    InitConfig,
}

/// Arguments of `salesdash report`.
///
/// A filter flag given without values selects nothing; an absent flag
/// selects every value.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ReportArgs {
    /// Directory holding the CSV tables
    #[arg(short, long, value_name = "DIR", env = "SALESDASH_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Years to include (comma-separated)
    #[arg(long, value_name = "YEARS", num_args = 0.., value_delimiter = ',')]
    pub year: Option<Vec<i32>>,

    /// Products to include (comma-separated)
    #[arg(long, value_name = "NAMES", num_args = 0.., value_delimiter = ',')]
    pub product: Option<Vec<String>>,

    /// Sellers to include (comma-separated)
    #[arg(long, value_name = "NAMES", num_args = 0.., value_delimiter = ',')]
    pub seller: Option<Vec<String>>,

    /// Customers to include (comma-separated)
    #[arg(long, value_name = "NAMES", num_args = 0.., value_delimiter = ',')]
    pub customer: Option<Vec<String>>,

    /// Output format (markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Chart theme (classic, dark, minimal)
    #[arg(long, value_name = "THEME")]
    pub theme: Option<ThemeName>,

    /// Output file path for the dashboard
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Maximum rows per chart table (0 = all)
    #[arg(long, value_name = "COUNT")]
    pub max_rows: Option<usize>,

    /// Leave out the customer map section
    #[arg(long)]
    pub no_map: bool,
}

impl ReportArgs {
    /// The filter selection described by the filter flags.
    pub fn selection(&self) -> FilterSelection {
        FilterSelection {
            years: Selection::from(self.year.clone()),
            products: Selection::from(trimmed(&self.product)),
            sellers: Selection::from(trimmed(&self.seller)),
            customers: Selection::from(trimmed(&self.customer)),
        }
    }
}

fn trimmed(values: &Option<Vec<String>>) -> Option<Vec<String>> {
    values.as_ref().map(|values| {
        values
            .iter()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .collect()
    })
}

/// Arguments of `salesdash options`.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct OptionsArgs {
    /// Directory holding the CSV tables
    #[arg(short, long, value_name = "DIR", env = "SALESDASH_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Print the options as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments of `salesdash generate`.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct GenerateArgs {
    /// Directory to write the CSV tables to
    #[arg(long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// RNG seed
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Number of sales to generate
    #[arg(long, value_name = "COUNT")]
    pub sales: Option<usize>,

    /// First day of the time dimension (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub start_date: Option<NaiveDate>,

    /// Last day of the time dimension (YYYY-MM-DD, default today)
    #[arg(long, value_name = "DATE")]
    pub end_date: Option<NaiveDate>,

    /// Look up customer coordinates with Nominatim
    #[arg(long)]
    pub geocode: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        match &self.command {
            Command::Report(args) => {
                if let Some(ref dir) = args.data_dir {
                    validate_dir(dir)?;
                }
            }
            Command::Options(args) => {
                if let Some(ref dir) = args.data_dir {
                    validate_dir(dir)?;
                }
            }
            Command::Generate(args) => {
                if args.sales == Some(0) {
                    return Err("Sales must be at least 1".to_string());
                }
                if let (Some(start), Some(end)) = (args.start_date, args.end_date) {
                    if start > end {
                        return Err(format!(
                            "Start date {} is after end date {}",
                            start, end
                        ));
                    }
                }
            }
            Command::InitConfig => {}
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Log filter directive. A non-empty `RUST_LOG` value wins over the flags.
    pub fn log_directive(&self, rust_log: Option<String>) -> String {
        match rust_log {
            Some(directive) if !directive.trim().is_empty() => directive,
            _ => self.log_level().to_string().to_lowercase(),
        }
    }
}

fn validate_dir(dir: &Path) -> Result<(), String> {
    if !dir.exists() {
        return Err(format!("Data directory does not exist: {}", dir.display()));
    }
    if !dir.is_dir() {
        return Err(format!("Data path is not a directory: {}", dir.display()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args(command: Command) -> Args {
        Args {
            command,
            config: None,
            verbose: false,
            quiet: false,
        }
    }

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_filter_flags() {
        let args = parse(&[
            "salesdash",
            "report",
            "--year",
            "2023,2024",
            "--product",
            "Tablet, Notebook",
        ]);
        let Command::Report(report) = args.command else {
            panic!("expected report command");
        };
        let selection = report.selection();

        assert_eq!(selection.years, Selection::only([2023, 2024]));
        assert_eq!(
            selection.products,
            Selection::only(["Notebook".to_string(), "Tablet".to_string()])
        );
        assert_eq!(selection.sellers, Selection::AllValues);
    }

    #[test]
    fn test_flag_without_values_selects_nothing() {
        let args = parse(&["salesdash", "report", "--seller"]);
        let Command::Report(report) = args.command else {
            panic!("expected report command");
        };

        assert!(report.selection().sellers.is_empty());
        assert_eq!(report.selection().customers, Selection::AllValues);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = parse(&["salesdash", "options", "-v", "--json"]);
        assert!(args.verbose);
        assert!(matches!(args.command, Command::Options(OptionsArgs { json: true, .. })));

        assert!(Args::try_parse_from(["salesdash", "report", "-v", "-q"]).is_err());
    }

    #[test]
    fn test_generate_args() {
        let args = parse(&[
            "salesdash",
            "generate",
            "--seed",
            "3",
            "--start-date",
            "2024-01-01",
            "--end-date",
            "2024-03-31",
        ]);
        let Command::Generate(generate) = &args.command else {
            panic!("expected generate command");
        };
        assert_eq!(generate.seed, Some(3));
        assert_eq!(generate.start_date, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_date_range() {
        let args = make_args(Command::Generate(GenerateArgs {
            start_date: NaiveDate::from_ymd_opt(2024, 2, 1),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            ..GenerateArgs::default()
        }));
        assert!(args.validate().is_err());

        let args = make_args(Command::Generate(GenerateArgs {
            sales: Some(0),
            ..GenerateArgs::default()
        }));
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_missing_data_dir() {
        let args = make_args(Command::Report(ReportArgs {
            data_dir: Some(PathBuf::from("/definitely/not/here")),
            ..ReportArgs::default()
        }));
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args(Command::InitConfig);
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args(Command::InitConfig);
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }

    #[test]
    fn test_log_directive_prefers_rust_log() {
        let mut args = make_args(Command::InitConfig);
        assert_eq!(args.log_directive(None), "info");
        assert_eq!(args.log_directive(Some("  ".to_string())), "info");

        args.quiet = true;
        assert_eq!(args.log_directive(None), "error");
        assert_eq!(
            args.log_directive(Some("salesdash=trace".to_string())),
            "salesdash=trace"
        );
    }
}
