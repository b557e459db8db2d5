//! salesdash - sales dashboard over a star-schema CSV dataset
//!
//! Loads the dimension and fact tables, applies the requested filters
//! and writes the dashboard as Markdown or JSON.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (missing table, bad config, write failure, etc.)

use anyhow::{Context, Result};
use chrono::Utc;
use salesdash::cli::{Args, Command, GenerateArgs, OptionsArgs, ReportArgs};
use salesdash::config::{Config, CONFIG_FILE_NAME};
use salesdash::dataset::{DataSources, Dataset};
use salesdash::generator::{self, Geocoder, GeocoderSettings, GeneratorSettings};
use salesdash::pipeline::{MapView, Pipeline};
use salesdash::report::{self, format_brl, format_count, DashboardReport, ReportMetadata};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle init-config early (no logging needed)
    if matches!(args.command, Command::InitConfig) {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("salesdash v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    let result = match args.command {
        Command::Report(ref report_args) => run_report(&args, report_args),
        Command::Options(ref options_args) => run_options(&args, options_args),
        Command::Generate(ref generate_args) => run_generate(&args, generate_args).await,
        Command::InitConfig => Ok(()),
    };

    if let Err(e) = result {
        error!("salesdash failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle init-config: generate a default .salesdash.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to customize the data directory, theme, generator seed, and more.");
    Ok(())
}

/// Initialize logging based on verbosity settings and `RUST_LOG`.
fn init_logging(args: &Args) {
    let directive = args.log_directive(std::env::var("RUST_LOG").ok());
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|e| {
        eprintln!("Ignoring invalid RUST_LOG '{}': {}", directive, e);
        EnvFilter::new(args.log_level().to_string().to_lowercase())
    });

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Load, filter, aggregate and render the dashboard.
fn run_report(args: &Args, report_args: &ReportArgs) -> Result<()> {
    let start_time = Instant::now();

    let mut config = load_config(args)?;
    config.merge_report_args(report_args);

    // Step 1: Load and join
    let data_dir = PathBuf::from(&config.data.dir);
    if !args.quiet {
        println!("📥 Loading dataset from: {}", data_dir.display());
    }
    let dataset = Dataset::load(&DataSources::in_dir(&data_dir, &config.data))
        .with_context(|| format!("Failed to load dataset from {}", data_dir.display()))?;
    let pipeline = Pipeline::new(&dataset);

    let stats = pipeline.join_stats();
    if stats.dropped() > 0 {
        debug!(
            "Join dropped {} sales (product {}, customer {}, seller {}, supplier {}, time {})",
            stats.dropped(),
            stats.unmatched_product,
            stats.unmatched_customer,
            stats.unmatched_seller,
            stats.unmatched_supplier,
            stats.unmatched_time
        );
    }

    // Step 2: Filter and aggregate
    let selection = report_args.selection();
    if selection.selects_nothing() {
        warn!("A filter selects no values; the dashboard will be empty");
    }
    let view = pipeline.run(&selection);

    // Step 3: Render and save
    let metadata = ReportMetadata {
        data_dir: data_dir.display().to_string(),
        generated_at: Utc::now(),
        rows_loaded: dataset.sales.len(),
        rows_joined: pipeline.base().len(),
        rows_filtered: view.filtered.len(),
        join_stats: stats.clone(),
        theme: config.report.theme,
        duration_seconds: start_time.elapsed().as_secs_f64(),
    };
    let kpis = view.kpis.clone();
    let map_points = match &view.map {
        MapView::Points { points } => Some(points.len()),
        MapView::Unavailable { .. } => None,
    };

    let dashboard = DashboardReport::new(metadata, view);
    let output = report::render(
        &dashboard,
        config.report.format,
        config.report.render_options(),
    )?;

    let output_path = config.report.output_path();
    std::fs::write(&output_path, &output)
        .with_context(|| format!("Failed to write dashboard to {}", output_path.display()))?;

    // Print summary
    if !args.quiet {
        println!("\n📊 Dashboard Summary:");
        println!("   Total de Vendas: {}", format_brl(kpis.total_sales));
        println!("   Nº de Vendas: {}", format_count(kpis.sale_count));
        println!("   Clientes Ativos: {}", format_count(kpis.active_customers));
        match map_points {
            Some(count) => println!("   Map: {} customer locations", count),
            None => println!("   Map: unavailable"),
        }
        println!(
            "\n✅ Dashboard saved to: {} ({:.1}s)",
            output_path.display(),
            start_time.elapsed().as_secs_f64()
        );
    }

    Ok(())
}

/// Print the values each filter can take.
fn run_options(args: &Args, options_args: &OptionsArgs) -> Result<()> {
    let mut config = load_config(args)?;
    if let Some(ref dir) = options_args.data_dir {
        config.data.dir = dir.display().to_string();
    }

    let sources = DataSources::from_config(&config.data);
    let pipeline = Pipeline::load(&sources)
        .with_context(|| format!("Failed to load dataset from {}", config.data.dir))?;
    let options = pipeline.options();

    if options_args.json {
        println!("{}", serde_json::to_string_pretty(&options)?);
        return Ok(());
    }

    let years: Vec<String> = options.years.iter().map(|y| y.to_string()).collect();
    println!("📅 Ano: {}", years.join(", "));
    println!("📦 Produto: {}", options.products.join(", "));
    println!("🧑‍💼 Vendedor: {}", options.sellers.join(", "));
    println!("🏢 Cliente: {}", options.customers.join(", "));

    Ok(())
}

/// Generate the synthetic dataset and write it to disk.
async fn run_generate(args: &Args, generate_args: &GenerateArgs) -> Result<()> {
    let mut config = load_config(args)?;
    config.merge_generate_args(generate_args);

    let settings = GeneratorSettings::from(&config.generator);
    println!(
        "🎲 Generating {} sales from {} to {} (seed {})",
        settings.sales, settings.start_date, settings.end_date, settings.seed
    );

    let mut dataset = generator::generate(&settings)?;

    if config.generator.geocode {
        println!("🌍 Geocoding customers via {}", config.generator.nominatim_url);
        let geocoder = Geocoder::new(GeocoderSettings::from(&config.generator))
            .context("Failed to create geocoding client")?;
        let located = geocoder
            .geocode_customers(&mut dataset.customers, !args.quiet)
            .await;
        println!("   Located {}/{} customers", located, dataset.customers.len());
    }

    let out_dir = PathBuf::from(&config.data.dir);
    generator::write_dataset(&dataset, &out_dir, &config.data)?;

    println!("\n✅ Dataset written to: {}", out_dir.display());
    Ok(())
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {:#}", e);
            Ok(Config::default())
        }
    }
}
