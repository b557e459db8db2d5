//! Dashboard rendering.
//!
//! Turns a [`DashboardView`] into charts and a Markdown or JSON document.

pub mod chart;
pub mod format;
pub mod generator;
pub mod theme;

pub use chart::{dashboard_charts, ChartBuilder, ChartKind, ChartSpec};
pub use format::{format_brl, format_count, format_percent};
pub use generator::{generate_json_report, generate_markdown_report, render, RenderOptions};
pub use theme::{ChartTheme, ThemeName};

use crate::analysis::JoinStats;
use crate::pipeline::DashboardView;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Output format for the rendered dashboard.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown tables (default)
    #[default]
    Markdown,
    /// JSON document with Vega-Lite chart specs
    Json,
}

/// Facts about the run that produced a report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    pub data_dir: String,
    pub generated_at: DateTime<Utc>,
    /// Fact rows read from disk.
    pub rows_loaded: usize,
    pub rows_joined: usize,
    pub rows_filtered: usize,
    pub join_stats: JoinStats,
    pub theme: ThemeName,
    pub duration_seconds: f64,
}

/// A chart together with its themed Vega-Lite document.
#[derive(Debug, Clone, Serialize)]
pub struct RenderedChart {
    #[serde(flatten)]
    pub chart: ChartSpec,
    pub vega_lite: Value,
}

/// Everything needed to render one dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    pub metadata: ReportMetadata,
    pub view: DashboardView,
    pub charts: Vec<RenderedChart>,
}

impl DashboardReport {
    /// Build the charts for a view and apply the metadata's theme.
    pub fn new(metadata: ReportMetadata, view: DashboardView) -> Self {
        let theme = metadata.theme.theme();
        let charts = dashboard_charts(&view.groups)
            .into_iter()
            .map(|chart| {
                let vega_lite = chart.to_vega_lite(theme.as_ref());
                RenderedChart { chart, vega_lite }
            })
            .collect();

        Self {
            metadata,
            view,
            charts,
        }
    }
}
