//! Markdown and JSON dashboard rendering.
//!
//! The Markdown document mirrors the interactive dashboard page: active
//! filters, the KPI row, one table per chart and the customer map.

use super::format::{format_brl, format_count, format_percent};
use super::{ChartKind, DashboardReport, OutputFormat, RenderedChart, ReportMetadata};
use crate::analysis::{shares, FilterSelection, Kpis, Selection};
use crate::models::AggregateRow;
use crate::pipeline::MapView;
use anyhow::Result;
use std::fmt::Display;

const EMPTY_SELECTION_NOTICE: &str = "Nenhum dado disponível para os filtros selecionados.";

/// Markdown rendering knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Rows per chart table; 0 keeps every row.
    pub max_rows: usize,
    pub include_map: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            max_rows: 0,
            include_map: true,
        }
    }
}

/// Render a report in the requested format.
pub fn render(
    report: &DashboardReport,
    format: OutputFormat,
    options: RenderOptions,
) -> Result<String> {
    match format {
        OutputFormat::Markdown => Ok(generate_markdown_report(report, options)),
        OutputFormat::Json => generate_json_report(report),
    }
}

/// Generate the complete Markdown dashboard.
pub fn generate_markdown_report(report: &DashboardReport, options: RenderOptions) -> String {
    let mut output = String::new();

    output.push_str("# Dashboard de Vendas\n\n");

    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_filters_section(&report.view.selection));
    output.push_str(&generate_kpi_section(&report.view.kpis));

    if report.view.filtered.is_empty() {
        output.push_str(&format!("> ⚠️ {}\n\n", EMPTY_SELECTION_NOTICE));
    }

    for chart in &report.charts {
        output.push_str(&generate_chart_section(chart, options.max_rows));
    }

    if options.include_map {
        output.push_str(&generate_map_section(&report.view.map));
    }

    output.push_str(&generate_footer());

    output
}

fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str(&format!("- **Dados:** `{}`\n", metadata.data_dir));
    section.push_str(&format!(
        "- **Gerado em:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Vendas carregadas:** {} ({} após junção, {} após filtros)\n",
        format_count(metadata.rows_loaded),
        format_count(metadata.rows_joined),
        format_count(metadata.rows_filtered)
    ));
    section.push_str(&format!("- **Tema:** {}\n", metadata.theme));
    section.push_str(&format!(
        "- **Duração:** {:.2}s\n\n",
        metadata.duration_seconds
    ));

    section
}

fn generate_filters_section(selection: &FilterSelection) -> String {
    let mut section = String::new();

    section.push_str("## Filtros\n\n");
    section.push_str("| Filtro | Seleção |\n");
    section.push_str("|:---|:---|\n");
    section.push_str(&format!("| Ano | {} |\n", describe_selection(&selection.years)));
    section.push_str(&format!(
        "| Produto | {} |\n",
        describe_selection(&selection.products)
    ));
    section.push_str(&format!(
        "| Vendedor | {} |\n",
        describe_selection(&selection.sellers)
    ));
    section.push_str(&format!(
        "| Cliente | {} |\n\n",
        describe_selection(&selection.customers)
    ));

    section
}

fn describe_selection<T: Ord + Display>(selection: &Selection<T>) -> String {
    match selection {
        Selection::AllValues => "Todos".to_string(),
        Selection::Only(values) if values.is_empty() => "_(nenhum)_".to_string(),
        Selection::Only(values) => values
            .iter()
            .map(|v| escape_cell(&v.to_string()))
            .collect::<Vec<_>>()
            .join(", "),
    }
}

fn generate_kpi_section(kpis: &Kpis) -> String {
    let mut section = String::new();

    section.push_str("## Indicadores\n\n");
    section.push_str("| Total de Vendas | Nº de Vendas | Clientes Ativos |\n");
    section.push_str("|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} |\n\n",
        format_brl(kpis.total_sales),
        format_count(kpis.sale_count),
        format_count(kpis.active_customers)
    ));

    section
}

fn generate_chart_section(rendered: &RenderedChart, max_rows: usize) -> String {
    let chart = &rendered.chart;
    let mut section = String::new();

    section.push_str(&format!("## {}\n\n", chart.title));

    if chart.is_empty() {
        section.push_str("_Sem dados._\n\n");
        return section;
    }

    let rows: Vec<AggregateRow<&str>> = chart
        .data
        .iter()
        .map(|(key, value)| AggregateRow {
            key: key.as_str(),
            total_value: *value,
        })
        .collect();
    let shown = if max_rows == 0 {
        rows.len()
    } else {
        max_rows.min(rows.len())
    };

    if chart.kind == ChartKind::Pie {
        section.push_str(&format!(
            "| {} | {} | Participação |\n",
            chart.category_label, chart.value_label
        ));
        section.push_str("|:---|---:|---:|\n");
        for (row, (_, share)) in rows.iter().zip(shares(&rows)).take(shown) {
            section.push_str(&format!(
                "| {} | {} | {} |\n",
                escape_cell(row.key),
                format_brl(row.total_value),
                format_percent(share)
            ));
        }
    } else {
        section.push_str(&format!(
            "| {} | {} |\n",
            chart.category_label, chart.value_label
        ));
        section.push_str("|:---|---:|\n");
        for row in rows.iter().take(shown) {
            section.push_str(&format!(
                "| {} | {} |\n",
                escape_cell(row.key),
                format_brl(row.total_value)
            ));
        }
    }

    if shown < rows.len() {
        section.push_str(&format!("\n_… e mais {} linhas._\n", rows.len() - shown));
    }
    section.push('\n');

    section
}

fn generate_map_section(map: &MapView) -> String {
    let mut section = String::new();

    section.push_str("## Mapa de Clientes\n\n");

    match map {
        MapView::Unavailable { reason } => {
            section.push_str(&format!("> ⚠️ Mapa indisponível: {}\n\n", reason));
        }
        MapView::Points { points } => {
            section.push_str("| Cliente | Cidade | Latitude | Longitude | Valor Total | Vendas |\n");
            section.push_str("|:---|:---|---:|---:|---:|---:|\n");
            for point in points {
                section.push_str(&format!(
                    "| {} | {}/{} | {:.4} | {:.4} | {} | {} |\n",
                    escape_cell(&point.customer_name),
                    escape_cell(&point.city),
                    escape_cell(&point.state),
                    point.latitude,
                    point.longitude,
                    format_brl(point.total_value),
                    format_count(point.sale_count)
                ));
            }
            section.push('\n');
        }
    }

    section
}

fn generate_footer() -> String {
    format!(
        "---\n\n*Gerado por salesdash v{}*\n",
        env!("CARGO_PKG_VERSION")
    )
}

/// Keep user-supplied names from breaking table rows.
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

/// Generate the JSON document: metadata, the full view and every chart
/// with its Vega-Lite spec.
pub fn generate_json_report(report: &DashboardReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}
