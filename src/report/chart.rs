//! Chart definitions.
//!
//! Charts are plain data: a kind, labels and `(category, value)` pairs.
//! [`ChartBuilder`] assembles them; [`ChartSpec::to_vega_lite`] renders
//! one as a Vega-Lite v5 document with the chosen theme applied.

use super::theme::ChartTheme;
use crate::analysis::{sort_by_value_desc, GroupedSums};
use crate::models::{AggregateRow, Dimension};
use serde::Serialize;
use serde_json::{json, Value};

const VEGA_LITE_SCHEMA: &str = "https://vega.github.io/schema/vega-lite/v5.json";
const VALUE_LABEL: &str = "Valor Total";

/// Chart type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Line,
    Bar,
    Pie,
}

/// A chart ready for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub id: String,
    pub title: String,
    pub kind: ChartKind,
    pub category_label: String,
    pub value_label: String,
    pub data: Vec<(String, f64)>,
}

impl ChartSpec {
    /// Render as a Vega-Lite document.
    pub fn to_vega_lite(&self, theme: &dyn ChartTheme) -> Value {
        let values: Vec<Value> = self
            .data
            .iter()
            .map(|(category, value)| json!({ "category": category, "value": value }))
            .collect();

        let mut spec = json!({
            "$schema": VEGA_LITE_SCHEMA,
            "title": self.title,
            "width": "container",
            "data": { "values": values },
            "config": theme.vega_config(),
        });

        let value_axis = json!({
            "field": "value",
            "type": "quantitative",
            "title": self.value_label,
        });

        match self.kind {
            ChartKind::Bar => {
                spec["mark"] = json!({ "type": "bar", "tooltip": true });
                spec["encoding"] = json!({
                    // Keep the data order instead of sorting alphabetically.
                    "x": {
                        "field": "category",
                        "type": "nominal",
                        "title": self.category_label,
                        "sort": null,
                    },
                    "y": value_axis,
                });
            }
            ChartKind::Line => {
                spec["mark"] = json!({ "type": "line", "point": true, "tooltip": true });
                spec["encoding"] = json!({
                    "x": {
                        "field": "category",
                        "type": "ordinal",
                        "title": self.category_label,
                    },
                    "y": value_axis,
                });
            }
            ChartKind::Pie => {
                spec["mark"] = json!({ "type": "arc", "tooltip": true });
                spec["encoding"] = json!({
                    "theta": { "field": "value", "type": "quantitative" },
                    "color": {
                        "field": "category",
                        "type": "nominal",
                        "title": self.category_label,
                    },
                });
            }
        }

        spec
    }

    /// Whether there is anything to draw.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Fluent builder for [`ChartSpec`].
#[derive(Debug, Clone)]
pub struct ChartBuilder {
    spec: ChartSpec,
}

impl ChartBuilder {
    pub fn new(id: &str, kind: ChartKind) -> Self {
        Self {
            spec: ChartSpec {
                id: id.to_string(),
                title: String::new(),
                kind,
                category_label: String::new(),
                value_label: VALUE_LABEL.to_string(),
                data: Vec::new(),
            },
        }
    }

    pub fn title(mut self, title: &str) -> Self {
        self.spec.title = title.to_string();
        self
    }

    pub fn category_label(mut self, label: &str) -> Self {
        self.spec.category_label = label.to_string();
        self
    }

    /// Use a grouped table as the chart data, keeping its order.
    pub fn rows<K: ToString>(mut self, rows: &[AggregateRow<K>]) -> Self {
        self.spec.data = rows
            .iter()
            .map(|r| (r.key.to_string(), r.total_value))
            .collect();
        self
    }

    /// Use a grouped table as the chart data, largest value first.
    pub fn rows_by_value<K: ToString + Clone>(self, rows: &[AggregateRow<K>]) -> Self {
        let mut sorted = rows.to_vec();
        sort_by_value_desc(&mut sorted);
        self.rows(&sorted)
    }

    pub fn build(self) -> ChartSpec {
        self.spec
    }
}

/// The dashboard's charts, in page order.
pub fn dashboard_charts(groups: &GroupedSums) -> Vec<ChartSpec> {
    let over_time = ChartBuilder::new("sales_over_time", ChartKind::Line)
        .title("Vendas ao Longo do Tempo")
        .category_label(Dimension::Year.label())
        .rows(&groups.table(Dimension::Year))
        .build();

    let ranked = [
        ("Total de Vendas por Produto", Dimension::Product, ChartKind::Bar),
        ("Total de Vendas por Vendedor", Dimension::Seller, ChartKind::Bar),
        ("Participação de vendas por produto", Dimension::Product, ChartKind::Pie),
        ("Vendas por Cliente", Dimension::Customer, ChartKind::Bar),
        ("Vendas por Fornecedor", Dimension::Supplier, ChartKind::Bar),
    ];

    std::iter::once(over_time)
        .chain(ranked.into_iter().map(|(title, dimension, kind)| {
            let id = match kind {
                ChartKind::Pie => format!("{}_share", dimension),
                _ => format!("sales_by_{}", dimension),
            };
            ChartBuilder::new(&id, kind)
                .title(title)
                .category_label(dimension.label())
                .rows_by_value(&groups.table(dimension))
                .build()
        }))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::theme::{ClassicTheme, MinimalTheme};

    fn groups() -> GroupedSums {
        GroupedSums {
            by_product: vec![
                AggregateRow {
                    key: "Notebook".to_string(),
                    total_value: 100.0,
                },
                AggregateRow {
                    key: "Tablet".to_string(),
                    total_value: 300.0,
                },
            ],
            by_year: vec![
                AggregateRow {
                    key: 2023,
                    total_value: 150.0,
                },
                AggregateRow {
                    key: 2024,
                    total_value: 250.0,
                },
            ],
            ..GroupedSums::default()
        }
    }

    #[test]
    fn test_dashboard_charts_order_and_sorting() {
        let charts = dashboard_charts(&groups());
        assert_eq!(charts.len(), 6);

        let over_time = &charts[0];
        assert_eq!(over_time.kind, ChartKind::Line);
        assert_eq!(over_time.data[0], ("2023".to_string(), 150.0));

        let by_product = &charts[1];
        assert_eq!(by_product.data[0].0, "Tablet");
        assert_eq!(by_product.data[1].0, "Notebook");

        assert!(charts[2].is_empty());

        let ids: Vec<_> = charts.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "sales_over_time",
                "sales_by_product",
                "sales_by_seller",
                "product_share",
                "sales_by_customer",
                "sales_by_supplier",
            ]
        );
    }

    #[test]
    fn test_bar_to_vega_lite() {
        let chart = ChartBuilder::new("x", ChartKind::Bar)
            .title("Vendas")
            .category_label("Produto")
            .rows(&groups().by_product)
            .build();

        let spec = chart.to_vega_lite(&ClassicTheme);
        assert_eq!(spec["$schema"], VEGA_LITE_SCHEMA);
        assert_eq!(spec["mark"]["type"], "bar");
        assert_eq!(spec["encoding"]["x"]["title"], "Produto");
        assert_eq!(spec["data"]["values"][1]["category"], "Tablet");
        assert_eq!(spec["data"]["values"][1]["value"], 300.0);
        assert_eq!(spec["config"]["background"], "#ffffff");
    }

    #[test]
    fn test_pie_and_line_marks() {
        let pie = ChartBuilder::new("p", ChartKind::Pie).build();
        let line = ChartBuilder::new("l", ChartKind::Line).build();

        let pie_spec = pie.to_vega_lite(&MinimalTheme);
        assert_eq!(pie_spec["mark"]["type"], "arc");
        assert!(pie_spec["encoding"]["theta"].is_object());

        let line_spec = line.to_vega_lite(&MinimalTheme);
        assert_eq!(line_spec["mark"]["type"], "line");
        assert_eq!(line_spec["encoding"]["x"]["type"], "ordinal");
    }
}
