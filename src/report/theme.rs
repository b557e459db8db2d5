//! Chart themes.
//!
//! A theme decides chart cosmetics only: palette, background, fonts and
//! grid lines. Charts are built once from the dashboard data and the
//! theme is applied last, so switching themes never touches the data.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

/// Cosmetic strategy applied to every chart.
pub trait ChartTheme: Send + Sync {
    /// Theme name as used in configuration.
    fn name(&self) -> &'static str;

    /// Category colors, cycled across series and slices.
    fn palette(&self) -> &'static [&'static str];

    fn background(&self) -> &'static str;

    fn text_color(&self) -> &'static str;

    fn font(&self) -> &'static str {
        "Helvetica, Arial, sans-serif"
    }

    fn show_grid(&self) -> bool {
        true
    }

    /// Vega-Lite `config` block for this theme.
    fn vega_config(&self) -> Value {
        json!({
            "background": self.background(),
            "font": self.font(),
            "range": { "category": self.palette() },
            "title": { "color": self.text_color(), "fontSize": 16 },
            "axis": {
                "labelColor": self.text_color(),
                "titleColor": self.text_color(),
                "grid": self.show_grid(),
            },
            "legend": {
                "labelColor": self.text_color(),
                "titleColor": self.text_color(),
            },
            "view": { "stroke": null },
        })
    }
}

/// Plotly-like defaults on a white background.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassicTheme;

impl ChartTheme for ClassicTheme {
    fn name(&self) -> &'static str {
        "classic"
    }

    fn palette(&self) -> &'static [&'static str] {
        &[
            "#636efa", "#ef553b", "#00cc96", "#ab63fa", "#ffa15a", "#19d3f3", "#ff6692",
        ]
    }

    fn background(&self) -> &'static str {
        "#ffffff"
    }

    fn text_color(&self) -> &'static str {
        "#2a3f5f"
    }
}

/// Light text on a dark background.
#[derive(Debug, Clone, Copy, Default)]
pub struct DarkTheme;

impl ChartTheme for DarkTheme {
    fn name(&self) -> &'static str {
        "dark"
    }

    fn palette(&self) -> &'static [&'static str] {
        &[
            "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2",
        ]
    }

    fn background(&self) -> &'static str {
        "#0e1117"
    }

    fn text_color(&self) -> &'static str {
        "#fafafa"
    }
}

/// Muted palette, no grid lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct MinimalTheme;

impl ChartTheme for MinimalTheme {
    fn name(&self) -> &'static str {
        "minimal"
    }

    fn palette(&self) -> &'static [&'static str] {
        &["#4c78a8", "#9ecae9", "#72b7b2", "#b9b9b9", "#54a24b"]
    }

    fn background(&self) -> &'static str {
        "#fbfbfb"
    }

    fn text_color(&self) -> &'static str {
        "#333333"
    }

    fn font(&self) -> &'static str {
        "Inter, sans-serif"
    }

    fn show_grid(&self) -> bool {
        false
    }
}

/// Selectable theme names.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ThemeName {
    #[default]
    Classic,
    Dark,
    Minimal,
}

impl ThemeName {
    /// The theme implementation for this name.
    pub fn theme(&self) -> Box<dyn ChartTheme> {
        match self {
            ThemeName::Classic => Box::new(ClassicTheme),
            ThemeName::Dark => Box::new(DarkTheme),
            ThemeName::Minimal => Box::new(MinimalTheme),
        }
    }
}

impl fmt::Display for ThemeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.theme().name())
    }
}
