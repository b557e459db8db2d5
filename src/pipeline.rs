//! The dashboard pipeline.
//!
//! [`Pipeline`] joins the dataset once into an immutable base table.
//! [`Pipeline::run`] is then a pure function from a [`FilterSelection`] to
//! a [`DashboardView`]: every call filters and aggregates from scratch,
//! and nothing is cached between calls. The pipeline is `Send + Sync`, so
//! one loaded instance can serve concurrent readers behind an `Arc`.

use crate::analysis::{
    apply_filters, compute_view, join_dataset, map_points, FilterOptions, FilterSelection,
    GroupedSums, JoinStats, Kpis, MapPoint,
};
use crate::dataset::{DataSources, Dataset};
use crate::error::LoadError;
use crate::models::DenormalizedSale;
use serde::Serialize;
use tracing::{debug, info};

/// What the map view can show for a selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MapView {
    /// One point per customer location in the filtered table.
    Points { points: Vec<MapPoint> },
    /// The map is skipped; the reason is shown to the user instead.
    Unavailable { reason: String },
}

impl MapView {
    fn build(rows: &[DenormalizedSale], has_coordinates: bool) -> Self {
        if !has_coordinates {
            return MapView::Unavailable {
                reason: "Customer table has no latitude/longitude columns".to_string(),
            };
        }

        let points = map_points(rows);
        if points.is_empty() {
            MapView::Unavailable {
                reason: "No customer in the current selection has coordinates".to_string(),
            }
        } else {
            MapView::Points { points }
        }
    }
}

/// Everything the presentation layer needs for one filter selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub selection: FilterSelection,
    pub kpis: Kpis,
    pub groups: GroupedSums,
    pub map: MapView,
    /// The filtered, cleaned table the KPIs and groups were computed from.
    pub filtered: Vec<DenormalizedSale>,
}

/// A loaded dataset, joined once and ready to answer filter selections.
#[derive(Debug, Clone)]
pub struct Pipeline {
    base: Vec<DenormalizedSale>,
    join_stats: JoinStats,
    has_coordinates: bool,
}

impl Pipeline {
    /// Join a loaded dataset into the base table.
    pub fn new(dataset: &Dataset) -> Self {
        let joined = join_dataset(dataset);
        info!("Pipeline ready with {} joined sales", joined.stats.joined_rows);

        Self {
            base: joined.rows,
            join_stats: joined.stats,
            has_coordinates: dataset.has_coordinates,
        }
    }

    /// Load the dataset from disk and build the pipeline.
    pub fn load(sources: &DataSources) -> Result<Self, LoadError> {
        let dataset = Dataset::load(sources)?;
        Ok(Self::new(&dataset))
    }

    /// The unfiltered denormalized table.
    pub fn base(&self) -> &[DenormalizedSale] {
        &self.base
    }

    /// Row counts from the join.
    pub fn join_stats(&self) -> &JoinStats {
        &self.join_stats
    }

    /// Whether the customer table carried coordinates.
    pub fn has_coordinates(&self) -> bool {
        self.has_coordinates
    }

    /// The values each filter can take.
    pub fn options(&self) -> FilterOptions {
        FilterOptions::from_table(&self.base)
    }

    /// Filter and aggregate for one selection.
    pub fn run(&self, selection: &FilterSelection) -> DashboardView {
        debug!("Running pipeline for selection {:?}", selection);

        let filtered = apply_filters(&self.base, selection);
        let (kpis, groups) = compute_view(&filtered);
        let map = MapView::build(&filtered, self.has_coordinates);

        DashboardView {
            selection: selection.clone(),
            kpis,
            groups,
            map,
            filtered,
        }
    }
}
