//! salesdash - sales dashboard over a star-schema dataset.
//!
//! The core is a pipeline of pure stages: the [`dataset`] loader reads
//! the dimension and fact tables, [`analysis`] joins, filters and
//! aggregates them, and [`pipeline::Pipeline`] ties the stages together
//! behind a single `run(selection)` call. [`report`] renders the result.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod error;
pub mod generator;
pub mod models;
pub mod pipeline;
pub mod report;

pub use analysis::{FilterSelection, Selection};
pub use dataset::{DataSources, Dataset};
pub use error::{GeocodeError, LoadError};
pub use pipeline::{DashboardView, MapView, Pipeline};
