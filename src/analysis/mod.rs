//! Analysis engines.
//!
//! Join, filter and aggregation, applied in that order to the loaded
//! dataset.

pub mod aggregator;
pub mod filter;
pub mod join;

pub use aggregator::*;
pub use filter::{apply_filters, is_complete, FilterOptions, FilterSelection, Selection};
pub use join::{join_dataset, rederive_year, JoinOutput, JoinStats};
