//! Analysis modules.
//!
//! Aggregation, ratios and categorical profiling over loaded datasets,
//! plus the Humber embankment summary built on top of them.

pub mod aggregator;
pub mod embankments;
pub mod profiler;
pub mod ratio;

pub use embankments::{summarize, HumberDatasets};
pub use ratio::round_to;
