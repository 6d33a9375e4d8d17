//! Module containing key statistic functions, i.e., subset summaries,
//! enrichment ratios and 1D smoothing of binned trajectories.

pub mod smoothing;
pub mod stats;
