//! Contains the single cell niche functionalities that are exposed to R.
//! Builds on the statistics, smoothing and spatial index parts of `core`.

pub mod methods;
pub mod niche_analysis;
