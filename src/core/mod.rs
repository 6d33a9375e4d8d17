//! Core building blocks shared by the single cell methods: statistics,
//! smoothing, data structures and spatial indices.

pub mod base;
pub mod data;
pub mod errors;
pub mod graph;
