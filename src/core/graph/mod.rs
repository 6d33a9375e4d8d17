//! Spatial neighbour lookups

pub mod spatial_index;
