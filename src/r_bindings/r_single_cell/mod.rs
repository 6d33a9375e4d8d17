//! Everything and anything related to the Rust <> R interface for single
//! cell niche analyses.

pub mod r_niche;
