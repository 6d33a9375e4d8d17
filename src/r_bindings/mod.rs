//! The R bindings, only compiled with the `r` feature.

pub mod r_single_cell;
