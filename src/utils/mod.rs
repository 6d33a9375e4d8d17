//! General utilities: assertion macros and the R <> Rust conversions.

pub mod macros;
#[cfg(feature = "r")]
pub mod r_rust_interface;
