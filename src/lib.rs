pub mod core;
pub mod single_cell;
pub mod utils;

#[cfg(feature = "r")]
mod r_bindings;

#[cfg(feature = "r")]
use extendr_api::prelude::*;

#[cfg(feature = "r")]
pub use r_bindings::r_single_cell::r_niche;

#[cfg(feature = "r")]
extendr_module! {
    mod nichetrace;
    use r_niche;
}
