//! Module containing anything and everything related to data and data
//! structures

pub mod niche_data;
pub mod synthetic_data;
