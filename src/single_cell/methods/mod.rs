//! The individual pieces of the niche analysis: pseudotime binning, early
//! induction calls, the candidate gene cascade and the spatial scores.

pub mod early_induction;
pub mod niche_filter;
pub mod niche_scores;
pub mod pseudotime_bins;

#[cfg(test)]
pub mod test_data;
