use statrs::statistics::Statistics;

/// Pseudo count added to the denominator of enrichment ratios
pub const ENRICHMENT_EPS: f64 = 1e-9;

////////////////
// Structures //
////////////////

/// Summary statistics of one gene over a subset of cells
///
/// ### Fields
///
/// * `mean` - Mean expression. `NaN` for empty subsets.
/// * `sd` - Sample standard deviation (n - 1 denominator). `NaN` for subsets
///   with fewer than two cells.
/// * `detection` - Fraction of cells with expression > 0. `0` for empty
///   subsets.
#[derive(Clone, Copy, Debug)]
pub struct SubsetStats {
    pub mean: f64,
    pub sd: f64,
    pub detection: f64,
}

///////////////
// Functions //
///////////////

/// Calculate mean, standard deviation and detection rate of a vector
///
/// ### Params
///
/// * `values` - Expression values of a gene within the subset
///
/// ### Returns
///
/// The `SubsetStats`
pub fn subset_stats(values: &[f64]) -> SubsetStats {
    let n_expressed = values.iter().filter(|&&v| v > 0.0).count();
    let detection = if values.is_empty() {
        0.0
    } else {
        n_expressed as f64 / values.len() as f64
    };

    SubsetStats {
        mean: values.iter().mean(),
        sd: values.iter().std_dev(),
        detection,
    }
}

/// Mean of a vector, `NaN` if empty
#[inline]
pub fn mean_or_nan(values: &[f64]) -> f64 {
    values.iter().mean()
}

/// Ratio of two means with a pseudo count in the denominator
///
/// ### Params
///
/// * `numerator` - Mean of the group of interest
/// * `denominator` - Mean of the reference group
///
/// ### Returns
///
/// `numerator / (denominator + ENRICHMENT_EPS)`
#[inline]
pub fn enrichment_ratio(numerator: f64, denominator: f64) -> f64 {
    numerator / (denominator + ENRICHMENT_EPS)
}

/// Fraction of hits with a floor of one on the denominator
#[inline]
pub fn floored_fraction(hits: usize, total: usize) -> f64 {
    hits as f64 / total.max(1) as f64
}

///////////
// Tests //
///////////
