use faer::{Mat, MatRef};

use crate::assert_same_len;

////////////////
// Structures //
////////////////

/// Equal width pseudotime bins over one cell subset
///
/// ### Fields
///
/// * `edges` - The `n_bins + 1` bin edges. The first edge is the minimum,
///   the last edge the maximum pseudotime of the subset.
/// * `centres` - The bin midpoints
/// * `assignment` - Bin index per cell of the subset, `None` for cells
///   without a finite pseudotime.
/// * `counts` - Number of cells per bin
#[derive(Clone, Debug)]
pub struct PseudotimeBins {
    pub edges: Vec<f64>,
    pub centres: Vec<f64>,
    pub assignment: Vec<Option<usize>>,
    pub counts: Vec<usize>,
}

impl PseudotimeBins {
    /// Bin the pseudotime of a cell subset
    ///
    /// The first bin includes its lower edge, every bin includes its upper
    /// edge.
    ///
    /// ### Params
    ///
    /// * `pseudotime` - Pseudotime values of the subset. Non-finite values
    ///   are not binned.
    /// * `n_bins` - Number of bins. Needs to be ≥ 1.
    ///
    /// ### Returns
    ///
    /// The bins, or `None` if the subset holds no cell with a finite
    /// pseudotime.
    pub fn new(pseudotime: &[f64], n_bins: usize) -> Option<Self> {
        assert!(n_bins > 0, "n_bins must be positive");

        let (min, max) = pseudotime
            .iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc: Option<(f64, f64)>, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })?;

        let edges = linspace(min, max, n_bins + 1);
        let centres: Vec<f64> = edges.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect();

        let mut counts = vec![0_usize; n_bins];
        let assignment: Vec<Option<usize>> = pseudotime
            .iter()
            .map(|&v| {
                if !v.is_finite() {
                    return None;
                }
                // number of inner right edges strictly below v
                let idx = edges[1..].partition_point(|&e| e < v).min(n_bins - 1);
                counts[idx] += 1;
                Some(idx)
            })
            .collect();

        Some(Self {
            edges,
            centres,
            assignment,
            counts,
        })
    }

    pub fn n_bins(&self) -> usize {
        self.centres.len()
    }

    /// Per-bin mean of one value per cell of the subset
    ///
    /// ### Params
    ///
    /// * `values` - One value per cell, in the order used for binning
    ///
    /// ### Returns
    ///
    /// Vector of length `n_bins`. Bins without cells are `0`.
    pub fn bin_means(&self, values: &[f64]) -> Vec<f64> {
        assert_same_len!(values, self.assignment);

        let mut sums = vec![0.0; self.n_bins()];
        for (v, bin) in values.iter().zip(self.assignment.iter()) {
            if let Some(b) = bin {
                sums[*b] += v;
            }
        }
        sums.iter()
            .zip(self.counts.iter())
            .map(|(s, &c)| if c > 0 { s / c as f64 } else { 0.0 })
            .collect()
    }
}

/// Binned expression trajectory of a cell subset
///
/// ### Fields
///
/// * `centres` - The bin midpoints
/// * `counts` - Number of cells per bin
/// * `means` - Mean expression with bins as rows and the requested genes
///   as columns. Empty bins are zero filled.
#[derive(Clone, Debug)]
pub struct PseudotimeTrajectory {
    pub centres: Vec<f64>,
    pub counts: Vec<usize>,
    pub means: Mat<f64>,
}

impl PseudotimeTrajectory {
    /// Trajectory of the gene in column `col`
    pub fn gene_trajectory(&self, col: usize) -> Vec<f64> {
        self.means.col(col).iter().copied().collect()
    }
}

///////////////
// Functions //
///////////////

/// Equally spaced values, the last one set to `stop` exactly
fn linspace(start: f64, stop: f64, num: usize) -> Vec<f64> {
    if num == 1 {
        return vec![start];
    }
    let step = (stop - start) / (num - 1) as f64;
    let mut res: Vec<f64> = (0..num).map(|i| start + i as f64 * step).collect();
    res[num - 1] = stop;
    res
}

/// Bin a cell subset by pseudotime and average expression per bin
///
/// ### Params
///
/// * `expr` - Expression matrix (cells x genes)
/// * `cells` - Row indices of the subset
/// * `pseudotime` - Pseudotime of all cells (indexed like the rows of
///   `expr`)
/// * `genes` - Column indices of the genes to aggregate
/// * `n_bins` - Number of bins
///
/// ### Returns
///
/// The `PseudotimeTrajectory` with one column per entry of `genes`, or
/// `None` if the subset is empty or has no finite pseudotime.
pub fn bin_trajectory(
    expr: MatRef<f64>,
    cells: &[usize],
    pseudotime: &[f64],
    genes: &[usize],
    n_bins: usize,
) -> Option<PseudotimeTrajectory> {
    if cells.is_empty() {
        return None;
    }

    let subset_pt: Vec<f64> = cells.iter().map(|&c| pseudotime[c]).collect();
    let bins = PseudotimeBins::new(&subset_pt, n_bins)?;

    let per_gene: Vec<Vec<f64>> = genes
        .iter()
        .map(|&gene| {
            let values: Vec<f64> = cells.iter().map(|&c| expr[(c, gene)]).collect();
            bins.bin_means(&values)
        })
        .collect();

    let means = Mat::from_fn(n_bins, genes.len(), |b, col| per_gene[col][b]);

    Some(PseudotimeTrajectory {
        centres: bins.centres,
        counts: bins.counts,
        means,
    })
}

///////////
// Tests //
///////////
