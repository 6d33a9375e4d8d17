#[cfg(feature = "r")]
use extendr_api::List;
use rayon::prelude::*;
use std::fmt;
use std::time::Instant;

use crate::core::base::stats::{
    enrichment_ratio, floored_fraction, mean_or_nan, subset_stats,
};
use crate::core::data::niche_data::NicheCellData;
use crate::core::errors::{NicheError, NicheResult};
use crate::single_cell::methods::early_induction::is_early_rising;
use crate::single_cell::methods::pseudotime_bins::bin_trajectory;

////////////
// Params //
////////////

/// Structure to store the candidate gene filter parameters
///
/// ### Fields
///
/// **Variability & detection:**
///
/// * `min_std` - Genes need a standard deviation above this value within the
///   target cell type.
/// * `min_detection` - Genes need to be detected (> 0) in more than this
///   fraction of the target cells.
///
/// **Niche localisation:**
///
/// * `min_niche_fraction` - At least this fraction of the expressing target
///   cells must sit in fibrotic-associated niches.
///
/// **Early induction:**
///
/// * `n_bins` - Number of pseudotime bins per (cell type, niche) subset.
/// * `early_bins` - Number of leading derivative samples that form the early
///   phase.
///
/// **Fold change:**
///
/// * `fold_change` - Minimum ratio of fibrotic over remote mean expression.
///
/// **General:**
///
/// * `verbose` - Print stage timings and survivor counts.
#[derive(Clone, Debug)]
pub struct NicheFilterParams {
    // variability
    pub min_std: f64,
    pub min_detection: f64,
    // localisation
    pub min_niche_fraction: f64,
    // early induction
    pub n_bins: usize,
    pub early_bins: usize,
    // fold change
    pub fold_change: f64,
    // general
    pub verbose: bool,
}

impl Default for NicheFilterParams {
    fn default() -> Self {
        Self {
            min_std: 0.1,
            min_detection: 0.1,
            min_niche_fraction: 0.5,
            n_bins: 10,
            early_bins: 3,
            fold_change: 2.0,
            verbose: false,
        }
    }
}

impl NicheFilterParams {
    /// Check that the parameters allow the cascade to run
    ///
    /// ### Returns
    ///
    /// `Ok(())` or the first `NicheError` found
    pub fn validate(&self) -> NicheResult<()> {
        if self.n_bins < 2 {
            return Err(NicheError::TooFewBins(self.n_bins));
        }
        if self.early_bins == 0 || self.early_bins > self.n_bins {
            return Err(NicheError::EarlyWindow {
                early_bins: self.early_bins,
                n_bins: self.n_bins,
            });
        }
        check_threshold("min_std", self.min_std, None)?;
        check_threshold("min_detection", self.min_detection, Some(1.0))?;
        check_threshold("min_niche_fraction", self.min_niche_fraction, Some(1.0))?;
        check_threshold("fold_change", self.fold_change, None)?;
        Ok(())
    }

    /// Generate NicheFilterParams from an R list
    ///
    /// Values missing from the list fall back to the defaults.
    ///
    /// ### Params
    ///
    /// * `r_list` - The list with the filter parameters.
    ///
    /// ### Returns
    ///
    /// The `NicheFilterParams` with all parameters set.
    #[cfg(feature = "r")]
    pub fn from_r_list(r_list: List) -> Self {
        let defaults = Self::default();
        let params_list = r_list.into_hashmap();

        let min_std = params_list
            .get("min_std")
            .and_then(|v| v.as_real())
            .unwrap_or(defaults.min_std);

        let min_detection = params_list
            .get("min_detection")
            .and_then(|v| v.as_real())
            .unwrap_or(defaults.min_detection);

        let min_niche_fraction = params_list
            .get("min_niche_fraction")
            .and_then(|v| v.as_real())
            .unwrap_or(defaults.min_niche_fraction);

        let n_bins = params_list
            .get("n_bins")
            .and_then(|v| v.as_integer())
            .map(|x| x.max(0) as usize)
            .unwrap_or(defaults.n_bins);

        let early_bins = params_list
            .get("early_bins")
            .and_then(|v| v.as_integer())
            .map(|x| x.max(0) as usize)
            .unwrap_or(defaults.early_bins);

        let fold_change = params_list
            .get("fold_change")
            .and_then(|v| v.as_real())
            .unwrap_or(defaults.fold_change);

        let verbose = params_list
            .get("verbose")
            .and_then(|v| v.as_bool())
            .unwrap_or(defaults.verbose);

        Self {
            min_std,
            min_detection,
            min_niche_fraction,
            n_bins,
            early_bins,
            fold_change,
            verbose,
        }
    }
}

fn check_threshold(name: &'static str, value: f64, upper: Option<f64>) -> NicheResult<()> {
    let in_range = value.is_finite() && value >= 0.0 && upper.map_or(true, |u| value <= u);
    if !in_range {
        return Err(NicheError::InvalidThreshold { name, value });
    }
    Ok(())
}

/////////////
// Results //
/////////////

/// Why a gene left the cascade
#[derive(Clone, Debug, PartialEq)]
pub enum GeneRejection {
    /// Stage 1: standard deviation within the target type too low
    LowVariability,
    /// Stage 1: detected in too few target cells
    LowDetection,
    /// Stage 2: detections not concentrated in fibrotic niches
    NotLocalised,
    /// Stage 3: the target type has no cells in this fibrotic niche
    EmptySubset { niche: String },
    /// Stage 3: no early rise along pseudotime in this fibrotic niche
    NotEarlyRising { niche: String },
    /// Stage 4: remote mean expression is zero (or the remote niche is empty)
    UndefinedEnrichment,
    /// Stage 4: fibrotic over remote ratio not above the threshold
    BelowFoldChange,
}

impl fmt::Display for GeneRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeneRejection::LowVariability => write!(f, "low_variability"),
            GeneRejection::LowDetection => write!(f, "low_detection"),
            GeneRejection::NotLocalised => write!(f, "not_localised"),
            GeneRejection::EmptySubset { niche } => write!(f, "empty_subset:{}", niche),
            GeneRejection::NotEarlyRising { niche } => write!(f, "not_early_rising:{}", niche),
            GeneRejection::UndefinedEnrichment => write!(f, "undefined_enrichment"),
            GeneRejection::BelowFoldChange => write!(f, "below_fold_change"),
        }
    }
}

/// Record of one cascade run
///
/// ### Fields
///
/// * `variable` - Gene indices surviving stage 1
/// * `localised` - Gene indices surviving stage 2
/// * `early_induced` - Gene indices surviving stage 3
/// * `enriched` - Gene indices surviving stage 4, i.e. the final result
/// * `rejections` - Reason for every rejected gene, ordered by gene index
#[derive(Clone, Debug, Default)]
pub struct CascadeReport {
    pub variable: Vec<usize>,
    pub localised: Vec<usize>,
    pub early_induced: Vec<usize>,
    pub enriched: Vec<usize>,
    pub rejections: Vec<(usize, GeneRejection)>,
}

impl CascadeReport {
    /// Number of survivors after each of the four stages
    pub fn stage_counts(&self) -> [usize; 4] {
        [
            self.variable.len(),
            self.localised.len(),
            self.early_induced.len(),
            self.enriched.len(),
        ]
    }

    /// Rejection reason of a gene, `None` if it survived
    pub fn rejection(&self, gene: usize) -> Option<&GeneRejection> {
        self.rejections
            .binary_search_by_key(&gene, |(g, _)| *g)
            .ok()
            .map(|pos| &self.rejections[pos].1)
    }
}

/// Outcome of one stage: the survivors in input order and the rejections
type StageRes = (Vec<usize>, Vec<(usize, GeneRejection)>);

////////////
// Stages //
////////////

/// Stage 1: variability and detection within the target cell type
///
/// ### Params
///
/// * `data` - The indexed cell data
/// * `genes` - Candidate gene indices
/// * `params` - The filter parameters
///
/// ### Returns
///
/// Survivors and rejections
pub fn filter_variable_genes(
    data: &NicheCellData,
    genes: &[usize],
    params: &NicheFilterParams,
) -> StageRes {
    let verdicts: Vec<Option<GeneRejection>> = genes
        .par_iter()
        .map(|&gene| {
            let stats = subset_stats(&data.gene_values(gene, data.target_cells()));
            if !(stats.sd > params.min_std) {
                Some(GeneRejection::LowVariability)
            } else if !(stats.detection > params.min_detection) {
                Some(GeneRejection::LowDetection)
            } else {
                None
            }
        })
        .collect();

    split_verdicts(genes, verdicts)
}

/// Fraction of expressing target cells located in fibrotic niches
///
/// ### Params
///
/// * `data` - The indexed cell data
/// * `gene` - Gene index
///
/// ### Returns
///
/// `(n_expressing_fibrotic, n_expressing)` over the target cells
pub fn fibrotic_detection_counts(data: &NicheCellData, gene: usize) -> (usize, usize) {
    let mut n_expressing = 0_usize;
    let mut n_fibrotic = 0_usize;
    for &cell in data.target_cells() {
        if data.value(cell, gene) > 0.0 {
            n_expressing += 1;
            if data.niche_class(cell).is_fibrotic() {
                n_fibrotic += 1;
            }
        }
    }
    (n_fibrotic, n_expressing)
}

/// Stage 2: niche localisation of the detections
///
/// ### Params
///
/// * `data` - The indexed cell data
/// * `genes` - Survivors of stage 1
/// * `params` - The filter parameters
///
/// ### Returns
///
/// Survivors and rejections
pub fn filter_localised_genes(
    data: &NicheCellData,
    genes: &[usize],
    params: &NicheFilterParams,
) -> StageRes {
    let verdicts: Vec<Option<GeneRejection>> = genes
        .par_iter()
        .map(|&gene| {
            let (n_fibrotic, n_expressing) = fibrotic_detection_counts(data, gene);
            if floored_fraction(n_fibrotic, n_expressing) >= params.min_niche_fraction {
                None
            } else {
                Some(GeneRejection::NotLocalised)
            }
        })
        .collect();

    split_verdicts(genes, verdicts)
}

/// Stage 3: early induction in every fibrotic-associated niche
///
/// Niches are visited in partition order. A gene that fails in one niche is
/// not evaluated in the later ones. If the target type has no cells with a
/// pseudotime in a niche, every gene still pending is rejected for that
/// niche.
///
/// ### Params
///
/// * `data` - The indexed cell data
/// * `genes` - Survivors of stage 2
/// * `params` - The filter parameters
///
/// ### Returns
///
/// Survivors and rejections
pub fn filter_early_induced_genes(
    data: &NicheCellData,
    genes: &[usize],
    params: &NicheFilterParams,
) -> StageRes {
    let mut pending: Vec<usize> = genes.to_vec();
    let mut rejections: Vec<(usize, GeneRejection)> = Vec::new();

    for (niche_idx, niche) in data.fibrotic_labels().iter().enumerate() {
        if pending.is_empty() {
            break;
        }

        let trajectory = bin_trajectory(
            data.expr(),
            data.target_in_niche(niche_idx),
            data.pseudotime(),
            &pending,
            params.n_bins,
        );

        let Some(trajectory) = trajectory else {
            rejections.extend(pending.drain(..).map(|g| {
                (
                    g,
                    GeneRejection::EmptySubset {
                        niche: niche.clone(),
                    },
                )
            }));
            break;
        };

        let rising: Vec<bool> = (0..pending.len())
            .into_par_iter()
            .map(|col| {
                is_early_rising(
                    &trajectory.gene_trajectory(col),
                    &trajectory.centres,
                    params.early_bins,
                )
            })
            .collect();

        let mut survivors = Vec::with_capacity(pending.len());
        for (gene, ok) in pending.into_iter().zip(rising) {
            if ok {
                survivors.push(gene);
            } else {
                rejections.push((
                    gene,
                    GeneRejection::NotEarlyRising {
                        niche: niche.clone(),
                    },
                ));
            }
        }
        pending = survivors;
    }

    (pending, rejections)
}

/// Mean expression of a gene in the fibrotic niches and the remote niche
///
/// Uses all cell types.
///
/// ### Params
///
/// * `data` - The indexed cell data
/// * `gene` - Gene index
///
/// ### Returns
///
/// `(fibrotic_mean, remote_mean)`, `NaN` for empty groups
pub fn niche_means(data: &NicheCellData, gene: usize) -> (f64, f64) {
    (
        mean_or_nan(&data.gene_values(gene, data.fibrotic_cells())),
        mean_or_nan(&data.gene_values(gene, data.remote_cells())),
    )
}

/// Stage 4: fold change of fibrotic over remote expression
///
/// ### Params
///
/// * `data` - The indexed cell data
/// * `genes` - Survivors of stage 3
/// * `params` - The filter parameters
///
/// ### Returns
///
/// Survivors and rejections
pub fn filter_enriched_genes(
    data: &NicheCellData,
    genes: &[usize],
    params: &NicheFilterParams,
) -> StageRes {
    let verdicts: Vec<Option<GeneRejection>> = genes
        .par_iter()
        .map(|&gene| {
            let (fibrotic_mean, remote_mean) = niche_means(data, gene);
            if remote_mean.is_nan() || remote_mean == 0.0 {
                return Some(GeneRejection::UndefinedEnrichment);
            }
            if enrichment_ratio(fibrotic_mean, remote_mean) > params.fold_change {
                None
            } else {
                Some(GeneRejection::BelowFoldChange)
            }
        })
        .collect();

    split_verdicts(genes, verdicts)
}

/////////////
// Cascade //
/////////////

/// Run the four stage candidate gene filter
///
/// ### Params
///
/// * `data` - The indexed cell data
/// * `params` - The filter parameters. Validated before any gene is
///   touched.
///
/// ### Returns
///
/// The `CascadeReport`; `enriched` holds the final gene list in stage 1
/// order.
pub fn run_niche_cascade(
    data: &NicheCellData,
    params: &NicheFilterParams,
) -> NicheResult<CascadeReport> {
    params.validate()?;

    let start_total = Instant::now();
    let universe: Vec<usize> = (0..data.n_genes()).collect();

    if params.verbose {
        println!(
            "Running niche cascade on {} genes and {} target cells",
            universe.len(),
            data.target_cells().len()
        );
    }

    let mut rejections: Vec<(usize, GeneRejection)> = Vec::new();

    let start = Instant::now();
    let (variable, rej) = filter_variable_genes(data, &universe, params);
    rejections.extend(rej);
    log_stage(params.verbose, "variability", variable.len(), start);

    let start = Instant::now();
    let (localised, rej) = filter_localised_genes(data, &variable, params);
    rejections.extend(rej);
    log_stage(params.verbose, "niche localisation", localised.len(), start);

    let start = Instant::now();
    let (early_induced, rej) = filter_early_induced_genes(data, &localised, params);
    rejections.extend(rej);
    log_stage(params.verbose, "early induction", early_induced.len(), start);

    let start = Instant::now();
    let (enriched, rej) = filter_enriched_genes(data, &early_induced, params);
    rejections.extend(rej);
    log_stage(params.verbose, "fold change", enriched.len(), start);

    rejections.sort_by_key(|(g, _)| *g);

    if params.verbose {
        println!("Total cascade time: {:.2?}", start_total.elapsed());
    }

    Ok(CascadeReport {
        variable,
        localised,
        early_induced,
        enriched,
        rejections,
    })
}

/////////////
// Helpers //
/////////////

fn split_verdicts(genes: &[usize], verdicts: Vec<Option<GeneRejection>>) -> StageRes {
    let mut survivors = Vec::with_capacity(genes.len());
    let mut rejections = Vec::new();
    for (&gene, verdict) in genes.iter().zip(verdicts) {
        match verdict {
            None => survivors.push(gene),
            Some(reason) => rejections.push((gene, reason)),
        }
    }
    (survivors, rejections)
}

fn log_stage(verbose: bool, stage: &str, n_survivors: usize, start: Instant) {
    if verbose {
        println!(
            "Stage {}: {} genes kept in {:.2?}",
            stage,
            n_survivors,
            start.elapsed()
        );
    }
}

///////////
// Tests //
///////////
