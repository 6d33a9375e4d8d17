use faer::Mat;
use rand::prelude::*;
use rand_distr::{Distribution, Normal, Poisson};

use crate::core::data::niche_data::{CellMetadata, NicheCellData, NichePartition};
use crate::core::errors::NicheResult;

////////////////
// Structures //
////////////////

/// Parameters for the synthetic spatial niche data
///
/// ### Fields
///
/// * `cells_per_niche` - Number of cells placed in each niche.
/// * `n_background` - Number of background genes (uniform expression).
/// * `n_induced` - Number of planted genes that are induced early along
///   pseudotime in the target cell type within every fibrotic niche.
/// * `cell_types` - The cell type labels. The first one is the target type.
/// * `fibrotic_niches` - Labels of the fibrotic-associated niches.
/// * `remote_niche` - Label of the remote niche.
/// * `background_rate` - Poisson rate of background genes.
/// * `induction_slope` - Increase of the planted genes' Poisson rate per
///   unit of pseudotime.
/// * `niche_spread` - Standard deviation of the cell positions around their
///   niche centre.
#[derive(Clone, Debug)]
pub struct SyntheticNicheParams {
    pub cells_per_niche: usize,
    pub n_background: usize,
    pub n_induced: usize,
    pub cell_types: Vec<String>,
    pub fibrotic_niches: Vec<String>,
    pub remote_niche: String,
    pub background_rate: f64,
    pub induction_slope: f64,
    pub niche_spread: f64,
}

impl Default for SyntheticNicheParams {
    fn default() -> Self {
        Self {
            cells_per_niche: 1500,
            n_background: 20,
            n_induced: 3,
            cell_types: vec!["FB".to_string(), "MAC".to_string(), "EC".to_string()],
            fibrotic_niches: vec!["Core".to_string(), "Border".to_string()],
            remote_niche: "Remote".to_string(),
            background_rate: 1.0,
            induction_slope: 10.0,
            niche_spread: 3.0,
        }
    }
}

/// Structure for synthetic spatial niche data
///
/// ### Fields
///
/// * `expr` - Expression matrix (cells x genes)
/// * `gene_names` - Gene names. Planted genes are called `induced_<i>`,
///   background genes `background_<i>`.
/// * `cell_types` - Cell type per cell
/// * `niches` - Niche label per cell
/// * `pseudotime` - Pseudotime per cell in `[0, 1)`
/// * `coords` - Spatial position per cell
/// * `induced_genes` - Column indices of the planted genes
#[derive(Clone, Debug)]
pub struct SyntheticNicheData {
    pub expr: Mat<f64>,
    pub gene_names: Vec<String>,
    pub cell_types: Vec<String>,
    pub niches: Vec<Option<String>>,
    pub pseudotime: Vec<f64>,
    pub coords: Vec<[f64; 2]>,
    pub induced_genes: Vec<usize>,
}

impl SyntheticNicheData {
    /// Borrow the per-cell metadata
    pub fn meta(&self) -> CellMetadata<'_> {
        CellMetadata {
            cell_types: &self.cell_types,
            niches: &self.niches,
            pseudotime: &self.pseudotime,
            coords: &self.coords,
        }
    }

    /// Generate the indexed view for a target cell type and partition
    pub fn view(
        &self,
        target_cell_type: &str,
        partition: &NichePartition,
    ) -> NicheResult<NicheCellData<'_>> {
        NicheCellData::new(
            self.expr.as_ref(),
            &self.gene_names,
            self.meta(),
            target_cell_type,
            partition,
        )
    }
}

//////////////////////////
// Synthetic niche data //
//////////////////////////

/// Generate synthetic spatial data with fibrotic and remote niches
///
/// Niches are placed 50 units apart along the x-axis with the remote niche
/// last. Planted genes follow a Poisson rate of `0.2 + induction_slope *
/// pseudotime` in target cells of fibrotic niches, `0.2` in other cells of
/// fibrotic niches and `0.05` in the remote niche. Background genes use
/// `background_rate` everywhere.
///
/// ### Params
///
/// * `params` - The `SyntheticNicheParams`
/// * `seed` - Seed for reproducibility purposes.
///
/// ### Returns
///
/// The `SyntheticNicheData`
pub fn generate_niche_data(params: &SyntheticNicheParams, seed: u64) -> SyntheticNicheData {
    assert!(!params.cell_types.is_empty(), "Need at least one cell type");

    let mut rng = StdRng::seed_from_u64(seed);
    let jitter = Normal::new(0.0, params.niche_spread).unwrap();

    let niche_labels: Vec<&String> = params
        .fibrotic_niches
        .iter()
        .chain(std::iter::once(&params.remote_niche))
        .collect();
    let n_fibrotic = params.fibrotic_niches.len();
    let n_cells = niche_labels.len() * params.cells_per_niche;
    let n_genes = params.n_induced + params.n_background;

    let mut cell_types = Vec::with_capacity(n_cells);
    let mut niches = Vec::with_capacity(n_cells);
    let mut pseudotime = Vec::with_capacity(n_cells);
    let mut coords = Vec::with_capacity(n_cells);

    for (niche_idx, label) in niche_labels.iter().enumerate() {
        let centre = [niche_idx as f64 * 50.0, 0.0];
        for _ in 0..params.cells_per_niche {
            let ct = rng.random_range(0..params.cell_types.len());
            cell_types.push(params.cell_types[ct].clone());
            niches.push(Some((*label).clone()));
            pseudotime.push(rng.random::<f64>());
            coords.push([
                centre[0] + jitter.sample(&mut rng),
                centre[1] + jitter.sample(&mut rng),
            ]);
        }
    }

    let background = Poisson::new(params.background_rate).unwrap();
    let mut expr: Mat<f64> = Mat::zeros(n_cells, n_genes);

    for cell in 0..n_cells {
        let in_fibrotic = cell / params.cells_per_niche < n_fibrotic;
        let is_target = cell_types[cell] == params.cell_types[0];

        for gene in 0..params.n_induced {
            let lambda = match (in_fibrotic, is_target) {
                (true, true) => 0.2 + params.induction_slope * pseudotime[cell],
                (true, false) => 0.2,
                (false, _) => 0.05,
            };
            let dist = Poisson::new(lambda).unwrap();
            expr[(cell, gene)] = dist.sample(&mut rng);
        }
        for gene in params.n_induced..n_genes {
            expr[(cell, gene)] = background.sample(&mut rng);
        }
    }

    let gene_names: Vec<String> = (0..params.n_induced)
        .map(|i| format!("induced_{}", i))
        .chain((0..params.n_background).map(|i| format!("background_{}", i)))
        .collect();

    SyntheticNicheData {
        expr,
        gene_names,
        cell_types,
        niches,
        pseudotime,
        coords,
        induced_genes: (0..params.n_induced).collect(),
    }
}

///////////
// Tests //
///////////
