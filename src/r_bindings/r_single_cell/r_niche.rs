use extendr_api::prelude::*;

use crate::core::data::niche_data::{CellMetadata, NicheCellData, NichePartition};
use crate::core::data::synthetic_data::*;
use crate::single_cell::methods::niche_filter::NicheFilterParams;
use crate::single_cell::niche_analysis::run_niche_analysis;
use crate::utils::r_rust_interface::*;

extendr_module! {
    mod r_niche;
    fn rs_niche_candidate_genes;
    fn rs_synthetic_niche_data;
}

////////////////////
// Niche analysis //
////////////////////

/// Identify early induced, fibrotic enriched genes
///
/// @description
/// Runs the four stage candidate filter (variability and detection in the
/// target cell type, localisation of detections in fibrotic niches, early
/// induction along pseudotime in every fibrotic niche, fold change of
/// fibrotic over remote expression) and scores the surviving genes
/// spatially.
///
/// @param x Numeric matrix. Expression with cells as rows and genes as
/// columns. Needs to be non-negative.
/// @param gene_names String. One name per column of `x`.
/// @param cell_types String. Cell type per cell.
/// @param niches String. Niche label per cell. `NA` for undefined niches.
/// @param pseudotime Numeric. Pseudotime per cell, non-finite values are
/// ignored during binning.
/// @param coord_x Numeric. x-coordinate per cell.
/// @param coord_y Numeric. y-coordinate per cell.
/// @param target_cell_type String. The cell type to focus on.
/// @param fibrotic_niches String. The fibrotic-associated niche labels.
/// @param remote_niche String. The remote reference niche label.
/// @param niche_params List. The filter parameters, see
/// `params_niche_filter()`.
///
/// @return A list with the following elements
/// \itemize{
///   \item genes - The surviving genes in cascade order.
///   \item log2_fc - log2 fold change of fibrotic over remote expression.
///   \item mean_nn_distance - Mean distance of expressing target cells to
///   their nearest fibrotic cell. `NaN` if undefined.
///   \item niche_fraction - Fraction of expressing target cells in fibrotic
///   niches.
///   \item stage_counts - Number of genes surviving each of the four stages.
///   \item rejected_genes - Names of the rejected genes.
///   \item rejection_reasons - Why each gene was rejected.
/// }
///
/// @export
#[extendr]
#[allow(clippy::too_many_arguments)]
fn rs_niche_candidate_genes(
    x: RMatrix<f64>,
    gene_names: Vec<String>,
    cell_types: Vec<String>,
    niches: Strings,
    pseudotime: &[f64],
    coord_x: &[f64],
    coord_y: &[f64],
    target_cell_type: String,
    fibrotic_niches: Vec<String>,
    remote_niche: String,
    niche_params: List,
) -> extendr_api::Result<List> {
    let params = NicheFilterParams::from_r_list(niche_params);
    let partition = NichePartition::new(fibrotic_niches, remote_niche)?;

    let expr = r_matrix_to_faer(&x);
    let niches = r_strings_to_labels(&niches);
    let coords = r_coords_to_points(coord_x, coord_y)?;

    let meta = CellMetadata {
        cell_types: &cell_types,
        niches: &niches,
        pseudotime,
        coords: &coords,
    };

    let data = NicheCellData::new(expr, &gene_names, meta, &target_cell_type, &partition)?;
    let res = run_niche_analysis(&data, &params)?;

    let rejected_genes: Vec<String> = res
        .report
        .rejections
        .iter()
        .map(|(g, _)| gene_names[*g].clone())
        .collect();
    let rejection_reasons: Vec<String> = res
        .report
        .rejections
        .iter()
        .map(|(_, r)| r.to_string())
        .collect();

    Ok(list!(
        genes = res.genes,
        log2_fc = res.summary.iter().map(|s| s.log2_fc).collect::<Vec<f64>>(),
        mean_nn_distance = res
            .summary
            .iter()
            .map(|s| s.mean_nn_distance.unwrap_or(f64::NAN))
            .collect::<Vec<f64>>(),
        niche_fraction = res
            .summary
            .iter()
            .map(|s| s.niche_fraction)
            .collect::<Vec<f64>>(),
        stage_counts = res
            .report
            .stage_counts()
            .iter()
            .map(|x| *x as i32)
            .collect::<Vec<i32>>(),
        rejected_genes = rejected_genes,
        rejection_reasons = rejection_reasons
    ))
}

////////////////////
// Synthetic data //
////////////////////

/// Generate synthetic spatial niche data
///
/// @description This function generates spatial single cell data with two
/// fibrotic niches (`"Core"`, `"Border"`) and one remote niche (`"Remote"`)
/// and three cell types (`"FB"`, `"MAC"`, `"EC"`). The planted genes are
/// induced along pseudotime in `"FB"` cells of the fibrotic niches.
///
/// @param cells_per_niche Integer. Number of cells per niche.
/// @param n_background Integer. Number of background genes.
/// @param n_induced Integer. Number of planted genes.
/// @param seed Integer. Seed for reproducibility purposes.
///
/// @return The list with the synthetic data with the following items:
///  \itemize{
///   \item expr - Expression matrix with cells as rows.
///   \item gene_names - The gene names.
///   \item cell_types - Cell type per cell.
///   \item niches - Niche per cell.
///   \item pseudotime - Pseudotime per cell.
///   \item coord_x - x-coordinate per cell.
///   \item coord_y - y-coordinate per cell.
///   \item induced_genes - Index positions (1-indexed) of the planted genes.
/// }
///
/// @export
#[extendr]
fn rs_synthetic_niche_data(
    cells_per_niche: usize,
    n_background: usize,
    n_induced: usize,
    seed: usize,
) -> List {
    let params = SyntheticNicheParams {
        cells_per_niche,
        n_background,
        n_induced,
        ..Default::default()
    };
    let data = generate_niche_data(&params, seed as u64);

    list!(
        expr = faer_to_r_matrix(data.expr.as_ref()),
        gene_names = data.gene_names,
        cell_types = data.cell_types,
        niches = data
            .niches
            .into_iter()
            .map(|n| n.unwrap_or_default())
            .collect::<Vec<String>>(),
        pseudotime = data.pseudotime,
        coord_x = data.coords.iter().map(|c| c[0]).collect::<Vec<f64>>(),
        coord_y = data.coords.iter().map(|c| c[1]).collect::<Vec<f64>>(),
        induced_genes = data
            .induced_genes
            .iter()
            .map(|g| *g as i32 + 1)
            .collect::<Vec<i32>>()
    )
}
