use rayon::prelude::*;

use crate::core::base::stats::{enrichment_ratio, floored_fraction};
use crate::core::data::niche_data::NicheCellData;
use crate::core::graph::spatial_index::SpatialIndex;
use crate::single_cell::methods::niche_filter::{fibrotic_detection_counts, niche_means};

////////////////
// Structures //
////////////////

/// Nearest neighbour index over all cells in fibrotic-associated niches
///
/// Build once per analysis and share it across all genes.
pub struct FibroticIndex {
    index: SpatialIndex,
}

impl FibroticIndex {
    /// Build the index from the fibrotic cells of `data`
    pub fn new(data: &NicheCellData) -> Self {
        let points: Vec<[f64; 2]> = data
            .fibrotic_cells()
            .iter()
            .map(|&c| data.coord(c))
            .collect();
        Self {
            index: SpatialIndex::new(&points),
        }
    }

    /// Number of indexed fibrotic cells
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

/// One row of the per-gene summary table
///
/// ### Fields
///
/// * `gene` - Gene name
/// * `log2_fc` - log2 of fibrotic over remote mean expression (all cell
///   types)
/// * `mean_nn_distance` - Mean distance of expressing target cells to their
///   nearest fibrotic cell. `None` if no target cell expresses the gene.
/// * `niche_fraction` - Fraction of expressing target cells located in
///   fibrotic niches
#[derive(Clone, Debug, PartialEq)]
pub struct NicheGeneSummary {
    pub gene: String,
    pub log2_fc: f64,
    pub mean_nn_distance: Option<f64>,
    pub niche_fraction: f64,
}

/////////////
// Scorers //
/////////////

/// Mean nearest fibrotic cell distance of the expressing target cells
///
/// ### Params
///
/// * `data` - The indexed cell data
/// * `index` - The shared `FibroticIndex`
/// * `gene` - Gene index
///
/// ### Returns
///
/// The mean distance; `None` if no expressing target cell has a finite
/// position or there are no fibrotic cells.
pub fn mean_fibrotic_distance(
    data: &NicheCellData,
    index: &FibroticIndex,
    gene: usize,
) -> Option<f64> {
    let queries: Vec<[f64; 2]> = data
        .target_cells()
        .iter()
        .filter(|&&c| data.value(c, gene) > 0.0)
        .map(|&c| data.coord(c))
        .collect();
    index.index.mean_nearest_distance(&queries)
}

/// Fraction of expressing target cells located in fibrotic niches
///
/// The denominator is floored at one, so genes without any expressing
/// target cell score `0`.
///
/// ### Params
///
/// * `data` - The indexed cell data
/// * `gene` - Gene index
///
/// ### Returns
///
/// The fraction
pub fn fibrotic_niche_fraction(data: &NicheCellData, gene: usize) -> f64 {
    let (n_fibrotic, n_expressing) = fibrotic_detection_counts(data, gene);
    floored_fraction(n_fibrotic, n_expressing)
}

/// log2 fold change of fibrotic over remote mean expression
pub fn niche_log2_fc(data: &NicheCellData, gene: usize) -> f64 {
    let (fibrotic_mean, remote_mean) = niche_means(data, gene);
    enrichment_ratio(fibrotic_mean, remote_mean).log2()
}

/// Mean nearest fibrotic cell distance for several genes
///
/// Builds the `FibroticIndex` once.
///
/// ### Params
///
/// * `data` - The indexed cell data
/// * `genes` - Gene indices
///
/// ### Returns
///
/// One distance per gene, `None` where undefined
pub fn score_fibrotic_distances(data: &NicheCellData, genes: &[usize]) -> Vec<Option<f64>> {
    let index = FibroticIndex::new(data);
    genes
        .par_iter()
        .map(|&g| mean_fibrotic_distance(data, &index, g))
        .collect()
}

/// Fibrotic niche fraction for several genes
pub fn score_niche_fractions(data: &NicheCellData, genes: &[usize]) -> Vec<f64> {
    genes
        .par_iter()
        .map(|&g| fibrotic_niche_fraction(data, g))
        .collect()
}

/// Generate the per-gene summary table
///
/// ### Params
///
/// * `data` - The indexed cell data
/// * `genes` - Gene indices, typically the cascade survivors
///
/// ### Returns
///
/// One `NicheGeneSummary` per gene, in the order of `genes`
pub fn summarise_niche_genes(data: &NicheCellData, genes: &[usize]) -> Vec<NicheGeneSummary> {
    let index = FibroticIndex::new(data);
    genes
        .par_iter()
        .map(|&g| NicheGeneSummary {
            gene: data.gene_name(g).to_string(),
            log2_fc: niche_log2_fc(data, g),
            mean_nn_distance: mean_fibrotic_distance(data, &index, g),
            niche_fraction: fibrotic_niche_fraction(data, g),
        })
        .collect()
}

///////////
// Tests //
///////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::data::niche_data::{CellMetadata, NichePartition};
    use faer::Mat;

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_single_expressing_cell_distance() {
        // cell 0: target in Remote, the only expressing cell
        // cells 1-3: fibrotic cells of another type
        let expr = Mat::from_fn(4, 1, |i, _| if i == 0 { 2.0 } else { 0.0 });
        let genes = strings(&["g"]);
        let cell_types = strings(&["FB", "MAC", "MAC", "MAC"]);
        let niches = vec![
            Some("Remote".to_string()),
            Some("Core".to_string()),
            Some("Core".to_string()),
            Some("Core".to_string()),
        ];
        let pt = vec![0.0; 4];
        let coords = vec![[0.0, 0.0], [3.0, 4.0], [6.0, 8.0], [-10.0, 0.0]];
        let meta = CellMetadata {
            cell_types: &cell_types,
            niches: &niches,
            pseudotime: &pt,
            coords: &coords,
        };
        let partition = NichePartition::new(strings(&["Core"]), "Remote".to_string()).unwrap();
        let data = NicheCellData::new(expr.as_ref(), &genes, meta, "FB", &partition).unwrap();

        let index = FibroticIndex::new(&data);
        assert_eq!(index.len(), 3);
        let d = mean_fibrotic_distance(&data, &index, 0).unwrap();
        assert!((d - 5.0).abs() < 1e-12);

        assert_eq!(fibrotic_niche_fraction(&data, 0), 0.0);
    }

    #[test]
    fn test_undefined_distance_and_fraction_floor() {
        let expr = Mat::<f64>::zeros(3, 1);
        let genes = strings(&["silent"]);
        let cell_types = strings(&["FB", "FB", "MAC"]);
        let niches = vec![
            Some("Core".to_string()),
            Some("Remote".to_string()),
            Some("Core".to_string()),
        ];
        let pt = vec![0.0; 3];
        let coords = vec![[0.0, 0.0], [1.0, 0.0], [2.0, 0.0]];
        let meta = CellMetadata {
            cell_types: &cell_types,
            niches: &niches,
            pseudotime: &pt,
            coords: &coords,
        };
        let partition = NichePartition::new(strings(&["Core"]), "Remote".to_string()).unwrap();
        let data = NicheCellData::new(expr.as_ref(), &genes, meta, "FB", &partition).unwrap();

        assert_eq!(score_fibrotic_distances(&data, &[0]), vec![None]);
        assert_eq!(score_niche_fractions(&data, &[0]), vec![0.0]);

        let summary = summarise_niche_genes(&data, &[0]);
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].gene, "silent");
        assert!(summary[0].mean_nn_distance.is_none());
    }

    #[test]
    fn test_no_fibrotic_cells() {
        let expr = Mat::from_fn(2, 1, |_, _| 1.0);
        let genes = strings(&["g"]);
        let cell_types = strings(&["FB", "FB"]);
        let niches = vec![Some("Remote".to_string()), None];
        let pt = vec![0.0; 2];
        let coords = vec![[0.0, 0.0], [1.0, 0.0]];
        let meta = CellMetadata {
            cell_types: &cell_types,
            niches: &niches,
            pseudotime: &pt,
            coords: &coords,
        };
        let partition = NichePartition::new(strings(&["Core"]), "Remote".to_string()).unwrap();
        let data = NicheCellData::new(expr.as_ref(), &genes, meta, "FB", &partition).unwrap();

        let index = FibroticIndex::new(&data);
        assert!(index.is_empty());
        assert!(mean_fibrotic_distance(&data, &index, 0).is_none());
        assert_eq!(fibrotic_niche_fraction(&data, 0), 0.0);
    }

    #[test]
    fn test_fibrotic_cells_on_one_axis() {
        // cell 0: expressing target in Remote; 300 fibrotic cells at x = 0
        // and 300 more stacked at (1, 1)
        let n = 601;
        let expr = Mat::from_fn(n, 1, |i, _| if i == 0 { 1.0 } else { 0.0 });
        let genes = strings(&["g"]);
        let mut cell_types = vec!["FB".to_string()];
        cell_types.extend((1..n).map(|_| "MAC".to_string()));
        let mut niches = vec![Some("Remote".to_string())];
        niches.extend((1..n).map(|_| Some("Core".to_string())));
        let pt = vec![0.0; n];
        let mut coords = vec![[-6.0, 150.0]];
        coords.extend((0..300).map(|i| [0.0, i as f64]));
        coords.extend((0..300).map(|_| [1.0, 1.0]));
        let meta = CellMetadata {
            cell_types: &cell_types,
            niches: &niches,
            pseudotime: &pt,
            coords: &coords,
        };
        let partition = NichePartition::new(strings(&["Core"]), "Remote".to_string()).unwrap();
        let data = NicheCellData::new(expr.as_ref(), &genes, meta, "FB", &partition).unwrap();

        assert_eq!(FibroticIndex::new(&data).len(), 600);
        let d = score_fibrotic_distances(&data, &[0]);
        assert!((d[0].unwrap() - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_non_finite_target_position() {
        // two expressing targets, one without a valid position
        let expr = Mat::from_fn(3, 1, |i, _| if i < 2 { 1.0 } else { 0.0 });
        let genes = strings(&["g"]);
        let cell_types = strings(&["FB", "FB", "MAC"]);
        let niches = vec![
            Some("Remote".to_string()),
            Some("Remote".to_string()),
            Some("Core".to_string()),
        ];
        let pt = vec![0.0; 3];
        let coords = vec![[3.0, 4.0], [f64::NAN, 0.0], [0.0, 0.0]];
        let meta = CellMetadata {
            cell_types: &cell_types,
            niches: &niches,
            pseudotime: &pt,
            coords: &coords,
        };
        let partition = NichePartition::new(strings(&["Core"]), "Remote".to_string()).unwrap();
        let data = NicheCellData::new(expr.as_ref(), &genes, meta, "FB", &partition).unwrap();

        let d = score_fibrotic_distances(&data, &[0]);
        assert!((d[0].unwrap() - 5.0).abs() < 1e-12);
    }
}
