use faer::MatRef;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::core::errors::{NicheError, NicheResult};

///////////
// Enums //
///////////

/// Which part of the niche partition a cell belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NicheClass {
    /// Fibrotic-associated niche, index into `NichePartition::fibrotic`
    Fibrotic(usize),
    /// The remote reference niche
    Remote,
    /// Undefined niche or a label outside of the partition
    Other,
}

impl NicheClass {
    /// Is the cell in any fibrotic-associated niche
    #[inline]
    pub fn is_fibrotic(&self) -> bool {
        matches!(self, NicheClass::Fibrotic(_))
    }
}

////////////////
// Structures //
////////////////

/// The niche partition
///
/// ### Fields
///
/// * `fibrotic` - Labels of the fibrotic-associated niches (core niche plus
///   the proximal zones). Order is the order in which the early induction
///   stage visits them.
/// * `remote` - Label of the remote reference niche.
#[derive(Clone, Debug)]
pub struct NichePartition {
    pub fibrotic: Vec<String>,
    pub remote: String,
}

impl NichePartition {
    /// Generate a new, validated niche partition
    ///
    /// ### Params
    ///
    /// * `fibrotic` - The fibrotic-associated niche labels
    /// * `remote` - The remote niche label
    ///
    /// ### Returns
    ///
    /// The `NichePartition` or the `NicheError` describing why the partition
    /// is not usable.
    pub fn new(fibrotic: Vec<String>, remote: String) -> NicheResult<Self> {
        let partition = Self { fibrotic, remote };
        partition.validate()?;
        Ok(partition)
    }

    /// Check that the partition is non-empty and disjoint
    pub fn validate(&self) -> NicheResult<()> {
        if self.fibrotic.is_empty() {
            return Err(NicheError::EmptyFibroticSet);
        }
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        for label in &self.fibrotic {
            if label == &self.remote {
                return Err(NicheError::RemoteInFibrotic(label.clone()));
            }
            if !seen.insert(label.as_str()) {
                return Err(NicheError::DuplicateNiche(label.clone()));
            }
        }
        Ok(())
    }

    /// Classify a niche label
    ///
    /// ### Params
    ///
    /// * `label` - The niche label of a cell. `None` for undefined niches.
    ///
    /// ### Returns
    ///
    /// The `NicheClass` of that label
    pub fn classify(&self, label: Option<&str>) -> NicheClass {
        match label {
            None => NicheClass::Other,
            Some(l) if l == self.remote => NicheClass::Remote,
            Some(l) => self
                .fibrotic
                .iter()
                .position(|f| f == l)
                .map(NicheClass::Fibrotic)
                .unwrap_or(NicheClass::Other),
        }
    }
}

/// Per-cell metadata, borrowed from the caller
///
/// ### Fields
///
/// * `cell_types` - Cell type label per cell
/// * `niches` - Niche label per cell, `None` if the niche is undefined
/// * `pseudotime` - Pseudotime per cell. Non-finite values mark cells that
///   are not part of the trajectory.
/// * `coords` - 2D spatial coordinates per cell
#[derive(Clone, Copy, Debug)]
pub struct CellMetadata<'a> {
    pub cell_types: &'a [String],
    pub niches: &'a [Option<String>],
    pub pseudotime: &'a [f64],
    pub coords: &'a [[f64; 2]],
}

/// Indexed view over the expression matrix and the cell metadata
///
/// All cell subsets the cascade and the scorers need are resolved once on
/// construction, so per-gene work only touches index vectors.
#[derive(Clone, Debug)]
pub struct NicheCellData<'a> {
    expr: MatRef<'a, f64>,
    gene_names: &'a [String],
    pseudotime: &'a [f64],
    coords: &'a [[f64; 2]],
    fibrotic_labels: Vec<String>,
    niche_class: Vec<NicheClass>,
    target_cells: Vec<usize>,
    fibrotic_cells: Vec<usize>,
    remote_cells: Vec<usize>,
    target_by_niche: Vec<Vec<usize>>,
}

impl<'a> NicheCellData<'a> {
    /// Generate the indexed view
    ///
    /// ### Params
    ///
    /// * `expr` - Expression matrix with cells as rows and genes as columns.
    ///   Values must be non-negative.
    /// * `gene_names` - One name per column of `expr`
    /// * `meta` - The per-cell metadata
    /// * `target_cell_type` - The cell type the cascade focuses on
    /// * `partition` - The niche partition
    ///
    /// ### Returns
    ///
    /// The `NicheCellData` or a `NicheError` if the inputs are inconsistent.
    pub fn new(
        expr: MatRef<'a, f64>,
        gene_names: &'a [String],
        meta: CellMetadata<'a>,
        target_cell_type: &str,
        partition: &NichePartition,
    ) -> NicheResult<Self> {
        partition.validate()?;

        let n_cells = expr.nrows();
        check_len("gene_names", expr.ncols(), gene_names.len())?;
        check_len("cell_types", n_cells, meta.cell_types.len())?;
        check_len("niches", n_cells, meta.niches.len())?;
        check_len("pseudotime", n_cells, meta.pseudotime.len())?;
        check_len("coords", n_cells, meta.coords.len())?;

        for gene in 0..expr.ncols() {
            for cell in 0..n_cells {
                let value = expr[(cell, gene)];
                if value < 0.0 {
                    return Err(NicheError::NegativeExpression { cell, gene, value });
                }
            }
        }

        // labels repeat heavily, classify each distinct one once
        let mut lookup: FxHashMap<&str, NicheClass> = FxHashMap::default();
        let niche_class: Vec<NicheClass> = meta
            .niches
            .iter()
            .map(|label| match label.as_deref() {
                None => NicheClass::Other,
                Some(l) => *lookup
                    .entry(l)
                    .or_insert_with(|| partition.classify(Some(l))),
            })
            .collect();

        let target_cells: Vec<usize> = meta
            .cell_types
            .iter()
            .enumerate()
            .filter(|(_, ct)| ct.as_str() == target_cell_type)
            .map(|(i, _)| i)
            .collect();

        if target_cells.is_empty() {
            return Err(NicheError::UnknownCellType(target_cell_type.to_string()));
        }

        let fibrotic_cells: Vec<usize> = (0..n_cells)
            .filter(|&i| niche_class[i].is_fibrotic())
            .collect();
        let remote_cells: Vec<usize> = (0..n_cells)
            .filter(|&i| niche_class[i] == NicheClass::Remote)
            .collect();

        let mut target_by_niche: Vec<Vec<usize>> = vec![Vec::new(); partition.fibrotic.len()];
        for &cell in &target_cells {
            if let NicheClass::Fibrotic(k) = niche_class[cell] {
                target_by_niche[k].push(cell);
            }
        }

        Ok(Self {
            expr,
            gene_names,
            pseudotime: meta.pseudotime,
            coords: meta.coords,
            fibrotic_labels: partition.fibrotic.clone(),
            niche_class,
            target_cells,
            fibrotic_cells,
            remote_cells,
            target_by_niche,
        })
    }

    /// The expression matrix (cells x genes)
    pub fn expr(&self) -> MatRef<'a, f64> {
        self.expr
    }

    pub fn n_genes(&self) -> usize {
        self.expr.ncols()
    }

    pub fn gene_name(&self, gene: usize) -> &str {
        &self.gene_names[gene]
    }

    /// Expression value of a single cell and gene
    #[inline]
    pub fn value(&self, cell: usize, gene: usize) -> f64 {
        self.expr[(cell, gene)]
    }

    pub fn pseudotime(&self) -> &'a [f64] {
        self.pseudotime
    }

    pub fn coord(&self, cell: usize) -> [f64; 2] {
        self.coords[cell]
    }

    pub fn niche_class(&self, cell: usize) -> NicheClass {
        self.niche_class[cell]
    }

    /// Labels of the fibrotic-associated niches in partition order
    pub fn fibrotic_labels(&self) -> &[String] {
        &self.fibrotic_labels
    }

    /// Cells of the target cell type
    pub fn target_cells(&self) -> &[usize] {
        &self.target_cells
    }

    /// Cells of any type in any fibrotic-associated niche
    pub fn fibrotic_cells(&self) -> &[usize] {
        &self.fibrotic_cells
    }

    /// Cells of any type in the remote niche
    pub fn remote_cells(&self) -> &[usize] {
        &self.remote_cells
    }

    /// Target cells within the fibrotic niche with index `niche`
    pub fn target_in_niche(&self, niche: usize) -> &[usize] {
        &self.target_by_niche[niche]
    }

    /// Expression values of one gene across a subset of cells
    pub fn gene_values(&self, gene: usize, cells: &[usize]) -> Vec<f64> {
        cells.iter().map(|&c| self.expr[(c, gene)]).collect()
    }
}

/////////////
// Helpers //
/////////////

fn check_len(what: &'static str, expected: usize, got: usize) -> NicheResult<()> {
    if expected != got {
        return Err(NicheError::DimensionMismatch {
            what,
            expected,
            got,
        });
    }
    Ok(())
}

///////////
// Tests //
///////////

#[cfg(test)]
mod tests {
    use super::*;
    use faer::Mat;

    fn partition() -> NichePartition {
        NichePartition::new(
            vec!["Core".to_string(), "Border".to_string()],
            "Remote".to_string(),
        )
        .unwrap()
    }

    #[test]
    fn test_partition_validation() {
        assert_eq!(
            NichePartition::new(vec![], "Remote".to_string()).unwrap_err(),
            NicheError::EmptyFibroticSet
        );
        assert_eq!(
            NichePartition::new(vec!["Remote".to_string()], "Remote".to_string()).unwrap_err(),
            NicheError::RemoteInFibrotic("Remote".to_string())
        );
        assert_eq!(
            NichePartition::new(
                vec!["Core".to_string(), "Core".to_string()],
                "Remote".to_string()
            )
            .unwrap_err(),
            NicheError::DuplicateNiche("Core".to_string())
        );
    }

    #[test]
    fn test_classify() {
        let p = partition();
        assert_eq!(p.classify(Some("Core")), NicheClass::Fibrotic(0));
        assert_eq!(p.classify(Some("Border")), NicheClass::Fibrotic(1));
        assert_eq!(p.classify(Some("Remote")), NicheClass::Remote);
        assert_eq!(p.classify(Some("Vessel")), NicheClass::Other);
        assert_eq!(p.classify(None), NicheClass::Other);
    }

    #[test]
    fn test_cell_subsets() {
        let expr = Mat::from_fn(5, 2, |i, j| (i + j) as f64);
        let genes = vec!["g1".to_string(), "g2".to_string()];
        let cell_types: Vec<String> = ["FB", "FB", "MAC", "FB", "FB"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let niches = vec![
            Some("Core".to_string()),
            Some("Border".to_string()),
            Some("Core".to_string()),
            Some("Remote".to_string()),
            None,
        ];
        let pt = vec![0.0; 5];
        let coords = vec![[0.0, 0.0]; 5];
        let meta = CellMetadata {
            cell_types: &cell_types,
            niches: &niches,
            pseudotime: &pt,
            coords: &coords,
        };

        let data = NicheCellData::new(expr.as_ref(), &genes, meta, "FB", &partition()).unwrap();

        assert_eq!(data.target_cells(), &[0, 1, 3, 4]);
        assert_eq!(data.fibrotic_cells(), &[0, 1, 2]);
        assert_eq!(data.remote_cells(), &[3]);
        assert_eq!(data.target_in_niche(0), &[0]);
        assert_eq!(data.target_in_niche(1), &[1]);
        assert_eq!(data.gene_values(1, &[0, 2]), vec![1.0, 3.0]);
    }

    #[test]
    fn test_input_errors() {
        let genes = vec!["g1".to_string()];
        let cell_types = vec!["FB".to_string(); 2];
        let niches = vec![Some("Core".to_string()); 2];
        let pt = vec![0.0; 2];
        let coords = vec![[0.0, 0.0]; 2];
        let meta = CellMetadata {
            cell_types: &cell_types,
            niches: &niches,
            pseudotime: &pt,
            coords: &coords,
        };

        let wrong_rows = Mat::<f64>::zeros(3, 1);
        let err = NicheCellData::new(wrong_rows.as_ref(), &genes, meta, "FB", &partition())
            .unwrap_err();
        assert!(matches!(err, NicheError::DimensionMismatch { what: "cell_types", .. }));

        let negative = Mat::from_fn(2, 1, |i, _| if i == 1 { -1.0 } else { 0.0 });
        let err =
            NicheCellData::new(negative.as_ref(), &genes, meta, "FB", &partition()).unwrap_err();
        assert!(matches!(err, NicheError::NegativeExpression { cell: 1, gene: 0, .. }));

        let fine = Mat::<f64>::zeros(2, 1);
        let err = NicheCellData::new(fine.as_ref(), &genes, meta, "MAC", &partition()).unwrap_err();
        assert_eq!(err, NicheError::UnknownCellType("MAC".to_string()));
    }
}
