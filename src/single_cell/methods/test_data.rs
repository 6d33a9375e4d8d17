//! Small hand-built datasets with known cascade outcomes

use faer::Mat;

use crate::core::data::niche_data::NichePartition;
use crate::core::data::synthetic_data::SyntheticNicheData;
use crate::single_cell::methods::niche_filter::NicheFilterParams;

/// One cell of a hand-built dataset: (cell type, niche, pseudotime, coord)
type CellSpec = (&'static str, &'static str, f64, [f64; 2]);

fn build(
    cells: &[CellSpec],
    gene_names: &[&str],
    value: impl Fn(usize, &CellSpec) -> f64,
) -> SyntheticNicheData {
    let expr = Mat::from_fn(cells.len(), gene_names.len(), |i, j| value(j, &cells[i]));
    SyntheticNicheData {
        expr,
        gene_names: gene_names.iter().map(|s| s.to_string()).collect(),
        cell_types: cells.iter().map(|c| c.0.to_string()).collect(),
        niches: cells.iter().map(|c| Some(c.1.to_string())).collect(),
        pseudotime: cells.iter().map(|c| c.2).collect(),
        coords: cells.iter().map(|c| c.3).collect(),
        induced_genes: Vec::new(),
    }
}

/// Three cell types, a fibrotic `Core` and a `Remote` niche, five genes
///
/// Target type `FB` has ten cells per niche at pseudotime 0..9; `MAC` and
/// `EC` have five cells per niche without pseudotime. Core cells sit at
/// x < 10, remote cells at x ≥ 100.
///
/// * `GeneA` passes every stage (fibrotic mean 2.25, remote mean 0.375,
///   9 of 10 detections in Core, one detection 91 units from Core)
/// * `GeneB` is detected in 4 Core and 6 Remote FB cells (fails stage 2)
/// * `GeneC` is never detected (fails stage 1)
/// * `GeneD` declines along pseudotime in Core (fails stage 3)
/// * `GeneE` is absent from Remote (fails stage 4)
pub fn three_type_scenario() -> SyntheticNicheData {
    let mut cells: Vec<CellSpec> = Vec::new();
    for (niche, x0) in [("Core", 0.0), ("Remote", 100.0)] {
        for i in 0..10 {
            cells.push(("FB", niche, i as f64, [x0 + i as f64, 0.0]));
        }
        for j in 0..5 {
            cells.push(("MAC", niche, f64::NAN, [x0 + j as f64, 5.0]));
        }
        for j in 0..5 {
            cells.push(("EC", niche, f64::NAN, [x0 + j as f64, 10.0]));
        }
    }

    let names = ["GeneA", "GeneB", "GeneC", "GeneD", "GeneE"];
    build(&cells, &names, |gene, cell| {
        let (ct, niche, pt, _) = *cell;
        if ct != "FB" {
            return 0.0;
        }
        let i = pt;
        match (gene, niche) {
            (0, "Core") => i,
            (0, _) => {
                if i == 0.0 {
                    7.5
                } else {
                    0.0
                }
            }
            (1, "Core") => {
                if i < 4.0 {
                    i + 1.0
                } else {
                    0.0
                }
            }
            (1, _) => {
                if i < 6.0 {
                    i + 1.0
                } else {
                    0.0
                }
            }
            (3, "Core") => 10.0 - i,
            (4, "Core") => i + 1.0,
            _ => 0.0,
        }
    })
}

/// Parameters used with `three_type_scenario`
pub fn three_type_params() -> NicheFilterParams {
    NicheFilterParams {
        min_std: 0.1,
        min_detection: 0.1,
        min_niche_fraction: 0.8,
        n_bins: 5,
        early_bins: 2,
        fold_change: 2.0,
        verbose: false,
    }
}

/// Partition with `Core` as the only fibrotic niche
pub fn core_remote_partition() -> NichePartition {
    NichePartition::new(vec!["Core".to_string()], "Remote".to_string()).unwrap()
}

/// Target cells in two fibrotic niches, `Core` and `Border`
///
/// * `Mixed` rises along pseudotime in Core but declines in Border
/// * `Rising` rises in both
///
/// Both have one remote detection, giving a fibrotic over remote ratio of
/// 22.
pub fn two_niche_scenario() -> SyntheticNicheData {
    let mut cells: Vec<CellSpec> = Vec::new();
    for i in 0..10 {
        cells.push(("FB", "Core", i as f64, [i as f64, 0.0]));
    }
    for i in 0..10 {
        cells.push(("FB", "Border", i as f64, [i as f64, 20.0]));
    }
    for i in 0..4 {
        cells.push(("FB", "Remote", i as f64, [100.0 + i as f64, 0.0]));
    }

    build(&cells, &["Mixed", "Rising"], |gene, cell| {
        let (_, niche, pt, _) = *cell;
        match (gene, niche) {
            (0, "Border") => 10.0 - pt,
            (_, "Remote") => {
                if pt == 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            _ => pt + 1.0,
        }
    })
}

/// Parameters used with `two_niche_scenario`
pub fn two_niche_params() -> NicheFilterParams {
    NicheFilterParams {
        min_niche_fraction: 0.4,
        ..three_type_params()
    }
}
