use std::time::Instant;

use crate::core::data::niche_data::NicheCellData;
use crate::core::errors::NicheResult;
use crate::single_cell::methods::niche_filter::*;
use crate::single_cell::methods::niche_scores::*;

/// Results of a full niche analysis
///
/// ### Fields
///
/// * `genes` - Names of the surviving genes in cascade order
/// * `summary` - One `NicheGeneSummary` per surviving gene
/// * `report` - The `CascadeReport` with per-stage survivors and rejections
#[derive(Clone, Debug)]
pub struct NicheAnalysisRes {
    pub genes: Vec<String>,
    pub summary: Vec<NicheGeneSummary>,
    pub report: CascadeReport,
}

/// Identify early induced, fibrotic enriched genes and score them spatially
///
/// Validates the parameters, runs the four stage cascade and summarises the
/// survivors with their log2 fold change, mean nearest fibrotic cell
/// distance and fibrotic niche fraction.
///
/// ### Params
///
/// * `data` - The indexed cell data
/// * `params` - The filter parameters
///
/// ### Returns
///
/// The `NicheAnalysisRes`, or the configuration error that stopped the run
pub fn run_niche_analysis(
    data: &NicheCellData,
    params: &NicheFilterParams,
) -> NicheResult<NicheAnalysisRes> {
    let report = run_niche_cascade(data, params)?;

    let start = Instant::now();
    let summary = summarise_niche_genes(data, &report.enriched);
    if params.verbose {
        println!(
            "Spatial scoring of {} genes: {:.2?}",
            summary.len(),
            start.elapsed()
        );
    }

    let genes = report
        .enriched
        .iter()
        .map(|&g| data.gene_name(g).to_string())
        .collect();

    Ok(NicheAnalysisRes {
        genes,
        summary,
        report,
    })
}

///////////
// Tests //
///////////
