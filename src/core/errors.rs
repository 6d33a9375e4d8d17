use thiserror::Error;

/// Errors that stop an analysis before any per-gene work is done
///
/// Per-gene outcomes (empty niche subsets, undefined enrichment) are not
/// errors; they are reported as `GeneRejection` values instead.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum NicheError {
    /// Derivatives need at least two bins
    #[error("n_bins must be at least 2, got {0}")]
    TooFewBins(usize),

    /// Early phase window is empty or wider than the trajectory
    #[error("early_bins must be in 1..={n_bins}, got {early_bins}")]
    EarlyWindow { early_bins: usize, n_bins: usize },

    /// A numeric threshold is outside its admissible range
    #[error("invalid threshold '{name}': {value}")]
    InvalidThreshold { name: &'static str, value: f64 },

    /// No fibrotic-associated niches were supplied
    #[error("the fibrotic niche set is empty")]
    EmptyFibroticSet,

    /// The remote niche is also listed as fibrotic
    #[error("remote niche '{0}' is also listed as fibrotic-associated")]
    RemoteInFibrotic(String),

    /// A fibrotic niche label is listed twice
    #[error("niche '{0}' is listed more than once")]
    DuplicateNiche(String),

    /// Metadata and expression matrix do not line up
    #[error("dimension mismatch for {what}: expected {expected}, got {got}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    /// Expression values must be non-negative
    #[error("negative expression value {value} at cell {cell}, gene {gene}")]
    NegativeExpression { cell: usize, gene: usize, value: f64 },

    /// The target cell type does not occur in the data
    #[error("target cell type '{0}' not found in the cell metadata")]
    UnknownCellType(String),
}

/// Result alias for the niche analysis
pub type NicheResult<T> = std::result::Result<T, NicheError>;
