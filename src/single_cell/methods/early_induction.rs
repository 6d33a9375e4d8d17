use crate::core::base::smoothing::{gaussian_smooth_1d, gradient};

/// Width of the smoothing kernel, in bins
pub const SMOOTHING_SIGMA_BINS: f64 = 2.0;

/// Smoothed slope of a binned trajectory
///
/// ### Fields
///
/// * `smoothed` - The Gaussian smoothed trajectory
/// * `derivative` - Derivative of the smoothed trajectory with respect to
///   the bin centres
#[derive(Clone, Debug)]
pub struct TrajectorySlope {
    pub smoothed: Vec<f64>,
    pub derivative: Vec<f64>,
}

impl TrajectorySlope {
    /// Smooth a binned trajectory and take its derivative
    ///
    /// ### Params
    ///
    /// * `trajectory` - Per-bin mean expression in pseudotime order
    /// * `centres` - The bin centres
    ///
    /// ### Returns
    ///
    /// Initialised structure
    pub fn new(trajectory: &[f64], centres: &[f64]) -> Self {
        let smoothed = gaussian_smooth_1d(trajectory, SMOOTHING_SIGMA_BINS);
        let derivative = gradient(&smoothed, centres);
        Self {
            smoothed,
            derivative,
        }
    }

    /// Mean of the first `early_bins` derivative samples
    ///
    /// `NaN` if the window is empty.
    pub fn early_slope(&self, early_bins: usize) -> f64 {
        let window = &self.derivative[..early_bins.min(self.derivative.len())];
        if window.is_empty() {
            return f64::NAN;
        }
        window.iter().sum::<f64>() / window.len() as f64
    }

    /// Is the early phase slope finite and strictly positive
    pub fn is_early_rising(&self, early_bins: usize) -> bool {
        let slope = self.early_slope(early_bins);
        slope.is_finite() && slope > 0.0
    }
}

/// Test whether a binned trajectory rises during its early phase
///
/// ### Params
///
/// * `trajectory` - Per-bin mean expression in pseudotime order
/// * `centres` - The bin centres
/// * `early_bins` - Number of leading derivative samples forming the early
///   phase
///
/// ### Returns
///
/// `true` if the mean smoothed derivative over the early phase is > 0
pub fn is_early_rising(trajectory: &[f64], centres: &[f64], early_bins: usize) -> bool {
    TrajectorySlope::new(trajectory, centres).is_early_rising(early_bins)
}

///////////
// Tests //
///////////
