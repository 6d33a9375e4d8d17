use crate::assert_same_len;

/// Kernel radius in standard deviations
pub const GAUSSIAN_TRUNCATE: f64 = 4.0;

/////////////
// Helpers //
/////////////

/// Map an out-of-range index back into `0..n`
///
/// Uses the half-sample symmetric extension (`d c b a | a b c d | d c b a`),
/// which repeats with a period of `2 * n`.
#[inline]
fn reflect_index(i: isize, n: usize) -> usize {
    let period = 2 * n as isize;
    let m = i.rem_euclid(period) as usize;
    if m >= n {
        2 * n - m - 1
    } else {
        m
    }
}

/// Generate the normalised Gaussian kernel
///
/// ### Params
///
/// * `sigma` - Standard deviation in samples
/// * `truncate` - Radius of the kernel in standard deviations
///
/// ### Returns
///
/// The kernel weights of length `2 * radius + 1`, summing to 1.
pub fn gaussian_kernel(sigma: f64, truncate: f64) -> Vec<f64> {
    let radius = (truncate * sigma + 0.5) as isize;
    let mut weights: Vec<f64> = (-radius..=radius)
        .map(|x| {
            let x = x as f64;
            (-0.5 * x * x / (sigma * sigma)).exp()
        })
        .collect();
    let total: f64 = weights.iter().sum();
    weights.iter_mut().for_each(|w| *w /= total);
    weights
}

///////////////
// Functions //
///////////////

/// One-dimensional Gaussian smoothing with reflective boundaries
///
/// ### Params
///
/// * `values` - The equally spaced samples to smooth
/// * `sigma` - Standard deviation of the kernel in samples. A value of `0`
///   returns the input unchanged.
///
/// ### Returns
///
/// The smoothed samples (same length as `values`)
pub fn gaussian_smooth_1d(values: &[f64], sigma: f64) -> Vec<f64> {
    let n = values.len();
    if n == 0 || sigma <= 0.0 {
        return values.to_vec();
    }

    let kernel = gaussian_kernel(sigma, GAUSSIAN_TRUNCATE);
    let radius = (kernel.len() / 2) as isize;

    (0..n as isize)
        .map(|i| {
            kernel
                .iter()
                .enumerate()
                .map(|(k, w)| w * values[reflect_index(i + k as isize - radius, n)])
                .sum()
        })
        .collect()
}

/// Discrete derivative of `values` with respect to the positions `x`
///
/// Interior points use second order central differences that account for
/// uneven spacing, the two boundary points use one-sided first differences.
///
/// ### Params
///
/// * `values` - The sampled function
/// * `x` - Sample positions, strictly increasing for a finite result
///
/// ### Returns
///
/// The derivative samples. Fewer than two samples yield an empty vector.
pub fn gradient(values: &[f64], x: &[f64]) -> Vec<f64> {
    assert_same_len!(values, x);

    let n = values.len();
    if n < 2 {
        return Vec::new();
    }

    let mut res = vec![0.0; n];
    res[0] = (values[1] - values[0]) / (x[1] - x[0]);
    res[n - 1] = (values[n - 1] - values[n - 2]) / (x[n - 1] - x[n - 2]);

    for i in 1..n - 1 {
        let hs = x[i] - x[i - 1];
        let hd = x[i + 1] - x[i];
        res[i] = (hs * hs * values[i + 1] + (hd * hd - hs * hs) * values[i]
            - hd * hd * values[i - 1])
            / (hs * hd * (hd + hs));
    }

    res
}

///////////
// Tests //
///////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reflect_index() {
        // c b a | a b c | c b a
        assert_eq!(reflect_index(-1, 3), 0);
        assert_eq!(reflect_index(-3, 3), 2);
        assert_eq!(reflect_index(3, 3), 2);
        assert_eq!(reflect_index(5, 3), 0);
        assert_eq!(reflect_index(6, 3), 0);
        assert_eq!(reflect_index(-7, 3), 0);
        assert_eq!(reflect_index(1, 3), 1);
    }

    #[test]
    fn test_kernel_shape() {
        let kernel = gaussian_kernel(2.0, GAUSSIAN_TRUNCATE);
        assert_eq!(kernel.len(), 17);
        assert!((kernel.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!((kernel[0] - kernel[16]).abs() < 1e-15);
        assert!(kernel[8] > kernel[7]);
    }

    #[test]
    fn test_smoothing_preserves_constants() {
        let flat = vec![3.5; 6];
        let smoothed = gaussian_smooth_1d(&flat, 2.0);
        for v in smoothed {
            assert!((v - 3.5).abs() < 1e-12);
        }
    }

    #[test]
    fn test_smoothing_keeps_monotone_trend() {
        let ramp: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let smoothed = gaussian_smooth_1d(&ramp, 2.0);
        for w in smoothed.windows(2) {
            assert!(w[1] >= w[0]);
        }
        // reflective boundaries pull the edges towards the interior
        assert!(smoothed[0] > 0.0);
        assert!(smoothed[9] < 9.0);
    }

    #[test]
    fn test_gradient_linear() {
        let x = vec![0.5, 1.5, 2.5, 3.5];
        let y: Vec<f64> = x.iter().map(|v| 2.0 * v + 1.0).collect();
        let grad = gradient(&y, &x);
        assert_eq!(grad.len(), 4);
        for g in grad {
            assert!((g - 2.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_gradient_quadratic_interior() {
        let x = vec![0.0, 1.0, 3.0];
        let y: Vec<f64> = x.iter().map(|v| v * v).collect();
        let grad = gradient(&y, &x);
        // exact for quadratics on uneven grids
        assert!((grad[1] - 2.0).abs() < 1e-12);
        assert!((grad[0] - 1.0).abs() < 1e-12);
        assert!((grad[2] - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_gradient_short_input() {
        assert!(gradient(&[1.0], &[0.0]).is_empty());
    }
}
