//! Edge detection: 3x3 Gaussian pre-smoothing followed by a Laplacian.
//!
//! The Laplacian responds to both rising and falling intensity edges with
//! opposite signs; the result is rectified so every edge shows up as a
//! positive magnitude. Borders use reflect-101 extension.

use ndarray::{Array2, ArrayView2};

use crate::error::{ensure_non_empty, FilterError, Result};
use crate::filters::core::{correlate_3x3, correlate_separable, derivative_kernel};

/// Largest supported Laplacian aperture.
pub const MAX_APERTURE: usize = 31;

/// Laplacian kernel used for aperture 1 (4-neighbor).
const LAPLACIAN_4: [[f64; 3]; 3] = [[0.0, 1.0, 0.0], [1.0, -4.0, 1.0], [0.0, 1.0, 0.0]];

// ============================================================================
// Gaussian Pre-pass
// ============================================================================

/// Smooth an 8-bit plane with the 3x3 binomial kernel `[1, 2, 1] / 4`
/// in both directions.
///
/// Results are rounded to nearest and stay 8-bit.
pub fn gaussian_blur_3x3(plane: ArrayView2<u8>) -> Result<Array2<u8>> {
    let (height, width) = plane.dim();
    ensure_non_empty(height, width, "gaussian blur input")?;

    let kernel = [0.25, 0.5, 0.25];
    let blurred = correlate_separable(plane.mapv(f64::from).view(), &kernel, &kernel)?;
    Ok(blurred.mapv(|v| v.round().clamp(0.0, 255.0) as u8))
}

// ============================================================================
// Laplacian
// ============================================================================

/// Check that an aperture is odd and within `1..=MAX_APERTURE`.
pub fn validate_aperture(aperture: usize) -> Result<()> {
    if aperture % 2 == 0 {
        return Err(FilterError::ParameterOutOfRange {
            name: "aperture",
            value: aperture,
            reason: "Laplacian aperture must be odd",
        });
    }
    if aperture > MAX_APERTURE {
        return Err(FilterError::ParameterOutOfRange {
            name: "aperture",
            value: aperture,
            reason: "Laplacian aperture must be at most 31",
        });
    }
    Ok(())
}

/// Raw (signed) Laplacian response of a float plane.
///
/// # Arguments
/// * `plane` - Input plane
/// * `aperture` - 1 for the 4-neighbor 3x3 kernel, otherwise an odd size
///   for the sum of separable second-derivative kernels
pub fn laplacian_response(plane: ArrayView2<f64>, aperture: usize) -> Result<Array2<f64>> {
    validate_aperture(aperture)?;
    let (height, width) = plane.dim();
    ensure_non_empty(height, width, "laplacian input")?;

    if aperture == 1 {
        return correlate_3x3(plane, &LAPLACIAN_4);
    }

    let second = derivative_kernel(2, aperture);
    let smooth = derivative_kernel(0, aperture);

    let d2x = correlate_separable(plane, &second, &smooth)?;
    let d2y = correlate_separable(plane, &smooth, &second)?;
    Ok(d2x + d2y)
}

/// Gaussian-smoothed, rectified Laplacian of an 8-bit plane.
///
/// # Arguments
/// * `plane` - 8-bit intensity plane
/// * `aperture` - Laplacian aperture (odd, 1-31)
///
/// # Returns
/// Edge magnitude plane (not clipped to 255)
pub fn laplacian(plane: ArrayView2<u8>, aperture: usize) -> Result<Array2<f64>> {
    validate_aperture(aperture)?;

    let smoothed = gaussian_blur_3x3(plane)?;
    let mut response = laplacian_response(smoothed.mapv(f64::from).view(), aperture)?;
    response.mapv_inplace(f64::abs);
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    #[test]
    fn test_gaussian_flat_plane_unchanged() {
        let plane = Array2::<u8>::from_elem((5, 4), 77);
        assert_eq!(gaussian_blur_3x3(plane.view()).unwrap(), plane);
    }

    #[test]
    fn test_gaussian_spreads_point() {
        let mut plane = Array2::<u8>::zeros((5, 5));
        plane[[2, 2]] = 160;
        let out = gaussian_blur_3x3(plane.view()).unwrap();

        // Center weight 1/4, edge 1/8, corner 1/16
        assert_eq!(out[[2, 2]], 40);
        assert_eq!(out[[1, 2]], 20);
        assert_eq!(out[[1, 1]], 10);
        assert_eq!(out[[0, 0]], 0);
    }

    #[test]
    fn test_laplacian_flat_is_zero() {
        let plane = Array2::<u8>::from_elem((6, 6), 128);
        for aperture in [1, 3, 5] {
            let out = laplacian(plane.view(), aperture).unwrap();
            assert!(out.iter().all(|&v| v == 0.0), "aperture {}", aperture);
        }
    }

    #[test]
    fn test_laplacian_response_point_aperture_1() {
        let mut plane = Array2::<f64>::zeros((5, 5));
        plane[[2, 2]] = 1.0;
        let out = laplacian_response(plane.view(), 1).unwrap();
        assert_eq!(out[[2, 2]], -4.0);
        assert_eq!(out[[1, 2]], 1.0);
        assert_eq!(out[[1, 1]], 0.0);
    }

    #[test]
    fn test_laplacian_response_aperture_3_kernel() {
        // Aperture 3 kernel is [[2, 0, 2], [0, -8, 0], [2, 0, 2]]
        let mut plane = Array2::<f64>::zeros((5, 5));
        plane[[2, 2]] = 1.0;
        let out = laplacian_response(plane.view(), 3).unwrap();
        let window = out.slice(ndarray::s![1..4, 1..4]).to_owned();
        assert_eq!(window, arr2(&[[2.0, 0.0, 2.0], [0.0, -8.0, 0.0], [2.0, 0.0, 2.0]]));
    }

    #[test]
    fn test_laplacian_is_rectified() {
        let mut plane = Array2::<u8>::zeros((7, 7));
        for y in 0..7 {
            for x in 4..7 {
                plane[[y, x]] = 200;
            }
        }
        let out = laplacian(plane.view(), 1).unwrap();
        assert!(out.iter().all(|&v| v >= 0.0));
        assert!(out[[3, 3]] > 0.0);
        assert!(out[[3, 4]] > 0.0);
    }

    #[test]
    fn test_aperture_validation() {
        let plane = Array2::<u8>::zeros((4, 4));
        assert!(matches!(
            laplacian(plane.view(), 2),
            Err(FilterError::ParameterOutOfRange { .. })
        ));
        assert!(matches!(
            laplacian(plane.view(), 33),
            Err(FilterError::ParameterOutOfRange { .. })
        ));
        assert!(laplacian(plane.view(), 31).is_ok());
    }
}
