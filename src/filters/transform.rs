//! Transform engine: 2D DFT, FFT-shift and the log-magnitude spectrum.
//!
//! The forward transform is unnormalized; the inverse divides by
//! `rows * cols`, so a forward/inverse pair reproduces the input.
//! Rows and columns are transformed with rustfft plans, each pass
//! parallelized over lines with rayon.

use ndarray::{Array2, ArrayView2};
use rayon::prelude::*;
use rustfft::num_complex::Complex64;
use rustfft::{FftDirection, FftPlanner};

use crate::error::{ensure_non_empty, Result};

/// Lowest value emitted by [`log_magnitude`].
pub const LOG_MAGNITUDE_MIN: i32 = -200;
/// Highest value emitted by [`log_magnitude`].
pub const LOG_MAGNITUDE_MAX: i32 = 400;

/// Offset added before the logarithm so that empty bins stay finite.
const LOG_OFFSET: f64 = 0.1;

/// How the display spectrum takes the logarithm of complex bins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogMagnitudeMode {
    /// `round(20 * log10(0.1 + |z|))`.
    #[default]
    Magnitude,
    /// `trunc(20 * log10(|0.1 + z|))`: the real part of the complex
    /// logarithm of `0.1 + z`, truncated toward zero. Kept for parity with
    /// spectra rendered by older tooling.
    Legacy,
}

/// Spectrum of a plane in both layouts plus its display form.
#[derive(Debug, Clone)]
pub struct SpectrumAnalysis {
    /// Raw transform, DC at `[0, 0]`.
    pub spectrum: Array2<Complex64>,
    /// Transform with the DC term moved to the center.
    pub shifted: Array2<Complex64>,
    /// Log-magnitude of `shifted`, for display.
    pub log_magnitude: Array2<i32>,
}

/// Forward 2D DFT of a real plane.
///
/// # Errors
/// `InvalidInput` when either dimension is zero.
pub fn forward_transform(plane: ArrayView2<f64>) -> Result<Array2<Complex64>> {
    let (rows, cols) = plane.dim();
    ensure_non_empty(rows, cols, "transform input")?;

    let buffer: Vec<Complex64> = plane.iter().map(|&v| Complex64::new(v, 0.0)).collect();
    transform_2d(rows, cols, buffer, FftDirection::Forward)
}

/// Inverse 2D DFT, returning the magnitude of each element.
///
/// Filtering a spectrum can leave small imaginary residue in the spatial
/// result; the magnitude folds it back into a real plane.
///
/// # Errors
/// `InvalidInput` when either dimension is zero.
pub fn inverse_transform(spectrum: ArrayView2<Complex64>) -> Result<Array2<f64>> {
    let (rows, cols) = spectrum.dim();
    ensure_non_empty(rows, cols, "inverse transform input")?;

    let buffer: Vec<Complex64> = spectrum.iter().copied().collect();
    let spatial = transform_2d(rows, cols, buffer, FftDirection::Inverse)?;

    let scale = 1.0 / (rows * cols) as f64;
    Ok(spatial.mapv(|z| (z * scale).norm()))
}

/// Run the row pass, transpose, run the column pass and transpose back.
fn transform_2d(
    rows: usize,
    cols: usize,
    mut buffer: Vec<Complex64>,
    direction: FftDirection,
) -> Result<Array2<Complex64>> {
    let mut planner = FftPlanner::<f64>::new();
    let row_fft = planner.plan_fft(cols, direction);
    let col_fft = planner.plan_fft(rows, direction);

    buffer.par_chunks_mut(cols).for_each(|row| row_fft.process(row));

    let mut transposed = vec![Complex64::default(); rows * cols];
    for r in 0..rows {
        for c in 0..cols {
            transposed[c * rows + r] = buffer[r * cols + c];
        }
    }

    transposed.par_chunks_mut(rows).for_each(|col| col_fft.process(col));

    let columns_major = Array2::from_shape_vec((cols, rows), transposed)?;
    Ok(columns_major.reversed_axes().as_standard_layout().into_owned())
}

/// Move the zero-frequency term to the center of the array.
///
/// Quadrants are swapped diagonally. For odd sizes the split point is
/// `floor(n / 2)`, so element `i` lands at `(i + n / 2) % n`.
pub fn fft_shift<T: Clone>(input: ArrayView2<T>) -> Array2<T> {
    let (rows, cols) = input.dim();
    let (dr, dc) = (rows / 2, cols / 2);
    Array2::from_shape_fn((rows, cols), |(r, c)| {
        input[[(r + rows - dr) % rows, (c + cols - dc) % cols]].clone()
    })
}

/// Exact inverse of [`fft_shift`] for both odd and even sizes.
pub fn ifft_shift<T: Clone>(input: ArrayView2<T>) -> Array2<T> {
    let (rows, cols) = input.dim();
    let (dr, dc) = (rows / 2, cols / 2);
    Array2::from_shape_fn((rows, cols), |(r, c)| {
        input[[(r + dr) % rows, (c + dc) % cols]].clone()
    })
}

/// Display spectrum of a (shifted) transform.
///
/// Values are clipped to `LOG_MAGNITUDE_MIN..=LOG_MAGNITUDE_MAX`;
/// NaN maps to the floor.
pub fn log_magnitude(shifted: ArrayView2<Complex64>, mode: LogMagnitudeMode) -> Array2<i32> {
    shifted.mapv(|z| {
        let db = match mode {
            LogMagnitudeMode::Magnitude => (20.0 * (LOG_OFFSET + z.norm()).log10()).round(),
            LogMagnitudeMode::Legacy => {
                (20.0 * (z + Complex64::new(LOG_OFFSET, 0.0)).norm().log10()).trunc()
            }
        };
        clip_decibels(db)
    })
}

#[inline]
fn clip_decibels(db: f64) -> i32 {
    if db.is_nan() {
        return LOG_MAGNITUDE_MIN;
    }
    db.clamp(LOG_MAGNITUDE_MIN as f64, LOG_MAGNITUDE_MAX as f64) as i32
}

/// Forward transform, shift and display spectrum in one call.
pub fn analyze(plane: ArrayView2<f64>, mode: LogMagnitudeMode) -> Result<SpectrumAnalysis> {
    let spectrum = forward_transform(plane)?;
    let shifted = fft_shift(spectrum.view());
    let log_magnitude = log_magnitude(shifted.view(), mode);

    Ok(SpectrumAnalysis {
        spectrum,
        shifted,
        log_magnitude,
    })
}

/// [`analyze`] for an 8-bit plane.
pub fn analyze_u8(plane: ArrayView2<u8>, mode: LogMagnitudeMode) -> Result<SpectrumAnalysis> {
    analyze(plane.mapv(f64::from).view(), mode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::arr2;

    fn sample_plane(rows: usize, cols: usize) -> Array2<f64> {
        Array2::from_shape_fn((rows, cols), |(r, c)| ((r * 37 + c * 11) % 256) as f64)
    }

    #[test]
    fn test_roundtrip_even_and_odd() {
        for (rows, cols) in [(8, 8), (5, 7), (1, 6), (3, 1)] {
            let plane = sample_plane(rows, cols);
            let spectrum = forward_transform(plane.view()).unwrap();
            let back = inverse_transform(spectrum.view()).unwrap();
            for (a, b) in plane.iter().zip(back.iter()) {
                assert_abs_diff_eq!(a, b, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_dc_term_is_sum() {
        let plane = sample_plane(4, 6);
        let spectrum = forward_transform(plane.view()).unwrap();
        assert_abs_diff_eq!(spectrum[[0, 0]].re, plane.sum(), epsilon = 1e-9);
        assert_abs_diff_eq!(spectrum[[0, 0]].im, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_single_frequency_peak() {
        // cos along columns with one cycle per row: energy at (0, 1) and (0, cols - 1)
        let cols = 8;
        let plane = Array2::from_shape_fn((4, cols), |(_, c)| {
            (2.0 * std::f64::consts::PI * c as f64 / cols as f64).cos()
        });
        let spectrum = forward_transform(plane.view()).unwrap();
        assert_abs_diff_eq!(spectrum[[0, 1]].re, 16.0, epsilon = 1e-9);
        assert_abs_diff_eq!(spectrum[[0, cols - 1]].re, 16.0, epsilon = 1e-9);
        assert_abs_diff_eq!(spectrum[[1, 1]].norm(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_empty_plane_is_rejected() {
        let plane = Array2::<f64>::zeros((0, 3));
        assert!(forward_transform(plane.view()).is_err());
        let spectrum = Array2::<Complex64>::zeros((2, 0));
        assert!(inverse_transform(spectrum.view()).is_err());
    }

    #[test]
    fn test_fft_shift_even() {
        let a = arr2(&[[0, 1, 2, 3], [4, 5, 6, 7]]);
        let shifted = fft_shift(a.view());
        assert_eq!(shifted, arr2(&[[6, 7, 4, 5], [2, 3, 0, 1]]));
    }

    #[test]
    fn test_fft_shift_odd_centers_dc() {
        let mut a = Array2::<i32>::zeros((5, 3));
        a[[0, 0]] = 1;
        let shifted = fft_shift(a.view());
        assert_eq!(shifted[[2, 1]], 1);
    }

    #[test]
    fn test_ifft_shift_inverts_odd() {
        let a = Array2::from_shape_fn((5, 7), |(r, c)| r * 7 + c);
        assert_eq!(ifft_shift(fft_shift(a.view()).view()), a);
        assert_eq!(fft_shift(ifft_shift(a.view()).view()), a);
    }

    #[test]
    fn test_log_magnitude_modes() {
        let bins = arr2(&[[Complex64::new(0.0, 0.0), Complex64::new(99.9, 0.0)]]);
        let magnitude = log_magnitude(bins.view(), LogMagnitudeMode::Magnitude);
        // 20 * log10(0.1) = -20, 20 * log10(100) = 40
        assert_eq!(magnitude, arr2(&[[-20, 40]]));

        // 20 * log10(9.1) ≈ 19.18, 20 * log10(30.1) ≈ 29.57
        let bins = arr2(&[[Complex64::new(9.0, 0.0), Complex64::new(30.0, 0.0)]]);
        let rounded = log_magnitude(bins.view(), LogMagnitudeMode::Magnitude);
        let truncated = log_magnitude(bins.view(), LogMagnitudeMode::Legacy);
        assert_eq!(rounded, arr2(&[[19, 30]]));
        assert_eq!(truncated, arr2(&[[19, 29]]));
    }

    #[test]
    fn test_log_magnitude_legacy_uses_complex_sum() {
        // |0.1 + (-0.1 + 1i)| = 1 -> 0 dB, while |z| + 0.1 ≈ 1.105 -> 1 dB
        let bins = arr2(&[[Complex64::new(-0.1, 1.0)]]);
        assert_eq!(log_magnitude(bins.view(), LogMagnitudeMode::Legacy)[[0, 0]], 0);
        assert_eq!(log_magnitude(bins.view(), LogMagnitudeMode::Magnitude)[[0, 0]], 1);
    }

    #[test]
    fn test_log_magnitude_clips_to_floor() {
        // 0.1 + (-0.1) = 0 -> log10(0) = -inf
        let bins = arr2(&[[Complex64::new(-0.1, 0.0)]]);
        assert_eq!(
            log_magnitude(bins.view(), LogMagnitudeMode::Legacy)[[0, 0]],
            LOG_MAGNITUDE_MIN
        );
    }

    #[test]
    fn test_analyze_centers_dc() {
        let plane = Array2::<f64>::from_elem((6, 4), 10.0);
        let analysis = analyze(plane.view(), LogMagnitudeMode::Magnitude).unwrap();
        assert_abs_diff_eq!(analysis.shifted[[3, 2]].re, 240.0, epsilon = 1e-9);
        // 20 * log10(240.1) ≈ 47.6
        assert_eq!(analysis.log_magnitude[[3, 2]], 48);
        assert_eq!(analysis.log_magnitude[[0, 0]], -20);
    }
}
