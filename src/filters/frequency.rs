//! Frequency-domain filters: square low-pass and high-pass masks.
//!
//! Both filters work on a shifted spectrum (DC at `(rows / 2, cols / 2)`)
//! and a half-width `s`. The mask window covers rows
//! `rows / 2 - s ..= rows / 2 + s` and the same span of columns, clipped to
//! the array. A window that runs past an edge is cut off there; it never
//! wraps around to the opposite side.

use ndarray::{Array2, ArrayView2};
use rustfft::num_complex::Complex64;

use crate::error::{ensure_non_empty, Result};
use crate::filters::transform::{
    analyze, ifft_shift, inverse_transform, log_magnitude, LogMagnitudeMode,
};

/// Which side of the mask window is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassBand {
    /// Keep the centered window, zero everything else.
    Low,
    /// Zero the centered window, keep everything else.
    High,
}

/// Clipped square window centered on the DC term. Ends are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskWindow {
    pub row_start: usize,
    pub row_end: usize,
    pub col_start: usize,
    pub col_end: usize,
}

impl MaskWindow {
    /// Window of half-width `half_width` around `(rows / 2, cols / 2)`.
    pub fn centered(rows: usize, cols: usize, half_width: usize) -> Self {
        let (center_row, center_col) = (rows / 2, cols / 2);
        MaskWindow {
            row_start: center_row.saturating_sub(half_width),
            row_end: center_row.saturating_add(half_width).saturating_add(1).min(rows),
            col_start: center_col.saturating_sub(half_width),
            col_end: center_col.saturating_add(half_width).saturating_add(1).min(cols),
        }
    }

    #[inline]
    pub fn contains(&self, row: usize, col: usize) -> bool {
        (self.row_start..self.row_end).contains(&row)
            && (self.col_start..self.col_end).contains(&col)
    }

    /// Number of bins inside the window.
    pub fn area(&self) -> usize {
        (self.row_end - self.row_start) * (self.col_end - self.col_start)
    }
}

/// Result of a frequency-domain filter.
#[derive(Debug, Clone)]
pub struct FrequencyOutput {
    /// Filtered spatial plane (magnitude of the inverse transform).
    pub plane: Array2<f64>,
    /// Display spectrum of the filtered, shifted spectrum.
    pub log_magnitude: Array2<i32>,
    /// Filtered spectrum, still shifted, for chaining or caching.
    pub spectrum: Array2<Complex64>,
}

/// Build a 0/1 mask for the given band.
pub fn frequency_mask(rows: usize, cols: usize, half_width: usize, band: PassBand) -> Array2<f64> {
    let window = MaskWindow::centered(rows, cols, half_width);
    let (inside, outside) = match band {
        PassBand::Low => (1.0, 0.0),
        PassBand::High => (0.0, 1.0),
    };
    Array2::from_shape_fn((rows, cols), |(r, c)| {
        if window.contains(r, c) {
            inside
        } else {
            outside
        }
    })
}

/// Mask that keeps only the centered window.
pub fn low_pass_mask(rows: usize, cols: usize, half_width: usize) -> Array2<f64> {
    frequency_mask(rows, cols, half_width, PassBand::Low)
}

/// Mask that removes the centered window.
pub fn high_pass_mask(rows: usize, cols: usize, half_width: usize) -> Array2<f64> {
    frequency_mask(rows, cols, half_width, PassBand::High)
}

/// Mask a shifted spectrum and transform it back.
///
/// # Arguments
/// * `shifted` - Spectrum with the DC term centered
/// * `half_width` - Half-width of the mask window (0 selects the DC bin alone)
/// * `band` - Which side of the window survives
/// * `mode` - How the display spectrum is computed
pub fn filter_spectrum(
    shifted: ArrayView2<Complex64>,
    half_width: usize,
    band: PassBand,
    mode: LogMagnitudeMode,
) -> Result<FrequencyOutput> {
    let (rows, cols) = shifted.dim();
    ensure_non_empty(rows, cols, "spectrum")?;

    let window = MaskWindow::centered(rows, cols, half_width);
    tracing::trace!(?band, half_width, ?window, "applying frequency mask");

    let mask = frequency_mask(rows, cols, half_width, band);
    let spectrum = ndarray::Zip::from(&shifted)
        .and(&mask)
        .map_collect(|&z, &m| z * m);

    let log_magnitude = log_magnitude(spectrum.view(), mode);
    let plane = inverse_transform(ifft_shift(spectrum.view()).view())?;

    Ok(FrequencyOutput {
        plane,
        log_magnitude,
        spectrum,
    })
}

/// Keep the frequencies inside the centered window (smoothing).
pub fn low_pass_frequency(
    shifted: ArrayView2<Complex64>,
    half_width: usize,
    mode: LogMagnitudeMode,
) -> Result<FrequencyOutput> {
    filter_spectrum(shifted, half_width, PassBand::Low, mode)
}

/// Remove the frequencies inside the centered window (edge emphasis).
pub fn high_pass_frequency(
    shifted: ArrayView2<Complex64>,
    half_width: usize,
    mode: LogMagnitudeMode,
) -> Result<FrequencyOutput> {
    filter_spectrum(shifted, half_width, PassBand::High, mode)
}

/// Transform a spatial plane and low-pass it.
pub fn low_pass_plane(
    plane: ArrayView2<f64>,
    half_width: usize,
    mode: LogMagnitudeMode,
) -> Result<FrequencyOutput> {
    let analysis = analyze(plane, mode)?;
    low_pass_frequency(analysis.shifted.view(), half_width, mode)
}

/// Transform a spatial plane and high-pass it.
pub fn high_pass_plane(
    plane: ArrayView2<f64>,
    half_width: usize,
    mode: LogMagnitudeMode,
) -> Result<FrequencyOutput> {
    let analysis = analyze(plane, mode)?;
    high_pass_frequency(analysis.shifted.view(), half_width, mode)
}
