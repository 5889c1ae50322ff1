//! WebAssembly exports for SpectraStag filters.
//!
//! These functions are exposed to JavaScript via wasm-bindgen.
//!
//! ## Buffer Layout
//!
//! - **Gray**: flat row-major bytes, length = width * height
//! - **RGB**: flat interleaved bytes, length = width * height * 3
//!
//! Errors are returned as JavaScript exceptions carrying the message.

use ndarray::{Array2, Array3};
use wasm_bindgen::prelude::*;

use crate::error::FilterError;
use crate::filters::equalize::{build_histogram, EqualizeOptions};
use crate::filters::transform::{analyze_u8, LogMagnitudeMode};
use crate::pipeline::{self, FilterKind, FilterOptions};
use crate::raster::{ChannelOrder, Raster};

fn to_js(err: FilterError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn gray_input(data: &[u8], width: usize, height: usize) -> Result<Array2<u8>, JsValue> {
    Array2::from_shape_vec((height, width), data.to_vec()).map_err(|e| to_js(e.into()))
}

// ============================================================================
// Spectrum
// ============================================================================

/// Log-magnitude spectrum of a gray buffer, zero frequency centered.
///
/// # Arguments
/// * `data` - Flat gray bytes (length = width * height)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `legacy` - Truncate the real part of the complex log instead of
///   rounding the log of the magnitude
#[wasm_bindgen]
pub fn log_magnitude_gray_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    legacy: bool,
) -> Result<Vec<i32>, JsValue> {
    let input = gray_input(data, width, height)?;
    let mode = if legacy {
        LogMagnitudeMode::Legacy
    } else {
        LogMagnitudeMode::Magnitude
    };
    let analysis = analyze_u8(input.view(), mode).map_err(to_js)?;
    Ok(analysis.log_magnitude.into_raw_vec_and_offset().0)
}

// ============================================================================
// Filters
// ============================================================================

/// Filter a gray buffer.
///
/// # Arguments
/// * `data` - Flat gray bytes (length = width * height)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `filter` - Filter label or snake_case name
/// * `size` - Mask half-width, median window or Laplacian aperture
///
/// # Returns
/// Flat gray bytes of the filtered image
#[wasm_bindgen]
pub fn filter_gray_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    filter: &str,
    size: usize,
) -> Result<Vec<u8>, JsValue> {
    let input = gray_input(data, width, height)?;
    let kind: FilterKind = filter.parse().map_err(to_js)?;
    let output = pipeline::filter_plane(input.view(), kind, size, &FilterOptions::default())
        .map_err(to_js)?;
    Ok(output.plane.into_raw_vec_and_offset().0)
}

// ============================================================================
// Equalization
// ============================================================================

/// Equalize each channel of an interleaved RGB buffer.
///
/// # Returns
/// Flat RGB bytes of the equalized image
#[wasm_bindgen]
pub fn equalize_rgb_wasm(data: &[u8], width: usize, height: usize) -> Result<Vec<u8>, JsValue> {
    let input = Array3::from_shape_vec((height, width, 3), data.to_vec())
        .map_err(|e| to_js(e.into()))?;
    let raster = Raster::color(input, ChannelOrder::Rgb).map_err(to_js)?;

    let result = pipeline::equalize(&raster, &EqualizeOptions::default(), &FilterOptions::default())
        .map_err(to_js)?;
    match result.raster {
        Raster::Color { pixels, .. } => Ok(pixels.into_raw_vec_and_offset().0),
        Raster::Grayscale(_) => Err(JsValue::from_str("expected a color result")),
    }
}

/// 256-bin histogram of a gray buffer.
#[wasm_bindgen]
pub fn histogram_wasm(data: &[u8], width: usize, height: usize) -> Result<Vec<u32>, JsValue> {
    let input = gray_input(data, width, height)?;
    let histogram = build_histogram(input.view());
    Ok(histogram
        .counts()
        .iter()
        .map(|&count| u32::try_from(count).unwrap_or(u32::MAX))
        .collect())
}
