//! SpectraStag Rust Extensions
//!
//! Frequency- and spatial-domain image filtering with per-channel histogram
//! equalization, with Python bindings via PyO3 and WASM bindings for
//! JavaScript.
//!
//! ## Image Format
//! - **Grayscale**: (height, width) - single 8-bit plane
//! - **Color**: (height, width, 3) - 8-bit, BGR (default) or RGB order
//!
//! Filters run on one intensity plane. Color rasters are converted to HSV,
//! the Value plane is filtered, and hue/saturation are carried over.
//! Equalization is the exception: it works on each color channel.
//!
//! ## Filter Architecture
//! Every call is pure. Inputs are borrowed, outputs are new arrays, and
//! the editing state lives in [`pipeline::EditSession`] values that callers
//! thread through successive operations.

pub mod error;
pub mod filters;
pub mod pipeline;
pub mod raster;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use error::{FilterError, Result};
pub use filters::equalize::{CumulativeSeed, EqualizeOptions, Histogram};
pub use filters::transform::LogMagnitudeMode;
pub use pipeline::{
    apply_filter, equalize, EditSession, EqualizeResult, FilterKind, FilterOptions, FilterOutput,
    SessionOptions,
};
pub use raster::{ChannelOrder, Raster};

// Python bindings (only when python feature is enabled)
#[cfg(feature = "python")]
mod python {
    use ndarray::Array3;
    use numpy::{
        IntoPyArray, PyArray1, PyArray2, PyArray3, PyReadonlyArray2, PyReadonlyArray3,
    };
    use pyo3::exceptions::PyValueError;
    use pyo3::prelude::*;

    use crate::error::FilterError;
    use crate::filters::equalize::{build_histogram, CumulativeSeed, EqualizeOptions, Histogram};
    use crate::filters::transform::{analyze_u8, LogMagnitudeMode};
    use crate::pipeline::{self, FilterKind, FilterOptions};
    use crate::raster::{ChannelOrder, Raster};

    impl From<FilterError> for PyErr {
        fn from(err: FilterError) -> PyErr {
            PyValueError::new_err(err.to_string())
        }
    }

    fn log_mode(legacy: bool) -> LogMagnitudeMode {
        if legacy {
            LogMagnitudeMode::Legacy
        } else {
            LogMagnitudeMode::Magnitude
        }
    }

    fn parse_seed(seed: &str) -> PyResult<CumulativeSeed> {
        match seed.to_ascii_lowercase().as_str() {
            "first_pixel" => Ok(CumulativeSeed::FirstPixel),
            "first_bin" => Ok(CumulativeSeed::FirstBin),
            other => Err(PyValueError::new_err(format!(
                "unknown cumulative seed '{other}' (expected 'first_pixel' or 'first_bin')"
            ))),
        }
    }

    fn color_pixels(raster: Raster) -> PyResult<Array3<u8>> {
        match raster {
            Raster::Color { pixels, .. } => Ok(pixels),
            Raster::Grayscale(_) => Err(PyValueError::new_err("expected a color result")),
        }
    }

    fn counts<'py>(py: Python<'py>, histogram: &Histogram) -> Bound<'py, PyArray1<u64>> {
        histogram.counts().to_vec().into_pyarray(py)
    }

    // ========================================================================
    // Spectrum
    // ========================================================================

    /// Log-magnitude spectrum of an 8-bit plane, zero frequency centered.
    #[pyfunction]
    #[pyo3(signature = (plane, legacy=false))]
    pub fn fft_log_magnitude<'py>(
        py: Python<'py>,
        plane: PyReadonlyArray2<'py, u8>,
        legacy: bool,
    ) -> PyResult<Bound<'py, PyArray2<i32>>> {
        let analysis = analyze_u8(plane.as_array(), log_mode(legacy))?;
        Ok(analysis.log_magnitude.into_pyarray(py))
    }

    // ========================================================================
    // Filters
    // ========================================================================

    /// Filter a single 8-bit plane.
    ///
    /// # Arguments
    /// * `plane` - Intensity plane (H, W)
    /// * `filter` - Filter label or snake_case name ("median", "Low pass filter", ...)
    /// * `size` - Mask half-width, median window or Laplacian aperture
    ///
    /// # Returns
    /// `(filtered, log_magnitude)`
    #[pyfunction]
    #[pyo3(signature = (plane, filter, size=3, legacy=false))]
    pub fn filter_plane<'py>(
        py: Python<'py>,
        plane: PyReadonlyArray2<'py, u8>,
        filter: &str,
        size: usize,
        legacy: bool,
    ) -> PyResult<(Bound<'py, PyArray2<u8>>, Bound<'py, PyArray2<i32>>)> {
        let kind: FilterKind = filter.parse()?;
        let options = FilterOptions {
            log_magnitude: log_mode(legacy),
        };
        let output = pipeline::filter_plane(plane.as_array(), kind, size, &options)?;
        Ok((
            output.plane.into_pyarray(py),
            output.log_magnitude.into_pyarray(py),
        ))
    }

    /// Filter a color image through its HSV Value plane.
    ///
    /// # Arguments
    /// * `working` - Image to filter (H, W, 3)
    /// * `original` - Unfiltered image, returned by "Normal"
    /// * `filter` - Filter label or snake_case name
    /// * `size` - Mask half-width, median window or Laplacian aperture
    /// * `order` - "BGR" or "RGB"
    ///
    /// # Returns
    /// `(filtered, log_magnitude, histogram)`
    #[pyfunction]
    #[pyo3(signature = (working, original, filter, size=3, order="BGR", legacy=false))]
    pub fn filter_color<'py>(
        py: Python<'py>,
        working: PyReadonlyArray3<'py, u8>,
        original: PyReadonlyArray3<'py, u8>,
        filter: &str,
        size: usize,
        order: &str,
        legacy: bool,
    ) -> PyResult<(
        Bound<'py, PyArray3<u8>>,
        Bound<'py, PyArray2<i32>>,
        Bound<'py, PyArray1<u64>>,
    )> {
        let kind: FilterKind = filter.parse()?;
        let order: ChannelOrder = order.parse()?;
        let working = Raster::color(working.as_array().to_owned(), order)?;
        let original = Raster::color(original.as_array().to_owned(), order)?;
        let options = FilterOptions {
            log_magnitude: log_mode(legacy),
        };

        let output = pipeline::apply_filter(&working, &original, kind, size, &options)?;
        let histogram = counts(py, &output.histogram);
        Ok((
            color_pixels(output.raster)?.into_pyarray(py),
            output.log_magnitude.into_pyarray(py),
            histogram,
        ))
    }

    // ========================================================================
    // Equalization
    // ========================================================================

    /// Equalize each channel of a color image.
    ///
    /// # Returns
    /// `(equalized, combined_histogram)`
    #[pyfunction]
    #[pyo3(signature = (image, order="BGR", seed="first_pixel"))]
    pub fn equalize_color<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        order: &str,
        seed: &str,
    ) -> PyResult<(Bound<'py, PyArray3<u8>>, Bound<'py, PyArray1<u64>>)> {
        let order: ChannelOrder = order.parse()?;
        let raster = Raster::color(image.as_array().to_owned(), order)?;
        let options = EqualizeOptions {
            seed: parse_seed(seed)?,
        };

        let result = pipeline::equalize(&raster, &options, &FilterOptions::default())?;
        let histogram = counts(py, &result.histogram);
        Ok((color_pixels(result.raster)?.into_pyarray(py), histogram))
    }

    /// 256-bin histogram of an 8-bit plane.
    #[pyfunction]
    pub fn histogram<'py>(
        py: Python<'py>,
        plane: PyReadonlyArray2<'py, u8>,
    ) -> Bound<'py, PyArray1<u64>> {
        counts(py, &build_histogram(plane.as_array()))
    }

    /// SpectraStag Rust extension module
    #[pymodule]
    pub fn spectrastag(m: &Bound<'_, PyModule>) -> PyResult<()> {
        // Spectrum
        m.add_function(wrap_pyfunction!(fft_log_magnitude, m)?)?;

        // Filters
        m.add_function(wrap_pyfunction!(filter_plane, m)?)?;
        m.add_function(wrap_pyfunction!(filter_color, m)?)?;

        // Equalization
        m.add_function(wrap_pyfunction!(equalize_color, m)?)?;
        m.add_function(wrap_pyfunction!(histogram, m)?)?;

        Ok(())
    }
}

#[cfg(feature = "python")]
pub use python::spectrastag;
