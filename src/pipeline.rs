//! Caller-facing filter dispatch and edit session.
//!
//! A filter call takes the working raster, the original raster and a size,
//! and returns a new raster together with the display spectrum and
//! histogram. For color rasters only the HSV Value plane is filtered; hue
//! and saturation of the working raster are reused when converting back.
//!
//! [`EditSession`] threads the original, base and displayed rasters through
//! successive calls by value; every operation returns a new session.

use std::fmt;
use std::str::FromStr;

use ndarray::{Array2, ArrayView2};
use rustfft::num_complex::Complex64;

use crate::error::{FilterError, Result};
use crate::filters::color::{from_hsv, plane_to_u8, to_hsv};
use crate::filters::edge::laplacian;
use crate::filters::equalize::{
    build_histogram, equalize_color, equalize_plane, EqualizeOptions, Histogram,
};
use crate::filters::frequency::{high_pass_frequency, low_pass_frequency};
use crate::filters::noise::median;
use crate::filters::spatial::{box_low_pass, sharpen_high_pass};
use crate::filters::transform::{analyze, analyze_u8, LogMagnitudeMode};
use crate::raster::Raster;

// ============================================================================
// Filter Selection
// ============================================================================

/// Filter applied to the intensity plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKind {
    /// Show the original raster unchanged.
    Normal,
    /// Keep the centered `(2 * size + 1)`-wide square of frequencies.
    LowPassFrequency,
    /// `size` x `size` median.
    Median,
    /// Remove the centered `(2 * size + 1)`-wide square of frequencies.
    HighPassFrequency,
    /// Gaussian pre-pass and Laplacian with aperture `size`.
    Laplacian,
    /// 3x3 box average (`size` unused).
    LowPassSpatial,
    /// 3x3 sharpen (`size` unused).
    HighPassSpatial,
}

impl FilterKind {
    pub const ALL: [FilterKind; 7] = [
        FilterKind::Normal,
        FilterKind::LowPassFrequency,
        FilterKind::Median,
        FilterKind::HighPassFrequency,
        FilterKind::Laplacian,
        FilterKind::LowPassSpatial,
        FilterKind::HighPassSpatial,
    ];

    /// Human-readable label, as shown in filter pickers.
    pub fn label(self) -> &'static str {
        match self {
            FilterKind::Normal => "Normal",
            FilterKind::LowPassFrequency => "Low pass filter",
            FilterKind::Median => "Median filter",
            FilterKind::HighPassFrequency => "High pass filter",
            FilterKind::Laplacian => "Laplacian filter",
            FilterKind::LowPassSpatial => "Low pass filter spatial",
            FilterKind::HighPassSpatial => "High pass filter spatial",
        }
    }

    /// True for the filters that work on the spectrum.
    pub fn is_frequency(self) -> bool {
        matches!(self, FilterKind::LowPassFrequency | FilterKind::HighPassFrequency)
    }

    fn snake_name(self) -> &'static str {
        match self {
            FilterKind::Normal => "normal",
            FilterKind::LowPassFrequency => "low_pass_frequency",
            FilterKind::Median => "median",
            FilterKind::HighPassFrequency => "high_pass_frequency",
            FilterKind::Laplacian => "laplacian",
            FilterKind::LowPassSpatial => "low_pass_spatial",
            FilterKind::HighPassSpatial => "high_pass_spatial",
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FilterKind {
    type Err = FilterError;

    /// Accepts the labels from [`FilterKind::label`] and snake_case names
    /// (`low_pass_frequency`, `median`, ...).
    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase();
        FilterKind::ALL
            .into_iter()
            .find(|kind| {
                kind.label().to_ascii_lowercase() == normalized || kind.snake_name() == normalized
            })
            .ok_or_else(|| FilterError::InvalidInput(format!("unknown filter '{s}'")))
    }
}

/// Filter settings that are not per-call parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FilterOptions {
    pub log_magnitude: LogMagnitudeMode,
}

// ============================================================================
// Plane Filtering
// ============================================================================

/// Filtered intensity plane with its display spectrum.
#[derive(Debug, Clone)]
pub struct PlaneOutput {
    pub plane: Array2<u8>,
    pub log_magnitude: Array2<i32>,
    /// Filtered shifted spectrum, for the frequency filters only.
    pub spectrum: Option<Array2<Complex64>>,
}

/// Apply a filter to a single 8-bit plane.
///
/// Float results are clamped to 0-255 and truncated when stored back into
/// the 8-bit plane; the display spectrum is computed from the float result.
///
/// # Arguments
/// * `plane` - Intensity plane
/// * `kind` - Filter to apply
/// * `size` - Mask half-width, median window or Laplacian aperture
/// * `options` - Display settings
pub fn filter_plane(
    plane: ArrayView2<u8>,
    kind: FilterKind,
    size: usize,
    options: &FilterOptions,
) -> Result<PlaneOutput> {
    let mode = options.log_magnitude;

    let (filtered, log_magnitude, spectrum) = match kind {
        FilterKind::Normal => {
            let analysis = analyze_u8(plane, mode)?;
            (plane.to_owned(), analysis.log_magnitude, None)
        }
        FilterKind::LowPassFrequency | FilterKind::HighPassFrequency => {
            let analysis = analyze_u8(plane, mode)?;
            let output = if kind == FilterKind::LowPassFrequency {
                low_pass_frequency(analysis.shifted.view(), size, mode)?
            } else {
                high_pass_frequency(analysis.shifted.view(), size, mode)?
            };
            (
                plane_to_u8(output.plane.view()),
                output.log_magnitude,
                Some(output.spectrum),
            )
        }
        FilterKind::Median => {
            let filtered = median(plane, size)?;
            let analysis = analyze_u8(filtered.view(), mode)?;
            (filtered, analysis.log_magnitude, None)
        }
        FilterKind::Laplacian => spatial_result(laplacian(plane, size)?, mode)?,
        FilterKind::LowPassSpatial => spatial_result(box_low_pass(plane)?, mode)?,
        FilterKind::HighPassSpatial => spatial_result(sharpen_high_pass(plane)?, mode)?,
    };

    Ok(PlaneOutput {
        plane: filtered,
        log_magnitude,
        spectrum,
    })
}

type PlaneParts = (Array2<u8>, Array2<i32>, Option<Array2<Complex64>>);

fn spatial_result(result: Array2<f64>, mode: LogMagnitudeMode) -> Result<PlaneParts> {
    let analysis = analyze(result.view(), mode)?;
    Ok((plane_to_u8(result.view()), analysis.log_magnitude, None))
}

// ============================================================================
// Raster Filtering
// ============================================================================

/// Result of [`apply_filter`].
#[derive(Debug, Clone)]
pub struct FilterOutput {
    pub raster: Raster,
    /// Display spectrum of the filtered intensity plane.
    pub log_magnitude: Array2<i32>,
    /// Filtered shifted spectrum, for the frequency filters only.
    pub spectrum: Option<Array2<Complex64>>,
    /// Histogram of the luma of `raster`.
    pub histogram: Histogram,
}

/// Filter a raster.
///
/// # Arguments
/// * `working` - Raster to filter
/// * `original` - Unfiltered raster, returned as-is by [`FilterKind::Normal`]
/// * `kind` - Filter to apply
/// * `size` - Mask half-width, median window or Laplacian aperture
/// * `options` - Display settings
///
/// # Errors
/// `InvalidInput` when either raster is malformed or their layouts differ;
/// `ParameterOutOfRange` when `size` is not valid for `kind`.
pub fn apply_filter(
    working: &Raster,
    original: &Raster,
    kind: FilterKind,
    size: usize,
    options: &FilterOptions,
) -> Result<FilterOutput> {
    working.validate()?;
    original.validate()?;
    if !working.same_layout(original) {
        return Err(FilterError::InvalidInput(format!(
            "working raster {:?} does not match original raster {:?}",
            working.dim(),
            original.dim()
        )));
    }

    let (height, width) = working.dim();
    tracing::debug!(
        filter = %kind,
        size,
        height,
        width,
        color = working.is_color(),
        "applying filter"
    );

    if kind == FilterKind::Normal {
        let gray = original.gray_plane()?;
        let analysis = analyze_u8(gray.view(), options.log_magnitude)?;
        return Ok(FilterOutput {
            raster: original.clone(),
            log_magnitude: analysis.log_magnitude,
            spectrum: None,
            histogram: build_histogram(gray.view()),
        });
    }

    let (raster, log_magnitude, spectrum) = match working {
        Raster::Grayscale(plane) => {
            let PlaneOutput { plane, log_magnitude, spectrum } =
                filter_plane(plane.view(), kind, size, options)?;
            (Raster::Grayscale(plane), log_magnitude, spectrum)
        }
        Raster::Color { pixels, order } => {
            let hsv = to_hsv(pixels.view(), *order)?;
            let PlaneOutput { plane, log_magnitude, spectrum } =
                filter_plane(hsv.value.view(), kind, size, options)?;
            let hsv = hsv.with_value(plane);
            let raster = Raster::Color {
                pixels: from_hsv(&hsv, *order)?,
                order: *order,
            };
            (raster, log_magnitude, spectrum)
        }
    };

    let histogram = build_histogram(raster.gray_plane()?.view());

    Ok(FilterOutput {
        raster,
        log_magnitude,
        spectrum,
        histogram,
    })
}

// ============================================================================
// Equalization
// ============================================================================

/// Result of [`equalize`].
#[derive(Debug, Clone)]
pub struct EqualizeResult {
    pub raster: Raster,
    /// Per-channel histograms (R, G, B) of the result, color input only.
    pub channel_histograms: Option<[Histogram; 3]>,
    /// Histogram of every equalized sample.
    pub histogram: Histogram,
    /// Display spectrum of the result's luma.
    pub log_magnitude: Array2<i32>,
}

/// Histogram-equalize a raster, each color channel on its own.
pub fn equalize(
    image: &Raster,
    options: &EqualizeOptions,
    filter_options: &FilterOptions,
) -> Result<EqualizeResult> {
    image.validate()?;

    let (height, width) = image.dim();
    tracing::debug!(height, width, seed = ?options.seed, color = image.is_color(), "equalizing");

    let (raster, channel_histograms, histogram) = match image {
        Raster::Grayscale(plane) => {
            let equalized = equalize_plane(plane.view(), options)?;
            let histogram = build_histogram(equalized.view());
            (Raster::Grayscale(equalized), None, histogram)
        }
        Raster::Color { pixels, order } => {
            let output = equalize_color(pixels.view(), *order, options)?;
            let raster = Raster::Color {
                pixels: output.pixels,
                order: output.order,
            };
            (raster, Some(output.channel_histograms), output.combined)
        }
    };

    let analysis = analyze_u8(raster.gray_plane()?.view(), filter_options.log_magnitude)?;

    Ok(EqualizeResult {
        raster,
        channel_histograms,
        histogram,
        log_magnitude: analysis.log_magnitude,
    })
}

// ============================================================================
// Edit Session
// ============================================================================

/// Settings carried by an [`EditSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionOptions {
    pub filter: FilterOptions,
    pub equalize: EqualizeOptions,
}

/// Immutable editing state: the loaded raster, the raster filters start
/// from, and the raster currently shown.
///
/// Filters always start from `base`, so switching filters never stacks
/// them. Equalizing the displayed raster makes the result the new base;
/// [`FilterKind::Normal`] resets the base to the original.
#[derive(Debug, Clone)]
pub struct EditSession {
    original: Raster,
    base: Raster,
    displayed: Raster,
    options: SessionOptions,
}

impl EditSession {
    /// Start a session on a freshly loaded raster.
    ///
    /// Returns the session and the display output of the unfiltered raster.
    pub fn open(raster: Raster, options: SessionOptions) -> Result<(Self, FilterOutput)> {
        raster.validate()?;
        let output = apply_filter(&raster, &raster, FilterKind::Normal, 0, &options.filter)?;
        let session = EditSession {
            original: raster.clone(),
            base: raster.clone(),
            displayed: raster,
            options,
        };
        Ok((session, output))
    }

    pub fn original(&self) -> &Raster {
        &self.original
    }

    pub fn base(&self) -> &Raster {
        &self.base
    }

    pub fn displayed(&self) -> &Raster {
        &self.displayed
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Apply a filter to the base raster.
    pub fn apply(&self, kind: FilterKind, size: usize) -> Result<(Self, FilterOutput)> {
        let output = apply_filter(&self.base, &self.original, kind, size, &self.options.filter)?;
        let base = if kind == FilterKind::Normal {
            self.original.clone()
        } else {
            self.base.clone()
        };
        let session = EditSession {
            original: self.original.clone(),
            base,
            displayed: output.raster.clone(),
            options: self.options,
        };
        Ok((session, output))
    }

    /// Equalize the displayed raster and make it the new base.
    pub fn equalize(&self) -> Result<(Self, EqualizeResult)> {
        let result = equalize(&self.displayed, &self.options.equalize, &self.options.filter)?;
        let session = EditSession {
            original: self.original.clone(),
            base: result.raster.clone(),
            displayed: result.raster.clone(),
            options: self.options,
        };
        Ok((session, result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::ChannelOrder;
    use ndarray::Array3;

    fn gradient_color() -> Raster {
        let pixels = Array3::from_shape_fn((6, 6, 3), |(y, x, c)| (y * 30 + x * 10 + c * 20) as u8);
        Raster::color(pixels, ChannelOrder::Bgr).unwrap()
    }

    #[test]
    fn test_filter_kind_labels_roundtrip() {
        for kind in FilterKind::ALL {
            assert_eq!(kind.label().parse::<FilterKind>().unwrap(), kind);
            assert_eq!(kind.to_string(), kind.label());
        }
        assert_eq!("median".parse::<FilterKind>().unwrap(), FilterKind::Median);
        assert_eq!(
            "HIGH_PASS_SPATIAL".parse::<FilterKind>().unwrap(),
            FilterKind::HighPassSpatial
        );
        assert!("emboss".parse::<FilterKind>().is_err());
    }

    #[test]
    fn test_is_frequency() {
        assert!(FilterKind::LowPassFrequency.is_frequency());
        assert!(FilterKind::HighPassFrequency.is_frequency());
        assert!(!FilterKind::Median.is_frequency());
    }

    #[test]
    fn test_filter_plane_frequency_returns_spectrum() {
        let plane = Array2::from_shape_fn((8, 8), |(y, x)| (y * 8 + x) as u8);
        let options = FilterOptions::default();
        let out = filter_plane(plane.view(), FilterKind::LowPassFrequency, 2, &options).unwrap();
        let spectrum = out.spectrum.expect("frequency filter keeps its spectrum");
        assert_eq!(spectrum.dim(), (8, 8));
        // Outside the 5x5 window everything is zero
        assert_eq!(spectrum[[0, 0]], Complex64::new(0.0, 0.0));
    }

    #[test]
    fn test_filter_plane_spatial_has_no_spectrum() {
        let plane = Array2::<u8>::from_elem((5, 5), 30);
        let options = FilterOptions::default();
        let out = filter_plane(plane.view(), FilterKind::LowPassSpatial, 1, &options).unwrap();
        assert!(out.spectrum.is_none());
        assert_eq!(out.plane[[0, 0]], 0);
        // Nine taps of 30/9 land within an ulp of 30 before truncation
        assert!((29..=30).contains(&out.plane[[2, 2]]));
        assert_eq!(out.log_magnitude.dim(), (5, 5));
    }

    #[test]
    fn test_normal_returns_original() {
        let original = gradient_color();
        let working = Raster::color(Array3::<u8>::zeros((6, 6, 3)), ChannelOrder::Bgr).unwrap();
        let options = FilterOptions::default();
        let out = apply_filter(&working, &original, FilterKind::Normal, 3, &options).unwrap();
        assert_eq!(out.raster, original);
        assert_eq!(out.histogram.total(), 36);
    }

    #[test]
    fn test_color_filter_keeps_order_and_shape() {
        let original = gradient_color();
        let options = FilterOptions::default();
        let out = apply_filter(&original, &original, FilterKind::Median, 3, &options).unwrap();

        let Raster::Color { pixels, order } = &out.raster else {
            panic!("expected color output");
        };
        assert_eq!(*order, ChannelOrder::Bgr);
        assert_eq!(pixels.dim(), (6, 6, 3));
    }

    #[test]
    fn test_layout_mismatch_rejected() {
        let color = gradient_color();
        let gray = Raster::grayscale(Array2::<u8>::zeros((6, 6))).unwrap();
        assert!(matches!(
            apply_filter(&color, &gray, FilterKind::Median, 3, &FilterOptions::default()),
            Err(FilterError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_invalid_size_fails_without_output() {
        let gray = Raster::grayscale(Array2::<u8>::zeros((6, 6))).unwrap();
        assert!(matches!(
            apply_filter(&gray, &gray, FilterKind::Median, 2, &FilterOptions::default()),
            Err(FilterError::ParameterOutOfRange { .. })
        ));
    }

    #[test]
    fn test_session_filters_start_from_base() {
        let (session, _) = EditSession::open(gradient_color(), SessionOptions::default()).unwrap();
        let (blurred, first) = session.apply(FilterKind::LowPassSpatial, 1).unwrap();
        let (again, second) = blurred.apply(FilterKind::LowPassSpatial, 1).unwrap();

        // Second application starts from the same base, not from the blurred raster
        assert_eq!(first.raster, second.raster);
        assert_eq!(again.base(), session.original());
        assert_eq!(again.displayed(), &second.raster);
    }

    #[test]
    fn test_session_equalize_becomes_base() {
        let (session, _) = EditSession::open(gradient_color(), SessionOptions::default()).unwrap();
        let (equalized, result) = session.equalize().unwrap();
        assert_eq!(equalized.base(), &result.raster);
        assert!(result.channel_histograms.is_some());

        let (reset, output) = equalized.apply(FilterKind::Normal, 0).unwrap();
        assert_eq!(reset.base(), session.original());
        assert_eq!(&output.raster, session.original());
    }
}
