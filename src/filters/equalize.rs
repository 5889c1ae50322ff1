//! Histogram equalization per color channel.
//!
//! Each channel goes through three steps:
//! 1. Count the 256 intensity levels ([`build_histogram`]).
//! 2. Accumulate the histogram into a redistribution table scaled to the
//!    brightest pixel of the channel ([`build_redistribution_table`]).
//! 3. Look every pixel up in that table ([`remap`]).
//!
//! ## Cumulative Seed
//!
//! The running sum starts either from the pixel at `(0, 0)`
//! ([`CumulativeSeed::FirstPixel`], the default, matching existing output)
//! or from `histogram[0]` ([`CumulativeSeed::FirstBin`], textbook CDF
//! equalization). With the first-pixel seed the last table entries can
//! exceed the brightest pixel and even 255; remapping saturates them.
//!
//! Scaling uses the channel's own maximum rather than 255, so the output
//! ceiling tracks the brightest pixel of the input.

use std::ops::Index;

use ndarray::{Array2, Array3, ArrayView2, ArrayView3, Axis};
use rayon::prelude::*;

use crate::error::{ensure_non_empty, Result};
use crate::filters::core::par_rows;
use crate::raster::{rgb_planes, validate_color, ChannelOrder};

/// Number of 8-bit intensity levels.
pub const LEVELS: usize = 256;

// ============================================================================
// Histogram
// ============================================================================

/// Pixel counts per 8-bit intensity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram {
    counts: [u64; LEVELS],
}

impl Default for Histogram {
    fn default() -> Self {
        Histogram {
            counts: [0; LEVELS],
        }
    }
}

impl Histogram {
    pub fn from_counts(counts: [u64; LEVELS]) -> Self {
        Histogram { counts }
    }

    pub fn counts(&self) -> &[u64; LEVELS] {
        &self.counts
    }

    /// Total number of samples counted.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Largest single bin.
    pub fn max_count(&self) -> u64 {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    /// Number of non-empty bins.
    pub fn occupied_levels(&self) -> usize {
        self.counts.iter().filter(|&&c| c > 0).count()
    }

    /// Add another histogram's counts into this one.
    pub fn merge(&mut self, other: &Histogram) {
        for (a, b) in self.counts.iter_mut().zip(other.counts.iter()) {
            *a += b;
        }
    }
}

impl Index<usize> for Histogram {
    type Output = u64;

    fn index(&self, level: usize) -> &u64 {
        &self.counts[level]
    }
}

/// Count every intensity in a plane.
///
/// Rows are counted in parallel and the partial histograms summed.
pub fn build_histogram(plane: ArrayView2<u8>) -> Histogram {
    let height = plane.nrows();

    let counts = (0..height)
        .into_par_iter()
        .fold(
            || [0u64; LEVELS],
            |mut acc, y| {
                for &v in plane.row(y) {
                    acc[v as usize] += 1;
                }
                acc
            },
        )
        .reduce(
            || [0u64; LEVELS],
            |mut a, b| {
                for (x, y) in a.iter_mut().zip(b.iter()) {
                    *x += y;
                }
                a
            },
        );

    Histogram { counts }
}

/// Histogram over every sample of a color array (all channels pooled).
pub fn build_combined_histogram(pixels: ArrayView3<u8>) -> Histogram {
    let mut combined = Histogram::default();
    for channel in pixels.axis_iter(Axis(2)) {
        combined.merge(&build_histogram(channel));
    }
    combined
}

// ============================================================================
// Redistribution Table
// ============================================================================

/// Starting value of the cumulative sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CumulativeSeed {
    /// Seed with the intensity of the pixel at `(0, 0)`.
    #[default]
    FirstPixel,
    /// Seed with `histogram[0]`.
    FirstBin,
}

/// Equalization settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EqualizeOptions {
    pub seed: CumulativeSeed,
}

/// Lookup table from original to equalized intensity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedistributionTable {
    values: [u32; LEVELS],
}

impl RedistributionTable {
    pub fn values(&self) -> &[u32; LEVELS] {
        &self.values
    }

    /// Equalized value for `level`, saturated to 8 bits.
    #[inline]
    pub fn lookup(&self, level: u8) -> u8 {
        self.values[level as usize].min(255) as u8
    }

    /// Number of entries above 255.
    pub fn saturated_entries(&self) -> usize {
        self.values.iter().filter(|&&v| v > 255).count()
    }
}

/// Build the cumulative redistribution table for a plane.
///
/// `table[i] = round_half_even(cumulative[i] / pixel_count * max_intensity)`
/// where `cumulative[0]` is the seed and
/// `cumulative[i] = histogram[i] + cumulative[i - 1]`.
///
/// # Arguments
/// * `histogram` - Histogram of `plane`
/// * `plane` - The plane being equalized (supplies the seed pixel and the maximum)
/// * `seed` - Where the cumulative sum starts
pub fn build_redistribution_table(
    histogram: &Histogram,
    plane: ArrayView2<u8>,
    seed: CumulativeSeed,
) -> Result<RedistributionTable> {
    let (height, width) = plane.dim();
    ensure_non_empty(height, width, "equalization input")?;

    let pixel_count = (height * width) as f64;
    let max_intensity = plane.iter().copied().max().unwrap_or(0) as f64;

    let mut cumulative = [0f64; LEVELS];
    cumulative[0] = match seed {
        CumulativeSeed::FirstPixel => plane[[0, 0]] as f64,
        CumulativeSeed::FirstBin => histogram[0] as f64,
    };
    for i in 1..LEVELS {
        cumulative[i] = histogram[i] as f64 + cumulative[i - 1];
    }
    tracing::trace!(?seed, seed_value = cumulative[0], max_intensity, "cumulative histogram");

    let mut values = [0u32; LEVELS];
    for (value, &sum) in values.iter_mut().zip(cumulative.iter()) {
        *value = ((sum / pixel_count) * max_intensity).round_ties_even() as u32;
    }

    Ok(RedistributionTable { values })
}

/// Replace every pixel with its table entry.
pub fn remap(table: &RedistributionTable, plane: ArrayView2<u8>) -> Result<Array2<u8>> {
    let (height, width) = plane.dim();
    ensure_non_empty(height, width, "remap input")?;

    let saturated = table.saturated_entries();
    if saturated > 0 {
        tracing::warn!(saturated, "redistribution table exceeds 8 bits, saturating");
    }

    par_rows(height, width, |y, row| {
        for (out, &v) in row.iter_mut().zip(plane.row(y).iter()) {
            *out = table.lookup(v);
        }
    })
}

// ============================================================================
// Equalization
// ============================================================================

/// Equalize a single 8-bit plane.
pub fn equalize_plane(plane: ArrayView2<u8>, options: &EqualizeOptions) -> Result<Array2<u8>> {
    let histogram = build_histogram(plane);
    let table = build_redistribution_table(&histogram, plane, options.seed)?;
    remap(&table, plane)
}

/// Result of equalizing a color array.
#[derive(Debug, Clone)]
pub struct EqualizationOutput {
    /// Equalized pixels, same shape and channel order as the input.
    pub pixels: Array3<u8>,
    pub order: ChannelOrder,
    /// Histograms of the equalized red, green and blue channels.
    pub channel_histograms: [Histogram; 3],
    /// Histogram of all equalized samples pooled.
    pub combined: Histogram,
}

/// Equalize the three channels of a color array independently.
///
/// # Arguments
/// * `pixels` - Color array of shape (height, width, 3)
/// * `order` - Channel order of `pixels`; the output keeps it
/// * `options` - Equalization settings
pub fn equalize_color(
    pixels: ArrayView3<u8>,
    order: ChannelOrder,
    options: &EqualizeOptions,
) -> Result<EqualizationOutput> {
    validate_color(pixels)?;

    let channels = pixels
        .axis_iter(Axis(2))
        .map(|channel| equalize_plane(channel, options))
        .collect::<Result<Vec<_>>>()?;

    // Interleave the channels back into a row-major (H, W, 3) array
    let (height, width, _) = pixels.dim();
    let equalized = Array3::from_shape_fn((height, width, 3), |(y, x, c)| channels[c][[y, x]]);

    let [red, green, blue] = rgb_planes(equalized.view(), order);
    let channel_histograms = [
        build_histogram(red),
        build_histogram(green),
        build_histogram(blue),
    ];
    let mut combined = Histogram::default();
    for histogram in &channel_histograms {
        combined.merge(histogram);
    }

    Ok(EqualizationOutput {
        pixels: equalized,
        order,
        channel_histograms,
        combined,
    })
}
