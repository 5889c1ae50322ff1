//! Color conversions: BGR/RGB <-> HSV, luma, float plane quantization.
//!
//! Intensity filters only touch the Value plane of an HSV working image.
//! Hue and saturation are carried through untouched and recombined with the
//! filtered Value plane when converting back.
//!
//! ## 8-bit HSV Ranges
//!
//! - **Hue**: 0-179 (degrees / 2, so a full turn fits in a u8)
//! - **Saturation**: 0-255
//! - **Value**: 0-255 (the maximum of the three color channels)

use ndarray::{Array2, Array3, ArrayView2, ArrayView3};

use crate::error::{ensure_non_empty, FilterError, Result};
use crate::raster::{rgb_planes, validate_color, ChannelOrder};

// ============================================================================
// Color Space Conversion Utilities
// ============================================================================

/// Convert RGB to HSV.
/// Input: r, g, b in 0.0-255.0
/// Output: (h, s, v) where h is 0.0-360.0, s is 0.0-1.0 and v is 0.0-255.0
#[inline]
fn rgb_to_hsv(r: f32, g: f32, b: f32) -> (f32, f32, f32) {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let d = max - min;

    if max <= 0.0 {
        return (0.0, 0.0, 0.0);
    }
    let s = d / max;

    if d <= 0.0 {
        return (0.0, s, max);
    }

    let h = if max == r {
        let mut h = (g - b) * 60.0 / d;
        if h < 0.0 {
            h += 360.0;
        }
        h
    } else if max == g {
        (b - r) * 60.0 / d + 120.0
    } else {
        (r - g) * 60.0 / d + 240.0
    };

    (h, s, max)
}

/// Convert HSV to RGB.
/// Input: h in 0.0-360.0, s and v in 0.0-1.0
/// Output: (r, g, b) in 0.0-1.0
#[inline]
fn hsv_to_rgb(h: f32, s: f32, v: f32) -> (f32, f32, f32) {
    if s <= 0.0 {
        return (v, v, v);
    }

    let h = (h / 60.0).rem_euclid(6.0);
    let sector = h.floor();
    let f = h - sector;

    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));

    match sector as u8 {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    }
}

#[inline]
fn unit_to_u8(v: f32) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

// ============================================================================
// HSV Working Image
// ============================================================================

/// Color image split into 8-bit hue, saturation and value planes.
#[derive(Debug, Clone, PartialEq)]
pub struct HsvImage {
    pub hue: Array2<u8>,
    pub saturation: Array2<u8>,
    pub value: Array2<u8>,
}

impl HsvImage {
    pub fn dim(&self) -> (usize, usize) {
        self.value.dim()
    }

    /// Check that the three planes are non-empty and share one shape.
    pub fn validate(&self) -> Result<()> {
        let (height, width) = self.dim();
        ensure_non_empty(height, width, "HSV image")?;
        if self.hue.dim() != (height, width) || self.saturation.dim() != (height, width) {
            return Err(FilterError::InvalidInput(format!(
                "HSV planes differ in shape: hue {:?}, saturation {:?}, value {:?}",
                self.hue.dim(),
                self.saturation.dim(),
                self.value.dim()
            )));
        }
        Ok(())
    }

    /// Replace the Value plane, keeping hue and saturation.
    pub fn with_value(mut self, value: Array2<u8>) -> Self {
        self.value = value;
        self
    }
}

/// Convert a color array to an 8-bit HSV working image.
///
/// # Arguments
/// * `pixels` - Color array of shape (height, width, 3)
/// * `order` - Channel order of `pixels`
///
/// # Errors
/// `InvalidInput` when `pixels` is empty or does not have 3 channels.
pub fn to_hsv(pixels: ArrayView3<u8>, order: ChannelOrder) -> Result<HsvImage> {
    validate_color(pixels)?;
    let (height, width, _) = pixels.dim();
    let [red, green, blue] = rgb_planes(pixels, order);

    let mut hue = Array2::<u8>::zeros((height, width));
    let mut saturation = Array2::<u8>::zeros((height, width));
    let mut value = Array2::<u8>::zeros((height, width));

    for y in 0..height {
        for x in 0..width {
            let (h, s, v) = rgb_to_hsv(
                red[[y, x]] as f32,
                green[[y, x]] as f32,
                blue[[y, x]] as f32,
            );

            // 360 degrees wraps back to hue 0
            hue[[y, x]] = ((h / 2.0).round() as u32 % 180) as u8;
            saturation[[y, x]] = unit_to_u8(s);
            value[[y, x]] = v as u8;
        }
    }

    Ok(HsvImage {
        hue,
        saturation,
        value,
    })
}

/// Convert an 8-bit HSV working image back to a color array.
///
/// # Arguments
/// * `hsv` - HSV planes, all with the same dimensions
/// * `order` - Channel order of the returned array
///
/// # Returns
/// Interleaved (standard layout) color array
pub fn from_hsv(hsv: &HsvImage, order: ChannelOrder) -> Result<Array3<u8>> {
    hsv.validate()?;
    let (height, width) = hsv.dim();
    let mut output = Array3::<u8>::zeros((height, width, 3));
    let [ri, gi, bi] = order.rgb_indices();

    for y in 0..height {
        for x in 0..width {
            let (r, g, b) = hsv_to_rgb(
                hsv.hue[[y, x]] as f32 * 2.0,
                hsv.saturation[[y, x]] as f32 / 255.0,
                hsv.value[[y, x]] as f32 / 255.0,
            );

            output[[y, x, ri]] = unit_to_u8(r);
            output[[y, x, gi]] = unit_to_u8(g);
            output[[y, x, bi]] = unit_to_u8(b);
        }
    }

    Ok(output)
}

// ============================================================================
// Luma
// ============================================================================

/// BT.601 luma coefficients in 14-bit fixed point.
const LUMA_R: u32 = 4899;
const LUMA_G: u32 = 9617;
const LUMA_B: u32 = 1868;
const LUMA_SHIFT: u32 = 14;

/// Convert a color array to a grayscale plane.
///
/// Uses `0.299 R + 0.587 G + 0.114 B`, rounded to nearest.
pub fn to_gray(pixels: ArrayView3<u8>, order: ChannelOrder) -> Result<Array2<u8>> {
    validate_color(pixels)?;
    let [red, green, blue] = rgb_planes(pixels, order);

    let gray = ndarray::Zip::from(&red)
        .and(&green)
        .and(&blue)
        .map_collect(|&r, &g, &b| {
            let sum = r as u32 * LUMA_R + g as u32 * LUMA_G + b as u32 * LUMA_B;
            ((sum + (1 << (LUMA_SHIFT - 1))) >> LUMA_SHIFT) as u8
        });
    Ok(gray)
}

// ============================================================================
// Float Plane Quantization
// ============================================================================

/// Quantize a float plane into an 8-bit plane.
///
/// Values are clamped to 0-255 and truncated toward zero. NaN becomes 0.
///
/// A plain unsigned cast would wrap out-of-range values (a Laplacian
/// response of 300 would come back as 44); saturating keeps strong edges
/// bright instead.
pub fn plane_to_u8(plane: ArrayView2<f64>) -> Array2<u8> {
    plane.mapv(|v| v.clamp(0.0, 255.0) as u8)
}
