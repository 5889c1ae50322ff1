//! In-memory raster types.
//!
//! ## Supported Formats
//!
//! | Kind | Shape | Type | Description |
//! |------|-------|------|-------------|
//! | Grayscale | (H, W) | u8 | Single intensity plane, 0-255 |
//! | Color | (H, W, 3) | u8 | Three color channels in a caller-declared order |
//!
//! The image kind and channel order are always declared by the caller.
//! Nothing here inspects array shapes to guess whether an image is color.

use ndarray::{Array2, Array3, ArrayView3, Axis};

use crate::error::{ensure_non_empty, FilterError, Result};
use crate::filters::color::to_gray;

/// Order of the three color channels along the last axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelOrder {
    /// Blue, green, red (the layout of most image decoders on the desktop).
    #[default]
    Bgr,
    /// Red, green, blue.
    Rgb,
}

impl ChannelOrder {
    /// Channel-axis indices of red, green and blue.
    pub fn rgb_indices(self) -> [usize; 3] {
        match self {
            ChannelOrder::Bgr => [2, 1, 0],
            ChannelOrder::Rgb => [0, 1, 2],
        }
    }
}

impl std::str::FromStr for ChannelOrder {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "bgr" => Ok(ChannelOrder::Bgr),
            "rgb" => Ok(ChannelOrder::Rgb),
            other => Err(FilterError::InvalidInput(format!(
                "unknown channel order '{other}'"
            ))),
        }
    }
}

/// An 8-bit image, either a single plane or three color channels.
#[derive(Debug, Clone, PartialEq)]
pub enum Raster {
    Grayscale(Array2<u8>),
    Color {
        pixels: Array3<u8>,
        order: ChannelOrder,
    },
}

impl Raster {
    /// Wrap a grayscale plane, rejecting zero-sized input.
    pub fn grayscale(plane: Array2<u8>) -> Result<Self> {
        let raster = Raster::Grayscale(plane);
        raster.validate()?;
        Ok(raster)
    }

    /// Wrap a (height, width, 3) color array, rejecting zero-sized input
    /// and any other channel count.
    pub fn color(pixels: Array3<u8>, order: ChannelOrder) -> Result<Self> {
        let raster = Raster::Color { pixels, order };
        raster.validate()?;
        Ok(raster)
    }

    /// Check the invariants the constructors enforce.
    ///
    /// The variants are public, so rasters built directly are re-checked
    /// by every engine entry point.
    pub fn validate(&self) -> Result<()> {
        match self {
            Raster::Grayscale(plane) => {
                let (height, width) = plane.dim();
                ensure_non_empty(height, width, "grayscale raster")
            }
            Raster::Color { pixels, .. } => validate_color(pixels.view()),
        }
    }

    /// (height, width) of the raster.
    pub fn dim(&self) -> (usize, usize) {
        match self {
            Raster::Grayscale(plane) => plane.dim(),
            Raster::Color { pixels, .. } => {
                let (height, width, _) = pixels.dim();
                (height, width)
            }
        }
    }

    pub fn is_color(&self) -> bool {
        matches!(self, Raster::Color { .. })
    }

    /// Channel order of a color raster, `None` for grayscale.
    pub fn order(&self) -> Option<ChannelOrder> {
        match self {
            Raster::Grayscale(_) => None,
            Raster::Color { order, .. } => Some(*order),
        }
    }

    /// True when both rasters have the same kind, order and dimensions.
    pub fn same_layout(&self, other: &Raster) -> bool {
        self.order() == other.order() && self.dim() == other.dim()
    }

    /// Luma plane used for spectra and display histograms.
    pub fn gray_plane(&self) -> Result<Array2<u8>> {
        match self {
            Raster::Grayscale(plane) => {
                let (height, width) = plane.dim();
                ensure_non_empty(height, width, "grayscale raster")?;
                Ok(plane.clone())
            }
            Raster::Color { pixels, order } => to_gray(pixels.view(), *order),
        }
    }

    /// Number of pixels (not samples).
    pub fn pixel_count(&self) -> usize {
        let (height, width) = self.dim();
        height * width
    }
}

/// Validate a (height, width, 3) color array.
pub(crate) fn validate_color(pixels: ArrayView3<u8>) -> Result<()> {
    let (height, width, channels) = pixels.dim();
    ensure_non_empty(height, width, "color raster")?;
    if channels != 3 {
        return Err(FilterError::InvalidInput(format!(
            "color raster must have 3 channels, got {channels}"
        )));
    }
    Ok(())
}

/// Borrow the red, green and blue planes of a color array.
///
/// `pixels` must already have passed [`validate_color`].
pub(crate) fn rgb_planes(
    pixels: ArrayView3<'_, u8>,
    order: ChannelOrder,
) -> [ndarray::ArrayView2<'_, u8>; 3] {
    let [r, g, b] = order.rgb_indices();
    [
        pixels.index_axis_move(Axis(2), r),
        pixels.index_axis_move(Axis(2), g),
        pixels.index_axis_move(Axis(2), b),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_order_indices() {
        assert_eq!(ChannelOrder::Bgr.rgb_indices(), [2, 1, 0]);
        assert_eq!(ChannelOrder::Rgb.rgb_indices(), [0, 1, 2]);
    }

    #[test]
    fn test_channel_order_parse() {
        assert_eq!("BGR".parse::<ChannelOrder>().unwrap(), ChannelOrder::Bgr);
        assert_eq!("rgb".parse::<ChannelOrder>().unwrap(), ChannelOrder::Rgb);
        assert!("hsv".parse::<ChannelOrder>().is_err());
    }

    #[test]
    fn test_grayscale_rejects_empty() {
        assert!(Raster::grayscale(Array2::<u8>::zeros((0, 4))).is_err());
        assert!(Raster::grayscale(Array2::<u8>::zeros((1, 1))).is_ok());
    }

    #[test]
    fn test_color_rejects_wrong_channel_count() {
        let four = Array3::<u8>::zeros((2, 2, 4));
        assert!(matches!(
            Raster::color(four, ChannelOrder::Rgb),
            Err(FilterError::InvalidInput(_))
        ));
        assert!(Raster::color(Array3::<u8>::zeros((2, 2, 3)), ChannelOrder::Rgb).is_ok());
    }

    #[test]
    fn test_same_layout() {
        let gray = Raster::Grayscale(Array2::<u8>::zeros((3, 4)));
        let color = Raster::Color {
            pixels: Array3::<u8>::zeros((3, 4, 3)),
            order: ChannelOrder::Bgr,
        };
        let rgb = Raster::Color {
            pixels: Array3::<u8>::zeros((3, 4, 3)),
            order: ChannelOrder::Rgb,
        };
        assert!(gray.same_layout(&gray.clone()));
        assert!(!gray.same_layout(&color));
        assert!(!color.same_layout(&rgb));
        assert_eq!(color.dim(), (3, 4));
        assert_eq!(color.pixel_count(), 12);
    }

    #[test]
    fn test_rgb_planes_follow_order() {
        let mut pixels = Array3::<u8>::zeros((1, 1, 3));
        pixels[[0, 0, 0]] = 10;
        pixels[[0, 0, 1]] = 20;
        pixels[[0, 0, 2]] = 30;

        let [r, g, b] = rgb_planes(pixels.view(), ChannelOrder::Bgr);
        assert_eq!((r[[0, 0]], g[[0, 0]], b[[0, 0]]), (30, 20, 10));

        let [r, _, b] = rgb_planes(pixels.view(), ChannelOrder::Rgb);
        assert_eq!((r[[0, 0]], b[[0, 0]]), (10, 30));
    }

    #[test]
    fn test_gray_plane_rejects_malformed_color() {
        let two_channels = Raster::Color {
            pixels: Array3::<u8>::zeros((2, 2, 2)),
            order: ChannelOrder::Bgr,
        };
        assert!(matches!(two_channels.gray_plane(), Err(FilterError::InvalidInput(_))));
    }
}
