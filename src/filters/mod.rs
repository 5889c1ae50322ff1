//! Filter modules for intensity-plane processing.
//!
//! ## Supported Formats
//!
//! | Input | Shape | Type | Used by |
//! |-------|-------|------|---------|
//! | Intensity plane | (H, W) | u8 | spatial, median, Laplacian, equalization |
//! | Float plane | (H, W) | f64 | transforms, frequency filters |
//! | Spectrum | (H, W) | Complex64 | frequency filters |
//! | Color | (H, W, 3) | u8 | HSV/luma conversion, color equalization |
//!
//! ## Architecture
//!
//! All filters follow these principles:
//! - **Pure** - Inputs are borrowed views, results are new arrays
//! - **Validated** - Empty planes and invalid sizes are rejected before any output is allocated
//! - **Thread-safe** - Row-level parallelism with rayon where pixels are independent
//!
//! ## Filter Categories
//!
//! - **Transform**: forward/inverse 2D DFT, FFT-shift, log-magnitude spectrum
//! - **Frequency**: square low-pass / high-pass masks on the shifted spectrum
//! - **Spatial**: 3x3 box average, 3x3 sharpen
//! - **Edge**: Gaussian pre-pass + Laplacian
//! - **Noise**: median
//! - **Equalize**: per-channel histogram equalization
//! - **Color**: HSV working image, luma, float quantization

pub mod core;
pub mod color;
pub mod transform;
pub mod frequency;
pub mod spatial;
pub mod edge;
pub mod noise;
pub mod equalize;
