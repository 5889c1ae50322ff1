//! 3x3 spatial filters: box average (low-pass) and sharpen (high-pass).
//!
//! Both filters visit interior pixels only. The 1-pixel border of the
//! output keeps its initial value of 0 instead of being reconstructed from
//! reflected or clamped neighbors. Planes narrower or shorter than 3 pixels
//! therefore come back all zero.
//!
//! Products are accumulated in row-major kernel order so the float results
//! match a straightforward nested-loop convolution bit for bit.

use ndarray::{Array2, ArrayView2};

use crate::error::{ensure_non_empty, Result};
use crate::filters::core::par_rows;

/// Uniform 3x3 averaging kernel.
pub const BOX_KERNEL: [[f64; 3]; 3] = [[1.0 / 9.0; 3]; 3];

/// 3x3 high-pass kernel: -1/9 on every tap except 8/9 at the center.
pub const SHARPEN_KERNEL: [[f64; 3]; 3] = [
    [-1.0 / 9.0, -1.0 / 9.0, -1.0 / 9.0],
    [-1.0 / 9.0, 8.0 / 9.0, -1.0 / 9.0],
    [-1.0 / 9.0, -1.0 / 9.0, -1.0 / 9.0],
];

/// Convolve the interior of a plane with a 3x3 kernel.
///
/// # Arguments
/// * `plane` - 8-bit intensity plane
/// * `kernel` - 3x3 weights
///
/// # Returns
/// Float plane with the border left at 0
pub fn convolve_interior(plane: ArrayView2<u8>, kernel: &[[f64; 3]; 3]) -> Result<Array2<f64>> {
    let (height, width) = plane.dim();
    ensure_non_empty(height, width, "spatial filter input")?;

    par_rows(height, width, |y, row| {
        if y == 0 || y + 1 >= height {
            return;
        }
        for x in 1..width.saturating_sub(1) {
            let mut sum = 0.0f64;
            for (ky, kernel_row) in kernel.iter().enumerate() {
                for (kx, &kv) in kernel_row.iter().enumerate() {
                    sum += plane[[y + ky - 1, x + kx - 1]] as f64 * kv;
                }
            }
            row[x] = sum;
        }
    })
}

/// 3x3 box average over interior pixels.
pub fn box_low_pass(plane: ArrayView2<u8>) -> Result<Array2<f64>> {
    convolve_interior(plane, &BOX_KERNEL)
}

/// 3x3 sharpen kernel over interior pixels, rectified.
///
/// The kernel sums to zero, so flat regions map to 0 and both rising and
/// falling edges come out positive.
pub fn sharpen_high_pass(plane: ArrayView2<u8>) -> Result<Array2<f64>> {
    let mut output = convolve_interior(plane, &SHARPEN_KERNEL)?;
    output.mapv_inplace(f64::abs);
    Ok(output)
}
