//! Median filter.
//!
//! Removes salt-and-pepper noise while preserving edges. Acts as a
//! low-pass filter with a blurring effect on fine texture.
//!
//! ## Border Handling
//!
//! Neighbors outside the plane are replaced by the nearest edge pixel
//! (clamp-to-edge). A uniform plane is therefore a fixed point, borders
//! included.

use ndarray::{Array2, ArrayView2};

use crate::error::{ensure_non_empty, FilterError, Result};
use crate::filters::core::{clamp_index, par_rows};

/// Check that a median window size is odd and at least 1.
pub fn validate_window(size: usize) -> Result<()> {
    if size == 0 || size % 2 == 0 {
        return Err(FilterError::ParameterOutOfRange {
            name: "size",
            value: size,
            reason: "median window must be odd and at least 1",
        });
    }
    Ok(())
}

/// Apply a `size` x `size` median filter to an 8-bit plane.
///
/// # Arguments
/// * `plane` - 8-bit intensity plane
/// * `size` - Window size (odd, 1 returns a copy)
///
/// # Returns
/// Median-filtered plane
pub fn median(plane: ArrayView2<u8>, size: usize) -> Result<Array2<u8>> {
    validate_window(size)?;
    let (height, width) = plane.dim();
    ensure_non_empty(height, width, "median input")?;

    let radius = (size / 2) as isize;
    let window_size = size * size;

    par_rows(height, width, |y, row| {
        let mut values: Vec<u8> = Vec::with_capacity(window_size);

        for (x, out) in row.iter_mut().enumerate() {
            values.clear();

            for dy in -radius..=radius {
                let sy = clamp_index(y as isize + dy, height);
                for dx in -radius..=radius {
                    let sx = clamp_index(x as isize + dx, width);
                    values.push(plane[[sy, sx]]);
                }
            }

            let mid = values.len() / 2;
            *out = *values.select_nth_unstable(mid).1;
        }
    })
}
