//! Core utilities shared by the spatial filters.
//!
//! This module provides:
//! - Border index helpers (reflect-101 and clamp-to-edge)
//! - Derivative/smoothing kernel generation
//! - Separable and dense 2D correlation
//! - Row-parallel plane construction on top of rayon

use ndarray::{Array2, ArrayView2};
use rayon::prelude::*;

use crate::error::Result;

/// Map an out-of-range index into `0..len` by mirroring without repeating
/// the edge sample (`dcb|abcd|cba`).
#[inline]
pub fn reflect_101(index: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let len = len as isize;
    let period = 2 * (len - 1);
    let i = index.rem_euclid(period);
    (if i >= len { period - i } else { i }) as usize
}

/// Map an out-of-range index into `0..len` by repeating the edge sample.
#[inline]
pub fn clamp_index(index: isize, len: usize) -> usize {
    index.clamp(0, len as isize - 1) as usize
}

/// Build a plane row by row in parallel.
///
/// `fill` receives the row index and a zero-initialized (`T::default()`)
/// row buffer of length `width`.
pub fn par_rows<T, F>(height: usize, width: usize, fill: F) -> Result<Array2<T>>
where
    T: Clone + Default + Send,
    F: Fn(usize, &mut [T]) + Sync,
{
    let mut flat = vec![T::default(); height * width];
    if width > 0 {
        flat.par_chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| fill(y, row));
    }
    Ok(Array2::from_shape_vec((height, width), flat)?)
}

/// Full 1D convolution of two short kernels.
fn convolve_full(a: &[f64], b: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, &av) in a.iter().enumerate() {
        for (j, &bv) in b.iter().enumerate() {
            out[i + j] += av * bv;
        }
    }
    out
}

/// Generate a 1D derivative kernel of the given order and odd size.
///
/// Order 0 is the binomial smoothing kernel (`[1, 2, 1]` for size 3),
/// order 2 the second-derivative kernel (`[1, -2, 1]` for size 3,
/// `[1, 0, -2, 0, 1]` for size 5). Requires `ksize > order`.
pub fn derivative_kernel(order: usize, ksize: usize) -> Vec<f64> {
    debug_assert!(ksize > order);
    let mut kernel = vec![1.0];
    for _ in 0..(ksize - order - 1) {
        kernel = convolve_full(&kernel, &[1.0, 1.0]);
    }
    for _ in 0..order {
        kernel = convolve_full(&kernel, &[-1.0, 1.0]);
    }
    kernel
}

/// Correlate a plane with a separable kernel using reflect-101 borders.
///
/// `kx` runs along columns, `ky` along rows. Both must have odd length;
/// the anchor is the center tap.
pub fn correlate_separable(plane: ArrayView2<f64>, kx: &[f64], ky: &[f64]) -> Result<Array2<f64>> {
    let (height, width) = plane.dim();
    let half_x = (kx.len() / 2) as isize;
    let half_y = (ky.len() / 2) as isize;

    // Horizontal pass
    let temp = par_rows(height, width, |y, row| {
        for (x, out) in row.iter_mut().enumerate() {
            let mut sum = 0.0;
            for (ki, &kv) in kx.iter().enumerate() {
                let sx = reflect_101(x as isize + ki as isize - half_x, width);
                sum += plane[[y, sx]] * kv;
            }
            *out = sum;
        }
    })?;

    // Vertical pass
    par_rows(height, width, |y, row| {
        for (x, out) in row.iter_mut().enumerate() {
            let mut sum = 0.0;
            for (ki, &kv) in ky.iter().enumerate() {
                let sy = reflect_101(y as isize + ki as isize - half_y, height);
                sum += temp[[sy, x]] * kv;
            }
            *out = sum;
        }
    })
}

/// Correlate a plane with a dense 3x3 kernel using reflect-101 borders.
pub fn correlate_3x3(plane: ArrayView2<f64>, kernel: &[[f64; 3]; 3]) -> Result<Array2<f64>> {
    let (height, width) = plane.dim();

    par_rows(height, width, |y, row| {
        for (x, out) in row.iter_mut().enumerate() {
            let mut sum = 0.0;
            for (ky, kernel_row) in kernel.iter().enumerate() {
                let sy = reflect_101(y as isize + ky as isize - 1, height);
                for (kx, &kv) in kernel_row.iter().enumerate() {
                    let sx = reflect_101(x as isize + kx as isize - 1, width);
                    sum += plane[[sy, sx]] * kv;
                }
            }
            *out = sum;
        }
    })
}
