// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Post-processing operations over named models held in a [`Context`] (spec
//! §6 "Model operations"): masking, convolution, stacking/differencing,
//! shifting, and a forward/inverse 2D Fourier transform.
//!
//! No Fourier-transform crate is in the dependency stack (see `DESIGN.md`),
//! so `fft`/`ifft` are a direct, separable 2D DFT. It is adequate for the grid
//! sizes this core targets; a production build would swap in a dedicated FFT
//! crate without changing this module's public surface.

use std::f64::consts::TAU;

use ndarray::{Array2, Axis};
use num_complex::Complex64;
use rayon::prelude::*;

use crate::context::Context;
use crate::error::{Result, VlbiError};
use crate::grid::UvGrid;

fn dims(grid: &UvGrid) -> (usize, usize) {
    (grid.height(), grid.width())
}

fn require_same_dims(a: (usize, usize), b: (usize, usize)) -> Result<()> {
    if a != b {
        return Err(VlbiError::DimensionMismatch { lhs: a, rhs: b });
    }
    Ok(())
}

fn binary_elementwise(
    ctx: &mut Context,
    target: &str,
    other: &str,
    op: impl Fn(Complex64, Complex64) -> Complex64,
) -> Result<()> {
    let other_grid = ctx
        .get_model(other)
        .ok_or_else(|| VlbiError::UnknownName(other.to_string()))?;
    let other_dims = dims(other_grid);
    let other_data = other_grid.data().clone();

    let target_dims = {
        let target_grid = ctx
            .get_model(target)
            .ok_or_else(|| VlbiError::UnknownName(target.to_string()))?;
        dims(target_grid)
    };
    require_same_dims(target_dims, other_dims)?;

    let target_grid = ctx.get_model_mut(target).expect("checked above");
    for ((r, c), val) in target_grid.data_mut().indexed_iter_mut() {
        *val = op(*val, other_data[[r, c]]);
    }
    Ok(())
}

/// Elementwise-multiply `target` by `mask`, in place.
pub fn apply_mask(ctx: &mut Context, target: &str, mask: &str) -> Result<()> {
    binary_elementwise(ctx, target, mask, |a, b| a * b)
}

/// Elementwise-add `other` into `target`, in place.
pub fn stack(ctx: &mut Context, target: &str, other: &str) -> Result<()> {
    binary_elementwise(ctx, target, other, |a, b| a + b)
}

/// Elementwise-subtract `other` from `target`, in place.
pub fn diff(ctx: &mut Context, target: &str, other: &str) -> Result<()> {
    binary_elementwise(ctx, target, other, |a, b| a - b)
}

/// Circularly shift `target` by `(dx, dy)` cells, in place.
pub fn shift(ctx: &mut Context, target: &str, dx: isize, dy: isize) -> Result<()> {
    let grid = ctx
        .get_model_mut(target)
        .ok_or_else(|| VlbiError::UnknownName(target.to_string()))?;
    let (height, width) = (grid.height(), grid.width());
    if height == 0 || width == 0 {
        return Ok(());
    }
    let source = grid.data().clone();
    let dest = grid.data_mut();
    for r in 0..height {
        for c in 0..width {
            let sr = (r as isize - dy).rem_euclid(height as isize) as usize;
            let sc = (c as isize - dx).rem_euclid(width as isize) as usize;
            dest[[r, c]] = source[[sr, sc]];
        }
    }
    Ok(())
}

/// Circular convolution of `target` with `kernel` (same dimensions
/// required), via the convolution theorem over the DFT below. Replaces
/// `target`'s contents in place; fails without mutating `target` if the
/// dimensions mismatch.
pub fn apply_convolution(ctx: &mut Context, target: &str, kernel: &str) -> Result<()> {
    let kernel_grid = ctx
        .get_model(kernel)
        .ok_or_else(|| VlbiError::UnknownName(kernel.to_string()))?;
    let kernel_dims = dims(kernel_grid);
    let kernel_data = kernel_grid.data().clone();

    let target_data = {
        let target_grid = ctx
            .get_model(target)
            .ok_or_else(|| VlbiError::UnknownName(target.to_string()))?;
        require_same_dims(dims(target_grid), kernel_dims)?;
        target_grid.data().clone()
    };

    let ft = dft2(&target_data, false);
    let fk = dft2(&kernel_data, false);
    let product = &ft * &fk;
    let convolved = dft2(&product, true);

    let target_grid = ctx.get_model_mut(target).expect("checked above");
    *target_grid.data_mut() = convolved;
    Ok(())
}

/// In-place forward 2D DFT.
pub fn fft(ctx: &mut Context, target: &str) -> Result<()> {
    let grid = ctx
        .get_model_mut(target)
        .ok_or_else(|| VlbiError::UnknownName(target.to_string()))?;
    let transformed = dft2(grid.data(), false);
    *grid.data_mut() = transformed;
    Ok(())
}

/// In-place inverse 2D DFT.
pub fn ifft(ctx: &mut Context, target: &str) -> Result<()> {
    let grid = ctx
        .get_model_mut(target)
        .ok_or_else(|| VlbiError::UnknownName(target.to_string()))?;
    let transformed = dft2(grid.data(), true);
    *grid.data_mut() = transformed;
    Ok(())
}

fn dft1d(samples: &[Complex64], inverse: bool) -> Vec<Complex64> {
    let n = samples.len();
    if n == 0 {
        return Vec::new();
    }
    let sign = if inverse { 1.0 } else { -1.0 };
    let mut out = vec![Complex64::new(0.0, 0.0); n];
    for (k, slot) in out.iter_mut().enumerate() {
        let mut sum = Complex64::new(0.0, 0.0);
        for (t, &x) in samples.iter().enumerate() {
            let angle = sign * TAU * (k as f64) * (t as f64) / (n as f64);
            sum += x * Complex64::new(angle.cos(), angle.sin());
        }
        *slot = sum;
    }
    if inverse {
        for v in out.iter_mut() {
            *v /= n as f64;
        }
    }
    out
}

/// A separable 2D DFT: 1D transform over rows, then over columns. Each axis
/// is independent of its neighbours, so both passes fan out across rayon's
/// global pool via `axis_iter_mut(Axis(_)).into_par_iter()`.
fn dft2(data: &Array2<Complex64>, inverse: bool) -> Array2<Complex64> {
    let (height, width) = data.dim();
    let mut rows_done = Array2::from_elem((height, width), Complex64::new(0.0, 0.0));
    rows_done
        .axis_iter_mut(Axis(0))
        .into_par_iter()
        .zip(data.axis_iter(Axis(0)).into_par_iter())
        .for_each(|(mut dest_row, src_row)| {
            let transformed = dft1d(&src_row.to_vec(), inverse);
            dest_row.assign(&ndarray::Array1::from_vec(transformed));
        });

    let mut out = Array2::from_elem((height, width), Complex64::new(0.0, 0.0));
    out.axis_iter_mut(Axis(1))
        .into_par_iter()
        .zip(rows_done.axis_iter(Axis(1)).into_par_iter())
        .for_each(|(mut dest_col, src_col)| {
            let transformed = dft1d(&src_col.to_vec(), inverse);
            dest_col.assign(&ndarray::Array1::from_vec(transformed));
        });
    out
}
