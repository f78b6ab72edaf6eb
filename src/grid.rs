// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The shared UV-plane accumulator: a complex grid plus a coverage counter,
//! written to by one worker per baseline under a single mutex.

use ndarray::Array2;
use num_complex::Complex64;

/// How a deposited correlation value is combined into the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DepositMode {
    /// Running mean, weighted by the destination cell's own coverage count
    /// (not a baseline-scoped or grid-wide stack counter).
    ApertureSynthesis,
    /// Presence-only: any deposit sets the cell to `1 + 0i`.
    Coverage,
}

/// A `width x height` complex grid with a parallel coverage counter. Origin
/// is centred at `(width/2, height/2)` by convention of the caller (the grid
/// itself is indexed `[row, col]` i.e. `[v, u]`).
#[derive(Clone, Debug)]
pub struct UvGrid {
    data: Array2<Complex64>,
    coverage: Array2<u32>,
}

impl UvGrid {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            data: Array2::from_elem((height, width), Complex64::new(0.0, 0.0)),
            coverage: Array2::zeros((height, width)),
        }
    }

    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    pub fn data(&self) -> &Array2<Complex64> {
        &self.data
    }

    pub fn coverage(&self) -> &Array2<u32> {
        &self.coverage
    }

    /// Direct mutable access to the underlying grid, for post-processing
    /// operations that replace cell values wholesale rather than depositing
    /// a new sample into the running average.
    pub fn data_mut(&mut self) -> &mut Array2<Complex64> {
        &mut self.data
    }

    pub fn coverage_count(&self) -> u64 {
        self.coverage.iter().map(|&c| c as u64).sum()
    }

    /// Deposit `value` at `(row, col)` (i.e. `(v, u)`), maintaining the
    /// Hermitian mirror at `len - 1 - idx`. Out-of-bounds indices are
    /// silently dropped. Returns whether the deposit happened.
    pub fn deposit(&mut self, row: usize, col: usize, value: Complex64, mode: DepositMode) -> bool {
        let (height, width) = (self.height(), self.width());
        if row >= height || col >= width {
            return false;
        }

        let k = self.coverage[[row, col]] as f64;
        let new_val = match mode {
            DepositMode::ApertureSynthesis => (self.data[[row, col]] * k + value) / (k + 1.0),
            DepositMode::Coverage => Complex64::new(1.0, 0.0),
        };
        self.data[[row, col]] = new_val;
        self.coverage[[row, col]] += 1;

        let len = width * height;
        let idx = row * width + col;
        let mirror_idx = len - 1 - idx;
        let (mrow, mcol) = (mirror_idx / width, mirror_idx % width);
        self.data[[mrow, mcol]] = new_val.conj();

        true
    }

    /// `true` if `G[i] == conj(G[len-1-i])` for every cell, within
    /// `epsilon`.
    pub fn is_hermitian(&self, epsilon: f64) -> bool {
        let len = self.data.len();
        let flat: Vec<Complex64> = self.data.iter().copied().collect();
        for i in 0..len {
            let mirror = flat[len - 1 - i].conj();
            if (flat[i] - mirror).norm() > epsilon {
                return false;
            }
        }
        true
    }

    /// Reset all cells to zero and coverage to zero, in place.
    pub fn clear(&mut self) {
        self.data.fill(Complex64::new(0.0, 0.0));
        self.coverage.fill(0);
    }
}
