//! Aggregation weight map steering the patch-selection loop.
//!
//! One cell per valid patch anchor holds the cumulative spatial-kernel
//! weight written through that anchor. The block engine repeatedly asks for
//! the least-covered anchor and stops once the smallest cell reaches its
//! coverage threshold. Cells only ever increase.
//!
//! A cached per-row minimum keeps `minimum`/`find_minimum` cheap without a
//! full-map scan per iteration; `increase_weights` rebuilds the cache for
//! the handful of rows a kernel touches.

use ndarray::Array2;

use crate::float_trait::Da3dFloat;

/// 2-D field of per-anchor cumulative coverage, initialized to zero.
pub struct WeightMap<F: Da3dFloat> {
    values: Array2<F>,
    row_min: Vec<F>,
}

impl<F: Da3dFloat> WeightMap<F> {
    /// Create a zeroed map with one cell per valid patch anchor.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            values: Array2::zeros((rows, cols)),
            row_min: vec![F::zero(); rows],
        }
    }

    /// Number of anchor rows.
    pub fn rows(&self) -> usize {
        self.values.dim().0
    }

    /// Number of anchor columns.
    pub fn cols(&self) -> usize {
        self.values.dim().1
    }

    /// Cell value at `(row, col)`.
    pub fn value(&self, row: usize, col: usize) -> F {
        self.values[[row, col]]
    }

    /// The smallest coverage value in the map.
    pub fn minimum(&self) -> F {
        let mut best = self.row_min[0];
        for &m in &self.row_min[1..] {
            if m < best {
                best = m;
            }
        }
        best
    }

    /// Coordinates of the smallest value.
    ///
    /// Ties resolve to the smallest `(row, col)` in row-major order: the
    /// row fold keeps the first minimal row, and the column is the first
    /// cell of that row holding the cached row minimum exactly.
    pub fn find_minimum(&self) -> (usize, usize) {
        let mut best_row = 0;
        let mut best = self.row_min[0];
        for (row, &m) in self.row_min.iter().enumerate().skip(1) {
            if m < best {
                best = m;
                best_row = row;
            }
        }
        let col = self
            .values
            .row(best_row)
            .iter()
            .position(|&v| v == best)
            .unwrap_or(0);
        (best_row, col)
    }

    /// Add the kernel into the map at the given offset, discarding the
    /// parts that fall outside: `map[i, j] += k[i - row_offset, j - col_offset]`.
    pub fn increase_weights(&mut self, k: &Array2<F>, row_offset: isize, col_offset: isize) {
        let (rows, cols) = self.values.dim();
        let (krows, kcols) = k.dim();
        let i0 = row_offset.max(0) as usize;
        let i1 = (row_offset + krows as isize).clamp(0, rows as isize) as usize;
        let j0 = col_offset.max(0) as usize;
        let j1 = (col_offset + kcols as isize).clamp(0, cols as isize) as usize;
        for i in i0..i1 {
            let ki = (i as isize - row_offset) as usize;
            for j in j0..j1 {
                let kj = (j as isize - col_offset) as usize;
                self.values[[i, j]] += k[[ki, kj]];
            }
            // rebuild the cached minimum for the touched row
            let mut m = self.values[[i, 0]];
            for &v in self.values.row(i).iter().skip(1) {
                if v < m {
                    m = v;
                }
            }
            self.row_min[i] = m;
        }
    }
}
