//! Per-patch operations: extraction, bilateral weighting, regression-plane
//! detrending and masked windowing with DC replacement.
//!
//! All functions operate on square `side x side` patches. Patches carry
//! channels as the trailing axis of an `Array3`; kernels are single-channel
//! `Array2` indexed `[[row, col]]`. The patch center is `(r, r)` where `r`
//! is the patch radius.

use ndarray::{s, Array2, Array3};

use crate::float_trait::Da3dFloat;
use crate::transforms::DftPatch;

/// Copy the `dst`-shaped block anchored at `(pr, pc)` out of a padded tile.
///
/// The tile is padded so that `(pr, pc)` is the upper-left pixel of a fully
/// in-bounds patch.
pub fn extract_patch<F: Da3dFloat>(src: &Array3<F>, pr: usize, pc: usize, dst: &mut Array3<F>) {
    let (rows, cols, _) = dst.dim();
    dst.assign(&src.slice(s![pr..pr + rows, pc..pc + cols, ..]));
}

/// Fill `k` with bilateral weights of `g` relative to the patch center.
///
/// For each pixel the weight is `exp(-(d_color / gamma_r_sigma2 +
/// d_spatial / (2 * sigma_s2)))` where `d_color` is the squared color
/// distance to the center over all channels and `d_spatial` the squared
/// spatial distance.
pub fn bilateral_weight<F: Da3dFloat>(
    g: &Array3<F>,
    k: &mut Array2<F>,
    r: usize,
    gamma_r_sigma2: F,
    sigma_s2: F,
) {
    let (rows, cols, channels) = g.dim();
    let two = F::from_f64_c(2.0);
    for row in 0..rows {
        let dr = F::isize_as(row as isize - r as isize);
        for col in 0..cols {
            let dc = F::isize_as(col as isize - r as isize);
            let mut x = F::zero();
            for chan in 0..channels {
                let d = g[[row, col, chan]] - g[[r, r, chan]];
                x += d * d;
            }
            x = x / gamma_r_sigma2 + (dr * dr + dc * dc) / (two * sigma_s2);
            k[[row, col]] = (-x).exp();
        }
    }
}

/// Fit a per-channel regression plane on `y` by weighted least squares.
///
/// Solves the 2x2 system
///
/// ```text
/// |a  b| |b_row|   |d|
/// |b  c| |b_col| = |e|
/// ```
///
/// with moments taken around the patch center and residuals measured
/// against the guide's center value. A singular system (`det == 0`) zeroes
/// the plane for all channels.
pub fn compute_regression_plane<F: Da3dFloat>(
    y: &Array3<F>,
    g: &Array3<F>,
    k: &Array2<F>,
    r: usize,
    plane: &mut [[F; 2]],
) {
    let (rows, cols, channels) = y.dim();
    let mut a = F::zero();
    let mut b = F::zero();
    let mut c = F::zero();
    for row in 0..rows {
        let dr = F::isize_as(row as isize - r as isize);
        for col in 0..cols {
            let dc = F::isize_as(col as isize - r as isize);
            let kv = k[[row, col]];
            a += dr * dr * kv;
            b += dr * dc * kv;
            c += dc * dc * kv;
        }
    }
    let det = a * c - b * b;
    if det == F::zero() {
        for p in plane.iter_mut().take(channels) {
            p[0] = F::zero();
            p[1] = F::zero();
        }
        return;
    }
    for (chan, p) in plane.iter_mut().enumerate().take(channels) {
        let central = g[[r, r, chan]];
        let mut d = F::zero();
        let mut e = F::zero();
        for row in 0..rows {
            let dr = F::isize_as(row as isize - r as isize);
            for col in 0..cols {
                let dc = F::isize_as(col as isize - r as isize);
                let kv = k[[row, col]] * (y[[row, col, chan]] - central);
                d += dr * kv;
                e += dc * kv;
            }
        }
        p[0] = (c * d - b * e) / det;
        p[1] = (a * e - b * d) / det;
    }
}

/// Subtract the fitted plane `b_row * (row - r) + b_col * (col - r)` from
/// each channel of `y` in place.
pub fn subtract_plane<F: Da3dFloat>(r: usize, plane: &[[F; 2]], y: &mut Array3<F>) {
    let (rows, cols, channels) = y.dim();
    for row in 0..rows {
        let dr = F::isize_as(row as isize - r as isize);
        for col in 0..cols {
            let dc = F::isize_as(col as isize - r as isize);
            for chan in 0..channels {
                y[[row, col, chan]] -= plane[chan][0] * dr + plane[chan][1] * dc;
            }
        }
    }
}

/// Add the fitted plane back onto each channel of `y` in place.
pub fn add_plane<F: Da3dFloat>(r: usize, plane: &[[F; 2]], y: &mut Array3<F>) {
    let (rows, cols, channels) = y.dim();
    for row in 0..rows {
        let dr = F::isize_as(row as isize - r as isize);
        for col in 0..cols {
            let dc = F::isize_as(col as isize - r as isize);
            for chan in 0..channels {
                y[[row, col, chan]] += plane[chan][0] * dr + plane[chan][1] * dc;
            }
        }
    }
}

/// Window `patch` by the kernel, replacing masked-out content with the
/// kernel-weighted channel average:
/// `modified = k * patch + (1 - k) * avg`.
///
/// The result lands in the space view of `modified` with zeroed imaginary
/// parts, ready for a forward transform. When `average` is provided the
/// per-channel averages are written there. The kernel is a Gaussian, so its
/// total weight is strictly positive.
pub fn modify_patch<F: Da3dFloat>(
    patch: &Array3<F>,
    k: &Array2<F>,
    modified: &mut DftPatch<F>,
    mut average: Option<&mut [F]>,
) {
    let (rows, cols, channels) = patch.dim();
    let weight: F = k.iter().copied().sum();

    for chan in 0..channels {
        let mut avg = F::zero();
        for row in 0..rows {
            for col in 0..cols {
                avg += k[[row, col]] * patch[[row, col, chan]];
            }
        }
        avg /= weight;
        for row in 0..rows {
            for col in 0..cols {
                let kv = k[[row, col]];
                modified.set_space(
                    col,
                    row,
                    chan,
                    kv * patch[[row, col, chan]] + (F::one() - kv) * avg,
                );
            }
        }
        if let Some(out) = average.as_deref_mut() {
            out[chan] = avg;
        }
    }
}
