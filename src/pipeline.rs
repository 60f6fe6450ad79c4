//! DA3D block engine - the iterative dual-domain loop on one padded tile.
//!
//! Every iteration picks the least-covered patch anchor, detrends the local
//! patches with a weighted regression plane, masks them with a bilateral
//! kernel, shrinks the noisy patch in the frequency domain guided by the
//! clean patch, and writes the result back weighted by the kernel. The
//! aggregation weight map accumulates the squared kernels and terminates
//! the loop once every anchor has enough coverage.

use ndarray::{Array2, Array3};

use crate::float_trait::Da3dFloat;
use crate::patch_ops::{
    bilateral_weight, compute_regression_plane, extract_patch, modify_patch, subtract_plane,
};
use crate::transforms::{DftPatch, DftPlans};
use crate::weight_map::WeightMap;

/// Ratio between the detrending kernel's color bandwidth and the masking
/// kernel's. The regression kernel is much wider so the plane fit sees the
/// whole local trend.
const REGRESSION_RANGE_FACTOR: f64 = 10.0;

/// Ratio between the detrending kernel's squared spatial bandwidth and the
/// masking kernel's.
const REGRESSION_SPATIAL_FACTOR: f64 = 2.0;

/// Run the DA3D inner loop on a single padded tile.
///
/// `noisy` and `guide` are color-transformed padded tiles of identical
/// shape; `plans` carry the DFT patch side `s` (the next power of two of
/// `2r + 1`). Returns the kernel-weighted accumulated estimate and its
/// per-pixel coverage; dividing the first by the second (done by the tile
/// merge) yields the denoised tile.
#[allow(clippy::too_many_arguments)]
pub fn run_da3d_block<F: Da3dFloat>(
    noisy: &Array3<F>,
    guide: &Array3<F>,
    sigma: F,
    r: usize,
    sigma_s: F,
    gamma_r: F,
    gamma_f: F,
    threshold: F,
    plans: &DftPlans<F>,
) -> (Array3<F>, Array2<F>) {
    let s = plans.side();
    let (rows, cols, channels) = guide.dim();

    let sigma2 = sigma * sigma;
    let gamma_r_sigma2 = gamma_r * sigma2;
    let sigma_s2 = sigma_s * sigma_s;
    // detrending kernel parameters
    let gamma_rr_sigma2 = gamma_r_sigma2 * F::from_f64_c(REGRESSION_RANGE_FACTOR);
    let sigma_sr2 = sigma_s2 * F::from_f64_c(REGRESSION_SPATIAL_FACTOR);

    let mut y = Array3::<F>::zeros((s, s, channels));
    let mut g = Array3::<F>::zeros((s, s, channels));
    let mut k_reg = Array2::<F>::zeros((s, s));
    let mut k = Array2::<F>::zeros((s, s));
    let mut y_m = DftPatch::new(channels, plans);
    let mut g_m = DftPatch::new(channels, plans);
    let mut plane = vec![[F::zero(); 2]; channels];
    let mut avg = vec![F::zero(); channels];

    let mut agg_weights = WeightMap::new(rows - s + 1, cols - s + 1);
    let mut output = Array3::<F>::zeros((rows, cols, channels));
    let mut weights = Array2::<F>::zeros((rows, cols));

    while agg_weights.minimum() < threshold {
        let (pr, pc) = agg_weights.find_minimum();
        extract_patch(noisy, pr, pc, &mut y);
        extract_patch(guide, pr, pc, &mut g);

        // Detrend both patches by the regression plane fitted on the wide kernel.
        bilateral_weight(&g, &mut k_reg, r, gamma_rr_sigma2, sigma_sr2);
        compute_regression_plane(&y, &g, &k_reg, r, &mut plane);
        subtract_plane(r, &plane, &mut y);
        subtract_plane(r, &plane, &mut g);

        // Mask with the narrow kernel and move to the frequency domain.
        bilateral_weight(&g, &mut k, r, gamma_r_sigma2, sigma_s2);
        modify_patch(&y, &k, &mut y_m, Some(&mut avg));
        modify_patch(&g, &k, &mut g_m, None);
        y_m.to_freq();
        g_m.to_freq();

        // Shrink every non-DC bin by exp(-gamma_f * sigma_f^2 / |G|^2).
        let sigma_f2 = k.iter().map(|&v| v * v).sum::<F>() * sigma2;
        for row in 0..s {
            for col in 0..s {
                if row == 0 && col == 0 {
                    continue;
                }
                for chan in 0..channels {
                    let g2 = g_m.freq(col, row, chan).norm_sqr();
                    let gain = (-(gamma_f * sigma_f2 / g2)).exp();
                    let shrunk = y_m.freq(col, row, chan) * gain;
                    *y_m.freq_mut(col, row, chan) = shrunk;
                }
            }
        }
        y_m.to_space();

        // Write back, restoring the plane trend and the replaced DC under
        // the kernel, then square the kernel for the coverage updates.
        for row in 0..s {
            let dr = F::isize_as(row as isize - r as isize);
            for col in 0..s {
                let dc = F::isize_as(col as isize - r as isize);
                let kv = k[[row, col]];
                for chan in 0..channels {
                    let trend = plane[chan][0] * dr + plane[chan][1] * dc;
                    output[[pr + row, pc + col, chan]] += (y_m.space(col, row, chan)
                        + trend * kv
                        - (F::one() - kv) * avg[chan])
                        * kv;
                }
                let kv2 = kv * kv;
                k[[row, col]] = kv2;
                weights[[pr + row, pc + col]] += kv2;
            }
        }
        agg_weights.increase_weights(&k, pr as isize - r as isize, pc as isize - r as isize);
    }

    (output, weights)
}
