//! Guided DA3D denoising pipeline.
//!
//! This module provides the complete entry point around the block engine:
//! - Parameter validation at the invocation boundary
//! - Luminance/chrominance decorrelation on caller-owned copies
//! - Tiling into one padded tile per worker thread
//! - Parallel block processing and coverage-weighted merging
//!
//! The computation is a pure function of `(noisy, guide, sigma, config)`;
//! no state survives an invocation. Results are bitwise reproducible for a
//! fixed thread count; changing the thread count changes tile boundaries
//! and therefore perturbs the padding-overlap regions.

use ndarray::{Array3, ArrayView3};
use rayon::prelude::*;

use crate::color::{color_transform_forward, color_transform_inverse};
use crate::float_trait::Da3dFloat;
use crate::pipeline::run_da3d_block;
use crate::tiling::{compute_tiling, merge_tiles, split_tiles};
use crate::transforms::DftPlans;

// =============================================================================
// Constants
// =============================================================================

/// Default patch radius; the DFT side is the next power of two of `2r + 1`.
const DEFAULT_PATCH_RADIUS: usize = 8;

/// Default spatial bandwidth of the bilateral kernel.
const DEFAULT_SIGMA_S: f64 = 14.0;

/// Default color-range bandwidth factor of the bilateral kernel.
const DEFAULT_GAMMA_R: f64 = 0.7;

/// Default frequency shrinkage strength.
const DEFAULT_GAMMA_F: f64 = 0.8;

/// Default per-anchor coverage terminating the block loop.
const DEFAULT_THRESHOLD: f64 = 2.0;

/// Default thread count; 0 means the runtime default.
const DEFAULT_N_THREADS: usize = 0;

// =============================================================================
// Types
// =============================================================================

/// Configuration for guided DA3D denoising.
///
/// The defaults reproduce the published DA3D parameter set. Use
/// `Default::default()` for standard settings.
#[derive(Debug, Clone)]
pub struct Da3dConfig<F: Da3dFloat> {
    /// Patch radius. Default: 8
    pub patch_radius: usize,
    /// Spatial bilateral bandwidth. Default: 14.0
    pub sigma_s: F,
    /// Color-range bilateral bandwidth factor. Default: 0.7
    pub gamma_r: F,
    /// Frequency shrinkage strength. Default: 0.8
    pub gamma_f: F,
    /// Aggregation coverage threshold. Default: 2.0
    pub threshold: F,
    /// Worker threads (and tiles). 0 uses the runtime default. Default: 0
    pub n_threads: usize,
}

impl<F: Da3dFloat> Default for Da3dConfig<F> {
    fn default() -> Self {
        Self {
            patch_radius: DEFAULT_PATCH_RADIUS,
            sigma_s: F::from_f64_c(DEFAULT_SIGMA_S),
            gamma_r: F::from_f64_c(DEFAULT_GAMMA_R),
            gamma_f: F::from_f64_c(DEFAULT_GAMMA_F),
            threshold: F::from_f64_c(DEFAULT_THRESHOLD),
            n_threads: DEFAULT_N_THREADS,
        }
    }
}

impl<F: Da3dFloat> Da3dConfig<F> {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Side length of the DFT patch derived from the patch radius.
    pub fn patch_side(&self) -> usize {
        (2 * self.patch_radius + 1).next_power_of_two()
    }

    /// Validate the configuration parameters.
    pub fn validate(&self) -> Result<(), String> {
        if self.patch_radius < 1 {
            return Err("patch_radius must be >= 1".to_string());
        }
        if self.sigma_s <= F::zero() {
            return Err("sigma_s must be > 0".to_string());
        }
        if self.gamma_r <= F::zero() {
            return Err("gamma_r must be > 0".to_string());
        }
        if self.gamma_f <= F::zero() {
            return Err("gamma_f must be > 0".to_string());
        }
        if self.threshold <= F::zero() {
            return Err("threshold must be > 0".to_string());
        }
        Ok(())
    }
}

// =============================================================================
// Main Entry Point
// =============================================================================

/// Denoise `noisy` using the pre-denoised `guide` and known noise standard
/// deviation `sigma`.
///
/// Both images are `(rows, columns, channels)` with 1 or 3 channels and
/// identical shapes; neither is mutated. The returned image has the input
/// shape. Fails before any tile is launched on invalid shapes or
/// parameters; no partial output is ever returned.
pub fn da3d_denoise<F: Da3dFloat>(
    noisy: ArrayView3<F>,
    guide: ArrayView3<F>,
    sigma: F,
    config: &Da3dConfig<F>,
) -> Result<Array3<F>, String> {
    config.validate()?;
    if noisy.dim() != guide.dim() {
        return Err(format!(
            "Shape mismatch: noisy has shape {:?}, but guide has shape {:?}",
            noisy.dim(),
            guide.dim()
        ));
    }
    let (rows, cols, channels) = guide.dim();
    if channels != 1 && channels != 3 {
        return Err(format!(
            "Unsupported channel count {}: expected 1 or 3",
            channels
        ));
    }
    let s = config.patch_side();
    if rows < s || cols < s {
        return Err(format!(
            "Image size ({}, {}) is smaller than the DFT patch side {}",
            rows, cols, s
        ));
    }
    if sigma <= F::zero() {
        return Err("sigma must be > 0".to_string());
    }

    // One tile per worker thread, clamped so every tile keeps a non-empty
    // interior (which is what guarantees full coverage at merge time).
    let n_threads = if config.n_threads == 0 {
        rayon::current_num_threads()
    } else {
        config.n_threads
    };
    let tiles = n_threads.min(rows).min(cols).max(1);
    let tiling = compute_tiling(rows, cols, tiles);

    let mut noisy_t = noisy.to_owned();
    let mut guide_t = guide.to_owned();
    color_transform_forward(&mut noisy_t);
    color_transform_forward(&mut guide_t);

    let r = config.patch_radius;
    let pad_before = r;
    let pad_after = s - r - 1;
    let noisy_tiles = split_tiles(&noisy_t, pad_before, pad_after, tiling);
    let guide_tiles = split_tiles(&guide_t, pad_before, pad_after, tiling);
    let plans = DftPlans::new(s);

    let process = || {
        noisy_tiles
            .par_iter()
            .zip(guide_tiles.par_iter())
            .map(|(noisy_tile, guide_tile)| {
                run_da3d_block(
                    noisy_tile,
                    guide_tile,
                    sigma,
                    r,
                    config.sigma_s,
                    config.gamma_r,
                    config.gamma_f,
                    config.threshold,
                    &plans,
                )
            })
            .collect::<Vec<_>>()
    };
    let result_tiles = if config.n_threads > 0 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.n_threads)
            .build()
            .map_err(|e| format!("Failed to build thread pool: {}", e))?;
        pool.install(process)
    } else {
        process()
    };

    let mut merged = merge_tiles(&result_tiles, (rows, cols), pad_before, pad_after, tiling);
    color_transform_inverse(&mut merged);
    Ok(merged)
}
