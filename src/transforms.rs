//! Square complex DFT patches with pre-planned separable transforms.
//!
//! A [`DftPatch`] holds one complex buffer with two views of the same
//! storage: a "space" view (imaginary parts are zero on input and after
//! [`DftPatch::to_space`]) and a "frequency" view (after
//! [`DftPatch::to_freq`]). The forward transform is unnormalized; the
//! inverse divides by `side * side`, so a round-trip is the identity up to
//! FFT tolerance.
//!
//! Plans are created once per denoising invocation and shared across worker
//! threads. Reusing plans avoids expensive re-initialization overhead.

use ndarray::Array3;
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

use crate::float_trait::Da3dFloat;

/// Pre-computed forward/inverse FFT plans for one patch side length.
///
/// Cloning is cheap (plans are reference counted) and the plans themselves
/// are thread-safe: `Fft::process` takes `&self`.
#[derive(Clone)]
pub struct DftPlans<F: Da3dFloat> {
    side: usize,
    forward: Arc<dyn Fft<F>>,
    inverse: Arc<dyn Fft<F>>,
}

impl<F: Da3dFloat> DftPlans<F> {
    /// Create plans for square patches of the given side length.
    pub fn new(side: usize) -> Self {
        let mut planner = FftPlanner::new();
        let forward = planner.plan_fft_forward(side);
        let inverse = planner.plan_fft_inverse(side);
        Self {
            side,
            forward,
            inverse,
        }
    }

    /// Side length of the patches these plans transform.
    pub fn side(&self) -> usize {
        self.side
    }
}

/// A square multi-channel patch transformable between space and frequency.
pub struct DftPatch<F: Da3dFloat> {
    // (side, side, channels), row-major
    data: Array3<Complex<F>>,
    plans: DftPlans<F>,
}

impl<F: Da3dFloat> DftPatch<F> {
    /// Create a zeroed patch of `plans.side() x plans.side() x channels`.
    pub fn new(channels: usize, plans: &DftPlans<F>) -> Self {
        let side = plans.side();
        Self {
            data: Array3::from_elem((side, side, channels), Complex::new(F::zero(), F::zero())),
            plans: plans.clone(),
        }
    }

    /// Side length of the patch.
    pub fn side(&self) -> usize {
        self.plans.side()
    }

    /// Number of channels.
    pub fn channels(&self) -> usize {
        self.data.dim().2
    }

    /// Real part of the space view.
    #[inline]
    pub fn space(&self, col: usize, row: usize, chan: usize) -> F {
        self.data[[row, col, chan]].re
    }

    /// Write a real value into the space view; the imaginary slot is zeroed.
    #[inline]
    pub fn set_space(&mut self, col: usize, row: usize, chan: usize, value: F) {
        self.data[[row, col, chan]] = Complex::new(value, F::zero());
    }

    /// Frequency-view coefficient.
    #[inline]
    pub fn freq(&self, col: usize, row: usize, chan: usize) -> Complex<F> {
        self.data[[row, col, chan]]
    }

    /// Mutable frequency-view coefficient.
    #[inline]
    pub fn freq_mut(&mut self, col: usize, row: usize, chan: usize) -> &mut Complex<F> {
        &mut self.data[[row, col, chan]]
    }

    /// Forward 2-D DFT per channel, in place. Unnormalized.
    pub fn to_freq(&mut self) {
        let side = self.plans.side();
        let channels = self.channels();
        let mut line = vec![Complex::new(F::zero(), F::zero()); side];
        for chan in 0..channels {
            // 1. Transform rows
            for row in 0..side {
                for col in 0..side {
                    line[col] = self.data[[row, col, chan]];
                }
                self.plans.forward.process(&mut line);
                for col in 0..side {
                    self.data[[row, col, chan]] = line[col];
                }
            }
            // 2. Transform columns
            for col in 0..side {
                for row in 0..side {
                    line[row] = self.data[[row, col, chan]];
                }
                self.plans.forward.process(&mut line);
                for row in 0..side {
                    self.data[[row, col, chan]] = line[row];
                }
            }
        }
    }

    /// Inverse 2-D DFT per channel, in place. Normalizes by `1 / side^2`.
    pub fn to_space(&mut self) {
        let side = self.plans.side();
        let channels = self.channels();
        let norm = F::one() / F::usize_as(side * side);
        let mut line = vec![Complex::new(F::zero(), F::zero()); side];
        for chan in 0..channels {
            // 1. Transform columns
            for col in 0..side {
                for row in 0..side {
                    line[row] = self.data[[row, col, chan]];
                }
                self.plans.inverse.process(&mut line);
                for row in 0..side {
                    self.data[[row, col, chan]] = line[row];
                }
            }
            // 2. Transform rows, applying the normalization on the way out
            for row in 0..side {
                for col in 0..side {
                    line[col] = self.data[[row, col, chan]];
                }
                self.plans.inverse.process(&mut line);
                for col in 0..side {
                    self.data[[row, col, chan]] = line[col] * norm;
                }
            }
        }
    }
}
