//! Orthonormal luminance/chrominance decorrelation.
//!
//! The denoising core operates on decorrelated channels so that the
//! bilateral color distance and the per-channel frequency shrinkage act on
//! nearly independent signals. The transform is the fixed orthonormal map
//!
//! ```text
//! y = (r + g + b) / sqrt(3)
//! u = (r - b)     / sqrt(2)
//! v = (r - 2g + b)/ sqrt(6)
//! ```
//!
//! whose inverse is its transpose. Single-channel images pass through
//! unchanged. Both directions mutate a caller-owned copy in place; the
//! orchestrator never transforms the caller's original buffers.

use ndarray::Array3;

use crate::float_trait::Da3dFloat;

/// Apply the forward RGB -> YUV-like decorrelation in place.
///
/// Identity unless the image has exactly 3 channels.
pub fn color_transform_forward<F: Da3dFloat>(img: &mut Array3<F>) {
    let (rows, cols, channels) = img.dim();
    if channels != 3 {
        return;
    }
    let sqrt2 = F::from_f64_c(std::f64::consts::SQRT_2);
    let sqrt3 = F::from_f64_c(3.0f64.sqrt());
    let sqrt6 = F::from_f64_c(6.0f64.sqrt());
    let two = F::from_f64_c(2.0);
    for row in 0..rows {
        for col in 0..cols {
            let r = img[[row, col, 0]];
            let g = img[[row, col, 1]];
            let b = img[[row, col, 2]];
            img[[row, col, 0]] = (r + g + b) / sqrt3;
            img[[row, col, 1]] = (r - b) / sqrt2;
            img[[row, col, 2]] = (r - two * g + b) / sqrt6;
        }
    }
}

/// Apply the inverse (transpose) decorrelation in place.
///
/// Identity unless the image has exactly 3 channels.
pub fn color_transform_inverse<F: Da3dFloat>(img: &mut Array3<F>) {
    let (rows, cols, channels) = img.dim();
    if channels != 3 {
        return;
    }
    let sqrt2 = F::from_f64_c(std::f64::consts::SQRT_2);
    let sqrt3 = F::from_f64_c(3.0f64.sqrt());
    let sqrt6 = F::from_f64_c(6.0f64.sqrt());
    for row in 0..rows {
        for col in 0..cols {
            let y = img[[row, col, 0]];
            let u = img[[row, col, 1]];
            let v = img[[row, col, 2]];
            img[[row, col, 0]] = (sqrt2 * y + sqrt3 * u + v) / sqrt6;
            img[[row, col, 1]] = (y - sqrt2 * v) / sqrt3;
            img[[row, col, 2]] = (sqrt2 * y - sqrt3 * u + v) / sqrt6;
        }
    }
}
