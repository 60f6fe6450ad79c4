//! DA3D Core Algorithm Library
//!
//! Pure Rust implementation of DA3D (Data-Adaptive Dual-Domain Denoising)
//! for guided image denoising: given a noisy image, a pre-denoised guide of
//! the same geometry and the noise standard deviation, the engine refines
//! the estimate by iterating over the least-covered patch locations,
//! combining bilateral masking and regression-plane detrending in the
//! spatial domain with adaptive Wiener-style shrinkage in the frequency
//! domain.
//!
//! Images are `ndarray::Array3` values of shape `(rows, columns, channels)`
//! in standard row-major order with the channel as the trailing axis; a
//! caller holding a raw interleaved buffer builds one with
//! `Array3::from_shape_vec((rows, columns, channels), data)`. Grayscale
//! (1 channel) and color (3 channels) images are supported.
//!
//! ## f32/f64 Support
//!
//! All public functions are generic over the `Da3dFloat` trait, allowing
//! users to choose between f32 and f64 precision.

pub mod color;
pub mod float_trait;
pub mod orchestration;
pub mod patch_ops;
pub mod pipeline;
pub mod tiling;
pub mod transforms;
pub mod weight_map;

// Re-export commonly used types at the crate root
pub use color::{color_transform_forward, color_transform_inverse};
pub use float_trait::Da3dFloat;
pub use orchestration::{da3d_denoise, Da3dConfig};
pub use pipeline::run_da3d_block;
pub use tiling::{compute_tiling, merge_tiles, split_tiles};
pub use transforms::{DftPatch, DftPlans};
pub use weight_map::WeightMap;
