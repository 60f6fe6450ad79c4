//! Tiling with symmetric boundary padding.
//!
//! An image is partitioned into a `tr x tc` grid of nearly-square tiles,
//! each extended by a padding margin so that every interior pixel of a tile
//! is a valid patch anchor. Out-of-range reads mirror at the half-pixel
//! boundary. Merging sums the tile values and coverages over the padded
//! regions and divides, which makes tile processing order irrelevant.

use ndarray::{Array2, Array3};

use crate::float_trait::Da3dFloat;

/// Half-pixel mirror reflection of an out-of-range coordinate.
#[inline]
pub fn symmetric_coordinate(mut pos: isize, size: isize) -> isize {
    if pos < 0 {
        pos = -pos - 1;
    }
    if pos >= 2 * size {
        pos %= 2 * size;
    }
    if pos >= size {
        pos = 2 * size - 1 - pos;
    }
    pos
}

/// Factor `tiles` into a `(rows, columns)` grid whose aspect ratio is as
/// close as possible to the image aspect ratio.
///
/// Starting from `sqrt(tiles * rows / columns)`, the nearest factor pair of
/// `tiles` is found by walking the floor down and the ceiling up; the pair
/// whose aspect is closest wins, with the smaller row count preferred on an
/// exact tie.
pub fn compute_tiling(rows: usize, columns: usize, tiles: usize) -> (usize, usize) {
    let best_r = ((tiles * rows) as f64 / columns as f64).sqrt();
    let mut r_low = best_r as usize;
    let mut r_up = r_low + 1;
    if r_low < 1 {
        return (1, tiles);
    }
    if r_up > tiles {
        return (tiles, 1);
    }
    while tiles % r_low != 0 {
        r_low -= 1;
    }
    while tiles % r_up != 0 {
        r_up += 1;
    }
    if r_up * r_low * columns >= tiles * rows {
        (r_low, tiles / r_low)
    } else {
        (r_up, tiles / r_up)
    }
}

/// Cut `src` into padded tiles, row-major over the grid.
///
/// Tile `(tr, tc)` covers interior rows `[rows * tr / TR, rows * (tr+1) / TR)`
/// (columns analogously), extended by `pad_before` and `pad_after`;
/// out-of-range coordinates are mirrored, so no read is out of bounds.
pub fn split_tiles<F: Da3dFloat>(
    src: &Array3<F>,
    pad_before: usize,
    pad_after: usize,
    tiling: (usize, usize),
) -> Vec<Array3<F>> {
    let (rows, cols, channels) = src.dim();
    let (tile_rows, tile_cols) = tiling;
    let mut result = Vec::with_capacity(tile_rows * tile_cols);
    for tr in 0..tile_rows {
        let rstart = (rows * tr / tile_rows) as isize - pad_before as isize;
        let rend = (rows * (tr + 1) / tile_rows + pad_after) as isize;
        for tc in 0..tile_cols {
            let cstart = (cols * tc / tile_cols) as isize - pad_before as isize;
            let cend = (cols * (tc + 1) / tile_cols + pad_after) as isize;
            let tile = Array3::from_shape_fn(
                ((rend - rstart) as usize, (cend - cstart) as usize, channels),
                |(row, col, chan)| {
                    let sr = symmetric_coordinate(rstart + row as isize, rows as isize);
                    let sc = symmetric_coordinate(cstart + col as isize, cols as isize);
                    src[[sr as usize, sc as usize, chan]]
                },
            );
            result.push(tile);
        }
    }
    result
}

/// Merge processed tiles back into a full image.
///
/// Each entry of `tiles` is a `(value, coverage)` pair of identical padded
/// geometry, in the row-major grid order produced by [`split_tiles`]. For
/// every destination pixel the clipped padded regions contribute their
/// value and coverage sums; the final image is the value divided by the
/// coverage. The tiling invariant guarantees every pixel is covered.
pub fn merge_tiles<F: Da3dFloat>(
    tiles: &[(Array3<F>, Array2<F>)],
    shape: (usize, usize),
    pad_before: usize,
    pad_after: usize,
    tiling: (usize, usize),
) -> Array3<F> {
    let (rows, cols) = shape;
    let (tile_rows, tile_cols) = tiling;
    let channels = tiles.first().map(|t| t.0.dim().2).unwrap_or(0);
    let mut result = Array3::<F>::zeros((rows, cols, channels));
    let mut weights = Array2::<F>::zeros((rows, cols));

    let mut tile_iter = tiles.iter();
    for tr in 0..tile_rows {
        let rstart = (rows * tr / tile_rows) as isize - pad_before as isize;
        let rend = (rows * (tr + 1) / tile_rows + pad_after) as isize;
        for tc in 0..tile_cols {
            let cstart = (cols * tc / tile_cols) as isize - pad_before as isize;
            let cend = (cols * (tc + 1) / tile_cols + pad_after) as isize;
            let Some((value, coverage)) = tile_iter.next() else {
                break;
            };
            for row in rstart.max(0)..rend.min(rows as isize) {
                let trow = (row - rstart) as usize;
                for col in cstart.max(0)..cend.min(cols as isize) {
                    let tcol = (col - cstart) as usize;
                    for chan in 0..channels {
                        result[[row as usize, col as usize, chan]] +=
                            value[[trow, tcol, chan]];
                    }
                    weights[[row as usize, col as usize]] += coverage[[trow, tcol]];
                }
            }
        }
    }

    for row in 0..rows {
        for col in 0..cols {
            let w = weights[[row, col]];
            for chan in 0..channels {
                result[[row, col, chan]] /= w;
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, Array3};

    // Helper: Simple Linear Congruential Generator for deterministic "random" test data
    struct SimpleLcg {
        state: u64,
    }

    impl SimpleLcg {
        fn new(seed: u64) -> Self {
            Self { state: seed }
        }

        fn next_f32(&mut self) -> f32 {
            self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
            (self.state >> 40) as f32 / (1u64 << 24) as f32
        }
    }

    fn random_image(rows: usize, cols: usize, channels: usize, seed: u64) -> Array3<f32> {
        let mut rng = SimpleLcg::new(seed);
        Array3::from_shape_fn((rows, cols, channels), |_| rng.next_f32())
    }

    #[test]
    fn test_symmetric_coordinate_mirrors_at_half_pixel() {
        let size = 8;
        assert_eq!(symmetric_coordinate(0, size), 0);
        assert_eq!(symmetric_coordinate(7, size), 7);
        assert_eq!(symmetric_coordinate(-1, size), 0);
        assert_eq!(symmetric_coordinate(-3, size), 2);
        assert_eq!(symmetric_coordinate(8, size), 7);
        assert_eq!(symmetric_coordinate(10, size), 5);
        assert_eq!(symmetric_coordinate(15, size), 0);
        assert_eq!(symmetric_coordinate(16, size), 0);
        assert_eq!(symmetric_coordinate(17, size), 1);
    }

    #[test]
    fn test_compute_tiling_prefers_image_aspect() {
        assert_eq!(compute_tiling(100, 200, 8), (2, 4));
        assert_eq!(compute_tiling(300, 100, 6), (3, 2));
        assert_eq!(compute_tiling(512, 512, 4), (2, 2));
    }

    #[test]
    fn test_compute_tiling_degenerate_aspects() {
        // Very wide image drives the row factor below 1.
        assert_eq!(compute_tiling(2, 1000, 8), (1, 8));
        // Very tall image drives the row factor past the tile count.
        assert_eq!(compute_tiling(1000, 2, 8), (8, 1));
        assert_eq!(compute_tiling(64, 64, 1), (1, 1));
    }

    #[test]
    fn test_compute_tiling_always_factors() {
        for tiles in 1..=16 {
            for (rows, cols) in [(64, 64), (100, 300), (817, 123)] {
                let (tr, tc) = compute_tiling(rows, cols, tiles);
                assert_eq!(tr * tc, tiles, "{}x{} with {} tiles", rows, cols, tiles);
            }
        }
    }

    #[test]
    fn test_split_geometry() {
        let img = random_image(20, 30, 1, 7);
        let tiles = split_tiles(&img, 2, 3, (2, 3));
        assert_eq!(tiles.len(), 6);
        // Each tile spans its interior plus both pads.
        assert_eq!(tiles[0].dim(), (15, 15, 1));
        // Interior content is copied verbatim.
        for row in 0..10 {
            for col in 0..10 {
                assert_eq!(tiles[0][[row + 2, col + 2, 0]], img[[row, col, 0]]);
            }
        }
    }

    #[test]
    fn test_split_then_merge_is_identity() {
        for (rows, cols, channels, tiling) in [
            (24, 24, 1, (2, 2)),
            (30, 20, 3, (2, 3)),
            (17, 23, 1, (3, 1)),
        ] {
            let img = random_image(rows, cols, channels, (rows * cols) as u64);
            let value_tiles = split_tiles(&img, 4, 3, tiling);
            let pairs: Vec<(Array3<f32>, Array2<f32>)> = value_tiles
                .into_iter()
                .map(|t| {
                    let (trows, tcols, _) = t.dim();
                    (t, Array2::ones((trows, tcols)))
                })
                .collect();
            let merged = merge_tiles(&pairs, (rows, cols), 4, 3, tiling);
            for (a, b) in img.iter().zip(merged.iter()) {
                assert!(
                    (a - b).abs() < 1e-5,
                    "split/merge identity failed for {}x{}x{}",
                    rows,
                    cols,
                    channels
                );
            }
        }
    }

    #[test]
    fn test_split_mirrors_padding() {
        let img = random_image(10, 10, 1, 91);
        let tiles = split_tiles(&img, 2, 2, (1, 1));
        let tile = &tiles[0];
        assert_eq!(tile.dim(), (14, 14, 1));
        // Row -1 mirrors row 0, row -2 mirrors row 1.
        for col in 0..10 {
            assert_eq!(tile[[1, col + 2, 0]], img[[0, col, 0]]);
            assert_eq!(tile[[0, col + 2, 0]], img[[1, col, 0]]);
            assert_eq!(tile[[12, col + 2, 0]], img[[9, col, 0]]);
            assert_eq!(tile[[13, col + 2, 0]], img[[8, col, 0]]);
        }
    }
}
