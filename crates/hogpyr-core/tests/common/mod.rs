#![allow(dead_code)]

use ndarray::{Array2, Array3};

use hogpyr_core::FeatureMap;

/// Diagonal ramp `value = row + col`, single channel.
pub fn ramp_image(rows: usize, cols: usize) -> Array3<f64> {
    Array3::from_shape_fn((rows, cols, 1), |(r, c, _)| (r + c) as f64)
}

/// Dark top half, bright bottom half.
pub fn horizontal_edge(rows: usize, cols: usize) -> Array3<u8> {
    Array3::from_shape_fn((rows, cols, 1), |(r, _, _)| if r < rows / 2 { 0 } else { 255 })
}

/// Dark left half, bright right half.
pub fn vertical_edge(rows: usize, cols: usize) -> Array2<u8> {
    Array2::from_shape_fn((rows, cols), |(_, c)| if c < cols / 2 { 0 } else { 255 })
}

/// Deterministic noise in `[0, 1)` from a linear congruential generator.
pub fn noise_image(rows: usize, cols: usize, channels: usize, seed: u64) -> Array3<f32> {
    let mut state = seed;
    Array3::from_shape_fn((rows, cols, channels), |_| {
        state = state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        (state >> 40) as f32 / (1u64 << 24) as f32
    })
}

/// Sum of every value in the `h x w` cell window at `(row, col)`.
pub fn window_sum(map: &FeatureMap<f64>, row: usize, col: usize, h: usize, w: usize) -> f64 {
    let mut sum = 0.0;
    for dy in 0..h {
        for dx in 0..w {
            sum += map.cell(row + dy, col + dx).iter().sum::<f64>();
        }
    }
    sum
}
