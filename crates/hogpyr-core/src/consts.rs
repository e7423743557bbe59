/// Minimum output cell count (rows * cols) to use row-level Rayon parallelism
/// inside a single extraction or correlation.
pub const PARALLEL_CELL_THRESHOLD: usize = 4_096;

/// Guards the block normalizers against division by zero on flat regions.
pub const NORM_EPSILON: f64 = 1e-4;

/// Ceiling applied to every normalized histogram term.
pub const TRUNCATION_CEILING: f64 = 0.2;

/// Weight applied to the per-quadrant sums that form the texture features.
pub const TEXTURE_WEIGHT: f64 = 0.2357;

/// Number of texture (quadrant energy) values per cell.
pub const TEXTURE_FEATURES: usize = 4;

/// Number of trailing truncation sentinels per cell.
pub const TRUNCATION_FEATURES: usize = 1;

/// Fill value for the border added around every pyramid level.
pub const PYRAMID_PAD_VALUE: f64 = 1.0;

/// Pyramid levels per octave is `ceil(num_scales / SCALES_PER_INTERVAL)`.
pub const SCALES_PER_INTERVAL: usize = 3;

/// Default spatial cell size in pixels.
pub const DEFAULT_BIN_SIZE: usize = 8;

/// Default number of contrast-sensitive orientation bins.
pub const DEFAULT_NUM_ORIENTATIONS: usize = 18;

/// Default number of pyramid levels.
pub const DEFAULT_NUM_SCALES: usize = 10;

/// 5-tap binomial kernel [1, 4, 6, 4, 1] / 16 used before 2x decimation.
pub const BINOMIAL_KERNEL: [f64; 5] = [1.0 / 16.0, 4.0 / 16.0, 6.0 / 16.0, 4.0 / 16.0, 1.0 / 16.0];
