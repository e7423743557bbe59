//! Felzenszwalb-style HOG features for a single image.
//!
//! Pixels vote their gradient magnitude into `bin_size x bin_size` blocks
//! with bilinear soft binning. Each output cell is the centre of a 2x2
//! neighbourhood of blocks and is normalized four times, once per
//! overlapping 2x2 block quadrant. Per cell the layout is
//! `[O contrast-sensitive][O/2 contrast-insensitive][4 texture][1 truncation]`.

use std::f64::consts::PI;

use ndarray::{s, Array2, Array3, ArrayView1};
use tracing::trace;

use crate::consts::{
    DEFAULT_BIN_SIZE, DEFAULT_NUM_ORIENTATIONS, NORM_EPSILON, PARALLEL_CELL_THRESHOLD,
    TEXTURE_FEATURES, TEXTURE_WEIGHT, TRUNCATION_CEILING, TRUNCATION_FEATURES,
};
use crate::error::{HogError, Result};
use crate::raster::{check_channels, ImageData, Sample};
use crate::real::Real;
use crate::tensor::{for_each_row_mut, CellTensor, FeatureMap};

/// Cell size and orientation resolution of the descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HogParams {
    /// Side of one spatial block in pixels.
    pub bin_size: usize,
    /// Contrast-sensitive orientation bins over the full circle (even).
    pub num_orientations: usize,
}

impl Default for HogParams {
    fn default() -> Self {
        Self {
            bin_size: DEFAULT_BIN_SIZE,
            num_orientations: DEFAULT_NUM_ORIENTATIONS,
        }
    }
}

impl HogParams {
    pub fn validate(&self) -> Result<()> {
        if self.bin_size == 0 {
            return Err(HogError::InvalidConfig("bin_size must be at least 1".into()));
        }
        if self.num_orientations < 2 || self.num_orientations % 2 != 0 {
            return Err(HogError::InvalidConfig(format!(
                "num_orientations must be even and at least 2, got {}",
                self.num_orientations
            )));
        }
        Ok(())
    }

    /// Values per output cell: `O + O/2 + 4 + 1`.
    pub fn feature_length(&self) -> usize {
        self.num_orientations + self.num_orientations / 2 + TEXTURE_FEATURES + TRUNCATION_FEATURES
    }
}

/// Computes one [`FeatureMap`] per image at a fixed precision `T`.
#[derive(Clone, Debug)]
pub struct FeatureExtractor<T> {
    params: HogParams,
    /// Unit vectors spanning [0, 180) degrees, `O/2` of them.
    uu: Vec<T>,
    vv: Vec<T>,
}

impl<T: Real> FeatureExtractor<T> {
    pub fn new(params: HogParams) -> Result<Self> {
        params.validate()?;
        let (uu, vv) = unit_vectors(params.num_orientations / 2);
        Ok(Self { params, uu, vv })
    }

    pub fn params(&self) -> HogParams {
        self.params
    }

    pub fn bin_size(&self) -> usize {
        self.params.bin_size
    }

    pub fn num_orientations(&self) -> usize {
        self.params.num_orientations
    }

    pub fn feature_length(&self) -> usize {
        self.params.feature_length()
    }

    /// Block grid for an image of `rows x cols` pixels.
    pub fn block_grid(&self, rows: usize, cols: usize) -> (usize, usize) {
        let bin = self.params.bin_size as f64;
        (
            (rows as f64 / bin).round() as usize,
            (cols as f64 / bin).round() as usize,
        )
    }

    /// Cell grid of the feature map for an image of `rows x cols` pixels.
    pub fn output_size(&self, rows: usize, cols: usize) -> (usize, usize) {
        let (bh, bw) = self.block_grid(rows, cols);
        (bh.saturating_sub(2), bw.saturating_sub(2))
    }

    /// Snap a gradient to one of `O` directions.
    ///
    /// Returns the bin and the projection length. A projection only replaces
    /// the current best when strictly larger, so ties keep the lower bin; a
    /// zero gradient lands in bin 0 with zero length.
    pub fn snap_orientation(&self, dx: T, dy: T) -> (usize, T) {
        let half = self.uu.len();
        let mut best_dot = T::zero();
        let mut best_o = 0;
        for (o, (&u, &v)) in self.uu.iter().zip(&self.vv).enumerate() {
            let dot = u * dx + v * dy;
            if dot > best_dot {
                best_dot = dot;
                best_o = o;
            } else if -dot > best_dot {
                best_dot = -dot;
                best_o = o + half;
            }
        }
        (best_o, best_dot)
    }

    /// Compute features for an image of any supported sample type.
    pub fn compute_dyn(&self, image: &ImageData) -> Result<FeatureMap<T>> {
        match image {
            ImageData::U8(a) => self.compute(a),
            ImageData::U16(a) => self.compute(a),
            ImageData::F32(a) => self.compute(a),
            ImageData::F64(a) => self.compute(a),
            other => Err(HogError::UnsupportedSampleType(other.sample_type())),
        }
    }

    /// Compute features for a `(rows, cols, channels)` image.
    pub fn compute<S: Sample>(&self, image: &Array3<S>) -> Result<FeatureMap<T>> {
        let (rows, cols, channels) = image.dim();
        check_channels(channels)?;

        let hist = self.histograms(image);
        let energy = block_energy(&hist);
        let features = self.normalize(&hist, &energy);
        trace!(
            rows,
            cols,
            cells_h = features.rows(),
            cells_w = features.cols(),
            "HOG features computed"
        );
        Ok(features)
    }

    /// Soft-binned orientation histograms, one `O`-vector per block.
    fn histograms<S: Sample>(&self, image: &Array3<S>) -> CellTensor<T> {
        let (rows, cols, channels) = image.dim();
        let bin = self.params.bin_size;
        let (bh, bw) = self.block_grid(rows, cols);
        let mut hist = CellTensor::zeros(bh, bw, self.params.num_orientations);
        if rows < 3 || cols < 3 || hist.is_empty() {
            return hist;
        }

        let px = |y: usize, x: usize, k: usize| image[[y, x, k]].to_real::<T>();
        let half = T::lit(0.5);
        let bin_t = T::lit(bin as f64);

        for y in 1..(bh * bin).saturating_sub(1) {
            let sy = y.min(rows - 2);
            for x in 1..(bw * bin).saturating_sub(1) {
                let sx = x.min(cols - 2);

                // strongest channel wins
                let mut dx = px(sy, sx + 1, 0) - px(sy, sx - 1, 0);
                let mut dy = px(sy + 1, sx, 0) - px(sy - 1, sx, 0);
                let mut v = dx * dx + dy * dy;
                for k in 1..channels {
                    let dxk = px(sy, sx + 1, k) - px(sy, sx - 1, k);
                    let dyk = px(sy + 1, sx, k) - px(sy - 1, sx, k);
                    let vk = dxk * dxk + dyk * dyk;
                    if vk > v {
                        v = vk;
                        dx = dxk;
                        dy = dyk;
                    }
                }

                let (best_o, _) = self.snap_orientation(dx, dy);
                let magnitude = v.sqrt();

                let yp = (T::lit(y as f64) + half) / bin_t - half;
                let xp = (T::lit(x as f64) + half) / bin_t - half;
                let iyp = yp.floor();
                let ixp = xp.floor();
                let fy = yp - iyp;
                let fx = xp - ixp;
                let gy = T::one() - fy;
                let gx = T::one() - fx;

                let taps = [
                    (0, 0, gy * gx),
                    (0, 1, gy * fx),
                    (1, 0, fy * gx),
                    (1, 1, fy * fx),
                ];
                let by = iyp.to_isize().unwrap_or(-1);
                let bx = ixp.to_isize().unwrap_or(-1);
                for (oy, ox, w) in taps {
                    let (ty, tx) = (by + oy, bx + ox);
                    if ty < 0 || tx < 0 || ty as usize >= bh || tx as usize >= bw {
                        continue;
                    }
                    let cell = hist.cell_mut(ty as usize, tx as usize);
                    cell[best_o] = cell[best_o] + w * magnitude;
                }
            }
        }
        hist
    }

    fn normalize(&self, hist: &CellTensor<T>, energy: &Array2<T>) -> FeatureMap<T> {
        let (bh, bw) = (hist.rows(), hist.cols());
        let out_h = bh.saturating_sub(2);
        let out_w = bw.saturating_sub(2);
        let flen = self.feature_length();
        let mut features = CellTensor::zeros(out_h, out_w, flen);
        if features.is_empty() {
            return features;
        }

        let eps = T::lit(NORM_EPSILON);
        let quad = |r: usize, c: usize| {
            let sum = energy[[r, c]] + energy[[r, c + 1]] + energy[[r + 1, c]] + energy[[r + 1, c + 1]];
            T::one() / (sum + eps).sqrt()
        };

        let parallel = out_h * out_w >= PARALLEL_CELL_THRESHOLD;
        for_each_row_mut(features.as_array_mut(), parallel, |y, mut row| {
            let mut buf = vec![T::zero(); flen];
            for x in 0..out_w {
                let norms = [quad(y + 1, x + 1), quad(y, x + 1), quad(y + 1, x), quad(y, x)];
                self.cell_features(hist.cell(y + 1, x + 1), norms, &mut buf);
                row.slice_mut(s![x * flen..(x + 1) * flen])
                    .assign(&ArrayView1::from(&buf[..]));
            }
        });
        features
    }

    /// Normalize one block histogram into a feature vector.
    fn cell_features(&self, h: &[T], norms: [T; 4], dst: &mut [T]) {
        let o_full = self.params.num_orientations;
        let o_half = o_full / 2;
        let ceiling = T::lit(TRUNCATION_CEILING);
        let half = T::lit(0.5);
        let mut t = [T::zero(); 4];

        let truncated = |value: T| norms.map(|n| (value * n).min(ceiling));

        for o in 0..o_full {
            let hk = truncated(h[o]);
            dst[o] = half * (hk[0] + hk[1] + hk[2] + hk[3]);
            for (tk, v) in t.iter_mut().zip(hk) {
                *tk = *tk + v;
            }
        }

        for o in 0..o_half {
            let hk = truncated(h[o] + h[o + o_half]);
            dst[o_full + o] = half * (hk[0] + hk[1] + hk[2] + hk[3]);
        }

        let texture = T::lit(TEXTURE_WEIGHT);
        let base = o_full + o_half;
        for (k, tk) in t.iter().enumerate() {
            dst[base + k] = texture * *tk;
        }
        dst[base + TEXTURE_FEATURES] = T::zero();
    }
}

/// Per-block energy: `sum over o < O/2 of (h[o] + h[o + O/2])^2`.
fn block_energy<T: Real>(hist: &CellTensor<T>) -> Array2<T> {
    let half = hist.flen() / 2;
    Array2::from_shape_fn((hist.rows(), hist.cols()), |(r, c)| {
        let h = hist.cell(r, c);
        (0..half)
            .map(|o| {
                let folded = h[o] + h[o + half];
                folded * folded
            })
            .sum()
    })
}

/// `count` unit vectors at `k * 180 / count` degrees. Directions mirrored
/// about 90 degrees share bit-identical components.
fn unit_vectors<T: Real>(count: usize) -> (Vec<T>, Vec<T>) {
    let mut uu = vec![T::zero(); count];
    let mut vv = vec![T::zero(); count];
    for k in 0..count {
        let mirror = count - k;
        if k > 0 && mirror < k {
            uu[k] = -uu[mirror];
            vv[k] = vv[mirror];
        } else {
            let theta = k as f64 * PI / count as f64;
            uu[k] = T::lit(theta.cos());
            vv[k] = T::lit(theta.sin());
        }
    }
    (uu, vv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn extractor() -> FeatureExtractor<f64> {
        FeatureExtractor::new(HogParams::default()).unwrap()
    }

    #[test]
    fn test_unit_vectors_match_twenty_degree_table() {
        let (uu, vv) = unit_vectors::<f64>(9);
        let expected_u = [1.0, 0.9397, 0.7660, 0.5, 0.1736, -0.1736, -0.5, -0.7660, -0.9397];
        let expected_v = [0.0, 0.3420, 0.6428, 0.8660, 0.9848, 0.9848, 0.8660, 0.6428, 0.3420];
        for k in 0..9 {
            assert_abs_diff_eq!(uu[k], expected_u[k], epsilon = 1e-4);
            assert_abs_diff_eq!(vv[k], expected_v[k], epsilon = 1e-4);
        }
        assert_eq!(vv[4], vv[5]);
        assert_eq!(uu[4], -uu[5]);
    }

    #[test]
    fn test_snap_vertical_gradient_ties_to_first_bin() {
        let ext = extractor();
        assert_eq!(ext.snap_orientation(0.0, 1.0).0, 4);
        assert_eq!(ext.snap_orientation(0.0, -1.0).0, 13);
    }

    #[test]
    fn test_snap_horizontal_gradient() {
        let ext = extractor();
        let (bin, dot) = ext.snap_orientation(2.0, 0.0);
        assert_eq!(bin, 0);
        assert_abs_diff_eq!(dot, 2.0);
        assert_eq!(ext.snap_orientation(-2.0, 0.0).0, 9);
    }

    #[test]
    fn test_snap_zero_gradient() {
        assert_eq!(extractor().snap_orientation(0.0, 0.0), (0, 0.0));
    }

    #[test]
    fn test_block_energy_folds_opposite_bins() {
        let mut hist = CellTensor::<f64>::zeros(1, 1, 4);
        hist.cell_mut(0, 0).copy_from_slice(&[1.0, 2.0, 3.0, 4.0]);
        let energy = block_energy(&hist);
        // (1 + 3)^2 + (2 + 4)^2
        assert_abs_diff_eq!(energy[[0, 0]], 52.0);
    }

    #[test]
    fn test_cell_features_layout() {
        let ext = FeatureExtractor::<f64>::new(HogParams {
            bin_size: 4,
            num_orientations: 4,
        })
        .unwrap();
        let mut dst = vec![f64::NAN; ext.feature_length()];
        // tiny histogram, unit normalizers: nothing reaches the ceiling
        ext.cell_features(&[0.01, 0.02, 0.0, 0.03], [1.0; 4], &mut dst);
        assert_eq!(dst.len(), 4 + 2 + 4 + 1);
        assert_abs_diff_eq!(dst[0], 0.02, epsilon = 1e-12);
        assert_abs_diff_eq!(dst[1], 0.04, epsilon = 1e-12);
        assert_abs_diff_eq!(dst[3], 0.06, epsilon = 1e-12);
        // insensitive: (h0 + h2), (h1 + h3)
        assert_abs_diff_eq!(dst[4], 0.02, epsilon = 1e-12);
        assert_abs_diff_eq!(dst[5], 0.10, epsilon = 1e-12);
        for k in 0..4 {
            assert_abs_diff_eq!(dst[6 + k], 0.2357 * 0.06, epsilon = 1e-12);
        }
        assert_eq!(dst[10], 0.0);
    }

    #[test]
    fn test_cell_features_truncate_each_term() {
        let ext = extractor();
        let mut dst = vec![0.0; ext.feature_length()];
        let mut h = vec![0.0; 18];
        h[3] = 100.0;
        ext.cell_features(&h, [1.0; 4], &mut dst);
        assert_abs_diff_eq!(dst[3], 0.5 * 4.0 * 0.2);
        assert_abs_diff_eq!(dst[18 + 3], 0.5 * 4.0 * 0.2);
        assert_abs_diff_eq!(dst[27], 0.2357 * 0.2);
    }

    #[test]
    fn test_tiny_image_has_empty_output() {
        let ext = extractor();
        let img = Array3::<u8>::from_elem((2, 2, 1), 9);
        let feat = ext.compute(&img).unwrap();
        assert!(feat.is_empty());
        assert_eq!(feat.flen(), 32);
    }

    #[test]
    fn test_rejects_bad_params() {
        let odd = HogParams {
            bin_size: 8,
            num_orientations: 9,
        };
        assert!(matches!(
            FeatureExtractor::<f32>::new(odd),
            Err(HogError::InvalidConfig(_))
        ));
        let zero_bin = HogParams {
            bin_size: 0,
            num_orientations: 18,
        };
        assert!(FeatureExtractor::<f32>::new(zero_bin).is_err());
    }
}
