//! Image resampling and border padding used by the pyramid builder.
//!
//! [`ImageOps`] is the seam: the pyramid only needs an arbitrary-factor
//! resize, a 2x downsample and constant border padding. [`CpuImageOps`]
//! implements them with bilinear interpolation and a binomial pre-filter.

use ndarray::parallel::prelude::*;
use ndarray::{s, Array2, Array3, ArrayViewMut2, Axis};

use crate::consts::{BINOMIAL_KERNEL, PARALLEL_CELL_THRESHOLD};
use crate::real::Real;

/// Image-processing primitives consumed by [`crate::pyramid::PyramidBuilder`].
pub trait ImageOps: Send + Sync {
    /// Resample `image` so each side is `round(side * factor)` (at least 1).
    fn resize<T: Real>(&self, image: &Array3<T>, factor: f64) -> Array3<T>;

    /// Low-pass and decimate by two; output sides are `ceil(side / 2)`.
    fn downsample_half<T: Real>(&self, image: &Array3<T>) -> Array3<T>;

    /// Surround `grid` with a constant border.
    fn pad_border<T: Real>(
        &self,
        grid: &Array2<T>,
        top: usize,
        bottom: usize,
        left: usize,
        right: usize,
        fill: T,
    ) -> Array2<T>;
}

/// CPU implementation using Rayon over output rows for large images.
#[derive(Clone, Copy, Debug, Default)]
pub struct CpuImageOps;

impl ImageOps for CpuImageOps {
    fn resize<T: Real>(&self, image: &Array3<T>, factor: f64) -> Array3<T> {
        let (h, w, ch) = image.dim();
        let new_h = scaled_side(h, factor);
        let new_w = scaled_side(w, factor);
        if (new_h, new_w) == (h, w) || h == 0 || w == 0 {
            return image.clone();
        }

        // pixel-centre alignment: src = (dst + 0.5) / scale - 0.5
        let sy = h as f64 / new_h as f64;
        let sx = w as f64 / new_w as f64;
        let cols: Vec<(usize, usize, T)> = (0..new_w)
            .map(|c| interp_coords(c, sx, w))
            .collect();

        let mut out = Array3::<T>::zeros((new_h, new_w, ch));
        for_each_row(&mut out, |row, mut dst| {
            let (y0, y1, fy) = interp_coords(row, sy, h);
            let gy = T::one() - fy;
            for (col, &(x0, x1, fx)) in cols.iter().enumerate() {
                let gx = T::one() - fx;
                for k in 0..ch {
                    let top = image[[y0, x0, k]] * gx + image[[y0, x1, k]] * fx;
                    let bottom = image[[y1, x0, k]] * gx + image[[y1, x1, k]] * fx;
                    dst[[col, k]] = top * gy + bottom * fy;
                }
            }
        });
        out
    }

    fn downsample_half<T: Real>(&self, image: &Array3<T>) -> Array3<T> {
        let (h, w, ch) = image.dim();
        let new_h = h.div_ceil(2);
        let new_w = w.div_ceil(2);
        let kernel: Vec<T> = BINOMIAL_KERNEL.iter().map(|&k| T::lit(k)).collect();
        let radius = (kernel.len() / 2) as isize;

        // horizontal pass, only at the columns that survive decimation
        let mut horiz = Array3::<T>::zeros((h, new_w, ch));
        for_each_row(&mut horiz, |row, mut dst| {
            for col in 0..new_w {
                let centre = (col * 2) as isize;
                for k in 0..ch {
                    let mut sum = T::zero();
                    for (ki, &kv) in kernel.iter().enumerate() {
                        let src = reflect_101(centre + ki as isize - radius, w);
                        sum = sum + image[[row, src, k]] * kv;
                    }
                    dst[[col, k]] = sum;
                }
            }
        });

        let mut out = Array3::<T>::zeros((new_h, new_w, ch));
        for_each_row(&mut out, |row, mut dst| {
            let centre = (row * 2) as isize;
            for col in 0..new_w {
                for k in 0..ch {
                    let mut sum = T::zero();
                    for (ki, &kv) in kernel.iter().enumerate() {
                        let src = reflect_101(centre + ki as isize - radius, h);
                        sum = sum + horiz[[src, col, k]] * kv;
                    }
                    dst[[col, k]] = sum;
                }
            }
        });
        out
    }

    fn pad_border<T: Real>(
        &self,
        grid: &Array2<T>,
        top: usize,
        bottom: usize,
        left: usize,
        right: usize,
        fill: T,
    ) -> Array2<T> {
        let (h, w) = grid.dim();
        let mut out = Array2::from_elem((h + top + bottom, w + left + right), fill);
        out.slice_mut(s![top..top + h, left..left + w]).assign(grid);
        out
    }
}

fn scaled_side(side: usize, factor: f64) -> usize {
    ((side as f64 * factor).round() as usize).max(1)
}

/// Source taps and fractional weight for destination index `dst`.
fn interp_coords<T: Real>(dst: usize, scale: f64, len: usize) -> (usize, usize, T) {
    let src = ((dst as f64 + 0.5) * scale - 0.5).max(0.0);
    let i0 = (src.floor() as usize).min(len - 1);
    let i1 = (i0 + 1).min(len - 1);
    let frac = if i0 == len - 1 { 0.0 } else { src - i0 as f64 };
    (i0, i1, T::lit(frac))
}

/// Mirror an out-of-range index without repeating the edge sample
/// (`dcb|abcd|cba`).
fn reflect_101(mut i: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let n = len as isize;
    while i < 0 || i >= n {
        i = if i < 0 { -i } else { 2 * n - 2 - i };
    }
    i as usize
}

/// Run `f(row_index, row_view)` over every row of a `(rows, cols, ch)` array,
/// in parallel when the array is large enough.
fn for_each_row<T, F>(out: &mut Array3<T>, f: F)
where
    T: Real,
    F: Fn(usize, ArrayViewMut2<T>) + Sync + Send,
{
    let (h, w, _) = out.dim();
    if h * w >= PARALLEL_CELL_THRESHOLD {
        out.axis_iter_mut(Axis(0))
            .into_par_iter()
            .enumerate()
            .for_each(|(row, dst)| f(row, dst));
    } else {
        for (row, dst) in out.axis_iter_mut(Axis(0)).enumerate() {
            f(row, dst);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn ramp(h: usize, w: usize) -> Array3<f64> {
        Array3::from_shape_fn((h, w, 1), |(r, c, _)| (r * w + c) as f64)
    }

    #[test]
    fn test_reflect_101() {
        assert_eq!(reflect_101(-1, 5), 1);
        assert_eq!(reflect_101(-2, 5), 2);
        assert_eq!(reflect_101(5, 5), 3);
        assert_eq!(reflect_101(6, 5), 2);
        assert_eq!(reflect_101(3, 1), 0);
    }

    #[test]
    fn test_resize_identity_factor() {
        let img = ramp(7, 9);
        assert_eq!(CpuImageOps.resize(&img, 1.0), img);
    }

    #[test]
    fn test_resize_output_size_rounds() {
        let img = ramp(10, 15);
        let out = CpuImageOps.resize(&img, 1.0 / 2f64.powf(1.0 / 3.0));
        assert_eq!(out.dim(), (8, 12, 1));
    }

    #[test]
    fn test_resize_constant_image_stays_constant() {
        let img = Array3::<f32>::from_elem((12, 12, 3), 0.25);
        let out = CpuImageOps.resize(&img, 0.7);
        for v in out.iter() {
            assert_abs_diff_eq!(*v, 0.25, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_downsample_half_sizes() {
        assert_eq!(CpuImageOps.downsample_half(&ramp(8, 8)).dim(), (4, 4, 1));
        assert_eq!(CpuImageOps.downsample_half(&ramp(9, 7)).dim(), (5, 4, 1));
        assert_eq!(CpuImageOps.downsample_half(&ramp(1, 1)).dim(), (1, 1, 1));
    }

    #[test]
    fn test_downsample_preserves_linear_ramp_interior() {
        // the binomial kernel is symmetric, so interior samples of a linear
        // ramp are reproduced exactly
        let img = ramp(16, 16);
        let out = CpuImageOps.downsample_half(&img);
        assert_abs_diff_eq!(out[[2, 3, 0]], img[[4, 6, 0]], epsilon = 1e-9);
    }

    #[test]
    fn test_pad_border_places_grid() {
        let grid = Array2::<f32>::from_elem((2, 3), 5.0);
        let out = CpuImageOps.pad_border(&grid, 1, 1, 2, 2, 1.0);
        assert_eq!(out.dim(), (4, 7));
        assert_eq!(out[[0, 0]], 1.0);
        assert_eq!(out[[1, 2]], 5.0);
        assert_eq!(out[[2, 4]], 5.0);
        assert_eq!(out[[2, 5]], 1.0);
        assert_eq!(out[[3, 6]], 1.0);
    }
}
