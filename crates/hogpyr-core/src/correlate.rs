//! Valid cross-correlation of a filter template over a feature map, striding
//! one whole cell (`flen` values) at a time along the flattened axis.

use ndarray::Array2;

use crate::consts::PARALLEL_CELL_THRESHOLD;
use crate::error::{HogError, Result};
use crate::real::Real;
use crate::tensor::{for_each_row_mut, FeatureMap, FilterTemplate};

/// Number of valid placements `(rows, cols)` of `filter` inside `feature`,
/// counted in cells. Zero in both axes when the filter does not fit.
pub fn response_size<T: Real>(feature: &FeatureMap<T>, filter: &FilterTemplate<T>) -> (usize, usize) {
    if filter.rows() > feature.rows() || filter.cols() > feature.cols() {
        return (0, 0);
    }
    (
        feature.rows() - filter.rows() + 1,
        feature.cols() - filter.cols() + 1,
    )
}

/// Score every placement of `filter` over `feature`.
///
/// `out[m][n]` is the full inner product of the filter with the window whose
/// top-left cell is `(m, n)`. Fails with `DimensionMismatch` before touching
/// any data when the feature lengths differ.
pub fn correlate<T: Real>(feature: &FeatureMap<T>, filter: &FilterTemplate<T>) -> Result<Array2<T>> {
    if feature.flen() != filter.flen() {
        return Err(HogError::DimensionMismatch(format!(
            "feature map has {} values per cell, filter has {}",
            feature.flen(),
            filter.flen()
        )));
    }

    let (m, n) = response_size(feature, filter);
    let mut out = Array2::<T>::zeros((m, n));
    if m == 0 || n == 0 {
        return Ok(out);
    }

    let parallel = m * n * filter.rows() * filter.cols() >= PARALLEL_CELL_THRESHOLD;
    for_each_row_mut(&mut out, parallel, |row, mut dst| {
        for col in 0..n {
            dst[col] = if cfg!(debug_assertions) {
                window_dot_checked(feature, filter, row, col)
            } else {
                window_dot_contiguous(feature, filter, row, col)
            };
        }
    });
    Ok(out)
}

/// Inner product through the per-value accessor. Every read is bounds-checked.
pub(crate) fn window_dot_checked<T: Real>(
    feature: &FeatureMap<T>,
    filter: &FilterTemplate<T>,
    row: usize,
    col: usize,
) -> T {
    let mut acc = T::zero();
    for h in 0..filter.rows() {
        for w in 0..filter.cols() {
            for f in 0..filter.flen() {
                acc = acc + filter.at(h, w, f) * feature.at(row + h, col + w, f);
            }
        }
    }
    acc
}

/// Inner product over contiguous row runs. Relies on the row-major,
/// feature-minor layout: a window row is one slice of `cols * flen` values.
pub(crate) fn window_dot_contiguous<T: Real>(
    feature: &FeatureMap<T>,
    filter: &FilterTemplate<T>,
    row: usize,
    col: usize,
) -> T {
    let span = filter.width();
    let start = col * feature.flen();
    let mut acc = T::zero();
    for h in 0..filter.rows() {
        let weights = filter.row_slice(h);
        let values = &feature.row_slice(row + h)[start..start + span];
        for (&w, &v) in weights.iter().zip(values) {
            acc = acc + w * v;
        }
    }
    acc
}
