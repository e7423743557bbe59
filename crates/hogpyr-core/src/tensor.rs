//! Cell tensors: a (row, col, feature) volume stored as a flattened 2D grid.
//!
//! Storage is row-major and feature-minor: cell `(r, c)` occupies the
//! contiguous run `[c * flen, (c + 1) * flen)` of grid row `r`. Every offset
//! computation in the crate goes through [`CellTensor::offset`] or the row
//! accessors below.

use ndarray::parallel::prelude::*;
use ndarray::{Array2, ArrayViewMut1, Axis};

use crate::error::{HogError, Result};
use crate::real::Real;

/// A grid of `rows x cols` cells, each carrying `flen` values.
#[derive(Clone, Debug, PartialEq)]
pub struct CellTensor<T> {
    data: Array2<T>,
    flen: usize,
}

/// HOG features of one pyramid level.
pub type FeatureMap<T> = CellTensor<T>;

/// Learned weights of one part filter.
pub type FilterTemplate<T> = CellTensor<T>;

impl<T: Real> CellTensor<T> {
    /// Wrap a flattened `(rows, cols * flen)` grid.
    ///
    /// Fails with `DimensionMismatch` when `flen` is zero or does not divide
    /// the grid width.
    pub fn new(data: Array2<T>, flen: usize) -> Result<Self> {
        if flen == 0 {
            return Err(HogError::DimensionMismatch(
                "feature length must be positive".into(),
            ));
        }
        if data.ncols() % flen != 0 {
            return Err(HogError::DimensionMismatch(format!(
                "grid width {} is not divisible by feature length {}",
                data.ncols(),
                flen
            )));
        }
        let data = if data.is_standard_layout() {
            data
        } else {
            data.as_standard_layout().into_owned()
        };
        Ok(Self { data, flen })
    }

    /// All-zero tensor of `rows x cols` cells.
    pub fn zeros(rows: usize, cols: usize, flen: usize) -> Self {
        Self {
            data: Array2::zeros((rows, cols * flen)),
            flen,
        }
    }

    /// Build a tensor from a closure over `(row, col, feature)`.
    pub fn from_fn(
        rows: usize,
        cols: usize,
        flen: usize,
        mut f: impl FnMut(usize, usize, usize) -> T,
    ) -> Self {
        let data = Array2::from_shape_fn((rows, cols * flen), |(r, k)| f(r, k / flen, k % flen));
        Self { data, flen }
    }

    /// Build a tensor whose every value is `value`.
    pub fn from_elem(rows: usize, cols: usize, flen: usize, value: T) -> Self {
        Self {
            data: Array2::from_elem((rows, cols * flen), value),
            flen,
        }
    }

    /// Number of cell rows.
    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    /// Number of cell columns.
    pub fn cols(&self) -> usize {
        self.data.ncols().checked_div(self.flen).unwrap_or(0)
    }

    /// Values per cell.
    pub fn flen(&self) -> usize {
        self.flen
    }

    /// Physical grid width (`cols * flen`).
    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    /// `true` when the tensor holds no cells.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Physical `(row, column)` position of value `f` in cell `(r, c)`.
    #[inline]
    pub fn offset(&self, r: usize, c: usize, f: usize) -> (usize, usize) {
        debug_assert!(f < self.flen, "feature index {f} >= {}", self.flen);
        (r, c * self.flen + f)
    }

    /// Bounds-checked value access.
    #[inline]
    pub fn at(&self, r: usize, c: usize, f: usize) -> T {
        let (row, col) = self.offset(r, c, f);
        self.data[[row, col]]
    }

    /// Contiguous grid row `r` (all cells of one row).
    #[inline]
    pub fn row_slice(&self, r: usize) -> &[T] {
        let width = self.width();
        &self.flat()[r * width..(r + 1) * width]
    }

    /// Contiguous values of cell `(r, c)`.
    #[inline]
    pub fn cell(&self, r: usize, c: usize) -> &[T] {
        let (row, col) = self.offset(r, c, 0);
        &self.row_slice(row)[col..col + self.flen]
    }

    /// Mutable values of cell `(r, c)`.
    pub fn cell_mut(&mut self, r: usize, c: usize) -> &mut [T] {
        let (row, col) = self.offset(r, c, 0);
        let width = self.width();
        let flen = self.flen;
        let flat = self.data.as_slice_mut().unwrap_or_default();
        &mut flat[row * width + col..row * width + col + flen]
    }

    /// Flattened grid view.
    pub fn as_array(&self) -> &Array2<T> {
        &self.data
    }

    /// Consume into the flattened grid.
    pub fn into_array(self) -> Array2<T> {
        self.data
    }

    pub(crate) fn as_array_mut(&mut self) -> &mut Array2<T> {
        &mut self.data
    }

    fn flat(&self) -> &[T] {
        // constructors only store standard-layout grids
        self.data.as_slice().unwrap_or_default()
    }
}

/// Run `f(row_index, row)` over every row of `grid`, optionally on the Rayon
/// pool. Each invocation owns its row exclusively.
pub(crate) fn for_each_row_mut<T, F>(grid: &mut Array2<T>, parallel: bool, f: F)
where
    T: Send + Sync,
    F: Fn(usize, ArrayViewMut1<T>) + Sync + Send,
{
    if parallel {
        grid.axis_iter_mut(Axis(0))
            .into_par_iter()
            .enumerate()
            .for_each(|(row, dst)| f(row, dst));
    } else {
        for (row, dst) in grid.axis_iter_mut(Axis(0)).enumerate() {
            f(row, dst);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_is_feature_minor() {
        let t = CellTensor::<f32>::zeros(2, 3, 4);
        assert_eq!(t.offset(0, 0, 0), (0, 0));
        assert_eq!(t.offset(0, 1, 0), (0, 4));
        assert_eq!(t.offset(1, 2, 3), (1, 11));
        assert_eq!(t.width(), 12);
    }

    #[test]
    fn test_from_fn_and_cell_agree() {
        let t = CellTensor::<f64>::from_fn(3, 2, 5, |r, c, f| (r * 100 + c * 10 + f) as f64);
        assert_eq!(t.cell(2, 1), &[210.0, 211.0, 212.0, 213.0, 214.0]);
        assert_eq!(t.at(1, 0, 4), 104.0);
        assert_eq!(t.row_slice(1)[5], 110.0);
    }

    #[test]
    fn test_rejects_indivisible_width() {
        let err = CellTensor::<f32>::new(Array2::zeros((2, 7)), 3).unwrap_err();
        assert!(matches!(err, HogError::DimensionMismatch(_)));
    }

    #[test]
    fn test_transposed_input_is_relaid() {
        let base = Array2::<f32>::from_shape_fn((4, 2), |(r, c)| (r * 2 + c) as f32);
        let transposed = CellTensor::new(base.clone().reversed_axes(), 2).unwrap();
        assert_eq!(transposed.at(1, 1, 0), base[[2, 1]]);
        assert_eq!(transposed.cell(0, 1), &[base[[2, 0]], base[[3, 0]]]);
    }

    #[test]
    fn test_cell_mut_writes_in_place() {
        let mut t = CellTensor::<f32>::zeros(2, 2, 3);
        t.cell_mut(1, 1).copy_from_slice(&[1.0, 2.0, 3.0]);
        assert_eq!(t.at(1, 1, 2), 3.0);
        assert_eq!(t.at(1, 0, 2), 0.0);
    }
}
