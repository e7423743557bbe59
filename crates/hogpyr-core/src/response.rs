//! Scoring every pyramid level against every filter of a bank.

use std::sync::atomic::{AtomicUsize, Ordering};

use ndarray::Array2;
use rayon::prelude::*;
use tracing::info;

use crate::correlate::correlate;
use crate::error::{HogError, Result};
use crate::pyramid::FeaturePyramid;
use crate::real::Real;
use crate::tensor::{FeatureMap, FilterTemplate};

/// Part filters sharing one feature length.
#[derive(Clone, Debug, PartialEq)]
pub struct FilterBank<T> {
    filters: Vec<FilterTemplate<T>>,
}

impl<T: Real> FilterBank<T> {
    pub fn new(filters: Vec<FilterTemplate<T>>) -> Result<Self> {
        if let Some(first) = filters.first() {
            let flen = first.flen();
            if let Some((i, bad)) = filters.iter().enumerate().find(|(_, f)| f.flen() != flen) {
                return Err(HogError::DimensionMismatch(format!(
                    "filter {i} has {} values per cell, filter 0 has {flen}",
                    bad.flen()
                )));
            }
        }
        Ok(Self { filters })
    }

    pub fn filters(&self) -> &[FilterTemplate<T>] {
        &self.filters
    }

    pub fn get(&self, index: usize) -> Option<&FilterTemplate<T>> {
        self.filters.get(index)
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Shared feature length, `None` for an empty bank.
    pub fn flen(&self) -> Option<usize> {
        self.filters.first().map(|f| f.flen())
    }
}

/// Scores of one filter over one pyramid level.
#[derive(Clone, Debug, PartialEq)]
pub struct ResponseSurface<T> {
    pub level: usize,
    pub filter: usize,
    pub scale: f64,
    pub scores: Array2<T>,
}

impl<T: Real> ResponseSurface<T> {
    pub fn rows(&self) -> usize {
        self.scores.nrows()
    }

    pub fn cols(&self) -> usize {
        self.scores.ncols()
    }

    /// Highest score and its `(row, col)`; first occurrence wins ties.
    pub fn peak(&self) -> Option<(T, (usize, usize))> {
        let mut best: Option<(T, (usize, usize))> = None;
        for ((r, c), &v) in self.scores.indexed_iter() {
            if best.map_or(true, |(b, _)| v > b) {
                best = Some((v, (r, c)));
            }
        }
        best
    }
}

/// All responses of a pyramid against a bank, indexed `level * filters + filter`.
#[derive(Clone, Debug)]
pub struct ResponseSet<T> {
    surfaces: Vec<ResponseSurface<T>>,
    num_levels: usize,
    num_filters: usize,
}

impl<T: Real> ResponseSet<T> {
    pub fn num_levels(&self) -> usize {
        self.num_levels
    }

    pub fn num_filters(&self) -> usize {
        self.num_filters
    }

    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    /// Flat position of the `(level, filter)` pair.
    pub fn index(&self, level: usize, filter: usize) -> usize {
        level * self.num_filters + filter
    }

    pub fn get(&self, level: usize, filter: usize) -> Option<&ResponseSurface<T>> {
        if level >= self.num_levels || filter >= self.num_filters {
            return None;
        }
        self.surfaces.get(self.index(level, filter))
    }

    pub fn surfaces(&self) -> &[ResponseSurface<T>] {
        &self.surfaces
    }

    pub fn into_surfaces(self) -> Vec<ResponseSurface<T>> {
        self.surfaces
    }
}

/// Correlate every feature map with every filter. Result `i` holds pair
/// `(i / filters, i % filters)`.
pub fn score_all<T: Real>(feature_maps: &[FeatureMap<T>], bank: &FilterBank<T>) -> Result<Vec<Array2<T>>> {
    let maps: Vec<&FeatureMap<T>> = feature_maps.iter().collect();
    score_pairs(&maps, bank, &|_| {})
}

/// [`score_all`] with per-pair progress reporting.
///
/// Calls `on_progress(pairs_done)` as each pair finishes; calls may arrive
/// from any worker thread and out of order.
pub fn score_all_with_progress<T: Real>(
    feature_maps: &[FeatureMap<T>],
    bank: &FilterBank<T>,
    on_progress: impl Fn(usize) + Send + Sync,
) -> Result<Vec<Array2<T>>> {
    let maps: Vec<&FeatureMap<T>> = feature_maps.iter().collect();
    score_pairs(&maps, bank, &on_progress)
}

/// Score a pyramid, tagging each surface with its level, filter and scale.
pub fn score_pyramid<T: Real>(pyramid: &FeaturePyramid<T>, bank: &FilterBank<T>) -> Result<ResponseSet<T>> {
    score_pyramid_with_progress(pyramid, bank, |_| {})
}

/// [`score_pyramid`] with per-pair progress reporting.
pub fn score_pyramid_with_progress<T: Real>(
    pyramid: &FeaturePyramid<T>,
    bank: &FilterBank<T>,
    on_progress: impl Fn(usize) + Send + Sync,
) -> Result<ResponseSet<T>> {
    let maps = pyramid.feature_maps();
    let grids = score_pairs(&maps, bank, &on_progress)?;
    let num_filters = bank.len();

    let surfaces = grids
        .into_iter()
        .enumerate()
        .map(|(i, scores)| {
            let level = i / num_filters;
            ResponseSurface {
                level,
                filter: i % num_filters,
                scale: pyramid.levels()[level].scale,
                scores,
            }
        })
        .collect();

    info!(
        levels = maps.len(),
        filters = num_filters,
        "Responses computed"
    );
    Ok(ResponseSet {
        surfaces,
        num_levels: maps.len(),
        num_filters,
    })
}

fn score_pairs<T: Real>(
    maps: &[&FeatureMap<T>],
    bank: &FilterBank<T>,
    on_progress: &(dyn Fn(usize) + Send + Sync),
) -> Result<Vec<Array2<T>>> {
    let num_filters = bank.len();
    if let Some(flen) = bank.flen() {
        if let Some((m, bad)) = maps.iter().enumerate().find(|(_, f)| f.flen() != flen) {
            return Err(HogError::DimensionMismatch(format!(
                "feature map {m} has {} values per cell, filters have {flen}",
                bad.flen()
            )));
        }
    }

    let done = AtomicUsize::new(0);
    (0..maps.len() * num_filters)
        .into_par_iter()
        .map(|i| -> Result<Array2<T>> {
            let response = correlate(maps[i / num_filters], &bank.filters[i % num_filters])?;
            let completed = done.fetch_add(1, Ordering::Relaxed) + 1;
            on_progress(completed);
            Ok(response)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::CellTensor;

    #[test]
    fn test_bank_rejects_mixed_feature_lengths() {
        let err = FilterBank::new(vec![
            CellTensor::<f32>::zeros(2, 2, 32),
            CellTensor::<f32>::zeros(2, 2, 31),
        ])
        .unwrap_err();
        assert!(matches!(err, HogError::DimensionMismatch(_)));
    }

    #[test]
    fn test_empty_bank_yields_nothing() {
        let bank = FilterBank::<f32>::new(vec![]).unwrap();
        let maps = vec![CellTensor::<f32>::zeros(4, 4, 32)];
        assert!(score_all(&maps, &bank).unwrap().is_empty());
    }

    #[test]
    fn test_peak_prefers_first_maximum() {
        let surface = ResponseSurface {
            level: 0,
            filter: 0,
            scale: 1.0,
            scores: Array2::from_shape_vec((2, 2), vec![1.0f32, 3.0, 3.0, 2.0]).unwrap(),
        };
        assert_eq!(surface.peak(), Some((3.0, (0, 1))));
    }
}
