//! Multi-scale feature pyramid.
//!
//! Levels step down by `2^(1/interval)` with `interval = ceil(num_scales / 3)`.
//! Only the first `interval` levels are produced by an arbitrary-factor
//! resize; every further level is a 2x downsample of the level one octave
//! above it, so each resize seeds an independent chain.

use ndarray::Array3;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::HogConfig;
use crate::consts::{PYRAMID_PAD_VALUE, SCALES_PER_INTERVAL};
use crate::error::{HogError, Result};
use crate::features::FeatureExtractor;
use crate::imgops::{CpuImageOps, ImageOps};
use crate::raster::ImageData;
use crate::real::Real;
use crate::tensor::{CellTensor, FeatureMap};

/// One padded feature map and where it sits in scale space.
#[derive(Clone, Debug)]
pub struct PyramidLevel<T> {
    /// Position in the pyramid, 0 = finest.
    pub index: usize,
    /// Nominal resolution relative to the native image.
    pub scale: f64,
    /// `(rows, cols)` of the resampled image the features came from.
    pub image_size: (usize, usize),
    /// Features padded by one cell on every side.
    pub features: FeatureMap<T>,
}

/// Feature maps for every level, finest first.
#[derive(Clone, Debug)]
pub struct FeaturePyramid<T> {
    levels: Vec<PyramidLevel<T>>,
    interval: usize,
}

impl<T: Real> FeaturePyramid<T> {
    pub fn levels(&self) -> &[PyramidLevel<T>] {
        &self.levels
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Levels per octave.
    pub fn interval(&self) -> usize {
        self.interval
    }

    pub fn scales(&self) -> Vec<f64> {
        self.levels.iter().map(|l| l.scale).collect()
    }

    pub fn feature_maps(&self) -> Vec<&FeatureMap<T>> {
        self.levels.iter().map(|l| &l.features).collect()
    }
}

/// Builds [`FeaturePyramid`]s with a fixed extractor and level count.
#[derive(Clone, Debug)]
pub struct PyramidBuilder<T, O = CpuImageOps> {
    extractor: FeatureExtractor<T>,
    num_scales: usize,
    ops: O,
}

impl<T: Real> PyramidBuilder<T> {
    pub fn new(extractor: FeatureExtractor<T>, num_scales: usize) -> Result<Self> {
        if num_scales == 0 {
            return Err(HogError::InvalidConfig("num_scales must be at least 1".into()));
        }
        Ok(Self {
            extractor,
            num_scales,
            ops: CpuImageOps,
        })
    }

    pub fn from_config(config: &HogConfig) -> Result<Self> {
        config.validate()?;
        Self::new(FeatureExtractor::new(config.hog_params())?, config.num_scales)
    }
}

impl<T: Real, O: ImageOps> PyramidBuilder<T, O> {
    /// Swap the resampling collaborator.
    pub fn with_ops<P: ImageOps>(self, ops: P) -> PyramidBuilder<T, P> {
        PyramidBuilder {
            extractor: self.extractor,
            num_scales: self.num_scales,
            ops,
        }
    }

    pub fn extractor(&self) -> &FeatureExtractor<T> {
        &self.extractor
    }

    pub fn num_scales(&self) -> usize {
        self.num_scales
    }

    /// Levels per octave.
    pub fn interval(&self) -> usize {
        self.num_scales.div_ceil(SCALES_PER_INTERVAL)
    }

    /// Nominal scale of every level: `2^(-j / interval)`.
    pub fn scales(&self) -> Vec<f64> {
        let sc = self.step();
        (0..self.num_scales).map(|j| sc.powi(-(j as i32))).collect()
    }

    fn step(&self) -> f64 {
        2f64.powf(1.0 / self.interval() as f64)
    }

    /// Compute the full pyramid.
    ///
    /// Unsupported sample types or channel counts abort before any work is
    /// done; no partial pyramid is ever returned.
    pub fn build(&self, image: &ImageData) -> Result<FeaturePyramid<T>> {
        let native = image.to_precision::<T>()?;
        self.build_from(&native)
    }

    /// Compute the full pyramid from an image already at working precision.
    pub fn build_from(&self, native: &Array3<T>) -> Result<FeaturePyramid<T>> {
        let images = self.resample(native);
        let scales = self.scales();
        let flen = self.extractor.feature_length();
        let fill = T::lit(PYRAMID_PAD_VALUE);

        let levels = images
            .par_iter()
            .enumerate()
            .map(|(index, img)| -> Result<PyramidLevel<T>> {
                let features = self.extractor.compute(img)?;
                let padded = self
                    .ops
                    .pad_border(features.as_array(), 1, 1, flen, flen, fill);
                let features = CellTensor::new(padded, flen)?;
                debug!(
                    level = index,
                    scale = scales[index],
                    rows = img.dim().0,
                    cols = img.dim().1,
                    cells_h = features.rows(),
                    cells_w = features.cols(),
                    "Pyramid level computed"
                );
                Ok(PyramidLevel {
                    index,
                    scale: scales[index],
                    image_size: (img.dim().0, img.dim().1),
                    features,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        info!(
            levels = levels.len(),
            interval = self.interval(),
            feature_length = flen,
            "Feature pyramid built"
        );
        Ok(FeaturePyramid {
            levels,
            interval: self.interval(),
        })
    }

    /// Resampled images for every level, finest first.
    pub fn resample(&self, native: &Array3<T>) -> Vec<Array3<T>> {
        let n = self.num_scales;
        let interval = self.interval();
        let sc = self.step();

        let chains: Vec<Vec<(usize, Array3<T>)>> = (0..interval)
            .into_par_iter()
            .map(|i| {
                let base = self.ops.resize(native, sc.powi(-(i as i32)));
                let mut chain = vec![(i, base)];
                let mut slot = i + interval;
                while slot < n {
                    let down = self.ops.downsample_half(&chain[chain.len() - 1].1);
                    chain.push((slot, down));
                    slot += interval;
                }
                chain
            })
            .collect();

        let mut slots: Vec<Option<Array3<T>>> = vec![None; n];
        for (slot, img) in chains.into_iter().flatten() {
            slots[slot] = Some(img);
        }
        slots.into_iter().flatten().collect()
    }
}
