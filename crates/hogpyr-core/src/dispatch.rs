//! Precision-tagged containers for callers that only learn the numeric
//! precision of their data at runtime (e.g. models loaded from disk).

use ndarray::Array2;

use crate::correlate::correlate;
use crate::error::{HogError, Result};
use crate::real::Precision;
use crate::tensor::{FeatureMap, FilterTemplate};

#[derive(Clone, Debug, PartialEq)]
pub enum AnyFeatureMap {
    F32(FeatureMap<f32>),
    F64(FeatureMap<f64>),
}

#[derive(Clone, Debug, PartialEq)]
pub enum AnyFilter {
    F32(FilterTemplate<f32>),
    F64(FilterTemplate<f64>),
}

#[derive(Clone, Debug, PartialEq)]
pub enum AnyResponse {
    F32(Array2<f32>),
    F64(Array2<f64>),
}

impl AnyFeatureMap {
    pub fn precision(&self) -> Precision {
        match self {
            Self::F32(_) => Precision::F32,
            Self::F64(_) => Precision::F64,
        }
    }
}

impl AnyFilter {
    pub fn precision(&self) -> Precision {
        match self {
            Self::F32(_) => Precision::F32,
            Self::F64(_) => Precision::F64,
        }
    }
}

impl AnyResponse {
    pub fn precision(&self) -> Precision {
        match self {
            Self::F32(_) => Precision::F32,
            Self::F64(_) => Precision::F64,
        }
    }

    pub fn dim(&self) -> (usize, usize) {
        match self {
            Self::F32(a) => a.dim(),
            Self::F64(a) => a.dim(),
        }
    }
}

impl From<FeatureMap<f32>> for AnyFeatureMap {
    fn from(map: FeatureMap<f32>) -> Self {
        Self::F32(map)
    }
}

impl From<FeatureMap<f64>> for AnyFeatureMap {
    fn from(map: FeatureMap<f64>) -> Self {
        Self::F64(map)
    }
}

impl From<FilterTemplate<f32>> for AnyFilter {
    fn from(filter: FilterTemplate<f32>) -> Self {
        Self::F32(filter)
    }
}

impl From<FilterTemplate<f64>> for AnyFilter {
    fn from(filter: FilterTemplate<f64>) -> Self {
        Self::F64(filter)
    }
}

/// [`correlate`] for runtime-tagged inputs. Fails with `PrecisionMismatch`
/// when the two sides were computed at different precisions.
pub fn correlate_any(feature: &AnyFeatureMap, filter: &AnyFilter) -> Result<AnyResponse> {
    match (feature, filter) {
        (AnyFeatureMap::F32(a), AnyFilter::F32(b)) => Ok(AnyResponse::F32(correlate(a, b)?)),
        (AnyFeatureMap::F64(a), AnyFilter::F64(b)) => Ok(AnyResponse::F64(correlate(a, b)?)),
        _ => Err(HogError::PrecisionMismatch {
            feature: feature.precision(),
            filter: filter.precision(),
        }),
    }
}
