use std::fmt;
use std::fmt::Debug;
use std::iter::Sum;

use num_traits::Float;
use serde::{Deserialize, Serialize};

use crate::raster::Sample;

/// Floating-point precision used for all feature and response arithmetic.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Precision {
    #[default]
    F32,
    F64,
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::F32 => write!(f, "f32"),
            Self::F64 => write!(f, "f64"),
        }
    }
}

/// Working precision of the feature pipeline. Implemented for `f32` and `f64`.
/// Every precision is also an accepted input [`Sample`].
pub trait Real: Float + Sample + Sum + Send + Sync + Debug + Default + 'static {
    const PRECISION: Precision;

    /// Convert a literal or index into this precision.
    fn lit(v: f64) -> Self;

    /// Widen for reporting.
    fn as_f64(self) -> f64;
}

impl Real for f32 {
    const PRECISION: Precision = Precision::F32;

    fn lit(v: f64) -> Self {
        v as f32
    }

    fn as_f64(self) -> f64 {
        self as f64
    }
}

impl Real for f64 {
    const PRECISION: Precision = Precision::F64;

    fn lit(v: f64) -> Self {
        v
    }

    fn as_f64(self) -> f64 {
        self
    }
}
