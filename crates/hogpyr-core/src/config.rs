use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_BIN_SIZE, DEFAULT_NUM_ORIENTATIONS, DEFAULT_NUM_SCALES};
use crate::error::{HogError, Result};
use crate::features::HogParams;
use crate::real::Precision;

/// Everything needed to turn an image into a feature pyramid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HogConfig {
    /// Number of pyramid levels, finest first.
    #[serde(default = "default_num_scales")]
    pub num_scales: usize,
    /// Side of one spatial block in pixels.
    #[serde(default = "default_bin_size")]
    pub bin_size: usize,
    /// Contrast-sensitive orientation bins (even).
    #[serde(default = "default_num_orientations")]
    pub num_orientations: usize,
    /// Arithmetic precision of features and responses.
    #[serde(default)]
    pub precision: Precision,
}

fn default_num_scales() -> usize {
    DEFAULT_NUM_SCALES
}
fn default_bin_size() -> usize {
    DEFAULT_BIN_SIZE
}
fn default_num_orientations() -> usize {
    DEFAULT_NUM_ORIENTATIONS
}

impl Default for HogConfig {
    fn default() -> Self {
        Self {
            num_scales: DEFAULT_NUM_SCALES,
            bin_size: DEFAULT_BIN_SIZE,
            num_orientations: DEFAULT_NUM_ORIENTATIONS,
            precision: Precision::default(),
        }
    }
}

impl HogConfig {
    pub fn hog_params(&self) -> HogParams {
        HogParams {
            bin_size: self.bin_size,
            num_orientations: self.num_orientations,
        }
    }

    pub fn feature_length(&self) -> usize {
        self.hog_params().feature_length()
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_scales == 0 {
            return Err(HogError::InvalidConfig("num_scales must be at least 1".into()));
        }
        self.hog_params().validate()
    }
}
