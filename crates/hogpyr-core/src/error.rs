use thiserror::Error;

use crate::raster::SampleType;
use crate::real::Precision;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum HogError {
    #[error("Unsupported image sample type: {0}")]
    UnsupportedSampleType(SampleType),

    #[error("Unsupported channel count: {0} (expected 1 or 3)")]
    UnsupportedChannels(usize),

    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("Precision mismatch: feature map is {feature}, filter is {filter}")]
    PrecisionMismatch {
        feature: Precision,
        filter: Precision,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, HogError>;
