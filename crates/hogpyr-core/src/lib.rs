pub mod config;
pub mod consts;
pub mod correlate;
pub mod dispatch;
pub mod error;
pub mod features;
pub mod imgops;
pub mod pyramid;
pub mod raster;
pub mod real;
pub mod response;
pub mod tensor;

pub use config::HogConfig;
pub use error::{HogError, Result};
pub use features::{FeatureExtractor, HogParams};
pub use pyramid::{FeaturePyramid, PyramidBuilder, PyramidLevel};
pub use raster::{ImageData, SampleType};
pub use real::{Precision, Real};
pub use response::{FilterBank, ResponseSet, ResponseSurface};
pub use tensor::{CellTensor, FeatureMap, FilterTemplate};
