use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use hogpyr_core::{FeaturePyramid, HogConfig, ImageData, Precision, PyramidBuilder, Real};

use super::{load_image, HogArgs};
use crate::summary::{print_config_summary, print_pyramid_table};

#[derive(Args)]
pub struct FeaturesArgs {
    /// Input image
    pub file: PathBuf,

    #[command(flatten)]
    pub hog: HogArgs,
}

pub fn run(args: &FeaturesArgs) -> Result<()> {
    let config = args.hog.resolve()?;
    let image = load_image(&args.file)?;
    print_config_summary(&config, &args.file, &image);

    match config.precision {
        Precision::F32 => print_pyramid_table(&build_pyramid::<f32>(&config, &image)?),
        Precision::F64 => print_pyramid_table(&build_pyramid::<f64>(&config, &image)?),
    }
    Ok(())
}

pub fn build_pyramid<T: Real>(config: &HogConfig, image: &ImageData) -> Result<FeaturePyramid<T>> {
    let builder = PyramidBuilder::<T>::from_config(config)?;
    Ok(builder.build(image)?)
}
