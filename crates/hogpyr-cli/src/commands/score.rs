use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use hogpyr_core::response::score_pyramid_with_progress;
use hogpyr_core::{CellTensor, FilterBank, HogConfig, ImageData, Precision, Real};
use indicatif::{ProgressBar, ProgressStyle};
use ndarray::Array2;
use serde::Deserialize;
use tracing::info;

use super::features::build_pyramid;
use super::{load_image, HogArgs};
use crate::summary::{print_config_summary, print_peaks};

#[derive(Args)]
pub struct ScoreArgs {
    /// Input image
    pub file: PathBuf,

    /// Filter bank file (TOML)
    #[arg(long)]
    pub filters: PathBuf,

    /// Show the top N responses only
    #[arg(long, default_value = "20")]
    pub top: usize,

    #[command(flatten)]
    pub hog: HogArgs,
}

/// On-disk filter bank.
///
/// ```toml
/// feature_length = 32
///
/// [[filters]]
/// rows = 2
/// cols = 2
/// fill = 0.1
/// ```
#[derive(Deserialize)]
pub struct BankFile {
    pub feature_length: usize,
    #[serde(default)]
    pub filters: Vec<FilterSpec>,
}

#[derive(Deserialize)]
pub struct FilterSpec {
    pub rows: usize,
    pub cols: usize,
    /// Row-major, feature-minor weights.
    #[serde(default)]
    pub weights: Option<Vec<f64>>,
    /// Constant weight, used when `weights` is absent.
    #[serde(default)]
    pub fill: Option<f64>,
}

impl BankFile {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read filter bank {}", path.display()))?;
        toml::from_str(&contents).context("Invalid filter bank")
    }

    pub fn to_bank<T: Real>(&self) -> Result<FilterBank<T>> {
        let flen = self.feature_length;
        let filters = self
            .filters
            .iter()
            .enumerate()
            .map(|(i, spec)| -> Result<CellTensor<T>> {
                let width = spec.cols * flen;
                let values: Vec<T> = match (&spec.weights, spec.fill) {
                    (Some(w), _) if w.len() == spec.rows * width => {
                        w.iter().map(|&v| T::lit(v)).collect()
                    }
                    (Some(w), _) => bail!(
                        "filter {i}: expected {} weights, found {}",
                        spec.rows * width,
                        w.len()
                    ),
                    (None, Some(fill)) => vec![T::lit(fill); spec.rows * width],
                    (None, None) => bail!("filter {i}: needs either weights or fill"),
                };
                let grid = Array2::from_shape_vec((spec.rows, width), values)?;
                Ok(CellTensor::new(grid, flen)?)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(FilterBank::new(filters)?)
    }
}

pub fn run(args: &ScoreArgs) -> Result<()> {
    let config = args.hog.resolve()?;
    let bank_file = BankFile::load(&args.filters)?;
    if bank_file.feature_length != config.feature_length() {
        bail!(
            "Filter bank has {} values per cell, config produces {}",
            bank_file.feature_length,
            config.feature_length()
        );
    }

    let image = load_image(&args.file)?;
    print_config_summary(&config, &args.file, &image);

    match config.precision {
        Precision::F32 => score::<f32>(&config, &image, &bank_file, args.top),
        Precision::F64 => score::<f64>(&config, &image, &bank_file, args.top),
    }
}

fn score<T: Real>(config: &HogConfig, image: &ImageData, bank_file: &BankFile, top: usize) -> Result<()> {
    let bank = bank_file.to_bank::<T>()?;
    let pyramid = build_pyramid::<T>(config, image)?;
    info!(
        levels = pyramid.len(),
        filters = bank.len(),
        precision = %T::PRECISION,
        "Scoring filter bank"
    );

    let pb = ProgressBar::new((pyramid.len() * bank.len()) as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{bar:40}] {pos}/{len}")?
            .progress_chars("=> "),
    );
    pb.set_message("Scoring");

    let responses = score_pyramid_with_progress(&pyramid, &bank, |_| pb.inc(1))?;
    pb.finish_with_message("Scored");

    print_peaks(&responses, top);
    Ok(())
}
