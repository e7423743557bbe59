pub mod config;
pub mod features;
pub mod score;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use hogpyr_core::{HogConfig, ImageData, Precision};
use tracing::info;

#[derive(Clone, Copy, ValueEnum)]
pub enum PrecisionArg {
    F32,
    F64,
}

impl From<PrecisionArg> for Precision {
    fn from(arg: PrecisionArg) -> Self {
        match arg {
            PrecisionArg::F32 => Precision::F32,
            PrecisionArg::F64 => Precision::F64,
        }
    }
}

/// Feature parameters shared by every command that builds a pyramid.
/// Flags override values read from `--config`.
#[derive(Args)]
pub struct HogArgs {
    /// Feature config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Number of pyramid levels
    #[arg(long)]
    pub scales: Option<usize>,

    /// Block size in pixels
    #[arg(long)]
    pub bin_size: Option<usize>,

    /// Contrast-sensitive orientation bins (even)
    #[arg(long)]
    pub orientations: Option<usize>,

    /// Arithmetic precision
    #[arg(long, value_enum)]
    pub precision: Option<PrecisionArg>,
}

impl HogArgs {
    pub fn resolve(&self) -> Result<HogConfig> {
        let mut config = match self.config {
            Some(ref path) => {
                let contents = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config {}", path.display()))?;
                toml::from_str(&contents).context("Invalid feature config")?
            }
            None => HogConfig::default(),
        };

        if let Some(scales) = self.scales {
            config.num_scales = scales;
        }
        if let Some(bin_size) = self.bin_size {
            config.bin_size = bin_size;
        }
        if let Some(orientations) = self.orientations {
            config.num_orientations = orientations;
        }
        if let Some(precision) = self.precision {
            config.precision = precision.into();
        }

        config.validate()?;
        Ok(config)
    }
}

pub fn load_image(path: &Path) -> Result<ImageData> {
    let img = image::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let data = ImageData::try_from(&img)?;
    let (rows, cols, channels) = data.dim();
    info!(
        path = %path.display(),
        rows,
        cols,
        channels,
        sample_type = %data.sample_type(),
        "Image loaded"
    );
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_image_reports_missing_file() {
        let path = std::env::temp_dir().join("hogpyr-no-such-image.png");
        let err = load_image(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to open"), "got: {err}");
    }

    #[test]
    fn test_flags_override_defaults() {
        let args = HogArgs {
            config: None,
            scales: Some(4),
            bin_size: None,
            orientations: Some(12),
            precision: Some(PrecisionArg::F64),
        };
        let config = args.resolve().unwrap();
        assert_eq!(config.num_scales, 4);
        assert_eq!(config.bin_size, 8);
        assert_eq!(config.feature_length(), 23);
        assert_eq!(config.precision, Precision::F64);
    }

    #[test]
    fn test_invalid_override_rejected() {
        let args = HogArgs {
            config: None,
            scales: Some(0),
            bin_size: None,
            orientations: None,
            precision: None,
        };
        assert!(args.resolve().is_err());
    }
}
