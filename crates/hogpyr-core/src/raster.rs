//! Input images tagged by sample type.
//!
//! Feature extraction is generic over the pixel sample type; [`ImageData`]
//! carries an image whose sample type is only known at runtime and routes it
//! to the matching instantiation.

use std::fmt;

use image::DynamicImage;
use ndarray::{Array2, Array3, Axis};

use crate::error::{HogError, Result};
use crate::real::Real;

/// Pixel sample representation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SampleType {
    U8,
    U16,
    I8,
    I16,
    I32,
    F32,
    F64,
}

impl SampleType {
    /// Whether feature extraction accepts this sample type.
    pub fn is_supported(self) -> bool {
        matches!(self, Self::U8 | Self::U16 | Self::F32 | Self::F64)
    }
}

impl fmt::Display for SampleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::F32 => "f32",
            Self::F64 => "f64",
        };
        f.write_str(name)
    }
}

/// A pixel sample type accepted by the feature extractor.
pub trait Sample: Copy + Send + Sync + 'static {
    const TYPE: SampleType;

    fn to_real<T: Real>(self) -> T;
}

macro_rules! impl_sample {
    ($($ty:ty => $tag:ident),* $(,)?) => {
        $(
            impl Sample for $ty {
                const TYPE: SampleType = SampleType::$tag;

                #[inline]
                fn to_real<T: Real>(self) -> T {
                    T::lit(self as f64)
                }
            }
        )*
    };
}

impl_sample!(u8 => U8, u16 => U16, f32 => F32, f64 => F64);

/// An image with 1 or 3 channels, shape `(rows, cols, channels)`.
#[derive(Clone, Debug, PartialEq)]
pub enum ImageData {
    U8(Array3<u8>),
    U16(Array3<u16>),
    I8(Array3<i8>),
    I16(Array3<i16>),
    I32(Array3<i32>),
    F32(Array3<f32>),
    F64(Array3<f64>),
}

macro_rules! impl_from_arrays {
    ($($ty:ty => $tag:ident),* $(,)?) => {
        $(
            impl From<Array3<$ty>> for ImageData {
                fn from(data: Array3<$ty>) -> Self {
                    Self::$tag(data)
                }
            }

            impl From<Array2<$ty>> for ImageData {
                fn from(data: Array2<$ty>) -> Self {
                    Self::$tag(data.insert_axis(Axis(2)))
                }
            }
        )*
    };
}

impl_from_arrays!(u8 => U8, u16 => U16, i8 => I8, i16 => I16, i32 => I32, f32 => F32, f64 => F64);

impl ImageData {
    pub fn sample_type(&self) -> SampleType {
        match self {
            Self::U8(_) => SampleType::U8,
            Self::U16(_) => SampleType::U16,
            Self::I8(_) => SampleType::I8,
            Self::I16(_) => SampleType::I16,
            Self::I32(_) => SampleType::I32,
            Self::F32(_) => SampleType::F32,
            Self::F64(_) => SampleType::F64,
        }
    }

    /// `(rows, cols, channels)`.
    pub fn dim(&self) -> (usize, usize, usize) {
        match self {
            Self::U8(a) => a.dim(),
            Self::U16(a) => a.dim(),
            Self::I8(a) => a.dim(),
            Self::I16(a) => a.dim(),
            Self::I32(a) => a.dim(),
            Self::F32(a) => a.dim(),
            Self::F64(a) => a.dim(),
        }
    }

    pub fn rows(&self) -> usize {
        self.dim().0
    }

    pub fn cols(&self) -> usize {
        self.dim().1
    }

    pub fn channels(&self) -> usize {
        self.dim().2
    }

    /// Reject sample types and channel counts the extractor cannot handle.
    pub fn check_supported(&self) -> Result<()> {
        let sample_type = self.sample_type();
        if !sample_type.is_supported() {
            return Err(HogError::UnsupportedSampleType(sample_type));
        }
        check_channels(self.channels())
    }

    /// Convert every sample into working precision `T`.
    pub fn to_precision<T: Real>(&self) -> Result<Array3<T>> {
        self.check_supported()?;
        match self {
            Self::U8(a) => Ok(a.mapv(|v| v.to_real::<T>())),
            Self::U16(a) => Ok(a.mapv(|v| v.to_real::<T>())),
            Self::F32(a) => Ok(a.mapv(|v| v.to_real::<T>())),
            Self::F64(a) => Ok(a.mapv(|v| v.to_real::<T>())),
            other => Err(HogError::UnsupportedSampleType(other.sample_type())),
        }
    }
}

pub(crate) fn check_channels(channels: usize) -> Result<()> {
    match channels {
        1 | 3 => Ok(()),
        n => Err(HogError::UnsupportedChannels(n)),
    }
}

fn interleaved<S: Clone>(raw: &[S], width: u32, height: u32, channels: usize) -> Result<Array3<S>> {
    Array3::from_shape_vec((height as usize, width as usize, channels), raw.to_vec()).map_err(
        |e| HogError::DimensionMismatch(format!("decoded image buffer: {e}")),
    )
}

impl TryFrom<&DynamicImage> for ImageData {
    type Error = HogError;

    /// Grey and RGB buffers keep their native sample type; alpha is dropped.
    fn try_from(img: &DynamicImage) -> Result<Self> {
        let (w, h) = (img.width(), img.height());
        let data = match img {
            DynamicImage::ImageLuma8(buf) => Self::U8(interleaved(buf.as_raw(), w, h, 1)?),
            DynamicImage::ImageLumaA8(_) => Self::U8(interleaved(img.to_luma8().as_raw(), w, h, 1)?),
            DynamicImage::ImageRgb8(buf) => Self::U8(interleaved(buf.as_raw(), w, h, 3)?),
            DynamicImage::ImageRgba8(_) => Self::U8(interleaved(img.to_rgb8().as_raw(), w, h, 3)?),
            DynamicImage::ImageLuma16(buf) => Self::U16(interleaved(buf.as_raw(), w, h, 1)?),
            DynamicImage::ImageLumaA16(_) => {
                Self::U16(interleaved(img.to_luma16().as_raw(), w, h, 1)?)
            }
            DynamicImage::ImageRgb16(buf) => Self::U16(interleaved(buf.as_raw(), w, h, 3)?),
            DynamicImage::ImageRgba16(_) => {
                Self::U16(interleaved(img.to_rgb16().as_raw(), w, h, 3)?)
            }
            DynamicImage::ImageRgb32F(buf) => Self::F32(interleaved(buf.as_raw(), w, h, 3)?),
            _ => Self::F32(interleaved(img.to_rgb32f().as_raw(), w, h, 3)?),
        };
        Ok(data)
    }
}
