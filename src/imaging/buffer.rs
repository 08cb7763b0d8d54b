//! In-memory pixel buffer shared by every image operation.
//!
//! A [`PixelBuffer`] owns its samples and always satisfies
//! `data.len() == width * height * mode.channels()`. Operations take a buffer
//! by reference or by value and hand back a new, valid buffer.
//!
//! The `image` crate only models luma/RGB families, so the extra modes
//! (YCbCr, CMYK, Lab, HSV, 1-bit) live here and are bridged to
//! [`DynamicImage`] only at the codec boundary.

use crate::error::TransformError;
use image::DynamicImage;
use std::fmt;

/// Sample layout of a [`PixelBuffer`]. All modes use 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorMode {
    /// Single luma channel (`L`).
    Greyscale,
    /// Bilevel image; one channel holding only 0 or 255.
    BlackAndWhite,
    /// Luma plus alpha (`LA`). Produced by decoders, never a conversion target.
    GreyscaleAlpha,
    Rgb,
    Rgba,
    /// Full-range JPEG YCbCr.
    YCbCr,
    Cmyk,
    /// CIE L*a*b* (D65), L scaled to 0..=255 and a/b offset by 128.
    Lab,
    Hsv,
}

impl ColorMode {
    /// Parse a configuration tag such as `"greyscale"` or `"cmyk"`.
    pub fn from_tag(tag: &str) -> Result<Self, TransformError> {
        match tag.to_ascii_lowercase().as_str() {
            "greyscale" | "grayscale" | "l" => Ok(ColorMode::Greyscale),
            "black_and_white" | "black-and-white" | "1" => Ok(ColorMode::BlackAndWhite),
            "rgb" => Ok(ColorMode::Rgb),
            "rgba" => Ok(ColorMode::Rgba),
            "ycbcr" => Ok(ColorMode::YCbCr),
            "cmyk" => Ok(ColorMode::Cmyk),
            "lab" => Ok(ColorMode::Lab),
            "hsv" => Ok(ColorMode::Hsv),
            _ => Err(TransformError::UnsupportedColorMode(tag.to_string())),
        }
    }

    pub fn channels(self) -> usize {
        match self {
            ColorMode::Greyscale | ColorMode::BlackAndWhite => 1,
            ColorMode::GreyscaleAlpha => 2,
            ColorMode::Rgb | ColorMode::YCbCr | ColorMode::Lab | ColorMode::Hsv => 3,
            ColorMode::Rgba | ColorMode::Cmyk => 4,
        }
    }

    /// Whether the last channel is an alpha channel.
    pub fn has_alpha(self) -> bool {
        matches!(self, ColorMode::GreyscaleAlpha | ColorMode::Rgba)
    }
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ColorMode::Greyscale => "greyscale",
            ColorMode::BlackAndWhite => "black-and-white",
            ColorMode::GreyscaleAlpha => "greyscale+alpha",
            ColorMode::Rgb => "RGB",
            ColorMode::Rgba => "RGBA",
            ColorMode::YCbCr => "YCbCr",
            ColorMode::Cmyk => "CMYK",
            ColorMode::Lab => "Lab",
            ColorMode::Hsv => "HSV",
        })
    }
}

/// An owned, decoded image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    mode: ColorMode,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap raw samples, checking dimensions against the sample count.
    pub fn new(
        width: u32,
        height: u32,
        mode: ColorMode,
        data: Vec<u8>,
    ) -> Result<Self, TransformError> {
        if width == 0 || height == 0 {
            return Err(TransformError::Failed(format!(
                "image dimensions must be non-zero, got {width}x{height}"
            )));
        }
        let expected = width as usize * height as usize * mode.channels();
        if data.len() != expected {
            return Err(TransformError::Failed(format!(
                "{width}x{height} {mode} buffer needs {expected} bytes, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            mode,
            data,
        })
    }

    /// A buffer where every pixel holds `pixel`.
    ///
    /// `pixel` must have exactly `mode.channels()` samples.
    pub fn filled(
        width: u32,
        height: u32,
        mode: ColorMode,
        pixel: &[u8],
    ) -> Result<Self, TransformError> {
        if pixel.len() != mode.channels() {
            return Err(TransformError::Failed(format!(
                "fill pixel for {mode} needs {} samples, got {}",
                mode.channels(),
                pixel.len()
            )));
        }
        let data = pixel.repeat(width as usize * height as usize);
        Self::new(width, height, mode, data)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn mode(&self) -> ColorMode {
        self.mode
    }

    pub fn channels(&self) -> usize {
        self.mode.channels()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable samples. The length is fixed, so the buffer stays consistent.
    pub(crate) fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Bytes in one row of pixels.
    pub fn stride(&self) -> usize {
        self.width as usize * self.channels()
    }

    /// Samples of the pixel at `(x, y)`, or `None` outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<&[u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let c = self.channels();
        let start = (y as usize * self.width as usize + x as usize) * c;
        self.data.get(start..start + c)
    }

    /// Take ownership of a decoded image, narrowing it to 8 bits per channel.
    pub fn from_dynamic(img: DynamicImage) -> Self {
        let (width, height) = (img.width(), img.height());
        let (mode, data) = match img {
            DynamicImage::ImageLuma8(b) => (ColorMode::Greyscale, b.into_raw()),
            DynamicImage::ImageLumaA8(b) => (ColorMode::GreyscaleAlpha, b.into_raw()),
            DynamicImage::ImageRgb8(b) => (ColorMode::Rgb, b.into_raw()),
            DynamicImage::ImageRgba8(b) => (ColorMode::Rgba, b.into_raw()),
            other => {
                let color = other.color();
                match (color.has_color(), color.has_alpha()) {
                    (true, true) => (ColorMode::Rgba, other.to_rgba8().into_raw()),
                    (true, false) => (ColorMode::Rgb, other.to_rgb8().into_raw()),
                    (false, true) => (ColorMode::GreyscaleAlpha, other.to_luma_alpha8().into_raw()),
                    (false, false) => (ColorMode::Greyscale, other.to_luma8().into_raw()),
                }
            }
        };
        Self {
            width,
            height,
            mode,
            data,
        }
    }

    /// Hand the samples to the `image` crate for encoding.
    ///
    /// Returns `None` for modes the `image` crate cannot represent.
    pub fn into_dynamic(self) -> Option<DynamicImage> {
        let (w, h) = (self.width, self.height);
        match self.mode {
            ColorMode::Greyscale | ColorMode::BlackAndWhite => {
                image::GrayImage::from_raw(w, h, self.data).map(DynamicImage::ImageLuma8)
            }
            ColorMode::GreyscaleAlpha => {
                image::GrayAlphaImage::from_raw(w, h, self.data).map(DynamicImage::ImageLumaA8)
            }
            ColorMode::Rgb => image::RgbImage::from_raw(w, h, self.data).map(DynamicImage::ImageRgb8),
            ColorMode::Rgba => {
                image::RgbaImage::from_raw(w, h, self.data).map(DynamicImage::ImageRgba8)
            }
            ColorMode::YCbCr | ColorMode::Cmyk | ColorMode::Lab | ColorMode::Hsv => None,
        }
    }
}
