//! Reading and writing image files.
//!
//! Decoding sniffs the content rather than trusting the extension, so a
//! mislabelled file still loads and a corrupt one fails cleanly. Encoding picks
//! the container from the output extension and checks up front that it can
//! hold the buffer's color mode:
//!
//! | Extension | Greyscale / B&W | LA | RGB | RGBA |
//! |---|---|---|---|---|
//! | png, ico | yes | yes | yes | yes |
//! | jpg, jpeg | yes | | yes | |
//! | bmp, dib | yes | | yes | yes |
//!
//! YCbCr, CMYK, Lab and HSV buffers must be converted before saving.

use super::buffer::{ColorMode, PixelBuffer};
use crate::error::{LoadError, SaveError};
use crate::pipeline::{Loader, Saver, lowercase_extension};
use image::{ImageError, ImageFormat, ImageReader};
use std::fs;
use std::io::Cursor;
use std::path::Path;

/// Load stage of the image pipeline.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageLoader;

impl Loader for ImageLoader {
    type Item = PixelBuffer;

    fn load(&self, path: &Path) -> Result<PixelBuffer, LoadError> {
        let io_err = |source: std::io::Error| match source.kind() {
            std::io::ErrorKind::NotFound => LoadError::NotFound(path.to_path_buf()),
            _ => LoadError::Io {
                path: path.to_path_buf(),
                source,
            },
        };
        let reader = ImageReader::open(path)
            .map_err(io_err)?
            .with_guessed_format()
            .map_err(io_err)?;
        if reader.format().is_none() {
            return Err(LoadError::UnsupportedFormat(path.to_path_buf()));
        }
        let img = reader.decode().map_err(|e| match e {
            ImageError::Unsupported(_) => LoadError::UnsupportedFormat(path.to_path_buf()),
            ImageError::IoError(source) => LoadError::Io {
                path: path.to_path_buf(),
                source,
            },
            other => LoadError::Decode {
                path: path.to_path_buf(),
                reason: other.to_string(),
            },
        })?;
        Ok(PixelBuffer::from_dynamic(img))
    }
}

/// Output container for an extension, if it can be encoded.
pub fn output_format(extension: &str) -> Option<ImageFormat> {
    match extension {
        "png" => Some(ImageFormat::Png),
        "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
        "bmp" | "dib" => Some(ImageFormat::Bmp),
        "ico" => Some(ImageFormat::Ico),
        _ => None,
    }
}

fn can_store(format: ImageFormat, mode: ColorMode) -> bool {
    use ColorMode::*;
    match format {
        ImageFormat::Png | ImageFormat::Ico => {
            matches!(mode, Greyscale | BlackAndWhite | GreyscaleAlpha | Rgb | Rgba)
        }
        ImageFormat::Jpeg => matches!(mode, Greyscale | BlackAndWhite | Rgb),
        ImageFormat::Bmp => matches!(mode, Greyscale | BlackAndWhite | Rgb | Rgba),
        _ => false,
    }
}

/// Save stage of the image pipeline.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageSaver;

impl Saver for ImageSaver {
    type Item = PixelBuffer;

    fn save(&self, buffer: PixelBuffer, path: &Path) -> Result<(), SaveError> {
        let extension = lowercase_extension(path);
        let format =
            output_format(&extension).ok_or_else(|| SaveError::UnsupportedFormat(extension.clone()))?;
        let mode = buffer.mode();
        if !can_store(format, mode) {
            return Err(SaveError::UnsupportedColorMode {
                mode,
                format: extension,
            });
        }
        let img = buffer.into_dynamic().ok_or(SaveError::UnsupportedColorMode {
            mode,
            format: extension,
        })?;

        // Encode fully before touching the filesystem so a failure leaves nothing behind.
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), format)
            .map_err(|e| SaveError::Encode {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        fs::write(path, bytes).map_err(|source| SaveError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}
