//! Per-pixel enhancement: color balance, contrast, brightness, sharpness.
//!
//! Each kind builds a *degenerate* version of the image and blends:
//! `out = degenerate + (image - degenerate) * factor`. A factor of 1.0 gives
//! back the image, 0.0 gives the degenerate image, and larger values push
//! further away from it.
//!
//! | Kind | Degenerate image |
//! |---|---|
//! | color balance | greyscale version |
//! | contrast | flat grey at the mean luma |
//! | brightness | black |
//! | sharpness | 3x3 smoothed version |
//!
//! Alpha is never blended.

use super::buffer::{ColorMode, PixelBuffer};
use super::color::{self, luma};
use crate::error::TransformError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnhanceKind {
    ColorBalance,
    Contrast,
    Brightness,
    Sharpness,
}

impl EnhanceKind {
    /// Configuration key of this enhancement.
    pub fn name(self) -> &'static str {
        match self {
            EnhanceKind::ColorBalance => "color_balance",
            EnhanceKind::Contrast => "contrast",
            EnhanceKind::Brightness => "brightness",
            EnhanceKind::Sharpness => "sharpness",
        }
    }
}

/// Apply one enhancement.
///
/// Modes outside L/LA/RGB/RGBA are enhanced in RGB and converted back.
pub fn enhance(
    buffer: &PixelBuffer,
    kind: EnhanceKind,
    factor: f32,
) -> Result<PixelBuffer, TransformError> {
    match buffer.mode() {
        ColorMode::Greyscale | ColorMode::GreyscaleAlpha | ColorMode::Rgb | ColorMode::Rgba => {
            let degenerate = degenerate(buffer, kind);
            let data = blend(&degenerate, buffer.data(), factor);
            PixelBuffer::new(buffer.width(), buffer.height(), buffer.mode(), data)
        }
        mode => {
            let rgb = color::convert(buffer, ColorMode::Rgb)?;
            let enhanced = enhance(&rgb, kind, factor)?;
            color::convert(&enhanced, mode)
        }
    }
}

fn blend(degenerate: &[u8], image: &[u8], factor: f32) -> Vec<u8> {
    degenerate
        .iter()
        .zip(image)
        .map(|(&d, &i)| {
            let d = d as f32;
            (d + (i as f32 - d) * factor).round().clamp(0.0, 255.0) as u8
        })
        .collect()
}

fn pixel_luma(px: &[u8], color_channels: usize) -> u8 {
    if color_channels == 3 {
        luma(px[0], px[1], px[2])
    } else {
        px[0]
    }
}

/// Build the degenerate image in the buffer's own layout, alpha copied through.
fn degenerate(buffer: &PixelBuffer, kind: EnhanceKind) -> Vec<u8> {
    let c = buffer.channels();
    let color_channels = if buffer.mode().has_alpha() { c - 1 } else { c };
    let mut out = buffer.data().to_vec();

    match kind {
        EnhanceKind::ColorBalance => {
            for px in out.chunks_exact_mut(c) {
                let l = pixel_luma(px, color_channels);
                px[..color_channels].fill(l);
            }
        }
        EnhanceKind::Contrast => {
            let pixels = buffer.width() as u64 * buffer.height() as u64;
            let sum: u64 = buffer
                .data()
                .chunks_exact(c)
                .map(|px| pixel_luma(px, color_channels) as u64)
                .sum();
            let mean = ((sum + pixels / 2) / pixels) as u8;
            for px in out.chunks_exact_mut(c) {
                px[..color_channels].fill(mean);
            }
        }
        EnhanceKind::Brightness => {
            for px in out.chunks_exact_mut(c) {
                px[..color_channels].fill(0);
            }
        }
        EnhanceKind::Sharpness => smooth(buffer, color_channels, &mut out),
    }
    out
}

/// 3x3 smoothing kernel `[1 1 1; 1 5 1; 1 1 1] / 13`; the one-pixel border is
/// left as is.
fn smooth(buffer: &PixelBuffer, color_channels: usize, out: &mut [u8]) {
    let (w, h) = (buffer.width() as usize, buffer.height() as usize);
    if w < 3 || h < 3 {
        return;
    }
    let c = buffer.channels();
    let src = buffer.data();
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            for ch in 0..color_channels {
                let mut acc = 0u32;
                for ky in 0..3 {
                    for kx in 0..3 {
                        let v = src[((y + ky - 1) * w + (x + kx - 1)) * c + ch] as u32;
                        acc += if kx == 1 && ky == 1 { v * 5 } else { v };
                    }
                }
                out[(y * w + x) * c + ch] = ((acc + 6) / 13) as u8;
            }
        }
    }
}
