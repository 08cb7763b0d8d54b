//! Color-mode conversion.
//!
//! Every conversion goes through 8-bit RGBA: the source pixel is decoded to
//! RGBA and re-encoded in the target mode. The one exception is
//! black-and-white, which needs neighbourhood information for
//! Floyd–Steinberg dithering and so runs over the whole luma plane.
//!
//! Converting to the buffer's current mode returns it unchanged, which makes
//! every conversion idempotent.
//!
//! | Mode | Channels | Encoding |
//! |---|---|---|
//! | greyscale | L | ITU-R 601 luma |
//! | black-and-white | L | 0 or 255, dithered |
//! | YCbCr | Y Cb Cr | JPEG full range |
//! | CMYK | C M Y K | naive inversion, K = 0 |
//! | Lab | L a b | D65, L scaled to 0-255, a/b offset by 128 |
//! | HSV | H S V | all three scaled to 0-255 |

use super::buffer::{ColorMode, PixelBuffer};
use crate::error::TransformError;

/// Re-encode `buffer` in `target` mode.
pub fn convert(buffer: &PixelBuffer, target: ColorMode) -> Result<PixelBuffer, TransformError> {
    if buffer.mode() == target {
        return Ok(buffer.clone());
    }
    let (width, height) = buffer.dimensions();

    if target == ColorMode::BlackAndWhite {
        let luma: Vec<u8> = match buffer.mode() {
            ColorMode::Greyscale => buffer.data().to_vec(),
            mode => buffer
                .data()
                .chunks_exact(mode.channels())
                .map(|px| {
                    let [r, g, b, _] = to_rgba(mode, px);
                    luma(r, g, b)
                })
                .collect(),
        };
        return PixelBuffer::new(width, height, target, dither(&luma, width as usize));
    }

    let source = buffer.mode();
    let mut data = Vec::with_capacity(width as usize * height as usize * target.channels());
    for px in buffer.data().chunks_exact(source.channels()) {
        push_encoded(&mut data, target, to_rgba(source, px));
    }
    PixelBuffer::new(width, height, target, data)
}

/// ITU-R 601-2 luma, rounded.
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((299 * r as u32 + 587 * g as u32 + 114 * b as u32 + 500) / 1000) as u8
}

fn clamp_u8(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Decode one pixel of `mode` into RGBA.
fn to_rgba(mode: ColorMode, px: &[u8]) -> [u8; 4] {
    match mode {
        ColorMode::Greyscale | ColorMode::BlackAndWhite => [px[0], px[0], px[0], 255],
        ColorMode::GreyscaleAlpha => [px[0], px[0], px[0], px[1]],
        ColorMode::Rgb => [px[0], px[1], px[2], 255],
        ColorMode::Rgba => [px[0], px[1], px[2], px[3]],
        ColorMode::YCbCr => {
            let (y, cb, cr) = (px[0] as f64, px[1] as f64 - 128.0, px[2] as f64 - 128.0);
            [
                clamp_u8(y + 1.402 * cr),
                clamp_u8(y - 0.344136 * cb - 0.714136 * cr),
                clamp_u8(y + 1.772 * cb),
                255,
            ]
        }
        ColorMode::Cmyk => {
            let k = 255 - px[3] as u32;
            let channel = |v: u8| (((255 - v as u32) * k + 127) / 255) as u8;
            [channel(px[0]), channel(px[1]), channel(px[2]), 255]
        }
        ColorMode::Lab => {
            let [r, g, b] = lab_to_rgb(px[0], px[1], px[2]);
            [r, g, b, 255]
        }
        ColorMode::Hsv => {
            let [r, g, b] = hsv_to_rgb(px[0], px[1], px[2]);
            [r, g, b, 255]
        }
    }
}

/// Append `rgba` encoded in `mode` to `out`.
fn push_encoded(out: &mut Vec<u8>, mode: ColorMode, [r, g, b, a]: [u8; 4]) {
    match mode {
        ColorMode::Greyscale | ColorMode::BlackAndWhite => out.push(luma(r, g, b)),
        ColorMode::GreyscaleAlpha => out.extend_from_slice(&[luma(r, g, b), a]),
        ColorMode::Rgb => out.extend_from_slice(&[r, g, b]),
        ColorMode::Rgba => out.extend_from_slice(&[r, g, b, a]),
        ColorMode::YCbCr => {
            let (r, g, b) = (r as f64, g as f64, b as f64);
            out.extend_from_slice(&[
                clamp_u8(0.299 * r + 0.587 * g + 0.114 * b),
                clamp_u8(128.0 - 0.168736 * r - 0.331264 * g + 0.5 * b),
                clamp_u8(128.0 + 0.5 * r - 0.418688 * g - 0.081312 * b),
            ]);
        }
        ColorMode::Cmyk => out.extend_from_slice(&[255 - r, 255 - g, 255 - b, 0]),
        ColorMode::Lab => out.extend_from_slice(&rgb_to_lab(r, g, b)),
        ColorMode::Hsv => out.extend_from_slice(&rgb_to_hsv(r, g, b)),
    }
}

/// Floyd–Steinberg dither of a luma plane to 0/255.
fn dither(luma: &[u8], width: usize) -> Vec<u8> {
    let mut work: Vec<i32> = luma.iter().map(|&v| v as i32).collect();
    let mut out = vec![0u8; luma.len()];
    let height = luma.len() / width;
    for y in 0..height {
        for x in 0..width {
            let i = y * width + x;
            let old = work[i].clamp(0, 255);
            let new = if old >= 128 { 255 } else { 0 };
            out[i] = new as u8;
            let err = old - new;
            if x + 1 < width {
                work[i + 1] += err * 7 / 16;
            }
            if y + 1 < height {
                if x > 0 {
                    work[i + width - 1] += err * 3 / 16;
                }
                work[i + width] += err * 5 / 16;
                if x + 1 < width {
                    work[i + width + 1] += err / 16;
                }
            }
        }
    }
    out
}

// =============================================================================
// CIE L*a*b* (sRGB primaries, D65 white)
// =============================================================================

const WHITE: [f64; 3] = [0.95047, 1.0, 1.08883];
const EPSILON: f64 = 6.0 / 29.0;

fn srgb_to_linear(c: u8) -> f64 {
    let c = c as f64 / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn linear_to_srgb(c: f64) -> u8 {
    let c = if c <= 0.0031308 {
        12.92 * c
    } else {
        1.055 * c.max(0.0).powf(1.0 / 2.4) - 0.055
    };
    clamp_u8(c * 255.0)
}

fn lab_f(t: f64) -> f64 {
    if t > EPSILON.powi(3) {
        t.cbrt()
    } else {
        t / (3.0 * EPSILON * EPSILON) + 4.0 / 29.0
    }
}

fn lab_f_inv(t: f64) -> f64 {
    if t > EPSILON {
        t.powi(3)
    } else {
        3.0 * EPSILON * EPSILON * (t - 4.0 / 29.0)
    }
}

fn rgb_to_lab(r: u8, g: u8, b: u8) -> [u8; 3] {
    let (r, g, b) = (srgb_to_linear(r), srgb_to_linear(g), srgb_to_linear(b));
    let x = 0.4124564 * r + 0.3575761 * g + 0.1804375 * b;
    let y = 0.2126729 * r + 0.7151522 * g + 0.0721750 * b;
    let z = 0.0193339 * r + 0.1191920 * g + 0.9503041 * b;

    let fx = lab_f(x / WHITE[0]);
    let fy = lab_f(y / WHITE[1]);
    let fz = lab_f(z / WHITE[2]);

    let l = 116.0 * fy - 16.0;
    let a = 500.0 * (fx - fy);
    let bb = 200.0 * (fy - fz);
    [clamp_u8(l * 255.0 / 100.0), clamp_u8(a + 128.0), clamp_u8(bb + 128.0)]
}

fn lab_to_rgb(l: u8, a: u8, b: u8) -> [u8; 3] {
    let l = l as f64 * 100.0 / 255.0;
    let (a, b) = (a as f64 - 128.0, b as f64 - 128.0);

    let fy = (l + 16.0) / 116.0;
    let x = WHITE[0] * lab_f_inv(fy + a / 500.0);
    let y = WHITE[1] * lab_f_inv(fy);
    let z = WHITE[2] * lab_f_inv(fy - b / 200.0);

    [
        linear_to_srgb(3.2404542 * x - 1.5371385 * y - 0.4985314 * z),
        linear_to_srgb(-0.9692660 * x + 1.8760108 * y + 0.0415560 * z),
        linear_to_srgb(0.0556434 * x - 0.2040259 * y + 1.0572252 * z),
    ]
}

// =============================================================================
// HSV, every component on a 0-255 scale
// =============================================================================

fn rgb_to_hsv(r: u8, g: u8, b: u8) -> [u8; 3] {
    let (rf, gf, bf) = (r as f64, g as f64, b as f64);
    let max = rf.max(gf).max(bf);
    let min = rf.min(gf).min(bf);
    let delta = max - min;

    let s = if max == 0.0 { 0.0 } else { delta * 255.0 / max };
    let h = if delta == 0.0 {
        0.0
    } else if max == rf {
        ((gf - bf) / delta).rem_euclid(6.0)
    } else if max == gf {
        (bf - rf) / delta + 2.0
    } else {
        (rf - gf) / delta + 4.0
    };
    // h is in sextants [0, 6); a full turn wraps back to 0.
    let h = (h * 255.0 / 6.0).round() as u32 % 256;
    [h as u8, clamp_u8(s), max as u8]
}

fn hsv_to_rgb(h: u8, s: u8, v: u8) -> [u8; 3] {
    if s == 0 {
        return [v, v, v];
    }
    let h = h as f64 * 6.0 / 255.0;
    let s = s as f64 / 255.0;
    let v = v as f64;

    let sector = h.floor();
    let f = h - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    let (r, g, b) = match sector as u32 % 6 {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    [clamp_u8(r), clamp_u8(g), clamp_u8(b)]
}
