//! Geometric operations: resize (four methods), crop, paste, rotate.
//!
//! Scaling is delegated to `fast_image_resize`; everything else is plain
//! row copying over [`PixelBuffer`] samples. Dimension math lives in
//! [`calculations`](super::calculations) so it can be tested without pixels.

use super::buffer::{ColorMode, PixelBuffer};
use super::calculations::{
    calculate_crop_origin, calculate_fill_dimensions, calculate_fit_dimensions,
    calculate_paste_position,
};
use super::color;
use super::params::{ResizeMethod, ResizeParams, Resampling};
use crate::error::TransformError;
use fast_image_resize as fr;

/// Resize according to `params.method`.
///
/// | Method | Output size |
/// |---|---|
/// | `stretch` | exactly the target |
/// | `fit` | inside the target, aspect kept |
/// | `fill` | exactly the target, overflow cropped at `offset` |
/// | `fit_expand` | exactly the target, RGB canvas padded at `offset` |
pub fn resize(buffer: &PixelBuffer, params: &ResizeParams) -> Result<PixelBuffer, TransformError> {
    let target = params.target();
    match params.method {
        ResizeMethod::Stretch => scale(buffer, target, params.resampling),
        ResizeMethod::Fit => {
            let dims = calculate_fit_dimensions(buffer.dimensions(), target);
            scale(buffer, dims, params.resampling)
        }
        ResizeMethod::Fill => {
            // Map the crop window back into source pixels and resample only
            // that, so the full cover size is never allocated.
            let (src_w, src_h) = buffer.dimensions();
            if (src_w, src_h) == target {
                return Ok(buffer.clone());
            }
            let dims = calculate_fill_dimensions((src_w, src_h), target);
            let (left, top) = calculate_crop_origin(dims, target, params.offset.as_tuple());
            let kx = src_w as f64 / dims.0 as f64;
            let ky = src_h as f64 / dims.1 as f64;
            let window = SourceWindow {
                left: left as f64 * kx,
                top: top as f64 * ky,
                width: target.0 as f64 * kx,
                height: target.1 as f64 * ky,
            };
            resample(buffer, target, params.resampling, Some(window))
        }
        ResizeMethod::FitExpand => {
            // The expand path always scales with Lanczos, whatever was requested.
            let dims = calculate_fit_dimensions(buffer.dimensions(), target);
            let scaled = scale(buffer, dims, Resampling::Lanczos)?;
            let scaled = color::convert(&scaled, ColorMode::Rgb)?;
            let mut canvas = PixelBuffer::filled(target.0, target.1, ColorMode::Rgb, &params.color)?;
            let (x, y) = calculate_paste_position(target, dims, params.offset.as_tuple());
            paste(&mut canvas, &scaled, x, y);
            Ok(canvas)
        }
    }
}

/// Scale to exactly `(width, height)` with the given filter.
pub fn scale(
    buffer: &PixelBuffer,
    size: (u32, u32),
    resampling: Resampling,
) -> Result<PixelBuffer, TransformError> {
    if buffer.dimensions() == size {
        return Ok(buffer.clone());
    }
    resample(buffer, size, resampling, None)
}

/// Sub-pixel source rectangle handed to the resizer.
#[derive(Debug, Clone, Copy)]
struct SourceWindow {
    left: f64,
    top: f64,
    width: f64,
    height: f64,
}

fn resample(
    buffer: &PixelBuffer,
    (width, height): (u32, u32),
    resampling: Resampling,
    window: Option<SourceWindow>,
) -> Result<PixelBuffer, TransformError> {
    let pixel_type = match buffer.channels() {
        1 => fr::PixelType::U8,
        2 => fr::PixelType::U8x2,
        3 => fr::PixelType::U8x3,
        _ => fr::PixelType::U8x4,
    };
    // Interpolating a bilevel image would invent grey levels.
    let alg = match buffer.mode() {
        ColorMode::BlackAndWhite => fr::ResizeAlg::Nearest,
        _ => resampling.resize_alg(),
    };

    let src = fr::images::Image::from_vec_u8(
        buffer.width(),
        buffer.height(),
        buffer.data().to_vec(),
        pixel_type,
    )
    .map_err(|e| TransformError::Failed(format!("failed to wrap source pixels: {e}")))?;
    let mut dst = fr::images::Image::new(width, height, pixel_type);

    let mut options = fr::ResizeOptions::new()
        .resize_alg(alg)
        .use_alpha(buffer.mode().has_alpha());
    if let Some(w) = window {
        options = options.crop(w.left, w.top, w.width, w.height);
    }
    fr::Resizer::new()
        .resize(&src, &mut dst, Some(&options))
        .map_err(|e| TransformError::Failed(format!("resize failed: {e}")))?;

    PixelBuffer::new(width, height, buffer.mode(), dst.into_vec())
}

/// Copy out a `width x height` window whose top-left corner is `(left, top)`.
pub fn crop(
    buffer: &PixelBuffer,
    left: u32,
    top: u32,
    width: u32,
    height: u32,
) -> Result<PixelBuffer, TransformError> {
    if left + width > buffer.width() || top + height > buffer.height() {
        return Err(TransformError::Failed(format!(
            "crop window {width}x{height}+{left}+{top} exceeds {}x{} image",
            buffer.width(),
            buffer.height()
        )));
    }
    let c = buffer.channels();
    let stride = buffer.stride();
    let row_len = width as usize * c;
    let mut data = Vec::with_capacity(row_len * height as usize);
    for y in top..top + height {
        let start = y as usize * stride + left as usize * c;
        data.extend_from_slice(&buffer.data()[start..start + row_len]);
    }
    PixelBuffer::new(width, height, buffer.mode(), data)
}

/// Paste `image` onto `canvas` at `(x, y)`, clipping at the canvas edge.
///
/// Both buffers must share a color mode.
fn paste(canvas: &mut PixelBuffer, image: &PixelBuffer, x: u32, y: u32) {
    debug_assert_eq!(canvas.mode(), image.mode());
    let c = canvas.channels();
    let canvas_stride = canvas.stride();
    let (canvas_w, canvas_h) = canvas.dimensions();
    let visible_w = image.width().min(canvas_w.saturating_sub(x)) as usize;
    let visible_h = image.height().min(canvas_h.saturating_sub(y));
    let row_len = visible_w * c;
    for row in 0..visible_h {
        let src_start = row as usize * image.stride();
        let dst_start = (y + row) as usize * canvas_stride + x as usize * c;
        canvas.data_mut()[dst_start..dst_start + row_len]
            .copy_from_slice(&image.data()[src_start..src_start + row_len]);
    }
}

/// Rotate counter-clockwise by `degrees` about the image centre.
///
/// The canvas keeps its size: corners that leave the frame are cropped and
/// uncovered area is filled with zero samples. Sampling is nearest-neighbour,
/// so multiples of 90 degrees on a square image are lossless.
pub fn rotate(buffer: &PixelBuffer, degrees: u32) -> Result<PixelBuffer, TransformError> {
    if degrees % 360 == 0 {
        return Ok(buffer.clone());
    }

    let theta = (degrees as f64).to_radians();
    // Snap sin/cos so that 90/180/270 map pixel centres exactly.
    let snap = |v: f64| (v * 1e15).round() / 1e15;
    let (sin, cos) = (snap(theta.sin()), snap(theta.cos()));

    let (w, h) = buffer.dimensions();
    let (cx, cy) = (w as f64 / 2.0, h as f64 / 2.0);
    let c = buffer.channels();
    let src = buffer.data();
    let stride = buffer.stride();

    let mut out = PixelBuffer::filled(w, h, buffer.mode(), &vec![0u8; c])?;
    let data = out.data_mut();
    for y in 0..h {
        let dy = y as f64 + 0.5 - cy;
        for x in 0..w {
            let dx = x as f64 + 0.5 - cx;
            let sx = (cos * dx - sin * dy + cx).floor();
            let sy = (sin * dx + cos * dy + cy).floor();
            if sx < 0.0 || sy < 0.0 || sx >= w as f64 || sy >= h as f64 {
                continue;
            }
            let src_start = sy as usize * stride + sx as usize * c;
            let dst_start = y as usize * stride + x as usize * c;
            data[dst_start..dst_start + c].copy_from_slice(&src[src_start..src_start + c]);
        }
    }
    Ok(out)
}
