//! Image processing: pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode / encode** | `image` (bmp, ico, jpeg, png) |
//! | **Scale** | `fast_image_resize` (nearest, box, bilinear, hamming, bicubic, lanczos) |
//! | **Crop / pad / rotate** | row copies over [`PixelBuffer`] |
//! | **Color modes** | per-pixel re-encoding through RGBA |
//! | **Enhance** | blend against a degenerate image |
//!
//! The module is split into:
//! - **Buffer**: [`PixelBuffer`] and [`ColorMode`]
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Resize parameters decoded from configuration values
//! - **Geometry / Color / Enhance**: the pixel algorithms
//! - **Operations**: [`Operation`] decoding and the transform fold
//! - **Codec**: [`ImageLoader`] and [`ImageSaver`] pipeline stages

mod buffer;
mod calculations;
mod codec;
pub mod color;
pub mod enhance;
pub mod geometry;
pub mod operations;
mod params;

pub use buffer::{ColorMode, PixelBuffer};
pub use calculations::{
    calculate_crop_origin, calculate_fill_dimensions, calculate_fit_dimensions,
    calculate_paste_position,
};
pub use codec::{ImageLoader, ImageSaver, output_format};
pub use enhance::EnhanceKind;
pub use operations::{ImageTransformer, Operation, apply_operations, decode_operations};
pub use params::{MAX_EDGE, Offset, ResizeMethod, ResizeParams, Resampling};
