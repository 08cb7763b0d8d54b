//! Shared test utilities for the mediamill test suite.
//!
//! Builders for pixel buffers, operation specs and file tasks, plus small
//! filesystem helpers for orchestrator tests.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let ops = spec("rotate = 90\nresize = { width = 10, height = 10 }");
//! let img = gradient_rgb(32, 16);
//! let t = task("in/a.png", "out/a.png", ops);
//! ```

use crate::config::{Config, parse_config};
use crate::imaging::{ColorMode, PixelBuffer};
use crate::types::{FileTask, OperationSpec};
use std::path::Path;
use std::sync::Arc;

// =========================================================================
// Pixel buffers
// =========================================================================

/// RGB image whose red channel ramps with x and green with y.
pub fn gradient_rgb(width: u32, height: u32) -> PixelBuffer {
    let span = |n: u32| n.saturating_sub(1).max(1);
    let mut data = Vec::with_capacity((width * height * 3) as usize);
    for y in 0..height {
        for x in 0..width {
            data.push((x * 255 / span(width)) as u8);
            data.push((y * 255 / span(height)) as u8);
            data.push(((x + y) % 256) as u8);
        }
    }
    PixelBuffer::new(width, height, ColorMode::Rgb, data).unwrap()
}

/// Single-color image in any mode. `pixel` must have one byte per channel.
pub fn solid(width: u32, height: u32, mode: ColorMode, pixel: &[u8]) -> PixelBuffer {
    PixelBuffer::filled(width, height, mode, pixel).unwrap()
}

// =========================================================================
// Specs and tasks
// =========================================================================

/// Parse TOML key/value lines into an ordered operation spec.
pub fn spec(toml_src: &str) -> OperationSpec {
    let table: toml::Table = toml::from_str(toml_src)
        .unwrap_or_else(|e| panic!("bad test spec {toml_src:?}: {e}"));
    table.into_iter().collect()
}

/// An image task at index 1.
pub fn task(input: impl AsRef<Path>, output: impl AsRef<Path>, ops: OperationSpec) -> FileTask {
    FileTask {
        index: 1,
        input: input.as_ref().to_path_buf(),
        output: output.as_ref().to_path_buf(),
        media_type: "image".to_string(),
        operations: Arc::new(ops),
    }
}

// =========================================================================
// Filesystem
// =========================================================================

/// Write `bytes` to `path`, creating parent directories.
pub fn write_file(path: &Path, bytes: &[u8]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, bytes).unwrap();
}

/// Encode a `width`x`height` gradient as PNG at `path`, whatever its extension.
pub fn write_png(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    gradient_rgb(width, height)
        .into_dynamic()
        .unwrap()
        .save_with_format(path, image::ImageFormat::Png)
        .unwrap();
}

/// Parse `media_sections` and point the run at `input` / `output`.
/// Skips validation, so `output` need not exist.
pub fn test_config(input: &Path, output: &Path, media_sections: &str) -> Config {
    let mut config = parse_config(media_sections).unwrap();
    config.main.input_dir = input.to_path_buf();
    config.main.output_dir = output.to_path_buf();
    config
}
