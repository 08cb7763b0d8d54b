//! Run configuration.
//!
//! Handles loading, splitting and validating `config.toml`. The `[main]`
//! section holds run-wide switches; every other top-level table is a media
//! type section whose `input_exts` / `output_ext` keys select and rename
//! files, and whose remaining keys, in declaration order, are the operations
//! applied to them.
//!
//! ## Configuration Options
//!
//! ```toml
//! [main]                      # All keys optional - defaults shown
//! input_dir = "input"
//! output_dir = "output"
//! clean_output_dir = false    # Empty the output directory before the run
//! recursive = true            # Descend into subdirectories
//! overwrite_files = true      # Replace outputs that already exist
//! copy_other_files = true     # Copy files no media section matches
//! ignore_errors = true        # Log per-file failures and keep going
//! threads = 1                 # Worker threads (1 = sequential)
//!
//! [image]
//! input_exts = ["bmp", "png"] # Or "all"
//! output_ext = "png"          # Or "native" to keep the input extension
//! rotate = 90                 # Operations, applied top to bottom
//! resize = { width = 100, height = 50, method = "fit" }
//! ```
//!
//! ## Section Order
//!
//! The `toml` crate is built with `preserve_order`, so sections keep file
//! order. When two sections accept the same extension, the one declared first
//! wins. If no `[image]` section is declared, one accepting every image
//! extension with `output_ext = "native"` is appended.
//!
//! Unknown keys in `[main]` are rejected to catch typos early. Unknown keys in
//! a media section are operations and are reported by `check` or when the
//! first matching file is transformed.

use crate::dispatch::MediaType;
use crate::types::OperationSpec;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use toml::Value;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Run-wide settings from `[main]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MainConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub clean_output_dir: bool,
    pub recursive: bool,
    pub overwrite_files: bool,
    pub copy_other_files: bool,
    pub ignore_errors: bool,
    /// Files processed concurrently. 1 is the plain sequential loop.
    pub threads: usize,
}

impl Default for MainConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("input"),
            output_dir: PathBuf::from("output"),
            clean_output_dir: false,
            recursive: true,
            overwrite_files: true,
            copy_other_files: true,
            ignore_errors: true,
            threads: 1,
        }
    }
}

/// Target extension for a media section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputExt {
    /// Keep the (lower-cased) input extension.
    Native,
    Extension(String),
}

impl OutputExt {
    pub fn resolve<'a>(&'a self, input_ext: &'a str) -> &'a str {
        match self {
            OutputExt::Native => input_ext,
            OutputExt::Extension(ext) => ext,
        }
    }
}

/// One media-type section.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaConfig {
    /// Section name, used as the media-type tag for dispatch.
    pub name: String,
    /// Accepted extensions, lower-case, no dot.
    pub input_exts: Vec<String>,
    pub output_ext: OutputExt,
    pub operations: Arc<OperationSpec>,
}

impl MediaConfig {
    pub fn accepts(&self, extension: &str) -> bool {
        self.input_exts.iter().any(|e| e == extension)
    }
}

/// A parsed configuration: base settings plus media sections in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub main: MainConfig,
    pub media: Vec<MediaConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            main: MainConfig::default(),
            media: vec![default_image_section()],
        }
    }
}

fn default_image_section() -> MediaConfig {
    MediaConfig {
        name: MediaType::Image.tag().to_string(),
        input_exts: all_extensions(MediaType::Image),
        output_ext: OutputExt::Native,
        operations: Arc::default(),
    }
}

fn all_extensions(media: MediaType) -> Vec<String> {
    media
        .supported_extensions()
        .iter()
        .map(|e| e.to_string())
        .collect()
}

/// Lower-case and strip a leading dot.
pub fn normalize_extension(ext: &str) -> String {
    ext.trim_start_matches('.').to_ascii_lowercase()
}

fn parse_input_exts(section: &str, value: Option<&Value>) -> Result<Vec<String>, ConfigError> {
    let invalid = || {
        ConfigError::Validation(format!(
            "{section}.input_exts must be \"all\", an extension, or a list of extensions"
        ))
    };
    let exts = match value {
        None => return expand_all(section),
        Some(Value::String(s)) if s.eq_ignore_ascii_case("all") => return expand_all(section),
        Some(Value::String(s)) => vec![normalize_extension(s)],
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| v.as_str().map(normalize_extension).ok_or_else(invalid))
            .collect::<Result<_, _>>()?,
        Some(_) => return Err(invalid()),
    };
    Ok(exts)
}

fn expand_all(section: &str) -> Result<Vec<String>, ConfigError> {
    MediaType::from_tag(section)
        .map(all_extensions)
        .map_err(|_| {
            ConfigError::Validation(format!(
                "{section}.input_exts cannot be \"all\": '{section}' has no known extension set"
            ))
        })
}

fn parse_output_ext(section: &str, value: Option<&Value>) -> Result<OutputExt, ConfigError> {
    match value {
        None => Ok(OutputExt::Native),
        Some(Value::String(s)) if s.eq_ignore_ascii_case("native") => Ok(OutputExt::Native),
        Some(Value::String(s)) => Ok(OutputExt::Extension(normalize_extension(s))),
        Some(_) => Err(ConfigError::Validation(format!(
            "{section}.output_ext must be a string"
        ))),
    }
}

/// Split a media section into base settings and its operation sequence.
fn parse_media_section(name: &str, value: Value) -> Result<MediaConfig, ConfigError> {
    let Value::Table(table) = value else {
        return Err(ConfigError::Validation(format!(
            "[{name}] must be a table"
        )));
    };
    let input_exts = parse_input_exts(name, table.get("input_exts"))?;
    let output_ext = parse_output_ext(name, table.get("output_ext"))?;
    let operations = table
        .into_iter()
        .filter(|(key, _)| key != "input_exts" && key != "output_ext")
        .collect::<OperationSpec>();
    Ok(MediaConfig {
        name: name.to_string(),
        input_exts,
        output_ext,
        operations: Arc::new(operations),
    })
}

/// Parse config text without touching the filesystem.
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let table: toml::Table = toml::from_str(content)?;
    let mut main = MainConfig::default();
    let mut media = Vec::new();
    for (name, value) in table {
        if name == "main" {
            main = value.try_into()?;
        } else {
            media.push(parse_media_section(&name, value)?);
        }
    }
    if !media.iter().any(|m| m.name == MediaType::Image.tag()) {
        media.push(default_image_section());
    }
    Ok(Config { main, media })
}

/// Load, parse and validate a config file.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Check directories, thread count and extension sets.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let main = &self.main;
        if !main.input_dir.is_dir() {
            return Err(ConfigError::Validation(format!(
                "input_dir {} is not a directory",
                main.input_dir.display()
            )));
        }
        let input = main.input_dir.canonicalize()?;
        let output = resolve_missing(&main.output_dir)?;
        // Either nesting makes the walk see its own outputs.
        if input.starts_with(&output) || output.starts_with(&input) {
            return Err(ConfigError::Validation(format!(
                "output_dir {} must not overlap input_dir {}",
                main.output_dir.display(),
                main.input_dir.display()
            )));
        }
        if main.threads == 0 {
            return Err(ConfigError::Validation("threads must be at least 1".into()));
        }

        for section in &self.media {
            // Unknown media types fail at dispatch, per file.
            let Ok(media_type) = MediaType::from_tag(&section.name) else {
                continue;
            };
            let supported = media_type.supported_extensions();
            if let Some(bad) = section
                .input_exts
                .iter()
                .find(|e| !supported.contains(&e.as_str()))
            {
                return Err(ConfigError::Validation(format!(
                    "{}.input_exts: unsupported extension '{bad}' (supported: {})",
                    section.name,
                    supported.join(", ")
                )));
            }
            if let OutputExt::Extension(ext) = &section.output_ext {
                if !supported.contains(&ext.as_str()) {
                    return Err(ConfigError::Validation(format!(
                        "{}.output_ext: unsupported extension '{ext}' (supported: native, {})",
                        section.name,
                        supported.join(", ")
                    )));
                }
            }
        }
        Ok(())
    }

    /// First media section, in declaration order, that accepts `extension`.
    pub fn media_for_extension(&self, extension: &str) -> Option<&MediaConfig> {
        self.media.iter().find(|m| m.accepts(extension))
    }
}

/// Canonical form of a path that may not exist yet: the deepest existing
/// ancestor is canonicalized and the missing tail appended.
fn resolve_missing(path: &Path) -> std::io::Result<PathBuf> {
    let absolute = std::path::absolute(path)?;
    let mut existing = absolute.as_path();
    let mut tail = Vec::new();
    while !existing.exists() {
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                tail.push(name);
                existing = parent;
            }
            _ => return Ok(absolute),
        }
    }
    let mut resolved = existing.canonicalize()?;
    resolved.extend(tail.iter().rev());
    Ok(resolved)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# mediamill configuration
# =======================
# Every key is optional. Values shown below are the defaults unless noted.

[main]
# Directory to read media from. Must exist.
input_dir = "input"
# Directory to mirror results into. Created if missing. Must not be, contain,
# or sit inside input_dir.
output_dir = "output"
# Remove everything inside output_dir before processing.
clean_output_dir = false
# Walk subdirectories of input_dir.
recursive = true
# Replace output files that already exist. When false, existing outputs are
# left untouched and the input is skipped.
overwrite_files = true
# Copy files that no media section accepts into the output tree unchanged.
copy_other_files = true
# Log per-file failures and continue. When false the first failure aborts
# the run.
ignore_errors = true
# Number of files processed at once. 1 processes files one after another.
threads = 1

# -----------------------------------------------------------------------------
# Media sections
# -----------------------------------------------------------------------------
# Each section is named after a media type: image, audio or video.
# Sections are matched in the order they appear; the first section whose
# input_exts contains a file's extension handles that file.
#
#   input_exts  "all" or a list of extensions
#   output_ext  "native" (keep the input extension) or an extension
#
# Any other key is an operation. Operations run top to bottom.

[image]
input_exts = "all"   # blp bmp dib icns ico msp sgi jpg jpeg png
output_ext = "native"

# Rotate counter-clockwise by whole degrees (0-360). The canvas size is kept;
# corners that leave the frame are cropped.
# rotate = 90

# Resize. width and height are required (1-9999).
#   method      stretch | fit | fill | fit_expand        (default stretch)
#   resampling  nearest | box | bilinear | hamming | bicubic | lanczos
#                                                        (default lanczos)
#   offset      [x, y] in 0.0-1.0, anchors the crop (fill) or the padding
#               (fit_expand)                             (default [0.5, 0.5])
#   color       [r, g, b] or "#rrggbb", fit_expand canvas (default black)
# resize = { width = 800, height = 600, method = "fit" }

# Convert color mode:
#   greyscale | black_and_white | rgb | rgba | ycbcr | cmyk | lab | hsv
# png/ico/bmp/jpeg outputs only store greyscale, black_and_white, rgb and
# (except jpeg) rgba, so convert back before saving.
# color_mode = "greyscale"

# Enhancements take a float factor: 1.0 leaves the image unchanged, 0.0 gives
# a grey / flat / black / blurred image, larger values amplify. Non-float
# values are ignored.
# color_balance = 1.0
# contrast = 1.0
# brightness = 1.0
# sharpness = 1.0

# Audio and video files are copied as-is when output_ext keeps the container.
# They accept no operations.
# [audio]
# input_exts = ["mp3", "flac", "ogg"]
# output_ext = "native"
"##
}
