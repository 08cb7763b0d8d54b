//! Stage errors for the load → transform → save pipeline.
//!
//! Each stage has its own error enum so that callers can match on the
//! specific failure. [`PipelineError`] wraps them and records which stage
//! failed; it is what a [`MediaHandler`](crate::pipeline::MediaHandler)
//! returns to the orchestrator.

use crate::imaging::ColorMode;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The three stages of a media pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Load,
    Transform,
    Save,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Load => "load",
            Stage::Transform => "transform",
            Stage::Save => "save",
        })
    }
}

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("source file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unsupported or unrecognized format: {}", .0.display())]
    UnsupportedFormat(PathBuf),
    #[error("failed to decode {}: {reason}", path.display())]
    Decode { path: PathBuf, reason: String },
}

/// Failures raised while decoding or applying an operation sequence.
///
/// `Clone` so a decoded-once error can be reported for every file it affects.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    #[error("unsupported operation '{0}'")]
    UnsupportedOperation(String),
    #[error("invalid parameters for '{operation}': {reason}")]
    InvalidParams { operation: String, reason: String },
    #[error("unsupported resize method '{0}'")]
    UnsupportedMethod(String),
    #[error("unsupported resampling filter '{0}'")]
    UnsupportedResampling(String),
    #[error("unsupported color mode '{0}'")]
    UnsupportedColorMode(String),
    #[error("{0}")]
    Failed(String),
}

impl TransformError {
    pub(crate) fn invalid(operation: &str, reason: impl Into<String>) -> Self {
        TransformError::InvalidParams {
            operation: operation.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum SaveError {
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unsupported output format '{0}'")]
    UnsupportedFormat(String),
    #[error("{format} output cannot store {mode} images")]
    UnsupportedColorMode { mode: ColorMode, format: String },
    #[error("failed to encode {}: {reason}", path.display())]
    Encode { path: PathBuf, reason: String },
}

/// A stage failure, tagged with the stage it happened in.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("load failed: {0}")]
    Load(#[from] LoadError),
    #[error("transform failed: {0}")]
    Transform(#[from] TransformError),
    #[error("save failed: {0}")]
    Save(#[from] SaveError),
}

impl PipelineError {
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Load(_) => Stage::Load,
            PipelineError::Transform(_) => Stage::Transform,
            PipelineError::Save(_) => Stage::Save,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_error_reports_stage() {
        let err = PipelineError::from(TransformError::UnsupportedOperation("blur".into()));
        assert_eq!(err.stage(), Stage::Transform);
        assert_eq!(err.to_string(), "transform failed: unsupported operation 'blur'");

        let err = PipelineError::from(LoadError::NotFound("/in/a.png".into()));
        assert_eq!(err.stage(), Stage::Load);
        assert!(err.to_string().starts_with("load failed: source file not found"));
    }

    #[test]
    fn save_error_names_mode_and_format() {
        let err = SaveError::UnsupportedColorMode {
            mode: ColorMode::Cmyk,
            format: "png".into(),
        };
        assert_eq!(err.to_string(), "png output cannot store CMYK images");
    }
}
