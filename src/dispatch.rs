//! Media-type tag → handler.
//!
//! Dispatch is stateless: [`StandardDispatch`] builds a fresh handler for every
//! task, so nothing carries over from one file to the next. The orchestrator
//! takes any [`HandlerDispatch`], which lets tests swap in a recording mock.

use crate::pipeline::{MediaHandler, image_handler, passthrough_handler};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("unsupported media type '{0}'")]
    UnsupportedMediaType(String),
}

/// The media types with a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    Image,
    Audio,
    Video,
}

impl MediaType {
    pub const ALL: [MediaType; 3] = [MediaType::Image, MediaType::Audio, MediaType::Video];

    pub fn from_tag(tag: &str) -> Result<Self, DispatchError> {
        match tag {
            "image" => Ok(MediaType::Image),
            "audio" => Ok(MediaType::Audio),
            "video" => Ok(MediaType::Video),
            other => Err(DispatchError::UnsupportedMediaType(other.to_string())),
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            MediaType::Image => "image",
            MediaType::Audio => "audio",
            MediaType::Video => "video",
        }
    }

    /// Extensions accepted for this type, lower-case without the dot.
    pub fn supported_extensions(self) -> &'static [&'static str] {
        match self {
            MediaType::Image => &[
                "blp", "bmp", "dib", "icns", "ico", "msp", "sgi", "jpg", "jpeg", "png",
            ],
            MediaType::Audio => &["mp3", "flac", "ogg"],
            MediaType::Video => &["mp4", "mkv", "avi", "mov", "webm"],
        }
    }
}

/// Resolves a media-type tag to a handler.
pub trait HandlerDispatch: Sync {
    fn handler(&self, media_type: &str) -> Result<Box<dyn MediaHandler>, DispatchError>;
}

/// The production mapping: image pipeline for images, byte passthrough for
/// audio and video.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardDispatch;

impl HandlerDispatch for StandardDispatch {
    fn handler(&self, media_type: &str) -> Result<Box<dyn MediaHandler>, DispatchError> {
        Ok(match MediaType::from_tag(media_type)? {
            MediaType::Image => Box::new(image_handler()),
            MediaType::Audio | MediaType::Video => Box::new(passthrough_handler()),
        })
    }
}
