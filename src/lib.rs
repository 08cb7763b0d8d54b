//! # mediamill
//!
//! A configuration-driven batch media converter. It walks an input
//! directory, classifies every file by extension against the media sections
//! of a TOML config, runs each matched file through its media type's
//! load → transform → save pipeline, and mirrors the result into an output
//! tree. Unmatched files are copied verbatim or skipped.
//!
//! # Architecture
//!
//! ```text
//! config.toml ─► Config ─► process (enumerate, plan, skip / copy)
//!                               │
//!                               ▼ FileTask
//!                          dispatch (media type → handler)
//!                               │
//!                               ▼
//!                  pipeline: Loader → Transformer → Saver
//!                               │
//!                               ▼ image
//!                  imaging: decode, ordered operations, encode
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | `config.toml` loading, splitting into base settings and operations, validation |
//! | [`process`] | File orchestrator: enumeration, planning, skip/copy/dispatch, stats, worker pool |
//! | [`dispatch`] | Media-type tag → handler |
//! | [`pipeline`] | Load/transform/save traits, the pipeline state machine, image and passthrough handlers |
//! | [`imaging`] | Pixel buffers, resize/rotate/color/enhance operations, image codec |
//! | [`types`] | `FileTask`, `OperationSpec`, `ProcessingStats` |
//! | [`error`] | Stage-tagged pipeline errors |
//! | [`output`] | CLI output formatting of run events |
//! | [`logging`] | Console + log file setup |
//!
//! # Design Decisions
//!
//! ## Operations Are Data Until Applied
//!
//! A media section's operation keys are kept as an ordered list of raw TOML
//! values ([`types::OperationSpec`]) and decoded into
//! [`imaging::Operation`]s by the transformer. A typo in one section only
//! fails the files that section matches, and `mediamill check` decodes every
//! section up front so such mistakes surface before a long run.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding and encoding go through the `image` crate and scaling through
//! `fast_image_resize`; everything else is plain loops over [`imaging::PixelBuffer`].
//! No system libraries are needed.
//!
//! ## Failures Stop at the File
//!
//! Every handler returns a stage-tagged [`error::PipelineError`] and the
//! orchestrator decides: log and continue (`ignore_errors`) or abort the run.
//! A failed save never leaves a partial output file.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod imaging;
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod process;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
