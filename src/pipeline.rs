//! The load → transform → save pipeline every media handler runs.
//!
//! Each stage is a trait ([`Loader`], [`Transformer`], [`Saver`]) sharing an
//! associated `Item`: the in-memory form of one file. A [`Pipeline`] owns one
//! implementation of each and walks a small state machine per file:
//!
//! ```text
//! Idle ──load──▶ Loaded ──transform──▶ Transformed ──save──▶ Saved
//!   │               │                      │
//!   └───────────────┴──────────────────────┴──▶ Err(PipelineError { stage, cause })
//! ```
//!
//! The item is moved from state to state, so no stage can observe another
//! file's data and nothing is saved after a failure. There are no retries.
//!
//! Audio and video have no pixel-level support: their handler
//! ([`passthrough_handler`]) loads raw bytes, rejects every operation and
//! only saves when the container does not change.

use crate::error::{LoadError, PipelineError, SaveError, TransformError};
use crate::imaging::{ImageLoader, ImageSaver, ImageTransformer};
use crate::types::{FileTask, OperationSpec};
use std::fs;
use std::path::Path;

/// Decodes a file into memory.
pub trait Loader {
    type Item;

    fn load(&self, path: &Path) -> Result<Self::Item, LoadError>;
}

/// Applies an operation sequence to a loaded item.
pub trait Transformer {
    type Item;

    /// Validate `operations` without touching any data.
    fn check(&self, operations: &OperationSpec) -> Result<(), TransformError>;

    fn transform(
        &self,
        item: Self::Item,
        operations: &OperationSpec,
    ) -> Result<Self::Item, TransformError>;
}

/// Encodes an item to a path, choosing the container from its extension.
pub trait Saver {
    type Item;

    fn save(&self, item: Self::Item, path: &Path) -> Result<(), SaveError>;
}

/// What the orchestrator needs from a media handler.
pub trait MediaHandler: Send + Sync {
    /// Run one task to completion or to its first failure.
    fn run(&self, task: &FileTask) -> Result<(), PipelineError>;

    /// Validate an operation sequence up front.
    fn check(&self, operations: &OperationSpec) -> Result<(), TransformError>;
}

enum State<I> {
    Idle,
    Loaded(I),
    Transformed(I),
    Saved,
}

/// A loader, transformer and saver sharing one item type.
#[derive(Debug, Default, Clone)]
pub struct Pipeline<L, T, S> {
    loader: L,
    transformer: T,
    saver: S,
}

impl<L, T, S> Pipeline<L, T, S>
where
    L: Loader,
    T: Transformer<Item = L::Item>,
    S: Saver<Item = L::Item>,
{
    pub fn new(loader: L, transformer: T, saver: S) -> Self {
        Self {
            loader,
            transformer,
            saver,
        }
    }

    fn step(&self, state: State<L::Item>, task: &FileTask) -> Result<State<L::Item>, PipelineError> {
        Ok(match state {
            State::Idle => {
                let item = self.loader.load(&task.input)?;
                log::debug!("loaded {}", task.input.display());
                State::Loaded(item)
            }
            State::Loaded(item) => {
                let item = self.transformer.transform(item, &task.operations)?;
                log::debug!(
                    "applied {} operation(s) to {}",
                    task.operations.len(),
                    task.input.display()
                );
                State::Transformed(item)
            }
            State::Transformed(item) => {
                self.saver.save(item, &task.output)?;
                log::debug!("saved {}", task.output.display());
                State::Saved
            }
            State::Saved => State::Saved,
        })
    }

    /// Drive `task` from `Idle` to `Saved`.
    pub fn run(&self, task: &FileTask) -> Result<(), PipelineError> {
        let mut state = State::Idle;
        loop {
            state = match state {
                State::Saved => return Ok(()),
                other => self.step(other, task)?,
            };
        }
    }
}

impl<L, T, S> MediaHandler for Pipeline<L, T, S>
where
    L: Loader + Send + Sync,
    T: Transformer<Item = L::Item> + Send + Sync,
    S: Saver<Item = L::Item> + Send + Sync,
{
    fn run(&self, task: &FileTask) -> Result<(), PipelineError> {
        Pipeline::run(self, task)
    }

    fn check(&self, operations: &OperationSpec) -> Result<(), TransformError> {
        self.transformer.check(operations)
    }
}

pub type ImagePipeline = Pipeline<ImageLoader, ImageTransformer, ImageSaver>;

pub fn image_handler() -> ImagePipeline {
    Pipeline::new(ImageLoader, ImageTransformer, ImageSaver)
}

// =============================================================================
// Audio / video passthrough
// =============================================================================

/// Undecoded file contents plus the extension they were read with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMedia {
    pub bytes: Vec<u8>,
    pub extension: String,
}

pub(crate) fn lowercase_extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default()
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RawLoader;

impl Loader for RawLoader {
    type Item = RawMedia;

    fn load(&self, path: &Path) -> Result<RawMedia, LoadError> {
        let bytes = fs::read(path).map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => LoadError::NotFound(path.to_path_buf()),
            _ => LoadError::Io {
                path: path.to_path_buf(),
                source,
            },
        })?;
        Ok(RawMedia {
            bytes,
            extension: lowercase_extension(path),
        })
    }
}

/// Accepts only an empty operation sequence.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughTransformer;

impl Transformer for PassthroughTransformer {
    type Item = RawMedia;

    fn check(&self, operations: &OperationSpec) -> Result<(), TransformError> {
        match operations.names().next() {
            Some(name) => Err(TransformError::UnsupportedOperation(name.to_string())),
            None => Ok(()),
        }
    }

    fn transform(&self, item: RawMedia, operations: &OperationSpec) -> Result<RawMedia, TransformError> {
        self.check(operations)?;
        Ok(item)
    }
}

/// Writes bytes back out when the container is unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct RawSaver;

impl Saver for RawSaver {
    type Item = RawMedia;

    fn save(&self, item: RawMedia, path: &Path) -> Result<(), SaveError> {
        let target = lowercase_extension(path);
        if target != item.extension {
            return Err(SaveError::UnsupportedFormat(format!(
                "{target} (converting from {} needs an external codec)",
                item.extension
            )));
        }
        fs::write(path, &item.bytes).map_err(|source| SaveError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

pub type PassthroughPipeline = Pipeline<RawLoader, PassthroughTransformer, RawSaver>;

pub fn passthrough_handler() -> PassthroughPipeline {
    Pipeline::new(RawLoader, PassthroughTransformer, RawSaver)
}
