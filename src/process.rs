//! The file orchestrator: one full run from input tree to output tree.
//!
//! ## Flow
//!
//! 1. Optionally empty the output directory, then make sure it exists.
//! 2. Enumerate input files (recursively or flat), sorted by name.
//! 3. Plan each file: match its extension against the media sections in
//!    declaration order, map the output path (remapping the extension), or
//!    fall back to copying / skipping it when nothing matches.
//! 4. Execute the plan: skip outputs that exist when overwriting is off, create
//!    parent directories, and hand matched files to the [`HandlerDispatch`].
//! 5. Report `processed/total`, whether the run finished or aborted.
//!
//! ## Failures
//!
//! Per-file progress is logged at debug level and streamed as [`RunEvent`]s;
//! failures are logged at error level with the cause chain at debug.
//! Entries the directory walk cannot read (permissions, symlink loops) follow
//! the same policy: a warning with `ignore_errors`, otherwise [`RunError::Walk`].
//!
//! Per-file failures stop at this boundary. With `ignore_errors` they are
//! logged and counted and the run continues; otherwise the first one aborts
//! the run and is returned as [`RunError::File`].
//!
//! ## Parallel Processing
//!
//! With `threads > 1` the plan runs on a dedicated [rayon](https://docs.rs/rayon)
//! pool. Files are grouped by target path and each group runs sequentially on
//! one worker, so exists/overwrite checks for a path never race. Each file
//! gets its own handler and buffer; only the counters are shared.

use crate::config::Config;
use crate::dispatch::{DispatchError, HandlerDispatch, StandardDispatch};
use crate::error::PipelineError;
use crate::pipeline::lowercase_extension;
use crate::types::{FileTask, ProcessingStats};
use rayon::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::mpsc::Sender;
use thiserror::Error;
use walkdir::WalkDir;

/// Why one file failed.
#[derive(Error, Debug)]
pub enum FileError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error("failed to copy to {}: {source}", path.display())]
    Copy {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum RunError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to read input directory: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("{} is not under input_dir {}", path.display(), input_dir.display())]
    OutsideInput { path: PathBuf, input_dir: PathBuf },
    #[error("{}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: FileError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Output exists and overwriting is off.
    OutputExists,
    /// No media section matched and copying is off.
    Unmatched,
}

/// Progress events sent during a run, for display by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    Started {
        total: usize,
    },
    Processing {
        index: usize,
        total: usize,
        input: PathBuf,
        output: PathBuf,
        media_type: String,
    },
    Processed {
        index: usize,
        total: usize,
        output: PathBuf,
    },
    Skipped {
        index: usize,
        total: usize,
        path: PathBuf,
        reason: SkipReason,
    },
    Copied {
        index: usize,
        total: usize,
        input: PathBuf,
        output: PathBuf,
    },
    Failed {
        index: usize,
        total: usize,
        input: PathBuf,
        error: String,
    },
    Finished {
        stats: ProcessingStats,
    },
}

/// A problem found by [`check_config`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigProblem {
    pub section: String,
    pub message: String,
}

#[derive(Debug, Clone)]
enum Action {
    Process(FileTask),
    Copy { output: PathBuf },
    Unmatched,
}

#[derive(Debug, Clone)]
struct Planned {
    index: usize,
    input: PathBuf,
    action: Action,
}

impl Planned {
    fn output(&self) -> Option<&Path> {
        match &self.action {
            Action::Process(task) => Some(&task.output),
            Action::Copy { output } => Some(output),
            Action::Unmatched => None,
        }
    }
}

struct Run<'a, D> {
    dispatch: &'a D,
    config: &'a Config,
    total: usize,
    stats: Mutex<ProcessingStats>,
    events: Option<Sender<RunEvent>>,
}

/// Run with the standard image/audio/video handlers.
pub fn process(config: &Config, events: Option<Sender<RunEvent>>) -> Result<ProcessingStats, RunError> {
    process_with_dispatch(&StandardDispatch, config, events)
}

/// Run with a caller-supplied dispatch.
pub fn process_with_dispatch(
    dispatch: &impl HandlerDispatch,
    config: &Config,
    events: Option<Sender<RunEvent>>,
) -> Result<ProcessingStats, RunError> {
    let main = &config.main;
    if main.clean_output_dir {
        log::info!("Cleaning output directory {}", main.output_dir.display());
        clean_dir(&main.output_dir)?;
    }
    fs::create_dir_all(&main.output_dir)?;

    let files = enumerate_files(&main.input_dir, main.recursive, main.ignore_errors)?;
    let plan = plan_files(config, &files)?;

    let run = Run {
        dispatch,
        config,
        total: plan.len(),
        stats: Mutex::new(ProcessingStats {
            total: plan.len(),
            ..Default::default()
        }),
        events,
    };
    run.emit(RunEvent::Started { total: run.total });
    if plan.is_empty() {
        log::warn!("No files to process in the input directory.");
    }

    let result = if main.threads > 1 {
        run.execute_parallel(&plan, main.threads)
    } else {
        plan.iter().try_for_each(|p| run.execute(p))
    };

    let stats = run.snapshot();
    log::info!("{stats}");
    run.emit(RunEvent::Finished { stats });
    result.map(|_| stats)
}

/// List regular files under `input`, sorted by name at every level.
///
/// With `skip_unreadable`, entries below `input` that cannot be read are
/// logged and left out. Failing to read `input` itself is always an error.
pub fn enumerate_files(
    input: &Path,
    recursive: bool,
    skip_unreadable: bool,
) -> Result<Vec<PathBuf>, RunError> {
    let walker = WalkDir::new(input)
        .min_depth(1)
        .max_depth(if recursive { usize::MAX } else { 1 })
        .follow_links(true)
        .sort_by_file_name();
    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if skip_unreadable && err.depth() > 0 => {
                log::warn!("Skipping unreadable entry: {err}");
                continue;
            }
            Err(err) => return Err(err.into()),
        };
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Remove every entry inside `dir`, keeping `dir` itself.
fn clean_dir(dir: &Path) -> std::io::Result<()> {
    if !dir.exists() {
        return Ok(());
    }
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            fs::remove_dir_all(&path)?;
        } else {
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}

fn plan_files(config: &Config, files: &[PathBuf]) -> Result<Vec<Planned>, RunError> {
    let main = &config.main;
    files
        .iter()
        .enumerate()
        .map(|(i, input)| {
            let relative = input
                .strip_prefix(&main.input_dir)
                .map_err(|_| RunError::OutsideInput {
                    path: input.clone(),
                    input_dir: main.input_dir.clone(),
                })?;
            let mirrored = main.output_dir.join(relative);
            let extension = lowercase_extension(input);
            let action = match config.media_for_extension(&extension) {
                Some(media) => Action::Process(FileTask {
                    index: i + 1,
                    input: input.clone(),
                    output: mirrored.with_extension(media.output_ext.resolve(&extension)),
                    media_type: media.name.clone(),
                    operations: media.operations.clone(),
                }),
                None if main.copy_other_files => Action::Copy { output: mirrored },
                None => Action::Unmatched,
            };
            Ok(Planned {
                index: i + 1,
                input: input.clone(),
                action,
            })
        })
        .collect()
}

/// Validate every media section's operations against its handler.
pub fn check_config(dispatch: &impl HandlerDispatch, config: &Config) -> Vec<ConfigProblem> {
    config
        .media
        .iter()
        .filter_map(|media| {
            let result = dispatch
                .handler(&media.name)
                .map_err(|e| e.to_string())
                .and_then(|h| h.check(&media.operations).map_err(|e| e.to_string()));
            result.err().map(|message| ConfigProblem {
                section: media.name.clone(),
                message,
            })
        })
        .collect()
}

/// `err` and its sources, one per line. A source whose text the level above
/// already printed inline is not repeated.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut chain = err.to_string();
    let mut above = chain.clone();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !above.contains(&text) {
            chain.push_str("\n  caused by: ");
            chain.push_str(&text);
        }
        above = text;
        source = cause.source();
    }
    chain
}

impl<D: HandlerDispatch> Run<'_, D> {
    fn emit(&self, event: RunEvent) {
        if let Some(tx) = &self.events {
            // A dropped receiver only means nobody is watching.
            let _ = tx.send(event);
        }
    }

    fn snapshot(&self) -> ProcessingStats {
        *self.stats.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn count(&self, update: impl FnOnce(&mut ProcessingStats)) {
        update(&mut self.stats.lock().unwrap_or_else(|e| e.into_inner()));
    }

    fn prefix(&self, index: usize) -> String {
        format!("[{index}/{}]", self.total)
    }

    fn execute_parallel(&self, plan: &[Planned], threads: usize) -> Result<(), RunError> {
        // Group by target path, keeping first-seen order.
        let mut slots: HashMap<&Path, usize> = HashMap::new();
        let mut groups: Vec<Vec<&Planned>> = Vec::new();
        for planned in plan {
            match planned.output() {
                Some(out) => {
                    let slot = *slots.entry(out).or_insert_with(|| {
                        groups.push(Vec::new());
                        groups.len() - 1
                    });
                    groups[slot].push(planned);
                }
                None => groups.push(vec![planned]),
            }
        }

        let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build()?;
        pool.install(|| {
            groups
                .par_iter()
                .try_for_each(|group| group.iter().try_for_each(|p| self.execute(p)))
        })
    }

    fn execute(&self, planned: &Planned) -> Result<(), RunError> {
        match self.handle(planned) {
            Ok(()) => Ok(()),
            Err(err) => {
                let prefix = self.prefix(planned.index);
                log::error!("{prefix} Failed to process {}: {err}", planned.input.display());
                log::debug!("{prefix} {}", error_chain(&err));
                self.count(|s| s.failed += 1);
                self.emit(RunEvent::Failed {
                    index: planned.index,
                    total: self.total,
                    input: planned.input.clone(),
                    error: err.to_string(),
                });
                if self.config.main.ignore_errors {
                    Ok(())
                } else {
                    Err(RunError::File {
                        path: planned.input.clone(),
                        source: err,
                    })
                }
            }
        }
    }

    fn handle(&self, planned: &Planned) -> Result<(), FileError> {
        let prefix = self.prefix(planned.index);
        let Some(output) = planned.output() else {
            log::debug!("{prefix} Skipping file: {}", planned.input.display());
            self.skip(planned, planned.input.clone(), SkipReason::Unmatched);
            return Ok(());
        };

        if !self.config.main.overwrite_files && output.exists() {
            log::debug!("{prefix} Skipping file (already exists): {}", output.display());
            self.skip(planned, output.to_path_buf(), SkipReason::OutputExists);
            return Ok(());
        }

        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent).map_err(|source| FileError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        match &planned.action {
            Action::Process(task) => {
                log::debug!(
                    "{prefix} Processing file: {} -> {}",
                    task.input.display(),
                    task.output.display()
                );
                self.emit(RunEvent::Processing {
                    index: task.index,
                    total: self.total,
                    input: task.input.clone(),
                    output: task.output.clone(),
                    media_type: task.media_type.clone(),
                });
                let handler = self.dispatch.handler(&task.media_type)?;
                handler.run(task)?;
                self.count(|s| s.processed += 1);
                self.emit(RunEvent::Processed {
                    index: task.index,
                    total: self.total,
                    output: task.output.clone(),
                });
            }
            Action::Copy { output } => {
                log::debug!(
                    "{prefix} Copying unmatched file: {} -> {}",
                    planned.input.display(),
                    output.display()
                );
                fs::copy(&planned.input, output).map_err(|source| FileError::Copy {
                    path: output.clone(),
                    source,
                })?;
                self.count(|s| s.copied += 1);
                self.emit(RunEvent::Copied {
                    index: planned.index,
                    total: self.total,
                    input: planned.input.clone(),
                    output: output.clone(),
                });
            }
            Action::Unmatched => {}
        }
        Ok(())
    }

    fn skip(&self, planned: &Planned, path: PathBuf, reason: SkipReason) {
        self.count(|s| s.skipped += 1);
        self.emit(RunEvent::Skipped {
            index: planned.index,
            total: self.total,
            path,
            reason,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::tests::MockDispatch;
    use crate::error::LoadError;
    use crate::test_helpers::{test_config, write_file};
    use std::sync::mpsc;
    use tempfile::TempDir;

    struct Dirs {
        _tmp: TempDir,
        input: PathBuf,
        output: PathBuf,
    }

    fn dirs() -> Dirs {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("in");
        let output = tmp.path().join("out");
        fs::create_dir_all(&input).unwrap();
        Dirs {
            _tmp: tmp,
            input,
            output,
        }
    }

    fn outputs(tasks: &[FileTask]) -> Vec<PathBuf> {
        tasks.iter().map(|t| t.output.clone()).collect()
    }

    // =========================================================================
    // planning
    // =========================================================================

    #[test]
    fn extension_is_remapped_and_tree_mirrored() {
        let d = dirs();
        write_file(&d.input.join("photo.BMP"), b"x");
        write_file(&d.input.join("nested/deep/pic.png"), b"x");
        let config = test_config(
            &d.input,
            &d.output,
            "[image]\ninput_exts = [\"bmp\", \"png\"]\noutput_ext = \"png\"\nrotate = 90\n",
        );
        let mock = MockDispatch::new();

        let stats = process_with_dispatch(&mock, &config, None).unwrap();

        assert_eq!(stats.processed, 2);
        let tasks = mock.get_tasks();
        assert_eq!(
            outputs(&tasks),
            [
                d.output.join("nested/deep/pic.png"),
                d.output.join("photo.png"),
            ]
        );
        assert_eq!(tasks[1].media_type, "image");
        assert_eq!(tasks[1].operations.names().collect::<Vec<_>>(), ["rotate"]);
    }

    #[test]
    fn native_keeps_lowercased_extension() {
        let d = dirs();
        write_file(&d.input.join("a.JPG"), b"x");
        let config = test_config(&d.input, &d.output, "");
        let mock = MockDispatch::new();
        process_with_dispatch(&mock, &config, None).unwrap();
        assert_eq!(outputs(&mock.get_tasks()), [d.output.join("a.jpg")]);
    }

    #[test]
    fn flat_run_ignores_subdirectories() {
        let d = dirs();
        write_file(&d.input.join("top.png"), b"x");
        write_file(&d.input.join("sub/inner.png"), b"x");
        let mut config = test_config(&d.input, &d.output, "");
        config.main.recursive = false;
        let mock = MockDispatch::new();

        let stats = process_with_dispatch(&mock, &config, None).unwrap();
        assert_eq!(stats.total, 1);
        assert_eq!(outputs(&mock.get_tasks()), [d.output.join("top.png")]);
    }

    #[test]
    fn file_outside_input_dir_is_rejected() {
        let d = dirs();
        let config = test_config(&d.input, &d.output, "");
        let stray = d.output.join("a.png");

        let err = plan_files(&config, &[d.input.join("ok.png"), stray.clone()]).unwrap_err();

        assert!(matches!(&err, RunError::OutsideInput { path, .. } if *path == stray));
        assert!(err.to_string().contains("is not under input_dir"), "{err}");
    }

    #[test]
    fn first_declared_section_handles_shared_extension() {
        let d = dirs();
        write_file(&d.input.join("a.png"), b"x");
        let config = test_config(
            &d.input,
            &d.output,
            "[audio]\ninput_exts = [\"mp3\"]\n[image]\ninput_exts = [\"png\"]\n[holo]\ninput_exts = [\"png\"]\n",
        );
        let mock = MockDispatch::new();
        process_with_dispatch(&mock, &config, None).unwrap();
        assert_eq!(mock.get_tasks()[0].media_type, "image");
    }

    // =========================================================================
    // unmatched files
    // =========================================================================

    #[test]
    fn unmatched_files_are_copied() {
        let d = dirs();
        write_file(&d.input.join("notes/readme.txt"), b"hello");
        let config = test_config(&d.input, &d.output, "");
        let stats = process_with_dispatch(&MockDispatch::new(), &config, None).unwrap();
        assert_eq!(stats.copied, 1);
        assert_eq!(stats.processed, 0);
        assert_eq!(fs::read(d.output.join("notes/readme.txt")).unwrap(), b"hello");
    }

    #[test]
    fn unmatched_files_are_skipped_when_copy_is_off() {
        let d = dirs();
        write_file(&d.input.join("readme.txt"), b"hello");
        let mut config = test_config(&d.input, &d.output, "");
        config.main.copy_other_files = false;
        let stats = process_with_dispatch(&MockDispatch::new(), &config, None).unwrap();
        assert_eq!(stats.skipped, 1);
        assert!(!d.output.join("readme.txt").exists());
    }

    // =========================================================================
    // overwrite / clean
    // =========================================================================

    #[test]
    fn existing_output_is_left_alone_without_overwrite() {
        let d = dirs();
        write_file(&d.input.join("photo.bmp"), b"x");
        write_file(&d.output.join("photo.png"), b"original");
        let mut config = test_config(&d.input, &d.output, "[image]\noutput_ext = \"png\"\n");
        config.main.overwrite_files = false;
        let mock = MockDispatch::new();

        let stats = process_with_dispatch(&mock, &config, None).unwrap();

        assert_eq!(stats.skipped, 1);
        assert!(mock.get_tasks().is_empty());
        assert_eq!(fs::read(d.output.join("photo.png")).unwrap(), b"original");
    }

    #[test]
    fn existing_output_is_replaced_with_overwrite() {
        let d = dirs();
        write_file(&d.input.join("photo.png"), b"x");
        write_file(&d.output.join("photo.png"), b"original");
        let config = test_config(&d.input, &d.output, "");
        process_with_dispatch(&MockDispatch::new(), &config, None).unwrap();
        assert_eq!(fs::read(d.output.join("photo.png")).unwrap(), b"mock");
    }

    #[test]
    fn clean_output_dir_removes_stale_entries() {
        let d = dirs();
        write_file(&d.output.join("stale/old.png"), b"x");
        write_file(&d.output.join("old.txt"), b"x");
        let mut config = test_config(&d.input, &d.output, "");
        config.main.clean_output_dir = true;
        process_with_dispatch(&MockDispatch::new(), &config, None).unwrap();
        assert!(d.output.is_dir());
        assert_eq!(fs::read_dir(&d.output).unwrap().count(), 0);
    }

    // =========================================================================
    // failures
    // =========================================================================

    #[test]
    fn ignore_errors_counts_and_continues() {
        let d = dirs();
        for name in ["a.png", "b.png", "c.png"] {
            write_file(&d.input.join(name), b"x");
        }
        let config = test_config(&d.input, &d.output, "");
        let mock = MockDispatch::failing_on([d.input.join("b.png")]);

        let stats = process_with_dispatch(&mock, &config, None).unwrap();

        assert_eq!(stats.to_string(), "2/3 files processed (1 failed)");
        assert_eq!(mock.get_tasks().len(), 3);
    }

    #[test]
    fn strict_mode_aborts_on_first_failure() {
        let d = dirs();
        for name in ["a.png", "b.png", "c.png"] {
            write_file(&d.input.join(name), b"x");
        }
        let mut config = test_config(&d.input, &d.output, "");
        config.main.ignore_errors = false;
        let mock = MockDispatch::failing_on([d.input.join("b.png")]);

        let err = process_with_dispatch(&mock, &config, None).unwrap_err();

        assert!(matches!(&err, RunError::File { path, .. } if path.ends_with("b.png")));
        assert_eq!(mock.get_tasks().len(), 2);
        assert!(!d.output.join("c.png").exists());
    }

    #[cfg(unix)]
    fn input_with_symlink_loop() -> Dirs {
        let d = dirs();
        write_file(&d.input.join("sub/real.png"), b"x");
        std::os::unix::fs::symlink(d.input.join("sub"), d.input.join("sub/loop")).unwrap();
        d
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_entry_is_skipped_in_lenient_mode() {
        let d = input_with_symlink_loop();
        let config = test_config(&d.input, &d.output, "");
        let mock = MockDispatch::new();

        let stats = process_with_dispatch(&mock, &config, None).unwrap();

        assert_eq!(stats.to_string(), "1/1 files processed");
        assert_eq!(outputs(&mock.get_tasks()), [d.output.join("sub/real.png")]);
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_entry_aborts_in_strict_mode() {
        let d = input_with_symlink_loop();
        let mut config = test_config(&d.input, &d.output, "");
        config.main.ignore_errors = false;
        let mock = MockDispatch::new();

        let err = process_with_dispatch(&mock, &config, None).unwrap_err();

        assert!(matches!(err, RunError::Walk(_)), "{err}");
        assert!(mock.get_tasks().is_empty());
    }

    #[test]
    fn missing_input_dir_is_fatal_even_when_lenient() {
        let d = dirs();
        let err = enumerate_files(&d.input.join("absent"), true, true).unwrap_err();
        assert!(matches!(err, RunError::Walk(_)));
    }

    #[test]
    fn error_chain_prints_each_cause_once() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = RunError::File {
            path: PathBuf::from("in/a.png"),
            source: FileError::Pipeline(PipelineError::Load(LoadError::Io {
                path: PathBuf::from("in/a.png"),
                source: io,
            })),
        };

        let chain = error_chain(&err);

        assert_eq!(chain.matches("access denied").count(), 1, "{chain}");
        assert_eq!(chain.matches("load failed").count(), 1, "{chain}");
        assert!(!chain.contains("caused by"), "{chain}");
    }

    #[test]
    fn error_chain_keeps_causes_missing_from_the_message() {
        let err = RunError::File {
            path: PathBuf::from("in/a.png"),
            source: FileError::Dispatch(DispatchError::UnsupportedMediaType("holo".into())),
        };
        let chain = error_chain(&err);
        assert_eq!(chain.lines().count(), 1, "{chain}");

        // A wrapper that does not format its source shows it on its own line.
        #[derive(Debug, Error)]
        #[error("walk aborted")]
        struct Opaque(#[source] std::io::Error);
        let chain = error_chain(&Opaque(std::io::Error::other("disk gone")));
        assert_eq!(chain, "walk aborted\n  caused by: disk gone");
    }

    #[test]
    fn unknown_media_type_fails_at_dispatch() {
        let d = dirs();
        write_file(&d.input.join("a.holo"), b"x");
        let config = test_config(&d.input, &d.output, "[hologram]\ninput_exts = [\"holo\"]\n");
        let (tx, rx) = mpsc::channel();

        let stats = process_with_dispatch(&MockDispatch::new(), &config, Some(tx)).unwrap();

        assert_eq!(stats.failed, 1);
        let failed = rx.iter().find_map(|e| match e {
            RunEvent::Failed { error, .. } => Some(error),
            _ => None,
        });
        assert_eq!(failed.unwrap(), "unsupported media type 'hologram'");
    }

    // =========================================================================
    // events / parallel
    // =========================================================================

    #[test]
    fn events_bracket_the_run() {
        let d = dirs();
        write_file(&d.input.join("a.png"), b"x");
        let config = test_config(&d.input, &d.output, "");
        let (tx, rx) = mpsc::channel();
        process_with_dispatch(&MockDispatch::new(), &config, Some(tx)).unwrap();

        let events: Vec<RunEvent> = rx.iter().collect();
        assert_eq!(events.first(), Some(&RunEvent::Started { total: 1 }));
        assert!(matches!(events.last(), Some(RunEvent::Finished { stats }) if stats.processed == 1));
        assert!(events.iter().any(|e| matches!(e, RunEvent::Processing { index: 1, .. })));
    }

    #[test]
    fn empty_input_reports_zero_of_zero() {
        let d = dirs();
        let config = test_config(&d.input, &d.output, "");
        let stats = process_with_dispatch(&MockDispatch::new(), &config, None).unwrap();
        assert_eq!(stats.to_string(), "0/0 files processed");
    }

    #[test]
    fn threaded_run_matches_sequential() {
        let d = dirs();
        for i in 0..12 {
            write_file(&d.input.join(format!("dir{}/f{i}.png", i % 3)), b"x");
        }
        write_file(&d.input.join("other.txt"), b"t");
        let mut config = test_config(&d.input, &d.output, "");

        let sequential = process_with_dispatch(&MockDispatch::new(), &config, None).unwrap();
        config.main.threads = 4;
        let mock = MockDispatch::new();
        let parallel = process_with_dispatch(&mock, &config, None).unwrap();

        assert_eq!(parallel, sequential);
        let mut seen = outputs(&mock.get_tasks());
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 12);
    }

    #[test]
    fn same_target_is_serialized() {
        // a.bmp and a.png both map to a.png; with overwrite off only the
        // first (by name) may write it, whatever the thread count.
        let d = dirs();
        write_file(&d.input.join("a.bmp"), b"x");
        write_file(&d.input.join("a.png"), b"x");
        let mut config = test_config(&d.input, &d.output, "[image]\noutput_ext = \"png\"\n");
        config.main.overwrite_files = false;
        config.main.threads = 4;
        let mock = MockDispatch::new();

        let stats = process_with_dispatch(&mock, &config, None).unwrap();

        assert_eq!(stats.processed, 1);
        assert_eq!(stats.skipped, 1);
        assert_eq!(mock.get_tasks()[0].input, d.input.join("a.bmp"));
    }

    #[test]
    fn check_config_reports_bad_sections() {
        let d = dirs();
        let config = test_config(
            &d.input,
            &d.output,
            "[image]\nblur = 2\n[audio]\ninput_exts = [\"mp3\"]\n[holo]\ninput_exts = [\"h\"]\n",
        );
        let problems = check_config(&StandardDispatch, &config);
        assert_eq!(
            problems,
            [
                ConfigProblem {
                    section: "image".into(),
                    message: "unsupported operation 'blur'".into(),
                },
                ConfigProblem {
                    section: "holo".into(),
                    message: "unsupported media type 'holo'".into(),
                },
            ]
        );
    }
}
