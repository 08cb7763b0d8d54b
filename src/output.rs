//! CLI output formatting.
//!
//! Logging carries diagnostics; this module renders the progress a user
//! watches on stdout. Every per-file line leads with its `[index/total]`
//! position so interleaved output from a threaded run still reads in order
//! of discovery.
//!
//! # Output Format
//!
//! ## Run
//!
//! ```text
//! Processing 4 files
//! [1/4] image  photos/a.BMP -> out/photos/a.png
//! [2/4] copy   notes.txt -> out/notes.txt
//! [3/4] skip   out/b.png (exists)
//! [4/4] FAILED photos/c.png
//! ```
//!
//! ## Check
//!
//! ```text
//! [image] ok (3 operations)
//! [hologram] unsupported media type 'hologram'
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability. Format functions are pure: no I/O, no side effects.

use crate::config::Config;
use crate::process::{ConfigProblem, RunEvent, SkipReason};
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// `[index/total]`, padded so columns line up within one run.
fn position(index: usize, total: usize) -> String {
    let width = total.to_string().len();
    format!("[{index:>width$}/{total}]")
}

fn show(path: &Path) -> String {
    path.display().to_string()
}

// ============================================================================
// Run output
// ============================================================================

/// Format a single run event as display lines.
pub fn format_run_event(event: &RunEvent) -> Vec<String> {
    match event {
        RunEvent::Started { total } => {
            let noun = if *total == 1 { "file" } else { "files" };
            vec![format!("Processing {total} {noun}")]
        }
        RunEvent::Processing {
            index,
            total,
            input,
            output,
            media_type,
        } => vec![format!(
            "{} {media_type:<6} {} -> {}",
            position(*index, *total),
            show(input),
            show(output)
        )],
        // The Processing line already named the output.
        RunEvent::Processed { .. } => Vec::new(),
        RunEvent::Skipped {
            index,
            total,
            path,
            reason,
        } => {
            let why = match reason {
                SkipReason::OutputExists => "exists",
                SkipReason::Unmatched => "no matching media type",
            };
            vec![format!(
                "{} skip   {} ({why})",
                position(*index, *total),
                show(path)
            )]
        }
        RunEvent::Copied {
            index,
            total,
            input,
            output,
        } => vec![format!(
            "{} copy   {} -> {}",
            position(*index, *total),
            show(input),
            show(output)
        )],
        RunEvent::Failed {
            index,
            total,
            input,
            error,
        } => vec![
            format!("{} FAILED {}", position(*index, *total), show(input)),
            format!("    {error}"),
        ],
        RunEvent::Finished { stats } => vec![format!("Done: {stats}")],
    }
}

// ============================================================================
// Check output
// ============================================================================

/// One line per media section: `ok` with its operation count, or the problem.
pub fn format_check_report(config: &Config, problems: &[ConfigProblem]) -> Vec<String> {
    config
        .media
        .iter()
        .map(|media| {
            match problems.iter().find(|p| p.section == media.name) {
                Some(problem) => format!("[{}] {}", media.name, problem.message),
                None => {
                    let n = media.operations.len();
                    let noun = if n == 1 { "operation" } else { "operations" };
                    format!("[{}] ok ({n} {noun})", media.name)
                }
            }
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
