//! Shared types passed between the configuration, the orchestrator and the
//! media handlers.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use toml::Value;

/// Ordered `(operation name, raw parameter value)` pairs for one media type.
///
/// Order is the declaration order in the config file and is the order the
/// operations are applied in. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperationSpec(Vec<(String, Value)>);

impl OperationSpec {
    pub fn new(entries: Vec<(String, Value)>) -> Self {
        Self(entries)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Value)> for OperationSpec {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// One unit of work: a matched input file and where its result goes.
#[derive(Debug, Clone)]
pub struct FileTask {
    /// 1-based position in enumeration order.
    pub index: usize,
    pub input: PathBuf,
    /// Mirrored output path with the extension already remapped.
    pub output: PathBuf,
    /// Media-type tag of the config section that matched.
    pub media_type: String,
    pub operations: Arc<OperationSpec>,
}

/// Counters for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessingStats {
    /// Files found under the input directory.
    pub total: usize,
    /// Files that went through a media pipeline successfully.
    pub processed: usize,
    /// Files left alone (output exists, or unmatched with copying off).
    pub skipped: usize,
    /// Unmatched files copied verbatim.
    pub copied: usize,
    pub failed: usize,
}

impl fmt::Display for ProcessingStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} files processed", self.processed, self.total)?;
        let extras: Vec<String> = [
            (self.skipped, "skipped"),
            (self.copied, "copied"),
            (self.failed, "failed"),
        ]
        .iter()
        .filter(|(n, _)| *n > 0)
        .map(|(n, label)| format!("{n} {label}"))
        .collect();
        if !extras.is_empty() {
            write!(f, " ({})", extras.join(", "))?;
        }
        Ok(())
    }
}
