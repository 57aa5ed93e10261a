//! Counts the shared commands and rules in a rules directory.

use serde::Serialize;
use std::path::Path;
use walkdir::WalkDir;

/// Number of shared resources under `cursor-rules`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResourceCounts {
    /// `commands/*.md`
    pub commands: usize,
    /// `rules/**/*.mdc`
    pub rules: usize,
}

/// Count `commands/*.md` (top level only) and `rules/**/*.mdc` (recursive).
///
/// Missing subdirectories count as zero.
pub fn count_resources(rules_dir: &Path) -> ResourceCounts {
    ResourceCounts {
        commands: count_files(&rules_dir.join("commands"), "md", Some(1)),
        rules: count_files(&rules_dir.join("rules"), "mdc", None),
    }
}

fn count_files(dir: &Path, extension: &str, max_depth: Option<usize>) -> usize {
    if !dir.is_dir() {
        return 0;
    }

    let mut walker = WalkDir::new(dir).min_depth(1);
    if let Some(depth) = max_depth {
        walker = walker.max_depth(depth);
    }

    walker
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .filter(|entry| entry.path().extension().is_some_and(|ext| ext == extension))
        .count()
}
