#![forbid(unsafe_code)]

//! Discovery of record definition files under a source directory
//!
//! Walking is gitignore-aware and skips hidden entries. Include and exclude
//! globs are matched against the path relative to the walked root.

use crate::error::RegistryError;
use crate::registry::record::RecordFormat;
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// Patterns used when none are configured
pub const DEFAULT_INCLUDE: &[&str] = &["**/*.toml", "**/*.json"];

/// Compiled include/exclude patterns for record discovery
#[derive(Debug, Clone)]
pub struct SourcePatterns {
    include: Option<GlobSet>,
    exclude: Option<GlobSet>,
}

impl SourcePatterns {
    /// Compile patterns; an empty include list matches every record file
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::InvalidGlob` naming the first bad pattern.
    pub fn new<S: AsRef<str>>(include: &[S], exclude: &[S]) -> Result<Self, RegistryError> {
        let include = if include.is_empty() {
            None
        } else {
            Some(build_globset(include)?)
        };
        let exclude = if exclude.is_empty() {
            None
        } else {
            Some(build_globset(exclude)?)
        };
        Ok(Self { include, exclude })
    }

    /// True when a path relative to the source root should be loaded
    pub fn matches(&self, relative: &Path) -> bool {
        if RecordFormat::from_path(relative).is_none() {
            return false;
        }
        if let Some(include) = &self.include
            && !include.is_match(relative)
        {
            return false;
        }
        !self
            .exclude
            .as_ref()
            .is_some_and(|exclude| exclude.is_match(relative))
    }
}

impl Default for SourcePatterns {
    fn default() -> Self {
        let empty: &[&str] = &[];
        // The built-in patterns are valid globs
        Self::new(DEFAULT_INCLUDE, empty).unwrap_or(Self {
            include: None,
            exclude: None,
        })
    }
}

fn build_globset<S: AsRef<str>>(patterns: &[S]) -> Result<GlobSet, RegistryError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let pattern = pattern.as_ref();
        let glob = Glob::new(pattern).map_err(|e| RegistryError::InvalidGlob {
            pattern: pattern.to_string(),
            source: e,
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| RegistryError::InvalidGlob {
        pattern: "<globset>".to_string(),
        source: e,
    })
}

/// Find every record file under `root`, sorted by path
///
/// # Errors
///
/// Returns `RegistryError::NotADirectory` when `root` is a file, and
/// `RegistryError::Walk` when traversal fails.
pub fn discover(root: &Path, patterns: &SourcePatterns) -> Result<Vec<PathBuf>, RegistryError> {
    if !root.is_dir() {
        return Err(RegistryError::NotADirectory(root.to_path_buf()));
    }

    let walker = WalkBuilder::new(root)
        .hidden(true)
        .git_ignore(true)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }
        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        if patterns.matches(relative) {
            files.push(path.to_path_buf());
        } else {
            tracing::trace!(path = %path.display(), "Skipping file outside source patterns");
        }
    }

    Ok(files)
}
