#![forbid(unsafe_code)]

//! Registry snapshots and the builder that loads them
//!
//! A [`RegistrySnapshot`] is immutable once built. Loading goes through a
//! [`RegistryBuilder`], which fails fast on the first duplicate (name,
//! version) pair or invalid record so a partial registry is never published.

use crate::error::{LookupError, RegistryError};
use crate::registry::loader::{SourcePatterns, discover};
use crate::registry::record::{DecoratorRecord, RecordOrigin};
use crate::types::Identifier;
use crate::version::{Version, VersionReq};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

/// An immutable, indexed set of decorator records
#[derive(Debug, Clone)]
pub struct RegistrySnapshot {
    /// Sorted by name, then ascending version
    records: Vec<Arc<DecoratorRecord>>,
    by_name: BTreeMap<String, Vec<usize>>,
    by_category: BTreeMap<String, Vec<usize>>,
    standard: Version,
}

impl RegistrySnapshot {
    /// A snapshot with no records
    pub fn empty(standard: Version) -> Self {
        Self::from_records(Vec::new(), standard)
    }

    fn from_records(mut records: Vec<DecoratorRecord>, standard: Version) -> Self {
        records.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.version.cmp(&b.version)));

        let records: Vec<Arc<DecoratorRecord>> = records.into_iter().map(Arc::new).collect();
        let mut by_name: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        let mut by_category: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (index, record) in records.iter().enumerate() {
            by_name
                .entry(record.name.to_string())
                .or_default()
                .push(index);
            if let Some(category) = &record.category {
                by_category.entry(category.clone()).or_default().push(index);
            }
        }

        Self {
            records,
            by_name,
            by_category,
            standard,
        }
    }

    /// The standard version used for "latest" selection
    pub fn standard(&self) -> &Version {
        &self.standard
    }

    /// Resolve a name and optional selector to one record
    ///
    /// With a selector, the highest matching version wins regardless of its
    /// standard window. Without one, the highest version whose window
    /// includes the active standard wins, preferring releases over
    /// pre-releases.
    ///
    /// # Errors
    ///
    /// - `UnknownDecorator` if no record has this name
    /// - `VersionNotFound` if the selector matches no loaded version
    /// - `IncompatibleVersion` if no version supports the active standard
    pub fn lookup(
        &self,
        name: &str,
        selector: Option<&VersionReq>,
    ) -> Result<&Arc<DecoratorRecord>, LookupError> {
        let indices = self
            .by_name
            .get(name)
            .ok_or_else(|| LookupError::UnknownDecorator(name.to_string()))?;

        match selector {
            Some(req) => indices
                .iter()
                .rev()
                .map(|&i| &self.records[i])
                .find(|record| req.matches(&record.version))
                .ok_or_else(|| LookupError::VersionNotFound {
                    name: name.to_string(),
                    selector: req.to_string(),
                }),
            None => self
                .latest(name)
                .ok_or_else(|| LookupError::IncompatibleVersion {
                    name: name.to_string(),
                    standard: self.standard.to_string(),
                }),
        }
    }

    /// Highest version of `name` that supports the active standard
    pub fn latest(&self, name: &str) -> Option<&Arc<DecoratorRecord>> {
        let candidates: Vec<&Arc<DecoratorRecord>> = self
            .by_name
            .get(name)?
            .iter()
            .rev()
            .map(|&i| &self.records[i])
            .filter(|record| record.supports_standard(&self.standard))
            .collect();

        candidates
            .iter()
            .find(|record| !record.version.is_prerelease())
            .or_else(|| candidates.first())
            .copied()
    }

    /// Every loaded version of `name`, ascending
    pub fn versions_of(&self, name: &str) -> Vec<&Version> {
        self.by_name
            .get(name)
            .map(|indices| indices.iter().map(|&i| &self.records[i].version).collect())
            .unwrap_or_default()
    }

    /// Records in `category`, sorted by name then version
    pub fn by_category(&self, category: &str) -> Vec<&Arc<DecoratorRecord>> {
        self.by_category
            .get(category)
            .map(|indices| indices.iter().map(|&i| &self.records[i]).collect())
            .unwrap_or_default()
    }

    /// Category names in sorted order
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.by_category.keys().map(String::as_str)
    }

    /// Every record, sorted by name then version
    pub fn iter(&self) -> impl Iterator<Item = &Arc<DecoratorRecord>> {
        self.records.iter()
    }

    /// Distinct decorator names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Number of records (not distinct names)
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Collects records from directories, files and code into a snapshot
#[derive(Debug)]
pub struct RegistryBuilder {
    standard: Version,
    patterns: SourcePatterns,
    records: Vec<DecoratorRecord>,
    seen: HashMap<(Identifier, Version), RecordOrigin>,
}

impl RegistryBuilder {
    pub fn new(standard: Version) -> Self {
        Self {
            standard,
            patterns: SourcePatterns::default(),
            records: Vec::new(),
            seen: HashMap::new(),
        }
    }

    /// Replace the patterns used by [`load_dir`](Self::load_dir)
    pub fn with_patterns(mut self, patterns: SourcePatterns) -> Self {
        self.patterns = patterns;
        self
    }

    /// Load every record file under `dir`
    ///
    /// A missing directory is logged and skipped. Returns the number of
    /// records loaded.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError` if the path is not a directory, a file cannot
    /// be read or parsed, or a record duplicates one already registered.
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize, RegistryError> {
        if !dir.exists() {
            tracing::warn!(path = %dir.display(), "Registry source directory not found, skipping");
            return Ok(0);
        }

        let files = discover(dir, &self.patterns)?;
        for path in &files {
            self.load_file(path)?;
        }
        Ok(files.len())
    }

    /// Load a single `.toml` or `.json` record file
    pub fn load_file(&mut self, path: &Path) -> Result<(), RegistryError> {
        let record = DecoratorRecord::from_path(path)?;
        tracing::debug!(
            path = %path.display(),
            decorator = %record.name,
            version = %record.version,
            "Loaded decorator record"
        );
        self.register(record)
    }

    /// Register a record built in code
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::DuplicateDefinition` naming both origins if
    /// the (name, version) pair is already registered.
    pub fn register(&mut self, record: DecoratorRecord) -> Result<(), RegistryError> {
        let key = (record.name.clone(), record.version.clone());
        if let Some(first) = self.seen.get(&key) {
            return Err(RegistryError::DuplicateDefinition {
                name: record.name.to_string(),
                version: record.version.clone(),
                first: first.to_string(),
                second: record.origin.to_string(),
            });
        }
        self.seen.insert(key, record.origin.clone());
        self.records.push(record);
        Ok(())
    }

    /// Number of records collected so far
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn build(self) -> RegistrySnapshot {
        RegistrySnapshot::from_records(self.records, self.standard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::record::RecordBuilder;
    use std::fs;
    use tempfile::TempDir;

    fn standard() -> Version {
        Version::new(1, 0, 0)
    }

    fn record(name: &str, version: &str) -> DecoratorRecord {
        RecordBuilder::new(name, version)
            .instruction(format!("{} {}", name, version))
            .build()
            .unwrap()
    }

    fn snapshot(records: Vec<DecoratorRecord>) -> RegistrySnapshot {
        let mut builder = RegistryBuilder::new(standard());
        for r in records {
            builder.register(r).unwrap();
        }
        builder.build()
    }

    #[test]
    fn test_unversioned_lookup_picks_highest() {
        let snap = snapshot(vec![
            record("Reasoning", "2.0.0"),
            record("Reasoning", "1.0.0"),
            record("Reasoning", "1.5.0"),
        ]);
        let found = snap.lookup("Reasoning", None).unwrap();
        assert_eq!(found.version, Version::new(2, 0, 0));
        assert_eq!(
            snap.versions_of("Reasoning"),
            vec![
                &Version::new(1, 0, 0),
                &Version::new(1, 5, 0),
                &Version::new(2, 0, 0)
            ]
        );
    }

    #[test]
    fn test_versioned_lookup() {
        let snap = snapshot(vec![record("Reasoning", "1.0.0"), record("Reasoning", "2.0.0")]);
        let req = VersionReq::parse("1").unwrap();
        assert_eq!(
            snap.lookup("Reasoning", Some(&req)).unwrap().version,
            Version::new(1, 0, 0)
        );

        let req = VersionReq::parse("3").unwrap();
        let err = snap.lookup("Reasoning", Some(&req)).unwrap_err();
        assert_eq!(
            err,
            LookupError::VersionNotFound {
                name: "Reasoning".to_string(),
                selector: "3".to_string()
            }
        );
    }

    #[test]
    fn test_latest_respects_standard_window() {
        let future = RecordBuilder::new("Tone", "2.0.0")
            .instruction("Tone v2")
            .standard_window(Some("2.0.0"), None)
            .build()
            .unwrap();
        let snap = snapshot(vec![record("Tone", "1.0.0"), future]);

        assert_eq!(snap.latest("Tone").unwrap().version, Version::new(1, 0, 0));

        // Explicit selection ignores the window
        let req = VersionReq::parse("2").unwrap();
        assert_eq!(
            snap.lookup("Tone", Some(&req)).unwrap().version,
            Version::new(2, 0, 0)
        );
    }

    #[test]
    fn test_incompatible_and_unknown() {
        let only_future = RecordBuilder::new("Tone", "2.0.0")
            .instruction("Tone v2")
            .standard_window(Some("2.0.0"), None)
            .build()
            .unwrap();
        let snap = snapshot(vec![only_future]);

        assert!(matches!(
            snap.lookup("Tone", None),
            Err(LookupError::IncompatibleVersion { .. })
        ));
        assert_eq!(
            snap.lookup("Missing", None).unwrap_err(),
            LookupError::UnknownDecorator("Missing".to_string())
        );
    }

    #[test]
    fn test_latest_prefers_release_over_prerelease() {
        let snap = snapshot(vec![record("Tone", "1.0.0"), record("Tone", "1.1.0-beta.1")]);
        assert_eq!(snap.latest("Tone").unwrap().version, Version::new(1, 0, 0));

        let snap = snapshot(vec![record("Draft", "0.1.0-alpha")]);
        assert!(snap.latest("Draft").unwrap().version.is_prerelease());
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut builder = RegistryBuilder::new(standard());
        builder.register(record("Tone", "1.0.0")).unwrap();
        let err = builder.register(record("Tone", "1.0.0")).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateDefinition { .. }));
        assert!(err.to_string().contains("Tone v1.0.0"));
    }

    #[test]
    fn test_categories_and_names() {
        let a = RecordBuilder::new("Reasoning", "1.0.0")
            .instruction("r")
            .category("reasoning")
            .build()
            .unwrap();
        let b = RecordBuilder::new("StepByStep", "1.0.0")
            .instruction("s")
            .category("reasoning")
            .build()
            .unwrap();
        let c = RecordBuilder::new("Concise", "1.0.0")
            .instruction("c")
            .category("tone")
            .build()
            .unwrap();
        let snap = snapshot(vec![c, b, a]);

        assert_eq!(snap.categories().collect::<Vec<_>>(), vec!["reasoning", "tone"]);
        let names: Vec<&str> = snap
            .by_category("reasoning")
            .iter()
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(names, vec!["Reasoning", "StepByStep"]);
        assert_eq!(
            snap.names().collect::<Vec<_>>(),
            vec!["Concise", "Reasoning", "StepByStep"]
        );
        assert_eq!(snap.len(), 3);
        assert!(snap.by_category("missing").is_empty());
    }

    #[test]
    fn test_load_dir_and_duplicate_across_files() {
        let temp = TempDir::new().unwrap();
        let body = |name: &str| {
            format!(
                "[decorator]\nname = \"{}\"\nversion = \"1.0.0\"\n\n[template]\ninstruction = \"x\"\n",
                name
            )
        };
        fs::write(temp.path().join("a.toml"), body("Alpha")).unwrap();
        fs::write(temp.path().join("b.toml"), body("Beta")).unwrap();

        let mut builder = RegistryBuilder::new(standard());
        assert_eq!(builder.load_dir(temp.path()).unwrap(), 2);
        assert_eq!(builder.build().len(), 2);

        fs::write(temp.path().join("c.toml"), body("Alpha")).unwrap();
        let mut builder = RegistryBuilder::new(standard());
        let err = builder.load_dir(temp.path()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("a.toml"));
        assert!(message.contains("c.toml"));
    }

    #[test]
    fn test_missing_dir_is_skipped() {
        let temp = TempDir::new().unwrap();
        let mut builder = RegistryBuilder::new(standard());
        assert_eq!(builder.load_dir(&temp.path().join("nope")).unwrap(), 0);
        assert!(builder.is_empty());
    }
}
