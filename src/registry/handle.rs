#![forbid(unsafe_code)]

//! Process-wide registry handle with copy-on-write reloads
//!
//! Readers take an `Arc` to the current snapshot and keep using it for the
//! whole call, so a concurrent reload never changes what an in-flight
//! transformation sees. Reloads are serialized and publish by swapping the
//! `Arc`; a reload that fails leaves the previous snapshot in place.

use crate::error::RegistryError;
use crate::registry::loader::SourcePatterns;
use crate::registry::record::DecoratorRecord;
use crate::registry::snapshot::{RegistryBuilder, RegistrySnapshot};
use crate::version::Version;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Instant;

/// Everything needed to (re)build a snapshot
#[derive(Debug, Clone)]
pub struct RegistrySource {
    pub standard: Version,
    pub dirs: Vec<PathBuf>,
    pub patterns: SourcePatterns,
    /// Records registered in code, added after the directories
    pub records: Vec<DecoratorRecord>,
}

impl RegistrySource {
    pub fn new(standard: Version) -> Self {
        Self {
            standard,
            dirs: Vec::new(),
            patterns: SourcePatterns::default(),
            records: Vec::new(),
        }
    }

    pub fn dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dirs.push(dir.into());
        self
    }

    pub fn patterns(mut self, patterns: SourcePatterns) -> Self {
        self.patterns = patterns;
        self
    }

    pub fn record(mut self, record: DecoratorRecord) -> Self {
        self.records.push(record);
        self
    }

    /// Build a fresh snapshot from every source
    ///
    /// # Errors
    ///
    /// Returns the first `RegistryError` encountered; nothing is partially
    /// loaded.
    pub fn load(&self) -> Result<RegistrySnapshot, RegistryError> {
        let mut builder =
            RegistryBuilder::new(self.standard.clone()).with_patterns(self.patterns.clone());
        for dir in &self.dirs {
            builder.load_dir(dir)?;
        }
        for record in &self.records {
            builder.register(record.clone())?;
        }
        Ok(builder.build())
    }
}

/// Shared owner of the current registry snapshot
#[derive(Debug)]
pub struct RegistryHandle {
    source: RegistrySource,
    /// Serializes reloads
    reload_lock: Mutex<()>,
    current: RwLock<Arc<RegistrySnapshot>>,
}

impl RegistryHandle {
    /// Load the initial snapshot
    ///
    /// # Errors
    ///
    /// Returns `RegistryError` if the sources cannot be loaded.
    pub fn init(source: RegistrySource) -> Result<Self, RegistryError> {
        let start = Instant::now();
        let snapshot = source.load()?;
        tracing::info!(
            records = snapshot.len(),
            elapsed_ms = elapsed_ms(start),
            "Registry loaded"
        );
        Ok(Self {
            source,
            reload_lock: Mutex::new(()),
            current: RwLock::new(Arc::new(snapshot)),
        })
    }

    /// Wrap an already-built snapshot; reloads use `source`
    pub fn with_snapshot(source: RegistrySource, snapshot: RegistrySnapshot) -> Self {
        Self {
            source,
            reload_lock: Mutex::new(()),
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// The currently published snapshot
    pub fn current(&self) -> Arc<RegistrySnapshot> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Rebuild from the sources and publish the result
    ///
    /// # Errors
    ///
    /// Returns `RegistryError` if loading fails; the previous snapshot stays
    /// published.
    pub fn reload(&self) -> Result<Arc<RegistrySnapshot>, RegistryError> {
        let _guard = self.reload_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let start = Instant::now();

        let snapshot = match self.source.load() {
            Ok(snapshot) => Arc::new(snapshot),
            Err(e) => {
                tracing::warn!(error = %e, "Registry reload failed, keeping previous snapshot");
                return Err(e);
            }
        };

        let previous = self.publish(Arc::clone(&snapshot));
        tracing::info!(
            records = snapshot.len(),
            previous_records = previous.len(),
            elapsed_ms = elapsed_ms(start),
            "Registry reloaded"
        );
        Ok(snapshot)
    }

    /// Publish `snapshot` directly, returning the one it replaced
    pub fn replace(&self, snapshot: RegistrySnapshot) -> Arc<RegistrySnapshot> {
        let _guard = self.reload_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.publish(Arc::new(snapshot))
    }

    fn publish(&self, snapshot: Arc<RegistrySnapshot>) -> Arc<RegistrySnapshot> {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *current, snapshot)
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::record::RecordBuilder;
    use std::fs;
    use std::thread;
    use tempfile::TempDir;

    fn write_record(dir: &std::path::Path, file: &str, name: &str, version: &str) {
        fs::write(
            dir.join(file),
            format!(
                "[decorator]\nname = \"{}\"\nversion = \"{}\"\n\n[template]\ninstruction = \"{} instruction\"\n",
                name, version, name
            ),
        )
        .unwrap();
    }

    fn source(dir: &std::path::Path) -> RegistrySource {
        RegistrySource::new(Version::new(1, 0, 0)).dir(dir)
    }

    #[test]
    fn test_init_and_reload_swaps_snapshot() {
        let temp = TempDir::new().unwrap();
        write_record(temp.path(), "a.toml", "Alpha", "1.0.0");

        let handle = RegistryHandle::init(source(temp.path())).unwrap();
        let before = handle.current();
        assert_eq!(before.len(), 1);

        write_record(temp.path(), "b.toml", "Beta", "1.0.0");
        let after = handle.reload().unwrap();
        assert_eq!(after.len(), 2);
        assert_eq!(handle.current().len(), 2);

        // Readers holding the old snapshot are unaffected
        assert_eq!(before.len(), 1);
        assert!(!before.contains("Beta"));
    }

    #[test]
    fn test_failed_reload_keeps_previous_snapshot() {
        let temp = TempDir::new().unwrap();
        write_record(temp.path(), "a.toml", "Alpha", "1.0.0");
        let handle = RegistryHandle::init(source(temp.path())).unwrap();

        write_record(temp.path(), "b.toml", "Alpha", "1.0.0");
        assert!(matches!(
            handle.reload(),
            Err(RegistryError::DuplicateDefinition { .. })
        ));
        assert_eq!(handle.current().len(), 1);
    }

    #[test]
    fn test_runtime_records_survive_reload() {
        let temp = TempDir::new().unwrap();
        let runtime = RecordBuilder::new("Inline", "1.0.0")
            .instruction("Inline instruction")
            .build()
            .unwrap();
        let handle = RegistryHandle::init(source(temp.path()).record(runtime)).unwrap();
        assert!(handle.current().contains("Inline"));
        assert!(handle.reload().unwrap().contains("Inline"));
    }

    #[test]
    fn test_replace_returns_previous() {
        let handle = RegistryHandle::with_snapshot(
            RegistrySource::new(Version::new(1, 0, 0)),
            RegistrySnapshot::empty(Version::new(1, 0, 0)),
        );
        let mut builder = RegistryBuilder::new(Version::new(1, 0, 0));
        builder
            .register(RecordBuilder::new("X", "1.0.0").instruction("x").build().unwrap())
            .unwrap();

        let previous = handle.replace(builder.build());
        assert!(previous.is_empty());
        assert_eq!(handle.current().len(), 1);
    }

    #[test]
    fn test_concurrent_readers_during_reload() {
        let temp = TempDir::new().unwrap();
        write_record(temp.path(), "a.toml", "Alpha", "1.0.0");
        let handle = Arc::new(RegistryHandle::init(source(temp.path())).unwrap());

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let handle = Arc::clone(&handle);
                thread::spawn(move || {
                    for _ in 0..50 {
                        let snapshot = handle.current();
                        assert!(snapshot.contains("Alpha"));
                    }
                })
            })
            .collect();

        for _ in 0..5 {
            handle.reload().unwrap();
        }
        for reader in readers {
            reader.join().unwrap();
        }
    }
}
