//! Persisted per-repository file state for incremental builds.
//!
//! The cache is loaded once at cycle start, mutated in memory, and saved once
//! at cycle end. Load and save failures are non-fatal: the pipeline degrades
//! to a full rebuild with a warning.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Last-observed state of one source file: `[mtime_secs, content_hash]`.
///
/// Serialized as a two-element JSON array to keep the on-disk format
/// `{"files": {"<rel path>": [mtime, hash]}, "deleted_files": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileState(pub f64, pub String);

impl FileState {
    pub fn mtime(&self) -> f64 {
        self.0
    }

    pub fn hash(&self) -> &str {
        &self.1
    }
}

/// Cache of file states for one repository
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BuildCache {
    /// Map of repository-relative path -> last observed (mtime, hash)
    #[serde(default)]
    pub files: BTreeMap<String, FileState>,

    /// Paths already reported as deleted; suppressed from future change
    /// reports until they reappear
    #[serde(default)]
    pub deleted_files: BTreeSet<String>,
}

impl BuildCache {
    /// Load cache from disk.
    ///
    /// A missing, unreadable, or malformed cache file degrades to an empty
    /// cache (full rebuild) rather than failing the pipeline.
    pub fn load(cache_path: &Path) -> Self {
        if !cache_path.exists() {
            tracing::debug!("Cache file not found, starting with empty cache");
            return Self::default();
        }

        let content = match fs::read_to_string(cache_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!("Failed to read cache file {:?}: {}", cache_path, e);
                return Self::default();
            }
        };

        match serde_json::from_str::<BuildCache>(&content) {
            Ok(cache) => {
                tracing::info!("Loaded cache with {} tracked files", cache.files.len());
                cache
            }
            Err(e) => {
                tracing::warn!("Failed to parse cache file {:?}: {}", cache_path, e);
                Self::default()
            }
        }
    }

    /// Save cache to disk. Errors are returned so the caller can downgrade
    /// them to a warning; a failed save never aborts a build cycle.
    pub fn save(&self, cache_path: &Path) -> anyhow::Result<()> {
        use anyhow::Context;

        if let Some(parent) = cache_path.parent() {
            fs::create_dir_all(parent).context("Failed to create cache directory")?;
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize cache")?;
        fs::write(cache_path, content).context("Failed to write cache file")?;

        tracing::debug!("Saved cache to {:?}", cache_path);
        Ok(())
    }

    /// Cache file location for a repository, one file per repository name
    pub fn path_for(cache_dir: &Path, repo_name: &str) -> PathBuf {
        cache_dir.join(format!("{}_file_state.json", repo_name))
    }

    /// Record the current state of a file, clearing any deletion mark
    pub fn record(&mut self, rel_path: &str, state: FileState) {
        self.deleted_files.remove(rel_path);
        self.files.insert(rel_path.to_string(), state);
    }

    /// Mark a path as deleted. Returns true if this is the first time the
    /// deletion is recorded (i.e. it should appear in the change report).
    pub fn mark_deleted(&mut self, rel_path: &str) -> bool {
        self.deleted_files.insert(rel_path.to_string())
    }

    /// Clear a deletion mark when a path reappears on disk
    pub fn mark_present(&mut self, rel_path: &str) {
        self.deleted_files.remove(rel_path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let cache_path = dir.path().join("repo_file_state.json");

        let mut cache = BuildCache::default();
        cache.record("src/Main.java", FileState(1718000000.5, "abc123".to_string()));
        cache.mark_deleted("src/Gone.java");

        cache.save(&cache_path).unwrap();
        let loaded = BuildCache::load(&cache_path);

        assert_eq!(loaded.files.len(), 1);
        assert_eq!(loaded.files["src/Main.java"].hash(), "abc123");
        assert!(loaded.deleted_files.contains("src/Gone.java"));
    }

    #[test]
    fn test_on_disk_format() {
        let mut cache = BuildCache::default();
        cache.record("a.py", FileState(10.0, "h".to_string()));

        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&cache).unwrap()).unwrap();
        assert_eq!(json["files"]["a.py"][0], 10.0);
        assert_eq!(json["files"]["a.py"][1], "h");
        assert!(json["deleted_files"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_load_missing_is_empty() {
        let cache = BuildCache::load(Path::new("/nonexistent/path/cache.json"));
        assert!(cache.files.is_empty());
        assert!(cache.deleted_files.is_empty());
    }

    #[test]
    fn test_load_corrupt_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let cache_path = dir.path().join("bad.json");
        fs::write(&cache_path, "{not json").unwrap();

        let cache = BuildCache::load(&cache_path);
        assert!(cache.files.is_empty());
    }

    #[test]
    fn test_record_clears_deletion() {
        let mut cache = BuildCache::default();
        assert!(cache.mark_deleted("a.py"));
        // Second mark is suppressed
        assert!(!cache.mark_deleted("a.py"));

        cache.record("a.py", FileState(1.0, "h".to_string()));
        assert!(!cache.deleted_files.contains("a.py"));
    }

    #[test]
    fn test_cache_path_per_repo() {
        let path = BuildCache::path_for(Path::new("/tmp/cache"), "myrepo");
        assert_eq!(path, PathBuf::from("/tmp/cache/myrepo_file_state.json"));
    }
}
