//! Incremental build tracking over a source repository.
//!
//! Classifies every code file as new, modified, unchanged, or deleted by
//! comparing its current (mtime, content hash) against the persisted
//! [`BuildCache`]. The content hash is authoritative: a file whose
//! modification time moved but whose bytes did not is unchanged, and a file
//! whose bytes changed is modified even if the clock disagrees.

use crate::cache::{BuildCache, FileState};
use crate::error::CacheError;
use anyhow::{Context, Result};
use ignore::WalkBuilder;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

/// File extensions considered source code for tracking purposes
pub const CODE_EXTENSIONS: &[&str] = &[
    "py", "js", "jsx", "ts", "tsx", "java", "kt", "kts", "c", "cpp", "h", "hpp", "cs", "go", "rb",
    "php", "rs", "xml", "swift", "m", "mm", "scala",
];

/// Outcome of one change-detection pass
#[derive(Debug, Default)]
pub struct ChangeReport {
    /// Repository-relative paths seen for the first time
    pub new: Vec<String>,
    /// Repository-relative paths whose content hash changed
    pub modified: Vec<String>,
    /// Repository-relative paths newly detected as deleted
    pub deleted: Vec<String>,
    /// Count of files whose content is unchanged
    pub unchanged: usize,
}

impl ChangeReport {
    /// True when nothing needs reprocessing
    pub fn is_clean(&self) -> bool {
        self.new.is_empty() && self.modified.is_empty() && self.deleted.is_empty()
    }

    /// Absolute paths of the files that must be (re)processed this cycle
    pub fn changed_paths(&self, repo_root: &Path) -> Vec<PathBuf> {
        self.new
            .iter()
            .chain(self.modified.iter())
            .map(|rel| repo_root.join(rel))
            .collect()
    }
}

/// Tracks per-file state for one repository across build cycles
pub struct IncrementalTracker {
    repo_root: PathBuf,
    repo_name: String,
    cache_path: PathBuf,
    cache: BuildCache,
}

impl IncrementalTracker {
    /// Create a tracker for a repository, loading its persisted cache.
    pub fn new(repo_root: impl AsRef<Path>, cache_dir: &Path) -> Result<Self> {
        let repo_root = repo_root
            .as_ref()
            .canonicalize()
            .with_context(|| format!("Repository not found: {:?}", repo_root.as_ref()))?;

        let repo_name = repo_root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "repository".to_string());

        let cache_path = BuildCache::path_for(cache_dir, &repo_name);
        let cache = BuildCache::load(&cache_path);

        Ok(Self {
            repo_root,
            repo_name,
            cache_path,
            cache,
        })
    }

    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    pub fn repo_name(&self) -> &str {
        &self.repo_name
    }

    /// Scan the repository and classify every code file against the cache.
    ///
    /// Mutates only the in-memory cache (deletion marks, refreshed mtimes);
    /// nothing is persisted until [`commit`](Self::commit).
    pub fn detect_changes(&mut self) -> Result<ChangeReport> {
        let current_files = self.scan_code_files()?;
        let mut report = ChangeReport::default();

        for rel_path in &current_files {
            let abs_path = self.repo_root.join(rel_path);
            let current = match file_state(&abs_path) {
                Ok(state) => state,
                Err(e) => {
                    // An unreadable file is scheduled for reprocessing; the
                    // pipeline isolates the failure at that file.
                    tracing::warn!("Failed to stat {}: {}", rel_path, e);
                    report.modified.push(rel_path.clone());
                    continue;
                }
            };

            self.cache.mark_present(rel_path);

            match self.cache.files.get(rel_path).cloned() {
                None => report.new.push(rel_path.clone()),
                Some(cached) => {
                    if cached.hash() == current.hash() {
                        report.unchanged += 1;
                        // A touch without an edit refreshes the stored mtime
                        // so it is not re-examined as suspicious next cycle.
                        if cached.mtime() != current.mtime() {
                            self.cache.files.insert(rel_path.clone(), current);
                        }
                    } else {
                        report.modified.push(rel_path.clone());
                    }
                }
            }
        }

        let cached_paths: Vec<String> = self.cache.files.keys().cloned().collect();
        for rel_path in cached_paths {
            if !current_files.contains(&rel_path) && self.cache.mark_deleted(&rel_path) {
                report.deleted.push(rel_path);
            }
        }

        if !report.is_clean() {
            tracing::info!(
                "Repository changes: {} new, {} modified, {} deleted, {} unchanged",
                report.new.len(),
                report.modified.len(),
                report.deleted.len(),
                report.unchanged
            );
        }

        Ok(report)
    }

    /// Record the freshly observed state of processed files in the cache.
    pub fn record_processed(&mut self, abs_paths: &[PathBuf]) {
        for abs_path in abs_paths {
            let rel_path = match abs_path.strip_prefix(&self.repo_root) {
                Ok(rel) => rel.to_string_lossy().to_string(),
                Err(_) => continue,
            };
            match file_state(abs_path) {
                Ok(state) => self.cache.record(&rel_path, state),
                Err(e) => tracing::warn!("Failed to update cache for {}: {}", rel_path, e),
            }
        }
    }

    /// Persist the cache at cycle end. Failure is downgraded to a warning.
    pub fn commit(&self) {
        if let Err(e) = self.cache.save(&self.cache_path) {
            tracing::warn!("Failed to save cache file: {:#}", e);
        }
    }

    /// Walk the repository collecting relative paths of code files.
    fn scan_code_files(&self) -> Result<BTreeSet<String>> {
        let mut files = BTreeSet::new();

        let walker = WalkBuilder::new(&self.repo_root)
            .standard_filters(true)
            .hidden(false)
            .git_ignore(true)
            .require_git(false)
            .build();

        for entry in walker {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if path.is_dir() {
                continue;
            }
            if path
                .components()
                .any(|c| c.as_os_str() == ".git" || c.as_os_str() == "node_modules")
            {
                continue;
            }

            let is_code = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|ext| CODE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
                .unwrap_or(false);
            if !is_code {
                continue;
            }

            let rel_path = path
                .strip_prefix(&self.repo_root)
                .unwrap_or(path)
                .to_string_lossy()
                .to_string();
            files.insert(rel_path);
        }

        tracing::debug!("Found {} code files in repository", files.len());
        Ok(files)
    }
}

/// Current (mtime, content hash) of a file on disk
pub fn file_state(path: &Path) -> Result<FileState, CacheError> {
    let stat_err = |e: std::io::Error| CacheError::StatFailed {
        file: path.display().to_string(),
        reason: e.to_string(),
    };

    let metadata = fs::metadata(path).map_err(stat_err)?;
    let mtime = metadata
        .modified()
        .map_err(stat_err)?
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0);

    let content = fs::read(path).map_err(stat_err)?;
    let mut hasher = Sha256::new();
    hasher.update(&content);
    let hash = format!("{:x}", hasher.finalize());

    Ok(FileState(mtime, hash))
}
