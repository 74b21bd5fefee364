//! Pipeline orchestration: curation, chunk extraction, persistence, and
//! cache bookkeeping, in full or incremental mode.

use crate::chunker::ChunkerRegistry;
use crate::config::Config;
use crate::curated::parse_curated;
use crate::error::{ChunkerError, CurationError};
use crate::curator::Curator;
use crate::tracker::IncrementalTracker;
use crate::writer::{record_for, ChunkRecord, RecordStore};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Instant;
use walkdir::WalkDir;

/// Summary of one pipeline run
#[derive(Debug, Default)]
pub struct PipelineReport {
    pub files_curated: usize,
    pub files_chunked: usize,
    pub chunks_written: usize,
    pub new_files: usize,
    pub modified_files: usize,
    pub deleted_files: usize,
    /// Per-file failures (contained; never abort the batch)
    pub errors: Vec<String>,
    pub duration_ms: u64,
}

/// Orchestrates one build cycle over a repository
pub struct Pipeline {
    config: Config,
    repo_root: PathBuf,
    incremental: bool,
}

impl Pipeline {
    pub fn new(repo_root: impl AsRef<Path>, config: Config, incremental: bool) -> Self {
        Self {
            config,
            repo_root: repo_root.as_ref().to_path_buf(),
            incremental,
        }
    }

    /// Report pending changes without processing or persisting anything.
    pub fn status(&self) -> Result<PipelineReport, ChunkerError> {
        let mut tracker =
            IncrementalTracker::new(&self.repo_root, &self.config.tracking.cache_dir)?;
        let changes = tracker.detect_changes()?;

        Ok(PipelineReport {
            new_files: changes.new.len(),
            modified_files: changes.modified.len(),
            deleted_files: changes.deleted.len(),
            ..Default::default()
        })
    }

    /// Run one build cycle: curate, chunk, persist, update the cache.
    pub fn run(&self) -> Result<PipelineReport, ChunkerError> {
        let start = Instant::now();
        let mut tracker =
            IncrementalTracker::new(&self.repo_root, &self.config.tracking.cache_dir)?;
        let repo_name = tracker.repo_name().to_string();
        let mut report = PipelineReport::default();

        // Change detection decides the file set to (re)process
        let changed: Option<Vec<PathBuf>> = if self.incremental {
            let changes = tracker.detect_changes()?;
            report.new_files = changes.new.len();
            report.modified_files = changes.modified.len();
            report.deleted_files = changes.deleted.len();

            let paths = changes.changed_paths(tracker.repo_root());
            if paths.is_empty() {
                tracing::info!("No files have changed since last build");
                tracker.commit();
                report.duration_ms = start.elapsed().as_millis() as u64;
                return Ok(report);
            }
            Some(paths)
        } else {
            None
        };

        // Curation
        let curator = Curator::new(
            tracker.repo_root(),
            &self.config.curated_dir(),
            &repo_name,
            self.config.curation.max_file_size,
            &self.config.curation.extra_ignore_patterns,
        )?;
        let curated_files = match &changed {
            Some(files) => curator.curate_files(files)?,
            None => curator.curate_all()?,
        };
        report.files_curated = curated_files.len();

        // Chunk extraction over the curated documents. Incremental mode
        // touches only the re-curated files; full mode sweeps the whole
        // curated directory.
        let inputs = match &changed {
            Some(_) => curated_files,
            None => collect_curated_files(curator.output_dir()),
        };

        let mut registry = ChunkerRegistry::new();
        let stage = chunk_files(&inputs, &mut registry, &repo_name);
        report.files_chunked = stage.files_chunked;
        report.errors = stage.errors;

        let store = RecordStore::open(&self.config.chunks_dir(), &repo_name, self.incremental);
        report.chunks_written = store.merge_and_save(stage.records, &stage.processed_sources)?;

        // Cache bookkeeping happens only for incremental cycles; a full run
        // leaves the tracker state untouched.
        if let Some(files) = &changed {
            tracker.record_processed(files);
        }
        tracker.commit();

        report.duration_ms = start.elapsed().as_millis() as u64;
        Ok(report)
    }
}

/// Outcome of the chunk-extraction stage
#[derive(Debug, Default)]
pub struct ChunkStage {
    pub records: Vec<ChunkRecord>,
    /// Sources successfully reprocessed this run; the writer wholly
    /// replaces their records (a failed file keeps its prior records)
    pub processed_sources: BTreeSet<String>,
    pub files_chunked: usize,
    pub errors: Vec<String>,
}

/// Chunk a set of curated documents, containing failures per file.
pub fn chunk_files(
    inputs: &[PathBuf],
    registry: &mut ChunkerRegistry,
    repo_name: &str,
) -> ChunkStage {
    let mut stage = ChunkStage::default();

    for path in inputs {
        let source = path.to_string_lossy().to_string();
        match chunk_one_file(path, &source, registry, repo_name) {
            Ok(records) => {
                tracing::debug!("Processed {}: {} chunks", source, records.len());
                stage.processed_sources.insert(source);
                stage.files_chunked += 1;
                stage.records.extend(records);
            }
            Err(e) => {
                tracing::warn!("Error processing {}: {}", source, e);
                stage.errors.push(format!("{source}: {e}"));
            }
        }
    }

    stage
}

fn chunk_one_file(
    path: &Path,
    source: &str,
    registry: &mut ChunkerRegistry,
    repo_name: &str,
) -> Result<Vec<ChunkRecord>, ChunkerError> {
    let content =
        std::fs::read_to_string(path).map_err(|e| CurationError::FileReadFailed {
            file: source.to_string(),
            reason: e.to_string(),
        })?;

    let doc = parse_curated(&content, source)?;
    let chunks = registry.chunk(&doc.language, &doc.code)?;

    // The positional index spans every extracted chunk, including any whose
    // content is blank and therefore not persisted, so identities stay
    // stable regardless of filtering.
    let records = chunks
        .iter()
        .enumerate()
        .filter(|(_, chunk)| !chunk.content.trim().is_empty())
        .map(|(index, chunk)| record_for(chunk, index, source, &doc, repo_name))
        .collect();

    Ok(records)
}

/// Curated documents under a directory, skipping repository metadata
pub fn collect_curated_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "md"))
        .filter(|e| e.file_name() != "_repo_metadata.md")
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_collect_curated_files_skips_metadata() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.py.md"), "x").unwrap();
        fs::write(dir.path().join("_repo_metadata.md"), "x").unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();

        let files = collect_curated_files(dir.path());
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("a.py.md"));
    }

    #[test]
    fn test_chunk_files_contains_failures() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("a.py.md");
        fs::write(
            &good,
            "# a.py\n\nProgramming language: python\n\n```python\ndef f():\n    pass\n```\n",
        )
        .unwrap();
        let bad = dir.path().join("b.rs.md");
        fs::write(
            &bad,
            "# b.rs\n\nProgramming language: rust\n\n```rust\nfn main() {}\n```\n",
        )
        .unwrap();

        let mut registry = ChunkerRegistry::new();
        let stage = chunk_files(&[good.clone(), bad], &mut registry, "repo");

        // The unsupported file fails in isolation; the good one is chunked
        assert_eq!(stage.files_chunked, 1);
        assert_eq!(stage.errors.len(), 1);
        assert!(stage.processed_sources.contains(&good.to_string_lossy().to_string()));
        assert_eq!(stage.records.len(), 1);
        assert_eq!(stage.records[0].name, "f");
    }
}
