//! Chunk record store: stable identities and append-friendly JSONL
//! persistence with whole-file replacement semantics.

use crate::chunker::Chunk;
use crate::curated::CuratedDoc;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// One persisted chunk with pipeline metadata.
///
/// The chunk type is duplicated under `type` and `code_type` for backward
/// compatibility with existing consumers; `dependencies` and `methods` are
/// reserved and currently always empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub id: String,
    pub text: String,
    pub source: String,
    pub filename: String,
    pub filepath: String,
    pub language: String,
    pub repository: String,
    pub chunk_index: usize,
    #[serde(rename = "type")]
    pub chunk_type: String,
    pub code_type: String,
    pub name: String,
    pub parent: Option<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub methods: Vec<String>,
    pub start_line: usize,
    pub end_line: usize,
    pub imports: Vec<String>,
    pub references: Vec<String>,
}

/// Stable chunk identity: a digest of the source path and the chunk's
/// composite key. Pure function of its inputs, so re-running extraction on
/// unchanged input reproduces identical identities.
pub fn chunk_uid(source: &str, chunk_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{source}:{chunk_key}").as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Build the persisted record for one extracted chunk.
///
/// `index` is the chunk's position among the chunks extracted from its
/// file; the composite key `filename:type:index` feeds the identity digest.
pub fn record_for(
    chunk: &Chunk,
    index: usize,
    source: &str,
    doc: &CuratedDoc,
    repository: &str,
) -> ChunkRecord {
    let chunk_type = chunk.kind.as_str().to_string();
    let chunk_key = format!("{}:{}:{}", doc.filename, chunk_type, index);

    ChunkRecord {
        id: chunk_uid(source, &chunk_key),
        text: chunk.content.clone(),
        source: source.to_string(),
        filename: doc.filename.clone(),
        filepath: doc.filepath.clone(),
        language: chunk.language.to_string(),
        repository: repository.to_string(),
        chunk_index: index,
        code_type: chunk_type.clone(),
        chunk_type,
        name: chunk.name.clone(),
        parent: chunk.parent.clone(),
        dependencies: vec![],
        methods: vec![],
        start_line: chunk.start_line,
        end_line: chunk.end_line,
        imports: chunk.imports.clone(),
        references: chunk.references.clone(),
    }
}

/// JSONL-backed record store for one repository
pub struct RecordStore {
    output_path: PathBuf,
    /// Records carried over from the previous run (incremental mode only),
    /// in their original file order
    existing: Vec<ChunkRecord>,
}

impl RecordStore {
    /// Open the store for a repository. In incremental mode the previous
    /// run's records are loaded so unmodified files keep their chunks; a
    /// missing or corrupt record file degrades to empty with a warning.
    pub fn open(chunks_dir: &Path, repo_name: &str, incremental: bool) -> Self {
        let output_path = chunks_dir.join(format!("{repo_name}_code_chunks_ast.jsonl"));

        let mut existing = Vec::new();
        if incremental && output_path.exists() {
            match fs::read_to_string(&output_path) {
                Ok(content) => {
                    for (line_no, line) in content.lines().enumerate() {
                        if line.trim().is_empty() {
                            continue;
                        }
                        match serde_json::from_str::<ChunkRecord>(line) {
                            Ok(record) => existing.push(record),
                            Err(e) => {
                                tracing::warn!(
                                    "Skipping malformed record at {}:{}: {}",
                                    output_path.display(),
                                    line_no + 1,
                                    e
                                );
                            }
                        }
                    }
                    tracing::debug!("Loaded {} existing chunk records", existing.len());
                }
                Err(e) => {
                    tracing::warn!("Failed to load existing chunks: {}", e);
                }
            }
        }

        Self {
            output_path,
            existing,
        }
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Merge fresh records with retained ones and persist.
    ///
    /// Every record whose source is in `processed_sources` is replaced by
    /// the fresh set — wholesale, even when a reprocessed source now yields
    /// fewer or zero chunks. Records of untouched sources are preserved
    /// verbatim, in their original order.
    pub fn merge_and_save(
        &self,
        fresh: Vec<ChunkRecord>,
        processed_sources: &BTreeSet<String>,
    ) -> Result<usize> {
        let retained = self
            .existing
            .iter()
            .filter(|record| !processed_sources.contains(&record.source));

        if let Some(parent) = self.output_path.parent() {
            fs::create_dir_all(parent).context("Failed to create chunks directory")?;
        }

        let file = fs::File::create(&self.output_path)
            .with_context(|| format!("Failed to write {}", self.output_path.display()))?;
        let mut writer = BufWriter::new(file);

        let mut count = 0;
        for record in retained.chain(fresh.iter()) {
            let line = serde_json::to_string(record).context("Failed to serialize chunk")?;
            writer.write_all(line.as_bytes())?;
            writer.write_all(b"\n")?;
            count += 1;
        }
        writer.flush()?;

        tracing::info!("Saved {} chunks to {}", count, self.output_path.display());
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunker::ChunkKind;

    fn sample_doc() -> CuratedDoc {
        CuratedDoc {
            filename: "Foo.java".to_string(),
            filepath: "src/Foo.java".to_string(),
            language: "java".to_string(),
            code: String::new(),
        }
    }

    fn sample_chunk(name: &str) -> Chunk {
        Chunk {
            content: format!("class {name} {{}}"),
            kind: ChunkKind::Class,
            name: name.to_string(),
            parent: None,
            start_line: 1,
            end_line: 1,
            imports: vec![],
            references: vec![],
            language: "java",
        }
    }

    fn sample_record(source: &str, name: &str, index: usize) -> ChunkRecord {
        record_for(&sample_chunk(name), index, source, &sample_doc(), "repo")
    }

    #[test]
    fn test_identity_is_deterministic() {
        let a = chunk_uid("curated/Foo.java.md", "Foo.java:class:0");
        let b = chunk_uid("curated/Foo.java.md", "Foo.java:class:0");
        assert_eq!(a, b);

        let c = chunk_uid("curated/Foo.java.md", "Foo.java:class:1");
        assert_ne!(a, c);
    }

    #[test]
    fn test_record_fields() {
        let record = sample_record("curated/Foo.java.md", "Foo", 0);
        assert_eq!(record.chunk_type, "class");
        assert_eq!(record.code_type, "class");
        assert_eq!(record.repository, "repo");
        assert_eq!(record.chunk_index, 0);
        assert!(record.dependencies.is_empty());
    }

    #[test]
    fn test_record_json_shape() {
        let record = sample_record("s.md", "Foo", 0);
        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&record).unwrap()).unwrap();

        assert_eq!(json["type"], "class");
        assert_eq!(json["code_type"], "class");
        assert!(json["parent"].is_null());
        assert!(json["methods"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_whole_file_replacement() {
        let dir = tempfile::tempdir().unwrap();

        // First run: files A and B
        let store = RecordStore::open(dir.path(), "repo", false);
        store
            .merge_and_save(
                vec![
                    sample_record("A.md", "Alpha", 0),
                    sample_record("A.md", "Beta", 1),
                    sample_record("B.md", "Gamma", 0),
                ],
                &BTreeSet::from(["A.md".to_string(), "B.md".to_string()]),
            )
            .unwrap();

        // Second run: only A reprocessed, now with one chunk
        let store = RecordStore::open(dir.path(), "repo", true);
        let count = store
            .merge_and_save(
                vec![sample_record("A.md", "AlphaPrime", 0)],
                &BTreeSet::from(["A.md".to_string()]),
            )
            .unwrap();
        assert_eq!(count, 2);

        let content = fs::read_to_string(store.output_path()).unwrap();
        let records: Vec<ChunkRecord> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        // B's record preserved verbatim, A's stale records gone
        assert_eq!(records.len(), 2);
        assert!(records.iter().any(|r| r.source == "B.md" && r.name == "Gamma"));
        assert!(records.iter().any(|r| r.source == "A.md" && r.name == "AlphaPrime"));
        assert!(!records.iter().any(|r| r.name == "Alpha"));
    }

    #[test]
    fn test_reprocessed_file_with_zero_chunks_drops_records() {
        let dir = tempfile::tempdir().unwrap();

        let store = RecordStore::open(dir.path(), "repo", false);
        store
            .merge_and_save(
                vec![sample_record("A.md", "Alpha", 0)],
                &BTreeSet::from(["A.md".to_string()]),
            )
            .unwrap();

        let store = RecordStore::open(dir.path(), "repo", true);
        let count = store
            .merge_and_save(vec![], &BTreeSet::from(["A.md".to_string()]))
            .unwrap();

        assert_eq!(count, 0);
        let content = fs::read_to_string(store.output_path()).unwrap();
        assert!(content.trim().is_empty());
    }

    #[test]
    fn test_corrupt_store_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("repo_code_chunks_ast.jsonl");
        fs::write(&path, "not json\n").unwrap();

        let store = RecordStore::open(dir.path(), "repo", true);
        assert!(store.existing.is_empty());
    }
}
