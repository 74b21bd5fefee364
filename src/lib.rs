//! # Repo Chunker - Structural Code Chunking with Incremental Rebuilds
//!
//! Extracts structurally meaningful fragments (classes, functions, methods,
//! constructors) from source files using tree-sitter pattern queries,
//! attaches provenance metadata (imports, references, parent linkage, line
//! ranges), and keeps repeated runs consistent by recomputing only what
//! changed.
//!
//! ## Pipeline
//!
//! ```text
//! repository ──▶ IncrementalTracker ──▶ changed file set
//!                     │
//!                     ▼
//!                 Curator ──▶ curated markdown documents
//!                     │
//!                     ▼
//!              ChunkerRegistry ──▶ per-language chunk extraction
//!                     │
//!                     ▼
//!               RecordStore ──▶ JSONL chunk records (whole-file merge)
//! ```
//!
//! ## Modules
//!
//! - [`chunker`]: tree-sitter driven chunk extraction, one extractor per
//!   language (Java, JavaScript, Kotlin, Objective-C, Python)
//! - [`curator`]: wraps repository sources into curated markdown documents
//! - [`curated`]: parses curated documents back into code plus metadata
//! - [`writer`]: stable chunk identities and JSONL persistence
//! - [`tracker`]: per-file change classification over a persisted cache
//! - [`cache`]: the persisted (mtime, hash) file-state cache
//! - [`pipeline`]: orchestration of one full or incremental build cycle
//! - [`config`]: configuration with file, environment, and default layers
//! - [`error`]: error types and utilities
//! - [`paths`]: platform path helpers
//!
//! ## Usage Example
//!
//! ```no_run
//! use repo_chunker::config::Config;
//! use repo_chunker::pipeline::Pipeline;
//!
//! fn main() -> anyhow::Result<()> {
//!     let pipeline = Pipeline::new("/path/to/repo", Config::from_env(), true);
//!     let report = pipeline.run()?;
//!     println!("{} chunks written", report.chunks_written);
//!     Ok(())
//! }
//! ```

/// Persisted file-state cache for incremental builds
pub mod cache;

/// Tree-sitter driven structural chunk extraction
pub mod chunker;

/// Configuration with file, environment, and default layers
pub mod config;

/// Curated markdown document parsing
pub mod curated;

/// Source curation into per-file markdown documents
pub mod curator;

/// Error types and utilities
pub mod error;

/// Platform-specific path computation
pub mod paths;

/// Pipeline orchestration for full and incremental cycles
pub mod pipeline;

/// Incremental change classification over a repository
pub mod tracker;

/// Chunk record identities and JSONL persistence
pub mod writer;
