//! Structural chunk extraction driven by tree-sitter pattern queries.
//!
//! One [`LanguageChunker`] implementation per language, each owning its own
//! compiled pattern set. The shared capture-walking skeleton lives in
//! [`walk`], parameterized by per-language declaration tables.

mod engine;
mod java;
mod javascript;
mod kotlin;
mod objc;
mod python;
mod walk;

pub use java::JavaChunker;
pub use javascript::JavaScriptChunker;
pub use kotlin::KotlinChunker;
pub use objc::ObjectiveCChunker;
pub use python::PythonChunker;

use crate::error::ChunkError;
use std::collections::HashMap;
use std::fmt;

/// Kind of structural unit a chunk represents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkKind {
    Class,
    Interface,
    Protocol,
    Category,
    Function,
    Method,
    Constructor,
    ArrowFunction,
    ClassImplementation,
    CategoryImplementation,
}

impl ChunkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkKind::Class => "class",
            ChunkKind::Interface => "interface",
            ChunkKind::Protocol => "protocol",
            ChunkKind::Category => "category",
            ChunkKind::Function => "function",
            ChunkKind::Method => "method",
            ChunkKind::Constructor => "constructor",
            ChunkKind::ArrowFunction => "arrow_function",
            ChunkKind::ClassImplementation => "class_implementation",
            ChunkKind::CategoryImplementation => "category_implementation",
        }
    }
}

impl fmt::Display for ChunkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One extracted structural unit of source code
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Exact source text spanned by the declaration node
    pub content: String,
    pub kind: ChunkKind,
    /// Declared identifier, or a synthesized placeholder for anonymous
    /// constructs
    pub name: String,
    /// Name of the lexically enclosing declaration; `None` for top-level
    pub parent: Option<String>,
    /// 1-indexed, inclusive
    pub start_line: usize,
    /// 1-indexed, inclusive
    pub end_line: usize,
    /// File-scope import statements, shared by every chunk of the file
    pub imports: Vec<String>,
    /// Deduplicated, sorted identifier set with keywords excluded
    pub references: Vec<String>,
    pub language: &'static str,
}

/// Per-language structural extraction
pub trait LanguageChunker {
    /// Canonical language tag this chunker handles
    fn language(&self) -> &'static str;

    /// Extract all chunks from one source file
    fn chunk(&mut self, source: &str) -> Result<Vec<Chunk>, ChunkError>;
}

/// Normalize a language tag to the canonical name a chunker is registered
/// under
fn canonical_tag(tag: &str) -> &str {
    match tag {
        "py" => "python",
        "js" => "javascript",
        "kt" | "kts" => "kotlin",
        other => other,
    }
}

/// Registry of all available language chunkers.
///
/// Chunkers are constructed eagerly; a language whose pattern set fails to
/// compile is skipped with a warning, and files tagged with it surface as
/// unsupported.
pub struct ChunkerRegistry {
    chunkers: HashMap<&'static str, Box<dyn LanguageChunker>>,
}

impl ChunkerRegistry {
    pub fn new() -> Self {
        let constructors: Vec<fn() -> Result<Box<dyn LanguageChunker>, ChunkError>> = vec![
            || Ok(Box::new(JavaChunker::new()?)),
            || Ok(Box::new(JavaScriptChunker::new()?)),
            || Ok(Box::new(KotlinChunker::new()?)),
            || Ok(Box::new(ObjectiveCChunker::new()?)),
            || Ok(Box::new(PythonChunker::new()?)),
        ];

        let mut chunkers: HashMap<&'static str, Box<dyn LanguageChunker>> = HashMap::new();
        for construct in constructors {
            match construct() {
                Ok(chunker) => {
                    chunkers.insert(chunker.language(), chunker);
                }
                Err(e) => tracing::warn!("Skipping language chunker: {}", e),
            }
        }

        Self { chunkers }
    }

    /// Canonical tags of the registered languages, sorted
    pub fn supported_languages(&self) -> Vec<&'static str> {
        let mut tags: Vec<&'static str> = self.chunkers.keys().copied().collect();
        tags.sort_unstable();
        tags
    }

    pub fn supports(&self, tag: &str) -> bool {
        self.chunkers.contains_key(canonical_tag(tag))
    }

    /// Chunk one source file in the given language
    pub fn chunk(&mut self, tag: &str, source: &str) -> Result<Vec<Chunk>, ChunkError> {
        match self.chunkers.get_mut(canonical_tag(tag)) {
            Some(chunker) => chunker.chunk(source),
            None => Err(ChunkError::UnsupportedLanguage(tag.to_string())),
        }
    }
}

impl Default for ChunkerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_registers_all_languages() {
        let registry = ChunkerRegistry::new();
        for tag in ["java", "javascript", "kotlin", "objc", "python"] {
            assert!(registry.supports(tag), "missing chunker for {tag}");
        }
    }

    #[test]
    fn test_registry_resolves_aliases() {
        let registry = ChunkerRegistry::new();
        assert!(registry.supports("py"));
        assert!(registry.supports("js"));
        assert!(registry.supports("kt"));
    }

    #[test]
    fn test_unsupported_language_is_error() {
        let mut registry = ChunkerRegistry::new();
        let err = registry.chunk("cobol", "IDENTIFICATION DIVISION.").unwrap_err();
        assert!(matches!(err, ChunkError::UnsupportedLanguage(_)));
    }

    #[test]
    fn test_chunk_kind_strings() {
        assert_eq!(ChunkKind::ArrowFunction.as_str(), "arrow_function");
        assert_eq!(ChunkKind::ClassImplementation.as_str(), "class_implementation");
        assert_eq!(ChunkKind::Method.to_string(), "method");
    }
}
