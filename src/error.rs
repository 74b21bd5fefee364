/// Centralized error types for repo-chunker using thiserror
///
/// Provides domain-specific error types for better error handling and user-facing messages.
use thiserror::Error;

/// Main error type for the chunking pipeline
#[derive(Error, Debug)]
pub enum ChunkerError {
    #[error("Chunking error: {0}")]
    Chunk(#[from] ChunkError),

    #[error("Curation error: {0}")]
    Curation(#[from] CurationError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Errors related to structural chunk extraction
#[derive(Error, Debug)]
pub enum ChunkError {
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("Failed to set parser language: {0}")]
    LanguageSetup(String),

    #[error("Failed to compile structural query: {0}")]
    QueryCompilation(String),

    #[error("Failed to parse source code")]
    ParseFailed,
}

/// Errors related to source curation and curated-document parsing
#[derive(Error, Debug)]
pub enum CurationError {
    #[error("Input directory not found: {0}")]
    DirectoryNotFound(String),

    #[error("Failed to read file '{file}': {reason}")]
    FileReadFailed { file: String, reason: String },

    #[error("Failed to write curated file '{file}': {reason}")]
    FileWriteFailed { file: String, reason: String },

    #[error("No fenced code block in curated document: {0}")]
    MissingCodeBlock(String),

    #[error("Invalid ignore pattern: {0}")]
    InvalidPattern(String),
}

/// Errors related to the persisted build cache
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Failed to load cache from '{path}': {reason}")]
    LoadFailed { path: String, reason: String },

    #[error("Failed to save cache to '{path}': {reason}")]
    SaveFailed { path: String, reason: String },

    #[error("Failed to stat file '{file}': {reason}")]
    StatFailed { file: String, reason: String },
}

/// Errors related to configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration file: {0}")]
    LoadFailed(String),

    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

// Conversion from anyhow::Error to ChunkerError
impl From<anyhow::Error> for ChunkerError {
    fn from(err: anyhow::Error) -> Self {
        ChunkerError::Other(format!("{:#}", err))
    }
}

impl ChunkerError {
    /// Create a new error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        ChunkerError::Other(msg.into())
    }
}
