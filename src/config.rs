/// Configuration system for repo-chunker
///
/// Supports loading from multiple sources with priority:
/// CLI args > Environment variables > Config file > Defaults
use crate::error::ConfigError;
use crate::paths::PlatformPaths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Artifact output configuration
    #[serde(default)]
    pub artifacts: ArtifactsConfig,

    /// Curation configuration
    #[serde(default)]
    pub curation: CurationConfig,

    /// Incremental build tracking configuration
    #[serde(default)]
    pub tracking: TrackingConfig,
}

/// Artifact output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactsConfig {
    /// Root directory for all pipeline artifacts
    #[serde(default = "default_artifacts_dir")]
    pub dir: PathBuf,
}

/// Curation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurationConfig {
    /// Maximum file size to curate (in bytes)
    #[serde(default = "default_max_file_size")]
    pub max_file_size: usize,

    /// Additional glob patterns to ignore beyond the built-in set
    #[serde(default)]
    pub extra_ignore_patterns: Vec<String>,
}

/// Incremental build tracking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// Directory holding per-repository file-state caches
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
}

fn default_artifacts_dir() -> PathBuf {
    PathBuf::from("artifacts")
}

fn default_max_file_size() -> usize {
    1_048_576 // 1MB
}

fn default_cache_dir() -> PathBuf {
    PlatformPaths::cache_dir().join("build_cache")
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            dir: default_artifacts_dir(),
        }
    }
}

impl Default for CurationConfig {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
            extra_ignore_patterns: vec![],
        }
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, falling back to defaults for
    /// missing fields. Environment overrides are applied afterwards.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::LoadFailed(format!("{}: {}", path.display(), e)))?;

        let mut config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;

        config.apply_env_overrides();
        Ok(config)
    }

    /// Build a configuration from defaults plus environment overrides.
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Apply environment variable overrides
    ///
    /// - `REPO_CHUNKER_ARTIFACTS_DIR`
    /// - `REPO_CHUNKER_CACHE_DIR`
    /// - `REPO_CHUNKER_MAX_FILE_SIZE`
    fn apply_env_overrides(&mut self) {
        if let Ok(dir) = std::env::var("REPO_CHUNKER_ARTIFACTS_DIR") {
            self.artifacts.dir = PathBuf::from(dir);
        }
        if let Ok(dir) = std::env::var("REPO_CHUNKER_CACHE_DIR") {
            self.tracking.cache_dir = PathBuf::from(dir);
        }
        if let Ok(size) = std::env::var("REPO_CHUNKER_MAX_FILE_SIZE")
            && let Ok(parsed) = size.parse::<usize>()
        {
            self.curation.max_file_size = parsed;
        }
    }

    /// Directory where curated markdown documents are written
    pub fn curated_dir(&self) -> PathBuf {
        self.artifacts.dir.join("curated")
    }

    /// Directory where chunk record files are written
    pub fn chunks_dir(&self) -> PathBuf {
        self.artifacts.dir.join("chunks")
    }
}
