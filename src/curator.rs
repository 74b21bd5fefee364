//! Source curation: wraps repository files into per-file curated markdown
//! documents that the chunking stage consumes.

use crate::error::CurationError;
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use std::fs;
use std::path::{Path, PathBuf};

/// Built-in ignore patterns for build artifacts, dependency trees, and
/// binary formats
const IGNORE_PATTERNS: &[&str] = &[
    "**/.git/**",
    "**/.github/**",
    "**/.gradle/**",
    "**/gradle/**",
    "**/node_modules/**",
    "**/__pycache__/**",
    "**/build/**",
    "**/dist/**",
    "**/target/**",
    "**/venv/**",
    "**/.idea/**",
    "**/.vscode/**",
    "**/vendor/**",
    "**/out/**",
    "**/bin/**",
    "**/obj/**",
    "**/Pods/**",
    "**/tmp/**",
    "**/logs/**",
    "**/*.min.js",
    "**/*.min.css",
    "**/*.map",
    "**/*.pyc",
    "**/*.jar",
    "**/*.class",
    "**/*.so",
    "**/*.dll",
    "**/*.exe",
    "**/*.lock",
    "**/*.log",
    "**/package-lock.json",
    "**/yarn.lock",
];

/// Map a file extension to the language tag written into the curated header.
/// Tags are the lowercase names the chunker registry resolves.
pub fn estimate_language(extension: &str) -> &'static str {
    match extension.to_lowercase().as_str() {
        "py" => "python",
        "js" | "jsx" => "javascript",
        "ts" | "tsx" => "typescript",
        "java" => "java",
        "c" | "h" => "c",
        "cpp" | "hpp" => "cpp",
        "cs" => "csharp",
        "go" => "go",
        "rb" => "ruby",
        "php" => "php",
        "rs" => "rust",
        "swift" => "swift",
        "kt" | "kts" => "kotlin",
        "m" | "mm" => "objc",
        "scala" => "scala",
        "sh" | "bash" => "bash",
        "sql" => "sql",
        "html" => "html",
        "css" => "css",
        "sass" | "scss" => "scss",
        "yaml" | "yml" => "yaml",
        "json" => "json",
        "xml" => "xml",
        "toml" => "toml",
        "ini" => "ini",
        "conf" => "config",
        _ => "unknown",
    }
}

/// Extensions eligible for curation
const CODE_EXTENSIONS: &[&str] = &[
    "py", "js", "jsx", "ts", "tsx", "java", "c", "cpp", "h", "hpp", "cs", "go", "rb", "php", "rs",
    "swift", "kt", "kts", "m", "mm", "scala", "sh", "bash", "sql", "html", "css", "sass", "scss",
    "yaml", "yml", "json", "xml", "toml", "ini", "conf",
];

/// Wraps source files into curated markdown under
/// `<artifacts>/curated/<repo>/<relative path>.md`
pub struct Curator {
    input_dir: PathBuf,
    output_dir: PathBuf,
    max_file_size: usize,
    ignore: GlobSet,
}

impl Curator {
    pub fn new(
        input_dir: impl AsRef<Path>,
        curated_root: &Path,
        repo_name: &str,
        max_file_size: usize,
        extra_ignore_patterns: &[String],
    ) -> Result<Self, CurationError> {
        let input_dir = input_dir.as_ref().to_path_buf();
        if !input_dir.is_dir() {
            return Err(CurationError::DirectoryNotFound(
                input_dir.display().to_string(),
            ));
        }

        let mut builder = GlobSetBuilder::new();
        for pattern in IGNORE_PATTERNS
            .iter()
            .map(|p| p.to_string())
            .chain(extra_ignore_patterns.iter().cloned())
        {
            let glob = Glob::new(&pattern)
                .map_err(|_| CurationError::InvalidPattern(pattern.clone()))?;
            builder.add(glob);
        }
        let ignore = builder
            .build()
            .map_err(|e| CurationError::InvalidPattern(e.to_string()))?;

        Ok(Self {
            input_dir,
            output_dir: curated_root.join(repo_name),
            max_file_size,
            ignore,
        })
    }

    /// Directory curated documents are written into
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Curate every eligible file under the input directory.
    /// Returns the curated document paths written.
    pub fn curate_all(&self) -> Result<Vec<PathBuf>, CurationError> {
        let walker = WalkBuilder::new(&self.input_dir)
            .standard_filters(true)
            .hidden(false)
            .require_git(false)
            .build();

        let mut written = Vec::new();
        for entry in walker.flatten() {
            let path = entry.path();
            if path.is_dir() {
                continue;
            }
            if let Some(out) = self.curate_file(path)? {
                written.push(out);
            }
        }

        tracing::info!("Curated {} files", written.len());
        Ok(written)
    }

    /// Curate only the given files (incremental mode).
    pub fn curate_files(&self, files: &[PathBuf]) -> Result<Vec<PathBuf>, CurationError> {
        let mut written = Vec::new();
        for path in files {
            if !path.exists() {
                tracing::warn!("File not found, skipping: {:?}", path);
                continue;
            }
            if let Some(out) = self.curate_file(path)? {
                written.push(out);
            }
        }
        Ok(written)
    }

    /// Curate one file. Returns `None` when the file is ignored, oversized,
    /// or unreadable (per-file failures never abort the batch).
    fn curate_file(&self, path: &Path) -> Result<Option<PathBuf>, CurationError> {
        let rel_path = path.strip_prefix(&self.input_dir).unwrap_or(path);
        if self.should_ignore(rel_path) {
            return Ok(None);
        }

        let Some(extension) = path.extension().and_then(|e| e.to_str()) else {
            return Ok(None);
        };
        if !CODE_EXTENSIONS.contains(&extension.to_lowercase().as_str()) {
            return Ok(None);
        }

        if let Ok(metadata) = fs::metadata(path)
            && metadata.len() > self.max_file_size as u64
        {
            tracing::debug!("Skipping large file: {:?}", path);
            return Ok(None);
        }

        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!("Failed to read {:?}: {}", path, e);
                return Ok(None);
            }
        };

        let language = estimate_language(extension);
        let rel_str = rel_path.to_string_lossy();
        let basename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let document = format!(
            "# {}\n\nFile path: `{}`\n\nProgramming language: {}\n\n```{}\n{}\n```\n",
            basename, rel_str, language, language, content
        );

        let output_path = self.output_dir.join(format!("{}.md", rel_str));
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent).map_err(|e| CurationError::FileWriteFailed {
                file: output_path.display().to_string(),
                reason: e.to_string(),
            })?;
        }
        fs::write(&output_path, document).map_err(|e| CurationError::FileWriteFailed {
            file: output_path.display().to_string(),
            reason: e.to_string(),
        })?;

        tracing::debug!("Curated {:?} -> {:?}", path, output_path);
        Ok(Some(output_path))
    }

    fn should_ignore(&self, rel_path: &Path) -> bool {
        if rel_path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with('.'))
        {
            return true;
        }
        self.ignore.is_match(rel_path)
    }
}
