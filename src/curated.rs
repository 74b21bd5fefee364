//! Parsing of curated markdown documents.
//!
//! A curated document carries one source file wrapped in markdown: a
//! `# <filename>` heading, a ``File path: `<relative path>` `` line, a
//! `Programming language: <tag>` line, and exactly one fenced code block
//! holding the file's content.

use crate::error::CurationError;
use regex::Regex;
use std::sync::LazyLock;

static FILENAME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^# (.+)$").unwrap());
static FILEPATH_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"File path: `(.+)`").unwrap());
static LANGUAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Programming language: (.+)").unwrap());
static CODE_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```\w*\n(.*?)\n```").unwrap());

/// Metadata and code recovered from one curated document
#[derive(Debug, Clone)]
pub struct CuratedDoc {
    pub filename: String,
    pub filepath: String,
    pub language: String,
    pub code: String,
}

/// Parse a curated document.
///
/// Header fields default to empty / "unknown" when absent; a missing code
/// block is an error (`origin` names the document for the message). Extra
/// code blocks beyond the first are ignored with a warning.
pub fn parse_curated(content: &str, origin: &str) -> Result<CuratedDoc, CurationError> {
    let filename = FILENAME_RE
        .captures(content)
        .map(|c| c[1].to_string())
        .unwrap_or_default();

    let filepath = FILEPATH_RE
        .captures(content)
        .map(|c| c[1].to_string())
        .unwrap_or_default();

    let language = LANGUAGE_RE
        .captures(content)
        .map(|c| c[1].trim().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let mut blocks = CODE_BLOCK_RE.captures_iter(content);
    let code = match blocks.next() {
        Some(c) => c[1].to_string(),
        None => return Err(CurationError::MissingCodeBlock(origin.to_string())),
    };
    if blocks.next().is_some() {
        tracing::warn!("Multiple code blocks in {}, using the first", origin);
    }

    Ok(CuratedDoc {
        filename,
        filepath,
        language,
        code,
    })
}
