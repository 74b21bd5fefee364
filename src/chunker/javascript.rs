//! JavaScript chunk extraction: functions, methods, classes, and arrow
//! functions.
//!
//! Arrow functions are emitted even when anonymous: an arrow bound to a
//! single bare parameter is named `arrow_function(<param>)`, anything else
//! gets the `anonymous_arrow_function` placeholder.

use super::engine::{capture_sequence, collect_identifiers, node_text, QueryEngine};
use super::walk::{walk_captures, DeclSpec, NameRule, WalkTables};
use super::{Chunk, ChunkKind, LanguageChunker};
use crate::error::ChunkError;
use regex::Regex;
use std::sync::LazyLock;
use tree_sitter::{Node, Query};

const DECLARATION_QUERY: &str = r#"
(function_declaration
  name: (identifier) @function_name) @function

(method_definition
  name: (property_identifier) @method_name) @method

(arrow_function
  parameter: (identifier)? @arrow_param) @arrow_function

(class_declaration
  name: (identifier) @class_name) @class
"#;

const IMPORT_QUERY: &str = r#"
(import_statement) @import
(import_specifier
  name: (identifier) @import_name)
(import_clause
  (identifier) @import_default)
(namespace_import
  (identifier) @namespace_import)
"#;

const REFERENCE_QUERY: &str = "(identifier) @identifier";

const KEYWORDS: &[&str] = &[
    "function", "return", "const", "let", "var", "if", "else", "for", "while", "try", "catch",
    "this", "class", "true", "false", "null", "undefined",
];

static TABLES: WalkTables = WalkTables {
    decls: &[
        DeclSpec {
            label: "function",
            kind: ChunkKind::Function,
            member_kind: None,
            name: NameRule::Adjacent("function_name"),
            resolve_parent: false,
        },
        DeclSpec {
            label: "method",
            kind: ChunkKind::Method,
            member_kind: None,
            name: NameRule::Adjacent("method_name"),
            resolve_parent: true,
        },
        DeclSpec {
            label: "arrow_function",
            kind: ChunkKind::ArrowFunction,
            member_kind: None,
            name: NameRule::AdjacentOrAnonymous {
                label: "arrow_param",
                prefix: "arrow_function",
                anonymous: "anonymous_arrow_function",
            },
            resolve_parent: false,
        },
        DeclSpec {
            label: "class",
            kind: ChunkKind::Class,
            member_kind: None,
            name: NameRule::Adjacent("class_name"),
            resolve_parent: false,
        },
    ],
    enclosing_kinds: &["class_declaration"],
    ident_kinds: &["identifier"],
};

static IMPORT_SOURCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"from\s+['"](.+?)['"]"#).unwrap());

pub struct JavaScriptChunker {
    engine: QueryEngine,
    declarations: Query,
    imports: Query,
    references: Query,
}

impl JavaScriptChunker {
    pub fn new() -> Result<Self, ChunkError> {
        let engine = QueryEngine::new(tree_sitter_javascript::LANGUAGE.into())?;
        let declarations = engine.compile(DECLARATION_QUERY)?;
        let imports = engine.compile(IMPORT_QUERY)?;
        let references = engine.compile(REFERENCE_QUERY)?;
        Ok(Self {
            engine,
            declarations,
            imports,
            references,
        })
    }

    /// Each imported symbol becomes one `source.name` entry. The capture
    /// order interleaves every import statement with its specifiers, so the
    /// statement's module path is carried as running state.
    fn extract_imports(&self, root: Node<'_>, source: &[u8]) -> Vec<String> {
        let mut imports = Vec::new();
        let mut current_source: Option<String> = None;

        for (node, label) in capture_sequence(&self.imports, root, source) {
            let text = node_text(node, source);
            match label {
                "import" => {
                    current_source = IMPORT_SOURCE_RE
                        .captures(text)
                        .map(|c| c[1].to_string());
                }
                "import_name" | "import_default" | "namespace_import" => {
                    if let Some(module) = &current_source {
                        imports.push(format!("{module}.{text}"));
                    }
                }
                _ => {}
            }
        }
        imports
    }
}

impl LanguageChunker for JavaScriptChunker {
    fn language(&self) -> &'static str {
        "javascript"
    }

    fn chunk(&mut self, source: &str) -> Result<Vec<Chunk>, ChunkError> {
        let tree = self.engine.parse(source)?;
        let bytes = source.as_bytes();
        let root = tree.root_node();

        let imports = self.extract_imports(root, bytes);
        let captures = capture_sequence(&self.declarations, root, bytes);
        let references = &self.references;

        Ok(walk_captures(
            &captures,
            &TABLES,
            bytes,
            "javascript",
            &imports,
            |node| collect_identifiers(references, node, bytes, KEYWORDS),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(source: &str) -> Vec<Chunk> {
        JavaScriptChunker::new().unwrap().chunk(source).unwrap()
    }

    #[test]
    fn test_function_and_class() {
        let source = "function hello() {\n  console.log('hi');\n}\n\nclass Widget {\n  render() {\n    return this.state;\n  }\n}\n";
        let chunks = chunk(source);

        let func = chunks.iter().find(|c| c.kind == ChunkKind::Function).unwrap();
        assert_eq!(func.name, "hello");
        assert_eq!(func.parent, None);
        assert_eq!((func.start_line, func.end_line), (1, 3));

        let class = chunks.iter().find(|c| c.kind == ChunkKind::Class).unwrap();
        assert_eq!(class.name, "Widget");

        let method = chunks.iter().find(|c| c.kind == ChunkKind::Method).unwrap();
        assert_eq!(method.name, "render");
        assert_eq!(method.parent, Some("Widget".to_string()));
    }

    #[test]
    fn test_named_arrow_function() {
        let chunks = chunk("const double = x => x * 2;\n");
        let arrow = chunks
            .iter()
            .find(|c| c.kind == ChunkKind::ArrowFunction)
            .unwrap();
        assert_eq!(arrow.name, "arrow_function(x)");
    }

    #[test]
    fn test_anonymous_arrow_function_still_emitted() {
        let chunks = chunk("const f = (a, b) => a + b;\n");
        let arrow = chunks
            .iter()
            .find(|c| c.kind == ChunkKind::ArrowFunction)
            .unwrap();
        assert_eq!(arrow.name, "anonymous_arrow_function");
    }

    #[test]
    fn test_keyword_only_chunk_has_empty_references() {
        let chunks = chunk("const f = () => { return true; };\n");
        let arrow = chunks
            .iter()
            .find(|c| c.kind == ChunkKind::ArrowFunction)
            .unwrap();
        assert!(arrow.references.is_empty());
    }

    #[test]
    fn test_imports() {
        let source = "import { readFile, writeFile } from 'fs';\nimport path from 'path';\nimport * as os from 'os';\n\nfunction f() {}\n";
        let chunks = chunk(source);
        let func = chunks.iter().find(|c| c.kind == ChunkKind::Function).unwrap();

        assert!(func.imports.contains(&"fs.readFile".to_string()));
        assert!(func.imports.contains(&"fs.writeFile".to_string()));
        assert!(func.imports.contains(&"path.path".to_string()));
        assert!(func.imports.contains(&"os.os".to_string()));
    }

    #[test]
    fn test_references_collected() {
        let chunks = chunk("function f() { helper(value); }\n");
        let func = chunks.iter().find(|c| c.kind == ChunkKind::Function).unwrap();

        assert!(func.references.contains(&"helper".to_string()));
        assert!(func.references.contains(&"value".to_string()));
        assert!(!func.references.contains(&"function".to_string()));
    }
}
