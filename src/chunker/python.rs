//! Python chunk extraction: classes, functions, and methods.
//!
//! A function nested anywhere inside a class body is a method with the
//! class as parent; only enclosure distinguishes the two kinds.

use super::engine::{capture_sequence, collect_identifiers, node_text, QueryEngine};
use super::walk::{walk_captures, DeclSpec, NameRule, WalkTables};
use super::{Chunk, ChunkKind, LanguageChunker};
use crate::error::ChunkError;
use regex::Regex;
use std::sync::LazyLock;
use tree_sitter::{Node, Query};

const DECLARATION_QUERY: &str = r#"
(class_definition
  name: (identifier) @class_name) @class

(function_definition
  name: (identifier) @function_name) @function
"#;

const IMPORT_QUERY: &str = r#"
(import_statement) @import
(import_from_statement) @import_from
"#;

const REFERENCE_QUERY: &str = "(identifier) @identifier";

const KEYWORDS: &[&str] = &[
    "self", "None", "True", "False", "if", "else", "for", "while", "try", "except", "def",
    "class", "return", "with", "as",
];

static TABLES: WalkTables = WalkTables {
    decls: &[
        DeclSpec {
            label: "class",
            kind: ChunkKind::Class,
            member_kind: None,
            name: NameRule::Adjacent("class_name"),
            resolve_parent: false,
        },
        DeclSpec {
            label: "function",
            kind: ChunkKind::Function,
            member_kind: Some(ChunkKind::Method),
            name: NameRule::Adjacent("function_name"),
            resolve_parent: true,
        },
    ],
    enclosing_kinds: &["class_definition"],
    ident_kinds: &["identifier"],
};

static IMPORT_STMT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^import\s+(.+)$").unwrap());
static IMPORT_FROM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^from\s+(\S+)\s+import\s+(.+)$").unwrap());

pub struct PythonChunker {
    engine: QueryEngine,
    declarations: Query,
    imports: Query,
    references: Query,
}

impl PythonChunker {
    pub fn new() -> Result<Self, ChunkError> {
        let engine = QueryEngine::new(tree_sitter_python::LANGUAGE.into())?;
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

    /// `import a, b` yields one entry per name; `from m import x, y`
    /// yields `m.x`, `m.y`. Aliases keep the original name.
    fn extract_imports(&self, root: Node<'_>, source: &[u8]) -> Vec<String> {
        let mut imports = Vec::new();
        for (node, label) in capture_sequence(&self.imports, root, source) {
            let text = node_text(node, source);
            match label {
                "import" => {
                    if let Some(captures) = IMPORT_STMT_RE.captures(text) {
                        for part in captures[1].split(',') {
                            let name = strip_alias(part);
                            if !name.is_empty() {
                                imports.push(name.to_string());
                            }
                        }
                    }
                }
                "import_from" => {
                    if let Some(captures) = IMPORT_FROM_RE.captures(text) {
                        let module = captures[1].to_string();
                        for part in captures[2].split(',') {
                            let name = strip_alias(part).trim_matches(['(', ')']).trim();
                            if !name.is_empty() {
                                imports.push(format!("{module}.{name}"));
                            }
                        }
                    }
                }
                _ => {}
            }
        }
        imports
    }
}

/// `name as alias` -> `name`
fn strip_alias(part: &str) -> &str {
    part.split(" as ").next().unwrap_or(part).trim()
}

impl LanguageChunker for PythonChunker {
    fn language(&self) -> &'static str {
        "python"
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
            "python",
            &imports,
            |node| collect_identifiers(references, node, bytes, KEYWORDS),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(source: &str) -> Vec<Chunk> {
        PythonChunker::new().unwrap().chunk(source).unwrap()
    }

    #[test]
    fn test_class_function_method() {
        let source = "def helper():\n    return 1\n\nclass Widget:\n    def render(self):\n        return helper()\n";
        let chunks = chunk(source);

        let func = chunks.iter().find(|c| c.kind == ChunkKind::Function).unwrap();
        assert_eq!(func.name, "helper");
        assert_eq!(func.parent, None);
        assert_eq!((func.start_line, func.end_line), (1, 2));

        let class = chunks.iter().find(|c| c.kind == ChunkKind::Class).unwrap();
        assert_eq!(class.name, "Widget");

        let method = chunks.iter().find(|c| c.kind == ChunkKind::Method).unwrap();
        assert_eq!(method.name, "render");
        assert_eq!(method.parent, Some("Widget".to_string()));
    }

    #[test]
    fn test_imports() {
        let source = "import os, sys\nfrom pathlib import Path, PurePath\nfrom json import dumps as to_json\n\ndef f():\n    pass\n";
        let chunks = chunk(source);
        let func = chunks.iter().find(|c| c.kind == ChunkKind::Function).unwrap();

        assert!(func.imports.contains(&"os".to_string()));
        assert!(func.imports.contains(&"sys".to_string()));
        assert!(func.imports.contains(&"pathlib.Path".to_string()));
        assert!(func.imports.contains(&"pathlib.PurePath".to_string()));
        assert!(func.imports.contains(&"json.dumps".to_string()));
    }

    #[test]
    fn test_decorated_method_still_found() {
        let source = "class A:\n    @staticmethod\n    def s():\n        pass\n";
        let chunks = chunk(source);
        let method = chunks.iter().find(|c| c.kind == ChunkKind::Method).unwrap();
        assert_eq!(method.name, "s");
        assert_eq!(method.parent, Some("A".to_string()));
    }

    #[test]
    fn test_references_exclude_keywords() {
        let source = "def f(data):\n    if data:\n        return process(data)\n    return None\n";
        let chunks = chunk(source);
        let func = chunks.iter().find(|c| c.kind == ChunkKind::Function).unwrap();

        assert!(func.references.contains(&"process".to_string()));
        assert!(func.references.contains(&"data".to_string()));
        assert!(!func.references.contains(&"if".to_string()));
        assert!(!func.references.contains(&"None".to_string()));
    }

    #[test]
    fn test_nested_classes_overlap() {
        let source = "class Outer:\n    class Inner:\n        pass\n";
        let chunks = chunk(source);
        let classes: Vec<&Chunk> = chunks.iter().filter(|c| c.kind == ChunkKind::Class).collect();
        assert_eq!(classes.len(), 2);
        // The outer chunk's content legitimately contains the inner's
        let outer = classes.iter().find(|c| c.name == "Outer").unwrap();
        let inner = classes.iter().find(|c| c.name == "Inner").unwrap();
        assert!(outer.content.contains(&inner.content));
    }
}
