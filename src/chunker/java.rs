//! Java chunk extraction: classes, methods, and constructors.

use super::engine::{capture_sequence, collect_identifiers, node_text, QueryEngine};
use super::walk::{walk_captures, DeclSpec, NameRule, WalkTables};
use super::{Chunk, ChunkKind, LanguageChunker};
use crate::error::ChunkError;
use regex::Regex;
use std::sync::LazyLock;
use tree_sitter::{Node, Query};

const DECLARATION_QUERY: &str = r#"
(class_declaration
  name: (identifier) @class_name) @class

(method_declaration
  name: (identifier) @method_name) @method

(constructor_declaration
  name: (identifier) @constructor_name) @constructor
"#;

const IMPORT_QUERY: &str = r#"
(import_declaration) @import
(package_declaration) @package
"#;

const REFERENCE_QUERY: &str = r#"
[
  (identifier)
  (type_identifier)
] @identifier
"#;

const KEYWORDS: &[&str] = &[
    "public", "private", "protected", "class", "interface", "extends", "implements", "return",
    "if", "else", "for", "while", "try", "catch", "finally", "throw", "throws", "new", "this",
    "super", "static", "final", "void", "true", "false", "null",
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
            label: "method",
            kind: ChunkKind::Method,
            member_kind: None,
            name: NameRule::Adjacent("method_name"),
            resolve_parent: true,
        },
        DeclSpec {
            label: "constructor",
            kind: ChunkKind::Constructor,
            member_kind: None,
            name: NameRule::Adjacent("constructor_name"),
            resolve_parent: true,
        },
    ],
    enclosing_kinds: &["class_declaration"],
    ident_kinds: &["identifier"],
};

static IMPORT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"import\s+(?:static\s+)?([^;]+);").unwrap());
static PACKAGE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"package\s+([^;]+);").unwrap());

pub struct JavaChunker {
    engine: QueryEngine,
    declarations: Query,
    imports: Query,
    references: Query,
}

impl JavaChunker {
    pub fn new() -> Result<Self, ChunkError> {
        let engine = QueryEngine::new(tree_sitter_java::LANGUAGE.into())?;
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

    /// Package and import paths, lexically parsed from the declaration text
    fn extract_imports(&self, root: Node<'_>, source: &[u8]) -> Vec<String> {
        let mut imports = Vec::new();
        for (node, label) in capture_sequence(&self.imports, root, source) {
            let text = node_text(node, source);
            let re = match label {
                "package" => &PACKAGE_RE,
                "import" => &IMPORT_RE,
                _ => continue,
            };
            if let Some(captures) = re.captures(text) {
                imports.push(captures[1].trim().to_string());
            }
        }
        imports
    }
}

impl LanguageChunker for JavaChunker {
    fn language(&self) -> &'static str {
        "java"
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
            "java",
            &imports,
            |node| collect_identifiers(references, node, bytes, KEYWORDS),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(source: &str) -> Vec<Chunk> {
        JavaChunker::new().unwrap().chunk(source).unwrap()
    }

    #[test]
    fn test_class_and_method() {
        let chunks = chunk("class Foo { void bar() {} }");
        assert_eq!(chunks.len(), 2);

        let class = chunks.iter().find(|c| c.kind == ChunkKind::Class).unwrap();
        assert_eq!(class.name, "Foo");
        assert_eq!(class.parent, None);
        assert_eq!((class.start_line, class.end_line), (1, 1));

        let method = chunks.iter().find(|c| c.kind == ChunkKind::Method).unwrap();
        assert_eq!(method.name, "bar");
        assert_eq!(method.parent, Some("Foo".to_string()));
        assert_eq!((method.start_line, method.end_line), (1, 1));
    }

    #[test]
    fn test_constructor() {
        let source = "class Foo {\n  Foo() {}\n}\n";
        let chunks = chunk(source);

        let ctor = chunks
            .iter()
            .find(|c| c.kind == ChunkKind::Constructor)
            .unwrap();
        assert_eq!(ctor.name, "Foo");
        assert_eq!(ctor.parent, Some("Foo".to_string()));
        assert_eq!((ctor.start_line, ctor.end_line), (2, 2));
    }

    #[test]
    fn test_imports_and_package() {
        let source = "package com.example.app;\nimport java.util.List;\nimport static java.util.Map.entry;\nclass Foo {}\n";
        let chunks = chunk(source);

        let class = &chunks[0];
        assert!(class.imports.contains(&"com.example.app".to_string()));
        assert!(class.imports.contains(&"java.util.List".to_string()));
        assert!(class.imports.contains(&"java.util.Map.entry".to_string()));
    }

    #[test]
    fn test_references_exclude_keywords() {
        let source = "class Foo { void bar() { Baz qux = new Baz(); } }";
        let chunks = chunk(source);
        let method = chunks.iter().find(|c| c.kind == ChunkKind::Method).unwrap();

        assert!(method.references.contains(&"Baz".to_string()));
        assert!(method.references.contains(&"qux".to_string()));
        assert!(!method.references.contains(&"new".to_string()));
        assert!(!method.references.contains(&"void".to_string()));
    }

    #[test]
    fn test_nested_class_emitted_independently() {
        let source = "class Outer {\n  class Inner {\n    void m() {}\n  }\n}\n";
        let chunks = chunk(source);

        let classes: Vec<&Chunk> = chunks.iter().filter(|c| c.kind == ChunkKind::Class).collect();
        assert_eq!(classes.len(), 2);

        let method = chunks.iter().find(|c| c.kind == ChunkKind::Method).unwrap();
        assert_eq!(method.parent, Some("Inner".to_string()));
    }

    #[test]
    fn test_content_is_exact_span() {
        let source = "class Foo {\n  void bar() { int x = 1; }\n}\n";
        let chunks = chunk(source);
        let method = chunks.iter().find(|c| c.kind == ChunkKind::Method).unwrap();
        assert_eq!(method.content, "void bar() { int x = 1; }");
    }

    #[test]
    fn test_empty_source_yields_no_chunks() {
        assert!(chunk("").is_empty());
    }
}
