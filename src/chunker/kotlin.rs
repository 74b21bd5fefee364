//! Kotlin chunk extraction: classes and functions.
//!
//! The Kotlin grammar exposes declaration names through the `name` field
//! rather than a stable capture position, so names are resolved by child
//! scan instead of capture adjacency. Functions nested in a class become
//! methods with the class as parent.

use super::engine::{capture_sequence, collect_identifiers, node_text, QueryEngine};
use super::walk::{walk_captures, DeclSpec, NameRule, WalkTables};
use super::{Chunk, ChunkKind, LanguageChunker};
use crate::error::ChunkError;
use regex::Regex;
use std::sync::LazyLock;
use tree_sitter::{Node, Query};

const DECLARATION_QUERY: &str = r#"
(class_declaration) @class
(function_declaration) @function
"#;

const REFERENCE_QUERY: &str = "(identifier) @identifier";

const KEYWORDS: &[&str] = &[
    "val", "var", "fun", "class", "object", "interface", "override", "private", "public",
    "protected", "internal", "return", "if", "else", "when", "true", "false", "null", "this",
    "super",
];

static TABLES: WalkTables = WalkTables {
    decls: &[
        DeclSpec {
            label: "class",
            kind: ChunkKind::Class,
            member_kind: None,
            name: NameRule::ChildIdent,
            resolve_parent: false,
        },
        DeclSpec {
            label: "function",
            kind: ChunkKind::Function,
            member_kind: Some(ChunkKind::Method),
            name: NameRule::ChildIdent,
            resolve_parent: true,
        },
    ],
    enclosing_kinds: &["class_declaration", "object_declaration"],
    ident_kinds: &["identifier", "type_identifier", "simple_identifier"],
};

static IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"import\s+(\S+)").unwrap());

pub struct KotlinChunker {
    engine: QueryEngine,
    declarations: Query,
    references: Query,
}

impl KotlinChunker {
    pub fn new() -> Result<Self, ChunkError> {
        let engine = QueryEngine::new(tree_sitter_kotlin_ng::LANGUAGE.into())?;
        let declarations = engine.compile(DECLARATION_QUERY)?;
        let references = engine.compile(REFERENCE_QUERY)?;
        Ok(Self {
            engine,
            declarations,
            references,
        })
    }

    /// Import paths, lexically parsed. Import nodes are located by kind
    /// scan to tolerate grammar-variant node naming.
    fn extract_imports(&self, root: Node<'_>, source: &[u8]) -> Vec<String> {
        let mut imports = Vec::new();
        collect_import_nodes(root, source, &mut imports);
        imports
    }
}

fn collect_import_nodes(node: Node<'_>, source: &[u8], imports: &mut Vec<String>) {
    if matches!(node.kind(), "import_header" | "import") {
        if let Some(captures) = IMPORT_RE.captures(node_text(node, source)) {
            imports.push(captures[1].to_string());
        }
        return;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_import_nodes(child, source, imports);
    }
}

impl LanguageChunker for KotlinChunker {
    fn language(&self) -> &'static str {
        "kotlin"
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
            "kotlin",
            &imports,
            |node| collect_identifiers(references, node, bytes, KEYWORDS),
        ))
    }
}
