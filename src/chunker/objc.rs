//! Objective-C chunk extraction: interfaces, categories, protocols,
//! implementations, and methods.
//!
//! Categories carry a compound name (class + category), so the walker
//! consumes three captures for them. Method names come from the selector's
//! leading identifier; the enclosing interface/implementation/category
//! supplies the parent class name.

use super::engine::{capture_sequence, collect_identifiers, node_text, QueryEngine};
use super::walk::{walk_captures, DeclSpec, NameRule, WalkTables};
use super::{Chunk, ChunkKind, LanguageChunker};
use crate::error::ChunkError;
use regex::Regex;
use std::sync::LazyLock;
use tree_sitter::{Node, Query};

const DECLARATION_QUERY: &str = r#"
(class_interface
  name: (identifier) @class_name) @class_interface

(category_interface
  name: (identifier) @category_class_name
  category: (identifier) @category_name) @category_interface

(protocol_declaration
  name: (identifier) @protocol_name) @protocol

(class_implementation
  name: (identifier) @impl_class_name) @class_implementation

(category_implementation
  name: (identifier) @category_impl_class_name
  category: (identifier) @category_impl_name) @category_implementation

(method_declaration) @method
"#;

const REFERENCE_QUERY: &str = "(identifier) @identifier";

const KEYWORDS: &[&str] = &[
    "self", "super", "nil", "Nil", "NULL", "YES", "NO", "id", "instancetype", "void", "BOOL",
    "return", "if", "else", "for", "while", "case", "break", "default", "class", "interface",
    "implementation", "protocol", "property", "synthesize", "dynamic",
];

static TABLES: WalkTables = WalkTables {
    decls: &[
        DeclSpec {
            label: "class_interface",
            kind: ChunkKind::Interface,
            member_kind: None,
            name: NameRule::Adjacent("class_name"),
            resolve_parent: false,
        },
        DeclSpec {
            label: "category_interface",
            kind: ChunkKind::Category,
            member_kind: None,
            name: NameRule::Compound {
                class_label: "category_class_name",
                category_label: "category_name",
            },
            resolve_parent: false,
        },
        DeclSpec {
            label: "protocol",
            kind: ChunkKind::Protocol,
            member_kind: None,
            name: NameRule::Adjacent("protocol_name"),
            resolve_parent: false,
        },
        DeclSpec {
            label: "class_implementation",
            kind: ChunkKind::ClassImplementation,
            member_kind: None,
            name: NameRule::Adjacent("impl_class_name"),
            resolve_parent: false,
        },
        DeclSpec {
            label: "category_implementation",
            kind: ChunkKind::CategoryImplementation,
            member_kind: None,
            name: NameRule::Compound {
                class_label: "category_impl_class_name",
                category_label: "category_impl_name",
            },
            resolve_parent: false,
        },
        DeclSpec {
            label: "method",
            kind: ChunkKind::Method,
            member_kind: None,
            name: NameRule::SelectorIdent,
            resolve_parent: true,
        },
    ],
    enclosing_kinds: &[
        "class_interface",
        "class_implementation",
        "category_interface",
        "category_implementation",
    ],
    ident_kinds: &["identifier"],
};

static IMPORT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"#(?:import|include)\s+[<"]([^>"]+)[>"]"#).unwrap());

pub struct ObjectiveCChunker {
    engine: QueryEngine,
    declarations: Query,
    references: Query,
}

impl ObjectiveCChunker {
    pub fn new() -> Result<Self, ChunkError> {
        let engine = QueryEngine::new(tree_sitter_objc::LANGUAGE.into())?;
        let declarations = engine.compile(DECLARATION_QUERY)?;
        let references = engine.compile(REFERENCE_QUERY)?;
        Ok(Self {
            engine,
            declarations,
            references,
        })
    }

    /// `#import`/`#include` paths. Preprocessor nodes are located by kind
    /// scan to tolerate grammar-variant node naming.
    fn extract_imports(&self, root: Node<'_>, source: &[u8]) -> Vec<String> {
        let mut imports = Vec::new();
        let mut cursor = root.walk();
        for child in root.children(&mut cursor) {
            if child.kind().starts_with("preproc")
                && let Some(captures) = IMPORT_RE.captures(node_text(child, source))
            {
                imports.push(captures[1].trim().to_string());
            }
        }
        imports
    }
}

impl LanguageChunker for ObjectiveCChunker {
    fn language(&self) -> &'static str {
        "objc"
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
            "objc",
            &imports,
            |node| collect_identifiers(references, node, bytes, KEYWORDS),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(source: &str) -> Vec<Chunk> {
        ObjectiveCChunker::new().unwrap().chunk(source).unwrap()
    }

    const SAMPLE: &str = "#import <Foundation/Foundation.h>\n\n@interface Greeter : NSObject\n- (void)greet;\n@end\n\n@implementation Greeter\n- (void)greet {\n}\n@end\n";

    #[test]
    fn test_interface_and_implementation() {
        let chunks = chunk(SAMPLE);

        let interface = chunks
            .iter()
            .find(|c| c.kind == ChunkKind::Interface)
            .unwrap();
        assert_eq!(interface.name, "Greeter");

        let implementation = chunks
            .iter()
            .find(|c| c.kind == ChunkKind::ClassImplementation)
            .unwrap();
        assert_eq!(implementation.name, "Greeter");
    }

    #[test]
    fn test_method_parent_is_class() {
        let chunks = chunk(SAMPLE);
        let method = chunks.iter().find(|c| c.kind == ChunkKind::Method).unwrap();
        assert_eq!(method.name, "greet");
        assert_eq!(method.parent, Some("Greeter".to_string()));
    }

    #[test]
    fn test_imports() {
        let chunks = chunk(SAMPLE);
        let interface = chunks
            .iter()
            .find(|c| c.kind == ChunkKind::Interface)
            .unwrap();
        assert!(interface
            .imports
            .contains(&"Foundation/Foundation.h".to_string()));
    }

    #[test]
    fn test_protocol() {
        let source = "@protocol Drawable\n- (void)draw;\n@end\n";
        let chunks = chunk(source);
        let protocol = chunks
            .iter()
            .find(|c| c.kind == ChunkKind::Protocol)
            .unwrap();
        assert_eq!(protocol.name, "Drawable");
    }
}
