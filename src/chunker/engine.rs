//! Thin wrapper over the tree-sitter parser and query machinery.
//!
//! The rest of the chunker consumes this as a capability: parse source into
//! a tree, evaluate a compiled query, and receive the flattened, ordered
//! capture sequence the walk algorithm operates on.

use crate::error::ChunkError;
use std::collections::BTreeSet;
use tree_sitter::{Language, Node, Parser, Query, QueryCursor, StreamingIterator, Tree};

/// Parser plus the language it was configured for. Queries are compiled
/// once per extractor instance and shared, read-only, across all files.
pub(crate) struct QueryEngine {
    parser: Parser,
    language: Language,
}

impl QueryEngine {
    pub fn new(language: Language) -> Result<Self, ChunkError> {
        let mut parser = Parser::new();
        parser
            .set_language(&language)
            .map_err(|e| ChunkError::LanguageSetup(e.to_string()))?;
        Ok(Self { parser, language })
    }

    pub fn compile(&self, pattern: &str) -> Result<Query, ChunkError> {
        Query::new(&self.language, pattern)
            .map_err(|e| ChunkError::QueryCompilation(e.to_string()))
    }

    pub fn parse(&mut self, source: &str) -> Result<Tree, ChunkError> {
        self.parser.parse(source, None).ok_or(ChunkError::ParseFailed)
    }
}

/// Evaluate a query and flatten its matches into one ordered capture
/// sequence.
///
/// Within a match the captures are ordered outer-node-first (start byte
/// ascending, then span descending), so a declaration capture immediately
/// precedes its name capture(s). The walk algorithm depends on this
/// adjacency and skips defensively when it does not hold.
pub(crate) fn capture_sequence<'t, 'q>(
    query: &'q Query,
    root: Node<'t>,
    source: &[u8],
) -> Vec<(Node<'t>, &'q str)> {
    let names = query.capture_names();
    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(query, root, source);

    let mut captures = Vec::new();
    let mut seen = std::collections::HashSet::new();
    while let Some(m) = matches.next() {
        let mut row: Vec<(Node, &str)> = m
            .captures
            .iter()
            .map(|c| (c.node, names[c.index as usize]))
            .collect();
        row.sort_by(|a, b| {
            a.0.start_byte()
                .cmp(&b.0.start_byte())
                .then(b.0.end_byte().cmp(&a.0.end_byte()))
        });
        // Overlapping matches of one pattern (optional captures) must not
        // repeat a node under the same label.
        for (node, label) in row {
            if seen.insert((node.id(), label)) {
                captures.push((node, label));
            }
        }
    }
    captures
}

/// Exact source text spanned by a node
pub(crate) fn node_text<'s>(node: Node<'_>, source: &'s [u8]) -> &'s str {
    std::str::from_utf8(&source[node.byte_range()]).unwrap_or("")
}

/// 1-indexed inclusive line span of a node
pub(crate) fn node_lines(node: Node<'_>) -> (usize, usize) {
    (node.start_position().row + 1, node.end_position().row + 1)
}

/// Collect the deduplicated identifier set of a subtree, with the
/// language's keywords removed. Sorted so repeated runs serialize
/// identically.
pub(crate) fn collect_identifiers(
    query: &Query,
    node: Node<'_>,
    source: &[u8],
    keywords: &[&str],
) -> Vec<String> {
    let mut references = BTreeSet::new();
    for (ident_node, _) in capture_sequence(query, node, source) {
        let ident = node_text(ident_node, source);
        if !ident.is_empty() && !keywords.contains(&ident) {
            references.insert(ident.to_string());
        }
    }
    references.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_sequence_adjacency() {
        let mut engine = QueryEngine::new(tree_sitter_java::LANGUAGE.into()).unwrap();
        let query = engine
            .compile("(class_declaration name: (identifier) @class_name) @class")
            .unwrap();

        let source = "class Foo {}\nclass Bar {}\n";
        let tree = engine.parse(source).unwrap();
        let captures = capture_sequence(&query, tree.root_node(), source.as_bytes());

        let labels: Vec<&str> = captures.iter().map(|(_, l)| *l).collect();
        assert_eq!(labels, vec!["class", "class_name", "class", "class_name"]);
        assert_eq!(node_text(captures[1].0, source.as_bytes()), "Foo");
        assert_eq!(node_text(captures[3].0, source.as_bytes()), "Bar");
    }

    #[test]
    fn test_node_lines_one_indexed() {
        let mut engine = QueryEngine::new(tree_sitter_java::LANGUAGE.into()).unwrap();
        let query = engine
            .compile("(class_declaration) @class")
            .unwrap();

        let source = "\nclass Foo {\n}\n";
        let tree = engine.parse(source).unwrap();
        let captures = capture_sequence(&query, tree.root_node(), source.as_bytes());

        assert_eq!(node_lines(captures[0].0), (2, 3));
    }

    #[test]
    fn test_collect_identifiers_excludes_keywords() {
        let mut engine = QueryEngine::new(tree_sitter_java::LANGUAGE.into()).unwrap();
        let query = engine.compile("(identifier) @identifier").unwrap();

        let source = "class Foo { void bar() { this.x = baz; } }";
        let tree = engine.parse(source).unwrap();
        let idents = collect_identifiers(
            &query,
            tree.root_node(),
            source.as_bytes(),
            &["this", "void", "class"],
        );

        assert!(idents.contains(&"Foo".to_string()));
        assert!(idents.contains(&"baz".to_string()));
        assert!(!idents.contains(&"this".to_string()));
    }
}
