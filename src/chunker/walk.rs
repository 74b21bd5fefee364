//! Language-independent capture-walk skeleton.
//!
//! Each language drives this walker with its own declaration table. The
//! walker consumes the flattened capture sequence with a cursor: a
//! declaration capture followed by its expected name capture(s) emits one
//! chunk; a declaration whose name capture is absent at that position is
//! skipped without emission.

use super::engine::{node_lines, node_text};
use super::{Chunk, ChunkKind};
use std::collections::HashMap;
use tree_sitter::Node;

/// How a declaration's name is recovered from the capture sequence or the
/// syntax tree
pub(crate) enum NameRule {
    /// The capture immediately following the declaration bears this label
    Adjacent(&'static str),
    /// Like `Adjacent`, but a missing name emits an anonymous chunk
    /// (synthesized name) instead of skipping the declaration
    AdjacentOrAnonymous {
        label: &'static str,
        prefix: &'static str,
        anonymous: &'static str,
    },
    /// Compound-named constructs (Objective-C categories): a class-name
    /// capture, optionally followed by a category-name capture
    Compound {
        class_label: &'static str,
        category_label: &'static str,
    },
    /// Name is an identifier child of the declaration node itself
    ChildIdent,
    /// Objective-C method selector: leading identifier after the
    /// class/instance scope marker
    SelectorIdent,
}

/// One declaration kind a language extracts
pub(crate) struct DeclSpec {
    pub label: &'static str,
    pub kind: ChunkKind,
    /// Kind used instead when the declaration sits inside an enclosing
    /// declaration (distinguishes methods from top-level functions)
    pub member_kind: Option<ChunkKind>,
    pub name: NameRule,
    /// Resolve the enclosing declaration's name into `parent`
    pub resolve_parent: bool,
}

/// Per-language tables driving the shared walker
pub(crate) struct WalkTables {
    pub decls: &'static [DeclSpec],
    /// Node kinds recognized as enclosing declarations for parent resolution
    pub enclosing_kinds: &'static [&'static str],
    /// Identifier node kinds used for child-scan name lookups
    pub ident_kinds: &'static [&'static str],
}

impl WalkTables {
    fn spec(&self, label: &str) -> Option<&DeclSpec> {
        self.decls.iter().find(|d| d.label == label)
    }
}

/// Walk the capture sequence and emit chunks.
///
/// `extract_refs` is called once per emitted declaration node to collect
/// its reference set; `imports` is the file-scope import list shared by
/// every chunk of the file.
pub(crate) fn walk_captures<'t, F>(
    captures: &[(Node<'t>, &str)],
    tables: &WalkTables,
    source: &[u8],
    language: &'static str,
    imports: &[String],
    mut extract_refs: F,
) -> Vec<Chunk>
where
    F: FnMut(Node<'t>) -> Vec<String>,
{
    // Name lookup keyed by node identity, built once per file and used for
    // parent resolution in place of a per-member linear re-scan.
    let names = build_name_lookup(captures, tables, source);

    let mut chunks = Vec::new();
    let mut i = 0;
    while i < captures.len() {
        let (node, label) = captures[i];
        let Some(spec) = tables.spec(label) else {
            i += 1;
            continue;
        };

        let (name, advance) = match &spec.name {
            NameRule::Adjacent(name_label) => {
                match adjacent_name(captures, i, name_label, source) {
                    Some(name) => (name, 2),
                    None => {
                        // Malformed declaration: skip, no chunk
                        i += 1;
                        continue;
                    }
                }
            }
            NameRule::AdjacentOrAnonymous {
                label: name_label,
                prefix,
                anonymous,
            } => match adjacent_name(captures, i, name_label, source) {
                Some(param) => (format!("{prefix}({param})"), 2),
                None => ((*anonymous).to_string(), 1),
            },
            NameRule::Compound {
                class_label,
                category_label,
            } => match adjacent_name(captures, i, class_label, source) {
                Some(class_name) => {
                    let has_category = captures
                        .get(i + 2)
                        .is_some_and(|(_, l)| l == category_label);
                    (class_name, if has_category { 3 } else { 2 })
                }
                None => {
                    i += 1;
                    continue;
                }
            },
            NameRule::ChildIdent => (
                names
                    .get(&node.id())
                    .cloned()
                    .unwrap_or_else(|| "Unknown".to_string()),
                1,
            ),
            NameRule::SelectorIdent => (
                selector_ident(node, source).unwrap_or_else(|| "Unknown".to_string()),
                1,
            ),
        };

        let (kind, parent) = if spec.resolve_parent {
            match enclosing_decl(node, tables.enclosing_kinds) {
                Some(ancestor) => {
                    let parent_name = names
                        .get(&ancestor.id())
                        .cloned()
                        .or_else(|| child_ident(ancestor, tables.ident_kinds, source));
                    (spec.member_kind.unwrap_or(spec.kind), parent_name)
                }
                None => (spec.kind, None),
            }
        } else {
            (spec.kind, None)
        };

        let (start_line, end_line) = node_lines(node);
        chunks.push(Chunk {
            content: node_text(node, source).to_string(),
            kind,
            name,
            parent,
            start_line,
            end_line,
            imports: imports.to_vec(),
            references: extract_refs(node),
            language,
        });
        i += advance;
    }

    chunks
}

/// Map every named declaration node to its declared name
fn build_name_lookup(
    captures: &[(Node<'_>, &str)],
    tables: &WalkTables,
    source: &[u8],
) -> HashMap<usize, String> {
    let mut names = HashMap::new();
    for (i, (node, label)) in captures.iter().enumerate() {
        let Some(spec) = tables.spec(label) else {
            continue;
        };
        let name_label = match &spec.name {
            NameRule::Adjacent(l) => Some(*l),
            NameRule::AdjacentOrAnonymous { label, .. } => Some(*label),
            NameRule::Compound { class_label, .. } => Some(*class_label),
            NameRule::ChildIdent => {
                if let Some(name) = child_ident(*node, tables.ident_kinds, source) {
                    names.insert(node.id(), name);
                }
                None
            }
            NameRule::SelectorIdent => None,
        };
        if let Some(name_label) = name_label
            && let Some((name_node, next_label)) = captures.get(i + 1)
            && *next_label == name_label
        {
            names.insert(node.id(), node_text(*name_node, source).to_string());
        }
    }
    names
}

fn adjacent_name(
    captures: &[(Node<'_>, &str)],
    i: usize,
    name_label: &str,
    source: &[u8],
) -> Option<String> {
    captures
        .get(i + 1)
        .filter(|(_, l)| *l == name_label)
        .map(|(n, _)| node_text(*n, source).to_string())
        .filter(|s| !s.is_empty())
}

/// Nearest ancestor whose kind is a recognized enclosing declaration
fn enclosing_decl<'t>(node: Node<'t>, kinds: &[&str]) -> Option<Node<'t>> {
    let mut current = node.parent();
    while let Some(n) = current {
        if kinds.contains(&n.kind()) {
            return Some(n);
        }
        current = n.parent();
    }
    None
}

/// Declared name of a node: the `name` field when the grammar exposes one,
/// otherwise the first identifier-kind child
fn child_ident(node: Node<'_>, ident_kinds: &[&str], source: &[u8]) -> Option<String> {
    if let Some(name_node) = node.child_by_field_name("name") {
        let text = node_text(name_node, source);
        if !text.is_empty() {
            return Some(text.to_string());
        }
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if ident_kinds.contains(&child.kind()) {
            let text = node_text(child, source);
            if !text.is_empty() {
                return Some(text.to_string());
            }
        }
    }
    None
}

/// Leading identifier of an Objective-C method selector, taken after the
/// class/instance scope marker
fn selector_ident(node: Node<'_>, source: &[u8]) -> Option<String> {
    let mut scope_seen = false;
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        let kind = child.kind();
        if scope_seen && kind == "identifier" {
            return Some(node_text(child, source).to_string());
        }
        if matches!(kind, "class_scope" | "instance_scope" | "+" | "-") {
            scope_seen = true;
        }
    }
    // Grammar variants without explicit scope nodes
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "identifier" {
            return Some(node_text(child, source).to_string());
        }
    }
    None
}
