//! Programmatic tree construction.
//!
//! Nodes are created bottom-up (children before parents, since a kind
//! embeds its child ids); `finish` then establishes the parent back-edges
//! in one pass from the root. The JSON inflater drives this builder, and
//! tests use it directly in place of a live compiler.

use crate::node::{Node, NodeId, NodeKind, Span};
use crate::tree::Ast;

/// Incremental [`Ast`] builder.
#[derive(Debug, Default)]
pub struct AstBuilder {
    nodes: Vec<Node>,
}

impl AstBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        AstBuilder::default()
    }

    /// Append a node and return its id.
    pub fn add(&mut self, span: Span, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            id,
            span,
            parent: None,
            kind,
        });
        id
    }

    /// Shorthand for a [`NodeKind::Name`] node.
    pub fn name(&mut self, span: Span, id: &str) -> NodeId {
        self.add(span, NodeKind::Name { id: id.to_string() })
    }

    /// Seal the tree with the given root, wiring parent links.
    ///
    /// Nodes not reachable from the root keep a `None` parent; they are
    /// harmless but unreachable by traversal.
    pub fn finish(mut self, root: NodeId) -> Ast {
        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            for child in self.nodes[current.index()].kind.children() {
                self.nodes[child.index()].parent = Some(current);
                stack.push(child);
            }
        }
        Ast {
            nodes: self.nodes,
            root,
        }
    }
}
