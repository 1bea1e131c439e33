//! The arena tree.
//!
//! An [`Ast`] owns every node in a flat arena; ids are arena indices.
//! Children are reached through [`NodeKind::children`], the parent link
//! is a plain index back-edge, and all traversal helpers live here.

use couleuvre_core::protocol::Position;

use crate::node::{Node, NodeId, NodeKind, Span};

/// An owned syntax tree.
#[derive(Debug, Clone)]
pub struct Ast {
    pub(crate) nodes: Vec<Node>,
    pub(crate) root: NodeId,
}

impl Ast {
    /// The root node id (always a `Module`).
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Total number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Access a node by id.
    ///
    /// Ids are only ever minted by the builder for this tree, so lookup
    /// is infallible.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    /// The kind payload of a node.
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    /// The span of a node.
    pub fn span(&self, id: NodeId) -> Span {
        self.node(id).span
    }

    /// The parent of a node, `None` for the root.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// The top-level statements of the module body.
    pub fn module_body(&self) -> &[NodeId] {
        match self.kind(self.root) {
            NodeKind::Module { body, .. } => body,
            _ => &[],
        }
    }

    /// The absolute path the compiler resolved for this module, if any.
    ///
    /// May point at a scratch file when the source came from an unsaved
    /// buffer; callers that need file identity should prefer the
    /// document URI.
    pub fn resolved_path(&self) -> Option<&str> {
        match self.kind(self.root) {
            NodeKind::Module { resolved_path, .. } => resolved_path.as_deref(),
            _ => None,
        }
    }

    /// Pre-order walk of the whole tree.
    pub fn walk(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.descendants(self.root)
    }

    /// Pre-order walk of the subtree rooted at `from` (inclusive).
    pub fn descendants(&self, from: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let mut stack = vec![from];
        std::iter::from_fn(move || {
            let current = stack.pop()?;
            let children = self.kind(current).children();
            stack.extend(children.into_iter().rev());
            Some(current)
        })
    }

    /// Walk from a node to the root along parent links (exclusive of
    /// the node itself).
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let mut current = self.parent(id);
        std::iter::from_fn(move || {
            let id = current?;
            current = self.parent(id);
            Some(id)
        })
    }

    /// The smallest node whose span contains the position.
    ///
    /// Descends from the root, preferring a containing child at each
    /// step; a position on a blank line inside a body therefore lands on
    /// the enclosing statement, and a position outside the module span
    /// yields `None`.
    pub fn node_at(&self, position: Position) -> Option<NodeId> {
        if !self.span(self.root).contains(position) {
            return None;
        }
        let mut current = self.root;
        'descend: loop {
            for child in self.kind(current).children() {
                if self.span(child).contains(position) {
                    current = child;
                    continue 'descend;
                }
            }
            return Some(current);
        }
    }
}
