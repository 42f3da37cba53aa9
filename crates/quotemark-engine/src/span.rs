use crate::tree::{NodeId, Tree};

/// A concrete location in the tree: a text offset for leaves, a child index
/// for elements. Both allow one-past-the-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub node: NodeId,
    pub offset: usize,
}

/// A resolved pair of positions delimiting a highlighted region, with
/// `start <= end` in tree order. Spans are replaced wholesale whenever a
/// rewrite invalidates their endpoints; see the highlight module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The node a geometry layer should bring into view for this span: the
    /// start boundary's leaf, or the child the start index points at.
    pub(crate) fn scroll_anchor(&self, tree: &Tree) -> Option<NodeId> {
        if tree.is_leaf(self.start.node) {
            Some(self.start.node)
        } else {
            tree.children(self.start.node).get(self.start.offset).copied()
        }
    }
}
