use serde::{Deserialize, Serialize};

/// Stable handle for a node in a [`Tree`] arena.
///
/// Handles are plain indices into the arena slab, so they stay valid across
/// tree rewrites: a node that is spliced out of its parent keeps its id (and
/// its data) until the tree is dropped, it just no longer has a parent.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Effective display role of an element, the abstract equivalent of a CSS
/// `display` computed value. Only the roles that matter to the whitespace
/// guard are enumerated; everything else renders inline.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisplayRole {
    #[default]
    Inline,
    Block,
    ListItem,
    TableCell,
    TableColumn,
    TableColumnGroup,
    TableFooterGroup,
    TableHeaderGroup,
    TableRow,
    TableRowGroup,
}

/// Effective whitespace handling of an element, the abstract equivalent of a
/// CSS `white-space` computed value.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WhiteSpace {
    #[default]
    Normal,
    Nowrap,
    Pre,
    PreLine,
    PreWrap,
    BreakSpaces,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ElementData {
    pub role: DisplayRole,
    pub white_space: WhiteSpace,
    /// Highlight wrappers hold exactly one marked leaf and are transparent
    /// for addressing purposes.
    pub highlight: bool,
    pub children: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum NodeKind {
    Leaf { text: String },
    Element(ElementData),
}

#[derive(Debug, Clone, PartialEq)]
struct NodeData {
    parent: Option<NodeId>,
    kind: NodeKind,
}

/// Arena-backed node tree: leaves hold text, elements hold ordered children.
///
/// Pristine trees (before any highlight rewrite) are expected to be
/// normalized in the DOM sense: no two adjacent leaf siblings. The address
/// codec relies on this when it collapses runs of split-off segments back
/// into their original leaf.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tree {
    nodes: Vec<NodeData>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(data);
        id
    }

    pub fn new_leaf(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeData {
            parent: None,
            kind: NodeKind::Leaf { text: text.into() },
        })
    }

    pub fn new_element(&mut self, role: DisplayRole, white_space: WhiteSpace) -> NodeId {
        self.push(NodeData {
            parent: None,
            kind: NodeKind::Element(ElementData {
                role,
                white_space,
                highlight: false,
                children: Vec::new(),
            }),
        })
    }

    /// Create a highlight wrapper holding a single marked leaf.
    pub fn new_highlight(&mut self, text: impl Into<String>) -> NodeId {
        let leaf = self.new_leaf(text);
        let wrapper = self.push(NodeData {
            parent: None,
            kind: NodeKind::Element(ElementData {
                role: DisplayRole::Inline,
                white_space: WhiteSpace::Normal,
                highlight: true,
                children: vec![leaf],
            }),
        });
        self.nodes[leaf.index()].parent = Some(wrapper);
        wrapper
    }

    fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.nodes[id.index()].kind {
            NodeKind::Element(el) => Some(el),
            NodeKind::Leaf { .. } => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match &mut self.nodes[id.index()].kind {
            NodeKind::Element(el) => Some(el),
            NodeKind::Leaf { .. } => None,
        }
    }

    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        let el = self
            .element_mut(parent)
            .expect("append target must be an element");
        el.children.push(child);
        self.nodes[child.index()].parent = Some(parent);
    }

    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        let el = self
            .element_mut(parent)
            .expect("insert target must be an element");
        el.children.insert(index, child);
        self.nodes[child.index()].parent = Some(parent);
    }

    /// Replace the child at `index` with a run of replacement nodes. The
    /// removed child is detached (parent cleared) but keeps its data.
    pub fn splice(&mut self, parent: NodeId, index: usize, replacements: &[NodeId]) {
        let el = self
            .element_mut(parent)
            .expect("splice target must be an element");
        let removed = el.children[index];
        el.children.splice(index..index + 1, replacements.iter().copied());
        self.nodes[removed.index()].parent = None;
        for &child in replacements {
            self.nodes[child.index()].parent = Some(parent);
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    /// Children of an element; empty slice for leaves.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.element(id).map(|el| el.children.as_slice()).unwrap_or(&[])
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    pub fn is_leaf(&self, id: NodeId) -> bool {
        matches!(self.nodes[id.index()].kind, NodeKind::Leaf { .. })
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        !self.is_leaf(id)
    }

    pub fn is_highlight(&self, id: NodeId) -> bool {
        self.element(id).is_some_and(|el| el.highlight)
    }

    /// Leaves and highlight wrappers are "squishy": transparent, mergeable
    /// text as far as addressing is concerned.
    pub fn is_squishy(&self, id: NodeId) -> bool {
        self.is_leaf(id) || self.is_highlight(id)
    }

    pub fn leaf_text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.index()].kind {
            NodeKind::Leaf { text } => Some(text),
            NodeKind::Element(_) => None,
        }
    }

    pub fn role(&self, id: NodeId) -> Option<DisplayRole> {
        self.element(id).map(|el| el.role)
    }

    pub fn white_space(&self, id: NodeId) -> Option<WhiteSpace> {
        self.element(id).map(|el| el.white_space)
    }

    /// Addressable length of a node: text length for a leaf, child count for
    /// an element. An offset of exactly this value means one-past-the-end.
    pub fn node_length(&self, id: NodeId) -> usize {
        match &self.nodes[id.index()].kind {
            NodeKind::Leaf { text } => text.len(),
            NodeKind::Element(el) => el.children.len(),
        }
    }

    /// Total text length under a node (the length of its concatenated text).
    pub fn text_len(&self, id: NodeId) -> usize {
        match &self.nodes[id.index()].kind {
            NodeKind::Leaf { text } => text.len(),
            NodeKind::Element(el) => el.children.iter().map(|&c| self.text_len(c)).sum(),
        }
    }

    /// Concatenated text of the subtree rooted at `id`.
    pub fn text_of(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match &self.nodes[id.index()].kind {
            NodeKind::Leaf { text } => out.push_str(text),
            NodeKind::Element(el) => {
                for &child in &el.children {
                    self.collect_text(child, out);
                }
            }
        }
    }

    fn ancestor_path(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = vec![id];
        let mut cur = id;
        while let Some(parent) = self.parent(cur) {
            path.push(parent);
            cur = parent;
        }
        path.reverse();
        path
    }

    /// Deepest node that is an ancestor-or-self of both arguments.
    pub fn common_ancestor(&self, a: NodeId, b: NodeId) -> Option<NodeId> {
        let pa = self.ancestor_path(a);
        let pb = self.ancestor_path(b);
        let mut result = None;
        for (x, y) in pa.iter().zip(pb.iter()) {
            if x == y {
                result = Some(*x);
            } else {
                break;
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Tree, NodeId, NodeId, NodeId) {
        let mut tree = Tree::new();
        let root = tree.new_element(DisplayRole::Block, WhiteSpace::Normal);
        let para = tree.new_element(DisplayRole::Block, WhiteSpace::Normal);
        let leaf = tree.new_leaf("Hello world");
        tree.append(root, para);
        tree.append(para, leaf);
        (tree, root, para, leaf)
    }

    #[test]
    fn test_build_and_query() {
        let (tree, root, para, leaf) = sample();

        assert!(tree.is_element(root));
        assert!(tree.is_leaf(leaf));
        assert_eq!(tree.parent(leaf), Some(para));
        assert_eq!(tree.parent(root), None);
        assert_eq!(tree.children(root), &[para]);
        assert_eq!(tree.index_in_parent(leaf), Some(0));
        assert_eq!(tree.node_length(leaf), 11);
        assert_eq!(tree.node_length(para), 1);
        assert_eq!(tree.text_of(root), "Hello world");
    }

    #[test]
    fn test_highlight_wrapper_shape() {
        let mut tree = Tree::new();
        let wrapper = tree.new_highlight("world");

        assert!(tree.is_highlight(wrapper));
        assert!(tree.is_squishy(wrapper));
        assert_eq!(tree.children(wrapper).len(), 1);
        let inner = tree.children(wrapper)[0];
        assert_eq!(tree.leaf_text(inner), Some("world"));
        assert_eq!(tree.parent(inner), Some(wrapper));
        assert_eq!(tree.text_len(wrapper), 5);
    }

    #[test]
    fn test_splice_replaces_one_child_with_run() {
        let (mut tree, _root, para, leaf) = sample();
        let plain = tree.new_leaf("Hello ");
        let marked = tree.new_highlight("world");
        tree.splice(para, 0, &[plain, marked]);

        assert_eq!(tree.children(para), &[plain, marked]);
        assert_eq!(tree.parent(leaf), None, "spliced-out leaf is detached");
        assert_eq!(tree.parent(plain), Some(para));
        assert_eq!(tree.text_of(para), "Hello world");
    }

    #[test]
    fn test_common_ancestor() {
        let mut tree = Tree::new();
        let root = tree.new_element(DisplayRole::Block, WhiteSpace::Normal);
        let a = tree.new_element(DisplayRole::Block, WhiteSpace::Normal);
        let b = tree.new_element(DisplayRole::Block, WhiteSpace::Normal);
        let la = tree.new_leaf("a");
        let lb = tree.new_leaf("b");
        tree.append(root, a);
        tree.append(root, b);
        tree.append(a, la);
        tree.append(b, lb);

        assert_eq!(tree.common_ancestor(la, lb), Some(root));
        assert_eq!(tree.common_ancestor(la, a), Some(a));
        assert_eq!(tree.common_ancestor(la, la), Some(la));
    }

    #[test]
    fn test_common_ancestor_of_detached_nodes() {
        let mut tree = Tree::new();
        let a = tree.new_leaf("a");
        let b = tree.new_leaf("b");
        assert_eq!(tree.common_ancestor(a, b), None);
    }
}
