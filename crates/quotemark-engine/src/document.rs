//! Document facade: one tree plus the live span set, the installed chrome,
//! and the engine configuration, with the public operations hanging off it.

use std::path::Path;

use anyhow::{Result, bail};

use crate::address::codec::{self, Resolved};
use crate::address::{Address, AddressError};
use crate::diagnostics::Diagnostics;
use crate::highlight;
use crate::io::{self, NodeSpec};
use crate::options::Options;
use crate::resolve;
use crate::span::{Position, Span};
use crate::tree::{DisplayRole, NodeId, Tree, WhiteSpace};
use crate::wire;

/// Number of leading root children reserved for injected interface nodes.
pub const RESERVED_CHROME_SLOTS: usize = 2;

/// One run of leaf text in document order, for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRun {
    pub text: String,
    pub highlighted: bool,
}

/// A node tree under highlight management.
///
/// The tree mutates as highlights are applied, but addresses handed out or
/// accepted by a document always describe the *pristine* tree: the shape it
/// had at construction, before chrome injection and leaf splitting. That is
/// what makes the serialized form stable across sessions.
#[derive(Clone)]
pub struct Document {
    pub(crate) tree: Tree,
    pub(crate) root: NodeId,
    /// Root child count at construction.
    pub(crate) root_base_len: usize,
    /// Leading root children injected as chrome, excluded from addressing.
    pub(crate) reserved_len: usize,
    pub(crate) spans: Vec<Span>,
    pub(crate) options: Options,
    pub(crate) diagnostics: Diagnostics,
}

impl Document {
    pub fn from_tree(tree: Tree, root: NodeId, options: Options) -> Result<Self> {
        if tree.is_leaf(root) {
            bail!("document root must be an element");
        }
        if tree.parent(root).is_some() {
            bail!("document root must not have a parent");
        }
        let root_base_len = tree.children(root).len();
        Ok(Self {
            tree,
            root,
            root_base_len,
            reserved_len: 0,
            spans: Vec::new(),
            options,
            diagnostics: Diagnostics::default(),
        })
    }

    pub fn from_spec(spec: &NodeSpec, options: Options) -> Result<Self> {
        let (tree, root) = io::tree_from_spec(spec);
        Self::from_tree(tree, root, options)
    }

    pub fn from_path(path: &Path, options: Options) -> Result<Self> {
        let spec = io::read_spec(path)?;
        Self::from_spec(&spec, options)
    }

    /// Reserve the leading root slots for interface nodes (counters, popup
    /// mounts). Addressing compensates for these, so installing chrome
    /// never changes what any address means. Idempotent.
    pub fn install_chrome(&mut self) {
        if self.reserved_len != 0 {
            return;
        }
        for slot in 0..RESERVED_CHROME_SLOTS {
            let placeholder = self
                .tree
                .new_element(DisplayRole::Inline, WhiteSpace::Normal);
            self.tree.insert_child(self.root, slot, placeholder);
        }
        self.reserved_len = RESERVED_CHROME_SLOTS;
    }

    // --- addressing ---

    pub fn address_of(&self, position: Position) -> Option<Address> {
        codec::address_of(self, position)
    }

    pub fn position_of(&self, address: &Address) -> Result<Position, AddressError> {
        codec::position_of(self, address)
    }

    pub fn parse_address(&self, text: &str) -> Result<Resolved, AddressError> {
        codec::parse(self, text)
    }

    /// Canonical `A-B` form of a span, or `None` for detached endpoints.
    pub fn serialize_span(&self, span: &Span) -> Option<String> {
        let start = self.address_of(span.start)?;
        let end = self.address_of(span.end)?;
        Some(format!("{start}-{end}"))
    }

    // --- highlighting ---

    /// Reduce raw `A-B` pair strings to a sorted, disjoint span set.
    /// Invalid entries are dropped and reported through [`Self::diagnostics`].
    pub fn resolve_pair_strings<S: AsRef<str>>(&mut self, pairs: &[S]) -> Vec<Span> {
        resolve::resolve_pairs(self, pairs)
    }

    /// Install a resolved span set, rewriting the tree to match.
    pub fn apply_highlights(&mut self, spans: Vec<Span>) {
        highlight::apply(self, spans);
    }

    /// Full query-driven path: extract the span parameter, resolve it, and
    /// apply the result. Returns the number of installed spans.
    pub fn highlight_from_query(&mut self, query: &str) -> usize {
        let Some(value) = wire::param_value(query, &self.options.query_param) else {
            return 0;
        };
        let pairs = wire::split_pairs(&value);
        let spans = self.resolve_pair_strings(&pairs);
        self.apply_highlights(spans);
        self.spans.len()
    }

    /// Serialize the live span set back into a shareable query entry.
    pub fn selection_to_query(&self) -> Option<String> {
        if self.spans.is_empty() {
            return None;
        }
        let mut pairs = Vec::with_capacity(self.spans.len());
        for span in &self.spans {
            pairs.push(self.serialize_span(span)?);
        }
        pairs.sort();
        Some(wire::encode_param(&self.options.query_param, &pairs))
    }

    /// Node a viewer should scroll into view first: the start of the first
    /// span.
    pub fn scroll_anchor(&self) -> Option<NodeId> {
        self.spans.first()?.scroll_anchor(&self.tree)
    }

    // --- rendering ---

    pub fn text(&self) -> String {
        self.tree.text_of(self.root)
    }

    /// Leaf text in document order, each run tagged with whether it sits
    /// inside a highlight wrapper.
    pub fn runs(&self) -> Vec<TextRun> {
        let mut out = Vec::new();
        self.collect_runs(self.root, false, &mut out);
        out
    }

    fn collect_runs(&self, node: NodeId, highlighted: bool, out: &mut Vec<TextRun>) {
        if let Some(text) = self.tree.leaf_text(node) {
            if !text.is_empty() {
                out.push(TextRun {
                    text: text.to_string(),
                    highlighted,
                });
            }
            return;
        }
        let inside = highlighted || self.tree.is_highlight(node);
        for &child in self.tree.children(node) {
            self.collect_runs(child, inside, out);
        }
    }

    // --- accessors ---

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn root(&self) -> NodeId {
        self.root
    }
}
