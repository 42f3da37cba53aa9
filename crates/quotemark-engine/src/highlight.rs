//! Tree rewriting for a resolved span set.
//!
//! Applying highlights splits each covered leaf into a run of plain leaves
//! and highlight wrappers, splicing the run into the parent in place of the
//! original leaf. Every live span endpoint is remapped *before* the splice,
//! so the installed spans stay valid against the rewritten tree and can be
//! re-serialized to the same addresses they were parsed from.

use std::collections::BTreeMap;

use crate::document::Document;
use crate::options::Options;
use crate::span::{Position, Span};
use crate::tree::{NodeId, Tree};

/// Install `spans` as the document's live span set and rewrite the tree to
/// match. Spans must be sorted, disjoint, and oriented (the resolver's
/// output shape).
pub(crate) fn apply(doc: &mut Document, spans: Vec<Span>) {
    doc.spans = spans;
    let per_leaf = collect(&doc.tree, doc.root, &doc.spans, &doc.options);
    for (leaf, intervals) in per_leaf {
        rewrite_leaf(&mut doc.tree, &mut doc.spans, leaf, &intervals);
    }
}

/// Per-leaf byte intervals covered by the span set, in document order.
///
/// A span endpoint can sit at a leaf text offset or at a child index of any
/// ancestor element, so coverage is tracked as an active flag threaded
/// through a pre-order walk, flipped at every boundary an endpoint names.
fn collect(
    tree: &Tree,
    root: NodeId,
    spans: &[Span],
    options: &Options,
) -> BTreeMap<NodeId, Vec<(usize, usize)>> {
    let mut out = BTreeMap::new();
    if spans.is_empty() {
        return out;
    }
    let mut active = false;
    walk(tree, spans, options, root, &mut active, &mut out);
    out
}

fn walk(
    tree: &Tree,
    spans: &[Span],
    options: &Options,
    node: NodeId,
    active: &mut bool,
    out: &mut BTreeMap<NodeId, Vec<(usize, usize)>>,
) {
    let children = tree.children(node).to_vec();
    for (k, &child) in children.iter().enumerate() {
        cross_boundary(spans, node, k, active);
        if tree.is_leaf(child) {
            collect_in_leaf(tree, spans, options, child, active, out);
        } else {
            walk(tree, spans, options, child, active, out);
        }
    }
    cross_boundary(spans, node, children.len(), active);
}

/// Flip the active flag for every span endpoint at this exact boundary.
/// Ends are processed before starts so a close and a re-open at the same
/// boundary (which the resolver's touch-merge normally prevents) still
/// leave the flag open.
fn cross_boundary(spans: &[Span], node: NodeId, offset: usize, active: &mut bool) {
    for span in spans {
        if span.end.node == node && span.end.offset == offset {
            *active = false;
        }
    }
    for span in spans {
        if span.start.node == node && span.start.offset == offset {
            *active = true;
        }
    }
}

fn collect_in_leaf(
    tree: &Tree,
    spans: &[Span],
    options: &Options,
    leaf: NodeId,
    active: &mut bool,
    out: &mut BTreeMap<NodeId, Vec<(usize, usize)>>,
) {
    // (offset, is_start); ends sort before starts at equal offsets.
    let mut events: Vec<(usize, bool)> = Vec::new();
    for span in spans {
        if span.start.node == leaf {
            events.push((span.start.offset, true));
        }
        if span.end.node == leaf {
            events.push((span.end.offset, false));
        }
    }
    events.sort_unstable();

    let mut open = if *active { Some(0) } else { None };
    for (offset, is_start) in events {
        if is_start {
            if open.is_none() {
                open = Some(offset);
            }
            *active = true;
        } else {
            if let Some(from) = open.take() {
                record(tree, options, out, leaf, from, offset);
            }
            *active = false;
        }
    }
    if let Some(from) = open {
        record(tree, options, out, leaf, from, tree.node_length(leaf));
    }
}

/// Record one covered interval of a leaf, absorbing into the previous
/// interval when they touch.
///
/// Whitespace-only leaves sitting next to a block-like sibling are skipped
/// unless their container preserves whitespace: those leaves are
/// formatting gaps between blocks, and wrapping them splits nodes for no
/// visible mark.
fn record(
    tree: &Tree,
    options: &Options,
    out: &mut BTreeMap<NodeId, Vec<(usize, usize)>>,
    leaf: NodeId,
    from: usize,
    to: usize,
) {
    if from >= to {
        return;
    }
    let Some(parent) = tree.parent(leaf) else {
        return;
    };
    if tree.is_highlight(parent) {
        // Already marked.
        return;
    }
    let text = tree.leaf_text(leaf).unwrap_or("");
    if text.chars().all(char::is_whitespace) {
        let preserved = tree
            .white_space(parent)
            .is_some_and(|w| options.preserves_whitespace(w));
        if !preserved && has_block_sibling(tree, options, parent, leaf) {
            return;
        }
    }

    let intervals = out.entry(leaf).or_default();
    match intervals.last_mut() {
        Some(last) if last.1 >= from => last.1 = last.1.max(to),
        _ => intervals.push((from, to)),
    }
}

/// Whether the previous or next sibling is a block-like element.
fn has_block_sibling(tree: &Tree, options: &Options, parent: NodeId, leaf: NodeId) -> bool {
    let Some(idx) = tree.index_in_parent(leaf) else {
        return false;
    };
    let children = tree.children(parent);
    let block = |id: NodeId| tree.role(id).is_some_and(|r| options.is_block_role(r));
    (idx > 0 && block(children[idx - 1]))
        || children.get(idx + 1).copied().is_some_and(block)
}

struct Segment {
    node: NodeId,
    len: usize,
    highlight: bool,
}

/// Split one leaf into plain/highlight segments, remap every span endpoint
/// that referenced the leaf or its parent's child indices, then splice the
/// segments in. Remapping must precede the splice: it needs the old child
/// index of the leaf.
fn rewrite_leaf(tree: &mut Tree, spans: &mut [Span], leaf: NodeId, intervals: &[(usize, usize)]) {
    if intervals.is_empty() {
        return;
    }
    let (Some(parent), Some(idx)) = (tree.parent(leaf), tree.index_in_parent(leaf)) else {
        return;
    };
    let Some(text) = tree.leaf_text(leaf).map(str::to_owned) else {
        return;
    };

    let mut segments: Vec<Segment> = Vec::new();
    let mut cursor = 0;
    for &(from, to) in intervals {
        if from > cursor {
            let node = tree.new_leaf(&text[cursor..from]);
            segments.push(Segment { node, len: from - cursor, highlight: false });
        }
        let node = tree.new_highlight(&text[from..to]);
        segments.push(Segment { node, len: to - from, highlight: true });
        cursor = to;
    }
    if cursor < text.len() {
        let node = tree.new_leaf(&text[cursor..]);
        segments.push(Segment { node, len: text.len() - cursor, highlight: false });
    }

    let added = segments.len() - 1;
    for span in spans.iter_mut() {
        remap(tree, &segments, leaf, parent, idx, added, &mut span.start);
        remap(tree, &segments, leaf, parent, idx, added, &mut span.end);
    }

    let nodes: Vec<NodeId> = segments.iter().map(|s| s.node).collect();
    tree.splice(parent, idx, &nodes);
}

/// Move one endpoint from the old coordinate space into the new one.
///
/// Leaf offsets land in whichever segment covers them (a highlight
/// segment's coordinate is its inner leaf); child indices of the parent
/// past the spliced slot shift by the number of extra children.
fn remap(
    tree: &Tree,
    segments: &[Segment],
    leaf: NodeId,
    parent: NodeId,
    idx: usize,
    added: usize,
    pos: &mut Position,
) {
    if pos.node == leaf {
        let mut i = 0;
        let mut covered = segments[0].len;
        while i + 1 < segments.len() && covered <= pos.offset {
            i += 1;
            covered += segments[i].len;
        }
        let segment = &segments[i];
        pos.node = if segment.highlight {
            tree.children(segment.node)[0]
        } else {
            segment.node
        };
        pos.offset = segment.len - (covered - pos.offset);
    } else if pos.node == parent && pos.offset > idx {
        pos.offset += added;
    }
}
