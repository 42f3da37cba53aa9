//! Bidirectional codec between tree positions and canonical addresses.
//!
//! Addresses always refer to the *pristine* tree: the document as it was
//! before the engine injected chrome children at the root or split leaves
//! into highlight segments. `address_of` therefore undoes both kinds of
//! rewrite while climbing: contiguous runs of squishy siblings (segments
//! split off one original leaf) collapse back into a single text offset, and
//! the root component is reduced by the number of injected leading children.

use crate::address::{Address, AddressError};
use crate::document::Document;
use crate::span::Position;
use crate::tree::{NodeId, Tree};

/// A syntactically valid address, normalized and resolved against the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub address: Address,
    pub position: Position,
}

/// Start index of the contiguous squishy run containing `idx`, plus the
/// total text length of the run members strictly before `idx`.
fn run_start(tree: &Tree, parent: NodeId, idx: usize) -> (usize, usize) {
    let children = tree.children(parent);
    let mut start = idx;
    while start > 0 && tree.is_squishy(children[start - 1]) {
        start -= 1;
    }
    let preceding = children[start..idx]
        .iter()
        .map(|&c| tree.text_len(c))
        .sum();
    (start, preceding)
}

/// Pristine child index for the current child index `to`: children in
/// `from..to` counted with each maximal squishy run collapsed to one unit.
/// `to` must not fall in the interior of a run.
fn collapsed_index(tree: &Tree, parent: NodeId, from: usize, to: usize) -> usize {
    let children = tree.children(parent);
    let mut count = 0;
    let mut i = from;
    while i < to {
        if tree.is_squishy(children[i]) {
            while i < to && tree.is_squishy(children[i]) {
                i += 1;
            }
        } else {
            i += 1;
        }
        count += 1;
    }
    count
}

/// Iterative climb from a position to the root, emitting one canonical
/// component per level (deepest first; reversed before returning).
///
/// Returns `None` for positions in detached subtrees.
pub(crate) fn address_of(doc: &Document, pos: Position) -> Option<Address> {
    let tree = &doc.tree;
    let mut node = pos.node;
    let mut offset = pos.offset;
    let mut comps: Vec<usize> = Vec::new();

    loop {
        if tree.is_leaf(node) {
            // A leaf inside a highlight wrapper climbs to the wrapper
            // first: the wrapper holds exactly this leaf, so the text
            // offset carries over unchanged and joins the sibling run at
            // the wrapper's level. Emitting a component before climbing
            // out would give marked characters a deeper address than
            // their plain neighbors.
            let mut carrier = node;
            let mut parent = tree.parent(carrier)?;
            if tree.is_highlight(parent) {
                carrier = parent;
                parent = tree.parent(carrier)?;
            }
            let idx = tree.index_in_parent(carrier)?;
            if offset == tree.text_len(carrier) {
                // One-past-the-end rolls up instead of emitting a component.
                node = parent;
                offset = idx + 1;
            } else {
                let (start, preceding) = run_start(tree, parent, idx);
                comps.push(preceding + offset);
                node = parent;
                offset = start;
            }
            continue;
        }

        if tree.is_highlight(node) {
            // Highlight wrappers are transparent: before/after the wrapper.
            let parent = tree.parent(node)?;
            let idx = tree.index_in_parent(node)?;
            offset = if offset >= tree.node_length(node) {
                idx + 1
            } else {
                idx
            };
            node = parent;
            continue;
        }

        // Container element. A child-index offset in the interior of a
        // squishy run is really a text offset into the original leaf.
        let child_count = tree.children(node).len();
        if offset > 0
            && offset < child_count
            && tree.is_squishy(tree.children(node)[offset])
            && tree.is_squishy(tree.children(node)[offset - 1])
        {
            let (start, preceding) = run_start(tree, node, offset);
            comps.push(preceding);
            offset = start;
        }

        if node == doc.root {
            push_root_component(doc, offset, &mut comps);
            break;
        }

        let parent = tree.parent(node)?;
        let idx = tree.index_in_parent(node)?;
        if offset == child_count {
            node = parent;
            offset = idx + 1;
        } else {
            comps.push(collapsed_index(tree, node, 0, offset));
            node = parent;
            offset = idx;
        }
    }

    comps.reverse();
    while comps.len() > 1 && *comps.last().unwrap() == 0 {
        comps.pop();
    }
    Some(Address::from_components(comps))
}

/// Root-level component: compensate for injected chrome children and clamp
/// into the pristine child range. Clamping discards the deeper components,
/// matching the "whole address collapses to the document edge" behavior.
fn push_root_component(doc: &Document, offset: usize, comps: &mut Vec<usize>) {
    if offset < doc.reserved_len {
        comps.clear();
        comps.push(0);
        return;
    }
    let pristine = collapsed_index(&doc.tree, doc.root, doc.reserved_len, offset);
    if pristine > doc.root_base_len {
        comps.clear();
        comps.push(doc.root_base_len);
        return;
    }
    comps.push(pristine);
}

/// Descend from the root consuming one component per level. Only the final
/// component may land on a leaf's text or one past the end of a node.
pub(crate) fn position_of(doc: &Document, address: &Address) -> Result<Position, AddressError> {
    let tree = &doc.tree;
    let comps = address.components();
    let mut node = doc.root;

    for (depth, &raw) in comps.iter().enumerate() {
        let c = if depth == 0 {
            raw + doc.reserved_len
        } else {
            raw
        };
        let last = depth + 1 == comps.len();

        if tree.is_leaf(node) {
            if !last {
                return Err(AddressError::TrailingComponents { depth });
            }
            let text = tree.leaf_text(node).unwrap_or("");
            // Offsets past the end or inside a multi-byte character never
            // name a boundary the rewriter could split at.
            if c > text.len() || !text.is_char_boundary(c) {
                return Err(AddressError::OutOfBounds { depth });
            }
            return Ok(Position { node, offset: c });
        }

        let child_count = tree.children(node).len();
        if c > child_count {
            return Err(AddressError::OutOfBounds { depth });
        }
        if last {
            return Ok(Position { node, offset: c });
        }
        if c == child_count {
            // One-past-the-end cannot be descended through.
            return Err(AddressError::OutOfBounds { depth });
        }
        node = tree.children(node)[c];
    }

    unreachable!("addresses are non-empty")
}

/// Full parse: grammar, structural validation, then two-phase normalization.
///
/// Walking backward from the last component: while it equals the length of
/// the node it indexes into (one-past-the-end), drop it and increment the
/// new last component; then strip trailing zeros, keeping at least one
/// component. Structurally distinct spellings of the same boundary collapse
/// to a single canonical address this way, e.g. with two sibling leaves of
/// length 4: `0.4` -> `1` and `1.0` -> `1`.
pub(crate) fn parse(doc: &Document, text: &str) -> Result<Resolved, AddressError> {
    let address: Address = text.parse()?;
    position_of(doc, &address)?;

    let tree = &doc.tree;
    let mut comps = address.into_components();

    // The node the final component indexes into.
    let mut node = doc.root;
    for (depth, c) in comps[..comps.len() - 1].iter().enumerate() {
        let c = if depth == 0 { c + doc.reserved_len } else { *c };
        node = tree.children(node)[c];
    }

    let mut n = comps.len();
    while n > 1 && comps[n - 1] == tree.node_length(node) {
        node = tree.parent(node).expect("normalization walked below the root");
        comps[n - 2] += 1;
        n -= 1;
    }
    while n > 1 && comps[n - 1] == 0 {
        node = tree.parent(node).expect("normalization walked below the root");
        n -= 1;
    }
    comps.truncate(n);

    let offset = if n == 1 {
        comps[0] + doc.reserved_len
    } else {
        comps[n - 1]
    };
    Ok(Resolved {
        position: Position { node, offset },
        address: Address::from_components(comps),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::options::Options;
    use crate::tree::{DisplayRole, WhiteSpace};
    use pretty_assertions::assert_eq;

    /// root > [heading > "Title", para > "Hello world"]
    fn two_block_doc() -> (Document, NodeId, NodeId) {
        let mut tree = Tree::new();
        let root = tree.new_element(DisplayRole::Block, WhiteSpace::Normal);
        let heading = tree.new_element(DisplayRole::Block, WhiteSpace::Normal);
        let title = tree.new_leaf("Title");
        let para = tree.new_element(DisplayRole::Block, WhiteSpace::Normal);
        let body = tree.new_leaf("Hello world");
        tree.append(root, heading);
        tree.append(heading, title);
        tree.append(root, para);
        tree.append(para, body);
        let doc = Document::from_tree(tree, root, Options::default()).unwrap();
        (doc, title, body)
    }

    #[test]
    fn test_address_of_leaf_position() {
        let (doc, _, body) = two_block_doc();
        let addr = doc
            .address_of(Position { node: body, offset: 6 })
            .unwrap();
        assert_eq!(addr.to_string(), "1.0.6");
    }

    #[test]
    fn test_address_of_strips_trailing_zeros() {
        let (doc, title, _) = two_block_doc();
        let addr = doc
            .address_of(Position { node: title, offset: 0 })
            .unwrap();
        assert_eq!(addr.to_string(), "0");
    }

    #[test]
    fn test_address_of_rolls_up_one_past_the_end() {
        let (doc, title, _) = two_block_doc();
        // End of "Title" == end of the heading == start of the paragraph.
        let addr = doc
            .address_of(Position { node: title, offset: 5 })
            .unwrap();
        assert_eq!(addr.to_string(), "1");
    }

    #[test]
    fn test_address_of_detached_position_is_none() {
        let (mut doc, _, _) = two_block_doc();
        let stray = doc.tree.new_leaf("floating");
        assert_eq!(doc.address_of(Position { node: stray, offset: 0 }), None);
    }

    #[test]
    fn test_position_of_descends_components() {
        let (doc, _, body) = two_block_doc();
        let addr: Address = "1.0.6".parse().unwrap();
        let pos = doc.position_of(&addr).unwrap();
        assert_eq!(pos, Position { node: body, offset: 6 });
    }

    #[test]
    fn test_position_of_out_of_bounds() {
        let (doc, _, _) = two_block_doc();
        let addr: Address = "1.0.12".parse().unwrap();
        assert_eq!(
            doc.position_of(&addr),
            Err(AddressError::OutOfBounds { depth: 2 })
        );
        let addr: Address = "5".parse().unwrap();
        assert_eq!(
            doc.position_of(&addr),
            Err(AddressError::OutOfBounds { depth: 0 })
        );
    }

    #[test]
    fn test_position_of_rejects_components_past_a_leaf() {
        let (doc, _, _) = two_block_doc();
        // The leaf is reached at depth 2, where the extra component is found.
        let addr: Address = "1.0.6.0".parse().unwrap();
        assert_eq!(
            doc.position_of(&addr),
            Err(AddressError::TrailingComponents { depth: 2 })
        );
    }

    #[test]
    fn test_position_of_rejects_descending_through_one_past_end() {
        let (doc, _, _) = two_block_doc();
        // "2" is a valid final component (end of root) but cannot be
        // descended through.
        assert!(doc.position_of(&"2".parse().unwrap()).is_ok());
        assert_eq!(
            doc.position_of(&"2.0".parse().unwrap()),
            Err(AddressError::OutOfBounds { depth: 0 })
        );
    }

    #[test]
    fn test_parse_normalizes_one_past_the_end_chain() {
        let (doc, _, _) = two_block_doc();
        // End of "Hello world" -> end of para -> end of root: 1.0.11 -> 2.
        let resolved = doc.parse_address("1.0.11").unwrap();
        assert_eq!(resolved.address.to_string(), "2");
        let resolved = doc.parse_address("1.1").unwrap();
        assert_eq!(resolved.address.to_string(), "2");
    }

    #[test]
    fn test_parse_strips_trailing_zeros() {
        let (doc, _, body) = two_block_doc();
        let resolved = doc.parse_address("1.0.0").unwrap();
        assert_eq!(resolved.address.to_string(), "1");
        // But the resolved position still points at the concrete boundary.
        assert_eq!(resolved.position, Position { node: doc.root, offset: 1 });

        let resolved = doc.parse_address("1.0.3").unwrap();
        assert_eq!(resolved.address.to_string(), "1.0.3");
        assert_eq!(resolved.position, Position { node: body, offset: 3 });
    }

    #[test]
    fn test_parse_canonical_idempotence() {
        let (doc, _, _) = two_block_doc();
        for text in ["0", "1.0.4", "1.0.11", "0.0.5", "2", "1.1"] {
            let once = doc.parse_address(text).unwrap();
            let twice = doc.parse_address(&once.address.to_string()).unwrap();
            assert_eq!(once, twice, "canonicalizing {text:?} must be idempotent");
        }
    }

    #[test]
    fn test_round_trip_over_every_leaf_offset() {
        // Parsing may resolve to a shallower spelling of the same boundary
        // (offset 0 of a first leaf is the parent's start), so the round
        // trip is checked on canonical addresses, not raw positions.
        let (doc, title, body) = two_block_doc();
        for (leaf, len) in [(title, 5), (body, 11)] {
            for offset in 0..len {
                let pos = Position { node: leaf, offset };
                let addr = doc.address_of(pos).unwrap();
                let resolved = doc.parse_address(&addr.to_string()).unwrap();
                assert_eq!(resolved.address, addr, "round trip at offset {offset}");
                assert_eq!(
                    doc.address_of(resolved.position).unwrap(),
                    addr,
                    "resolved boundary at offset {offset}"
                );
            }
        }
    }

    #[test]
    fn test_order_matches_document_order() {
        let (doc, title, body) = two_block_doc();
        let a = doc.address_of(Position { node: title, offset: 2 }).unwrap();
        let b = doc.address_of(Position { node: body, offset: 0 }).unwrap();
        let c = doc.address_of(Position { node: body, offset: 9 }).unwrap();
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn test_addresses_survive_highlight_splitting() {
        let (mut doc, _, body) = two_block_doc();
        let pristine: Vec<String> = (0..11)
            .map(|offset| {
                doc.address_of(Position { node: body, offset })
                    .unwrap()
                    .to_string()
            })
            .collect();

        // Split "Hello world" by highlighting "world".
        let span = doc.resolve_pair_strings(&["1.0.6-1.0.11"]).pop().unwrap();
        doc.apply_highlights(vec![span]);

        let para = doc.tree.children(doc.root)[1];
        let segments = doc.tree.children(para).to_vec();
        assert_eq!(segments.len(), 2);
        let plain = segments[0];
        let marked = doc.tree.children(segments[1])[0];

        // The same characters now live in two different leaves, but their
        // addresses are unchanged.
        for offset in 0..6 {
            let addr = doc
                .address_of(Position { node: plain, offset })
                .unwrap();
            assert_eq!(addr.to_string(), pristine[offset]);
        }
        for offset in 0..5 {
            let addr = doc
                .address_of(Position { node: marked, offset })
                .unwrap();
            assert_eq!(addr.to_string(), pristine[6 + offset]);
        }
    }

    #[test]
    fn test_selection_inside_highlight_resolves_in_a_fresh_session() {
        let (mut doc, _, _) = two_block_doc();
        let span = doc.resolve_pair_strings(&["1.0.6-1.0.11"]).pop().unwrap();
        doc.apply_highlights(vec![span]);

        let para = doc.tree.children(doc.root)[1];
        let wrapper = doc.tree.children(para)[1];
        let marked = doc.tree.children(wrapper)[0];

        // The 'o' of "world", selected inside the marked leaf, addresses as
        // the eighth character of the original "Hello world" leaf.
        let addr = doc
            .address_of(Position { node: marked, offset: 1 })
            .unwrap();
        assert_eq!(addr.to_string(), "1.0.7");

        // A document that never saw the rewrite resolves it directly.
        let (fresh, _, body) = two_block_doc();
        let resolved = fresh.parse_address(&addr.to_string()).unwrap();
        assert_eq!(resolved.position, Position { node: body, offset: 7 });
    }

    #[test]
    fn test_wrapper_positions_address_as_run_boundaries() {
        let (mut doc, _, _) = two_block_doc();
        let span = doc.resolve_pair_strings(&["1.0.6-1.0.11"]).pop().unwrap();
        doc.apply_highlights(vec![span]);

        let para = doc.tree.children(doc.root)[1];
        let wrapper = doc.tree.children(para)[1];

        let before = doc
            .address_of(Position { node: wrapper, offset: 0 })
            .unwrap();
        assert_eq!(before.to_string(), "1.0.6");
        let after = doc
            .address_of(Position { node: wrapper, offset: 1 })
            .unwrap();
        assert_eq!(after.to_string(), "2");
    }

    #[test]
    fn test_position_of_rejects_mid_character_offsets() {
        let mut tree = Tree::new();
        let root = tree.new_element(DisplayRole::Block, WhiteSpace::Normal);
        let para = tree.new_element(DisplayRole::Block, WhiteSpace::Normal);
        let body = tree.new_leaf("héllo");
        tree.append(root, para);
        tree.append(para, body);
        let doc = Document::from_tree(tree, root, Options::default()).unwrap();

        // Byte 2 is inside the two-byte 'é'.
        assert_eq!(
            doc.position_of(&"0.0.2".parse().unwrap()),
            Err(AddressError::OutOfBounds { depth: 2 })
        );
        // The boundaries on either side of it are fine.
        assert_eq!(
            doc.position_of(&"0.0.1".parse().unwrap()),
            Ok(Position { node: body, offset: 1 })
        );
        assert_eq!(
            doc.position_of(&"0.0.3".parse().unwrap()),
            Ok(Position { node: body, offset: 3 })
        );
    }

    #[test]
    fn test_chrome_injection_is_compensated() {
        let (mut doc, _, body) = two_block_doc();
        let before = doc
            .address_of(Position { node: body, offset: 4 })
            .unwrap();
        doc.install_chrome();
        let after = doc
            .address_of(Position { node: body, offset: 4 })
            .unwrap();
        assert_eq!(before, after);

        // And resolution still finds the same position.
        let resolved = doc.parse_address(&after.to_string()).unwrap();
        assert_eq!(resolved.position, Position { node: body, offset: 4 });
    }

    #[test]
    fn test_position_inside_chrome_clamps_to_document_start() {
        let (mut doc, _, _) = two_block_doc();
        doc.install_chrome();
        let chrome = doc.tree.children(doc.root)[0];
        let addr = doc
            .address_of(Position { node: chrome, offset: 0 })
            .unwrap();
        assert_eq!(addr.to_string(), "0");
    }
}
