//! Reduction of raw address-pair strings to a minimal, sorted, disjoint set
//! of resolved spans.
//!
//! Every failure here is a local skip recorded in the document's
//! diagnostics; one malformed entry never aborts the batch.

use crate::address::codec::{self, Resolved};
use crate::diagnostics::DropReason;
use crate::document::Document;
use crate::span::Span;

/// Parse, orient, sort, merge, and resolve a batch of `"A-B"` pair strings.
pub(crate) fn resolve_pairs<S: AsRef<str>>(doc: &mut Document, raw_pairs: &[S]) -> Vec<Span> {
    let mut pairs: Vec<(Resolved, Resolved)> = Vec::new();

    for raw in raw_pairs {
        let raw = raw.as_ref();
        let Some((a, b)) = raw.split_once('-') else {
            doc.diagnostics.record(raw, DropReason::MalformedPair);
            continue;
        };
        let a = match codec::parse(doc, a) {
            Ok(resolved) => resolved,
            Err(err) => {
                doc.diagnostics.record(raw, DropReason::BadAddress(err));
                continue;
            }
        };
        let b = match codec::parse(doc, b) {
            Ok(resolved) => resolved,
            Err(err) => {
                doc.diagnostics.record(raw, DropReason::BadAddress(err));
                continue;
            }
        };
        // Endpoint order in the pair text is arbitrary; orient by address.
        match a.address.cmp(&b.address) {
            std::cmp::Ordering::Less => pairs.push((a, b)),
            std::cmp::Ordering::Greater => pairs.push((b, a)),
            std::cmp::Ordering::Equal => {
                doc.diagnostics.record(raw, DropReason::EmptySpan);
            }
        }
    }

    pairs.sort_by(|x, y| {
        x.0.address
            .cmp(&y.0.address)
            .then_with(|| x.1.address.cmp(&y.1.address))
    });

    // Single left-to-right sweep: the list is sorted by start, so the only
    // merge candidate for pair i is pair i+1. Touching counts as overlap.
    let mut i = 0;
    while i + 1 < pairs.len() {
        if pairs[i].1.address >= pairs[i + 1].0.address {
            let (_, y) = pairs.remove(i + 1);
            if y.address > pairs[i].1.address {
                pairs[i].1 = y;
            }
        } else {
            i += 1;
        }
    }

    // Re-resolve against the live tree; an address that was valid at parse
    // time but no longer lands anywhere is dropped, not propagated.
    let mut spans = Vec::with_capacity(pairs.len());
    for (start, end) in pairs {
        let start_pos = match codec::position_of(doc, &start.address) {
            Ok(pos) => pos,
            Err(err) => {
                doc.diagnostics
                    .record(start.address.to_string(), DropReason::Unresolvable(err));
                continue;
            }
        };
        let end_pos = match codec::position_of(doc, &end.address) {
            Ok(pos) => pos,
            Err(err) => {
                doc.diagnostics
                    .record(end.address.to_string(), DropReason::Unresolvable(err));
                continue;
            }
        };
        spans.push(Span::new(start_pos, end_pos));
    }
    spans
}
