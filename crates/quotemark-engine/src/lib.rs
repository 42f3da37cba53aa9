//! Core engine for addressable text highlighting.
//!
//! A [`Document`] wraps a node tree and keeps a set of highlighted spans
//! over it. Spans are exchanged as compact hierarchical addresses
//! (`"1.0.6-2"`) that describe positions in the tree as it was loaded, so a
//! link minted in one session finds the same text in the next one, even
//! though applying highlights rewrites the tree under the addresses.
//!
//! The pipeline: [`wire`] extracts the address list from a query string,
//! [`Document::resolve_pair_strings`] reduces it to a sorted disjoint span
//! set, and [`Document::apply_highlights`] rewrites the tree while keeping
//! every live span endpoint valid. [`indicator`] holds the math for
//! off-screen span counters and popup placement, behind a geometry trait
//! the renderer implements.

pub mod address;
pub mod diagnostics;
pub mod document;
mod highlight;
pub mod indicator;
pub mod io;
pub mod options;
mod resolve;
pub mod span;
pub mod tree;
pub mod wire;

pub use address::{Address, AddressError, Resolved};
pub use diagnostics::{Diagnostic, Diagnostics, DropReason};
pub use document::{Document, RESERVED_CHROME_SLOTS, TextRun};
pub use indicator::{
    GeometryProvider, IndicatorState, PopupPlacement, Rect, Viewport, popup_placement,
};
pub use io::{IoError, NodeSpec};
pub use options::Options;
pub use span::{Position, Span};
pub use tree::{DisplayRole, NodeId, Tree, WhiteSpace};
