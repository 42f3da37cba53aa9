//! Hierarchical addresses: stable, serializable identifiers for positions in
//! a document tree.
//!
//! An address is a non-empty sequence of child/text offsets read from the
//! root down, serialized as dot-separated decimal integers (`"3.1.42"`).
//! Canonical addresses carry no trailing zero components beyond length one
//! and no uncollapsed one-past-the-end components; [`codec`] produces and
//! consumes the canonical form against a live tree.

pub(crate) mod codec;

pub use codec::Resolved;

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Why an address failed to parse or resolve. All of these are local,
/// non-fatal conditions: the caller drops the offending entry and carries on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("address does not match the dot-separated integer grammar")]
    Syntax,
    #[error("component at depth {depth} is out of bounds for the current tree")]
    OutOfBounds { depth: usize },
    #[error("components remain past a leaf at depth {depth}")]
    TrailingComponents { depth: usize },
}

/// Grammar from the wire format: dot-separated unsigned decimals, at most
/// ten digits each, no superfluous leading zero.
static ADDRESS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(0|[1-9][0-9]{0,9})(\.(0|[1-9][0-9]{0,9}))*$").unwrap());

/// An ordered, non-empty sequence of non-negative offsets.
///
/// Ordering is lexicographic over components with a proper prefix sorting
/// before its extension, which matches document order of the positions the
/// addresses denote.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(Vec<usize>);

impl Address {
    /// Build from raw components. Callers are responsible for canonical form;
    /// the codec always hands out canonical addresses.
    pub(crate) fn from_components(components: Vec<usize>) -> Self {
        debug_assert!(!components.is_empty());
        Self(components)
    }

    pub fn components(&self) -> &[usize] {
        &self.0
    }

    pub(crate) fn into_components(self) -> Vec<usize> {
        self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, c) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

impl FromStr for Address {
    type Err = AddressError;

    /// Syntax-only parse. Use [`crate::Document::parse_address`] to also
    /// validate and normalize against a live tree.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !ADDRESS_RE.is_match(s) {
            return Err(AddressError::Syntax);
        }
        let components = s
            .split('.')
            .map(|c| c.parse::<usize>().map_err(|_| AddressError::Syntax))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self(components))
    }
}
