use thiserror::Error;

use crate::address::AddressError;

/// Why a requested pair or span was dropped during resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DropReason {
    #[error("pair is not of the form A-B")]
    MalformedPair,
    #[error("bad address: {0}")]
    BadAddress(AddressError),
    #[error("span is empty")]
    EmptySpan,
    #[error("address no longer resolves: {0}")]
    Unresolvable(AddressError),
}

/// One dropped input together with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub input: String,
    pub reason: DropReason,
}

/// Collection sink for non-fatal drops. The engine never aborts a batch on
/// a bad entry; it records the drop here and the caller decides whether to
/// log, surface, or ignore it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub(crate) fn record(&mut self, input: impl Into<String>, reason: DropReason) {
        self.entries.push(Diagnostic {
            input: input.into(),
            reason,
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_inspect() {
        let mut diagnostics = Diagnostics::default();
        assert!(diagnostics.is_empty());

        diagnostics.record("1.2-", DropReason::MalformedPair);
        diagnostics.record("9.9-9.9.9", DropReason::BadAddress(AddressError::Syntax));

        assert_eq!(diagnostics.len(), 2);
        let first = diagnostics.iter().next().unwrap();
        assert_eq!(first.input, "1.2-");
        assert_eq!(first.reason, DropReason::MalformedPair);

        diagnostics.clear();
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_reasons_render_for_logging() {
        assert_eq!(
            DropReason::MalformedPair.to_string(),
            "pair is not of the form A-B"
        );
        assert!(
            DropReason::Unresolvable(AddressError::OutOfBounds { depth: 1 })
                .to_string()
                .contains("no longer resolves")
        );
    }
}
