use serde::{Deserialize, Serialize};

use crate::tree::{DisplayRole, WhiteSpace};

/// Tunable behavior of the engine. The defaults reproduce the stock
/// behavior; the allowlists exist because the whitespace-guard role set is
/// product configuration, not something the engine should infer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Name of the query parameter carrying the retrieval-time address list.
    pub query_param: String,
    /// Element roles treated as block-like by the whitespace guard.
    pub block_roles: Vec<DisplayRole>,
    /// Whitespace modes under which whitespace-only leaves are still
    /// highlighted.
    pub preserve_whitespace: Vec<WhiteSpace>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            query_param: "mark".to_string(),
            block_roles: vec![
                DisplayRole::Block,
                DisplayRole::ListItem,
                DisplayRole::TableCell,
                DisplayRole::TableColumn,
                DisplayRole::TableColumnGroup,
                DisplayRole::TableFooterGroup,
                DisplayRole::TableHeaderGroup,
                DisplayRole::TableRow,
                DisplayRole::TableRowGroup,
            ],
            preserve_whitespace: vec![
                WhiteSpace::BreakSpaces,
                WhiteSpace::Pre,
                WhiteSpace::PreLine,
                WhiteSpace::PreWrap,
            ],
        }
    }
}

impl Options {
    pub fn is_block_role(&self, role: DisplayRole) -> bool {
        self.block_roles.contains(&role)
    }

    pub fn preserves_whitespace(&self, white_space: WhiteSpace) -> bool {
        self.preserve_whitespace.contains(&white_space)
    }
}
