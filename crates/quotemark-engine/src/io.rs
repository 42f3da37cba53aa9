//! JSON document loading.
//!
//! Documents arrive as a nested JSON value: a bare string is a text leaf,
//! an object is an element with an optional role, whitespace mode, and
//! child list. This mirrors how a renderer-side serializer would dump a
//! styled node tree.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tree::{DisplayRole, NodeId, Tree, WhiteSpace};

#[derive(Debug, Error)]
pub enum IoError {
    #[error("failed to read document: {0}")]
    Read(#[from] std::io::Error),
    #[error("malformed document: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Serialized form of one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeSpec {
    Text(String),
    Element {
        #[serde(default)]
        role: DisplayRole,
        #[serde(default)]
        white_space: WhiteSpace,
        #[serde(default)]
        children: Vec<NodeSpec>,
    },
}

pub fn read_spec(path: &Path) -> Result<NodeSpec, IoError> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Materialize a spec into an arena tree, returning the root id.
pub fn tree_from_spec(spec: &NodeSpec) -> (Tree, NodeId) {
    let mut tree = Tree::new();
    let root = build(&mut tree, spec);
    (tree, root)
}

fn build(tree: &mut Tree, spec: &NodeSpec) -> NodeId {
    match spec {
        NodeSpec::Text(text) => tree.new_leaf(text),
        NodeSpec::Element {
            role,
            white_space,
            children,
        } => {
            let element = tree.new_element(*role, *white_space);
            for child in children {
                let id = build(tree, child);
                tree.append(element, id);
            }
            element
        }
    }
}
