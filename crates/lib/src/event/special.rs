//! Classification of nodes that carry special type markers.
//!
//! Summary groups are encoded with two flags: the node that opens a group of
//! siblings has `FIRST_GROUP`, and the summary node that closes it has
//! `SUMMARY`. A node can do both at once.

use serde::{Deserialize, Serialize};

use super::SpecialNodeTypeSet;
use crate::{
    Result,
    document::{DocumentView, NodeFlags, NodeId},
};

/// Special type tag attached to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpecialNodeType {
    SummaryBoundaryBegin,
    SummaryBoundaryEnd,
    SummaryBoundaryBeginEnd,
}

impl SpecialNodeType {
    /// Maps a flag combination to its tag. Flags outside the table map to `None`.
    pub fn from_flags(flags: NodeFlags) -> Option<Self> {
        let begin = flags.contains(NodeFlags::FIRST_GROUP);
        let end = flags.contains(NodeFlags::SUMMARY);
        match (begin, end) {
            (true, true) => Some(SpecialNodeType::SummaryBoundaryBeginEnd),
            (true, false) => Some(SpecialNodeType::SummaryBoundaryBegin),
            (false, true) => Some(SpecialNodeType::SummaryBoundaryEnd),
            (false, false) => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SpecialNodeType::SummaryBoundaryBegin => "summary-boundary-begin",
            SpecialNodeType::SummaryBoundaryEnd => "summary-boundary-end",
            SpecialNodeType::SummaryBoundaryBeginEnd => "summary-boundary-begin-end",
        }
    }
}

impl std::fmt::Display for SpecialNodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify `node` by its current flags.
///
/// Flags are read on every call; nothing is cached between calls.
pub fn classify(document: &dyn DocumentView, node: &NodeId) -> Result<Option<SpecialNodeTypeSet>> {
    let flags = document.flags(node)?;
    Ok(SpecialNodeType::from_flags(flags).map(|content| SpecialNodeTypeSet {
        node_id: node.clone(),
        content,
    }))
}
