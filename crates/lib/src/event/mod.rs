//! Update records and the batches that carry them.
//!
//! An [`UpdateRecord`] describes one coarse change to a document: a parent's
//! new child list, a new root, a special node classification, or a content
//! change. Records are immutable values; two records are equal when their
//! fields are equal, so a whole [`UpdateBatch`] can be compared against an
//! expected value.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    Result,
    document::{DocumentId, NodeId},
};

mod special;

pub use special::{SpecialNodeType, classify};

/// A parent's children changed; carries the resulting child order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildrenUpdated {
    pub node_id: NodeId,
    pub child_ids: Vec<NodeId>,
}

/// The document was replaced; carries the new root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootNodeIdUpdated {
    pub node_id: NodeId,
}

/// A node carries a special type marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialNodeTypeSet {
    pub node_id: NodeId,
    pub content: SpecialNodeType,
}

/// Content of a node changed. The payload shape belongs to the content producer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentUpdated {
    pub node_id: NodeId,
    pub content: Value,
}

/// One change record inside a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum UpdateRecord {
    ChildrenUpdated(ChildrenUpdated),
    RootNodeIdUpdated(RootNodeIdUpdated),
    SpecialNodeTypeSet(SpecialNodeTypeSet),
    ContentUpdated(ContentUpdated),
}

impl UpdateRecord {
    /// The node this record is about.
    pub fn node_id(&self) -> &NodeId {
        match self {
            UpdateRecord::ChildrenUpdated(r) => &r.node_id,
            UpdateRecord::RootNodeIdUpdated(r) => &r.node_id,
            UpdateRecord::SpecialNodeTypeSet(r) => &r.node_id,
            UpdateRecord::ContentUpdated(r) => &r.node_id,
        }
    }

    /// Short name of the record kind, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            UpdateRecord::ChildrenUpdated(_) => "children_updated",
            UpdateRecord::RootNodeIdUpdated(_) => "root_node_id_updated",
            UpdateRecord::SpecialNodeTypeSet(_) => "special_node_type_set",
            UpdateRecord::ContentUpdated(_) => "content_updated",
        }
    }
}

impl From<ChildrenUpdated> for UpdateRecord {
    fn from(r: ChildrenUpdated) -> Self {
        UpdateRecord::ChildrenUpdated(r)
    }
}

impl From<RootNodeIdUpdated> for UpdateRecord {
    fn from(r: RootNodeIdUpdated) -> Self {
        UpdateRecord::RootNodeIdUpdated(r)
    }
}

impl From<SpecialNodeTypeSet> for UpdateRecord {
    fn from(r: SpecialNodeTypeSet) -> Self {
        UpdateRecord::SpecialNodeTypeSet(r)
    }
}

impl From<ContentUpdated> for UpdateRecord {
    fn from(r: ContentUpdated) -> Self {
        UpdateRecord::ContentUpdated(r)
    }
}

/// Starting point of an update session for one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateHeader {
    pub document_id: DocumentId,
    /// Revision of the last batch already known to peers.
    pub revision: u64,
}

impl UpdateHeader {
    /// A fresh session starting before revision 1.
    pub fn new(document_id: impl Into<DocumentId>) -> Self {
        Self {
            document_id: document_id.into(),
            revision: 0,
        }
    }

    /// Resume a session whose last delivered batch had `revision`.
    pub fn with_revision(mut self, revision: u64) -> Self {
        self.revision = revision;
        self
    }
}

/// Records accumulated during one quiescence window, stamped with a revision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateBatch {
    pub document_id: DocumentId,
    pub revision: u64,
    /// Records in the order they were pushed.
    pub records: Vec<UpdateRecord>,
}

impl UpdateBatch {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Serialize the batch to its JSON wire form.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
