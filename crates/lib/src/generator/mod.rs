//! Translation of structural change notifications into update records.
//!
//! [`ChildrenUpdateGenerator`] is called by the document model whenever a node
//! is inserted or a whole new document is loaded. It pushes, in a fixed order,
//! the records describing the change into [`Updates`]:
//!
//! 1. the `ChildrenUpdated` record of the parent,
//! 2. the special type record of the inserted node, if it has one,
//! 3. whatever the content collaborator pushes for the inserted node,
//! 4. the same sequence for every descendant of the inserted node, top-down.
//!
//! Inserting a node that already has descendants therefore produces the same
//! records as inserting the node and then each descendant one by one.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, trace, warn};

use crate::{
    Result,
    document::{DocumentView, NodeId},
    event::{RootNodeIdUpdated, UpdateRecord, classify},
    updates::{PendingSlot, Updates},
};

mod collaborators;

pub use collaborators::{
    ChildrenListFactory, ContentUpdateGenerators, NoContentUpdates, NodeContentUpdates,
    StructureUpdateEventFactory,
};


/// Parents whose `ChildrenUpdated` record sits in the batch currently pending.
#[derive(Debug, Default)]
struct AnnouncedParents {
    revision: u64,
    slots: HashMap<NodeId, PendingSlot>,
}

impl AnnouncedParents {
    fn remember(&mut self, parent: NodeId, slot: PendingSlot) {
        if slot.revision() != self.revision {
            self.slots.clear();
            self.revision = slot.revision();
        }
        self.slots.insert(parent, slot);
    }
}

enum Visit {
    /// Classify the node and announce it to the content collaborator, then expand it.
    Enter(NodeId),
    /// Announce the node's children and enter each of them.
    Expand(NodeId),
}

impl Visit {
    fn node(&self) -> &NodeId {
        match self {
            Visit::Enter(node) | Visit::Expand(node) => node,
        }
    }
}

/// Turns node insertions and document resets into update records.
pub struct ChildrenUpdateGenerator {
    updates: Arc<Updates>,
    structure: Arc<dyn StructureUpdateEventFactory>,
    content: Arc<dyn ContentUpdateGenerators>,
    announced: Mutex<AnnouncedParents>,
}

impl ChildrenUpdateGenerator {
    pub fn new(
        updates: Arc<Updates>,
        structure: Arc<dyn StructureUpdateEventFactory>,
        content: Arc<dyn ContentUpdateGenerators>,
    ) -> Self {
        Self {
            updates,
            structure,
            content,
            announced: Mutex::new(AnnouncedParents::default()),
        }
    }

    pub fn updates(&self) -> &Arc<Updates> {
        &self.updates
    }

    /// `inserted` was attached under `parent`.
    ///
    /// If `inserted` already carries a subtree, every descendant is expanded
    /// in pre-order. A collaborator error aborts the walk; records pushed
    /// before the failure stay pending and are flushed as usual.
    pub fn on_node_inserted(
        &self,
        document: &dyn DocumentView,
        parent: &NodeId,
        inserted: &NodeId,
    ) -> Result<()> {
        debug!(parent = %parent, node = %inserted, "Translating node insertion");
        self.announce_children(document, parent)?;
        self.walk(document, Visit::Enter(inserted.clone()))
    }

    /// `document` replaced the previous document wholesale.
    ///
    /// Parents announced earlier in the pending batch belong to the replaced
    /// document, so their records are left alone and fresh ones are pushed
    /// after the root record.
    pub fn on_new_map(&self, document: &dyn DocumentView) -> Result<()> {
        let root = document.root();
        self.lock_announced().slots.clear();
        info!(document = %document.document_id(), root = %root, "Translating new document");
        if document.document_id() != self.updates.document_id() {
            warn!(
                document = %document.document_id(),
                session = %self.updates.document_id(),
                "New document does not match the update session"
            );
        }

        self.updates.push(RootNodeIdUpdated {
            node_id: root.clone(),
        });
        self.content.on_new_map(document)?;
        self.content.on_new_node(document, &root)?;
        self.walk(document, Visit::Expand(root))
    }

    fn lock_announced(&self) -> MutexGuard<'_, AnnouncedParents> {
        self.announced.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Push the `ChildrenUpdated` record of `parent`, once per pending batch.
    ///
    /// A parent already announced in the pending batch gets its record
    /// refreshed in place so it reflects every insertion of the window.
    fn announce_children(&self, document: &dyn DocumentView, parent: &NodeId) -> Result<()> {
        let record: UpdateRecord = self
            .structure
            .create_children_updated_event(document, parent)?
            .into();

        let mut announced = self.lock_announced();
        let record = match announced.slots.get(parent).copied() {
            Some(slot) => match self.updates.replace(slot, record) {
                None => {
                    trace!(parent = %parent, "Refreshed pending children update");
                    return Ok(());
                }
                Some(record) => record,
            },
            None => record,
        };
        let slot = self.updates.push(record);
        announced.remember(parent.clone(), slot);
        Ok(())
    }

    /// Pre-order walk over node IDs, reading children at visit time.
    ///
    /// The live document is assumed not to change during one walk. A node
    /// reached twice means the view is not a tree; it is skipped.
    fn walk(&self, document: &dyn DocumentView, start: Visit) -> Result<()> {
        let mut visited = HashSet::new();
        visited.insert(start.node().clone());
        let mut stack = vec![start];

        while let Some(visit) = stack.pop() {
            match visit {
                Visit::Enter(node) => {
                    if let Some(record) = classify(document, &node)? {
                        self.updates.push(record);
                    }
                    self.content.on_new_node(document, &node)?;
                    stack.push(Visit::Expand(node));
                }
                Visit::Expand(node) => {
                    let children = document.children(&node)?;
                    if children.is_empty() {
                        continue;
                    }
                    self.announce_children(document, &node)?;
                    for child in children.into_iter().rev() {
                        if visited.insert(child.clone()) {
                            stack.push(Visit::Enter(child));
                        } else {
                            warn!(parent = %node, node = %child, "Node reached twice while expanding subtree");
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for ChildrenUpdateGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChildrenUpdateGenerator")
            .field("updates", &self.updates)
            .field("announced", &self.lock_announced().slots.len())
            .finish()
    }
}
