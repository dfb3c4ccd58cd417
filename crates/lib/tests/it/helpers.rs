use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use collab_updates::{
    ChildrenUpdateGenerator, DocumentId, DocumentView, Error, MemoryDocument, NodeId, Result,
    UpdateBatch, UpdateHeader, Updates, UpdatesConfig,
    event::ChildrenUpdated,
    generator::{ContentUpdateGenerators, StructureUpdateEventFactory},
};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::time::timeout;

pub const DELAY: Duration = Duration::from_millis(10);
pub const PAUSE: Duration = Duration::from_millis(100);

pub const MAP_ID: &str = "mapId";
pub const ROOT_NODE_ID: &str = "rootNodeId";
pub const PARENT_NODE_ID: &str = "parentNodeId";
pub const PARENT_NODE_ID2: &str = "parentNodeId2";
pub const CHILD_NODE_ID: &str = "childNodeId";
pub const CHILD_NODE_ID2: &str = "childNodeId2";

/// Structure factory answering with preset records, one per parent.
#[derive(Default)]
pub struct StubFactory {
    records: Mutex<HashMap<NodeId, ChildrenUpdated>>,
    calls: Mutex<Vec<NodeId>>,
}

impl StubFactory {
    pub fn when(&self, node: &NodeId, record: ChildrenUpdated) {
        self.records.lock().unwrap().insert(node.clone(), record);
    }

    pub fn calls(&self) -> Vec<NodeId> {
        self.calls.lock().unwrap().clone()
    }
}

impl StructureUpdateEventFactory for StubFactory {
    fn create_children_updated_event(
        &self,
        _document: &dyn DocumentView,
        node: &NodeId,
    ) -> Result<ChildrenUpdated> {
        self.calls.lock().unwrap().push(node.clone());
        self.records
            .lock()
            .unwrap()
            .get(node)
            .cloned()
            .ok_or_else(|| Error::collaborator("stub factory", format!("no record for {node}")))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentCall {
    NewMap(DocumentId),
    NewNode(NodeId),
}

/// Content collaborator recording the notifications it receives.
#[derive(Default)]
pub struct RecordingContent {
    calls: Mutex<Vec<ContentCall>>,
}

impl RecordingContent {
    pub fn calls(&self) -> Vec<ContentCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl ContentUpdateGenerators for RecordingContent {
    fn on_new_node(&self, _document: &dyn DocumentView, node: &NodeId) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(ContentCall::NewNode(node.clone()));
        Ok(())
    }

    fn on_new_map(&self, document: &dyn DocumentView) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(ContentCall::NewMap(document.document_id().clone()));
        Ok(())
    }
}

/// A document with two parents under the root and two detached children,
/// wired to a generator whose batches land in a channel.
pub struct TestSession {
    pub doc: MemoryDocument,
    pub parent: NodeId,
    pub child: NodeId,
    pub parent2: NodeId,
    pub child2: NodeId,
    pub factory: Arc<StubFactory>,
    pub content: Arc<RecordingContent>,
    pub updates: Arc<Updates>,
    pub generator: ChildrenUpdateGenerator,
    rx: UnboundedReceiver<UpdateBatch>,
}

impl TestSession {
    pub fn new() -> Self {
        let doc = MemoryDocument::new(MAP_ID, ROOT_NODE_ID);
        let root = doc.root();
        let parent = doc.add_node(&root, PARENT_NODE_ID).unwrap();
        let parent2 = doc.add_node(&root, PARENT_NODE_ID2).unwrap();
        let child = doc.create_node(CHILD_NODE_ID).unwrap();
        let child2 = doc.create_node(CHILD_NODE_ID2).unwrap();

        let (tx, rx) = mpsc::unbounded_channel::<UpdateBatch>();
        let updates = Arc::new(
            Updates::new(
                Arc::new(tx),
                UpdatesConfig::with_delay(DELAY),
                UpdateHeader::new(MAP_ID),
            )
            .unwrap(),
        );
        let factory = Arc::new(StubFactory::default());
        let content = Arc::new(RecordingContent::default());
        let generator =
            ChildrenUpdateGenerator::new(Arc::clone(&updates), factory.clone(), content.clone());

        Self {
            doc,
            parent,
            child,
            parent2,
            child2,
            factory,
            content,
            updates,
            generator,
            rx,
        }
    }

    pub async fn next_batch(&mut self) -> UpdateBatch {
        timeout(Duration::from_secs(5), self.rx.recv())
            .await
            .expect("batch should be flushed")
            .expect("channel open")
    }

    /// True if a batch has already been delivered.
    pub fn has_batch(&mut self) -> bool {
        !self.rx.is_empty()
    }
}

/// Stand-in for the opaque record the factory hands back for `node`.
pub fn children_updated(node: &NodeId, marker: &str) -> ChildrenUpdated {
    ChildrenUpdated {
        node_id: node.clone(),
        child_ids: vec![NodeId::from(marker)],
    }
}
