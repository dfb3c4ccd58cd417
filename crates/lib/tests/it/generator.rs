//! Node insertions and document resets observed as flushed batches.

use collab_updates::{
    DocumentView, MemoryDocument, NodeFlags, UpdateBatch, UpdateRecord,
    event::{RootNodeIdUpdated, SpecialNodeType, SpecialNodeTypeSet},
};
use tokio::time::sleep;

use crate::helpers::{
    CHILD_NODE_ID, CHILD_NODE_ID2, ContentCall, MAP_ID, PAUSE, TestSession, children_updated,
};

fn summary_end(node: &str) -> UpdateRecord {
    SpecialNodeTypeSet {
        node_id: node.into(),
        content: SpecialNodeType::SummaryBoundaryEnd,
    }
    .into()
}

#[tokio::test(start_paused = true)]
async fn generates_event_on_node_insertion() {
    let mut s = TestSession::new();
    let cu = children_updated(&s.parent, "cu");
    s.factory.when(&s.parent, cu.clone());

    s.generator
        .on_node_inserted(&s.doc, &s.parent, &s.child)
        .unwrap();

    let batch = s.next_batch().await;
    assert_eq!(
        batch,
        UpdateBatch {
            document_id: MAP_ID.into(),
            revision: 1,
            records: vec![cu.into()],
        }
    );
    assert_eq!(s.updates.revision(), 1);
}

#[tokio::test(start_paused = true)]
async fn generates_one_update_event_per_parent() {
    let mut s = TestSession::new();
    let cu = children_updated(&s.parent, "cu");
    s.factory.when(&s.parent, cu.clone());

    s.generator
        .on_node_inserted(&s.doc, &s.parent, &s.child)
        .unwrap();
    s.generator
        .on_node_inserted(&s.doc, &s.parent, &s.child)
        .unwrap();

    sleep(PAUSE).await;
    let batch = s.next_batch().await;
    assert_eq!(batch.records, vec![cu.into()]);
}

#[tokio::test(start_paused = true)]
async fn generates_event_on_node_insertion_after_delay() {
    let mut s = TestSession::new();
    s.factory.when(&s.parent, children_updated(&s.parent, "cu"));

    s.generator
        .on_node_inserted(&s.doc, &s.parent, &s.child)
        .unwrap();

    assert!(!s.has_batch(), "batch delivered before the quiescence delay");
    assert_eq!(s.updates.revision(), 0);
    assert_eq!(s.updates.pending_len(), 1);

    let batch = s.next_batch().await;
    assert_eq!(batch.revision, 1);
}

#[tokio::test(start_paused = true)]
async fn generates_multiple_events_on_node_insertion_to_different_parents() {
    let mut s = TestSession::new();
    let cu = children_updated(&s.parent, "cu");
    let cu2 = children_updated(&s.parent2, "cu2");
    s.factory.when(&s.parent, cu.clone());
    s.factory.when(&s.parent2, cu2.clone());

    s.generator
        .on_node_inserted(&s.doc, &s.parent, &s.child)
        .unwrap();
    s.generator
        .on_node_inserted(&s.doc, &s.parent2, &s.child2)
        .unwrap();

    let batch = s.next_batch().await;
    assert_eq!(batch.records, vec![cu.into(), cu2.into()]);
}

#[tokio::test(start_paused = true)]
async fn generates_multiple_batches_on_node_insertion_to_different_parents_with_pause() {
    let mut s = TestSession::new();
    let cu = children_updated(&s.parent, "cu");
    let cu2 = children_updated(&s.parent2, "cu2");
    s.factory.when(&s.parent, cu.clone());
    s.factory.when(&s.parent2, cu2.clone());

    s.generator
        .on_node_inserted(&s.doc, &s.parent, &s.child)
        .unwrap();
    sleep(PAUSE).await;
    s.generator
        .on_node_inserted(&s.doc, &s.parent2, &s.child2)
        .unwrap();

    let first = s.next_batch().await;
    let second = s.next_batch().await;
    assert_eq!(first.revision, 1);
    assert_eq!(first.records, vec![cu.into()]);
    assert_eq!(second.revision, 2);
    assert_eq!(second.records, vec![cu2.into()]);
}

#[tokio::test(start_paused = true)]
async fn generates_special_node_type_event_on_node_insertion() {
    let mut s = TestSession::new();
    s.doc.add_flags(&s.child, NodeFlags::SUMMARY).unwrap();
    let cu = children_updated(&s.parent, "cu");
    let cu2 = children_updated(&s.parent2, "cu2");
    s.factory.when(&s.parent, cu.clone());
    s.factory.when(&s.parent2, cu2.clone());

    s.doc.append_child(&s.parent, &s.child).unwrap();
    s.generator
        .on_node_inserted(&s.doc, &s.parent, &s.child)
        .unwrap();
    s.doc.append_child(&s.parent2, &s.child2).unwrap();
    s.generator
        .on_node_inserted(&s.doc, &s.parent2, &s.child2)
        .unwrap();

    let batch = s.next_batch().await;
    assert_eq!(
        batch.records,
        vec![cu.into(), summary_end(CHILD_NODE_ID), cu2.into()]
    );
}

#[tokio::test(start_paused = true)]
async fn generates_events_for_inserted_child_on_node_insertion() {
    let mut s = TestSession::new();
    s.doc.append_child(&s.child, &s.child2).unwrap();
    let cu = children_updated(&s.parent, "cu");
    let cu2 = children_updated(&s.child, "cu2");
    s.factory.when(&s.parent, cu.clone());
    s.factory.when(&s.child, cu2.clone());

    s.doc.append_child(&s.parent, &s.child).unwrap();
    s.generator
        .on_node_inserted(&s.doc, &s.parent, &s.child)
        .unwrap();

    let batch = s.next_batch().await;
    assert_eq!(
        batch,
        UpdateBatch {
            document_id: MAP_ID.into(),
            revision: 1,
            records: vec![cu.into(), cu2.into()],
        }
    );
    assert_eq!(s.updates.revision(), 1);
    assert_eq!(s.factory.calls(), vec![s.parent.clone(), s.child.clone()]);
}

#[tokio::test(start_paused = true)]
async fn generates_content_events_for_inserted_child_on_node_insertion() {
    let mut s = TestSession::new();
    s.doc.append_child(&s.child, &s.child2).unwrap();
    s.factory.when(&s.parent, children_updated(&s.parent, "cu"));
    s.factory.when(&s.child, children_updated(&s.child, "cu2"));

    s.doc.append_child(&s.parent, &s.child).unwrap();
    s.generator
        .on_node_inserted(&s.doc, &s.parent, &s.child)
        .unwrap();
    s.next_batch().await;

    assert_eq!(
        s.content.calls(),
        vec![
            ContentCall::NewNode(s.child.clone()),
            ContentCall::NewNode(s.child2.clone()),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn generates_special_type_events_for_inserted_child_on_node_insertion() {
    let mut s = TestSession::new();
    s.doc.append_child(&s.child, &s.child2).unwrap();
    s.doc.add_flags(&s.child2, NodeFlags::SUMMARY).unwrap();
    let cu = children_updated(&s.parent, "cu");
    let cu2 = children_updated(&s.child, "cu2");
    s.factory.when(&s.parent, cu.clone());
    s.factory.when(&s.child, cu2.clone());

    s.doc.append_child(&s.parent, &s.child).unwrap();
    s.generator
        .on_node_inserted(&s.doc, &s.parent, &s.child)
        .unwrap();

    let batch = s.next_batch().await;
    assert_eq!(
        batch.records,
        vec![cu.into(), cu2.into(), summary_end(CHILD_NODE_ID2)]
    );
}

#[tokio::test(start_paused = true)]
async fn generates_event_on_new_map() {
    let mut s = TestSession::new();
    let map = MemoryDocument::new(MAP_ID, s.parent.clone());
    map.add_node(&s.parent, "newChild").unwrap();
    let cu = children_updated(&s.parent, "cu");
    s.factory.when(&s.parent, cu.clone());

    s.generator.on_new_map(&map).unwrap();

    let batch = s.next_batch().await;
    assert_eq!(
        batch,
        UpdateBatch {
            document_id: MAP_ID.into(),
            revision: 1,
            records: vec![
                RootNodeIdUpdated {
                    node_id: s.parent.clone(),
                }
                .into(),
                cu.into(),
            ],
        }
    );
}

#[tokio::test(start_paused = true)]
async fn generates_content_events_on_new_map() {
    let mut s = TestSession::new();
    let map = MemoryDocument::new(MAP_ID, s.parent.clone());
    let child = map.add_node(&s.parent, "newChild").unwrap();
    s.factory.when(&s.parent, children_updated(&s.parent, "cu"));

    s.generator.on_new_map(&map).unwrap();
    s.next_batch().await;

    assert_eq!(
        s.content.calls(),
        vec![
            ContentCall::NewMap(map.document_id().clone()),
            ContentCall::NewNode(s.parent.clone()),
            ContentCall::NewNode(child),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn new_map_with_leaf_root_emits_only_root_record() {
    let mut s = TestSession::new();
    let map = MemoryDocument::new(MAP_ID, "lonelyRoot");

    s.generator.on_new_map(&map).unwrap();

    let batch = s.next_batch().await;
    assert_eq!(
        batch.records,
        vec![
            RootNodeIdUpdated {
                node_id: "lonelyRoot".into(),
            }
            .into()
        ]
    );
    assert!(s.factory.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn factory_failure_propagates_to_caller() {
    let mut s = TestSession::new();
    s.factory.when(&s.parent, children_updated(&s.parent, "cu"));
    // child has a subtree but the factory has no record for it
    s.doc.append_child(&s.child, &s.child2).unwrap();
    s.doc.append_child(&s.parent, &s.child).unwrap();

    let err = s
        .generator
        .on_node_inserted(&s.doc, &s.parent, &s.child)
        .unwrap_err();
    assert!(err.is_collaborator_error());

    let batch = s.next_batch().await;
    assert_eq!(batch.records.len(), 1, "parent record stays pending");
}
