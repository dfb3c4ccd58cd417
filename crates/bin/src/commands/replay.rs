//! Replay command - applies an edit script and prints every flushed batch.

use std::sync::Arc;
use std::time::Duration;

use collab_updates::{
    ChildrenUpdateGenerator, DocumentView, MemoryDocument, UpdateBatch, UpdateHeader, Updates,
    UpdatesConfig, UpdatesConsumer,
    generator::{ChildrenListFactory, NodeContentUpdates},
};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::cli::ReplayArgs;
use crate::output::render_batch;
use crate::script::{Script, ScriptResult, Step, attach_children, build_detached, decorate, parse_flags};

/// Run the replay command
pub async fn run(args: &ReplayArgs) -> ScriptResult<()> {
    let script = Script::load(&args.script)?;
    let config = UpdatesConfig::with_delay(Duration::from_millis(args.delay_ms));
    let format = args.format;

    let (tx, mut rx) = mpsc::unbounded_channel::<UpdateBatch>();
    let printer = tokio::spawn(async move {
        while let Some(batch) = rx.recv().await {
            println!("{}", render_batch(&batch, format)?);
        }
        collab_updates::Result::Ok(())
    });

    replay(&script, Arc::new(tx), config, args.start_revision).await?;

    // The channel closes once the last batch has been handed over.
    printer.await??;
    Ok(())
}

/// Apply `script` step by step, translating every insertion into records.
///
/// Returns once the script is exhausted. Records still pending at that point
/// are flushed as a final batch while the session shuts down.
pub async fn replay(
    script: &Script,
    consumer: Arc<dyn UpdatesConsumer>,
    config: UpdatesConfig,
    start_revision: u64,
) -> ScriptResult<()> {
    let header = UpdateHeader::new(script.document_id.as_str()).with_revision(start_revision);
    let updates = Arc::new(Updates::new(consumer, config, header)?);
    let generator = ChildrenUpdateGenerator::new(
        Arc::clone(&updates),
        Arc::new(ChildrenListFactory),
        Arc::new(NodeContentUpdates::new(Arc::clone(&updates))),
    );
    drop(updates);

    let mut doc = MemoryDocument::new(script.document_id.as_str(), script.root.clone());
    info!(
        document = %doc.document_id(),
        steps = script.steps.len(),
        "Replaying edit script"
    );

    for (index, step) in script.steps.iter().enumerate() {
        debug!(index, ?step, "Applying step");
        match step {
            Step::AddNode {
                parent,
                node,
                flags,
                content,
            } => {
                let node = doc.add_node(parent, node.clone())?;
                decorate(&doc, &node, flags, content.as_ref())?;
                generator.on_node_inserted(&doc, parent, &node)?;
            }
            Step::AddSubtree { parent, subtree } => {
                let top = build_detached(&doc, subtree)?;
                doc.append_child(parent, &top)?;
                generator.on_node_inserted(&doc, parent, &top)?;
            }
            Step::Flags { node, flags } => doc.set_flags(node, parse_flags(flags)?)?,
            Step::Content { node, content } => doc.set_content(node, content.clone())?,
            Step::Pause { millis } => tokio::time::sleep(Duration::from_millis(*millis)).await,
            Step::NewMap { root, children } => {
                let map = MemoryDocument::new(script.document_id.as_str(), root.clone());
                attach_children(&map, root, children)?;
                doc = map;
                generator.on_new_map(&doc)?;
            }
        }
    }

    info!(revision = generator.updates().revision(), "Edit script finished");
    Ok(())
}
