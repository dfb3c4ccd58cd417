//! Output formatting helpers for human-readable and JSON output.

use collab_updates::{UpdateBatch, UpdateRecord};

use crate::cli::Format;

/// Render a batch in the selected format, without a trailing newline.
pub fn render_batch(batch: &UpdateBatch, format: Format) -> collab_updates::Result<String> {
    match format {
        Format::Json => batch.to_json(),
        Format::Human => {
            let rows: Vec<Vec<String>> = batch.records.iter().map(record_row).collect();
            let mut out = format!(
                "revision {} of {} ({} records)",
                batch.revision,
                batch.document_id,
                batch.len()
            );
            for line in table_lines(&["TYPE", "NODE", "DETAIL"], &rows) {
                out.push('\n');
                out.push_str(&line);
            }
            Ok(out)
        }
    }
}

fn record_row(record: &UpdateRecord) -> Vec<String> {
    let detail = match record {
        UpdateRecord::ChildrenUpdated(r) => r
            .child_ids
            .iter()
            .map(|id| id.as_str())
            .collect::<Vec<_>>()
            .join(","),
        UpdateRecord::RootNodeIdUpdated(_) => String::new(),
        UpdateRecord::SpecialNodeTypeSet(r) => r.content.as_str().to_string(),
        UpdateRecord::ContentUpdated(r) => r.content.to_string(),
    };
    vec![
        record.kind().to_string(),
        record.node_id().to_string(),
        detail,
    ]
}

/// Lay out a table with aligned columns.
///
/// `headers` and each row in `rows` must have the same length.
fn table_lines(headers: &[&str], rows: &[Vec<String>]) -> Vec<String> {
    if rows.is_empty() {
        return Vec::new();
    }

    let col_count = headers.len();
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(col_count) {
            widths[i] = widths[i].max(cell.len());
        }
    }

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(align(headers.iter().copied(), &widths));
    for row in rows {
        lines.push(align(row.iter().map(String::as_str), &widths));
    }
    lines
}

fn align<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    cells
        .zip(widths.iter().copied())
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}
