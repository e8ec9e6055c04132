//! Chunk planning: groups pages into bounded chunks aligned on occurrence
//! boundaries, then slices each chunk into fixed-size sub-batches.

use crate::segment::DecodedPage;

/// First page number after which an occurrence start may close a chunk.
pub const INITIAL_CHECKPOINT: usize = 20;
/// Pages added to the checkpoint after each cut.
pub const CHECKPOINT_INTERVAL: usize = 19;
/// Pages per extraction call.
pub const DEFAULT_SUB_BATCH_SIZE: usize = 5;

/// Contiguous page range processed as one unit.
pub type Chunk = Vec<DecodedPage>;

/// Walk the pages in order, cutting only at a true occurrence boundary once
/// the running checkpoint is passed. The checkpoint then jumps to
/// `page + CHECKPOINT_INTERVAL`, capping worst-case chunk size near the page
/// budget without ever splitting mid-occurrence.
pub fn plan_chunks(pages: Vec<DecodedPage>) -> Vec<Chunk> {
    let mut chunks: Vec<Chunk> = Vec::new();
    let mut current: Chunk = Vec::new();
    let mut checkpoint = INITIAL_CHECKPOINT;

    for page in pages {
        if page.page_number > checkpoint && page.is_occurrence_start && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            checkpoint = page.page_number + CHECKPOINT_INTERVAL;
            current.push(page);
        } else {
            current.push(page);
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Slice a chunk into windows of at most `size` pages, preserving order.
/// The last sub-batch may be shorter.
pub fn sub_batches(chunk: &[DecodedPage], size: usize) -> Vec<&[DecodedPage]> {
    chunk.chunks(size).collect()
}

/// Concatenated text of one sub-batch, the payload for an extraction call.
pub fn sub_batch_text(batch: &[DecodedPage]) -> String {
    batch
        .iter()
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}
