//! Fixed-size overlapping text splitter.
//!
//! Splits page-scoped text into [`DocumentChunk`]s of a target size
//! (default 2000 characters) with a fixed overlap (default 500). The
//! overlap exists so that semantic boundaries cut by a window edge are
//! still fully present in an adjacent chunk.
//!
//! Chunk indices are assigned here, at split time, across the whole
//! document in page order. They are the chunk's permanent identity
//! (`{document_id}-{index}`): a chunk later dropped because its embedding
//! failed leaves a hole in the id sequence rather than renumbering its
//! successors, which keeps the `{document_id}-0` existence probe and any
//! previously upserted ids stable.
//!
//! Windows advance by `chunk_chars - overlap_chars` characters and never
//! split inside a UTF-8 code point. Pages are split independently, so a
//! chunk always carries a single source page number.

use crate::config::ChunkingConfig;
use crate::models::{DocumentChunk, Page};

/// Split parsed pages into overlapping chunks with provenance metadata.
pub fn split_pages(
    document_id: &str,
    file_name: &str,
    pages: &[Page],
    config: &ChunkingConfig,
) -> Vec<DocumentChunk> {
    let chunk_chars = config.chunk_chars.max(1);
    let step = chunk_chars.saturating_sub(config.overlap_chars).max(1);

    let mut chunks = Vec::new();
    let mut index = 0usize;

    for page in pages {
        // Byte offset of every char boundary, plus the end of the string,
        // so windows can be measured in chars but sliced by byte range.
        let boundaries: Vec<usize> = page
            .text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(page.text.len()))
            .collect();
        let total_chars = boundaries.len() - 1;

        let mut start = 0usize;
        while start < total_chars {
            let end = (start + chunk_chars).min(total_chars);
            let text = &page.text[boundaries[start]..boundaries[end]];

            if !text.trim().is_empty() {
                chunks.push(DocumentChunk {
                    document_id: document_id.to_string(),
                    file_name: file_name.to_string(),
                    index,
                    text: text.to_string(),
                    page_number: page.page_number,
                });
                index += 1;
            }

            if end == total_chars {
                break;
            }
            start += step;
        }
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(chunk_chars: usize, overlap_chars: usize) -> ChunkingConfig {
        ChunkingConfig {
            chunk_chars,
            overlap_chars,
        }
    }

    fn page(text: &str, page_number: u32) -> Page {
        Page {
            text: text.to_string(),
            page_number,
        }
    }

    #[test]
    fn short_page_is_single_chunk() {
        let chunks = split_pages("doc1", "a.txt", &[page("hello world", 1)], &config(2000, 500));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].index, 0);
        assert_eq!(chunks[0].text, "hello world");
        assert_eq!(chunks[0].vector_id(), "doc1-0");
    }

    #[test]
    fn windows_overlap_by_configured_amount() {
        let text: String = (0..25).map(|i| (b'a' + (i % 26) as u8) as char).collect();
        let chunks = split_pages("d", "a.txt", &[page(&text, 1)], &config(10, 4));

        // step = 6: windows start at 0, 6, 12, 18. The window at 18 already
        // reaches the end of the text, so no fully-redundant trailing window
        // follows it.
        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks[0].text, &text[0..10]);
        assert_eq!(chunks[1].text, &text[6..16]);
        // Each window repeats the last 4 chars of its predecessor.
        assert_eq!(&chunks[0].text[6..], &chunks[1].text[..4]);
        assert_eq!(chunks[3].text, &text[18..25]);
    }

    #[test]
    fn indices_are_contiguous_across_pages() {
        let long: String = "x".repeat(30);
        let pages = [page(&long, 1), page("tail", 2)];
        let chunks = split_pages("d", "a.txt", &pages, &config(20, 5));

        let indices: Vec<usize> = chunks.iter().map(|c| c.index).collect();
        assert_eq!(indices, (0..chunks.len()).collect::<Vec<_>>());
        assert_eq!(chunks.last().unwrap().page_number, 2);
        assert_eq!(chunks[0].page_number, 1);
    }

    #[test]
    fn multibyte_text_never_splits_a_char() {
        // 3-byte chars; any byte-based slicing would panic.
        let text: String = "あ".repeat(50);
        let chunks = split_pages("d", "a.txt", &[page(&text, 1)], &config(16, 4));
        assert!(!chunks.is_empty());
        for c in &chunks {
            assert!(c.text.chars().count() <= 16);
        }
        let rebuilt: String = chunks[0].text.chars().collect();
        assert_eq!(rebuilt, "あ".repeat(16));
    }

    #[test]
    fn whitespace_only_page_yields_no_chunks() {
        let chunks = split_pages("d", "a.txt", &[page("   \n\n  ", 1)], &config(2000, 500));
        assert!(chunks.is_empty());
    }

    #[test]
    fn metadata_is_attached_to_every_chunk() {
        let text = "y".repeat(45);
        let chunks = split_pages("doc9", "report.pdf", &[page(&text, 3)], &config(20, 5));
        for c in &chunks {
            assert_eq!(c.document_id, "doc9");
            assert_eq!(c.file_name, "report.pdf");
            assert_eq!(c.page_number, 3);
        }
    }
}
