//! Text chunking with configurable size and overlap.
//!
//! Sizes are counted in Unicode scalar values (`char`s), never bytes, so a
//! window never splits a multi-byte character.

/// A chunk window cut from a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkWindow {
    /// Trimmed window text
    pub text: String,

    /// Character range of the untrimmed window
    pub char_range: (usize, usize),
}

/// Split `text` into trimmed, overlapping windows of `chunk_size` characters.
///
/// Adjacent windows share `overlap` characters. `overlap < chunk_size` is a
/// precondition checked when configuration is validated; if it does not hold
/// the windows are laid out without overlap.
pub fn split(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    chunk_document(text, chunk_size, overlap)
        .into_iter()
        .map(|window| window.text)
        .collect()
}

/// Split `text` into windows, keeping each window's character range.
pub fn chunk_document(text: &str, chunk_size: usize, overlap: usize) -> Vec<ChunkWindow> {
    if chunk_size == 0 || text.trim().is_empty() {
        return vec![];
    }

    // Byte offset of every char boundary, including the end of the text
    let boundaries: Vec<usize> = text
        .char_indices()
        .map(|(byte_idx, _)| byte_idx)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_count = boundaries.len() - 1;

    let step = if chunk_size > overlap {
        chunk_size - overlap
    } else {
        chunk_size
    };

    let mut windows = Vec::new();
    let mut start = 0;

    loop {
        let end = (start + chunk_size).min(char_count);
        let window = text[boundaries[start]..boundaries[end]].trim();

        if !window.is_empty() {
            windows.push(ChunkWindow {
                text: window.to_string(),
                char_range: (start, end),
            });
        }

        if end == char_count {
            break;
        }
        start += step;
    }

    tracing::debug!(
        "Chunked {} chars into {} chunks (size: {}, overlap: {})",
        char_count,
        windows.len(),
        chunk_size,
        overlap
    );

    windows
}
