//! Small text helpers shared by embedding and answer selection.

use unicode_segmentation::UnicodeSegmentation;

/// Lowercase word tokens of `text`, in order.
pub fn word_tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.unicode_words().map(|word| word.to_lowercase())
}

/// The first `max_chars` characters of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}
