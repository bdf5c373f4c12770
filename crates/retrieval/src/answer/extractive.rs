//! Extractive answers: verbatim sentences picked by word overlap.

use super::{AnswerStrategy, NO_CONTENT_MESSAGE};
use crate::text::{truncate_chars, word_tokens};
use async_trait::async_trait;
use std::collections::HashSet;

/// Number of sentences in an extractive answer.
const TOP_SENTENCES: usize = 3;

/// Upper bound of the fallback excerpt, marker included.
const FALLBACK_EXCERPT_CHARS: usize = 500;

const ELLIPSIS: &str = "...";

/// Selects the context sentences sharing the most words with the question.
#[derive(Debug, Clone)]
pub struct ExtractiveStrategy {
    max_context_chars: usize,
}

impl ExtractiveStrategy {
    pub fn new(max_context_chars: usize) -> Self {
        Self { max_context_chars }
    }
}

#[async_trait]
impl AnswerStrategy for ExtractiveStrategy {
    fn name(&self) -> &'static str {
        "extractive"
    }

    async fn answer(&self, question: &str, context: &str) -> String {
        extract_answer(question, context, self.max_context_chars)
    }
}

/// Build an extractive answer.
///
/// Sentences are scored by how many distinct question words (longer than two
/// characters) they contain. The top three scoring sentences are joined in
/// score order; when no sentence shares a word with the question, the
/// leading excerpt of the context is returned instead.
pub fn extract_answer(question: &str, context: &str, max_context_chars: usize) -> String {
    if context.trim().is_empty() {
        return NO_CONTENT_MESSAGE.to_string();
    }

    let context = truncate_chars(context, max_context_chars);

    let question_words: HashSet<String> = word_tokens(question)
        .filter(|word| word.chars().count() > 2)
        .collect();

    let mut scored: Vec<(usize, &str)> = split_sentences(context)
        .into_iter()
        .map(|sentence| {
            let words: HashSet<String> = word_tokens(sentence).collect();
            (question_words.intersection(&words).count(), sentence)
        })
        .filter(|(score, _)| *score > 0)
        .collect();

    if scored.is_empty() {
        tracing::debug!("No sentence overlaps the question, using leading excerpt");
        return leading_excerpt(context);
    }

    // Stable: equal scores keep document order
    scored.sort_by(|a, b| b.0.cmp(&a.0));

    scored
        .into_iter()
        .take(TOP_SENTENCES)
        .map(|(_, sentence)| sentence)
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

/// Split at `.`, `!` or `?` followed by whitespace.
///
/// Abbreviations and decimals followed by a space also end a sentence.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((_, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        if let Some(&(next_idx, next)) = chars.peek() {
            if next.is_whitespace() {
                sentences.push(&text[start..next_idx]);
                start = next_idx;
            }
        }
    }
    sentences.push(&text[start..]);

    sentences
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// The start of `text`, at most 500 characters including the trailing marker.
///
/// A cut text ends at the last whitespace before the limit.
fn leading_excerpt(text: &str) -> String {
    let text = text.trim();
    if text.chars().count() <= FALLBACK_EXCERPT_CHARS {
        return text.to_string();
    }

    let head = truncate_chars(text, FALLBACK_EXCERPT_CHARS - ELLIPSIS.len());
    let cut = match head.rfind(char::is_whitespace) {
        Some(idx) if idx > 0 => &head[..idx],
        _ => head,
    };

    format!("{}{}", cut.trim_end(), ELLIPSIS)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAT_AND_DOG: &str = "The cat sat on the mat. The dog ran in the park.";

    #[test]
    fn test_best_sentence_first() {
        let answer = extract_answer("Where did the cat sit?", CAT_AND_DOG, 3000);

        assert!(answer.starts_with("The cat sat on the mat."));
    }

    #[test]
    fn test_top_three_in_score_order() {
        let context = "Rust is fast. Cargo builds Rust crates. Rust crates use Cargo and rustc. \
                       Bread is tasty. Cargo ships.";
        let answer = extract_answer("How does cargo build rust crates?", context, 3000);

        assert_eq!(
            answer,
            "Cargo builds Rust crates. Rust crates use Cargo and rustc. Rust is fast."
        );
    }

    #[test]
    fn test_empty_context() {
        assert_eq!(extract_answer("anything here", "   ", 3000), NO_CONTENT_MESSAGE);
        assert_eq!(extract_answer("anything here", "", 3000), NO_CONTENT_MESSAGE);
    }

    #[test]
    fn test_context_truncated_before_scoring() {
        // "zebra" only appears after the limit
        let context = format!("{} The zebra grazed.", "a".repeat(40));
        let answer = extract_answer("What did the zebra do?", &context, 40);

        assert_eq!(answer, "a".repeat(40));
    }

    #[test]
    fn test_fallback_short_context_is_returned_whole() {
        let answer = extract_answer("Quantum entanglement?", CAT_AND_DOG, 3000);
        assert_eq!(answer, CAT_AND_DOG);
    }

    #[test]
    fn test_fallback_excerpt_cut_at_word_boundary() {
        let context = "lorem ipsum dolor sit amet ".repeat(40);
        let answer = extract_answer("Quantum entanglement?", &context, 3000);

        assert!(answer.chars().count() <= 500);
        assert!(answer.ends_with("..."));
        let body = answer.trim_end_matches("...");
        assert!(context.starts_with(body));
        assert!(!body.ends_with(' '));
        // the word before the marker is complete
        let last_word = body.rsplit(' ').next().unwrap();
        assert!(["lorem", "ipsum", "dolor", "sit", "amet"].contains(&last_word));
    }

    #[test]
    fn test_fallback_without_whitespace() {
        let context = "x".repeat(800);
        let answer = extract_answer("Quantum entanglement?", &context, 3000);

        assert_eq!(answer.chars().count(), 500);
        assert!(answer.ends_with("..."));
    }

    #[test]
    fn test_deterministic() {
        let context = "One fish. Two fish! Red fish? Blue fish.";
        let first = extract_answer("Which fish are red?", context, 3000);
        let second = extract_answer("Which fish are red?", context, 3000);

        assert_eq!(first, second);
        assert_eq!(first, "Red fish? One fish. Two fish!");
    }

    #[test]
    fn test_split_sentences() {
        assert_eq!(
            split_sentences("Hi there. How are you?  Fine!\nBye"),
            vec!["Hi there.", "How are you?", "Fine!", "Bye"]
        );
        // known limitation
        assert_eq!(
            split_sentences("Pi is approx. 3.14 today."),
            vec!["Pi is approx.", "3.14 today."]
        );
    }

    #[tokio::test]
    async fn test_strategy_uses_context_limit() {
        let strategy = ExtractiveStrategy::new(23);
        let answer = strategy.answer("Where did the cat sit?", CAT_AND_DOG).await;

        assert_eq!(answer, "The cat sat on the mat.");
    }
}
