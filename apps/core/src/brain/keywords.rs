//! Keyword extraction for knowledge search.
//!
//! Content words are ranked by how often they occur in the message, scaled by a fixed
//! weight for service vocabulary.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::lexicon::tokenize;

const STOPWORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "nor", "for", "yet", "so", "i", "you", "he", "she", "it",
    "we", "they", "me", "him", "her", "us", "them", "my", "your", "his", "its", "our", "their",
    "mine", "yours", "this", "that", "these", "those", "who", "whom", "which", "what", "whose",
    "is", "am", "are", "was", "were", "be", "been", "being", "have", "has", "had", "do", "does",
    "did", "will", "would", "shall", "should", "can", "could", "may", "might", "must", "in", "on",
    "at", "to", "from", "by", "with", "about", "into", "through", "during", "before", "after",
    "up", "down", "out", "off", "over", "under", "again", "here", "there", "where", "when", "why",
    "how", "all", "each", "every", "some", "any", "no", "not", "only", "own", "same", "than",
    "too", "very", "just", "also", "now", "then", "once", "if", "because", "as", "until", "while",
    "please", "hello", "thanks", "thank", "need", "want", "get", "know", "tell", "help", "i'm",
    "can't", "don't", "it's", "what's",
];

/// Fixed weights for service vocabulary. Other words are weighted by shape.
const TERM_WEIGHTS: &[(&[&str], f32)] = &[
    (
        &[
            "pension", "contribution", "contributions", "compensation", "rehabilitation",
            "disablement", "dependants", "funeral", "certificate", "registration",
        ],
        2.5,
    ),
    (
        &[
            "claim", "payment", "employer", "injury", "accident", "portal", "password",
            "document", "form", "medical", "benefit",
        ],
        2.0,
    ),
    (&["check", "submit", "register", "update", "pay", "report", "find"], 1.2),
];

const MIN_KEYWORD_CHARS: usize = 3;
const DEFAULT_LIMIT: usize = 10;

/// One ranked keyword.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordResult {
    pub keyword: String,
    /// Share of the message's content words, times the term weight
    pub score: f32,
    pub frequency: usize,
}

/// Ranks the content words of a message by frequency and term weight.
#[derive(Debug, Clone)]
pub struct KeywordExtractor {
    min_chars: usize,
    default_limit: usize,
}

impl Default for KeywordExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Weight of a word outside the service vocabulary: longer words and hyphenated
/// references rank higher.
fn shape_weight(word: &str) -> f32 {
    let length = (word.chars().count() as f32 / 6.0).min(1.5);
    let reference = if word.contains('-') { 0.5 } else { 0.0 };
    1.0 + length + reference
}

fn term_weight(word: &str) -> f32 {
    TERM_WEIGHTS
        .iter()
        .find(|(terms, _)| terms.contains(&word))
        .map(|(_, weight)| *weight)
        .unwrap_or_else(|| shape_weight(word))
}

impl KeywordExtractor {
    pub fn new() -> Self {
        Self {
            min_chars: MIN_KEYWORD_CHARS,
            default_limit: DEFAULT_LIMIT,
        }
    }

    fn is_content_word(&self, word: &str) -> bool {
        word.chars().count() >= self.min_chars
            && !STOPWORDS.contains(&word)
            && !word.chars().all(char::is_numeric)
    }

    /// Top keywords, best first. Ties are broken alphabetically.
    pub fn extract(&self, text: &str, limit: Option<usize>) -> Vec<KeywordResult> {
        let words: Vec<String> = tokenize(text)
            .into_iter()
            .filter(|w| self.is_content_word(w))
            .collect();
        if words.is_empty() {
            return vec![];
        }

        let mut frequencies: HashMap<&str, usize> = HashMap::new();
        for word in &words {
            *frequencies.entry(word.as_str()).or_default() += 1;
        }

        let total = words.len() as f32;
        let mut ranked: Vec<KeywordResult> = frequencies
            .into_iter()
            .map(|(word, frequency)| KeywordResult {
                keyword: word.to_string(),
                score: frequency as f32 / total * term_weight(word),
                frequency,
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.keyword.cmp(&b.keyword))
        });
        ranked.truncate(limit.unwrap_or(self.default_limit));
        ranked
    }

    /// Like [`extract`](Self::extract), keywords only.
    pub fn extract_keywords(&self, text: &str, limit: Option<usize>) -> Vec<String> {
        self.extract(text, limit).into_iter().map(|k| k.keyword).collect()
    }
}
