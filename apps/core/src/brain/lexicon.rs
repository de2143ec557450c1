//! Tokenization and immutable keyword/phrase lexicons.
//!
//! Every analysis stage matches against `Lexicon` tables built at compile time and
//! shared by reference. Phrases are matched as consecutive token sequences so that
//! "my claim" never matches inside "mycl aim" and punctuation does not break a match.

/// Splits text into lowercase word tokens.
///
/// Hyphens and apostrophes are kept inside words ("wc-2024-001234", "can't"),
/// typographic apostrophes are folded to `'`.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .replace(['\u{2019}', '\u{2018}'], "'")
        .split(|c: char| !c.is_alphanumeric() && c != '-' && c != '\'')
        .map(|w| w.trim_matches(|c: char| c == '-' || c == '\''))
        .filter(|w| !w.is_empty())
        .map(|w| w.to_string())
        .collect()
}

/// Start positions of every occurrence of `phrase` in `tokens`.
pub fn phrase_positions(tokens: &[String], phrase: &str) -> Vec<usize> {
    phrase_matches(tokens, phrase, &[])
        .into_iter()
        .map(|(start, _)| start)
        .collect()
}

/// Every occurrence of `phrase` as `(start, skipped)`, where `filler` tokens may sit
/// between the phrase's words and `skipped` counts them. A phrase word always takes
/// precedence over skipping.
pub fn phrase_matches(tokens: &[String], phrase: &str, filler: &[&str]) -> Vec<(usize, usize)> {
    let parts: Vec<&str> = phrase.split_whitespace().collect();
    let Some((first, rest)) = parts.split_first() else {
        return vec![];
    };

    let mut matches = Vec::new();
    for start in (0..tokens.len()).filter(|&i| tokens[i] == *first) {
        let mut next = start + 1;
        let mut skipped = 0;
        let complete = rest.iter().all(|part| {
            while next < tokens.len()
                && tokens[next] != *part
                && filler.contains(&tokens[next].as_str())
            {
                next += 1;
                skipped += 1;
            }
            if next < tokens.len() && tokens[next] == *part {
                next += 1;
                true
            } else {
                false
            }
        });
        if complete {
            matches.push((start, skipped));
        }
    }
    matches
}

/// Returns true if `phrase` occurs in `tokens`.
pub fn contains_phrase(tokens: &[String], phrase: &str) -> bool {
    !phrase_positions(tokens, phrase).is_empty()
}

/// A single lexicon hit.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    /// Token index where the match starts
    pub position: usize,
    /// The lexicon entry that matched
    pub term: &'static str,
    /// Whether the entry is a multi-word phrase
    pub is_phrase: bool,
    /// Filler tokens skipped inside a phrase match
    pub skipped: usize,
}

/// Keyword and phrase lists for one category.
#[derive(Debug, Clone, Copy)]
pub struct Lexicon {
    pub keywords: &'static [&'static str],
    pub phrases: &'static [&'static str],
}

impl Lexicon {
    pub const fn new(keywords: &'static [&'static str], phrases: &'static [&'static str]) -> Self {
        Self { keywords, phrases }
    }

    /// All keyword and phrase hits, phrases first.
    pub fn hits(&self, tokens: &[String]) -> Vec<Hit> {
        self.hits_with_filler(tokens, &[])
    }

    /// Like [`hits`](Self::hits), but phrases still match with `filler` tokens between
    /// their words.
    pub fn hits_with_filler(&self, tokens: &[String], filler: &[&str]) -> Vec<Hit> {
        let mut hits = Vec::new();
        for phrase in self.phrases {
            for (position, skipped) in phrase_matches(tokens, phrase, filler) {
                hits.push(Hit {
                    position,
                    term: *phrase,
                    is_phrase: true,
                    skipped,
                });
            }
        }
        for (position, token) in tokens.iter().enumerate() {
            if let Some(keyword) = self.keywords.iter().find(|k| **k == token.as_str()) {
                hits.push(Hit {
                    position,
                    term: *keyword,
                    is_phrase: false,
                    skipped: 0,
                });
            }
        }
        hits
    }

    /// Number of distinct entries that matched at least once.
    pub fn distinct_matches(&self, tokens: &[String]) -> usize {
        let phrases = self
            .phrases
            .iter()
            .filter(|p| contains_phrase(tokens, p))
            .count();
        let keywords = self
            .keywords
            .iter()
            .filter(|k| tokens.iter().any(|t| t.as_str() == **k))
            .count();
        phrases + keywords
    }

    pub fn matches_any(&self, tokens: &[String]) -> bool {
        self.distinct_matches(tokens) > 0
    }
}
