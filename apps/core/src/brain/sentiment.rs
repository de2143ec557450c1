//! Emotional tone detection.
//!
//! Keyword and phrase scoring per emotion category, with intensifier words boosting
//! the match that follows them. Derived from the current message only.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::lexicon::{tokenize, Hit, Lexicon};

/// Emotion categories, in tie-break order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Emotion {
    Frustrated,
    Urgent,
    Confused,
    Worried,
    Satisfied,
    Neutral,
}

impl Emotion {
    pub fn label(&self) -> &'static str {
        match self {
            Emotion::Frustrated => "frustrated",
            Emotion::Urgent => "urgent",
            Emotion::Confused => "confused",
            Emotion::Worried => "worried",
            Emotion::Satisfied => "satisfied",
            Emotion::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    Low,
    Medium,
    High,
}

impl Intensity {
    fn from_score(score: f32) -> Self {
        if score >= HIGH_INTENSITY {
            Intensity::High
        } else if score >= MEDIUM_INTENSITY {
            Intensity::Medium
        } else {
            Intensity::Low
        }
    }
}

/// Result of sentiment analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentResult {
    pub primary_emotion: Emotion,
    pub intensity: Intensity,
    /// Every matched emotion with its score, highest first
    pub all_emotions: Vec<(Emotion, f32)>,
    pub requires_empathy: bool,
    pub requires_urgency: bool,
}

impl SentimentResult {
    /// The result for a message with no emotional signal.
    pub fn neutral() -> Self {
        Self {
            primary_emotion: Emotion::Neutral,
            intensity: Intensity::Low,
            all_emotions: vec![(Emotion::Neutral, NEUTRAL_DEFAULT_SCORE)],
            requires_empathy: false,
            requires_urgency: false,
        }
    }

    /// Score of one emotion, 0.0 when it did not match.
    pub fn score_of(&self, emotion: Emotion) -> f32 {
        self.all_emotions
            .iter()
            .find(|(e, _)| *e == emotion)
            .map(|(_, s)| *s)
            .unwrap_or(0.0)
    }
}

const KEYWORD_SCORE: f32 = 1.0;
const PHRASE_SCORE: f32 = 1.5;
const INTENSIFIER_MULTIPLIER: f32 = 1.5;
/// How many tokens before a match an intensifier may sit.
const INTENSIFIER_REACH: usize = 2;
const HIGH_INTENSITY: f32 = 2.0;
const MEDIUM_INTENSITY: f32 = 1.0;
const NEUTRAL_DEFAULT_SCORE: f32 = 0.5;

const INTENSIFIERS: &[&str] = &[
    "very", "extremely", "really", "so", "totally", "absolutely", "completely", "super",
    "incredibly", "seriously",
];

static EMOTION_LEXICONS: &[(Emotion, Lexicon)] = &[
    (
        Emotion::Frustrated,
        Lexicon::new(
            &[
                "ridiculous", "frustrated", "frustrating", "annoyed", "annoying", "angry",
                "unacceptable", "useless", "terrible", "awful", "fed", "sick", "tired",
                "disappointed", "hopeless", "pathetic", "waste",
            ],
            &[
                "nobody is helping", "no one is helping", "not helping", "fed up",
                "sick of", "tired of", "still waiting", "waste of time", "over and over",
                "no response", "again and again",
            ],
        ),
    ),
    (
        Emotion::Urgent,
        Lexicon::new(
            &["urgent", "urgently", "emergency", "asap", "immediately", "now", "quickly", "critical"],
            &["right now", "as soon as possible", "can't wait", "cannot wait", "running out of time", "today please"],
        ),
    ),
    (
        Emotion::Confused,
        Lexicon::new(
            &["confused", "confusing", "unclear", "understand", "lost", "puzzled"],
            &["don't understand", "do not understand", "not sure how", "what does", "makes no sense", "doesn't make sense"],
        ),
    ),
    (
        Emotion::Worried,
        Lexicon::new(
            &["worried", "anxious", "scared", "afraid", "concerned", "nervous", "stress", "stressed"],
            &["what if", "will i lose", "can't afford", "how will i", "am i going to"],
        ),
    ),
    (
        Emotion::Satisfied,
        Lexicon::new(
            &["thanks", "thank", "great", "perfect", "excellent", "helpful", "appreciate", "wonderful", "awesome"],
            &["thank you", "that helps", "much appreciated", "very helpful", "good job"],
        ),
    ),
    (
        Emotion::Neutral,
        Lexicon::new(&["okay", "ok", "fine", "alright"], &["just wondering", "quick question"]),
    ),
];

/// Heuristic sentiment analyzer
pub struct SentimentAnalyzer {
    lexicons: &'static [(Emotion, Lexicon)],
}

impl Default for SentimentAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl SentimentAnalyzer {
    pub fn new() -> Self {
        Self {
            lexicons: EMOTION_LEXICONS,
        }
    }

    /// An intensifier just before the match, or inside a phrase match.
    fn intensified(tokens: &[String], hit: &Hit) -> bool {
        let start = hit.position.saturating_sub(INTENSIFIER_REACH);
        hit.skipped > 0
            || tokens[start..hit.position]
                .iter()
                .any(|t| INTENSIFIERS.contains(&t.as_str()))
    }

    fn score(&self, tokens: &[String], lexicon: &Lexicon) -> f32 {
        lexicon
            .hits_with_filler(tokens, INTENSIFIERS)
            .iter()
            .map(|hit| {
                let base = if hit.is_phrase { PHRASE_SCORE } else { KEYWORD_SCORE };
                if Self::intensified(tokens, hit) {
                    base * INTENSIFIER_MULTIPLIER
                } else {
                    base
                }
            })
            .sum()
    }

    /// Analyze the emotional tone of a message
    pub fn analyze(&self, message: &str) -> SentimentResult {
        let tokens = tokenize(message);

        let mut scored: Vec<(Emotion, f32)> = self
            .lexicons
            .iter()
            .map(|(emotion, lexicon)| (*emotion, self.score(&tokens, lexicon)))
            .filter(|(_, score)| *score > 0.0)
            .collect();

        if scored.is_empty() {
            return SentimentResult::neutral();
        }

        // First category in table order wins ties.
        let (primary_emotion, best) = scored.iter().fold(scored[0], |best, current| {
            if current.1 > best.1 {
                *current
            } else {
                best
            }
        });

        // Stable sort keeps table order among equal scores.
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        let intensity = Intensity::from_score(best);
        SentimentResult {
            primary_emotion,
            intensity,
            all_emotions: scored,
            requires_empathy: matches!(
                primary_emotion,
                Emotion::Frustrated | Emotion::Worried | Emotion::Confused
            ),
            requires_urgency: primary_emotion == Emotion::Urgent || intensity == Intensity::High,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frustrated_complaint_is_high() {
        let analyzer = SentimentAnalyzer::new();
        let result = analyzer.analyze("This is ridiculous, nobody is helping me!");
        assert_eq!(result.primary_emotion, Emotion::Frustrated);
        assert_eq!(result.intensity, Intensity::High);
        assert!(result.requires_empathy);
        assert!(result.requires_urgency);
    }

    #[test]
    fn test_no_signal_is_neutral() {
        let analyzer = SentimentAnalyzer::new();
        let result = analyzer.analyze("Where is your office located");
        assert_eq!(result, SentimentResult::neutral());
        assert_eq!(result.score_of(Emotion::Neutral), 0.5);
    }

    #[test]
    fn test_intensifier_boosts_match() {
        let analyzer = SentimentAnalyzer::new();
        let plain = analyzer.analyze("I am worried about my payment");
        let boosted = analyzer.analyze("I am very worried about my payment");
        assert_eq!(plain.intensity, Intensity::Medium);
        assert!(boosted.score_of(Emotion::Worried) > plain.score_of(Emotion::Worried));
    }

    #[test]
    fn test_tie_goes_to_first_category() {
        let analyzer = SentimentAnalyzer::new();
        // One frustrated keyword and one urgent keyword, equal scores.
        let result = analyzer.analyze("annoyed, need it urgently");
        assert_eq!(result.primary_emotion, Emotion::Frustrated);
        assert_eq!(result.all_emotions[0].0, Emotion::Frustrated);
        assert_eq!(result.all_emotions[1].0, Emotion::Urgent);
    }

    #[test]
    fn test_urgency_flag() {
        let analyzer = SentimentAnalyzer::new();
        let result = analyzer.analyze("I need this urgently");
        assert_eq!(result.primary_emotion, Emotion::Urgent);
        assert!(result.requires_urgency);
        assert!(!result.requires_empathy);
    }
}
