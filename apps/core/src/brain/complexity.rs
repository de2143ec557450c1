//! Query Complexity Scoring.
//!
//! Scores how involved a query is from lexical features and turns the
//! (complexity, role, intent) triple into a length/detail recommendation.

use serde::{Deserialize, Serialize};

use super::features::MessageFeatures;
use super::intent::Intent;
use super::lexicon::{tokenize, Lexicon};
use super::role::Role;

/// Domain terms that indicate a technical or procedural question
const TECHNICAL_TERMS: Lexicon = Lexicon::new(
    &[
        "contribution", "contributions", "assessment", "actuarial", "compliance", "penalty",
        "arrears", "rehabilitation", "dependants", "regulation", "regulations", "audit",
        "disablement", "impairment", "tribunal", "appeal", "reimbursement", "assessor",
        "certificate", "levy", "payroll", "statutory",
    ],
    &[
        "medical board", "permanent disablement", "temporary disablement", "degree of impairment",
        "occupational disease", "constant attendance", "earnings calculation", "funeral grant",
        "control number", "medical assessment",
    ],
);

const QUESTION_INDICATORS: &[&str] = &[
    "what", "how", "why", "when", "where", "which", "who", "can", "could", "should", "is", "are",
    "do", "does",
];

const EMOTIONAL_WORDS: Lexicon = Lexicon::new(
    &[
        "worried", "scared", "angry", "frustrated", "upset", "stressed", "desperate", "afraid",
        "confused", "hopeless", "sad",
    ],
    &[],
);

const URGENCY_WORDS: Lexicon = Lexicon::new(
    &["urgent", "urgently", "emergency", "asap", "immediately", "quickly", "deadline"],
    &["right now", "as soon as possible"],
);

const WORD_COUNT_CAP: f32 = 3.0;
const WORDS_PER_POINT: f32 = 10.0;
const TECHNICAL_WEIGHT: f32 = 0.5;
const EXTRA_QUESTION_WEIGHT: f32 = 0.5;
const EMOTIONAL_WEIGHT: f32 = 0.3;
const URGENCY_WEIGHT: f32 = 0.2;
const SIMPLE_MAX: f32 = 2.0;
const MODERATE_MAX: f32 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplexityLevel {
    Simple,
    Moderate,
    Complex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseLength {
    Concise,
    Standard,
    Detailed,
    Comprehensive,
}

impl ResponseLength {
    /// One notch more verbose, saturating at comprehensive.
    pub fn upgraded(self) -> Self {
        match self {
            ResponseLength::Concise => ResponseLength::Standard,
            ResponseLength::Standard => ResponseLength::Detailed,
            ResponseLength::Detailed | ResponseLength::Comprehensive => {
                ResponseLength::Comprehensive
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailLevel {
    Overview,
    Standard,
    Detailed,
    Comprehensive,
}

impl DetailLevel {
    fn upgraded(self) -> Self {
        match self {
            DetailLevel::Overview => DetailLevel::Standard,
            DetailLevel::Standard => DetailLevel::Detailed,
            DetailLevel::Detailed | DetailLevel::Comprehensive => DetailLevel::Comprehensive,
        }
    }
}

/// Metrics about query complexity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplexityResult {
    pub level: ComplexityLevel,
    /// Composite score, unbounded above
    pub score: f32,
    pub recommended_length: ResponseLength,
    pub recommended_detail: DetailLevel,
    pub word_count: usize,
    /// List of detected technical terms
    pub technical_terms: Vec<String>,
    pub question_indicators: usize,
    pub emotional_words: usize,
    pub urgency_words: usize,
    /// A reference/case number was present
    pub is_specific: bool,
}

/// Complexity analyzer for customer queries
pub struct ComplexityAnalyzer;

impl Default for ComplexityAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl ComplexityAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Distinct question indicators: interrogative words plus a question mark.
    fn count_question_indicators(message: &str, tokens: &[String]) -> usize {
        let words = QUESTION_INDICATORS
            .iter()
            .filter(|q| tokens.iter().any(|t| t.as_str() == **q))
            .count();
        words + usize::from(message.contains('?'))
    }

    fn level_for(score: f32) -> ComplexityLevel {
        if score <= SIMPLE_MAX {
            ComplexityLevel::Simple
        } else if score <= MODERATE_MAX {
            ComplexityLevel::Moderate
        } else {
            ComplexityLevel::Complex
        }
    }

    /// Length/detail recommendation for a (complexity, role, intent) triple.
    pub fn recommend(
        level: ComplexityLevel,
        role: Role,
        intent: Intent,
    ) -> (ResponseLength, DetailLevel) {
        let (mut length, mut detail) = match level {
            ComplexityLevel::Simple => (ResponseLength::Concise, DetailLevel::Overview),
            ComplexityLevel::Moderate => (ResponseLength::Standard, DetailLevel::Standard),
            ComplexityLevel::Complex => (ResponseLength::Detailed, DetailLevel::Detailed),
        };

        // Organizational roles read more and expect fuller answers.
        if matches!(role, Role::Employer | Role::Stakeholder | Role::Staff) {
            length = length.upgraded();
            detail = detail.upgraded();
        }

        if matches!(
            intent,
            Intent::ClaimSubmission | Intent::DocumentRequest | Intent::EmployerRegistration
        ) {
            length = length.upgraded();
            detail = detail.upgraded();
        }

        (length, detail)
    }

    /// Analyze a message using features already extracted for it
    pub fn analyze_with_features(
        &self,
        message: &str,
        features: &MessageFeatures,
        intent: Intent,
        role: Role,
    ) -> ComplexityResult {
        let tokens = tokenize(message);

        let technical_terms: Vec<String> = TECHNICAL_TERMS
            .hits(&tokens)
            .into_iter()
            .map(|h| h.term.to_string())
            .fold(Vec::new(), |mut acc, term| {
                if !acc.contains(&term) {
                    acc.push(term);
                }
                acc
            });
        let question_indicators = Self::count_question_indicators(message, &tokens);
        let emotional_words = EMOTIONAL_WORDS.hits(&tokens).len();
        let urgency_words = URGENCY_WORDS.hits(&tokens).len();

        let score = (tokens.len() as f32 / WORDS_PER_POINT).min(WORD_COUNT_CAP)
            + technical_terms.len() as f32 * TECHNICAL_WEIGHT
            + question_indicators.saturating_sub(1) as f32 * EXTRA_QUESTION_WEIGHT
            + emotional_words as f32 * EMOTIONAL_WEIGHT
            + urgency_words as f32 * URGENCY_WEIGHT;

        let level = Self::level_for(score);
        let (recommended_length, recommended_detail) = Self::recommend(level, role, intent);

        ComplexityResult {
            level,
            score,
            recommended_length,
            recommended_detail,
            word_count: tokens.len(),
            technical_terms,
            question_indicators,
            emotional_words,
            urgency_words,
            is_specific: features.has_reference,
        }
    }

    /// Analyze text and return complexity metrics
    pub fn analyze(&self, message: &str, intent: Intent, role: Role) -> ComplexityResult {
        let features = MessageFeatures::extract(message);
        self.analyze_with_features(message, &features, intent, role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_text() {
        let analyzer = ComplexityAnalyzer::new();
        let result = analyzer.analyze("Hello there", Intent::SimpleGreeting, Role::Unknown);
        assert_eq!(result.level, ComplexityLevel::Simple);
        assert_eq!(result.word_count, 2);
        assert_eq!(result.recommended_length, ResponseLength::Concise);
    }

    #[test]
    fn test_complex_text() {
        let analyzer = ComplexityAnalyzer::new();
        let text = "I am worried and confused. How is the degree of impairment decided by the \
                    medical board, what happens with rehabilitation costs and arrears, and \
                    can I appeal to the tribunal if the assessment is wrong? This is urgent.";
        let result = analyzer.analyze(text, Intent::Unknown, Role::Beneficiary);
        assert_eq!(result.level, ComplexityLevel::Complex);
        assert!(result.technical_terms.len() >= 5);
        assert_eq!(result.recommended_length, ResponseLength::Detailed);
    }

    #[test]
    fn test_role_and_intent_upgrades() {
        assert_eq!(
            ComplexityAnalyzer::recommend(ComplexityLevel::Simple, Role::Beneficiary, Intent::ClaimStatus),
            (ResponseLength::Concise, DetailLevel::Overview)
        );
        assert_eq!(
            ComplexityAnalyzer::recommend(ComplexityLevel::Simple, Role::Employer, Intent::ClaimStatus),
            (ResponseLength::Standard, DetailLevel::Standard)
        );
        assert_eq!(
            ComplexityAnalyzer::recommend(ComplexityLevel::Simple, Role::Beneficiary, Intent::ClaimSubmission),
            (ResponseLength::Standard, DetailLevel::Standard)
        );
        assert_eq!(
            ComplexityAnalyzer::recommend(ComplexityLevel::Complex, Role::Employer, Intent::DocumentRequest),
            (ResponseLength::Comprehensive, DetailLevel::Comprehensive)
        );
    }

    #[test]
    fn test_specificity_flag() {
        let analyzer = ComplexityAnalyzer::new();
        let result = analyzer.analyze("Check claim WC-2024-001234", Intent::ClaimStatus, Role::Unknown);
        assert!(result.is_specific);
    }

    #[test]
    fn test_empty_text() {
        let analyzer = ComplexityAnalyzer::new();
        let result = analyzer.analyze("", Intent::Unknown, Role::Unknown);
        assert_eq!(result.score, 0.0);
        assert_eq!(result.word_count, 0);
    }
}
