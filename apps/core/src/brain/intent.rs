//! Intent Classification using weighted keyword and phrase lexicons.
//!
//! Two tiers:
//! 1. Simple-greeting fast path: a standalone greeting of one to three tokens
//!    skips general scoring entirely.
//! 2. General scoring over the intent taxonomy, with multi-word phrases weighted above
//!    single keywords and a length penalty against incidental co-occurrence.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::lexicon::{tokenize, Lexicon};

/// Detected intent type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Standalone "hi"/"hello", answered tersely
    SimpleGreeting,
    /// Greeting with some small talk ("hello, how are you")
    Greeting,
    Gratitude,
    Goodbye,
    /// Wants to talk to a human
    AgentRequest,
    Complaint,
    /// Reporting a new workplace accident or injury
    ClaimSubmission,
    ClaimStatus,
    PaymentStatus,
    PensionInquiry,
    EmployerRegistration,
    ContributionPayment,
    DocumentRequest,
    TechnicalHelp,
    /// Unknown/Default
    Unknown,
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl Intent {
    /// Every intent, in classification tie-break order.
    pub const ALL: [Intent; 15] = [
        Intent::SimpleGreeting,
        Intent::Greeting,
        Intent::Gratitude,
        Intent::Goodbye,
        Intent::AgentRequest,
        Intent::Complaint,
        Intent::ClaimSubmission,
        Intent::ClaimStatus,
        Intent::PaymentStatus,
        Intent::PensionInquiry,
        Intent::EmployerRegistration,
        Intent::ContributionPayment,
        Intent::DocumentRequest,
        Intent::TechnicalHelp,
        Intent::Unknown,
    ];

    /// Returns the snake_case label used in metadata and logs
    pub fn label(&self) -> &'static str {
        match self {
            Intent::SimpleGreeting => "simple_greeting",
            Intent::Greeting => "greeting",
            Intent::Gratitude => "gratitude",
            Intent::Goodbye => "goodbye",
            Intent::AgentRequest => "agent_request",
            Intent::Complaint => "complaint",
            Intent::ClaimSubmission => "claim_submission",
            Intent::ClaimStatus => "claim_status",
            Intent::PaymentStatus => "payment_status",
            Intent::PensionInquiry => "pension_inquiry",
            Intent::EmployerRegistration => "employer_registration",
            Intent::ContributionPayment => "contribution_payment",
            Intent::DocumentRequest => "document_request",
            Intent::TechnicalHelp => "technical_help",
            Intent::Unknown => "unknown",
        }
    }

    /// Greeting, gratitude and goodbye replies are kept short.
    pub fn is_short_form(&self) -> bool {
        matches!(
            self,
            Intent::SimpleGreeting | Intent::Greeting | Intent::Gratitude | Intent::Goodbye
        )
    }

    pub fn is_greeting(&self) -> bool {
        matches!(self, Intent::SimpleGreeting | Intent::Greeting)
    }
}

/// Result of intent classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentResult {
    /// Detected intent
    pub intent: Intent,
    /// Confidence score (0.0 - 1.0)
    pub confidence: f32,
    /// Lexicon entries that matched
    pub matched_terms: Vec<String>,
}

impl IntentResult {
    fn unknown() -> Self {
        Self {
            intent: Intent::Unknown,
            confidence: UNKNOWN_CONFIDENCE,
            matched_terms: vec![],
        }
    }
}

/// Below this score the message is treated as unclassified.
pub const CONFIDENCE_FLOOR: f32 = 0.3;
pub const SIMPLE_GREETING_CONFIDENCE: f32 = 0.95;
const UNKNOWN_CONFIDENCE: f32 = 0.1;
const PHRASE_MULTIPLIER: f32 = 1.2;
const KEYWORD_MULTIPLIER: f32 = 0.8;
const EXTRA_PHRASE_BONUS: f32 = 0.1;
const MAX_SIMPLE_GREETING_TOKENS: usize = 3;

const GREETING_WORDS: &[&str] = &[
    "hi", "hello", "hey", "hiya", "howdy", "greetings", "habari", "mambo", "hujambo", "morning",
    "afternoon", "evening", "yo",
];
const POLITE_FILLER: &[&str] = &[
    "there", "all", "team", "everyone", "sir", "madam", "please", "again", "good", "dear",
];

/// Lexicon definition for one intent
struct IntentLexicon {
    intent: Intent,
    lexicon: Lexicon,
    weight: f32,
}

static INTENT_LEXICONS: &[IntentLexicon] = &[
    IntentLexicon {
        intent: Intent::Greeting,
        lexicon: Lexicon::new(
            &["hello", "hi", "hey", "greetings", "habari", "mambo", "howdy"],
            &["good morning", "good afternoon", "good evening", "how are you"],
        ),
        weight: 0.6,
    },
    IntentLexicon {
        intent: Intent::Gratitude,
        lexicon: Lexicon::new(
            &["thanks", "thank", "appreciate", "appreciated", "grateful", "asante", "cheers"],
            &["thank you", "thanks a lot", "much appreciated", "thanks so much"],
        ),
        weight: 0.7,
    },
    IntentLexicon {
        intent: Intent::Goodbye,
        lexicon: Lexicon::new(
            &["bye", "goodbye", "farewell"],
            &["see you", "talk later", "that's all", "have a nice day", "take care"],
        ),
        weight: 0.7,
    },
    IntentLexicon {
        intent: Intent::AgentRequest,
        lexicon: Lexicon::new(
            &["agent", "human", "representative", "operator", "officer"],
            &[
                "speak to", "talk to", "speak with", "talk with", "real person", "human agent",
                "call me", "customer care", "transfer me",
            ],
        ),
        weight: 0.8,
    },
    IntentLexicon {
        intent: Intent::Complaint,
        lexicon: Lexicon::new(
            &[
                "complaint", "complain", "ridiculous", "unacceptable", "terrible", "worst",
                "disappointed", "rude", "useless", "poor",
            ],
            &[
                "nobody is helping", "no one is helping", "not helping", "poor service",
                "bad service", "file a complaint", "make a complaint", "not happy",
                "still waiting",
            ],
        ),
        weight: 0.7,
    },
    IntentLexicon {
        intent: Intent::ClaimSubmission,
        lexicon: Lexicon::new(
            &["injury", "injured", "accident", "hurt", "incident", "notify", "lodge"],
            &[
                "file a claim", "submit a claim", "new claim", "report an accident",
                "report an injury", "make a claim", "lodge a claim", "claim compensation",
                "claim for compensation", "got injured", "was injured", "injured at work",
                "accident at work", "notification of accident",
            ],
        ),
        weight: 0.7,
    },
    IntentLexicon {
        intent: Intent::ClaimStatus,
        lexicon: Lexicon::new(
            &["status", "progress", "update", "pending", "approved", "stage"],
            &[
                "claim status", "status of my claim", "my claim", "check claim",
                "check my claim", "going on with my claim", "update on my claim",
                "track my claim", "where is my claim",
            ],
        ),
        weight: 0.6,
    },
    IntentLexicon {
        intent: Intent::PaymentStatus,
        lexicon: Lexicon::new(
            &["payment", "payments", "paid", "payout", "disbursement", "arrears"],
            &[
                "not paid", "haven't been paid", "have not been paid", "payment status",
                "when will i be paid", "my payment", "my money", "not received payment",
            ],
        ),
        weight: 0.6,
    },
    IntentLexicon {
        intent: Intent::PensionInquiry,
        lexicon: Lexicon::new(
            &["pension", "pensions", "pensioner", "survivor", "dependants"],
            &[
                "monthly pension", "pension payment", "survivor benefit",
                "dependants benefit", "life certificate",
            ],
        ),
        weight: 0.6,
    },
    IntentLexicon {
        intent: Intent::EmployerRegistration,
        lexicon: Lexicon::new(
            &["register", "registration", "employer", "company", "business"],
            &[
                "register my company", "register as employer", "employer registration",
                "register my business", "new employer", "registration certificate",
            ],
        ),
        weight: 0.7,
    },
    IntentLexicon {
        intent: Intent::ContributionPayment,
        lexicon: Lexicon::new(
            &["contribution", "contributions", "assessment", "penalty", "remit"],
            &[
                "pay contributions", "monthly contribution", "contribution statement",
                "late payment penalty", "control number",
            ],
        ),
        weight: 0.6,
    },
    IntentLexicon {
        intent: Intent::DocumentRequest,
        lexicon: Lexicon::new(
            &["document", "documents", "form", "forms", "certificate", "letter", "copy", "download"],
            &[
                "claim form", "need a form", "compliance certificate",
                "certificate of compliance", "send me", "copy of", "what documents",
                "which documents",
            ],
        ),
        weight: 0.6,
    },
    IntentLexicon {
        intent: Intent::TechnicalHelp,
        lexicon: Lexicon::new(
            &["login", "password", "portal", "website", "app", "error", "otp", "upload", "locked"],
            &[
                "log in", "can't log in", "cannot access", "not working", "reset my password",
                "system error", "e-services portal",
            ],
        ),
        weight: 0.6,
    },
];

/// Intent classifier over the fixed taxonomy
pub struct IntentClassifier {
    lexicons: &'static [IntentLexicon],
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentClassifier {
    /// Create a new intent classifier with all lexicons
    pub fn new() -> Self {
        Self {
            lexicons: INTENT_LEXICONS,
        }
    }

    /// True for short, standalone greetings ("Hi", "Hello there", "Good morning").
    pub fn is_simple_greeting(tokens: &[String]) -> bool {
        if tokens.is_empty() || tokens.len() > MAX_SIMPLE_GREETING_TOKENS {
            return false;
        }
        let all_allowed = tokens.iter().all(|t| {
            GREETING_WORDS.contains(&t.as_str()) || POLITE_FILLER.contains(&t.as_str())
        });
        all_allowed && tokens.iter().any(|t| GREETING_WORDS.contains(&t.as_str()))
    }

    fn length_penalty(token_count: usize) -> f32 {
        if token_count > 10 {
            0.8
        } else if token_count > 5 {
            0.9
        } else {
            1.0
        }
    }

    /// Classify the intent of a message
    pub fn classify(&self, message: &str) -> IntentResult {
        let tokens = tokenize(message);

        if tokens.is_empty() {
            return IntentResult::unknown();
        }

        if Self::is_simple_greeting(&tokens) {
            return IntentResult {
                intent: Intent::SimpleGreeting,
                confidence: SIMPLE_GREETING_CONFIDENCE,
                matched_terms: tokens,
            };
        }

        let penalty = Self::length_penalty(tokens.len());
        let mut best_intent = Intent::Unknown;
        let mut best_score: f32 = 0.0;
        let mut matched_terms = Vec::new();

        for group in self.lexicons {
            let hits = group.lexicon.hits(&tokens);
            if hits.is_empty() {
                continue;
            }

            let phrase_count = hits.iter().filter(|h| h.is_phrase).count();
            let raw: f32 = hits
                .iter()
                .map(|h| {
                    let multiplier = if h.is_phrase {
                        PHRASE_MULTIPLIER
                    } else {
                        KEYWORD_MULTIPLIER
                    };
                    group.weight * multiplier
                })
                .sum();
            let bonus = phrase_count.saturating_sub(1) as f32 * EXTRA_PHRASE_BONUS;
            let score = (raw + bonus) * penalty;

            if score > best_score {
                best_score = score;
                best_intent = group.intent;
                matched_terms = hits.iter().map(|h| h.term.to_string()).collect();
            }
        }

        if best_score < CONFIDENCE_FLOOR {
            return IntentResult::unknown();
        }

        IntentResult {
            intent: best_intent,
            confidence: best_score.min(1.0),
            matched_terms,
        }
    }
}
