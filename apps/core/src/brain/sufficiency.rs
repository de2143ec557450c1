//! Context sufficiency: answer now, or ask a clarifying question first.
//!
//! Policy is a table keyed by intent rather than a branch per intent, so adding an
//! intent means adding a row.

use serde::{Deserialize, Serialize};

use super::features::MessageFeatures;
use super::intent::{Intent, IntentResult};

/// Below this confidence the classification is not trusted for a targeted policy.
const LOW_CONFIDENCE: f32 = 0.5;
/// Messages this short with no clear intent get an open topic question.
const OPEN_QUESTION_MAX_TOKENS: usize = 3;

/// The kind of information a clarifying question asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextType {
    Topic,
    IncidentDetails,
    ClaimReference,
    PaymentDetails,
    MemberNumber,
    DocumentPurpose,
    RegistrationNumber,
    IssueDetails,
    BusinessDetails,
}

/// When a direct answer is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DirectRule {
    /// Always answer directly.
    Never,
    /// Incident description or specificity at or above the threshold.
    IncidentOrSpecific(i32),
    /// Reference present, specificity at or above the threshold, or confident phrasing.
    ReferenceOrConfident(i32),
    /// Specificity at or above the threshold, or a symptom keyword.
    SpecificOrSymptom(i32),
    /// Specificity at or above the threshold, or confident phrasing.
    SpecificOrConfident(i32),
}

/// Context policy for one intent
#[derive(Debug)]
struct IntentPolicy {
    intent: Intent,
    rule: DirectRule,
    context_type: Option<ContextType>,
    lead_in: &'static str,
    questions: &'static [&'static str],
}

static POLICIES: &[IntentPolicy] = &[
    IntentPolicy {
        intent: Intent::ClaimSubmission,
        rule: DirectRule::IncidentOrSpecific(4),
        context_type: Some(ContextType::IncidentDetails),
        lead_in: "To start your claim correctly, I need a few details about what happened.",
        questions: &[
            "What type of incident or injury was it?",
            "On what date did it happen?",
            "Did you receive medical attention, and where?",
        ],
    },
    IntentPolicy {
        intent: Intent::ClaimStatus,
        rule: DirectRule::ReferenceOrConfident(3),
        context_type: Some(ContextType::ClaimReference),
        lead_in: "I can check on that for you.",
        questions: &["Could you share your claim reference number (for example WC-2024-001234)?"],
    },
    IntentPolicy {
        intent: Intent::PaymentStatus,
        rule: DirectRule::ReferenceOrConfident(3),
        context_type: Some(ContextType::PaymentDetails),
        lead_in: "Let me help you track that payment.",
        questions: &[
            "Which payment is it about, for example a monthly pension, a compensation payment or a medical refund?",
            "Do you have the claim reference number it relates to?",
        ],
    },
    IntentPolicy {
        intent: Intent::PensionInquiry,
        rule: DirectRule::ReferenceOrConfident(3),
        context_type: Some(ContextType::MemberNumber),
        lead_in: "I can help with your pension question.",
        questions: &["Could you share your member or pension number?"],
    },
    IntentPolicy {
        intent: Intent::DocumentRequest,
        rule: DirectRule::ReferenceOrConfident(3),
        context_type: Some(ContextType::DocumentPurpose),
        lead_in: "I can point you to the right document.",
        questions: &["Which document do you need, and what will you use it for?"],
    },
    IntentPolicy {
        intent: Intent::ContributionPayment,
        rule: DirectRule::ReferenceOrConfident(3),
        context_type: Some(ContextType::RegistrationNumber),
        lead_in: "I can help with your contributions.",
        questions: &["Could you share your employer registration number?"],
    },
    IntentPolicy {
        intent: Intent::Complaint,
        rule: DirectRule::SpecificOrSymptom(2),
        context_type: Some(ContextType::IssueDetails),
        lead_in: "I want to make sure this gets resolved properly.",
        questions: &[
            "Could you tell me what happened and when?",
            "Do you have a claim or reference number related to this?",
        ],
    },
    IntentPolicy {
        intent: Intent::TechnicalHelp,
        rule: DirectRule::SpecificOrSymptom(2),
        context_type: Some(ContextType::IssueDetails),
        lead_in: "Let's get this working for you.",
        questions: &["What exactly happens when you try, and do you see an error message?"],
    },
];

/// Used for intents without a dedicated row.
static DEFAULT_POLICY: IntentPolicy = IntentPolicy {
    intent: Intent::Unknown,
    rule: DirectRule::SpecificOrConfident(2),
    context_type: Some(ContextType::BusinessDetails),
    lead_in: "Happy to help with that.",
    questions: &["Could you tell me a little more about your business and what you need to do?"],
};

static NEVER_GATHER: IntentPolicy = IntentPolicy {
    intent: Intent::Unknown,
    rule: DirectRule::Never,
    context_type: None,
    lead_in: "",
    questions: &[],
};

const OPEN_TOPIC_LEAD_IN: &str = "I'd like to make sure I point you in the right direction.";
const OPEN_TOPIC_QUESTION: &str =
    "Could you tell me a bit more about what you need help with, for example a claim, a payment, employer registration or a document?";

/// Whether to answer now, and what to ask if not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextAssessment {
    pub needs_context: bool,
    pub context_type: Option<ContextType>,
    /// Non-empty whenever `needs_context` is set
    pub clarifying_questions: Vec<String>,
    /// Sentence that introduces the questions
    pub lead_in: String,
    pub decision_reason: String,
    pub specificity_score: i32,
}

impl ContextAssessment {
    fn direct(reason: impl Into<String>, specificity_score: i32) -> Self {
        Self {
            needs_context: false,
            context_type: None,
            clarifying_questions: vec![],
            lead_in: String::new(),
            decision_reason: reason.into(),
            specificity_score,
        }
    }

    fn clarify(
        context_type: ContextType,
        lead_in: &str,
        questions: &[&str],
        reason: impl Into<String>,
        specificity_score: i32,
    ) -> Self {
        Self {
            needs_context: true,
            context_type: Some(context_type),
            clarifying_questions: questions.iter().map(|q| q.to_string()).collect(),
            lead_in: lead_in.to_string(),
            decision_reason: reason.into(),
            specificity_score,
        }
    }
}

/// Decides whether a message carries enough detail to answer directly
pub struct ContextAssessor {
    policies: &'static [IntentPolicy],
}

impl Default for ContextAssessor {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextAssessor {
    pub fn new() -> Self {
        Self { policies: POLICIES }
    }

    fn policy_for(&self, intent: Intent) -> &'static IntentPolicy {
        match intent {
            Intent::SimpleGreeting
            | Intent::Greeting
            | Intent::Gratitude
            | Intent::Goodbye
            | Intent::AgentRequest => &NEVER_GATHER,
            other => self
                .policies
                .iter()
                .find(|p| p.intent == other)
                .unwrap_or(&DEFAULT_POLICY),
        }
    }

    pub fn assess(&self, message: &str, intent: &IntentResult) -> ContextAssessment {
        let features = MessageFeatures::extract(message);
        self.assess_with_features(&features, intent)
    }

    pub fn assess_with_features(
        &self,
        features: &MessageFeatures,
        intent: &IntentResult,
    ) -> ContextAssessment {
        let specificity = features.specificity_score();
        let policy = self.policy_for(intent.intent);

        if policy.rule == DirectRule::Never {
            return ContextAssessment::direct(
                format!("{} never needs extra context", intent.intent),
                specificity,
            );
        }

        if intent.intent == Intent::Unknown || intent.confidence < LOW_CONFIDENCE {
            if features.uncertain || features.word_count <= OPEN_QUESTION_MAX_TOKENS {
                return ContextAssessment::clarify(
                    ContextType::Topic,
                    OPEN_TOPIC_LEAD_IN,
                    &[OPEN_TOPIC_QUESTION],
                    "unclear request, asking for the topic",
                    specificity,
                );
            }
            return ContextAssessment::direct(
                "low confidence, answering on a best-effort basis",
                specificity,
            );
        }

        let (direct, reason) = match policy.rule {
            DirectRule::Never => (true, "no context needed"),
            DirectRule::IncidentOrSpecific(min) => {
                if features.has_incident {
                    (true, "incident described")
                } else if specificity >= min {
                    (true, "specific enough")
                } else {
                    (false, "incident details missing")
                }
            }
            DirectRule::ReferenceOrConfident(min) => {
                if features.has_reference {
                    (true, "reference number provided")
                } else if specificity >= min {
                    (true, "specific enough")
                } else if features.confident {
                    (true, "confident phrasing")
                } else {
                    (false, "reference details missing")
                }
            }
            DirectRule::SpecificOrSymptom(min) => {
                if specificity >= min {
                    (true, "specific enough")
                } else if features.has_symptom {
                    (true, "concrete symptom described")
                } else {
                    (false, "issue details missing")
                }
            }
            DirectRule::SpecificOrConfident(min) => {
                if specificity >= min {
                    (true, "specific enough")
                } else if features.confident {
                    (true, "confident phrasing")
                } else {
                    (false, "details missing")
                }
            }
        };

        match (direct, policy.context_type) {
            (false, Some(context_type)) if !policy.questions.is_empty() => {
                ContextAssessment::clarify(
                    context_type,
                    policy.lead_in,
                    policy.questions,
                    reason,
                    specificity,
                )
            }
            _ => ContextAssessment::direct(reason, specificity),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brain::intent::IntentClassifier;

    fn assess(message: &str) -> ContextAssessment {
        let intent = IntentClassifier::new().classify(message);
        ContextAssessor::new().assess(message, &intent)
    }

    #[test]
    fn test_vague_claim_status_asks_for_reference() {
        let result = assess("What's going on with my claim");
        assert!(result.needs_context);
        assert_eq!(result.context_type, Some(ContextType::ClaimReference));
        assert!(result.clarifying_questions[0].contains("claim reference number"));
    }

    #[test]
    fn test_specific_claim_status_is_direct() {
        let result = assess("Check claim WC-2024-001234 status");
        assert!(!result.needs_context);
        assert!(result.specificity_score >= 3);
    }

    #[test]
    fn test_claim_submission_with_incident_is_direct() {
        let message = "I slipped on a wet floor at work yesterday and was injured";
        let intent = IntentClassifier::new().classify(message);
        assert_eq!(intent.intent, Intent::ClaimSubmission);
        let result = ContextAssessor::new().assess(message, &intent);
        assert!(!result.needs_context);
    }

    #[test]
    fn test_claim_submission_without_details_asks_three_questions() {
        let intent = IntentResult {
            intent: Intent::ClaimSubmission,
            confidence: 0.9,
            matched_terms: vec![],
        };
        let result = ContextAssessor::new().assess("I want to file a claim", &intent);
        assert!(result.needs_context);
        assert_eq!(result.clarifying_questions.len(), 3);
    }

    #[test]
    fn test_greetings_never_gather() {
        for message in ["Hi", "Thank you so much", "I want to speak to a human agent"] {
            assert!(!assess(message).needs_context, "for '{}'", message);
        }
    }

    #[test]
    fn test_unknown_short_message_gets_topic_question() {
        let intent = IntentResult {
            intent: Intent::Unknown,
            confidence: 0.1,
            matched_terms: vec![],
        };
        let result = ContextAssessor::new().assess("help", &intent);
        assert!(result.needs_context);
        assert_eq!(result.context_type, Some(ContextType::Topic));

        let result = ContextAssessor::new().assess(
            "the office near the market closes early on fridays these days",
            &intent,
        );
        assert!(!result.needs_context);
    }

    #[test]
    fn test_technical_help_with_symptom_is_direct() {
        let intent = IntentResult {
            intent: Intent::TechnicalHelp,
            confidence: 0.8,
            matched_terms: vec![],
        };
        assert!(!ContextAssessor::new().assess("error again", &intent).needs_context);
        assert!(ContextAssessor::new().assess("it is broken", &intent).needs_context);
    }

    #[test]
    fn test_every_intent_has_questions_when_gathering() {
        let features = MessageFeatures::extract("maybe");
        for intent in Intent::ALL {
            for confidence in [0.1, 0.6, 1.0] {
                let result = ContextAssessor::new().assess_with_features(
                    &features,
                    &IntentResult {
                        intent,
                        confidence,
                        matched_terms: vec![],
                    },
                );
                if result.needs_context {
                    assert!(!result.clarifying_questions.is_empty());
                    assert!(result.clarifying_questions.iter().all(|q| !q.trim().is_empty()));
                }
            }
        }
    }
}
