use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::brain::complexity::ComplexityLevel;
use crate::brain::intent::Intent;
use crate::brain::role::Role;
use crate::brain::sentiment::SentimentResult;
use crate::error::AppError;

/// How the user prefers to be addressed, when the channel layer knows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommunicationStyle {
    Formal,
    Casual,
    /// Wants short answers only
    Brief,
    /// Wants step-by-step detail
    Detailed,
}

/// Where a turn ended up in the conversation flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowStage {
    /// The message was rejected before analysis
    InvalidInput,
    Greeting,
    /// The assistant asked for more information
    Clarification,
    /// The assistant answered directly
    Answer,
    /// The assistant handed over to a human agent
    Escalation,
    Closing,
    /// An internal failure was degraded to a generic reply
    Fallback,
}

impl FlowStage {
    pub fn label(&self) -> &'static str {
        match self {
            FlowStage::InvalidInput => "invalid_input",
            FlowStage::Greeting => "greeting",
            FlowStage::Clarification => "clarification",
            FlowStage::Answer => "answer",
            FlowStage::Escalation => "escalation",
            FlowStage::Closing => "closing",
            FlowStage::Fallback => "fallback",
        }
    }
}

/// Reference numbers, dates and amounts mentioned during a conversation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MentionedEntities {
    pub claim_numbers: Vec<String>,
    pub registration_numbers: Vec<String>,
    pub member_numbers: Vec<String>,
    pub dates: Vec<String>,
    pub amounts: Vec<String>,
}

impl MentionedEntities {
    pub fn is_empty(&self) -> bool {
        self.claim_numbers.is_empty()
            && self.registration_numbers.is_empty()
            && self.member_numbers.is_empty()
            && self.dates.is_empty()
            && self.amounts.is_empty()
    }

    /// Adds every entity of `other` that is not already known, keeping first-seen order.
    pub fn merge(&mut self, other: &MentionedEntities) {
        fn extend_unique(target: &mut Vec<String>, source: &[String]) {
            for value in source {
                if !target.contains(value) {
                    target.push(value.clone());
                }
            }
        }
        extend_unique(&mut self.claim_numbers, &other.claim_numbers);
        extend_unique(&mut self.registration_numbers, &other.registration_numbers);
        extend_unique(&mut self.member_numbers, &other.member_numbers);
        extend_unique(&mut self.dates, &other.dates);
        extend_unique(&mut self.amounts, &other.amounts);
    }

    /// The most specific reference mentioned: claim, then registration, then member number.
    pub fn primary_reference(&self) -> Option<&str> {
        self.claim_numbers
            .first()
            .or_else(|| self.registration_numbers.first())
            .or_else(|| self.member_numbers.first())
            .map(String::as_str)
    }
}

/// One completed exchange in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Turn {
    pub user_message: String,
    pub response: String,
    pub intent: Intent,
    pub flow_stage: FlowStage,
    pub timestamp: DateTime<Utc>,
}

/// Per-session state owned by the caller.
///
/// The reply engine only reads it; the session layer calls [`record_turn`](Self::record_turn)
/// after each reply.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct ConversationContext {
    #[validate(length(min = 1, max = 128))]
    pub user_id: Option<String>,
    #[validate(length(max = 128))]
    pub user_name: Option<String>,
    /// Explicit persona, overrides every other role signal
    pub user_role: Option<Role>,
    pub communication_style: Option<CommunicationStyle>,
    #[validate(length(min = 1, max = 128))]
    pub session_id: Option<String>,
    pub conversation_history: Vec<Turn>,
    pub mentioned_entities: MentionedEntities,
    #[validate(length(max = 64))]
    pub employer_code: Option<String>,
    #[validate(length(max = 256))]
    pub company_name: Option<String>,
    #[validate(length(max = 64))]
    pub claim_number: Option<String>,
    #[validate(length(max = 64))]
    pub beneficiary_id: Option<String>,
}

impl ConversationContext {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: Some(session_id.into()),
            ..Default::default()
        }
    }

    /// Parses and validates a context sent by the session layer as JSON.
    pub fn from_json(raw: &str) -> Result<Self, AppError> {
        let context: Self = serde_json::from_str(raw)?;
        context.validate()?;
        Ok(context)
    }

    pub fn is_first_interaction(&self) -> bool {
        self.conversation_history.is_empty()
    }

    /// Number of trailing turns that ended without a usable answer.
    pub fn unresolved_streak(&self) -> usize {
        self.conversation_history
            .iter()
            .rev()
            .take_while(|turn| {
                turn.intent == Intent::Unknown || turn.flow_stage == FlowStage::Fallback
            })
            .count()
    }

    /// Appends the finished turn, keeps the last `limit` turns and merges new entities.
    pub fn record_turn(&mut self, user_message: &str, outcome: &ReplyOutcome, limit: usize) {
        self.conversation_history.push(Turn {
            user_message: user_message.to_string(),
            response: outcome.response_text.clone(),
            intent: outcome.intent,
            flow_stage: outcome.metadata.flow_stage,
            timestamp: outcome.metadata.timestamp,
        });
        let overflow = self.conversation_history.len().saturating_sub(limit);
        if overflow > 0 {
            self.conversation_history.drain(..overflow);
        }
        self.mentioned_entities.merge(&outcome.metadata.entities);
    }
}

/// Structured metadata returned next to every reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyMetadata {
    pub needs_escalation: bool,
    pub flow_stage: FlowStage,
    pub clarifying_questions: Vec<String>,
    pub complexity: Option<ComplexityLevel>,
    /// Entities extracted from this message only
    pub entities: MentionedEntities,
    pub turn_id: Uuid,
    pub processing_time_ms: u64,
    pub timestamp: DateTime<Utc>,
}

/// Everything the caller gets back for one message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyOutcome {
    pub response_text: String,
    pub intent: Intent,
    pub confidence: f32,
    pub sentiment: SentimentResult,
    pub role: Role,
    pub metadata: ReplyMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(intent: Intent, stage: FlowStage, claim: Option<&str>) -> ReplyOutcome {
        let mut entities = MentionedEntities::default();
        if let Some(claim) = claim {
            entities.claim_numbers.push(claim.to_string());
        }
        ReplyOutcome {
            response_text: "ok".to_string(),
            intent,
            confidence: 0.9,
            sentiment: SentimentResult::neutral(),
            role: Role::Unknown,
            metadata: ReplyMetadata {
                needs_escalation: false,
                flow_stage: stage,
                clarifying_questions: vec![],
                complexity: None,
                entities,
                turn_id: Uuid::new_v4(),
                processing_time_ms: 0,
                timestamp: Utc::now(),
            },
        }
    }

    #[test]
    fn test_record_turn_bounds_history() {
        let mut context = ConversationContext::new("s-1");
        assert!(context.is_first_interaction());
        for i in 0..5 {
            context.record_turn(
                &format!("message {}", i),
                &outcome(Intent::ClaimStatus, FlowStage::Answer, None),
                3,
            );
        }
        assert_eq!(context.conversation_history.len(), 3);
        assert_eq!(context.conversation_history[0].user_message, "message 2");
        assert!(!context.is_first_interaction());
    }

    #[test]
    fn test_record_turn_merges_entities_once() {
        let mut context = ConversationContext::new("s-2");
        let turn = outcome(Intent::ClaimStatus, FlowStage::Answer, Some("WC-2024-001234"));
        context.record_turn("first", &turn, 10);
        context.record_turn("second", &turn, 10);
        assert_eq!(context.mentioned_entities.claim_numbers, vec!["WC-2024-001234"]);
        assert_eq!(
            context.mentioned_entities.primary_reference(),
            Some("WC-2024-001234")
        );
    }

    #[test]
    fn test_unresolved_streak_counts_trailing_turns() {
        let mut context = ConversationContext::new("s-3");
        context.record_turn("a", &outcome(Intent::Unknown, FlowStage::Answer, None), 10);
        context.record_turn("b", &outcome(Intent::ClaimStatus, FlowStage::Answer, None), 10);
        context.record_turn("c", &outcome(Intent::Unknown, FlowStage::Clarification, None), 10);
        context.record_turn("d", &outcome(Intent::Complaint, FlowStage::Fallback, None), 10);
        assert_eq!(context.unresolved_streak(), 2);
    }

    #[test]
    fn test_from_json_validates() {
        let context = ConversationContext::from_json(
            r#"{"userId":"u-1","userRole":"employer","companyName":"Acme Ltd"}"#,
        )
        .unwrap();
        assert_eq!(context.user_role, Some(Role::Employer));
        assert_eq!(context.company_name.as_deref(), Some("Acme Ltd"));

        let err = ConversationContext::from_json(r#"{"userId":""}"#).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = ConversationContext::from_json("not json").unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
