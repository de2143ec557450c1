//! # Reply Service
//!
//! Top-level entry point: one message and a read-only conversation snapshot in, one
//! [`ReplyOutcome`] out. The service validates the message, resolves the user's role,
//! runs the analysis stages, fetches enrichment, composes and finalizes the reply, and
//! decides on escalation. It never returns an error: every failure is degraded to a
//! safe reply here and nowhere else.
//!
//! ## Components
//! - `traits`: collaborator and stage seams
//! - `profiles`: profile directory and LRU-cached role resolver
//! - `knowledge`: keyword-scored knowledge base
//! - `transcript`: JSON-lines transcript and tracing conversation loggers

pub mod knowledge;
pub mod profiles;
pub mod traits;
pub mod transcript;

use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::timeout;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::brain::analyzer::{BrainAnalyzer, TurnAnalysis};
use crate::brain::input_guard::{InputGuard, InvalidInput};
use crate::brain::intent::Intent;
use crate::brain::role::Role;
use crate::brain::sentiment::{Emotion, Intensity, SentimentResult};
use crate::config::AssistantConfig;
use crate::error::AppError;
use crate::models::{ConversationContext, FlowStage, MentionedEntities, ReplyMetadata, ReplyOutcome};
use crate::reply::{PostProcessor, ResponseGenerator};

pub use knowledge::{KeywordKnowledgeBase, KnowledgeArticle};
pub use profiles::{CachedRoleResolver, ProfileDirectory};
pub use traits::{
    ConversationLogger, Enrichment, KnowledgeSearch, KnowledgeSnippet, LiveDataSource,
    LiveRecord, Null, ReplyComposer, ReplyFinalizer, RoleResolver, TurnAnalyzer, TurnRecord,
    UserProfile,
};
pub use transcript::{TracingConversationLogger, TranscriptLogger};

const INVALID_INPUT_REPLY: &str = "Sorry, I couldn't read that message. Could you rephrase your question in a few words?";

/// Unresolved turns in a row (including the current one) that trigger a handover.
const UNRESOLVED_ESCALATION_STREAK: usize = 3;

/// Intents for which account-specific data is worth fetching.
const LIVE_DATA_INTENTS: [Intent; 4] = [
    Intent::ClaimStatus,
    Intent::PaymentStatus,
    Intent::PensionInquiry,
    Intent::ContributionPayment,
];

/// External systems the service calls. Each defaults to [`Null`].
#[derive(Clone)]
pub struct Collaborators {
    pub role_resolver: Arc<dyn RoleResolver>,
    pub knowledge: Arc<dyn KnowledgeSearch>,
    pub live_data: Arc<dyn LiveDataSource>,
    pub logger: Arc<dyn ConversationLogger>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            role_resolver: Arc::new(Null),
            knowledge: Arc::new(Null),
            live_data: Arc::new(Null),
            logger: Arc::new(Null),
        }
    }
}

/// Outcome of the pipeline before the turn is wrapped up.
struct Reply {
    text: String,
    intent: Intent,
    confidence: f32,
    sentiment: SentimentResult,
    role: Role,
    flow_stage: FlowStage,
    needs_escalation: bool,
    clarifying_questions: Vec<String>,
    analysis: Option<TurnAnalysis>,
}

/// The reply pipeline, generic over its three stages so each can be replaced.
pub struct ReplyService<A = BrainAnalyzer, C = ResponseGenerator, F = PostProcessor>
where
    A: TurnAnalyzer,
    C: ReplyComposer,
    F: ReplyFinalizer,
{
    config: Arc<AssistantConfig>,
    guard: InputGuard,
    analyzer: A,
    composer: C,
    finalizer: F,
    collaborators: Collaborators,
}

impl ReplyService {
    /// The rule-based pipeline with no collaborators.
    pub fn standard(config: Arc<AssistantConfig>) -> Self {
        Self::new(
            config.clone(),
            BrainAnalyzer::new(),
            ResponseGenerator::new(config.clone()),
            PostProcessor::new(config),
        )
    }
}

impl<A, C, F> ReplyService<A, C, F>
where
    A: TurnAnalyzer,
    C: ReplyComposer,
    F: ReplyFinalizer,
{
    pub fn new(config: Arc<AssistantConfig>, analyzer: A, composer: C, finalizer: F) -> Self {
        Self {
            guard: InputGuard::new(config.max_message_chars),
            config,
            analyzer,
            composer,
            finalizer,
            collaborators: Collaborators::default(),
        }
    }

    pub fn with_collaborators(mut self, collaborators: Collaborators) -> Self {
        self.collaborators = collaborators;
        self
    }

    pub fn config(&self) -> &AssistantConfig {
        &self.config
    }

    /// Produces the reply for one message.
    #[instrument(skip(self, message, context), fields(session_id = ?context.session_id))]
    pub async fn respond(&self, message: &str, context: &ConversationContext) -> ReplyOutcome {
        let start = Instant::now();
        let turn_id = Uuid::new_v4();

        let reply = match self.guard.check(message) {
            Ok(()) => self.run_pipeline(message, context).await,
            Err(reason) => self.invalid_input(reason, context),
        };

        let entities = reply
            .analysis
            .as_ref()
            .map(|a| a.features.entities.clone())
            .unwrap_or_else(MentionedEntities::default);
        let outcome = ReplyOutcome {
            response_text: reply.text,
            intent: reply.intent,
            confidence: reply.confidence,
            sentiment: reply.sentiment,
            role: reply.role,
            metadata: ReplyMetadata {
                needs_escalation: reply.needs_escalation,
                flow_stage: reply.flow_stage,
                clarifying_questions: reply.clarifying_questions,
                complexity: reply.analysis.as_ref().map(|a| a.complexity.level),
                entities,
                turn_id,
                processing_time_ms: start.elapsed().as_millis() as u64,
                timestamp: Utc::now(),
            },
        };

        info!(
            turn_id = %turn_id,
            intent = %outcome.intent,
            confidence = outcome.confidence,
            role = %outcome.role,
            flow_stage = outcome.metadata.flow_stage.label(),
            needs_escalation = outcome.metadata.needs_escalation,
            processing_time_ms = outcome.metadata.processing_time_ms,
            "Reply ready"
        );

        self.log_turn(message, context, &outcome);
        outcome
    }

    async fn run_pipeline(&self, message: &str, context: &ConversationContext) -> Reply {
        let resolved_role = self.resolve_role(context).await;

        let analysis = match self.analyzer.analyze_turn(message, context, resolved_role) {
            Ok(analysis) => analysis,
            Err(e) => {
                error!(error = %e, "Analysis failed, using fallback reply");
                return self.fallback(None, context);
            }
        };

        let enrichment = self.enrich(&analysis, context).await;

        let draft = match self.composer.compose(&analysis, context, &enrichment) {
            Ok(draft) => draft,
            Err(e) => {
                error!(error = %e, intent = %analysis.intent.intent, "Reply generation failed, using fallback reply");
                return self.fallback(Some(analysis), context);
            }
        };

        let intent = analysis.intent.intent;
        let text = self.finalizer.finalize_or_original(
            &draft,
            intent,
            message,
            analysis.first_interaction,
        );

        let needs_escalation = self.needs_escalation(&analysis, context);
        let flow_stage = flow_stage_for(&analysis);
        let clarifying_questions = if analysis.assessment.needs_context {
            analysis.assessment.clarifying_questions.clone()
        } else {
            Vec::new()
        };

        Reply {
            text,
            intent,
            confidence: analysis.intent.confidence,
            sentiment: analysis.sentiment.clone(),
            role: analysis.role,
            flow_stage,
            needs_escalation,
            clarifying_questions,
            analysis: Some(analysis),
        }
    }

    /// Awaits a collaborator call under the configured timeout. Failures become `None`.
    async fn call_collaborator<T, Fut>(&self, collaborator: &'static str, call: Fut) -> Option<T>
    where
        Fut: Future<Output = Result<T, AppError>>,
    {
        match timeout(self.config.collaborator_timeout(), call).await {
            Ok(Ok(value)) => Some(value),
            Ok(Err(e)) => {
                warn!(collaborator, error = %e, "Collaborator failed, continuing without it");
                None
            }
            Err(_) => {
                warn!(
                    collaborator,
                    timeout_ms = self.config.collaborator_timeout_ms,
                    "Collaborator timed out, continuing without it"
                );
                None
            }
        }
    }

    async fn resolve_role(&self, context: &ConversationContext) -> Option<Role> {
        let user_id = context.user_id.as_deref()?;
        self.call_collaborator("role_resolver", self.collaborators.role_resolver.lookup(user_id))
            .await
            .flatten()
            .map(|profile| profile.role)
    }

    /// Knowledge snippets and live data, fetched concurrently. Skipped for short-form
    /// intents and clarification turns.
    async fn enrich(&self, analysis: &TurnAnalysis, context: &ConversationContext) -> Enrichment {
        let intent = analysis.intent.intent;
        if intent.is_short_form() || analysis.assessment.needs_context {
            return Enrichment::default();
        }

        let search = self.call_collaborator(
            "knowledge_search",
            self.collaborators.knowledge.search(&analysis.message, intent),
        );
        let live = async {
            match context.user_id.as_deref() {
                Some(user_id) if LIVE_DATA_INTENTS.contains(&intent) => self
                    .call_collaborator("live_data", self.collaborators.live_data.fetch(intent, user_id))
                    .await
                    .flatten(),
                _ => None,
            }
        };

        let (snippets, live) = tokio::join!(search, live);
        Enrichment {
            snippets: snippets.unwrap_or_default(),
            live,
        }
    }

    fn needs_escalation(&self, analysis: &TurnAnalysis, context: &ConversationContext) -> bool {
        let intent = analysis.intent.intent;
        let frustrated = analysis.sentiment.primary_emotion == Emotion::Frustrated
            && analysis.sentiment.intensity == Intensity::High;
        let unresolved = intent == Intent::Unknown
            && context.unresolved_streak() + 1 >= UNRESOLVED_ESCALATION_STREAK;
        intent == Intent::AgentRequest || frustrated || unresolved
    }

    fn invalid_input(&self, reason: InvalidInput, context: &ConversationContext) -> Reply {
        warn!(reason = %reason, "Message rejected by input validation");
        Reply {
            text: INVALID_INPUT_REPLY.to_string(),
            intent: Intent::Unknown,
            confidence: 0.0,
            sentiment: SentimentResult::neutral(),
            role: context.user_role.unwrap_or(Role::Unknown),
            flow_stage: FlowStage::InvalidInput,
            needs_escalation: false,
            clarifying_questions: Vec::new(),
            analysis: None,
        }
    }

    fn fallback(&self, analysis: Option<TurnAnalysis>, context: &ConversationContext) -> Reply {
        let text = format!(
            "I'm sorry, something went wrong while I was preparing your answer. \
             Please try again in a moment, or reach our team on {} or at {}.",
            self.config.support_phone, self.config.support_email
        );
        let (intent, confidence, sentiment, role) = match &analysis {
            Some(a) => (a.intent.intent, a.intent.confidence, a.sentiment.clone(), a.role),
            None => (
                Intent::Unknown,
                0.0,
                SentimentResult::neutral(),
                context.user_role.unwrap_or(Role::Unknown),
            ),
        };
        Reply {
            text,
            intent,
            confidence,
            sentiment,
            role,
            flow_stage: FlowStage::Fallback,
            needs_escalation: true,
            clarifying_questions: Vec::new(),
            analysis,
        }
    }

    /// Hands the turn to the conversation logger without waiting for it.
    fn log_turn(&self, message: &str, context: &ConversationContext, outcome: &ReplyOutcome) {
        let record = TurnRecord {
            turn_id: outcome.metadata.turn_id,
            session_id: context.session_id.clone(),
            user_id: context.user_id.clone(),
            message: message.to_string(),
            response: outcome.response_text.clone(),
            intent: outcome.intent,
            confidence: outcome.confidence,
            role: outcome.role,
            flow_stage: outcome.metadata.flow_stage,
            needs_escalation: outcome.metadata.needs_escalation,
            timestamp: outcome.metadata.timestamp,
        };
        let logger = self.collaborators.logger.clone();
        tokio::spawn(async move {
            if let Err(e) = logger.record(record).await {
                warn!(error = %e, "Conversation logger failed");
            }
        });
    }
}

/// Where the turn lands in the conversation flow.
fn flow_stage_for(analysis: &TurnAnalysis) -> FlowStage {
    let intent = analysis.intent.intent;
    if analysis.assessment.needs_context {
        FlowStage::Clarification
    } else if intent == Intent::AgentRequest {
        FlowStage::Escalation
    } else if intent.is_greeting() {
        FlowStage::Greeting
    } else if matches!(intent, Intent::Gratitude | Intent::Goodbye) {
        FlowStage::Closing
    } else {
        FlowStage::Answer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> ReplyService {
        ReplyService::standard(Arc::new(AssistantConfig::default()))
    }

    #[tokio::test]
    async fn test_invalid_input_reprompts() {
        let outcome = service().respond("   ", &ConversationContext::default()).await;
        assert_eq!(outcome.response_text, INVALID_INPUT_REPLY);
        assert_eq!(outcome.metadata.flow_stage, FlowStage::InvalidInput);
        assert!(outcome.metadata.complexity.is_none());
    }

    #[tokio::test]
    async fn test_agent_request_escalates() {
        let outcome = service()
            .respond("I want to speak to a human agent", &ConversationContext::default())
            .await;
        assert_eq!(outcome.intent, Intent::AgentRequest);
        assert!(outcome.metadata.needs_escalation);
        assert_eq!(outcome.metadata.flow_stage, FlowStage::Escalation);
    }

    #[tokio::test]
    async fn test_greeting_flow_stage() {
        let outcome = service().respond("Hi", &ConversationContext::default()).await;
        assert_eq!(outcome.metadata.flow_stage, FlowStage::Greeting);
        assert!(!outcome.metadata.needs_escalation);
    }
}
