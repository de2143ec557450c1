//! Response generation.
//!
//! A reply is planned as an ordered list of blocks (acknowledgment, core answer,
//! live data, additional information, resources, sensitivity note, guidance) and then
//! rendered. Clarification turns have their own, terminal block sequence.

use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use super::post_process::{split_sentences, truncate_sentences};
use super::templates::{
    self, Requirement, TemplateFamily, TemplateLibrary, TemplateVariant, CLARIFICATION_CLOSING,
    COMPLEXITY_NOTE, ESCALATION_OFFER, EXTRA_RESOURCES, FINANCIAL_NOTE, LIVE_DATA_LEAD,
    SNIPPET_LEAD, TRAUMA_NOTE,
};
use crate::brain::analyzer::TurnAnalysis;
use crate::brain::complexity::{ComplexityLevel, ResponseLength};
use crate::brain::intent::Intent;
use crate::brain::lexicon::{tokenize, Lexicon};
use crate::brain::role::RoleDetector;
use crate::brain::sentiment::{Emotion, Intensity};
use crate::config::AssistantConfig;
use crate::error::AppError;
use crate::models::{CommunicationStyle, ConversationContext};
use crate::service::traits::{Enrichment, ReplyComposer};

/// Sentences kept from the core answer in a concise reply.
const CONCISE_CORE_SENTENCES: usize = 2;
const MAX_CLARIFYING_QUESTIONS: usize = 3;

const TRAUMA_INDICATORS: Lexicon = Lexicon::new(
    &[
        "died", "death", "killed", "fatal", "funeral", "amputated", "amputation", "paralysed",
        "paralyzed", "widow", "widowed", "orphan", "orphans",
    ],
    &["passed away", "lost my husband", "lost my wife", "lost my father", "lost my mother", "lost my leg", "lost my arm"],
);

const FINANCIAL_DISTRESS_INDICATORS: Lexicon = Lexicon::new(
    &["evicted", "eviction", "hungry", "starving", "debt", "debts", "broke"],
    &[
        "can't afford", "cannot afford", "no money", "school fees", "pay rent", "behind on rent",
        "feed my family", "feed my children",
    ],
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Acknowledgment,
    LeadIn,
    Questions,
    Closing,
    CoreAnswer,
    LiveData,
    AdditionalInfo,
    Resources,
    SensitivityNote,
    Guidance,
    ExtraResources,
    EscalationOffer,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResponseBlock {
    pub kind: BlockKind,
    pub text: String,
}

/// The chosen template and the ordered blocks of a reply.
#[derive(Debug, Clone, Serialize)]
pub struct ResponsePlan {
    pub intent: Intent,
    /// Index of the chosen variant in its family; `None` for clarification turns
    pub variant_index: Option<usize>,
    pub length: ResponseLength,
    pub blocks: Vec<ResponseBlock>,
}

impl ResponsePlan {
    pub fn has_block(&self, kind: BlockKind) -> bool {
        self.blocks.iter().any(|b| b.kind == kind)
    }

    pub fn render(&self) -> String {
        self.blocks
            .iter()
            .map(|b| b.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Per-turn values substituted into template text.
struct Slots<'a> {
    config: &'a AssistantConfig,
    name: String,
    reference: Option<String>,
    live: Option<&'a str>,
}

impl Slots<'_> {
    fn fill(&self, text: &str) -> String {
        text.replace("{identity}", &self.config.identity_phrase())
            .replace("{organization}", &self.config.organization)
            .replace("{phone}", &self.config.support_phone)
            .replace("{email}", &self.config.support_email)
            .replace("{portal}", &self.config.portal_url)
            .replace("{name}", &self.name)
            .replace(
                "{reference}",
                self.reference.as_deref().unwrap_or("your account"),
            )
            .replace("{live}", self.live.unwrap_or_default().trim_end_matches('.'))
    }
}

/// Template-driven reply composer
pub struct ResponseGenerator {
    config: Arc<AssistantConfig>,
    library: TemplateLibrary,
}

impl ResponseGenerator {
    pub fn new(config: Arc<AssistantConfig>) -> Self {
        Self::with_library(config, TemplateLibrary::new())
    }

    pub fn with_library(config: Arc<AssistantConfig>, library: TemplateLibrary) -> Self {
        Self { config, library }
    }

    /// The most specific reference known for this turn: this message first, then the session.
    fn known_reference(analysis: &TurnAnalysis, context: &ConversationContext) -> Option<String> {
        analysis
            .features
            .entities
            .primary_reference()
            .or_else(|| context.mentioned_entities.primary_reference())
            .or(context.claim_number.as_deref())
            .or(context.employer_code.as_deref())
            .map(str::to_string)
    }

    fn effective_length(analysis: &TurnAnalysis, context: &ConversationContext) -> ResponseLength {
        let recommended = analysis.complexity.recommended_length;
        match context.communication_style {
            Some(CommunicationStyle::Brief) => ResponseLength::Concise,
            Some(CommunicationStyle::Detailed) => recommended.upgraded(),
            _ => recommended,
        }
    }

    fn select_variant<'f>(
        family: &'f TemplateFamily,
        confidence: f32,
        has_reference: bool,
        has_live: bool,
        first_interaction: bool,
    ) -> Option<(usize, &'f TemplateVariant)> {
        family.variants.iter().enumerate().find(|(_, v)| {
            let requirement_met = match v.requires {
                Requirement::None => true,
                Requirement::Reference => has_reference,
                Requirement::LiveData => has_live,
                Requirement::ReturningUser => !first_interaction,
            };
            requirement_met && v.band.admits(confidence)
        })
    }

    fn sensitivity_note(analysis: &TurnAnalysis) -> Option<&'static str> {
        let tokens = tokenize(&analysis.message);
        if TRAUMA_INDICATORS.matches_any(&tokens) {
            Some(TRAUMA_NOTE)
        } else if FINANCIAL_DISTRESS_INDICATORS.matches_any(&tokens) {
            Some(FINANCIAL_NOTE)
        } else if analysis.complexity.level == ComplexityLevel::Complex {
            Some(COMPLEXITY_NOTE)
        } else {
            None
        }
    }

    fn wants_escalation_offer(analysis: &TurnAnalysis) -> bool {
        analysis.intent.intent != Intent::AgentRequest
            && analysis.sentiment.primary_emotion == Emotion::Frustrated
            && analysis.sentiment.intensity == Intensity::High
    }

    fn acknowledgment(analysis: &TurnAnalysis) -> Option<&'static str> {
        let sentiment = &analysis.sentiment;
        if sentiment.requires_empathy || sentiment.primary_emotion == Emotion::Urgent {
            templates::acknowledgment(sentiment.primary_emotion)
        } else {
            None
        }
    }

    fn plan_clarification(&self, analysis: &TurnAnalysis, slots: &Slots<'_>) -> ResponsePlan {
        let mut blocks = Vec::new();
        let opener = Self::acknowledgment(analysis).unwrap_or_else(|| {
            templates::tone_opener(RoleDetector::context_for(analysis.role).tone)
        });
        blocks.push(block(BlockKind::Acknowledgment, opener.to_string()));

        let assessment = &analysis.assessment;
        if !assessment.lead_in.is_empty() {
            blocks.push(block(BlockKind::LeadIn, assessment.lead_in.clone()));
        }
        let questions: Vec<&str> = assessment
            .clarifying_questions
            .iter()
            .map(String::as_str)
            .filter(|q| !q.trim().is_empty())
            .take(MAX_CLARIFYING_QUESTIONS)
            .collect();
        blocks.push(block(BlockKind::Questions, questions.join(" ")));
        blocks.push(block(BlockKind::Closing, CLARIFICATION_CLOSING.to_string()));

        if Self::wants_escalation_offer(analysis) {
            blocks.push(block(BlockKind::EscalationOffer, slots.fill(ESCALATION_OFFER)));
        }

        ResponsePlan {
            intent: analysis.intent.intent,
            variant_index: None,
            length: ResponseLength::Concise,
            blocks,
        }
    }

    /// Plans the reply without rendering it.
    pub fn plan(
        &self,
        analysis: &TurnAnalysis,
        context: &ConversationContext,
        enrichment: &Enrichment,
    ) -> Result<ResponsePlan, AppError> {
        let intent = analysis.intent.intent;
        let name = context
            .user_name
            .as_deref()
            .and_then(|n| n.split_whitespace().next())
            .map(|first| format!(" {}", first))
            .unwrap_or_default();
        let slots = Slots {
            config: &self.config,
            name,
            reference: Self::known_reference(analysis, context),
            live: enrichment.live.as_ref().map(|l| l.summary.as_str()),
        };

        if analysis.assessment.needs_context && !analysis.assessment.clarifying_questions.is_empty() {
            return Ok(self.plan_clarification(analysis, &slots));
        }

        let family = self.library.family(analysis.role, intent).ok_or_else(|| {
            AppError::Generation(format!(
                "no template family for role '{}' and intent '{}'",
                analysis.role, intent
            ))
        })?;
        let (variant_index, variant) = Self::select_variant(
            family,
            analysis.intent.confidence,
            slots.reference.is_some(),
            slots.live.is_some(),
            analysis.first_interaction,
        )
        .ok_or_else(|| {
            AppError::Generation(format!("no template variant applies for intent '{}'", intent))
        })?;

        let length = Self::effective_length(analysis, context);
        let core = slots.fill(variant.text);
        let mut blocks = Vec::new();

        if intent.is_short_form() {
            blocks.push(block(BlockKind::CoreAnswer, core));
            return Ok(ResponsePlan {
                intent,
                variant_index: Some(variant_index),
                length,
                blocks,
            });
        }

        if let Some(ack) = Self::acknowledgment(analysis) {
            blocks.push(block(BlockKind::Acknowledgment, ack.to_string()));
        }

        let core = if length == ResponseLength::Concise {
            truncate_sentences(&core, CONCISE_CORE_SENTENCES)
        } else {
            core
        };
        blocks.push(block(BlockKind::CoreAnswer, core));

        if intent != Intent::AgentRequest {
            if let Some(live) = &enrichment.live {
                if variant.requires != Requirement::LiveData {
                    blocks.push(block(
                        BlockKind::LiveData,
                        format!("{} {}", LIVE_DATA_LEAD, ensure_period(&live.summary)),
                    ));
                }
            }

            let best_snippet = enrichment
                .snippets
                .iter()
                .filter(|s| s.relevance >= self.config.snippet_min_relevance)
                .max_by(|a, b| {
                    a.relevance
                        .partial_cmp(&b.relevance)
                        .unwrap_or(std::cmp::Ordering::Equal)
                });
            if let Some(snippet) = best_snippet {
                blocks.push(block(
                    BlockKind::AdditionalInfo,
                    format!("{} {}", SNIPPET_LEAD, ensure_period(&snippet.title)),
                ));
            }

            if let Some(resources) = self.library.resources(intent) {
                blocks.push(block(BlockKind::Resources, slots.fill(resources)));
            }

            if let Some(note) = Self::sensitivity_note(analysis) {
                blocks.push(block(BlockKind::SensitivityNote, slots.fill(note)));
            }

            if matches!(length, ResponseLength::Detailed | ResponseLength::Comprehensive) {
                let guidance = RoleDetector::context_for(analysis.role).guidance;
                blocks.push(block(BlockKind::Guidance, guidance.to_string()));
            }
            if length == ResponseLength::Comprehensive {
                blocks.push(block(BlockKind::ExtraResources, slots.fill(EXTRA_RESOURCES)));
            }
        }

        if Self::wants_escalation_offer(analysis) {
            blocks.push(block(BlockKind::EscalationOffer, slots.fill(ESCALATION_OFFER)));
        }

        debug!(
            intent = %intent,
            variant = variant_index,
            length = ?length,
            blocks = blocks.len(),
            "Reply planned"
        );

        Ok(ResponsePlan {
            intent,
            variant_index: Some(variant_index),
            length,
            blocks,
        })
    }

    pub fn generate(
        &self,
        analysis: &TurnAnalysis,
        context: &ConversationContext,
        enrichment: &Enrichment,
    ) -> Result<String, AppError> {
        let text = self.plan(analysis, context, enrichment)?.render();
        if split_sentences(&text).is_empty() {
            return Err(AppError::Generation("generated reply is empty".to_string()));
        }
        Ok(text)
    }
}

impl ReplyComposer for ResponseGenerator {
    fn compose(
        &self,
        analysis: &TurnAnalysis,
        context: &ConversationContext,
        enrichment: &Enrichment,
    ) -> Result<String, AppError> {
        self.generate(analysis, context, enrichment)
    }
}

fn block(kind: BlockKind, text: String) -> ResponseBlock {
    ResponseBlock { kind, text }
}

fn ensure_period(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.ends_with(['.', '!', '?']) {
        trimmed.to_string()
    } else {
        format!("{}.", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brain::analyzer::BrainAnalyzer;
    use crate::brain::role::Role;
    use crate::service::traits::{KnowledgeSnippet, LiveRecord};

    fn generator() -> ResponseGenerator {
        ResponseGenerator::new(Arc::new(AssistantConfig::default()))
    }

    fn analyze(message: &str, context: &ConversationContext) -> TurnAnalysis {
        BrainAnalyzer::new().analyze(message, context, None)
    }

    #[test]
    fn test_simple_greeting_reply() {
        let context = ConversationContext::default();
        let analysis = analyze("Hi", &context);
        let text = generator().generate(&analysis, &context, &Enrichment::default()).unwrap();
        assert!(text.contains("I'm Ava, the WCF virtual assistant"));
        assert!(!text.contains('?'));
        assert!(text.split_whitespace().count() <= 35);
    }

    #[test]
    fn test_returning_user_greeting_uses_name() {
        let mut context = ConversationContext {
            user_name: Some("Amina Juma".to_string()),
            ..Default::default()
        };
        context.conversation_history.push(crate::models::Turn {
            user_message: "earlier".to_string(),
            response: "ok".to_string(),
            intent: Intent::Unknown,
            flow_stage: crate::models::FlowStage::Answer,
            timestamp: chrono::Utc::now(),
        });
        let analysis = analyze("Hello", &context);
        let text = generator().generate(&analysis, &context, &Enrichment::default()).unwrap();
        assert!(text.starts_with("Welcome back Amina!"));
    }

    #[test]
    fn test_clarification_reply_asks_for_reference() {
        let context = ConversationContext::default();
        let analysis = analyze("What's going on with my claim", &context);
        let plan = generator().plan(&analysis, &context, &Enrichment::default()).unwrap();
        assert!(plan.variant_index.is_none());
        assert!(plan.has_block(BlockKind::Questions));
        assert!(plan.render().contains("claim reference number"));
    }

    #[test]
    fn test_specific_claim_status_echoes_reference() {
        let context = ConversationContext::default();
        let analysis = analyze("Check claim WC-2024-001234 status", &context);
        let text = generator().generate(&analysis, &context, &Enrichment::default()).unwrap();
        assert!(text.contains("WC-2024-001234"));
    }

    #[test]
    fn test_live_data_variant_is_preferred() {
        let context = ConversationContext::default();
        let analysis = analyze("Check claim WC-2024-001234 status", &context);
        let enrichment = Enrichment {
            snippets: vec![],
            live: Some(LiveRecord {
                summary: "medical review completed on 2 May, payment approved".to_string(),
                data: serde_json::Value::Null,
            }),
        };
        let plan = generator().plan(&analysis, &context, &enrichment).unwrap();
        assert_eq!(plan.variant_index, Some(0));
        assert!(!plan.has_block(BlockKind::LiveData));
        assert!(plan.render().contains("payment approved"));
    }

    #[test]
    fn test_frustrated_reply_opens_with_acknowledgment() {
        let context = ConversationContext::default();
        let analysis = analyze("This is ridiculous, nobody is helping me!", &context);
        let plan = generator().plan(&analysis, &context, &Enrichment::default()).unwrap();
        assert_eq!(plan.blocks[0].kind, BlockKind::Acknowledgment);
        assert!(plan.blocks[0].text.starts_with("I'm really sorry"));
        assert!(plan.has_block(BlockKind::EscalationOffer));
    }

    #[test]
    fn test_snippet_below_threshold_is_ignored() {
        let context = ConversationContext {
            user_role: Some(Role::Employer),
            ..Default::default()
        };
        let analysis = analyze("I want to register my company as an employer", &context);
        let mut enrichment = Enrichment {
            snippets: vec![KnowledgeSnippet {
                title: "Employer registration checklist".to_string(),
                relevance: 0.1,
            }],
            live: None,
        };
        let plan = generator().plan(&analysis, &context, &enrichment).unwrap();
        assert!(!plan.has_block(BlockKind::AdditionalInfo));

        enrichment.snippets[0].relevance = 0.9;
        let plan = generator().plan(&analysis, &context, &enrichment).unwrap();
        assert!(plan.render().contains("Employer registration checklist."));
    }

    #[test]
    fn test_brief_style_trims_core_answer() {
        let context = ConversationContext {
            user_role: Some(Role::Employer),
            communication_style: Some(CommunicationStyle::Brief),
            ..Default::default()
        };
        let analysis = analyze("I want to register my company as an employer", &context);
        let plan = generator().plan(&analysis, &context, &Enrichment::default()).unwrap();
        assert_eq!(plan.length, ResponseLength::Concise);
        let core = plan.blocks.iter().find(|b| b.kind == BlockKind::CoreAnswer).unwrap();
        assert_eq!(split_sentences(&core.text).len(), 2);
        assert!(!plan.has_block(BlockKind::Guidance));
    }

    #[test]
    fn test_employer_registration_gets_guidance() {
        let context = ConversationContext {
            user_role: Some(Role::Employer),
            ..Default::default()
        };
        let analysis = analyze("I want to register my company as an employer", &context);
        let plan = generator().plan(&analysis, &context, &Enrichment::default()).unwrap();
        assert!(plan.has_block(BlockKind::Guidance));
    }

    #[test]
    fn test_trauma_message_gets_sensitivity_note() {
        let context = ConversationContext::default();
        let analysis = analyze(
            "My husband died in an accident at work, how do I claim compensation as his widow",
            &context,
        );
        let plan = generator().plan(&analysis, &context, &Enrichment::default()).unwrap();
        assert!(plan.has_block(BlockKind::SensitivityNote));
    }

    #[test]
    fn test_missing_family_is_generation_error() {
        static NONE: &[TemplateFamily] = &[];
        let generator = ResponseGenerator::with_library(
            Arc::new(AssistantConfig::default()),
            TemplateLibrary::with_families(NONE),
        );
        let context = ConversationContext::default();
        let analysis = analyze("Check claim WC-2024-001234 status", &context);
        let err = generator.generate(&analysis, &context, &Enrichment::default()).unwrap_err();
        assert!(matches!(err, AppError::Generation(_)));
    }
}
