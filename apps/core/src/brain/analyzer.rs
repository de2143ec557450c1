//! Brain Analyzer - Main orchestrator for the Brain module.
//!
//! Runs sentiment, intent, role, complexity and context sufficiency over one message
//! and assembles their results into a [`TurnAnalysis`]. Each stage returns its own
//! result; nothing is written back into the conversation context.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use super::complexity::{ComplexityAnalyzer, ComplexityResult};
use super::features::MessageFeatures;
use super::intent::{IntentClassifier, IntentResult};
use super::role::{Role, RoleDetector};
use super::sentiment::{SentimentAnalyzer, SentimentResult};
use super::sufficiency::{ContextAssessment, ContextAssessor};
use crate::error::AppError;
use crate::models::ConversationContext;
use crate::service::traits::TurnAnalyzer;

/// Everything the analysis stages found out about one message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnAnalysis {
    /// Original user message
    pub message: String,
    pub intent: IntentResult,
    pub sentiment: SentimentResult,
    pub role: Role,
    pub complexity: ComplexityResult,
    pub assessment: ContextAssessment,
    /// Lexical features shared by complexity and sufficiency
    pub features: MessageFeatures,
    /// No earlier turns in this session
    pub first_interaction: bool,
    pub processing_time_ms: u64,
    pub timestamp: DateTime<Utc>,
}

/// Main Brain analyzer that orchestrates all analysis components
pub struct BrainAnalyzer {
    sentiment_analyzer: SentimentAnalyzer,
    intent_classifier: IntentClassifier,
    role_detector: RoleDetector,
    complexity_analyzer: ComplexityAnalyzer,
    context_assessor: ContextAssessor,
}

impl Default for BrainAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl BrainAnalyzer {
    pub fn new() -> Self {
        Self {
            sentiment_analyzer: SentimentAnalyzer::new(),
            intent_classifier: IntentClassifier::new(),
            role_detector: RoleDetector::new(),
            complexity_analyzer: ComplexityAnalyzer::new(),
            context_assessor: ContextAssessor::new(),
        }
    }

    /// Analyze a message against a read-only snapshot of the conversation.
    ///
    /// `resolved_role` is the role returned by the identity lookup, if any.
    pub fn analyze(
        &self,
        message: &str,
        context: &ConversationContext,
        resolved_role: Option<Role>,
    ) -> TurnAnalysis {
        let start = Instant::now();

        let features = MessageFeatures::extract(message);
        let sentiment = self.sentiment_analyzer.analyze(message);
        let intent = self.intent_classifier.classify(message);
        let role = self.role_detector.detect(context, message, resolved_role);
        let complexity =
            self.complexity_analyzer
                .analyze_with_features(message, &features, intent.intent, role);
        let assessment = self.context_assessor.assess_with_features(&features, &intent);

        debug!(
            intent = %intent.intent,
            confidence = intent.confidence,
            emotion = %sentiment.primary_emotion,
            role = %role,
            complexity = ?complexity.level,
            needs_context = assessment.needs_context,
            specificity = assessment.specificity_score,
            "Turn analyzed"
        );

        TurnAnalysis {
            message: message.to_string(),
            intent,
            sentiment,
            role,
            complexity,
            assessment,
            features,
            first_interaction: context.is_first_interaction(),
            processing_time_ms: start.elapsed().as_millis() as u64,
            timestamp: Utc::now(),
        }
    }
}

impl TurnAnalyzer for BrainAnalyzer {
    fn analyze_turn(
        &self,
        message: &str,
        context: &ConversationContext,
        resolved_role: Option<Role>,
    ) -> Result<TurnAnalysis, AppError> {
        Ok(self.analyze(message, context, resolved_role))
    }
}
