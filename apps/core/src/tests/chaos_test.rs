//! Chaos Tests
//!
//! Failing stages, slow or broken collaborators and concurrent load.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, Duration};

use super::CORPUS;
use crate::brain::{BrainAnalyzer, Intent, Role, TurnAnalysis};
use crate::config::AssistantConfig;
use crate::error::AppError;
use crate::models::{ConversationContext, FlowStage};
use crate::reply::{PostProcessor, ResponseGenerator};
use crate::service::{
    Collaborators, ConversationLogger, Enrichment, KnowledgeSearch, KnowledgeSnippet,
    LiveDataSource, LiveRecord, ReplyComposer, ReplyFinalizer, ReplyService, RoleResolver,
    TurnAnalyzer, TurnRecord, UserProfile,
};

// --- Mock Components ---

struct MockCollaborator {
    delay_ms: u64,
    should_fail: bool,
    request_count: Arc<AtomicUsize>,
}

impl MockCollaborator {
    fn new(delay_ms: u64, should_fail: bool) -> Self {
        Self {
            delay_ms,
            should_fail,
            request_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    async fn call(&self, name: &'static str) -> Result<(), AppError> {
        self.request_count.fetch_add(1, Ordering::SeqCst);
        sleep(Duration::from_millis(self.delay_ms)).await;
        if self.should_fail {
            return Err(AppError::collaborator(name, "simulated outage"));
        }
        Ok(())
    }
}

#[async_trait]
impl RoleResolver for MockCollaborator {
    async fn lookup(&self, user_id: &str) -> Result<Option<UserProfile>, AppError> {
        self.call("role_resolver").await?;
        Ok(Some(UserProfile {
            user_id: user_id.to_string(),
            role: Role::Staff,
            display_name: None,
            fields: Default::default(),
        }))
    }
}

#[async_trait]
impl KnowledgeSearch for MockCollaborator {
    async fn search(&self, _message: &str, _intent: Intent) -> Result<Vec<KnowledgeSnippet>, AppError> {
        self.call("knowledge_search").await?;
        Ok(vec![KnowledgeSnippet {
            title: "Slow snippet".to_string(),
            relevance: 0.9,
        }])
    }
}

#[async_trait]
impl LiveDataSource for MockCollaborator {
    async fn fetch(&self, _intent: Intent, _user_id: &str) -> Result<Option<LiveRecord>, AppError> {
        self.call("live_data").await?;
        Ok(Some(LiveRecord {
            summary: "slow live record".to_string(),
            data: serde_json::Value::Null,
        }))
    }
}

#[async_trait]
impl ConversationLogger for MockCollaborator {
    async fn record(&self, _turn: TurnRecord) -> Result<(), AppError> {
        self.call("conversation_logger").await
    }
}

struct FailingAnalyzer;

impl TurnAnalyzer for FailingAnalyzer {
    fn analyze_turn(
        &self,
        _message: &str,
        _context: &ConversationContext,
        _resolved_role: Option<Role>,
    ) -> Result<TurnAnalysis, AppError> {
        Err(AppError::Internal("Simulated analysis failure".to_string()))
    }
}

struct FailingComposer;

impl ReplyComposer for FailingComposer {
    fn compose(
        &self,
        _analysis: &TurnAnalysis,
        _context: &ConversationContext,
        _enrichment: &Enrichment,
    ) -> Result<String, AppError> {
        Err(AppError::Generation("Simulated template failure".to_string()))
    }
}

struct FixedComposer;

impl ReplyComposer for FixedComposer {
    fn compose(
        &self,
        _analysis: &TurnAnalysis,
        _context: &ConversationContext,
        _enrichment: &Enrichment,
    ) -> Result<String, AppError> {
        Ok("draft straight from the composer".to_string())
    }
}

struct FailingFinalizer;

impl ReplyFinalizer for FailingFinalizer {
    fn finalize(&self, _: &str, _: Intent, _: &str, _: bool) -> Result<String, AppError> {
        Err(AppError::PostProcessing("Simulated post-processing failure".to_string()))
    }
}

fn config() -> Arc<AssistantConfig> {
    Arc::new(AssistantConfig {
        collaborator_timeout_ms: 50,
        ..AssistantConfig::default()
    })
}

fn known_user() -> ConversationContext {
    ConversationContext {
        user_id: Some("u-1".to_string()),
        ..ConversationContext::new("s-chaos")
    }
}

fn assert_fallback(text: &str) {
    assert!(text.contains("0800 110 028"), "no phone in fallback: {}", text);
    assert!(text.contains("support@wcf.example.org"), "no email in fallback: {}", text);
}

// --- Failing stages ---

#[tokio::test]
async fn test_chaos_analysis_failure_degrades_to_fallback() {
    let config = config();
    let service = ReplyService::new(
        config.clone(),
        FailingAnalyzer,
        ResponseGenerator::new(config.clone()),
        PostProcessor::new(config),
    );

    for message in CORPUS {
        let outcome = service.respond(message, &ConversationContext::default()).await;
        assert_fallback(&outcome.response_text);
        assert_eq!(outcome.metadata.flow_stage, FlowStage::Fallback);
        assert!(outcome.metadata.needs_escalation);
        assert_eq!(outcome.intent, Intent::Unknown);
    }
}

#[tokio::test]
async fn test_chaos_generation_failure_keeps_analysis() {
    let config = config();
    let service = ReplyService::new(
        config.clone(),
        BrainAnalyzer::new(),
        FailingComposer,
        PostProcessor::new(config),
    );

    let outcome = service
        .respond("Check claim WC-2024-001234 status", &ConversationContext::default())
        .await;
    assert_fallback(&outcome.response_text);
    assert_eq!(outcome.metadata.flow_stage, FlowStage::Fallback);
    assert!(outcome.metadata.needs_escalation);
    assert_eq!(outcome.intent, Intent::ClaimStatus);
    assert_eq!(outcome.metadata.entities.claim_numbers, vec!["WC-2024-001234"]);
}

#[tokio::test]
async fn test_chaos_post_processing_failure_returns_draft() {
    let config = config();
    let service = ReplyService::new(
        config.clone(),
        BrainAnalyzer::new(),
        FixedComposer,
        FailingFinalizer,
    );

    let outcome = service.respond("I need a copy of my compliance certificate", &ConversationContext::default()).await;
    assert_eq!(outcome.response_text, "draft straight from the composer");
    assert_ne!(outcome.metadata.flow_stage, FlowStage::Fallback);
}

// --- Collaborators ---

#[tokio::test]
async fn test_chaos_slow_collaborators_time_out() {
    let slow = Arc::new(MockCollaborator::new(1_000, false));
    let service = ReplyService::standard(config()).with_collaborators(Collaborators {
        role_resolver: slow.clone(),
        knowledge: slow.clone(),
        live_data: slow.clone(),
        logger: slow.clone(),
    });

    let start = Instant::now();
    let outcome = service.respond("Check claim WC-2024-001234 status", &known_user()).await;
    let elapsed = start.elapsed();

    // Role lookup, then search and live data in parallel: two timeouts at most.
    assert!(elapsed < Duration::from_millis(600), "took {:?}", elapsed);
    assert!(outcome.response_text.contains("WC-2024-001234"));
    assert!(!outcome.response_text.contains("slow live record"));
    assert_ne!(outcome.role, Role::Staff);
    assert_ne!(outcome.metadata.flow_stage, FlowStage::Fallback);
}

#[tokio::test]
async fn test_chaos_failing_collaborators_are_ignored() {
    let failing = Arc::new(MockCollaborator::new(0, true));
    let service = ReplyService::standard(config()).with_collaborators(Collaborators {
        role_resolver: failing.clone(),
        knowledge: failing.clone(),
        live_data: failing.clone(),
        logger: failing.clone(),
    });

    for message in CORPUS {
        let outcome = service.respond(message, &known_user()).await;
        assert_ne!(outcome.metadata.flow_stage, FlowStage::Fallback, "for '{}'", message);
        assert!(!outcome.response_text.is_empty());
    }
    assert!(failing.request_count.load(Ordering::SeqCst) >= CORPUS.len());
}

#[tokio::test]
async fn test_chaos_fast_collaborators_are_used() {
    let fast = Arc::new(MockCollaborator::new(0, false));
    let service = ReplyService::standard(config()).with_collaborators(Collaborators {
        role_resolver: fast.clone(),
        knowledge: fast.clone(),
        live_data: fast.clone(),
        logger: fast.clone(),
    });

    let outcome = service.respond("Check claim WC-2024-001234 status", &known_user()).await;
    assert_eq!(outcome.role, Role::Staff);
    assert!(outcome.response_text.contains("slow live record"));
}

// --- Concurrency ---

#[tokio::test]
async fn test_chaos_concurrent_requests() {
    let service = Arc::new(
        ReplyService::standard(config()).with_collaborators(Collaborators {
            knowledge: Arc::new(MockCollaborator::new(20, false)),
            ..Collaborators::default()
        }),
    );

    let mut handles = Vec::new();
    for i in 0..50 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            let message = CORPUS[i % CORPUS.len()];
            let context = ConversationContext::new(format!("session-{}", i));
            (message, service.respond(message, &context).await)
        }));
    }

    let mut turn_ids = std::collections::HashSet::new();
    for result in futures::future::join_all(handles).await {
        let (message, outcome) = result.expect("task panicked");
        assert!(!outcome.response_text.is_empty(), "empty reply for '{}'", message);
        assert_ne!(outcome.metadata.flow_stage, FlowStage::Fallback);
        turn_ids.insert(outcome.metadata.turn_id);
    }
    assert_eq!(turn_ids.len(), 50);
}
