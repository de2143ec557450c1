//! Seams of the reply service.
//!
//! Collaborators are the external systems the engine calls but does not own. They are
//! async and fallible; the service wraps every call in a timeout and degrades a
//! failure to "no enrichment". The pipeline stages are synchronous and fallible so
//! that a failing stage can be swapped in under test.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::brain::analyzer::TurnAnalysis;
use crate::brain::intent::Intent;
use crate::brain::role::Role;
use crate::error::AppError;
use crate::models::{ConversationContext, FlowStage};

/// What the identity lookup knows about a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: String,
    pub role: Role,
    #[serde(default)]
    pub display_name: Option<String>,
    /// Free-form profile fields (employer code, region, ...)
    #[serde(default)]
    pub fields: HashMap<String, String>,
}

/// A knowledge-base hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeSnippet {
    pub title: String,
    /// Relevance in [0, 1]
    pub relevance: f32,
}

/// Account-specific facts for the current user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveRecord {
    /// One sentence fit for quoting in a reply
    pub summary: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// What the conversation logger receives for each turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnRecord {
    pub turn_id: Uuid,
    pub session_id: Option<String>,
    pub user_id: Option<String>,
    pub message: String,
    pub response: String,
    pub intent: Intent,
    pub confidence: f32,
    pub role: Role,
    pub flow_stage: FlowStage,
    pub needs_escalation: bool,
    pub timestamp: DateTime<Utc>,
}

/// Resolves a user identifier to a profile.
#[async_trait]
pub trait RoleResolver: Send + Sync + 'static {
    /// `Ok(None)` means the user is unknown, which is not an error.
    async fn lookup(&self, user_id: &str) -> Result<Option<UserProfile>, AppError>;
}

/// Best-effort knowledge search.
#[async_trait]
pub trait KnowledgeSearch: Send + Sync + 'static {
    /// Snippets ordered by relevance, highest first. An empty list is a valid answer.
    async fn search(&self, message: &str, intent: Intent) -> Result<Vec<KnowledgeSnippet>, AppError>;
}

/// Account-specific data (claim or payment status).
#[async_trait]
pub trait LiveDataSource: Send + Sync + 'static {
    async fn fetch(&self, intent: Intent, user_id: &str) -> Result<Option<LiveRecord>, AppError>;
}

/// Receives every finished turn. Called fire-and-forget.
#[async_trait]
pub trait ConversationLogger: Send + Sync + 'static {
    async fn record(&self, turn: TurnRecord) -> Result<(), AppError>;
}

/// Knowledge snippets and live data fetched for one turn.
#[derive(Debug, Clone, Default)]
pub struct Enrichment {
    pub snippets: Vec<KnowledgeSnippet>,
    pub live: Option<LiveRecord>,
}

/// Runs the analysis stages over a message.
pub trait TurnAnalyzer: Send + Sync + 'static {
    fn analyze_turn(
        &self,
        message: &str,
        context: &ConversationContext,
        resolved_role: Option<Role>,
    ) -> Result<TurnAnalysis, AppError>;
}

/// Composes the draft reply.
pub trait ReplyComposer: Send + Sync + 'static {
    fn compose(
        &self,
        analysis: &TurnAnalysis,
        context: &ConversationContext,
        enrichment: &Enrichment,
    ) -> Result<String, AppError>;
}

/// Adjusts the draft for length, grammar and persona.
pub trait ReplyFinalizer: Send + Sync + 'static {
    fn finalize(
        &self,
        response: &str,
        intent: Intent,
        message: &str,
        first_interaction: bool,
    ) -> Result<String, AppError>;

    /// Like [`finalize`](Self::finalize), but returns the draft unchanged on failure.
    fn finalize_or_original(
        &self,
        response: &str,
        intent: Intent,
        message: &str,
        first_interaction: bool,
    ) -> String {
        match self.finalize(response, intent, message, first_interaction) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, intent = %intent, "Post-processing failed, using draft");
                response.to_string()
            }
        }
    }
}

/// Collaborator that is never available. Used when a deployment has no such system.
#[derive(Debug, Clone, Copy, Default)]
pub struct Null;

#[async_trait]
impl RoleResolver for Null {
    async fn lookup(&self, _user_id: &str) -> Result<Option<UserProfile>, AppError> {
        Ok(None)
    }
}

#[async_trait]
impl KnowledgeSearch for Null {
    async fn search(&self, _message: &str, _intent: Intent) -> Result<Vec<KnowledgeSnippet>, AppError> {
        Ok(vec![])
    }
}

#[async_trait]
impl LiveDataSource for Null {
    async fn fetch(&self, _intent: Intent, _user_id: &str) -> Result<Option<LiveRecord>, AppError> {
        Ok(None)
    }
}

#[async_trait]
impl ConversationLogger for Null {
    async fn record(&self, _turn: TurnRecord) -> Result<(), AppError> {
        Ok(())
    }
}
