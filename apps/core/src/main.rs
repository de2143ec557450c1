// Replydesk demo entry point
// One message per stdin line in, one JSON reply per stdout line out.

use anyhow::Context;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};
use uuid::Uuid;

use replydesk_core::config::AssistantConfig;
use replydesk_core::models::ConversationContext;
use replydesk_core::service::{
    CachedRoleResolver, Collaborators, ConversationLogger, KeywordKnowledgeBase,
    ProfileDirectory, ReplyService, RoleResolver, TracingConversationLogger, TranscriptLogger,
};
use replydesk_core::telemetry;

const PROFILES_ENV: &str = "REPLYDESK_PROFILES";
const USER_ENV: &str = "REPLYDESK_USER_ID";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Arc::new(AssistantConfig::from_env().context("loading configuration")?);
    telemetry::init_tracing(&config)?;

    let role_resolver: Arc<dyn RoleResolver> = match std::env::var(PROFILES_ENV) {
        Ok(path) if !path.trim().is_empty() => {
            let directory = ProfileDirectory::from_json_file(&PathBuf::from(path.trim()))
                .await
                .with_context(|| format!("loading profiles from {}", path))?;
            Arc::new(CachedRoleResolver::new(Arc::new(directory)))
        }
        _ => Arc::new(ProfileDirectory::default()),
    };

    let logger: Arc<dyn ConversationLogger> = match &config.transcript_path {
        Some(path) => Arc::new(TranscriptLogger::new(path, config.transcript_max_records)),
        None => Arc::new(TracingConversationLogger),
    };

    let service = ReplyService::standard(config.clone()).with_collaborators(Collaborators {
        role_resolver,
        knowledge: Arc::new(KeywordKnowledgeBase::default()),
        logger,
        ..Collaborators::default()
    });

    let mut context = ConversationContext::new(Uuid::new_v4().to_string());
    context.user_id = std::env::var(USER_ENV).ok().filter(|id| !id.trim().is_empty());

    info!(
        session_id = ?context.session_id,
        assistant = %config.assistant_name,
        "Session started, reading messages from stdin"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    while let Some(line) = lines.next_line().await? {
        let outcome = service.respond(&line, &context).await;
        match serde_json::to_string(&outcome) {
            Ok(json) => {
                stdout.write_all(json.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
                stdout.flush().await?;
            }
            Err(e) => warn!(error = %e, "Could not serialize reply"),
        }
        context.record_turn(&line, &outcome, config.history_limit);
    }

    info!(turns = context.conversation_history.len(), "Session ended");
    Ok(())
}
