//! Assistant configuration.
//!
//! Loaded from `REPLYDESK_*` environment variables (an optional `.env` file is read
//! first). Every value has a default so an empty environment yields a working setup.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use validator::Validate;

use crate::error::AppError;

const ENV_PREFIX: &str = "REPLYDESK_";

/// Output format of the tracing subscriber installed by the binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable multi-line output
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
    /// Bunyan-compatible JSON
    Bunyan,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            "bunyan" => Ok(LogFormat::Bunyan),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LogFormat::Pretty => "pretty",
            LogFormat::Json => "json",
            LogFormat::Bunyan => "bunyan",
        };
        write!(f, "{}", label)
    }
}

/// Runtime configuration of the reply engine.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AssistantConfig {
    /// Name the assistant introduces itself with.
    #[validate(length(min = 1, max = 40))]
    pub assistant_name: String,
    /// Organization name, also used for casing normalization.
    #[validate(length(min = 1, max = 60))]
    pub organization: String,
    #[validate(length(min = 3))]
    pub support_phone: String,
    #[validate(email)]
    pub support_email: String,
    #[validate(url)]
    pub portal_url: String,
    /// Maximum accepted message length, in characters.
    #[validate(range(min = 20, max = 10000))]
    pub max_message_chars: usize,
    /// Number of prior turns kept in a conversation context.
    #[validate(range(min = 1, max = 200))]
    pub history_limit: usize,
    /// Word budget for greeting, gratitude and goodbye replies.
    #[validate(range(min = 10, max = 200))]
    pub short_form_word_budget: usize,
    /// Word budget for every other reply.
    #[validate(range(min = 40, max = 1000))]
    pub substantive_word_budget: usize,
    #[validate(range(min = 10, max = 60000))]
    pub collaborator_timeout_ms: u64,
    /// Knowledge snippets below this relevance are ignored.
    #[validate(range(min = 0.0, max = 1.0))]
    pub snippet_min_relevance: f32,
    pub log_format: LogFormat,
    #[validate(length(min = 1))]
    pub log_level: String,
    /// When set, every turn is appended to this JSON-lines transcript.
    pub transcript_path: Option<PathBuf>,
    #[validate(range(min = 1, max = 100000))]
    pub transcript_max_records: usize,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            assistant_name: "Ava".to_string(),
            organization: "WCF".to_string(),
            support_phone: "0800 110 028".to_string(),
            support_email: "support@wcf.example.org".to_string(),
            portal_url: "https://eservices.wcf.example.org".to_string(),
            max_message_chars: 500,
            history_limit: 10,
            short_form_word_budget: 35,
            substantive_word_budget: 140,
            collaborator_timeout_ms: 800,
            snippet_min_relevance: 0.3,
            log_format: LogFormat::Pretty,
            log_level: "info".to_string(),
            transcript_path: None,
            transcript_max_records: 500,
        }
    }
}

impl AssistantConfig {
    /// Loads the configuration from the process environment (after reading `.env`).
    pub fn from_env() -> Result<Self, AppError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads the configuration from an arbitrary key lookup and validates it.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));

        let config = Self {
            assistant_name: get("ASSISTANT_NAME").unwrap_or(defaults.assistant_name),
            organization: get("ORGANIZATION").unwrap_or(defaults.organization),
            support_phone: get("SUPPORT_PHONE").unwrap_or(defaults.support_phone),
            support_email: get("SUPPORT_EMAIL").unwrap_or(defaults.support_email),
            portal_url: get("PORTAL_URL").unwrap_or(defaults.portal_url),
            max_message_chars: parse_or(&get, "MAX_MESSAGE_CHARS", defaults.max_message_chars)?,
            history_limit: parse_or(&get, "HISTORY_LIMIT", defaults.history_limit)?,
            short_form_word_budget: parse_or(
                &get,
                "SHORT_FORM_WORD_BUDGET",
                defaults.short_form_word_budget,
            )?,
            substantive_word_budget: parse_or(
                &get,
                "SUBSTANTIVE_WORD_BUDGET",
                defaults.substantive_word_budget,
            )?,
            collaborator_timeout_ms: parse_or(
                &get,
                "COLLABORATOR_TIMEOUT_MS",
                defaults.collaborator_timeout_ms,
            )?,
            snippet_min_relevance: parse_or(
                &get,
                "SNIPPET_MIN_RELEVANCE",
                defaults.snippet_min_relevance,
            )?,
            log_format: parse_or(&get, "LOG_FORMAT", defaults.log_format)?,
            log_level: get("LOG_LEVEL").unwrap_or(defaults.log_level),
            transcript_path: get("TRANSCRIPT_PATH")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            transcript_max_records: parse_or(
                &get,
                "TRANSCRIPT_MAX_RECORDS",
                defaults.transcript_max_records,
            )?,
        };

        config.validate()?;
        Ok(config)
    }

    /// The fixed phrase the assistant introduces itself with.
    pub fn identity_phrase(&self) -> String {
        format!(
            "I'm {}, the {} virtual assistant",
            self.assistant_name, self.organization
        )
    }

    pub fn collaborator_timeout(&self) -> Duration {
        Duration::from_millis(self.collaborator_timeout_ms)
    }
}

fn parse_or<T, G>(get: &G, name: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(name) {
        Some(raw) if !raw.trim().is_empty() => raw.trim().parse::<T>().map_err(|e| {
            AppError::Config(format!("{}{}='{}': {}", ENV_PREFIX, name, raw, e))
        }),
        _ => Ok(default),
    }
}
