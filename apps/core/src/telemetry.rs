//! Tracing subscriber setup for the binary.

use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::{AssistantConfig, LogFormat};
use crate::error::AppError;

/// `RUST_LOG` wins; otherwise the configured level applies to this crate.
fn env_filter(config: &AssistantConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("replydesk_core={0},replydesk={0}", config.log_level)))
}

/// Installs the global subscriber. Output goes to stderr so stdout stays machine-readable.
pub fn init_tracing(config: &AssistantConfig) -> Result<(), AppError> {
    let registry = tracing_subscriber::registry().with(env_filter(config));

    let result = match config.log_format {
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).boxed())
            .try_init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .boxed(),
            )
            .try_init(),
        LogFormat::Bunyan => registry
            .with(JsonStorageLayer)
            .with(BunyanFormattingLayer::new(
                "replydesk".to_string(),
                std::io::stderr,
            ))
            .try_init(),
    };

    result.map_err(|e| AppError::Internal(format!("failed to install tracing subscriber: {}", e)))
}
