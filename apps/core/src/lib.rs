//! Reply engine of a workers' compensation customer-service assistant.
//!
//! A message and a conversation snapshot go in; a reply with intent, sentiment, role
//! and flow metadata comes out. See [`service::ReplyService`].

pub mod brain;
pub mod config;
pub mod error;
pub mod models;
pub mod reply;
pub mod service;
pub mod telemetry;

pub use config::AssistantConfig;
pub use error::AppError;
pub use models::{ConversationContext, ReplyOutcome};
pub use service::ReplyService;

#[cfg(test)]
mod tests;
