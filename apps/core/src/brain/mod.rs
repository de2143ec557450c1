//! # Brain Module
//!
//! Fast, rule-based analysis of one customer message.
//!
//! ## Components
//! - `input_guard`: rejects empty, oversized and unsafe input
//! - `lexicon`: tokenization and immutable keyword/phrase tables
//! - `features`: reference numbers, dates, amounts and specificity signals
//! - `sentiment`: emotional tone with intensity
//! - `intent`: intent classification with a simple-greeting fast path
//! - `role`: persona detection
//! - `complexity`: complexity score and length/detail recommendation
//! - `sufficiency`: answer now or ask a clarifying question
//! - `keywords`: content words ranked by frequency and term weight, for knowledge search
//! - `analyzer`: main orchestrator

pub mod analyzer;
pub mod complexity;
pub mod features;
pub mod input_guard;
pub mod intent;
pub mod keywords;
pub mod lexicon;
pub mod role;
pub mod sentiment;
pub mod sufficiency;

pub use analyzer::{BrainAnalyzer, TurnAnalysis};
pub use complexity::{ComplexityAnalyzer, ComplexityLevel, ComplexityResult, DetailLevel, ResponseLength};
pub use input_guard::{InputGuard, InvalidInput};
pub use keywords::{KeywordExtractor, KeywordResult};
pub use intent::{Intent, IntentClassifier, IntentResult};
pub use role::{Role, RoleContext, RoleDetector};
pub use sentiment::{Emotion, Intensity, SentimentAnalyzer, SentimentResult};
pub use sufficiency::{ContextAssessment, ContextAssessor, ContextType};
