//! Test Module
//!
//! Cross-module suites for the reply engine.
//!
//! ## Test Categories
//! - `brain_tests`: determinism, confidence bounds, validation, sentiment, sufficiency
//! - `reply_tests`: generator and post-processor together (budgets, persona)
//! - `service_tests`: end-to-end scenarios through `ReplyService` with collaborators
//! - `chaos_test`: failing stages, slow and failing collaborators, concurrency

pub mod chaos_test;

/// Messages covering every intent plus vague, noisy and emotional variants.
pub(crate) const CORPUS: &[&str] = &[
    "Hi",
    "Hello there",
    "Hello, how are you today?",
    "Thank you so much",
    "Thanks, bye",
    "Goodbye, have a nice day",
    "I want to speak to a human agent",
    "This is ridiculous, nobody is helping me!",
    "I want to make a complaint about the rude officer at your Arusha branch on 3 March",
    "I want to file a claim",
    "I slipped on a wet floor yesterday and hurt my back",
    "My husband died in an accident at work, how do I claim compensation as his widow",
    "What's going on with my claim",
    "Check claim WC-2024-001234 status",
    "I'm not sure what's going on with my claim",
    "I have not been paid this month",
    "When will my monthly pension payment arrive?",
    "I want to register my company as an employer",
    "How do I pay contributions for 45 employees and what is the late payment penalty?",
    "I need a copy of my compliance certificate",
    "I can't log in to the portal, it shows an error",
    "help",
    "purple elephants dance",
    "I am very worried, I can't afford school fees while my claim is pending",
    "URGENT!!! my payment is late",
];
