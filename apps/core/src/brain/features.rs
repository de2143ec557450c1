//! Lexical features shared by the complexity and context-sufficiency stages.
//!
//! Extracted once per message: reference numbers, dates, amounts and a handful of
//! boolean signals. The specificity score is derived from these features only, so the
//! complexity analyzer and the sufficiency assessor always agree on it.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use super::lexicon::{tokenize, Lexicon};
use crate::models::MentionedEntities;

// NOTE: expect() on literal patterns is acceptable: a bad pattern is a build-time bug.
static CLAIM_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:wc|clm)[-/]?\d{4}[-/]?\d{3,8}\b").expect("Invalid regex: claim number")
});
static REGISTRATION_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:er|emp|reg)[-/]?\d{4,10}\b").expect("Invalid regex: registration number")
});
static MEMBER_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:mb|mem|pn)[-/]?\d{4,10}\b").expect("Invalid regex: member number")
});
static BARE_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\d{6,}\b").expect("Invalid regex: bare reference digits")
});
static DATE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"\b\d{4}-\d{2}-\d{2}\b").expect("Invalid regex: iso date"),
        Regex::new(r"\b\d{1,2}[/.]\d{1,2}[/.]\d{2,4}\b").expect("Invalid regex: numeric date"),
        Regex::new(
            r"(?i)\b\d{1,2}(?:st|nd|rd|th)?\s+(?:jan|feb|mar|apr|may|jun|jul|aug|sep|sept|oct|nov|dec)[a-z]*\.?(?:\s+\d{4})?\b",
        )
        .expect("Invalid regex: day month date"),
        Regex::new(
            r"(?i)\b(?:january|february|march|april|june|july|august|september|october|november|december)\s+\d{1,2}(?:st|nd|rd|th)?(?:,?\s+\d{4})?\b",
        )
        .expect("Invalid regex: month day date"),
    ]
});
static AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:\b(?:tzs|tsh|usd)\s?|\$\s?)\d[\d,]*(?:\.\d+)?\b|\b\d[\d,]*(?:\.\d+)?\s?(?:tzs|tsh|shillings|dollars|usd)\b",
    )
    .expect("Invalid regex: money amount")
});

const TEMPORAL: Lexicon = Lexicon::new(
    &[
        "yesterday", "today", "tonight", "ago", "since", "monday", "tuesday", "wednesday",
        "thursday", "friday", "saturday", "sunday", "january", "february", "march", "april",
        "june", "july", "august", "september", "october", "november", "december",
    ],
    &[
        "last week", "last month", "last year", "this morning", "this week", "this month",
        "two weeks", "three weeks", "a month",
    ],
);

const INCIDENT: Lexicon = Lexicon::new(
    &[
        "fell", "slipped", "tripped", "burned", "burnt", "broke", "fractured", "crushed",
        "collapsed", "struck", "sprained", "electrocuted", "amputated", "cut", "died", "killed",
    ],
    &[
        "injured my", "hurt my", "was injured", "got injured", "got hurt", "was hurt",
        "was hit", "broke my", "hit by",
    ],
);

const NAMED_SERVICE: Lexicon = Lexicon::new(
    &["pension", "rehabilitation", "e-services", "portal", "funeral"],
    &[
        "medical aid", "funeral grant", "online portal", "constant attendance",
        "temporary disablement", "permanent disablement", "dependants benefit",
        "employer registration", "compliance certificate", "certificate of compliance",
        "monthly contribution", "contribution statement",
    ],
);

const CONFIDENT: Lexicon = Lexicon::new(
    &["definitely", "exactly"],
    &[
        "i need to", "i want to", "i would like to", "please check", "check my",
        "my claim number is", "my reference is", "the reference is", "here is",
        "i am sure", "i'm sure",
    ],
);

const UNCERTAIN: Lexicon = Lexicon::new(
    &["maybe", "unsure", "confused", "somehow", "wondering", "perhaps"],
    &[
        "not sure", "i think", "don't know", "dont know", "no idea", "i guess",
        "what to do", "not certain",
    ],
);

const SYMPTOM: Lexicon = Lexicon::new(
    &[
        "error", "login", "password", "cannot", "can't", "unable", "failed", "fails", "crash",
        "crashes", "slow", "delay", "delayed", "rude", "wrong", "missing", "blocked", "locked",
        "otp", "upload", "timeout", "declined", "rejected",
    ],
    &["log in", "not received", "not working", "doesn't work", "didn't receive", "never received"],
);

/// Lexical features of one message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageFeatures {
    pub word_count: usize,
    /// Any reference/ID-like token (claim, registration, member or a long digit run)
    pub has_reference: bool,
    pub has_incident: bool,
    pub has_temporal: bool,
    pub has_named_service: bool,
    pub confident: bool,
    pub uncertain: bool,
    /// A concrete symptom or error keyword (used by service-request intents)
    pub has_symptom: bool,
    pub entities: MentionedEntities,
}

impl MessageFeatures {
    pub fn extract(message: &str) -> Self {
        let tokens = tokenize(message);
        let entities = extract_entities(message);

        let has_reference = entities.primary_reference().is_some() || has_bare_reference(message);
        let has_temporal = !entities.dates.is_empty() || TEMPORAL.matches_any(&tokens);

        Self {
            word_count: tokens.len(),
            has_reference,
            has_incident: INCIDENT.matches_any(&tokens),
            has_temporal,
            has_named_service: NAMED_SERVICE.matches_any(&tokens),
            confident: CONFIDENT.matches_any(&tokens),
            uncertain: UNCERTAIN.matches_any(&tokens),
            has_symptom: SYMPTOM.matches_any(&tokens),
            entities,
        }
    }

    /// Additive measure of how much concrete detail the message carries.
    pub fn specificity_score(&self) -> i32 {
        let mut score = 0;
        if self.has_reference {
            score += 3;
        }
        if self.has_incident {
            score += 2;
        }
        if self.has_temporal {
            score += 2;
        }
        if self.has_named_service {
            score += 2;
        }
        if self.word_count > 8 {
            score += 1;
        }
        if self.confident {
            score += 1;
        }
        if self.uncertain {
            score -= 2;
        }
        score
    }
}

/// A long digit run that is not part of a money amount.
fn has_bare_reference(message: &str) -> bool {
    let amounts: Vec<_> = AMOUNT.find_iter(message).map(|m| m.range()).collect();
    BARE_REFERENCE.find_iter(message).any(|digits| {
        !amounts
            .iter()
            .any(|amount| amount.start <= digits.start() && digits.end() <= amount.end)
    })
}

/// Extracts reference numbers, dates and amounts, normalized and deduplicated.
pub fn extract_entities(message: &str) -> MentionedEntities {
    fn collect(re: &Regex, text: &str, upper: bool) -> Vec<String> {
        let mut found: Vec<String> = Vec::new();
        for m in re.find_iter(text) {
            let value = if upper {
                m.as_str().to_uppercase()
            } else {
                m.as_str().trim().to_string()
            };
            if !found.contains(&value) {
                found.push(value);
            }
        }
        found
    }

    let mut dates = Vec::new();
    for pattern in DATE_PATTERNS.iter() {
        for date in collect(pattern, message, false) {
            if !dates.contains(&date) {
                dates.push(date);
            }
        }
    }

    MentionedEntities {
        claim_numbers: collect(&CLAIM_NUMBER, message, true),
        registration_numbers: collect(&REGISTRATION_NUMBER, message, true),
        member_numbers: collect(&MEMBER_NUMBER, message, true),
        dates,
        amounts: collect(&AMOUNT, message, false),
    }
}
