//! Final adjustments to a generated reply: grammar and casing, the word budget, the
//! assistant identity phrase and the warmth floor.

use std::sync::Arc;

use crate::brain::intent::Intent;
use crate::config::AssistantConfig;
use crate::error::AppError;
use crate::service::traits::ReplyFinalizer;

use super::templates::CLARIFICATION_CLOSING;

const WARMTH_OFFER: &str = "Let me know if there's anything else I can help with.";
const HELP_PHRASES: &[&str] = &[
    "help", "assist", "let me know", "happy to", "here for you", "reach out", "glad to",
    "support", "sorry",
];
const PRONOUN_FORMS: &[&str] = &["i", "i'm", "i've", "i'll", "i'd"];
/// A leading sentence this short is treated as a salutation.
const SALUTATION_MAX_WORDS: usize = 4;
/// Identity sentence position when the reply opens with an acknowledgment.
const ACKNOWLEDGMENT_SLOT: usize = 1;
const ELLIPSIS: &str = "...";

/// Splits text into sentences after `.`, `!` or `?` followed by whitespace.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        if matches!(c, '.' | '!' | '?') {
            let at_boundary = match chars.peek() {
                None => true,
                Some(next) => next.is_whitespace(),
            };
            if at_boundary {
                let sentence = current.trim();
                if !sentence.is_empty() {
                    sentences.push(sentence.to_string());
                }
                current.clear();
            }
        }
    }
    let rest = current.trim();
    if !rest.is_empty() {
        sentences.push(rest.to_string());
    }
    sentences
}

/// Keeps the first `max` sentences.
pub fn truncate_sentences(text: &str, max: usize) -> String {
    split_sentences(text)
        .into_iter()
        .take(max)
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Splits a word into leading punctuation, core and trailing punctuation.
fn split_word(word: &str) -> (&str, &str, &str) {
    let start = word
        .find(|c: char| c.is_alphanumeric())
        .unwrap_or(word.len());
    let end = word
        .rfind(|c: char| c.is_alphanumeric())
        .map(|i| i + word[i..].chars().next().map_or(1, char::len_utf8))
        .unwrap_or(start);
    (&word[..start], &word[start..end.max(start)], &word[end.max(start)..])
}

fn capitalize_first(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut done = false;
    for c in text.chars() {
        if !done && c.is_alphabetic() {
            out.extend(c.to_uppercase());
            done = true;
        } else {
            out.push(c);
        }
    }
    out
}

/// Reply post-processor
pub struct PostProcessor {
    config: Arc<AssistantConfig>,
}

impl PostProcessor {
    pub fn new(config: Arc<AssistantConfig>) -> Self {
        Self { config }
    }

    /// Word budget for an intent class.
    pub fn budget_for(&self, intent: Intent) -> usize {
        if intent.is_short_form() {
            self.config.short_form_word_budget
        } else {
            self.config.substantive_word_budget
        }
    }

    /// Standalone pronoun `i` forms and organization casing, word by word.
    fn fix_words(&self, text: &str) -> String {
        let organization = self.config.organization.as_str();
        text.split_whitespace()
            .map(|word| {
                let (lead, core, trail) = split_word(word);
                let lower = core.to_lowercase();
                if PRONOUN_FORMS.contains(&lower.as_str()) && core != capitalize_first(core) {
                    format!("{}{}{}", lead, capitalize_first(core), trail)
                } else if !core.is_empty()
                    && core.eq_ignore_ascii_case(organization)
                    && core != organization
                    && !word.contains(['@', '/'])
                {
                    format!("{}{}{}", lead, organization, trail)
                } else {
                    word.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn contains_identity(&self, sentence: &str) -> bool {
        sentence
            .to_lowercase()
            .contains(&self.config.identity_phrase().to_lowercase())
    }

    /// Applies the identity rules for the intent class.
    fn apply_persona(
        &self,
        mut sentences: Vec<String>,
        intent: Intent,
        first_interaction: bool,
    ) -> Vec<String> {
        if matches!(intent, Intent::Gratitude | Intent::Goodbye) {
            sentences.retain(|s| !self.contains_identity(s));
            return sentences;
        }

        // Exactly once everywhere else: keep the first occurrence only.
        let mut seen = false;
        sentences.retain(|s| {
            if self.contains_identity(s) {
                if seen {
                    return false;
                }
                seen = true;
            }
            true
        });

        // Greetings: after a salutation, or after the opener for a returning user.
        // Everything else: after the acknowledgment.
        let slot = match sentences.first() {
            Some(first) if intent.is_greeting() && self.contains_identity(first) => 0,
            Some(first)
                if intent.is_greeting()
                    && first_interaction
                    && word_count(first) > SALUTATION_MAX_WORDS =>
            {
                0
            }
            _ => ACKNOWLEDGMENT_SLOT,
        };
        match sentences.iter().position(|s| self.contains_identity(s)) {
            None => {
                let identity = format!("{}.", self.config.identity_phrase());
                sentences.insert(slot.min(sentences.len()), identity);
            }
            Some(index) if intent.is_greeting() && first_interaction && index > slot => {
                let sentence = sentences.remove(index);
                sentences.insert(slot, sentence);
            }
            Some(_) => {}
        }
        sentences
    }

    /// Longest sentence prefix within the budget; cuts the first sentence only if it alone
    /// is over budget.
    fn apply_budget(sentences: Vec<String>, budget: usize) -> Vec<String> {
        let mut kept = Vec::new();
        let mut used = 0;
        for sentence in &sentences {
            let words = word_count(sentence);
            if used + words > budget {
                break;
            }
            used += words;
            kept.push(sentence.clone());
        }

        if kept.is_empty() {
            if let Some(first) = sentences.first() {
                let mut cut: Vec<&str> = first.split_whitespace().take(budget).collect();
                if let Some(last) = cut.pop() {
                    let last = last.trim_end_matches(|c: char| !c.is_alphanumeric());
                    let tail = format!("{}{}", last, ELLIPSIS);
                    let mut text = cut.join(" ");
                    if !text.is_empty() {
                        text.push(' ');
                    }
                    text.push_str(&tail);
                    kept.push(text);
                }
            }
        }
        kept
    }

    fn has_help_phrase(text: &str) -> bool {
        let lower = text.to_lowercase();
        HELP_PHRASES.iter().any(|p| lower.contains(p))
    }

    /// Finalizes a draft reply.
    pub fn finalize(
        &self,
        response: &str,
        intent: Intent,
        _message: &str,
        first_interaction: bool,
    ) -> Result<String, AppError> {
        let fixed = self.fix_words(response);
        if fixed.is_empty() {
            return Err(AppError::PostProcessing("draft reply is empty".to_string()));
        }

        let sentences: Vec<String> = split_sentences(&fixed)
            .iter()
            .map(|s| capitalize_first(s))
            .collect();
        let sentences = self.apply_persona(sentences, intent, first_interaction);

        let budget = self.budget_for(intent);
        let mut sentences = Self::apply_budget(sentences, budget);
        if sentences.is_empty() {
            return Err(AppError::PostProcessing(format!(
                "nothing left of the reply for intent '{}'",
                intent
            )));
        }

        let used: usize = sentences.iter().map(|s| word_count(s)).sum();
        let closes_clarification =
            sentences.last().map(String::as_str) == Some(CLARIFICATION_CLOSING);
        if !closes_clarification
            && !Self::has_help_phrase(&sentences.join(" "))
            && used + word_count(WARMTH_OFFER) <= budget
        {
            sentences.push(WARMTH_OFFER.to_string());
        }

        Ok(sentences.join(" "))
    }
}

impl ReplyFinalizer for PostProcessor {
    fn finalize(
        &self,
        response: &str,
        intent: Intent,
        message: &str,
        first_interaction: bool,
    ) -> Result<String, AppError> {
        PostProcessor::finalize(self, response, intent, message, first_interaction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn processor() -> PostProcessor {
        PostProcessor::new(Arc::new(AssistantConfig::default()))
    }

    const IDENTITY: &str = "I'm Ava, the WCF virtual assistant";

    #[test]
    fn test_split_sentences_keeps_urls_and_references() {
        let sentences = split_sentences(
            "Visit https://eservices.wcf.example.org. Claim WC-2024-001234 is open! Anything else?",
        );
        assert_eq!(sentences.len(), 3);
        assert_eq!(sentences[0], "Visit https://eservices.wcf.example.org.");
    }

    #[test]
    fn test_grammar_fixes() {
        let text = processor()
            .finalize(
                "i think i'm able to help. the wcf portal is open. email support@wcf.example.org.",
                Intent::Unknown,
                "",
                false,
            )
            .unwrap();
        assert!(text.starts_with("I think I'm able to help."));
        assert!(text.contains("The WCF portal is open."));
        assert!(text.contains("support@wcf.example.org"));
    }

    #[test]
    fn test_gratitude_drops_identity() {
        let draft = format!("You're welcome! {}. Glad to help.", IDENTITY);
        let text = processor().finalize(&draft, Intent::Gratitude, "thanks", false).unwrap();
        assert!(!text.contains(IDENTITY));
        assert!(text.starts_with("You're welcome!"));
    }

    #[test]
    fn test_greeting_inserts_identity_once() {
        let text = processor()
            .finalize("Welcome back! Tell me what you need.", Intent::SimpleGreeting, "hi", false)
            .unwrap();
        assert_eq!(text.matches(IDENTITY).count(), 1);
        assert!(text.starts_with(&format!("Welcome back! {}.", IDENTITY)));
    }

    #[test]
    fn test_first_interaction_greeting_leads_with_identity() {
        let draft = format!(
            "Thanks for stopping by today, it is good to hear from you. Claims are my speciality. {}.",
            IDENTITY
        );
        let text = processor().finalize(&draft, Intent::Greeting, "hello there friend", true).unwrap();
        assert!(text.starts_with(IDENTITY));
    }

    #[test]
    fn test_identity_exactly_once_elsewhere() {
        let draft = format!("{}. Here is your answer. {}.", IDENTITY, IDENTITY);
        let text = processor().finalize(&draft, Intent::ClaimStatus, "claim", false).unwrap();
        assert_eq!(text.matches(IDENTITY).count(), 1);
    }

    #[test]
    fn test_identity_inserted_after_acknowledgment() {
        let draft = "I'm really sorry you're dealing with this. Your complaint has been logged.";
        for first_interaction in [true, false] {
            let text = processor()
                .finalize(draft, Intent::Complaint, "complaint", first_interaction)
                .unwrap();
            assert_eq!(text.matches(IDENTITY).count(), 1);
            assert!(text.starts_with(&format!(
                "I'm really sorry you're dealing with this. {}.",
                IDENTITY
            )));
        }
    }

    #[test]
    fn test_clarification_closing_gets_no_warmth_offer() {
        let draft = format!("Could you share your claim reference number? {}", CLARIFICATION_CLOSING);
        let text = processor().finalize(&draft, Intent::ClaimStatus, "", false).unwrap();
        assert!(text.ends_with(CLARIFICATION_CLOSING));
        assert!(!text.contains(WARMTH_OFFER));
    }

    #[test]
    fn test_budget_keeps_whole_sentences() {
        let sentence = "This sentence has exactly eight words in it.";
        let draft = vec![sentence; 30].join(" ");
        let text = processor().finalize(&draft, Intent::ClaimStatus, "", false).unwrap();
        assert!(word_count(&text) <= 140);
        assert!(!text.contains(ELLIPSIS));
        assert!(text.ends_with('.'));
    }

    #[test]
    fn test_budget_cuts_overlong_first_sentence() {
        let draft = vec!["word"; 60].join(" ") + ".";
        let text = processor().finalize(&draft, Intent::Gratitude, "", false).unwrap();
        assert_eq!(word_count(&text), 35);
        assert!(text.ends_with(ELLIPSIS));
    }

    #[test]
    fn test_warmth_floor() {
        let text = processor()
            .finalize("Your claim is open.", Intent::ClaimStatus, "", false)
            .unwrap();
        assert!(text.ends_with(WARMTH_OFFER));

        let text = processor()
            .finalize("I'm happy to help with that.", Intent::ClaimStatus, "", false)
            .unwrap();
        assert!(!text.contains(WARMTH_OFFER));
    }

    #[test]
    fn test_empty_draft_is_error() {
        let err = processor().finalize("   ", Intent::Unknown, "", false).unwrap_err();
        assert!(matches!(err, AppError::PostProcessing(_)));
    }

    #[test]
    fn test_short_form_budget_holds_for_every_template_size() {
        let processor = processor();
        for words in [1usize, 20, 34, 35, 36, 80] {
            let draft = vec!["thanks"; words].join(" ") + ".";
            let text = processor.finalize(&draft, Intent::Goodbye, "", false).unwrap();
            assert!(word_count(&text) <= 35, "{} words became {}", words, word_count(&text));
        }
    }
}
