//! In-process knowledge search.
//!
//! Articles are scored by the overlap between the message's top keywords and the
//! article's own keywords, with a bonus when the article is tagged with the detected
//! intent.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

use super::traits::{KnowledgeSearch, KnowledgeSnippet};
use crate::brain::intent::Intent;
use crate::brain::keywords::KeywordExtractor;
use crate::error::AppError;

const QUERY_KEYWORDS: usize = 6;
const INTENT_BONUS: f32 = 0.2;
const MAX_RESULTS: usize = 3;

/// One searchable article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeArticle {
    /// Quoted in replies, so written as one sentence
    pub title: String,
    pub keywords: Vec<String>,
    #[serde(default)]
    pub intents: Vec<Intent>,
}

impl KnowledgeArticle {
    fn new(title: &str, keywords: &[&str], intents: &[Intent]) -> Self {
        Self {
            title: title.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            intents: intents.to_vec(),
        }
    }
}

/// Keyword-scored article collection.
pub struct KeywordKnowledgeBase {
    articles: Vec<KnowledgeArticle>,
    extractor: KeywordExtractor,
}

impl Default for KeywordKnowledgeBase {
    fn default() -> Self {
        Self::new(default_articles())
    }
}

impl KeywordKnowledgeBase {
    pub fn new(articles: Vec<KnowledgeArticle>) -> Self {
        Self {
            articles,
            extractor: KeywordExtractor::new(),
        }
    }

    /// Reads a JSON array of articles.
    pub async fn from_json_file(path: &Path) -> Result<Self, AppError> {
        let raw = tokio::fs::read_to_string(path).await?;
        let articles: Vec<KnowledgeArticle> = serde_json::from_str(&raw)?;
        Ok(Self::new(articles))
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    /// Scores every article against the message, best first.
    pub fn rank(&self, message: &str, intent: Intent) -> Vec<KnowledgeSnippet> {
        let query: HashSet<String> = self
            .extractor
            .extract_keywords(message, Some(QUERY_KEYWORDS))
            .into_iter()
            .collect();
        if query.is_empty() {
            return vec![];
        }

        let mut snippets: Vec<KnowledgeSnippet> = self
            .articles
            .iter()
            .filter_map(|article| {
                let overlap = article
                    .keywords
                    .iter()
                    .filter(|k| query.contains(&k.to_lowercase()))
                    .count();
                if overlap == 0 {
                    return None;
                }
                let mut relevance = overlap as f32 / query.len() as f32;
                if article.intents.contains(&intent) {
                    relevance += INTENT_BONUS;
                }
                Some(KnowledgeSnippet {
                    title: article.title.clone(),
                    relevance: relevance.min(1.0),
                })
            })
            .collect();

        snippets.sort_by(|a, b| {
            b.relevance
                .partial_cmp(&a.relevance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.title.cmp(&b.title))
        });
        snippets.truncate(MAX_RESULTS);

        debug!(
            intent = %intent,
            keywords = ?query,
            hits = snippets.len(),
            "Knowledge search ranked"
        );
        snippets
    }
}

#[async_trait]
impl KnowledgeSearch for KeywordKnowledgeBase {
    async fn search(&self, message: &str, intent: Intent) -> Result<Vec<KnowledgeSnippet>, AppError> {
        Ok(self.rank(message, intent))
    }
}

fn default_articles() -> Vec<KnowledgeArticle> {
    vec![
        KnowledgeArticle::new(
            "Medical reports and the accident notification form are the two documents every new claim needs.",
            &["claim", "accident", "injury", "medical", "report", "form"],
            &[Intent::ClaimSubmission],
        ),
        KnowledgeArticle::new(
            "Claim decisions are usually made within 30 days once every document has been received.",
            &["claim", "status", "decision", "progress", "waiting"],
            &[Intent::ClaimStatus],
        ),
        KnowledgeArticle::new(
            "Benefit payments are released on the 25th of each month to the bank account on file.",
            &["payment", "benefit", "bank", "paid", "money", "month"],
            &[Intent::PaymentStatus],
        ),
        KnowledgeArticle::new(
            "Pension and dependants' benefits are reviewed every year, and a life certificate keeps them active.",
            &["pension", "dependants", "certificate", "survivor", "annual"],
            &[Intent::PensionInquiry],
        ),
        KnowledgeArticle::new(
            "Employer registration needs the business licence, tax number and a list of employees.",
            &["employer", "registration", "register", "company", "business", "licence"],
            &[Intent::EmployerRegistration],
        ),
        KnowledgeArticle::new(
            "Monthly contributions are due by the last working day of the following month.",
            &["contribution", "contributions", "pay", "payroll", "penalty", "monthly"],
            &[Intent::ContributionPayment],
        ),
        KnowledgeArticle::new(
            "Clearance and registration certificates can be downloaded from the portal once your account is in good standing.",
            &["certificate", "clearance", "document", "download", "letter"],
            &[Intent::DocumentRequest],
        ),
        KnowledgeArticle::new(
            "Password resets are sent to the email address registered on your portal account.",
            &["password", "portal", "login", "account", "reset", "email"],
            &[Intent::TechnicalHelp],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_tagged_article_ranks_first() {
        let kb = KeywordKnowledgeBase::default();
        let hits = kb.rank("When will my pension payment arrive?", Intent::PensionInquiry);
        assert!(!hits.is_empty());
        assert!(hits[0].title.starts_with("Pension"));
    }

    #[test]
    fn test_relevance_is_bounded_and_sorted() {
        let kb = KeywordKnowledgeBase::default();
        let hits = kb.rank(
            "claim accident injury medical report form status",
            Intent::ClaimSubmission,
        );
        assert!(hits.len() <= MAX_RESULTS);
        assert!(hits.iter().all(|h| (0.0..=1.0).contains(&h.relevance)));
        assert!(hits.windows(2).all(|w| w[0].relevance >= w[1].relevance));
    }

    #[test]
    fn test_no_keywords_no_hits() {
        let kb = KeywordKnowledgeBase::default();
        assert!(kb.rank("hi there", Intent::Greeting).is_empty());
    }

    #[tokio::test]
    async fn test_articles_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kb.json");
        tokio::fs::write(
            &path,
            r#"[{"title":"Reset your password from the login page.","keywords":["password"],"intents":["technical_help"]}]"#,
        )
        .await
        .unwrap();

        let kb = KeywordKnowledgeBase::from_json_file(&path).await.unwrap();
        let hits = kb.search("forgot my password", Intent::TechnicalHelp).await.unwrap();
        assert_eq!(hits.len(), 1);
        // one of two query keywords plus the intent bonus
        assert!((hits[0].relevance - 0.7).abs() < 1e-6);
    }
}
