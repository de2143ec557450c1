//! Input validation, run before any analysis stage.

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

/// Default maximum message length, in characters.
pub const DEFAULT_MAX_CHARS: usize = 500;

/// Why a message was rejected. Only ever logged; the user sees a fixed re-prompt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidInput {
    #[error("message is empty")]
    Empty,
    #[error("message has {length} characters, limit is {limit}")]
    TooLong { length: usize, limit: usize },
    #[error("message matches unsafe pattern '{pattern}'")]
    Unsafe { pattern: &'static str },
}

static UNSAFE_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        ("markup_tag", r"(?i)<\s*/?\s*(?:script|iframe|object|embed|style|svg|img|link|meta)\b"),
        ("javascript_uri", r"(?i)\bjavascript\s*:"),
        ("event_handler", r"(?i)\bon[a-z]+\s*="),
        ("template_injection", r"\{\{.*?\}\}|\{%.*?%\}|\$\{[^}]*\}"),
        (
            "sql_injection",
            r"(?i)(?:;\s*(?:drop|delete|truncate|alter|insert|update)\s+(?:table|from|into|database)\b|\bunion\s+(?:all\s+)?select\b|'\s*or\s+'?1'?\s*=\s*'?1)",
        ),
        ("control_character", r"[\x00-\x08\x0B\x0C\x0E-\x1F\x7F]"),
    ]
    .into_iter()
    .map(|(name, pattern)| {
        (
            name,
            Regex::new(pattern).expect("Invalid regex: unsafe input pattern"),
        )
    })
    .collect()
});

/// Rejects empty, oversized and unsafe messages.
#[derive(Debug, Clone)]
pub struct InputGuard {
    max_chars: usize,
}

impl Default for InputGuard {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CHARS)
    }
}

impl InputGuard {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Checks a message and reports the first rule it breaks.
    pub fn check(&self, message: &str) -> Result<(), InvalidInput> {
        if message.trim().is_empty() {
            return Err(InvalidInput::Empty);
        }

        let length = message.chars().count();
        if length > self.max_chars {
            return Err(InvalidInput::TooLong {
                length,
                limit: self.max_chars,
            });
        }

        if let Some((pattern, _)) = UNSAFE_PATTERNS.iter().find(|(_, re)| re.is_match(message)) {
            return Err(InvalidInput::Unsafe { pattern });
        }

        Ok(())
    }

    pub fn validate(&self, message: &str) -> bool {
        self.check(message).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_and_blank() {
        let guard = InputGuard::default();
        assert!(!guard.validate(""));
        assert!(!guard.validate("   "));
        assert_eq!(guard.check("\n\t"), Err(InvalidInput::Empty));
    }

    #[test]
    fn test_length_limit_counts_characters() {
        let guard = InputGuard::default();
        assert!(!guard.validate(&"x".repeat(501)));
        assert!(guard.validate(&"x".repeat(500)));
        // Multi-byte characters count once each.
        assert!(guard.validate(&"é".repeat(500)));
        assert_eq!(
            guard.check(&"x".repeat(501)),
            Err(InvalidInput::TooLong {
                length: 501,
                limit: 500
            })
        );
    }

    #[test]
    fn test_accepts_ordinary_messages() {
        let guard = InputGuard::default();
        assert!(guard.validate("Hello"));
        assert!(guard.validate("Check claim WC-2024-001234 status"));
        assert!(guard.validate("I can't log in, what should I do?"));
        assert!(guard.validate("Union members asked me to select a date"));
    }

    #[test]
    fn test_rejects_unsafe_patterns() {
        let guard = InputGuard::default();
        let cases = [
            ("<script>alert(1)</script>", "markup_tag"),
            ("click javascript:void(0)", "javascript_uri"),
            ("<b onmouseover=steal()>", "event_handler"),
            ("{{ config.secret }}", "template_injection"),
            ("x'; DROP TABLE users; --", "sql_injection"),
            ("1 UNION SELECT password FROM users", "sql_injection"),
            ("hello\u{0007}", "control_character"),
        ];
        for (message, expected) in cases {
            assert_eq!(
                guard.check(message),
                Err(InvalidInput::Unsafe { pattern: expected }),
                "for '{}'",
                message
            );
        }
    }
}
