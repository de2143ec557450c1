//! Persona detection.
//!
//! Priority: explicit role in the context, identity lookup, context shape, message
//! keywords, unknown.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::lexicon::{tokenize, Lexicon};
use crate::models::ConversationContext;

/// Stakeholder category of the person asking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Injured worker or dependant receiving benefits
    Beneficiary,
    Employer,
    /// Worker reporting incidents or asking about workplace safety
    Employee,
    /// Board, partner or policy stakeholder
    Stakeholder,
    /// Internal staff member
    Staff,
    Unknown,
}

impl Role {
    pub fn label(&self) -> &'static str {
        match self {
            Role::Beneficiary => "beneficiary",
            Role::Employer => "employer",
            Role::Employee => "employee",
            Role::Stakeholder => "stakeholder",
            Role::Staff => "staff",
            Role::Unknown => "unknown",
        }
    }

    /// Parses a role name coming from an external profile.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "beneficiary" | "claimant" | "dependant" => Some(Role::Beneficiary),
            "employer" => Some(Role::Employer),
            "employee" | "worker" => Some(Role::Employee),
            "stakeholder" => Some(Role::Stakeholder),
            "staff" => Some(Role::Staff),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Tone the generator should adopt for a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Supportive,
    Professional,
    Formal,
    Collegial,
}

/// How much detail a role usually wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetailPreference {
    Brief,
    Balanced,
    Thorough,
}

/// What the generator knows about a persona.
#[derive(Debug, Clone, Serialize)]
pub struct RoleContext {
    pub role: Role,
    pub primary_concerns: &'static [&'static str],
    pub common_tasks: &'static [&'static str],
    pub tone: Tone,
    pub detail_preference: DetailPreference,
    /// Appended to detailed and comprehensive replies
    pub guidance: &'static str,
}

static ROLE_CONTEXTS: &[RoleContext] = &[
    RoleContext {
        role: Role::Beneficiary,
        primary_concerns: &["claim progress", "benefit payments", "medical care"],
        common_tasks: &["check claim status", "submit medical reports", "update bank details"],
        tone: Tone::Supportive,
        detail_preference: DetailPreference::Brief,
        guidance: "Keep copies of every medical report and receipt, since they speed up each review of your claim.",
    },
    RoleContext {
        role: Role::Employer,
        primary_concerns: &["compliance", "contributions", "accident reporting duties"],
        common_tasks: &["register the business", "pay contributions", "notify accidents"],
        tone: Tone::Professional,
        detail_preference: DetailPreference::Thorough,
        guidance: "Employers must notify workplace accidents within seven days and keep contribution records up to date to stay compliant.",
    },
    RoleContext {
        role: Role::Employee,
        primary_concerns: &["workplace safety", "reporting incidents", "entitlements"],
        common_tasks: &["report an incident", "ask about entitlements"],
        tone: Tone::Supportive,
        detail_preference: DetailPreference::Balanced,
        guidance: "Report every workplace incident to your employer as soon as possible, even if the injury seems minor.",
    },
    RoleContext {
        role: Role::Stakeholder,
        primary_concerns: &["governance", "policy", "performance reporting"],
        common_tasks: &["request reports", "ask about policy"],
        tone: Tone::Formal,
        detail_preference: DetailPreference::Thorough,
        guidance: "Published annual reports and policy documents are available on request from the corporate affairs office.",
    },
    RoleContext {
        role: Role::Staff,
        primary_concerns: &["case handling", "internal procedures"],
        common_tasks: &["look up cases", "check procedures"],
        tone: Tone::Collegial,
        detail_preference: DetailPreference::Balanced,
        guidance: "Internal procedure manuals are kept on the staff portal under case management.",
    },
    RoleContext {
        role: Role::Unknown,
        primary_concerns: &["general information"],
        common_tasks: &["find the right service"],
        tone: Tone::Supportive,
        detail_preference: DetailPreference::Balanced,
        guidance: "If you tell me whether you are an employer, an employee or a beneficiary, I can tailor the next steps.",
    },
];

/// Keyword lexicons per role, in tie-break order.
static ROLE_LEXICONS: &[(Role, Lexicon)] = &[
    (
        Role::Employer,
        Lexicon::new(
            &[
                "employer", "company", "business", "employees", "staff", "payroll",
                "contributions", "compliance", "registration", "tin",
            ],
            &["my company", "my business", "my employees", "our workers", "register my company"],
        ),
    ),
    (
        Role::Beneficiary,
        Lexicon::new(
            &["injury", "injured", "benefit", "benefits", "claim", "compensation", "pension", "dependant", "widow"],
            &["my claim", "my benefits", "my compensation", "my pension", "my husband died", "my wife died"],
        ),
    ),
    (
        Role::Employee,
        Lexicon::new(
            &["safety", "hazard", "unsafe", "supervisor", "colleague", "incident", "ppe"],
            &["at my workplace", "my employer", "report an incident", "near miss", "safety equipment"],
        ),
    ),
    (
        Role::Stakeholder,
        Lexicon::new(
            &["governance", "policy", "policies", "board", "regulation", "actuarial", "annual", "stakeholder"],
            &["annual report", "policy framework", "board meeting", "fund performance"],
        ),
    ),
];

/// Infers the persona of the person asking
pub struct RoleDetector {
    lexicons: &'static [(Role, Lexicon)],
}

impl Default for RoleDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl RoleDetector {
    pub fn new() -> Self {
        Self {
            lexicons: ROLE_LEXICONS,
        }
    }

    /// Detects the role. `resolved` is the result of the identity lookup for the user.
    pub fn detect(
        &self,
        context: &ConversationContext,
        message: &str,
        resolved: Option<Role>,
    ) -> Role {
        if let Some(role) = context.user_role {
            return role;
        }
        if let Some(role) = resolved.filter(|r| *r != Role::Unknown) {
            return role;
        }
        if context.employer_code.is_some() || context.company_name.is_some() {
            return Role::Employer;
        }
        if context.claim_number.is_some() || context.beneficiary_id.is_some() {
            return Role::Beneficiary;
        }
        self.detect_from_message(message)
    }

    /// Keyword scan; the role with the most distinct matches wins.
    pub fn detect_from_message(&self, message: &str) -> Role {
        let tokens = tokenize(message);
        let mut best = Role::Unknown;
        let mut best_count = 0;
        for (role, lexicon) in self.lexicons {
            let count = lexicon.distinct_matches(&tokens);
            if count > best_count {
                best = *role;
                best_count = count;
            }
        }
        best
    }

    pub fn context_for(role: Role) -> &'static RoleContext {
        ROLE_CONTEXTS
            .iter()
            .find(|c| c.role == role)
            .unwrap_or(&ROLE_CONTEXTS[ROLE_CONTEXTS.len() - 1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_role_wins() {
        let detector = RoleDetector::new();
        let context = ConversationContext {
            user_role: Some(Role::Stakeholder),
            company_name: Some("Acme".to_string()),
            ..Default::default()
        };
        assert_eq!(
            detector.detect(&context, "my claim", Some(Role::Employer)),
            Role::Stakeholder
        );
    }

    #[test]
    fn test_lookup_beats_context_shape() {
        let detector = RoleDetector::new();
        let context = ConversationContext {
            claim_number: Some("WC-2024-000001".to_string()),
            ..Default::default()
        };
        assert_eq!(detector.detect(&context, "hello", Some(Role::Staff)), Role::Staff);
        assert_eq!(detector.detect(&context, "hello", None), Role::Beneficiary);
    }

    #[test]
    fn test_context_shape_employer() {
        let detector = RoleDetector::new();
        let context = ConversationContext {
            employer_code: Some("ER-123456".to_string()),
            ..Default::default()
        };
        assert_eq!(detector.detect(&context, "", None), Role::Employer);
    }

    #[test]
    fn test_message_keywords() {
        let detector = RoleDetector::new();
        assert_eq!(
            detector.detect_from_message("How do I pay contributions for my employees?"),
            Role::Employer
        );
        assert_eq!(
            detector.detect_from_message("When will my compensation for the injury be paid?"),
            Role::Beneficiary
        );
        assert_eq!(
            detector.detect_from_message("There is a safety hazard near the loading bay"),
            Role::Employee
        );
        assert_eq!(
            detector.detect_from_message("Where can I find the annual report on fund performance?"),
            Role::Stakeholder
        );
        assert_eq!(detector.detect_from_message("hello"), Role::Unknown);
    }

    #[test]
    fn test_every_role_has_context() {
        for role in [
            Role::Beneficiary,
            Role::Employer,
            Role::Employee,
            Role::Stakeholder,
            Role::Staff,
            Role::Unknown,
        ] {
            assert_eq!(RoleDetector::context_for(role).role, role);
        }
    }
}
