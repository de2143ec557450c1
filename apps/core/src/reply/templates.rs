//! Template families, resources and fixed phrases used by the generator.
//!
//! A family holds the candidate texts for one (role, intent) pair, most specific
//! first. Families with `role: None` apply to every role and back up the
//! role-specific ones.
//!
//! Placeholders: `{identity}` `{organization}` `{phone}` `{email}` `{portal}`
//! `{name}` (" Amina" or empty) `{reference}` `{live}`.

use crate::brain::intent::Intent;
use crate::brain::role::{Role, Tone};
use crate::brain::sentiment::Emotion;

/// Confidence a variant needs before it may be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceBand {
    /// Above 0.7
    Direct,
    /// Above 0.4
    Moderate,
    /// Any confidence
    General,
}

impl ConfidenceBand {
    pub fn admits(&self, confidence: f32) -> bool {
        match self {
            ConfidenceBand::Direct => confidence > 0.7,
            ConfidenceBand::Moderate => confidence > 0.4,
            ConfidenceBand::General => true,
        }
    }
}

/// Extra input a variant needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    None,
    /// A claim, registration or member number is known
    Reference,
    /// Live account data was fetched
    LiveData,
    /// The session already has earlier turns
    ReturningUser,
}

#[derive(Debug)]
pub struct TemplateVariant {
    pub band: ConfidenceBand,
    pub requires: Requirement,
    pub text: &'static str,
}

#[derive(Debug)]
pub struct TemplateFamily {
    /// `None` applies to every role
    pub role: Option<Role>,
    pub intent: Intent,
    pub variants: &'static [TemplateVariant],
}

const fn variant(band: ConfidenceBand, requires: Requirement, text: &'static str) -> TemplateVariant {
    TemplateVariant {
        band,
        requires,
        text,
    }
}

use ConfidenceBand::{Direct, General, Moderate};

static FAMILIES: &[TemplateFamily] = &[
    TemplateFamily {
        role: None,
        intent: Intent::SimpleGreeting,
        variants: &[
            variant(General, Requirement::ReturningUser, "Welcome back{name}! Just tell me what you need help with today."),
            variant(General, Requirement::None, "Hello{name}, {identity}. I can help with claims, payments, employer registration and documents, so just tell me what you need."),
        ],
    },
    TemplateFamily {
        role: None,
        intent: Intent::Greeting,
        variants: &[
            variant(General, Requirement::ReturningUser, "Hello again{name}, I'm doing well, thank you for asking! Tell me what you need and I'll help you with it."),
            variant(General, Requirement::None, "Hello{name}, {identity}. I'm doing well, thank you for asking, and I'm here to help with claims, payments, employer registration and documents."),
        ],
    },
    TemplateFamily {
        role: None,
        intent: Intent::Gratitude,
        variants: &[variant(General, Requirement::None, "You're very welcome{name}! I'm glad I could help, and I'm here whenever you need anything else.")],
    },
    TemplateFamily {
        role: None,
        intent: Intent::Goodbye,
        variants: &[variant(General, Requirement::None, "Goodbye{name}, and thank you for contacting {organization}. Take care, and feel free to reach out any time.")],
    },
    TemplateFamily {
        role: None,
        intent: Intent::AgentRequest,
        variants: &[variant(General, Requirement::None, "I'll connect you with a customer care officer. You can also reach our team directly on {phone} or at {email}, Monday to Friday from 8:00 to 17:00. A reference of this conversation will be passed on so you don't have to repeat yourself.")],
    },
    TemplateFamily {
        role: None,
        intent: Intent::Complaint,
        variants: &[
            variant(Moderate, Requirement::Reference, "I've noted your complaint about {reference} and it will be passed to the customer care unit for review. A case officer will contact you within three working days. Complaints are tracked until they are resolved, and you can ask me for an update at any time."),
            variant(General, Requirement::None, "I've noted your complaint and it will be passed to the customer care unit for review. A case officer will contact you within three working days. If your complaint is about a specific claim, sharing the claim number will speed things up."),
        ],
    },
    TemplateFamily {
        role: None,
        intent: Intent::ClaimSubmission,
        variants: &[
            variant(Moderate, Requirement::None, "I'm sorry to hear about the injury, and I'll help you start the claim. The accident must be reported to your employer, who notifies {organization} within seven days using the accident notification form. You will then need a medical report from the treating facility and a copy of your ID. Once those are in, a claims officer reviews the case and keeps you updated."),
            variant(General, Requirement::None, "I can help you start a compensation claim. The first step is reporting the accident to your employer, who notifies {organization} within seven days. A medical report and a copy of your ID are then needed so a claims officer can review the case."),
        ],
    },
    TemplateFamily {
        role: Some(Role::Employer),
        intent: Intent::ClaimSubmission,
        variants: &[variant(General, Requirement::None, "As the employer, you should notify {organization} of the accident within seven days using the accident notification form, available on the e-services portal. Attach the employee's medical report and your incident investigation notes. Late notification can lead to penalties, so submit what you have and add documents later if needed.")],
    },
    TemplateFamily {
        role: None,
        intent: Intent::ClaimStatus,
        variants: &[
            variant(Direct, Requirement::LiveData, "Here is the latest on {reference}: {live}. If anything looks wrong, let me know and I'll flag it for the claims officer."),
            variant(Direct, Requirement::Reference, "Thanks, I have your claim reference {reference}. Claims are usually reviewed within 14 working days once all documents are in. You can follow every stage on the e-services portal at {portal}, and the claims officer will contact you if anything is missing."),
            variant(Moderate, Requirement::Reference, "I can look into {reference} for you. Claims are usually reviewed within 14 working days once all documents are in, and you can follow every stage on the e-services portal at {portal}."),
            variant(General, Requirement::None, "You can check the status of any claim on the e-services portal at {portal} using your claim reference number. Claims are usually reviewed within 14 working days once all documents are in."),
        ],
    },
    TemplateFamily {
        role: None,
        intent: Intent::PaymentStatus,
        variants: &[
            variant(Direct, Requirement::LiveData, "Here is what I found for {reference}: {live}. Payments normally reach your bank account within three working days of approval."),
            variant(Moderate, Requirement::Reference, "Thanks for the reference {reference}. Approved payments are made monthly and normally reach your bank account within three working days. If a payment is late, please confirm that your bank details on file are current."),
            variant(General, Requirement::None, "Approved compensation payments are made monthly and normally reach your bank account within three working days. If a payment is late, please confirm that your bank details on file are current, since most delays come from outdated account information."),
        ],
    },
    TemplateFamily {
        role: None,
        intent: Intent::PensionInquiry,
        variants: &[
            variant(Direct, Requirement::LiveData, "Here is the latest on your pension: {live}. Pensions are paid on the 25th of each month."),
            variant(General, Requirement::None, "Pensions for permanently disabled workers and dependants are paid on the 25th of each month. To keep payments running, submit a life certificate every year. If your circumstances change, for example a change of bank or address, let us know so payments aren't interrupted."),
        ],
    },
    TemplateFamily {
        role: None,
        intent: Intent::EmployerRegistration,
        variants: &[variant(General, Requirement::None, "Employers register with {organization} on the e-services portal at {portal}. You will need your business registration certificate, tax identification number and the number of employees with their monthly earnings. Registration is free, and you receive an employer registration number once the details are verified.")],
    },
    TemplateFamily {
        role: None,
        intent: Intent::ContributionPayment,
        variants: &[
            variant(Moderate, Requirement::Reference, "For employer {reference}, contributions are due by the last day of the following month. Generate a control number on the e-services portal at {portal} and pay through your bank or mobile money. Late payments attract a penalty, so pay on time even if the payroll is still being finalised."),
            variant(General, Requirement::None, "Contributions are due by the last day of the month following the payroll month. Generate a control number on the e-services portal at {portal} and pay through your bank or mobile money. Late payments attract a penalty."),
        ],
    },
    TemplateFamily {
        role: Some(Role::Employer),
        intent: Intent::ContributionPayment,
        variants: &[variant(General, Requirement::None, "Contributions for your employees are due by the last day of the month following the payroll month. Submit the monthly return on the e-services portal at {portal}, generate a control number and pay through your bank or mobile money. Keeping returns current also keeps your compliance certificate valid.")],
    },
    TemplateFamily {
        role: None,
        intent: Intent::DocumentRequest,
        variants: &[variant(General, Requirement::None, "Most forms, including the accident notification form and the claim form, can be downloaded from the e-services portal at {portal}. Certificates and official letters are issued on request through the portal or at any {organization} office. Tell me which document you need if you can't find it.")],
    },
    TemplateFamily {
        role: None,
        intent: Intent::TechnicalHelp,
        variants: &[variant(General, Requirement::None, "Sorry about the trouble with the portal. Try resetting your password with the 'Forgot password' link, and make sure the one-time code is entered within five minutes. If the problem continues, our support team can unlock your account on {phone} or at {email}.")],
    },
    TemplateFamily {
        role: None,
        intent: Intent::Unknown,
        variants: &[variant(General, Requirement::None, "I can help with compensation claims, payments and pensions, employer registration and contributions, and forms or certificates. You'll find most services on the e-services portal at {portal}.")],
    },
];

/// Short resource pointers appended after the core answer.
static RESOURCES: &[(Intent, &str)] = &[
    (Intent::ClaimSubmission, "The accident notification form is on the e-services portal at {portal}."),
    (Intent::ClaimStatus, "You can track every claim stage at {portal}."),
    (Intent::PaymentStatus, "Payment history is available under My Payments at {portal}."),
    (Intent::PensionInquiry, "Life certificate forms are available at {portal}."),
    (Intent::EmployerRegistration, "The employer registration guide is available at {portal}."),
    (Intent::ContributionPayment, "Contribution statements can be downloaded at {portal}."),
    (Intent::DocumentRequest, "All downloadable forms are listed at {portal}."),
    (Intent::TechnicalHelp, "Portal user guides are available at {portal}."),
    (Intent::Complaint, "You can also email {email} to add details to your complaint."),
];

/// Appended to comprehensive replies.
pub const EXTRA_RESOURCES: &str =
    "For anything else, call {phone} or email {email}, and we'll be glad to help.";

pub const TRAUMA_NOTE: &str = "I'm very sorry for what you are going through. Dependants and seriously injured workers receive priority support, and a case officer can guide you through each step.";
pub const FINANCIAL_NOTE: &str = "If you are facing financial hardship while this is processed, please tell us, since urgent cases can be prioritised.";
pub const COMPLEXITY_NOTE: &str = "Because your situation involves several parts, a case officer can walk you through it on {phone} if that is easier.";

pub const CLARIFICATION_CLOSING: &str = "Once I have that, I can give you a precise answer.";
pub const ESCALATION_OFFER: &str =
    "If you would rather speak to someone, our customer care team is available on {phone}.";
pub const LIVE_DATA_LEAD: &str = "Latest record:";
pub const SNIPPET_LEAD: &str = "You may also find this helpful:";

/// Opening line for a reply when the message needs empathy or urgency.
pub fn acknowledgment(emotion: Emotion) -> Option<&'static str> {
    match emotion {
        Emotion::Frustrated => Some("I'm really sorry for the frustration this has caused, and I understand how hard it is to keep waiting."),
        Emotion::Urgent => Some("I understand this is urgent, so let's sort it out quickly."),
        Emotion::Worried => Some("I understand this is worrying, and I'm here to help."),
        Emotion::Confused => Some("I understand this can be confusing, so let me make it clearer."),
        Emotion::Satisfied | Emotion::Neutral => None,
    }
}

/// Tone-matched opener for a clarification turn without an emotional signal.
pub fn tone_opener(tone: Tone) -> &'static str {
    match tone {
        Tone::Supportive => "Thanks for reaching out.",
        Tone::Professional => "Thank you for contacting us.",
        Tone::Formal => "Thank you for your enquiry.",
        Tone::Collegial => "Sure, happy to help.",
    }
}

/// Lookup over the static template tables
pub struct TemplateLibrary {
    families: &'static [TemplateFamily],
}

impl Default for TemplateLibrary {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateLibrary {
    pub fn new() -> Self {
        Self { families: FAMILIES }
    }

    /// Restricted library, used to exercise the missing-family path.
    pub fn with_families(families: &'static [TemplateFamily]) -> Self {
        Self { families }
    }

    /// The family for (role, intent), falling back to the role-independent one.
    pub fn family(&self, role: Role, intent: Intent) -> Option<&'static TemplateFamily> {
        self.families
            .iter()
            .find(|f| f.intent == intent && f.role == Some(role))
            .or_else(|| {
                self.families
                    .iter()
                    .find(|f| f.intent == intent && f.role.is_none())
            })
    }

    pub fn resources(&self, intent: Intent) -> Option<&'static str> {
        RESOURCES
            .iter()
            .find(|(i, _)| *i == intent)
            .map(|(_, text)| *text)
    }
}
