use crate::config::RegistrationConfig;

use super::draft::RegistrationDraft;

/// Longest accepted name, in characters.
const MAX_NAME_CHARS: usize = 120;

/// Form rules that depend on configuration.
#[derive(Debug, Clone)]
pub struct GateRules {
    /// Role value for which the college field may be left empty.
    pub college_exempt_role: String,
    pub standard_fee: i64,
    pub discounted_fee: i64,
}

impl GateRules {
    pub fn from_config(config: &RegistrationConfig) -> Self {
        Self {
            college_exempt_role: config.college_exempt_role.clone(),
            standard_fee: config.standard_fee,
            discounted_fee: config.discounted_fee,
        }
    }

    fn college_required(&self, role: Option<&str>) -> bool {
        !role.is_some_and(|r| r.trim().eq_ignore_ascii_case(&self.college_exempt_role))
    }

    fn fee_for(&self, discount: bool) -> i64 {
        if discount {
            self.discounted_fee
        } else {
            self.standard_fee
        }
    }
}

/// Which payment proofs are attached to a submit attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProofPresence {
    pub primary: bool,
    pub secondary: bool,
}

/// Stored payment proof references. `Pair` only when both references exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentProofs {
    Single(String),
    Pair(String, String),
}

impl PaymentProofs {
    /// Build from stored references; `None` when there is nothing to show.
    ///
    /// A row carrying only the second reference yields `Single`, since a
    /// photo group needs two images.
    pub fn from_refs(primary: Option<&str>, secondary: Option<&str>) -> Option<Self> {
        fn nonblank(s: Option<&str>) -> Option<&str> {
            s.map(str::trim).filter(|s| !s.is_empty())
        }
        match (nonblank(primary), nonblank(secondary)) {
            (Some(a), Some(b)) => Some(Self::Pair(a.to_string(), b.to_string())),
            (Some(a), None) | (None, Some(a)) => Some(Self::Single(a.to_string())),
            (None, None) => None,
        }
    }

    pub fn primary(&self) -> &str {
        match self {
            Self::Single(a) | Self::Pair(a, _) => a,
        }
    }

    pub fn secondary(&self) -> Option<&str> {
        match self {
            Self::Single(_) => None,
            Self::Pair(_, b) => Some(b),
        }
    }
}

/// A draft whose every field passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRegistration {
    pub email: String,
    pub name: String,
    pub whatsapp: String,
    pub role: String,
    pub college: Option<String>,
    pub year: String,
    pub category: String,
    pub discount_flag: bool,
}

/// Final values written when a lead completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedRegistration {
    pub fields: ValidatedRegistration,
    pub proofs: PaymentProofs,
    pub amount: i64,
}

fn present(v: &Option<String>) -> bool {
    v.as_deref().is_some_and(|s| !s.trim().is_empty())
}

/// Whether the draft can be submitted in its current state.
///
/// Presence only; [`validate`] applies the format rules on submit.
pub fn is_submittable(draft: &RegistrationDraft, proofs: ProofPresence, rules: &GateRules) -> bool {
    present(&draft.role)
        && present(&draft.category)
        && present(&draft.name)
        && present(&draft.whatsapp)
        && draft.is_persistable()
        && present(&draft.year)
        && (!rules.college_required(draft.role.as_deref()) || present(&draft.college))
        && proofs.primary
        && proofs.secondary == draft.discount_flag
}

/// Re-check every field of the draft. Returns all problems at once.
pub fn validate(
    draft: &RegistrationDraft,
    proofs: ProofPresence,
    rules: &GateRules,
) -> Result<ValidatedRegistration, Vec<String>> {
    let draft = draft.normalized();
    let mut errors = Vec::new();

    let mut required = |value: &Option<String>, label: &str| -> String {
        match value {
            Some(v) => v.clone(),
            None => {
                errors.push(format!("{label} is required"));
                String::new()
            }
        }
    };

    let role = required(&draft.role, "Role");
    let category = required(&draft.category, "Category");
    let name = required(&draft.name, "Name");
    let whatsapp = required(&draft.whatsapp, "WhatsApp number");
    let email = required(&draft.email, "Email");
    let year = required(&draft.year, "Year of study");

    if rules.college_required(Some(role.as_str())) && draft.college.is_none() {
        errors.push("College is required".into());
    }
    if name.chars().count() > MAX_NAME_CHARS {
        errors.push(format!("Name must be at most {MAX_NAME_CHARS} characters"));
    }
    if !whatsapp.is_empty() && !is_valid_phone(&whatsapp) {
        errors.push("WhatsApp number must contain 8-15 digits".into());
    }
    if !email.is_empty() && !is_valid_email(&email) {
        errors.push("Email is not valid".into());
    }

    if !proofs.primary {
        errors.push("Payment proof is required".into());
    }
    match (draft.discount_flag, proofs.secondary) {
        (true, false) => errors.push("Discount proof is required when claiming the discount".into()),
        (false, true) => errors.push("Discount proof is only accepted when claiming the discount".into()),
        _ => {}
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(ValidatedRegistration {
        email,
        name,
        whatsapp,
        role,
        college: draft.college,
        year,
        category,
        discount_flag: draft.discount_flag,
    })
}

/// Combine validated fields with uploaded proof URLs and the computed fee.
pub fn build_final_record(
    fields: ValidatedRegistration,
    proofs: PaymentProofs,
    rules: &GateRules,
) -> CompletedRegistration {
    let amount = rules.fee_for(fields.discount_flag);
    CompletedRegistration {
        fields,
        proofs,
        amount,
    }
}

fn is_valid_phone(raw: &str) -> bool {
    let body = raw.strip_prefix('+').unwrap_or(raw);
    let mut digits = 0;
    for c in body.chars() {
        match c {
            '0'..='9' => digits += 1,
            ' ' | '-' => {}
            _ => return false,
        }
    }
    (8..=15).contains(&digits)
}

fn is_valid_email(raw: &str) -> bool {
    let Some((local, domain)) = raw.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !raw.chars().any(char::is_whitespace)
}
