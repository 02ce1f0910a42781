use chrono::{DateTime, Utc};
use common::RegistrationStatus;
use serde::{Deserialize, Serialize};

use crate::entity::registration;

/// Response DTO for a registration lead.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct RegistrationResponse {
    #[schema(example = "a@x.com")]
    pub email: String,
    pub name: Option<String>,
    pub whatsapp: Option<String>,
    pub role: Option<String>,
    pub college: Option<String>,
    pub year: Option<String>,
    pub category: Option<String>,
    pub discount_flag: bool,
    /// Primary payment proof URL. Set on completion.
    pub proof1_url: Option<String>,
    /// Discount proof URL. Set only when the discount was claimed.
    pub proof2_url: Option<String>,
    /// Fee charged, set on completion.
    #[schema(example = 150000)]
    pub amount: Option<i64>,
    pub status: RegistrationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<registration::Model> for RegistrationResponse {
    fn from(m: registration::Model) -> Self {
        Self {
            email: m.email,
            name: m.name,
            whatsapp: m.whatsapp,
            role: m.role,
            college: m.college,
            year: m.year,
            category: m.category,
            discount_flag: m.discount_flag,
            proof1_url: m.proof1_url,
            proof2_url: m.proof2_url,
            amount: m.amount,
            status: m.status,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// Result of an autosave.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct DraftSaveResponse {
    /// False when the draft has no email yet and nothing was written.
    pub persisted: bool,
    /// True when the stored row is already terminal and the draft was ignored.
    pub ignored: bool,
    pub registration: Option<RegistrationResponse>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SweepQuery {
    /// Abandon `Partial` leads not autosaved for this many minutes.
    #[param(example = 60, minimum = 1)]
    pub inactivity_minutes: i64,
}

/// Result of an abandonment sweep.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SweepResponse {
    /// Number of leads moved to `Abandoned`.
    #[schema(example = 2)]
    pub abandoned: usize,
    pub emails: Vec<String>,
    pub cutoff: DateTime<Utc>,
}
