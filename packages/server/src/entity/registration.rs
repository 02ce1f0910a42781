use common::RegistrationStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One participant's registration lead, keyed by email.
///
/// Every field except `email` and `status` may be empty while the lead is
/// still `Partial`; autosave writes whatever the form holds.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "registration")]
pub struct Model {
    /// Lower-cased, trimmed email.
    #[sea_orm(primary_key, auto_increment = false)]
    pub email: String,

    pub name: Option<String>,
    pub whatsapp: Option<String>,
    pub role: Option<String>,
    pub college: Option<String>,
    pub year: Option<String>,
    pub category: Option<String>,

    /// Prior-discount eligibility. Requires a second payment proof.
    #[sea_orm(default_value = false)]
    pub discount_flag: bool,

    pub proof1_url: Option<String>,
    pub proof2_url: Option<String>,

    /// Fee computed at completion.
    pub amount: Option<i64>,

    #[sea_orm(indexed)]
    pub status: RegistrationStatus,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
