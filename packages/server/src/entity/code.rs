use common::CodeCategory;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A pre-issued single-use access code.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "code")]
pub struct Model {
    /// Normalized (trimmed, upper-case) code value.
    #[sea_orm(primary_key, auto_increment = false)]
    pub code: String,

    pub category: CodeCategory,

    /// Flips false -> true exactly once, when a submission is accepted.
    #[sea_orm(default_value = false)]
    pub used: bool,

    #[sea_orm(has_one)]
    pub submission: HasOne<super::submission::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
