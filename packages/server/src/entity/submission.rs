use common::{CodeCategory, SubmissionState};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// An accepted, immutable submission.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "submission")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// At most one submission per code.
    #[sea_orm(unique)]
    pub code: String,
    #[sea_orm(belongs_to, from = "code", to = "code")]
    pub access_code: HasOne<super::code::Entity>,

    #[serde(rename = "type")]
    #[sea_orm(column_name = "type")]
    pub kind: CodeCategory,

    /// PhotoSet: first image and its caption.
    pub file1_url: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub desc1: Option<String>,
    /// PhotoSet: optional second image and its caption.
    pub file2_url: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub desc2: Option<String>,
    /// Essay: the document.
    pub pdf_url: Option<String>,

    pub created_at: DateTimeUtc,
    pub status: SubmissionState,
}

impl ActiveModelBehavior for ActiveModel {}
