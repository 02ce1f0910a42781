#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Submission category an access code was issued for.
///
/// The category is fixed at issuance time and decides both the accepted
/// file shape and the spreadsheet a submission is mirrored into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "PascalCase")]
pub enum CodeCategory {
    /// One or two captioned images.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "PhotoSet"))]
    PhotoSet,
    /// A single document.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Essay"))]
    Essay,
}

impl CodeCategory {
    pub const ALL: &'static [CodeCategory] = &[Self::PhotoSet, Self::Essay];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PhotoSet => "PhotoSet",
            Self::Essay => "Essay",
        }
    }
}

impl fmt::Display for CodeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseCategoryError {
    invalid: String,
}

impl fmt::Display for ParseCategoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid category '{}'. Valid values: {}",
            self.invalid,
            CodeCategory::ALL
                .iter()
                .map(|c| c.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

impl std::error::Error for ParseCategoryError {}

/// Case-insensitive; also accepts the short forms `photo` and `essay`
/// used in code issuance sheets.
impl FromStr for CodeCategory {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "photoset" | "photo" => Ok(Self::PhotoSet),
            "essay" => Ok(Self::Essay),
            _ => Err(ParseCategoryError {
                invalid: s.to_string(),
            }),
        }
    }
}

/// State of an accepted submission. Submissions are immutable once written.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionState {
    #[default]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "submitted"))]
    Submitted,
}
