#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of a registration lead.
///
/// `Partial` is the only non-terminal state. Once a row reaches `Completed`
/// or `Abandoned` it must never be written back to `Partial`.
///
/// When the `sea-orm` feature is enabled, this enum can be used directly in SeaORM entities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "PascalCase")]
pub enum RegistrationStatus {
    /// Draft being autosaved; the form has not been submitted.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Partial"))]
    Partial,
    /// Form submitted with payment proof.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Completed"))]
    Completed,
    /// Marked by an external inactivity sweep while still partial.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Abandoned"))]
    Abandoned,
}

impl RegistrationStatus {
    /// Returns true if no further transition is allowed.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Partial)
    }

    /// Whether moving from `self` to `next` is a legal lifecycle step.
    ///
    /// Rewriting a `Partial` row as `Partial` is allowed (autosave).
    pub fn can_transition_to(&self, next: RegistrationStatus) -> bool {
        matches!((self, next), (Self::Partial, _))
    }

    pub const ALL: &'static [RegistrationStatus] = &[Self::Partial, Self::Completed, Self::Abandoned];

    /// Returns the string representation (PascalCase).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Partial => "Partial",
            Self::Completed => "Completed",
            Self::Abandoned => "Abandoned",
        }
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for RegistrationStatus {
    fn default() -> Self {
        Self::Partial
    }
}

/// Error when parsing an invalid status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStatusError {
    invalid: String,
}

impl fmt::Display for ParseStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid status '{}'. Valid values: {}",
            self.invalid,
            RegistrationStatus::ALL
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

impl std::error::Error for ParseStatusError {}

impl FromStr for RegistrationStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Partial" => Ok(Self::Partial),
            "Completed" => Ok(Self::Completed),
            "Abandoned" => Ok(Self::Abandoned),
            _ => Err(ParseStatusError {
                invalid: s.to_string(),
            }),
        }
    }
}
