use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::service::RedemptionError;

/// Where an instant falls relative to the submission window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub enum WindowStatus {
    NotYetOpen,
    Open,
    Closed,
}

/// The half-open interval `[open, close)` during which redemptions are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SubmissionWindow {
    pub open: DateTime<Utc>,
    pub close: DateTime<Utc>,
}

impl SubmissionWindow {
    /// Reject an empty or inverted interval.
    pub fn validate(&self) -> Result<(), String> {
        if self.open >= self.close {
            return Err(format!(
                "submission window must open before it closes (open={}, close={})",
                self.open, self.close
            ));
        }
        Ok(())
    }

    pub fn status_at(&self, now: DateTime<Utc>) -> WindowStatus {
        if now < self.open {
            WindowStatus::NotYetOpen
        } else if now >= self.close {
            WindowStatus::Closed
        } else {
            WindowStatus::Open
        }
    }

    /// Gate a redemption step at `now`.
    pub fn check(&self, now: DateTime<Utc>) -> Result<(), RedemptionError> {
        match self.status_at(now) {
            WindowStatus::Open => Ok(()),
            WindowStatus::NotYetOpen => Err(RedemptionError::NotYetOpen),
            WindowStatus::Closed => Err(RedemptionError::Closed),
        }
    }
}
