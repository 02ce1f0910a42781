use chrono::{DateTime, Utc};
use common::{ChangeEvent, CodeCategory, SubmissionState};
use sea_orm::sea_query::Expr;
use sea_orm::TransactionSession;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set, SqlErr,
    TransactionTrait,
};

use crate::entity::{code, submission};
use crate::error::AppError;

use super::normalize_code;
use super::window::SubmissionWindow;

/// Table name used in change events for submission rows.
pub const TABLE: &str = "submission";

#[derive(Debug, thiserror::Error)]
pub enum RedemptionError {
    #[error("submission window is not yet open")]
    NotYetOpen,
    #[error("submission window is closed")]
    Closed,
    #[error("access code not found")]
    CodeNotFound,
    #[error("access code has already been used")]
    AlreadyUsed,
    #[error("access code is for {expected} submissions, not {actual}")]
    CategoryMismatch {
        expected: CodeCategory,
        actual: CodeCategory,
    },
    #[error("{0}")]
    Invalid(String),
    #[error(transparent)]
    Db(#[from] DbErr),
}

impl From<RedemptionError> for AppError {
    fn from(err: RedemptionError) -> Self {
        match err {
            RedemptionError::NotYetOpen => AppError::WindowNotOpen,
            RedemptionError::Closed => AppError::WindowClosed,
            RedemptionError::CodeNotFound => AppError::CodeNotFound,
            RedemptionError::AlreadyUsed => AppError::CodeAlreadyUsed,
            e @ RedemptionError::CategoryMismatch { .. } => AppError::Validation(e.to_string()),
            RedemptionError::Invalid(msg) => AppError::Validation(msg),
            RedemptionError::Db(e) => AppError::Internal(e.to_string()),
        }
    }
}

/// Stored references for a submission about to be accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewSubmission {
    PhotoSet {
        file1_url: String,
        desc1: String,
        second: Option<(String, String)>,
    },
    Essay {
        pdf_url: String,
    },
}

impl NewSubmission {
    pub fn category(&self) -> CodeCategory {
        match self {
            Self::PhotoSet { .. } => CodeCategory::PhotoSet,
            Self::Essay { .. } => CodeCategory::Essay,
        }
    }

    fn into_active_model(self, code: String, now: DateTime<Utc>) -> submission::ActiveModel {
        let kind = self.category();
        let (file1_url, desc1, file2_url, desc2, pdf_url) = match self {
            Self::PhotoSet {
                file1_url,
                desc1,
                second,
            } => {
                let (file2_url, desc2) = second.unzip();
                (Some(file1_url), Some(desc1), file2_url, desc2, None)
            }
            Self::Essay { pdf_url } => (None, None, None, None, Some(pdf_url)),
        };
        submission::ActiveModel {
            code: Set(code),
            kind: Set(kind),
            file1_url: Set(file1_url),
            desc1: Set(desc1),
            file2_url: Set(file2_url),
            desc2: Set(desc2),
            pdf_url: Set(pdf_url),
            created_at: Set(now),
            status: Set(SubmissionState::Submitted),
            ..Default::default()
        }
    }
}

/// A committed redemption: the code is spent and the submission row exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accepted {
    pub submission: submission::Model,
}

impl Accepted {
    pub fn to_event(&self) -> Result<ChangeEvent, serde_json::Error> {
        ChangeEvent::insert(TABLE, &self.submission)
    }
}

pub struct RedemptionService<'a, C: ConnectionTrait> {
    conn: &'a C,
    window: SubmissionWindow,
}

impl<'a, C: ConnectionTrait + TransactionTrait> RedemptionService<'a, C> {
    pub fn new(conn: &'a C, window: SubmissionWindow) -> Self {
        Self { conn, window }
    }

    /// Look up an unused code, checking the window first.
    pub async fn find_usable(
        &self,
        raw: &str,
        now: DateTime<Utc>,
    ) -> Result<code::Model, RedemptionError> {
        self.window.check(now)?;
        let code = normalize_code(raw).ok_or(RedemptionError::CodeNotFound)?;
        let row = code::Entity::find_by_id(code)
            .one(self.conn)
            .await?
            .ok_or(RedemptionError::CodeNotFound)?;
        if row.used {
            return Err(RedemptionError::AlreadyUsed);
        }
        Ok(row)
    }

    /// Spend `raw` and record the submission in one transaction.
    ///
    /// The code flips to used only if it was unused and of the submission's
    /// category; of any number of concurrent calls for the same code, exactly
    /// one commits.
    pub async fn accept(
        &self,
        raw: &str,
        new: NewSubmission,
        now: DateTime<Utc>,
    ) -> Result<Accepted, RedemptionError> {
        self.window.check(now)?;
        let code = normalize_code(raw).ok_or(RedemptionError::CodeNotFound)?;
        let category = new.category();
        let txn = self.conn.begin().await?;

        let claimed = code::Entity::update_many()
            .col_expr(code::Column::Used, Expr::value(true))
            .filter(code::Column::Code.eq(code.clone()))
            .filter(code::Column::Used.eq(false))
            .filter(code::Column::Category.eq(category))
            .exec(&txn)
            .await?;

        if claimed.rows_affected == 0 {
            let current = code::Entity::find_by_id(code.clone()).one(&txn).await?;
            return Err(match current {
                None => RedemptionError::CodeNotFound,
                Some(row) if row.used => RedemptionError::AlreadyUsed,
                Some(row) => RedemptionError::CategoryMismatch {
                    expected: row.category,
                    actual: category,
                },
            });
        }

        let inserted = match new.into_active_model(code.clone(), now).insert(&txn).await {
            Ok(model) => model,
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                tracing::warn!(code = %code, "Submission already exists for unused code");
                return Err(RedemptionError::AlreadyUsed);
            }
            Err(e) => return Err(e.into()),
        };
        txn.commit().await?;

        tracing::info!(code = %code, id = inserted.id, kind = ?category, "Submission accepted");
        Ok(Accepted {
            submission: inserted,
        })
    }
}
