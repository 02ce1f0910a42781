use chrono::{DateTime, Utc};
use common::{ChangeEvent, RegistrationStatus};
use sea_orm::sea_query::{Expr, ExprTrait, LockType, OnConflict};
use sea_orm::TransactionSession;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};

use crate::entity::registration;

use super::draft::RegistrationDraft;
use super::error::RegistrationError;
use super::gate::CompletedRegistration;

/// Table name used in change events for registration rows.
pub const TABLE: &str = "registration";

/// Result of an autosave write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftOutcome {
    /// The draft has no email yet; nothing was written.
    NotPersistable,
    /// The row was inserted or updated and is `Partial`.
    Saved(registration::Model),
    /// The row is already terminal; the draft was ignored.
    Terminal(registration::Model),
}

/// A committed status change, carrying the row before and after.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub old: registration::Model,
    pub new: registration::Model,
}

impl Transition {
    pub fn to_event(&self) -> Result<ChangeEvent, serde_json::Error> {
        ChangeEvent::update(TABLE, &self.new, &self.old)
    }
}

/// Result of attempting a guarded status change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionResult {
    Applied(Transition),
    NotFound,
    /// The row had already left `Partial`.
    AlreadyTerminal(RegistrationStatus),
    /// The row was autosaved after the inactivity cutoff.
    Active,
}

impl TransitionResult {
    /// Treat anything but an applied change as an error for `email`.
    pub fn applied(self, email: &str) -> Result<Transition, RegistrationError> {
        match self {
            Self::Applied(t) => Ok(t),
            Self::NotFound => Err(RegistrationError::NotFound(email.to_string())),
            Self::AlreadyTerminal(status) => Err(RegistrationError::AlreadyTerminal {
                email: email.to_string(),
                status,
            }),
            Self::Active => Err(RegistrationError::Active(email.to_string())),
        }
    }
}

pub struct LeadService<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait + TransactionTrait> LeadService<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    /// Get a lead by its (normalized) email.
    pub async fn find(&self, email: &str) -> Result<Option<registration::Model>, DbErr> {
        registration::Entity::find_by_id(email.trim().to_lowercase())
            .one(self.conn)
            .await
    }

    /// Upsert an autosaved draft as `Partial`, keyed by email.
    ///
    /// The conflict update only applies while the stored row is still
    /// `Partial`, so a late autosave can never downgrade a terminal row.
    /// Proof URLs and the fee are left untouched.
    pub async fn save_draft(&self, draft: &RegistrationDraft) -> Result<DraftOutcome, DbErr> {
        let draft = draft.normalized();
        let Some(email) = draft.email.clone() else {
            return Ok(DraftOutcome::NotPersistable);
        };

        let now = Utc::now();
        let model = registration::ActiveModel {
            email: Set(email.clone()),
            name: Set(draft.name),
            whatsapp: Set(draft.whatsapp),
            role: Set(draft.role),
            college: Set(draft.college),
            year: Set(draft.year),
            category: Set(draft.category),
            discount_flag: Set(draft.discount_flag),
            proof1_url: Set(None),
            proof2_url: Set(None),
            amount: Set(None),
            status: Set(RegistrationStatus::Partial),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let on_conflict = OnConflict::column(registration::Column::Email)
            .update_columns([
                registration::Column::Name,
                registration::Column::Whatsapp,
                registration::Column::Role,
                registration::Column::College,
                registration::Column::Year,
                registration::Column::Category,
                registration::Column::DiscountFlag,
                registration::Column::UpdatedAt,
            ])
            .action_and_where(
                Expr::col((registration::Entity, registration::Column::Status))
                    .eq(RegistrationStatus::Partial.as_str()),
            )
            .to_owned();

        let result = registration::Entity::insert(model)
            .on_conflict(on_conflict)
            .exec_without_returning(self.conn)
            .await;
        match result {
            Ok(_) | Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e),
        }

        let row = self
            .find(&email)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("registration {email}")))?;

        if row.status.is_terminal() {
            Ok(DraftOutcome::Terminal(row))
        } else {
            Ok(DraftOutcome::Saved(row))
        }
    }

    /// Write the final values and move a `Partial` lead to `Completed`.
    ///
    /// A single guarded update keyed by email; never inserts.
    pub async fn complete(&self, record: &CompletedRegistration) -> Result<TransitionResult, DbErr> {
        let fields = &record.fields;
        let txn = self.conn.begin().await?;

        let Some(old) = registration::Entity::find_by_id(fields.email.clone())
            .lock(LockType::Update)
            .one(&txn)
            .await?
        else {
            return Ok(TransitionResult::NotFound);
        };
        if !old.status.can_transition_to(RegistrationStatus::Completed) {
            return Ok(TransitionResult::AlreadyTerminal(old.status));
        }

        let update_result = registration::Entity::update_many()
            .col_expr(registration::Column::Name, Expr::value(fields.name.clone()))
            .col_expr(
                registration::Column::Whatsapp,
                Expr::value(fields.whatsapp.clone()),
            )
            .col_expr(registration::Column::Role, Expr::value(fields.role.clone()))
            .col_expr(
                registration::Column::College,
                Expr::value(fields.college.clone()),
            )
            .col_expr(registration::Column::Year, Expr::value(fields.year.clone()))
            .col_expr(
                registration::Column::Category,
                Expr::value(fields.category.clone()),
            )
            .col_expr(
                registration::Column::DiscountFlag,
                Expr::value(fields.discount_flag),
            )
            .col_expr(
                registration::Column::Proof1Url,
                Expr::value(record.proofs.primary().to_string()),
            )
            .col_expr(
                registration::Column::Proof2Url,
                Expr::value(record.proofs.secondary().map(str::to_string)),
            )
            .col_expr(registration::Column::Amount, Expr::value(record.amount))
            .col_expr(
                registration::Column::Status,
                Expr::value(RegistrationStatus::Completed),
            )
            .col_expr(registration::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(registration::Column::Email.eq(fields.email.clone()))
            .filter(registration::Column::Status.eq(RegistrationStatus::Partial))
            .exec(&txn)
            .await?;

        if update_result.rows_affected == 0 {
            return Ok(TransitionResult::AlreadyTerminal(old.status));
        }

        let new = registration::Entity::find_by_id(fields.email.clone())
            .one(&txn)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("registration {}", fields.email)))?;
        txn.commit().await?;

        Ok(TransitionResult::Applied(Transition { old, new }))
    }

    /// Compare-and-swap `Partial -> Abandoned`.
    ///
    /// With `idle_before`, the swap also requires the row not to have been
    /// autosaved since that instant, so a sweep cannot abandon a lead the
    /// user is actively editing.
    pub async fn mark_abandoned(
        &self,
        email: &str,
        idle_before: Option<DateTime<Utc>>,
    ) -> Result<TransitionResult, DbErr> {
        let email = email.trim().to_lowercase();
        let txn = self.conn.begin().await?;

        let Some(old) = registration::Entity::find_by_id(email.clone())
            .lock(LockType::Update)
            .one(&txn)
            .await?
        else {
            return Ok(TransitionResult::NotFound);
        };
        if !old.status.can_transition_to(RegistrationStatus::Abandoned) {
            return Ok(TransitionResult::AlreadyTerminal(old.status));
        }

        let mut update = registration::Entity::update_many()
            .col_expr(
                registration::Column::Status,
                Expr::value(RegistrationStatus::Abandoned),
            )
            .col_expr(registration::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(registration::Column::Email.eq(email.clone()))
            .filter(registration::Column::Status.eq(RegistrationStatus::Partial));
        if let Some(cutoff) = idle_before {
            update = update.filter(registration::Column::UpdatedAt.lt(cutoff));
        }

        if update.exec(&txn).await?.rows_affected == 0 {
            return Ok(TransitionResult::Active);
        }

        let new = registration::Entity::find_by_id(email.clone())
            .one(&txn)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("registration {email}")))?;
        txn.commit().await?;

        Ok(TransitionResult::Applied(Transition { old, new }))
    }

    /// Abandon every `Partial` lead idle since before `cutoff`.
    ///
    /// Each row goes through [`Self::mark_abandoned`]; rows that completed
    /// or were edited in the meantime are skipped.
    pub async fn sweep_abandoned(&self, cutoff: DateTime<Utc>) -> Result<Vec<Transition>, DbErr> {
        let candidates: Vec<String> = registration::Entity::find()
            .filter(registration::Column::Status.eq(RegistrationStatus::Partial))
            .filter(registration::Column::UpdatedAt.lt(cutoff))
            .order_by_asc(registration::Column::UpdatedAt)
            .select_only()
            .column(registration::Column::Email)
            .into_tuple()
            .all(self.conn)
            .await?;

        let mut applied = Vec::new();
        for email in candidates {
            if let TransitionResult::Applied(t) = self.mark_abandoned(&email, Some(cutoff)).await? {
                applied.push(t);
            }
        }
        Ok(applied)
    }
}
