use std::path::Path;
use std::str::FromStr;

use common::CodeCategory;
use sea_orm::sea_query::{Index, OnConflict, PostgresQueryBuilder};
use sea_orm::{ConnectionTrait, DbErr, EntityTrait, Set};
use tracing::info;

use crate::entity::{code, registration, submission};
use crate::redemption::normalize_code;

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("failed to read code file: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {row}: {reason}")]
    Row { row: usize, reason: String },
    #[error(transparent)]
    Db(#[from] DbErr),
}

/// A code to issue and the category it unlocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCode {
    pub code: String,
    pub category: CodeCategory,
}

/// Parse `code,category` rows. A header row is optional.
pub fn parse_codes<R: std::io::Read>(reader: R) -> Result<Vec<IssuedCode>, SeedError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(false)
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_reader(reader);

    let mut codes = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        let row = idx + 1;
        let (Some(raw_code), Some(raw_category)) = (record.get(0), record.get(1)) else {
            return Err(SeedError::Row {
                row,
                reason: "expected `code,category`".into(),
            });
        };
        if row == 1 && raw_code.eq_ignore_ascii_case("code") {
            continue;
        }
        let code = normalize_code(raw_code).ok_or_else(|| SeedError::Row {
            row,
            reason: "code is empty".into(),
        })?;
        let category = CodeCategory::from_str(raw_category).map_err(|e| SeedError::Row {
            row,
            reason: e.to_string(),
        })?;
        codes.push(IssuedCode { code, category });
    }
    Ok(codes)
}

pub fn read_code_file(path: &Path) -> Result<Vec<IssuedCode>, SeedError> {
    let file = std::fs::File::open(path).map_err(csv::Error::from)?;
    parse_codes(file)
}

/// Insert codes as unused. Existing codes, used or not, are left unchanged.
///
/// Returns the number of codes newly issued.
pub async fn issue_codes<C: ConnectionTrait>(
    db: &C,
    codes: &[IssuedCode],
) -> Result<u64, DbErr> {
    let mut inserted = 0u64;
    for issued in codes {
        let model = code::ActiveModel {
            code: Set(issued.code.clone()),
            category: Set(issued.category),
            used: Set(false),
        };

        let result = code::Entity::insert(model)
            .on_conflict(
                OnConflict::column(code::Column::Code)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await;

        match result {
            Ok(n) => inserted += n,
            Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e),
        }
    }

    if inserted > 0 {
        info!("Issued {} new access codes", inserted);
    }
    Ok(inserted)
}

/// Ensure indexes that schema sync does not create.
pub async fn ensure_indexes<C: ConnectionTrait>(db: &C) -> Result<(), DbErr> {
    // Abandonment sweep: WHERE status = 'Partial' AND updated_at < ?
    let sweep = Index::create()
        .if_not_exists()
        .name("idx_registration_status_updated")
        .table(registration::Entity)
        .col(registration::Column::Status)
        .col(registration::Column::UpdatedAt)
        .to_string(PostgresQueryBuilder);

    // One submission per code, even if the entity attribute is dropped.
    let one_per_code = Index::create()
        .if_not_exists()
        .unique()
        .name("idx_submission_code_unique")
        .table(submission::Entity)
        .col(submission::Column::Code)
        .to_string(PostgresQueryBuilder);

    for (name, stmt) in [
        ("idx_registration_status_updated", sweep),
        ("idx_submission_code_unique", one_per_code),
    ] {
        match db.execute_unprepared(&stmt).await {
            Ok(_) => info!("Ensured index {} exists", name),
            Err(e) => tracing::warn!("Failed to create index {}: {}", name, e),
        }
    }

    Ok(())
}
