use common::RegistrationStatus;
use sea_orm::DbErr;

use crate::error::AppError;

#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error("{}", .0.join("; "))]
    Invalid(Vec<String>),
    #[error("no draft registration exists for {0}")]
    NotFound(String),
    #[error("registration for {email} is already {status}")]
    AlreadyTerminal {
        email: String,
        status: RegistrationStatus,
    },
    #[error("registration for {0} was edited after the inactivity cutoff")]
    Active(String),
    #[error(transparent)]
    Db(#[from] DbErr),
}

impl From<RegistrationError> for AppError {
    fn from(err: RegistrationError) -> Self {
        match err {
            RegistrationError::Invalid(_) => AppError::Validation(err.to_string()),
            RegistrationError::NotFound(_) => AppError::NotFound(err.to_string()),
            RegistrationError::AlreadyTerminal { .. } | RegistrationError::Active(_) => {
                AppError::Conflict(err.to_string())
            }
            RegistrationError::Db(e) => AppError::Internal(e.to_string()),
        }
    }
}
