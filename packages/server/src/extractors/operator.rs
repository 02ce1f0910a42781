use axum::{extract::FromRequestParts, http::request::Parts};
use subtle::ConstantTimeEq;

use crate::error::AppError;
use crate::state::AppState;

/// Caller holding the shared webhook secret in `Authorization: Bearer <secret>`.
///
/// Required on the change-event intake and the operator lifecycle routes.
/// An empty configured secret rejects every request.
pub struct Operator;

impl FromRequestParts<AppState> for Operator {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::TokenMissing)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AppError::TokenInvalid)?;

        if !matches_secret(token, &state.config.events.webhook_secret) {
            return Err(AppError::TokenInvalid);
        }

        Ok(Operator)
    }
}

fn matches_secret(token: &str, secret: &str) -> bool {
    !secret.is_empty() && bool::from(token.as_bytes().ct_eq(secret.as_bytes()))
}
