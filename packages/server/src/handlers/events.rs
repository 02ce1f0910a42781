use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use common::ChangeEvent;
use tracing::instrument;

use crate::dispatch::DispatchOutcome;
use crate::error::{AppError, ErrorBody};
use crate::extractors::operator::Operator;
use crate::models::event::EventResponse;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/events",
    tag = "Events",
    operation_id = "receiveEvent",
    summary = "Receive a row-change event",
    description = "Accepts `{ type, table?, record, old_record }` from an external writer and \
        runs the matching handler: abandonment or completion notification for registration \
        updates, spreadsheet ingestion for submission inserts. Events needing no action, \
        including unrecognised shapes, are acknowledged with `handler: ignored`. A failing \
        handler returns 502 and is not retried.",
    request_body(content_type = "application/json", description = "Change event"),
    responses(
        (status = 200, description = "Event handled or ignored", body = EventResponse),
        (status = 401, description = "Missing or wrong secret (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 502, description = "Handler failed (DOWNSTREAM_FAILED)", body = ErrorBody),
    ),
    security(("webhook_secret" = [])),
)]
#[instrument(skip(state, _operator, body))]
pub async fn receive_event(
    _operator: Operator,
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<EventResponse>, AppError> {
    let event: ChangeEvent = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(e) => {
            tracing::debug!(error = %e, "Unparseable event ignored");
            return Ok(Json(
                DispatchOutcome::Ignored(format!("unrecognised payload: {e}")).into(),
            ));
        }
    };

    let outcome = state.dispatcher.dispatch(&event).await.inspect_err(|e| {
        tracing::error!(kind = ?event.kind, table = ?event.table, error = %e, "Event handler failed");
    })?;
    Ok(Json(outcome.into()))
}
