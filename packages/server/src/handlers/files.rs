use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::Response;
use common::storage::ObjectKey;
use tokio_util::io::ReaderStream;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/v1/files/{key}",
    tag = "Files",
    operation_id = "getFile",
    summary = "Download a stored file",
    description = "Streams an uploaded proof or submission file by its storage key.",
    params(("key" = String, Path, description = "Object key, e.g. `proofs/0193...-receipt.jpg`")),
    responses(
        (status = 200, description = "File content"),
        (status = 400, description = "Malformed key (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "No such file (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_file(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Response, AppError> {
    let key = ObjectKey::parse(&key)?;
    let reader = state.object_store.get_stream(&key).await?;
    let content_type = mime_guess::from_path(key.as_str()).first_or_octet_stream();

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type.as_ref())
        .header(header::CACHE_CONTROL, "public, max-age=86400, immutable")
        .header(header::X_CONTENT_TYPE_OPTIONS, "nosniff")
        .body(Body::from_stream(ReaderStream::new(reader)))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}
