use axum::Json;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use chrono::Utc;
use tracing::instrument;

use crate::config::LimitsConfig;
use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::models::redemption::{
    SubmissionResponse, VerifyCodeRequest, VerifyCodeResponse, WindowResponse,
};
use crate::redemption::validate::validate_submission;
use crate::redemption::{NewSubmission, RedemptionService, SubmissionForm, SubmissionPayload};
use crate::state::AppState;
use crate::utils::upload::{read_file_field, read_text_field, store_file};

/// Two full-size images, or one document, plus captions and multipart framing.
pub fn submission_body_limit(limits: &LimitsConfig) -> DefaultBodyLimit {
    DefaultBodyLimit::max(limits.submission_body_bytes())
}

#[utoipa::path(
    get,
    path = "/window",
    tag = "Submissions",
    operation_id = "getWindow",
    summary = "Get the submission window",
    description = "Reports whether submissions are currently accepted. The window is the \
        half-open interval `[open, close)`.",
    responses(
        (status = 200, description = "Window status", body = WindowResponse),
    ),
)]
pub async fn get_window(State(state): State<AppState>) -> Json<WindowResponse> {
    let window = state.config.window;
    let now = Utc::now();
    Json(WindowResponse {
        status: window.status_at(now),
        open: window.open,
        close: window.close,
        now,
    })
}

#[utoipa::path(
    post,
    path = "/codes/verify",
    tag = "Submissions",
    operation_id = "verifyCode",
    summary = "Verify an access code",
    description = "Checks, in order, that the window is open, the code exists and it is unused. \
        Returns the category the code was issued for. Does not spend the code.",
    request_body = VerifyCodeRequest,
    responses(
        (status = 200, description = "Code may be redeemed", body = VerifyCodeResponse),
        (status = 403, description = "Window not open or closed (WINDOW_NOT_OPEN, WINDOW_CLOSED)", body = ErrorBody),
        (status = 404, description = "Unknown code (CODE_NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Code already used (CODE_ALREADY_USED)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, req), fields(code = %req.code))]
pub async fn verify_code(
    State(state): State<AppState>,
    AppJson(req): AppJson<VerifyCodeRequest>,
) -> Result<Json<VerifyCodeResponse>, AppError> {
    let code = RedemptionService::new(&state.db, state.config.window)
        .find_usable(&req.code, Utc::now())
        .await
        .inspect_err(|e| tracing::info!(error = %e, "Code verification rejected"))?;

    Ok(Json(VerifyCodeResponse {
        code: code.code,
        category: code.category,
    }))
}

#[utoipa::path(
    post,
    path = "/submissions",
    tag = "Submissions",
    operation_id = "createSubmission",
    summary = "Redeem a code with a submission",
    description = "Multipart form with `code` and, depending on the code's category, either \
        `image1`, `caption1` and optionally `image2`, `caption2` (PhotoSet) or `document` \
        (Essay). The window is checked again before anything is stored and once more when the \
        code is spent. Spending the code and recording the submission happen atomically; \
        concurrent redemptions of one code yield exactly one submission.",
    request_body(content_type = "multipart/form-data", description = "Code and submission files"),
    responses(
        (status = 201, description = "Submission accepted", body = SubmissionResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 403, description = "Window not open or closed (WINDOW_NOT_OPEN, WINDOW_CLOSED)", body = ErrorBody),
        (status = 404, description = "Unknown code (CODE_NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Code already used (CODE_ALREADY_USED)", body = ErrorBody),
        (status = 502, description = "File upload failed (UPLOAD_FAILED)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, multipart))]
pub async fn create_submission(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<SubmissionResponse>), AppError> {
    let window = state.config.window;
    window.check(Utc::now())?;

    let limits = &state.config.limits;
    let mut form = SubmissionForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        match field.name() {
            Some("code") => form.code = Some(read_text_field(field).await?),
            Some("caption1") => form.caption1 = Some(read_text_field(field).await?),
            Some("caption2") => form.caption2 = Some(read_text_field(field).await?),
            Some("image1") => {
                form.image1 = Some(read_file_field(field, limits.max_image_bytes).await?)
            }
            Some("image2") => {
                form.image2 = Some(read_file_field(field, limits.max_image_bytes).await?)
            }
            Some("document") => {
                form.document = Some(read_file_field(field, limits.max_document_bytes).await?)
            }
            _ => {}
        }
    }

    let raw_code = form
        .code
        .take()
        .ok_or_else(|| AppError::Validation("Missing 'code' field".into()))?;
    let service = RedemptionService::new(&state.db, window);
    let code = service.find_usable(&raw_code, Utc::now()).await?;
    let payload = validate_submission(code.category, form, limits)?;

    let store = state.object_store.as_ref();
    let new = match payload {
        SubmissionPayload::PhotoSet { first, second } => {
            let file1 = store_file(store, "submissions", &first.image).await?;
            let second = match second {
                Some(img) => {
                    let file2 = store_file(store, "submissions", &img.image).await?;
                    Some((file2.url, img.caption))
                }
                None => None,
            };
            NewSubmission::PhotoSet {
                file1_url: file1.url,
                desc1: first.caption,
                second,
            }
        }
        SubmissionPayload::Essay { document } => {
            let pdf = store_file(store, "submissions", &document).await?;
            NewSubmission::Essay { pdf_url: pdf.url }
        }
    };

    let accepted = service
        .accept(&code.code, new, Utc::now())
        .await
        .inspect_err(|e| tracing::warn!(code = %code.code, error = %e, "Redemption rejected"))?;

    state
        .dispatcher
        .dispatch_after_commit(accepted.to_event())
        .await;

    Ok((StatusCode::CREATED, Json(accepted.submission.into())))
}
