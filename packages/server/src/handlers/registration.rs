use axum::Json;
use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::StatusCode;
use chrono::{Duration, Utc};
use tracing::instrument;

use crate::config::LimitsConfig;
use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::extractors::operator::Operator;
use crate::lifecycle::gate::{self, GateRules};
use crate::lifecycle::{
    DraftOutcome, LeadService, PaymentProofs, ProofPresence, RegistrationDraft, RegistrationError,
};
use crate::models::registration::{
    DraftSaveResponse, RegistrationResponse, SweepQuery, SweepResponse,
};
use crate::state::AppState;
use crate::utils::upload::{
    IMAGE_TYPES, UploadedFile, read_file_field, read_text_field, store_file,
};

/// Two proofs plus the draft JSON and multipart framing.
pub fn submit_body_limit(limits: &LimitsConfig) -> DefaultBodyLimit {
    DefaultBodyLimit::max(limits.registration_body_bytes())
}

#[utoipa::path(
    put,
    path = "/draft",
    tag = "Registrations",
    operation_id = "saveDraft",
    summary = "Autosave a registration draft",
    description = "Upserts the draft as a `Partial` lead keyed by email. A draft without an \
        email is not persisted (202). A lead that already completed or was abandoned is left \
        untouched and reported with `ignored: true`.",
    request_body = RegistrationDraft,
    responses(
        (status = 200, description = "Draft saved or ignored", body = DraftSaveResponse),
        (status = 202, description = "Draft has no email yet; nothing written", body = DraftSaveResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, draft))]
pub async fn save_draft(
    State(state): State<AppState>,
    AppJson(draft): AppJson<RegistrationDraft>,
) -> Result<(StatusCode, Json<DraftSaveResponse>), AppError> {
    let outcome = LeadService::new(&state.db).save_draft(&draft).await?;

    let response = match outcome {
        DraftOutcome::NotPersistable => {
            return Ok((
                StatusCode::ACCEPTED,
                Json(DraftSaveResponse {
                    persisted: false,
                    ignored: false,
                    registration: None,
                }),
            ));
        }
        DraftOutcome::Saved(row) => DraftSaveResponse {
            persisted: true,
            ignored: false,
            registration: Some(row.into()),
        },
        DraftOutcome::Terminal(row) => {
            tracing::debug!(email = %row.email, status = %row.status, "Draft for terminal lead ignored");
            DraftSaveResponse {
                persisted: false,
                ignored: true,
                registration: Some(row.into()),
            }
        }
    };
    Ok((StatusCode::OK, Json(response)))
}

#[utoipa::path(
    get,
    path = "/{email}",
    tag = "Registrations",
    operation_id = "getRegistration",
    summary = "Get a registration lead",
    params(("email" = String, Path, description = "Lead email (case-insensitive)")),
    responses(
        (status = 200, description = "Registration", body = RegistrationResponse),
        (status = 404, description = "No lead for this email (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_registration(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<RegistrationResponse>, AppError> {
    let row = LeadService::new(&state.db)
        .find(&email)
        .await?
        .ok_or_else(|| AppError::NotFound("Registration not found".into()))?;
    Ok(Json(row.into()))
}

#[utoipa::path(
    post,
    path = "/submit",
    tag = "Registrations",
    operation_id = "submitRegistration",
    summary = "Complete a registration",
    description = "Multipart form with a `draft` JSON part, a required `proof1` image and, when \
        the discount is claimed, a `proof2` image. Every field is re-validated, proofs are \
        uploaded, and the lead moves to `Completed` in one guarded update. On any failure the \
        lead stays `Partial`.",
    request_body(content_type = "multipart/form-data", description = "Draft JSON and payment proofs"),
    responses(
        (status = 200, description = "Registration completed", body = RegistrationResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 409, description = "Lead already completed or abandoned (CONFLICT)", body = ErrorBody),
        (status = 502, description = "Proof upload failed (UPLOAD_FAILED)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, multipart))]
pub async fn submit_registration(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<RegistrationResponse>, AppError> {
    let max_proof = state.config.limits.max_proof_bytes;
    let mut draft: Option<RegistrationDraft> = None;
    let mut proof1: Option<UploadedFile> = None;
    let mut proof2: Option<UploadedFile> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        match field.name() {
            Some("draft") => {
                let raw = read_text_field(field).await?;
                draft = Some(
                    serde_json::from_str(&raw)
                        .map_err(|e| AppError::Validation(format!("Invalid draft: {e}")))?,
                );
            }
            Some("proof1") => proof1 = Some(read_file_field(field, max_proof).await?),
            Some("proof2") => proof2 = Some(read_file_field(field, max_proof).await?),
            _ => {}
        }
    }

    let draft = draft.ok_or_else(|| AppError::Validation("Missing 'draft' field".into()))?;
    let rules = GateRules::from_config(&state.config.registration);
    let presence = ProofPresence {
        primary: proof1.is_some(),
        secondary: proof2.is_some(),
    };
    let fields = gate::validate(&draft, presence, &rules).map_err(RegistrationError::Invalid)?;

    let mut problems = Vec::new();
    for (file, label) in [(&proof1, "Payment proof"), (&proof2, "Discount proof")] {
        if let Some(file) = file
            && let Err(msg) = file.check(IMAGE_TYPES, max_proof, label)
        {
            problems.push(msg);
        }
    }
    if !problems.is_empty() {
        return Err(RegistrationError::Invalid(problems).into());
    }

    let leads = LeadService::new(&state.db);
    // Flush the submitted values as the latest draft so the completion
    // below always finds a row; terminal leads stop here before any upload.
    if let DraftOutcome::Terminal(row) = leads.save_draft(&draft).await? {
        return Err(RegistrationError::AlreadyTerminal {
            email: row.email,
            status: row.status,
        }
        .into());
    }

    let store = state.object_store.as_ref();
    let (Some(primary), secondary) = (proof1, proof2) else {
        return Err(AppError::Validation("Payment proof is required".into()));
    };
    let primary = store_file(store, "proofs", &primary).await?;
    let proofs = match secondary {
        Some(file) => {
            let secondary = store_file(store, "proofs", &file).await?;
            PaymentProofs::Pair(primary.url, secondary.url)
        }
        None => PaymentProofs::Single(primary.url),
    };

    let email = fields.email.clone();
    let record = gate::build_final_record(fields, proofs, &rules);
    let transition = leads.complete(&record).await?.applied(&email)?;
    tracing::info!(email = %email, amount = record.amount, "Registration completed");

    state
        .dispatcher
        .dispatch_after_commit(transition.to_event())
        .await;

    Ok(Json(transition.new.into()))
}

#[utoipa::path(
    post,
    path = "/{email}/abandon",
    tag = "Registrations",
    operation_id = "abandonRegistration",
    summary = "Mark a lead abandoned",
    description = "Compare-and-swap `Partial -> Abandoned` for an external inactivity process. \
        Completed or already abandoned leads are never changed.",
    params(("email" = String, Path, description = "Lead email (case-insensitive)")),
    responses(
        (status = 200, description = "Lead abandoned", body = RegistrationResponse),
        (status = 401, description = "Missing or wrong secret (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "No lead for this email (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Lead is not Partial (CONFLICT)", body = ErrorBody),
    ),
    security(("webhook_secret" = [])),
)]
#[instrument(skip(state, _operator))]
pub async fn abandon_registration(
    _operator: Operator,
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<RegistrationResponse>, AppError> {
    let transition = LeadService::new(&state.db)
        .mark_abandoned(&email, None)
        .await?
        .applied(&email)?;

    state
        .dispatcher
        .dispatch_after_commit(transition.to_event())
        .await;

    Ok(Json(transition.new.into()))
}

#[utoipa::path(
    post,
    path = "/sweep",
    tag = "Registrations",
    operation_id = "sweepAbandoned",
    summary = "Abandon inactive leads",
    description = "Moves every `Partial` lead not autosaved within `inactivity_minutes` to \
        `Abandoned`, one compare-and-swap per lead, and dispatches each transition.",
    params(SweepQuery),
    responses(
        (status = 200, description = "Sweep finished", body = SweepResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Missing or wrong secret (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("webhook_secret" = [])),
)]
#[instrument(skip(state, _operator))]
pub async fn sweep_abandoned(
    _operator: Operator,
    State(state): State<AppState>,
    Query(query): Query<SweepQuery>,
) -> Result<Json<SweepResponse>, AppError> {
    if query.inactivity_minutes < 1 {
        return Err(AppError::Validation(
            "inactivity_minutes must be at least 1".into(),
        ));
    }
    let cutoff = Duration::try_minutes(query.inactivity_minutes)
        .and_then(|idle| Utc::now().checked_sub_signed(idle))
        .ok_or_else(|| AppError::Validation("inactivity_minutes is out of range".into()))?;
    let transitions = LeadService::new(&state.db).sweep_abandoned(cutoff).await?;

    let mut emails = Vec::with_capacity(transitions.len());
    for transition in &transitions {
        state
            .dispatcher
            .dispatch_after_commit(transition.to_event())
            .await;
        emails.push(transition.new.email.clone());
    }
    tracing::info!(abandoned = emails.len(), %cutoff, "Abandonment sweep finished");

    Ok(Json(SweepResponse {
        abandoned: emails.len(),
        emails,
        cutoff,
    }))
}
