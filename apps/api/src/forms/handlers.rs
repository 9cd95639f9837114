use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::forms::artifacts::{self, ArtifactCleanup, ResumeUpload};
use crate::forms::merge::merge;
use crate::forms::models::FormRecord;
use crate::forms::schema;
use crate::state::AppState;

/// The `data` multipart field (JSON document) plus the optional `resume`
/// file, as delivered by the transport.
struct Submission {
    data: Option<String>,
    resume: Option<ResumeUpload>,
}

async fn read_submission(mut multipart: Multipart) -> Result<Submission, AppError> {
    let mut data = None;
    let mut resume = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {e}")))?
    {
        match field.name() {
            Some("data") => {
                data = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(format!("Unreadable data field: {e}")))?,
                );
            }
            Some("resume") => {
                let filename = field.file_name().unwrap_or("resume.pdf").to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Unreadable resume field: {e}")))?;
                resume = Some(ResumeUpload {
                    filename,
                    content_type,
                    bytes,
                });
            }
            _ => {}
        }
    }

    Ok(Submission { data, resume })
}

fn parse_data(data: Option<String>) -> Result<Value, AppError> {
    let data = data.ok_or_else(|| AppError::BadRequest("Missing 'data' field".to_string()))?;
    serde_json::from_str(&data)
        .map_err(|e| AppError::BadRequest(format!("'data' field must be valid JSON: {e}")))
}

/// POST /form
pub async fn handle_create(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let submission = read_submission(multipart).await?;
    let payload = parse_data(submission.data)?;
    let mut sections = schema::validate_create(&payload)?;

    let reference =
        artifacts::attach_on_create(state.artifacts.as_ref(), submission.resume.as_ref()).await?;
    sections.employment.resume = Some(reference);
    sections.personal.password = state.hasher.hash(&sections.personal.password);

    let record = FormRecord::new(sections, Utc::now());
    state.forms.insert(&record).await?;
    info!("Created form submission {}", record.id);

    Ok((
        StatusCode::CREATED,
        Json(json!({ "form": record.redacted(), "success": true })),
    ))
}

/// GET /form
pub async fn handle_list(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let forms = state.forms.list_views().await?;
    Ok(Json(json!({ "forms": forms, "success": true })))
}

/// GET /form/:id
pub async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let form = state
        .forms
        .find_view(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Form submission {id} not found")))?;
    Ok(Json(json!({ "form": form, "success": true })))
}

/// PATCH /form/:id
pub async fn handle_update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<Value>, AppError> {
    let submission = read_submission(multipart).await?;
    let payload = parse_data(submission.data)?;
    let mut patch = schema::validate_edit(&payload)?;

    let existing = state
        .forms
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Form submission {id} not found")))?;

    // Re-transform the secret only when its plaintext actually changed.
    if let Some(personal) = &mut patch.personal {
        personal.password = state
            .hasher
            .apply_if_changed(&personal.password, &existing.personal.password);
    }

    let prior = existing.employment.resume.clone();
    let replacement = artifacts::replace_on_update(
        state.artifacts.as_ref(),
        prior.as_deref(),
        submission.resume.as_ref(),
    )
    .await?;

    let mut merged = merge(existing, patch, Utc::now());
    match replacement {
        Some(reference) => merged.employment.resume = Some(reference),
        // A patched employment section without a resume reference must not
        // detach the stored artifact.
        None => {
            if merged.employment.resume.is_none() {
                merged.employment.resume = prior;
            }
        }
    }

    if !state.forms.replace(&merged).await? {
        return Err(AppError::NotFound(format!("Form submission {id} not found")));
    }
    info!("Updated form submission {id}");

    Ok(Json(json!({ "form": merged.redacted(), "success": true })))
}

/// DELETE /form/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let existing = state
        .forms
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Form submission {id} not found")))?;

    if !state.forms.delete(id).await? {
        return Err(AppError::NotFound(format!("Form submission {id} not found")));
    }

    // Record first, artifact second: cleanup failure degrades, never blocks.
    let cleanup = artifacts::release_on_delete(
        state.artifacts.as_ref(),
        existing.employment.resume.as_deref(),
    )
    .await;
    info!("Deleted form submission {id}");

    Ok(Json(json!({
        "message": "Form submission deleted successfully",
        "success": true,
        "artifactRemoved": cleanup == ArtifactCleanup::Removed
    })))
}
