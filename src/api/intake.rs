//! Intake wizard API endpoints.
//!
//! Each session owns one wizard behind a mutex. Submissions take the lock
//! without waiting so a second submit for the same session is refused while
//! the first is still delivering. A delivered session is closed.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::intake::{IntakeWizard, SessionSlot, WizardSettings};
use crate::models::{
    CreateIntakeRequest, FormVariant, IntakeSession, SetFieldRequest, ToggleOptionRequest,
    WizardStatus,
};
use crate::AppState;

const MAX_SESSION_ID_LEN: usize = 64;

/// Store key holding the saved draft of one session.
pub fn draft_key(variant: FormVariant, session_id: &str) -> String {
    format!("intake_draft:{}:{}", variant.as_str(), session_id)
}

fn valid_session_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_SESSION_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

async fn session(state: &AppState, id: &str) -> Result<Arc<SessionSlot>, AppError> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Intake session not found: {}", id)))
}

fn view(session_id: &str, wizard: &IntakeWizard) -> IntakeSession {
    IntakeSession {
        session_id: session_id.to_string(),
        wizard: wizard.snapshot(),
    }
}

/// POST /api/intake - Open a session, restoring its saved draft if any.
pub async fn create_session(
    State(state): State<AppState>,
    Json(request): Json<CreateIntakeRequest>,
) -> ApiResult<IntakeSession> {
    let session_id = match request.session_id {
        Some(id) if valid_session_id(&id) => id,
        Some(_) => {
            return Err(AppError::BadRequest(
                "Session id must be 1-64 letters, digits, '-' or '_'".to_string(),
            ))
        }
        None => uuid::Uuid::new_v4().to_string(),
    };

    if let Some(existing) = state.sessions.get(&session_id).await {
        let wizard = existing.wizard.lock().await;
        if wizard.variant() != request.variant {
            return Err(AppError::Conflict(format!(
                "Session {} belongs to the {} form",
                session_id,
                wizard.variant().as_str()
            )));
        }
        return success(view(&session_id, &wizard));
    }

    let settings = WizardSettings {
        destination: state.config.business_email.clone(),
        fallback_phone: state.config.fallback_phone.clone(),
        debounce: state.config.draft_debounce,
    };
    let wizard = IntakeWizard::open(
        request.variant,
        state.store.clone(),
        draft_key(request.variant, &session_id),
        settings,
    )
    .await;
    let slot = state.sessions.insert(&session_id, wizard).await;
    let response = view(&session_id, &*slot.wizard.lock().await);

    tracing::info!(session_id = %session_id, variant = request.variant.as_str(), "Intake session opened");
    success(response)
}

/// GET /api/intake/:id - Current wizard state.
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<IntakeSession> {
    let slot = session(&state, &id).await?;
    let wizard = slot.wizard.lock().await;
    success(view(&id, &wizard))
}

/// DELETE /api/intake/:id - Abandon the session and erase its draft.
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let slot = session(&state, &id).await?;
    slot.wizard.lock().await.abandon().await;
    state.sessions.remove(&id).await;

    tracing::info!(session_id = %id, "Intake session abandoned");
    success(())
}

/// PUT /api/intake/:id/fields/:field - Replace a field value.
pub async fn set_field(
    State(state): State<AppState>,
    Path((id, field)): Path<(String, String)>,
    Json(request): Json<SetFieldRequest>,
) -> ApiResult<IntakeSession> {
    let slot = session(&state, &id).await?;
    let mut wizard = slot.wizard.lock().await;
    wizard.set_field(&field, request.value)?;
    success(view(&id, &wizard))
}

/// POST /api/intake/:id/fields/:field/toggle - Toggle a multi-select option.
pub async fn toggle_option(
    State(state): State<AppState>,
    Path((id, field)): Path<(String, String)>,
    Json(request): Json<ToggleOptionRequest>,
) -> ApiResult<IntakeSession> {
    let slot = session(&state, &id).await?;
    let mut wizard = slot.wizard.lock().await;
    wizard.toggle_option(&field, &request.option)?;
    success(view(&id, &wizard))
}

/// POST /api/intake/:id/advance - Validate the current step and move on.
pub async fn advance(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<IntakeSession> {
    let slot = session(&state, &id).await?;
    let mut wizard = slot.wizard.lock().await;
    wizard.advance()?;
    success(view(&id, &wizard))
}

/// POST /api/intake/:id/retreat - Go back one step.
pub async fn retreat(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<IntakeSession> {
    let slot = session(&state, &id).await?;
    let mut wizard = slot.wizard.lock().await;
    wizard.retreat()?;
    success(view(&id, &wizard))
}

/// POST /api/intake/:id/submit - Validate everything and deliver.
///
/// A delivery failure still answers 200; the session reports `failed` with a
/// message carrying the fallback phone number. A delivered session is removed,
/// so later requests for it get 404.
pub async fn submit(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<IntakeSession> {
    let slot = session(&state, &id).await?;
    let Ok(mut wizard) = slot.wizard.try_lock() else {
        return Err(AppError::Conflict(
            "A submission for this session is already in progress".to_string(),
        ));
    };

    let status = wizard.submit(state.sender.as_ref()).await?;
    let response = view(&id, &wizard);

    if status == WizardStatus::Submitted {
        state.sessions.remove(&id).await;
        tracing::info!(session_id = %id, "Intake session closed after delivery");
    }
    success(response)
}

/// POST /api/intake/:id/retry - Return from a failed delivery to the form.
pub async fn retry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<IntakeSession> {
    let slot = session(&state, &id).await?;
    let mut wizard = slot.wizard.lock().await;
    wizard.retry()?;
    success(view(&id, &wizard))
}
