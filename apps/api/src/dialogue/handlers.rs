//! Axum route handlers for the Session API.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::dialogue::controller::closing_note;
use crate::dialogue::registry::SessionHandle;
use crate::dialogue::{DialogueController, Phase, TurnOutcome};
use crate::errors::AppError;
use crate::models::candidate::{CandidateProfile, ProfileForm};
use crate::models::summary::{SessionOutcome, SessionSummary};
use crate::models::transcript::Message;
use crate::sentiment::{self, Sentiment};
use crate::state::AppState;
use crate::storage::SessionSink;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct StartSessionRequest {
    #[serde(flatten)]
    pub profile: ProfileForm,
    /// Overrides the configured default language for this session.
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct Progress {
    pub answered: usize,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub phase: Phase,
    pub progress: Progress,
    pub can_finish: bool,
    pub current_question: Option<String>,
    pub language: String,
    pub transcript: Vec<Message>,
    /// Computed from the latest candidate message, if any.
    pub sentiment: Option<Sentiment>,
    pub generator: &'static str,
}

#[derive(Debug, Serialize)]
pub struct StartSessionResponse {
    pub session_id: Uuid,
    pub session: SessionView,
}

#[derive(Debug, Serialize)]
pub struct TurnResponse {
    pub outcome: TurnOutcome,
    pub session: SessionView,
}

#[derive(Debug, Serialize)]
pub struct FinishResponse {
    pub outcome: SessionOutcome,
    pub closing_note: String,
    pub session: SessionView,
}

impl SessionView {
    fn of(controller: &DialogueController) -> Result<Self, AppError> {
        let session = controller.session().ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("registered session has not been started"))
        })?;

        Ok(SessionView {
            session_id: session.session_id,
            phase: controller.phase(),
            progress: Progress {
                answered: session.progress_index,
                total: session.questions.len(),
            },
            can_finish: controller.can_finish(),
            current_question: session.current_question().map(str::to_string),
            language: session.language.clone(),
            transcript: session.transcript.clone(),
            sentiment: session
                .latest_user_message()
                .map(|m| sentiment::analyze(&m.content)),
            generator: controller.backend(),
        })
    }
}

async fn session_handle(state: &AppState, session_id: Uuid) -> Result<SessionHandle, AppError> {
    state
        .sessions
        .get(session_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session {session_id} not found")))
}

/// Finished sessions leave the registry once their final view is built. The stored
/// summary is the only record that outlives them.
async fn release_finished(state: &AppState, session_id: Uuid) {
    if state.sessions.remove(session_id).await {
        debug!("Released finished session {session_id}");
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions
///
/// Validates the profile, generates questions and opens the session with question 1.
/// The profile is saved before any answer is recorded.
pub async fn handle_start_session(
    State(state): State<AppState>,
    Json(request): Json<StartSessionRequest>,
) -> Result<(StatusCode, Json<StartSessionResponse>), AppError> {
    let language = request
        .language
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .unwrap_or_else(|| state.config.language.clone());

    let sink: Arc<dyn SessionSink> = state.store.clone();
    let mut controller = DialogueController::new(Arc::clone(&state.generator), sink, language);
    let session_id = controller.start(request.profile).await?.session_id;
    let session = SessionView::of(&controller)?;

    state.sessions.insert(session_id, controller).await;

    Ok((
        StatusCode::CREATED,
        Json(StartSessionResponse {
            session_id,
            session,
        }),
    ))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let handle = session_handle(&state, session_id).await?;
    let controller = handle.lock().await;
    Ok(Json(SessionView::of(&controller)?))
}

/// POST /api/v1/sessions/:id/answers
///
/// An exit keyword ends and releases the session.
pub async fn handle_submit_answer(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<AnswerRequest>,
) -> Result<Json<TurnResponse>, AppError> {
    let handle = session_handle(&state, session_id).await?;
    let mut controller = handle.lock().await;
    let outcome = controller.submit_answer(&request.text).await?;
    let response = TurnResponse {
        session: SessionView::of(&controller)?,
        outcome,
    };
    drop(controller);

    if matches!(response.outcome, TurnOutcome::Terminated { .. }) {
        release_finished(&state, session_id).await;
    }
    Ok(Json(response))
}

/// POST /api/v1/sessions/:id/finish
///
/// Submit after the last question, or end the interview early. The session is released
/// afterwards; later requests for it get 404.
pub async fn handle_finish(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<FinishResponse>, AppError> {
    let handle = session_handle(&state, session_id).await?;
    let mut controller = handle.lock().await;
    let outcome = controller.finish().await?;
    let session = SessionView::of(&controller)?;
    let closing_note = controller
        .session()
        .map(|s| closing_note(&s.profile))
        .unwrap_or_default();
    drop(controller);

    release_finished(&state, session_id).await;
    Ok(Json(FinishResponse {
        outcome,
        closing_note,
        session,
    }))
}

/// DELETE /api/v1/sessions/:id
///
/// Session reset: discards all in-memory state. Stored records are untouched.
pub async fn handle_reset_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.sessions.remove(session_id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Session {session_id} not found")))
    }
}

/// GET /api/v1/candidates
///
/// Every stored candidate record, in insertion order.
pub async fn handle_list_candidates(
    State(state): State<AppState>,
) -> Result<Json<Vec<CandidateProfile>>, AppError> {
    let store = Arc::clone(&state.store);
    let candidates = tokio::task::spawn_blocking(move || store.candidates())
        .await
        .map_err(|e| AppError::Internal(e.into()))?;
    Ok(Json(candidates))
}

/// GET /api/v1/summaries
///
/// Every stored session summary (outcome, questions, answers), in insertion order.
pub async fn handle_list_summaries(
    State(state): State<AppState>,
) -> Result<Json<Vec<SessionSummary>>, AppError> {
    let store = Arc::clone(&state.store);
    let summaries = tokio::task::spawn_blocking(move || store.sessions())
        .await
        .map_err(|e| AppError::Internal(e.into()))?;
    Ok(Json(summaries))
}
