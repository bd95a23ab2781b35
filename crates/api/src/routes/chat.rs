//! Chat session, guided meditation and chat activity endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::models::chat::{
    ChatReplyResponse, GuidedMeditationRequest, GuidedMeditationResponse, HistoryResponse,
    MonthlyActivityResponse, SendMessageRequest, SessionListResponse, StartSessionRequest,
    StartSessionResponse,
};
use domain::services::generate_or_fallback;
use domain::services::text_generation::{
    chat_request, fallback_meditation, meditation_request, CALMING_TIP, DEFAULT_EMOTION,
    FALLBACK_CHAT_REPLY,
};
use persistence::entities::ChatSenderDb;
use persistence::repositories::ChatRepository;
use shared::validation::normalize_email;
use tracing::debug;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;

/// Open a new chat session.
///
/// POST /api/chat/start-session
pub async fn start_session(
    State(state): State<AppState>,
    Json(request): Json<StartSessionRequest>,
) -> Result<(StatusCode, Json<StartSessionResponse>), ApiError> {
    request.validate()?;

    let session = ChatRepository::new(state.pool.clone())
        .create_session(&normalize_email(&request.user_email))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(StartSessionResponse {
            session_id: session.id,
        }),
    ))
}

/// A user's sessions, newest first.
///
/// GET /api/chat/sessions/:email
pub async fn list_sessions(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<SessionListResponse>, ApiError> {
    let sessions = ChatRepository::new(state.pool.clone())
        .list_sessions(&normalize_email(&email))
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(Json(SessionListResponse { sessions }))
}

/// Messages in a session, oldest first.
///
/// GET /api/chat/history/:session_id
pub async fn history(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let repo = ChatRepository::new(state.pool.clone());
    if repo.find_session(session_id).await?.is_none() {
        return Err(ApiError::NotFound("Chat session not found".to_string()));
    }

    let history = repo
        .history(session_id)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(Json(HistoryResponse { history }))
}

/// Send a message and get the coach's reply.
///
/// POST /api/chat
pub async fn send_message(
    State(state): State<AppState>,
    Json(request): Json<SendMessageRequest>,
) -> Result<Json<ChatReplyResponse>, ApiError> {
    request.validate()?;

    let repo = ChatRepository::new(state.pool.clone());
    if repo.find_session(request.session_id).await?.is_none() {
        return Err(ApiError::NotFound("Chat session not found".to_string()));
    }

    let message = request.message.trim();
    repo.add_message(request.session_id, ChatSenderDb::User, message)
        .await?;

    let reply = generate_or_fallback(
        state.text_generator.as_ref(),
        chat_request(message),
        || FALLBACK_CHAT_REPLY.to_string(),
    )
    .await;

    repo.add_message(request.session_id, ChatSenderDb::Ai, &reply)
        .await?;
    debug!(session_id = %request.session_id, "Chat reply stored");

    Ok(Json(ChatReplyResponse {
        reply,
        emotion: DEFAULT_EMOTION.to_string(),
        calming_tip: CALMING_TIP.to_string(),
    }))
}

/// A short guided meditation script.
///
/// POST /api/guided-meditation
pub async fn guided_meditation(
    State(state): State<AppState>,
    Json(request): Json<GuidedMeditationRequest>,
) -> Result<Json<GuidedMeditationResponse>, ApiError> {
    request.validate()?;

    let kind = request.kind.trim();
    let text = generate_or_fallback(
        state.text_generator.as_ref(),
        meditation_request(kind),
        || fallback_meditation(kind),
    )
    .await;

    Ok(Json(GuidedMeditationResponse {
        success: true,
        text,
    }))
}

/// Chat message counts per month across all users.
///
/// GET /api/stats/monthly-users
pub async fn monthly_activity(
    State(state): State<AppState>,
) -> Result<Json<MonthlyActivityResponse>, ApiError> {
    let response = ChatRepository::new(state.pool.clone())
        .monthly_message_counts()
        .await?
        .into_iter()
        .map(|row| (row.month, row.count))
        .collect();

    Ok(Json(response))
}
