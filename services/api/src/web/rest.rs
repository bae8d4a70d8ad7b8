//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::{
    protocol::{
        AudioReplyResponse, CreateInterviewRequest, EndInterviewResponse, HealthResponse,
        InterviewCreatedResponse, InterviewStatusResponse, MessagesPageQuery, SendMessageRequest,
        SendMessageResponse, TypingRequest,
    },
    realtime_task::realtime_pump,
    session::{
        clock_time, generate_reply, performance_metrics, preload_common_replies,
        PerformanceMetrics,
    },
    state::{AppState, SessionState},
};
use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use bytes::Bytes;
use chrono::Utc;
use interview_core::{
    domain::{InterviewKind, InterviewSession, Message, RealtimeUpdate, Sender},
    ports::PortError,
    scoring::score_conversation,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{error, warn};
use utoipa::OpenApi;
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        create_interview_handler,
        get_interview_handler,
        send_message_handler,
        get_messages_handler,
        get_updates_handler,
        typing_handler,
        audio_handler,
        end_interview_handler,
        score_handler,
        analytics_handler,
        health_handler,
    ),
    components(
        schemas(
            CreateInterviewRequest,
            InterviewCreatedResponse,
            InterviewStatusResponse,
            SendMessageRequest,
            SendMessageResponse,
            TypingRequest,
            AudioReplyResponse,
            EndInterviewResponse,
            HealthResponse,
            PerformanceMetrics,
        )
    ),
    tags(
        (name = "Interview Practice API", description = "API endpoints for the AI interview practice service.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Create a new interview session.
///
/// Persists the session record, joins the realtime room and starts the
/// session's polling pump.
#[utoipa::path(
    post,
    path = "/interviews",
    request_body = CreateInterviewRequest,
    responses(
        (status = 201, description = "Interview created", body = InterviewCreatedResponse),
        (status = 400, description = "Unknown interview kind"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_interview_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<CreateInterviewRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let kind = match payload.kind.as_deref() {
        None => InterviewKind::Technical,
        Some(raw) => raw
            .parse::<InterviewKind>()
            .map_err(|e| (StatusCode::BAD_REQUEST, e))?,
    };

    let session = InterviewSession {
        id: Uuid::new_v4(),
        kind,
        duration: payload.duration.unwrap_or_else(|| "30 min".to_string()),
        role: payload.role.unwrap_or_else(|| "Software Engineer".to_string()),
        created_at: Utc::now(),
    };

    app_state.store.save_session(&session).await.map_err(|e| {
        error!("Failed to save session record: {e}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to create interview".to_string(),
        )
    })?;

    let user_handle = format!("user_{}", session.id.simple());
    if let Err(e) = app_state
        .transport
        .join_interview(session.id, &user_handle)
        .await
    {
        warn!("Failed to join interview room: {e}");
    }

    let mut session_state = SessionState::new(session.clone());
    session_state.conversation.push(Message::new(
        Sender::System,
        "Connected to interview service",
        clock_time(),
    ));
    let pump_token = session_state.cancellation_token.clone();
    let session_lock = Arc::new(Mutex::new(session_state));

    app_state
        .sessions
        .lock()
        .await
        .insert(session.id, session_lock.clone());

    tokio::spawn(realtime_pump(
        app_state.clone(),
        session_lock.clone(),
        pump_token,
    ));
    if app_state.config.preload_replies {
        tokio::spawn(preload_common_replies(app_state.clone(), session_lock));
    }

    let response = InterviewCreatedResponse {
        interview_id: session.id,
        kind: session.kind.as_str().to_string(),
        duration: session.duration,
        role: session.role,
        created_at: session.created_at,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// Fetch one interview's record and live status.
#[utoipa::path(
    get,
    path = "/interviews/{id}",
    responses(
        (status = 200, description = "Interview found", body = InterviewStatusResponse),
        (status = 404, description = "Unknown interview id"),
        (status = 500, description = "Internal server error")
    ),
    params(("id" = Uuid, Path, description = "The interview session id."))
)]
pub async fn get_interview_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if let Some(session_lock) = app_state.live_session(id).await {
        let session = session_lock.lock().await;
        let record = &session.session;
        return Ok(Json(InterviewStatusResponse {
            interview_id: record.id,
            kind: record.kind.as_str().to_string(),
            duration: record.duration.clone(),
            role: record.role.clone(),
            created_at: record.created_at,
            live: true,
            ended: session.ended,
            total_messages: session.conversation.len(),
        }));
    }

    match app_state.store.load_session(id).await {
        Ok(record) => {
            let total_messages = app_state
                .store
                .load_conversation(id)
                .await
                .ok()
                .flatten()
                .map(|log| log.len())
                .unwrap_or(0);
            Ok(Json(InterviewStatusResponse {
                interview_id: record.id,
                kind: record.kind.as_str().to_string(),
                duration: record.duration,
                role: record.role,
                created_at: record.created_at,
                live: false,
                ended: true,
                total_messages,
            }))
        }
        Err(PortError::NotFound(_)) => {
            Err((StatusCode::NOT_FOUND, "Interview not found".to_string()))
        }
        Err(e) => {
            error!("Failed to load session record: {e}");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to load interview".to_string(),
            ))
        }
    }
}

/// Send a candidate message and receive the interviewer's reply.
#[utoipa::path(
    post,
    path = "/interviews/{id}/messages",
    request_body = SendMessageRequest,
    responses(
        (status = 200, description = "Reply produced", body = SendMessageResponse),
        (status = 400, description = "Empty message text"),
        (status = 404, description = "Interview not live"),
        (status = 409, description = "Interview already ended"),
        (status = 500, description = "Internal server error")
    ),
    params(("id" = Uuid, Path, description = "The interview session id."))
)]
pub async fn send_message_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if payload.text.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Message text must not be empty".to_string(),
        ));
    }

    let session_lock = require_live_session(&app_state, id).await?;
    ensure_not_ended(&session_lock).await?;

    let outcome = generate_reply(app_state.clone(), session_lock, &payload.text)
        .await
        .map_err(|e| {
            error!("Reply cycle failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to produce a reply".to_string(),
            )
        })?;

    Ok(Json(SendMessageResponse {
        reply: outcome.reply,
        response_time: outcome.response_time_ms,
        cached: outcome.cached,
        time: outcome.time,
    }))
}

/// Page through an interview's conversation log.
#[utoipa::path(
    get,
    path = "/interviews/{id}/messages",
    responses(
        (status = 200, description = "A page of the conversation log"),
        (status = 404, description = "Unknown interview id")
    ),
    params(
        ("id" = Uuid, Path, description = "The interview session id."),
        ("limit" = Option<usize>, Query, description = "Maximum messages returned (default 50)."),
        ("offset" = Option<usize>, Query, description = "Messages to skip (default 0).")
    )
)]
pub async fn get_messages_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(page): Query<MessagesPageQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let log = if let Some(session_lock) = app_state.live_session(id).await {
        session_lock.lock().await.conversation.clone()
    } else {
        app_state
            .store
            .load_conversation(id)
            .await
            .map_err(|e| {
                error!("Failed to load conversation: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to load messages".to_string(),
                )
            })?
            .ok_or_else(|| (StatusCode::NOT_FOUND, "Interview not found".to_string()))?
    };

    let offset = page.offset.unwrap_or(0);
    let limit = page.limit.unwrap_or(50);
    let page: Vec<Message> = log.into_iter().skip(offset).take(limit).collect();
    Ok(Json(page))
}

/// Drain the realtime updates queued since the last poll.
#[utoipa::path(
    get,
    path = "/interviews/{id}/updates",
    responses(
        (status = 200, description = "Pending realtime updates, oldest first"),
        (status = 404, description = "Interview not live")
    ),
    params(("id" = Uuid, Path, description = "The interview session id."))
)]
pub async fn get_updates_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let session_lock = require_live_session(&app_state, id).await?;
    let updates = session_lock.lock().await.drain_updates();
    Ok(Json(updates))
}

/// Report the candidate's typing state.
#[utoipa::path(
    post,
    path = "/interviews/{id}/typing",
    request_body = TypingRequest,
    responses(
        (status = 204, description = "Indicator accepted"),
        (status = 404, description = "Interview not live")
    ),
    params(("id" = Uuid, Path, description = "The interview session id."))
)]
pub async fn typing_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TypingRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let session_lock = require_live_session(&app_state, id).await?;

    session_lock
        .lock()
        .await
        .push_update(RealtimeUpdate::TypingIndicator {
            is_typing: payload.is_typing,
            timestamp: Utc::now().timestamp_millis(),
        });

    if let Err(e) = app_state.transport.send_typing(payload.is_typing).await {
        warn!("Failed to forward typing indicator: {e}");
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Upload a spoken candidate turn as raw PCM16 audio.
///
/// Accepts a multipart/form-data request with a single audio part, runs it
/// through speech-to-text, then answers it like a typed message.
#[utoipa::path(
    post,
    path = "/interviews/{id}/audio",
    request_body(content_type = "multipart/form-data", description = "The audio to transcribe."),
    responses(
        (status = 200, description = "Transcript and reply", body = AudioReplyResponse),
        (status = 400, description = "Missing or empty audio part"),
        (status = 404, description = "Interview not live"),
        (status = 409, description = "Interview already ended"),
        (status = 500, description = "Internal server error")
    ),
    params(("id" = Uuid, Path, description = "The interview session id."))
)]
pub async fn audio_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let session_lock = require_live_session(&app_state, id).await?;
    ensure_not_ended(&session_lock).await?;

    let audio_data: Bytes = if let Some(field) = multipart.next_field().await.map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to read multipart data: {}", e),
        )
    })? {
        field.bytes().await.map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to read audio bytes: {}", e),
            )
        })?
    } else {
        return Err((
            StatusCode::BAD_REQUEST,
            "Multipart form must include an audio part".to_string(),
        ));
    };

    if audio_data.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Audio part must not be empty".to_string(),
        ));
    }

    let transcript = app_state
        .sst_adapter
        .transcribe_audio(&audio_data)
        .await
        .map_err(|e| {
            error!("Transcription failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to transcribe audio".to_string(),
            )
        })?;

    if transcript.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "No speech detected in the audio".to_string(),
        ));
    }

    let outcome = generate_reply(app_state.clone(), session_lock, &transcript)
        .await
        .map_err(|e| {
            error!("Reply cycle failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to produce a reply".to_string(),
            )
        })?;

    Ok(Json(AudioReplyResponse {
        transcript,
        reply: outcome.reply,
        response_time: outcome.response_time_ms,
        cached: outcome.cached,
    }))
}

/// Finalize an interview: stop its pump, leave the room, freeze and persist
/// the conversation log.
#[utoipa::path(
    post,
    path = "/interviews/{id}/end",
    responses(
        (status = 200, description = "Interview finalized", body = EndInterviewResponse),
        (status = 404, description = "Interview not live"),
        (status = 409, description = "Interview already ended"),
        (status = 500, description = "Internal server error")
    ),
    params(("id" = Uuid, Path, description = "The interview session id."))
)]
pub async fn end_interview_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let session_lock = require_live_session(&app_state, id).await?;

    let frozen_log = {
        let mut session = session_lock.lock().await;
        if session.ended {
            return Err((
                StatusCode::CONFLICT,
                "Interview already ended".to_string(),
            ));
        }
        session.ended = true;
        session.cancellation_token.cancel();
        session.conversation.clone()
    };

    if let Err(e) = app_state.transport.leave_interview(id).await {
        warn!("Failed to leave interview room: {e}");
    }

    app_state
        .store
        .save_conversation(id, &frozen_log)
        .await
        .map_err(|e| {
            error!("Failed to persist conversation: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to persist conversation".to_string(),
            )
        })?;

    Ok(Json(EndInterviewResponse {
        interview_id: id,
        total_messages: frozen_log.len(),
    }))
}

/// Grade a finished interview.
///
/// Reads the persisted conversation log back and runs the score calculator
/// over it. When no log was persisted (or it is empty) the body is JSON
/// `null` and the caller renders a "no data" state.
#[utoipa::path(
    get,
    path = "/interviews/{id}/score",
    responses(
        (status = 200, description = "The score report, or null when no data exists"),
        (status = 500, description = "Internal server error")
    ),
    params(("id" = Uuid, Path, description = "The interview session id."))
)]
pub async fn score_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let log = app_state.store.load_conversation(id).await.map_err(|e| {
        error!("Failed to load conversation: {e}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to load conversation".to_string(),
        )
    })?;

    let report = log.as_deref().and_then(score_conversation);
    Ok(Json(report))
}

/// Rolling performance metrics for a live interview.
#[utoipa::path(
    get,
    path = "/interviews/{id}/analytics",
    responses(
        (status = 200, description = "Session performance metrics", body = PerformanceMetrics),
        (status = 404, description = "Interview not live")
    ),
    params(("id" = Uuid, Path, description = "The interview session id."))
)]
pub async fn analytics_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let session_lock = require_live_session(&app_state, id).await?;
    let session = session_lock.lock().await;
    let metrics = performance_metrics(
        &session,
        Duration::from_secs(app_state.config.reply_cache_ttl_secs),
    );
    Ok(Json(metrics))
}

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now(),
    })
}

//=========================================================================================
// Shared Handler Helpers
//=========================================================================================

async fn require_live_session(
    app_state: &Arc<AppState>,
    id: Uuid,
) -> Result<Arc<Mutex<SessionState>>, (StatusCode, String)> {
    app_state.live_session(id).await.ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            "Interview not found or no longer live".to_string(),
        )
    })
}

async fn ensure_not_ended(
    session_lock: &Arc<Mutex<SessionState>>,
) -> Result<(), (StatusCode, String)> {
    if session_lock.lock().await.ended {
        Err((
            StatusCode::CONFLICT,
            "Interview already ended".to_string(),
        ))
    } else {
        Ok(())
    }
}
