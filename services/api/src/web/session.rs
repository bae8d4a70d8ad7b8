//! services/api/src/web/session.rs
//!
//! This module contains the asynchronous "worker" function responsible for
//! handling a single candidate-message/interviewer-reply cycle, plus the
//! reply cache and performance-metric helpers that surround it.

use crate::web::state::{AppState, CachedReply, SessionState};
use futures::StreamExt;
use interview_core::{
    domain::{Message, RealtimeUpdate, Sender},
    ports::PortResult,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{info, warn};
use utoipa::ToSchema;

/// What the candidate hears when the interviewer model is unavailable.
pub const FALLBACK_REPLY: &str =
    "I apologize, but I need a moment to process that. Could you please repeat your question?";

/// Questions warmed into the reply cache when preloading is enabled.
pub const COMMON_QUESTIONS: [&str; 4] = [
    "Tell me about yourself",
    "What are your strengths?",
    "Where do you see yourself in 5 years?",
    "Why should we hire you?",
];

/// Cache keys keep at most this many normalized characters.
const CACHE_KEY_LEN: usize = 50;

/// The result of one reply cycle.
pub struct ReplyOutcome {
    pub reply: String,
    pub response_time_ms: u64,
    pub cached: bool,
    /// Display timestamp stamped on the interviewer's message.
    pub time: String,
}

/// Display-formatted wall-clock time, as shown next to each message.
pub fn clock_time() -> String {
    chrono::Local::now().format("%H:%M").to_string()
}

/// Normalizes candidate text into a cache key: lowercased, alphanumerics
/// only, truncated.
pub fn cache_key(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(CACHE_KEY_LEN)
        .collect()
}

/// The main asynchronous task for handling one candidate message.
///
/// Appends the candidate's message to the live log, resolves the
/// interviewer's reply (cache first, then the model), and appends the reply
/// with its measured response time. A model failure degrades to the fixed
/// fallback line plus an inline error notice; the cycle itself still
/// succeeds.
pub async fn generate_reply(
    app_state: Arc<AppState>,
    session_lock: Arc<Mutex<SessionState>>,
    candidate_text: &str,
) -> PortResult<ReplyOutcome> {
    // Append the candidate's turn and snapshot what the reply needs. The
    // history handed to the model excludes the message being answered.
    let (history, role, cache_hit) = {
        let mut session = session_lock.lock().await;
        let history = session.conversation.clone();
        session
            .conversation
            .push(Message::new(Sender::User, candidate_text, clock_time()));

        let ttl = Duration::from_secs(app_state.config.reply_cache_ttl_secs);
        let cache_hit = session
            .reply_cache
            .get(&cache_key(candidate_text))
            .filter(|cached| cached.cached_at.elapsed() < ttl)
            .map(|cached| (cached.reply.clone(), cached.response_time_ms));

        (history, session.session.role.clone(), cache_hit)
    };

    if let Some((reply, response_time_ms)) = cache_hit {
        info!("Serving cached interviewer reply");
        let time = clock_time();
        let mut session = session_lock.lock().await;
        session.conversation.push(
            Message::new(Sender::Interviewer, reply.clone(), time.clone())
                .with_response_time(response_time_ms),
        );
        return Ok(ReplyOutcome {
            reply,
            response_time_ms,
            cached: true,
            time,
        });
    }

    // Forward the transcript over the realtime channel; losing it is not
    // worth failing the turn over.
    if let Err(e) = app_state
        .transport
        .send_message(candidate_text, "transcript")
        .await
    {
        warn!("Failed to forward transcript: {e}");
    }

    let started = Instant::now();
    let result = if app_state.config.stream_replies {
        streamed_reply(&app_state, &session_lock, candidate_text, &history, &role).await
    } else {
        app_state
            .interviewer
            .reply(candidate_text, &history, &role)
            .await
    };
    let reply = match result {
        Ok(reply) => reply,
        Err(e) => {
            warn!("Interviewer reply failed: {e}");
            {
                let mut session = session_lock.lock().await;
                session
                    .conversation
                    .push(Message::system_error(format!("Error: {e}"), clock_time()));
            }
            if let Err(send_err) = app_state.transport.send_message(&e.to_string(), "error").await
            {
                warn!("Failed to forward error notice: {send_err}");
            }
            FALLBACK_REPLY.to_string()
        }
    };
    let response_time_ms = started.elapsed().as_millis() as u64;

    if let Err(e) = app_state
        .transport
        .send_message(&reply, "interviewer_response")
        .await
    {
        warn!("Failed to forward interviewer reply: {e}");
    }

    let time = clock_time();
    let mut session = session_lock.lock().await;
    session.record_response_time(response_time_ms);
    session.reply_cache.insert(
        cache_key(candidate_text),
        CachedReply {
            reply: reply.clone(),
            response_time_ms,
            cached_at: Instant::now(),
        },
    );
    session.conversation.push(
        Message::new(Sender::Interviewer, reply.clone(), time.clone())
            .with_response_time(response_time_ms),
    );

    Ok(ReplyOutcome {
        reply,
        response_time_ms,
        cached: false,
        time,
    })
}

/// Streams the reply fragment by fragment, surfacing partials through the
/// session's update queue so a polling client can render them live.
async fn streamed_reply(
    app_state: &Arc<AppState>,
    session_lock: &Arc<Mutex<SessionState>>,
    candidate_text: &str,
    history: &[Message],
    role: &str,
) -> PortResult<String> {
    let mut stream = app_state
        .interviewer
        .reply_streaming(candidate_text, history, role)
        .await?;

    let mut full_reply = String::new();
    while let Some(fragment) = stream.next().await {
        full_reply.push_str(&fragment?);
        let mut session = session_lock.lock().await;
        session.push_update(RealtimeUpdate::PartialResponse {
            text: full_reply.clone(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        });
    }

    Ok(full_reply.trim().to_string())
}

/// A "fire-and-forget" background task that warms the reply cache with the
/// questions almost every interview opens with.
pub async fn preload_common_replies(
    app_state: Arc<AppState>,
    session_lock: Arc<Mutex<SessionState>>,
) {
    let role = session_lock.lock().await.session.role.clone();

    for question in COMMON_QUESTIONS {
        match app_state.interviewer.reply(question, &[], &role).await {
            Ok(reply) => {
                let mut session = session_lock.lock().await;
                session.reply_cache.insert(
                    cache_key(question),
                    CachedReply {
                        reply,
                        response_time_ms: 0,
                        cached_at: Instant::now(),
                    },
                );
            }
            Err(e) => {
                warn!("Failed to preload reply for '{question}': {e}");
            }
        }
    }
    info!("Preloaded common interviewer replies");
}

//=========================================================================================
// Performance Metrics
//=========================================================================================

/// Rolling performance figures for one live session.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    /// Mean interviewer response time in milliseconds, rounded.
    pub avg_response_time: u64,
    pub total_responses: usize,
    /// Fresh cache entries relative to generated replies, as a percentage.
    pub cache_hit_rate: u32,
    pub timestamp: i64,
}

pub fn performance_metrics(session: &SessionState, cache_ttl: Duration) -> PerformanceMetrics {
    let total_responses = session.response_times.len();
    let avg_response_time = if total_responses > 0 {
        let sum: u64 = session.response_times.iter().sum();
        (sum as f64 / total_responses as f64).round() as u64
    } else {
        0
    };

    let fresh_entries = session
        .reply_cache
        .values()
        .filter(|cached| cached.cached_at.elapsed() < cache_ttl)
        .count();
    let cache_hit_rate = if total_responses > 0 {
        ((fresh_entries as f64 / total_responses as f64) * 100.0).round() as u32
    } else {
        0
    };

    PerformanceMetrics {
        avg_response_time,
        total_responses,
        cache_hit_rate,
        timestamp: chrono::Utc::now().timestamp_millis(),
    }
}
