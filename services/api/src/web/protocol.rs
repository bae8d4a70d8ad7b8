//! services/api/src/web/protocol.rs
//!
//! Defines the REST request and response payloads exchanged between the
//! browser client and the API server. Realtime updates themselves live in
//! the core crate (`interview_core::domain::RealtimeUpdate`); these are the
//! envelopes around them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

//=========================================================================================
// Requests Sent FROM the Client (Browser) TO the Server
//=========================================================================================

/// The interview setup form. Every field is optional; omitted fields fall
/// back to the defaults the setup page preselects.
#[derive(Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateInterviewRequest {
    /// One of "hr", "technical", "code-pairing".
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// A candidate chat message.
#[derive(Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub text: String,
}

/// Typing-indicator state change.
#[derive(Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TypingRequest {
    pub is_typing: bool,
}

/// Paging for the live conversation log.
#[derive(Deserialize, Debug)]
pub struct MessagesPageQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

//=========================================================================================
// Responses Sent FROM the Server TO the Client (Browser)
//=========================================================================================

/// The response payload sent after successfully creating an interview.
#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InterviewCreatedResponse {
    pub interview_id: Uuid,
    pub kind: String,
    pub duration: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

/// Session record plus its live status.
#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InterviewStatusResponse {
    pub interview_id: Uuid,
    pub kind: String,
    pub duration: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    /// Whether the session is held in memory and accepting messages.
    pub live: bool,
    pub ended: bool,
    pub total_messages: usize,
}

/// The interviewer's reply to one candidate message.
#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageResponse {
    pub reply: String,
    /// Milliseconds the reply took to produce.
    pub response_time: u64,
    /// True when the reply came from the session's reply cache.
    pub cached: bool,
    pub time: String,
}

/// Transcript plus reply for an uploaded audio turn.
#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AudioReplyResponse {
    pub transcript: String,
    pub reply: String,
    pub response_time: u64,
    pub cached: bool,
}

/// Confirmation that a session was finalized and its log persisted.
#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EndInterviewResponse {
    pub interview_id: Uuid,
    pub total_messages: usize,
}

/// Liveness probe payload.
#[derive(Serialize, Debug, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}
