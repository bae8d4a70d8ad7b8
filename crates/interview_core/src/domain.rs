//! crates/interview_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any transport or storage backend, but
//! they do pin down the serialized field names: stored conversation logs and
//! wire payloads use camelCase keys and lowercase sender tags, and a report
//! computed over a log must stay stable across reads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Whose turn a message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Interviewer,
    System,
}

/// One turn in the interview conversation.
///
/// Only `sender` and `text` matter to scoring; `time` and `response_time`
/// are display-only, and the optional flags mark error notices and shared
/// code. Logs written by older clients may omit `text` entirely, which is
/// treated as an empty message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(default)]
    pub text: String,
    pub sender: Sender,
    #[serde(default)]
    pub time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_code: Option<bool>,
    /// Milliseconds the interviewer took to respond.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_time: Option<u64>,
}

impl Message {
    pub fn new(sender: Sender, text: impl Into<String>, time: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender,
            time: time.into(),
            is_error: None,
            is_code: None,
            response_time: None,
        }
    }

    /// A system-sent error notice, shown inline in the conversation.
    pub fn system_error(text: impl Into<String>, time: impl Into<String>) -> Self {
        Self {
            is_error: Some(true),
            ..Self::new(Sender::System, text, time)
        }
    }

    pub fn with_response_time(mut self, milliseconds: u64) -> Self {
        self.response_time = Some(milliseconds);
        self
    }
}

/// The flavor of interview the candidate picked at setup time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InterviewKind {
    Hr,
    Technical,
    CodePairing,
}

impl InterviewKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewKind::Hr => "hr",
            InterviewKind::Technical => "technical",
            InterviewKind::CodePairing => "code-pairing",
        }
    }
}

impl FromStr for InterviewKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hr" => Ok(InterviewKind::Hr),
            "technical" => Ok(InterviewKind::Technical),
            "code-pairing" => Ok(InterviewKind::CodePairing),
            other => Err(format!("unknown interview kind: '{other}'")),
        }
    }
}

/// One practice conversation between the simulated interviewer and a
/// candidate, identified by a session id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewSession {
    pub id: Uuid,
    pub kind: InterviewKind,
    /// Display label, e.g. "30 min". Not enforced by the service.
    pub duration: String,
    /// The target role, e.g. "Software Engineer".
    pub role: String,
    pub created_at: DateTime<Utc>,
}

/// Aggregate message counts and lengths over a conversation log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationStats {
    pub total_messages: usize,
    pub user_messages: usize,
    pub ai_messages: usize,
    /// Average candidate message length in characters, rounded.
    pub average_user_response_length: u32,
    /// Average interviewer message length in characters, rounded.
    pub average_ai_response_length: u32,
}

/// The structured output of grading a conversation log.
///
/// Every sub-score and the overall score is an integer in `0..=10`. The
/// report has no lifecycle of its own: it is recomputed from scratch on
/// every read and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreReport {
    pub communication_skills: u8,
    pub technical_knowledge: u8,
    pub problem_solving: u8,
    pub code_quality: u8,
    pub engagement_level: u8,
    pub overall: u8,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub summary: String,
    pub conversation_stats: ConversationStats,
}

/// An event delivered over the realtime channel.
///
/// The tag and field names mirror the JSON the polling clients already
/// speak (`interview_update`, `chat`, `audio_chunk`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum RealtimeUpdate {
    InterviewUpdate {
        status: String,
        content: String,
        timestamp: i64,
    },
    Chat {
        message: String,
        sender: Sender,
        timestamp: i64,
    },
    AudioChunk {
        data: String,
        timestamp: i64,
    },
    TypingIndicator {
        is_typing: bool,
        timestamp: i64,
    },
    /// Incremental interviewer output while a streamed reply is in flight.
    PartialResponse {
        text: String,
        timestamp: i64,
    },
}
