//! crates/interview_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like storage backends
//! or SaaS APIs.

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;
use uuid::Uuid;

use crate::domain::{InterviewSession, Message, RealtimeUpdate};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., storage, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

/// A boxed stream of interviewer reply fragments.
pub type ReplyStream = Pin<Box<dyn Stream<Item = Result<String, PortError>> + Send>>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Persistence for session records and frozen conversation logs.
///
/// A conversation log is written exactly once, as a full copy, when the
/// session ends; it is never mutated afterwards.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn save_session(&self, session: &InterviewSession) -> PortResult<()>;

    async fn load_session(&self, session_id: Uuid) -> PortResult<InterviewSession>;

    /// Persists the frozen log for a session. Fails if a log was already
    /// persisted under this session id.
    async fn save_conversation(&self, session_id: Uuid, log: &[Message]) -> PortResult<()>;

    /// Reads a persisted log back. Returns `Ok(None)` when no log was ever
    /// persisted for this session, which callers present as a "no data"
    /// state rather than an error.
    async fn load_conversation(&self, session_id: Uuid) -> PortResult<Option<Vec<Message>>>;
}

#[async_trait]
pub trait SpeechToTextService: Send + Sync {
    /// Transcribes a slice of audio data into text.
    async fn transcribe_audio(&self, audio_data: &[u8]) -> PortResult<String>;
}

/// The generative-text collaborator playing the interviewer.
#[async_trait]
pub trait InterviewerService: Send + Sync {
    /// Produces the interviewer's next turn given the candidate's message,
    /// the recent conversation history and the target role.
    async fn reply(
        &self,
        candidate_text: &str,
        history: &[Message],
        role: &str,
    ) -> PortResult<String>;

    /// Streaming variant of [`InterviewerService::reply`], yielding the
    /// reply in fragments as the model produces them.
    async fn reply_streaming(
        &self,
        candidate_text: &str,
        history: &[Message],
        role: &str,
    ) -> PortResult<ReplyStream>;
}

/// The realtime channel to the interview room.
///
/// Implementations are poll-based: the service owns a pump task that calls
/// [`RealtimeTransport::poll_updates`] on a fixed interval. Which variant is
/// active (locally simulated events or an upstream HTTP endpoint) is decided
/// once, at construction time, by the composition root; nothing downstream
/// branches on it.
#[async_trait]
pub trait RealtimeTransport: Send + Sync {
    async fn connect(&self) -> PortResult<()>;

    async fn disconnect(&self) -> PortResult<()>;

    fn is_connected(&self) -> bool;

    async fn join_interview(&self, interview_id: Uuid, user_id: &str) -> PortResult<()>;

    async fn leave_interview(&self, interview_id: Uuid) -> PortResult<()>;

    /// Fetches whatever updates accumulated since the last poll. An empty
    /// vector is the common case and not an error.
    async fn poll_updates(&self) -> PortResult<Vec<RealtimeUpdate>>;

    /// Forwards an outbound message (`kind` is the message class, e.g.
    /// "transcript" or "interviewer_response").
    async fn send_message(&self, content: &str, kind: &str) -> PortResult<()>;

    async fn send_typing(&self, is_typing: bool) -> PortResult<()>;
}
