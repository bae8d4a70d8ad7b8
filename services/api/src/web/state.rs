//! services/api/src/web/state.rs
//!
//! Defines the application's shared and session-specific states.

use crate::config::Config;
use interview_core::domain::{InterviewSession, Message, RealtimeUpdate};
use interview_core::ports::{
    ConversationStore, InterviewerService, RealtimeTransport, SpeechToTextService,
};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Updates queued for a client that stopped polling are dropped oldest-first
/// beyond this bound.
pub const MAX_PENDING_UPDATES: usize = 256;

/// Only the most recent response-time samples feed the metrics.
pub const MAX_RESPONSE_SAMPLES: usize = 50;

//=========================================================================================
// AppState (Shared Across All Connections)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
///
/// Every collaborator is an explicitly constructed object owned here and
/// reached through its port; nothing module-level, nothing implicit.
pub struct AppState {
    pub store: Arc<dyn ConversationStore>,
    pub config: Arc<Config>,
    pub sst_adapter: Arc<dyn SpeechToTextService>,
    pub interviewer: Arc<dyn InterviewerService>,
    pub transport: Arc<dyn RealtimeTransport>,
    /// Live interview sessions, keyed by session id.
    pub sessions: Mutex<HashMap<Uuid, Arc<Mutex<SessionState>>>>,
}

impl AppState {
    pub async fn live_session(&self, session_id: Uuid) -> Option<Arc<Mutex<SessionState>>> {
        self.sessions.lock().await.get(&session_id).cloned()
    }
}

//=========================================================================================
// SessionState (Specific to One Live Interview)
//=========================================================================================

/// One interviewer reply held in the session's cache.
pub struct CachedReply {
    pub reply: String,
    pub response_time_ms: u64,
    pub cached_at: Instant,
}

/// The state for a single live interview session.
pub struct SessionState {
    pub session: InterviewSession,
    /// The in-memory conversation log; frozen and persisted once at session end.
    pub conversation: Vec<Message>,
    /// Realtime updates waiting for the client's next poll.
    pub pending_updates: VecDeque<RealtimeUpdate>,
    /// Recent interviewer replies keyed by normalized candidate text.
    pub reply_cache: HashMap<String, CachedReply>,
    pub response_times: VecDeque<u64>,
    pub ended: bool,
    /// A token to gracefully cancel the session's realtime pump.
    pub cancellation_token: CancellationToken,
}

impl SessionState {
    pub fn new(session: InterviewSession) -> Self {
        Self {
            session,
            conversation: Vec::new(),
            pending_updates: VecDeque::new(),
            reply_cache: HashMap::new(),
            response_times: VecDeque::new(),
            ended: false,
            cancellation_token: CancellationToken::new(),
        }
    }

    pub fn push_update(&mut self, update: RealtimeUpdate) {
        if self.pending_updates.len() >= MAX_PENDING_UPDATES {
            self.pending_updates.pop_front();
        }
        self.pending_updates.push_back(update);
    }

    pub fn drain_updates(&mut self) -> Vec<RealtimeUpdate> {
        self.pending_updates.drain(..).collect()
    }

    pub fn record_response_time(&mut self, milliseconds: u64) {
        if self.response_times.len() >= MAX_RESPONSE_SAMPLES {
            self.response_times.pop_front();
        }
        self.response_times.push_back(milliseconds);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use interview_core::domain::InterviewKind;

    fn sample_state() -> SessionState {
        SessionState::new(InterviewSession {
            id: Uuid::new_v4(),
            kind: InterviewKind::Hr,
            duration: "15 min".to_string(),
            role: "Product Manager".to_string(),
            created_at: Utc::now(),
        })
    }

    #[test]
    fn pending_updates_are_bounded() {
        let mut state = sample_state();
        for i in 0..(MAX_PENDING_UPDATES + 10) {
            state.push_update(RealtimeUpdate::InterviewUpdate {
                status: "active".to_string(),
                content: format!("update {i}"),
                timestamp: i as i64,
            });
        }
        assert_eq!(state.pending_updates.len(), MAX_PENDING_UPDATES);
        // The oldest entries were the ones dropped.
        match state.pending_updates.front().unwrap() {
            RealtimeUpdate::InterviewUpdate { timestamp, .. } => assert_eq!(*timestamp, 10),
            other => panic!("unexpected update: {other:?}"),
        }
    }

    #[test]
    fn draining_empties_the_queue() {
        let mut state = sample_state();
        state.push_update(RealtimeUpdate::TypingIndicator {
            is_typing: true,
            timestamp: 0,
        });
        assert_eq!(state.drain_updates().len(), 1);
        assert!(state.drain_updates().is_empty());
    }

    #[test]
    fn response_time_samples_are_bounded() {
        let mut state = sample_state();
        for i in 0..60 {
            state.record_response_time(i);
        }
        assert_eq!(state.response_times.len(), MAX_RESPONSE_SAMPLES);
        assert_eq!(*state.response_times.front().unwrap(), 10);
    }
}
