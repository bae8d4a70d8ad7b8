//! services/api/src/adapters/transport.rs
//!
//! The two realtime transport variants behind the `RealtimeTransport` port.
//! Which one is live is decided once, in the composition root; the session
//! machinery only ever sees the trait.

use async_trait::async_trait;
use chrono::Utc;
use interview_core::{
    domain::{RealtimeUpdate, Sender},
    ports::{PortError, PortResult, RealtimeTransport},
};
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};
use uuid::Uuid;

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

//=========================================================================================
// Simulated Polling Transport
//=========================================================================================

/// A transport that fabricates occasional interview-room events locally and
/// never touches the network. Outbound messages are accepted and dropped.
pub struct SimulatedPollTransport {
    connected: AtomicBool,
    /// Chance that a poll yields an update. Most polls yield nothing, which
    /// is what a quiet interview room looks like.
    event_probability: f64,
}

impl SimulatedPollTransport {
    pub fn new() -> Self {
        Self::with_event_probability(0.3)
    }

    pub fn with_event_probability(event_probability: f64) -> Self {
        Self {
            connected: AtomicBool::new(false),
            event_probability,
        }
    }

    fn fabricate_update(&self) -> RealtimeUpdate {
        match rand::thread_rng().gen_range(0..3) {
            0 => RealtimeUpdate::InterviewUpdate {
                status: "active".to_string(),
                content: "Interview status updated".to_string(),
                timestamp: now_millis(),
            },
            1 => RealtimeUpdate::Chat {
                message: "This is a simulated message from the mock API".to_string(),
                sender: Sender::Interviewer,
                timestamp: now_millis(),
            },
            _ => RealtimeUpdate::AudioChunk {
                data: "simulated-audio-data".to_string(),
                timestamp: now_millis(),
            },
        }
    }
}

impl Default for SimulatedPollTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RealtimeTransport for SimulatedPollTransport {
    async fn connect(&self) -> PortResult<()> {
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) -> PortResult<()> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn join_interview(&self, interview_id: Uuid, user_id: &str) -> PortResult<()> {
        debug!("Joined interview {interview_id} as {user_id} (simulated)");
        Ok(())
    }

    async fn leave_interview(&self, interview_id: Uuid) -> PortResult<()> {
        debug!("Left interview {interview_id} (simulated)");
        Ok(())
    }

    async fn poll_updates(&self) -> PortResult<Vec<RealtimeUpdate>> {
        if !self.is_connected() {
            return Ok(Vec::new());
        }
        let roll: f64 = rand::thread_rng().gen();
        if roll < self.event_probability {
            Ok(vec![self.fabricate_update()])
        } else {
            Ok(Vec::new())
        }
    }

    async fn send_message(&self, content: &str, kind: &str) -> PortResult<()> {
        debug!("Dropping outbound '{kind}' message ({} bytes, simulated)", content.len());
        Ok(())
    }

    async fn send_typing(&self, is_typing: bool) -> PortResult<()> {
        debug!("Dropping typing indicator (typing={is_typing}, simulated)");
        Ok(())
    }
}

//=========================================================================================
// HTTP Polling Transport
//=========================================================================================

/// A transport that polls an upstream interview-room endpoint over HTTP.
pub struct HttpPollTransport {
    client: reqwest::Client,
    base_url: String,
    auth_token: Option<String>,
    connected: AtomicBool,
}

impl HttpPollTransport {
    pub fn new(base_url: String, auth_token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_token,
            connected: AtomicBool::new(false),
        }
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn post_json(&self, path: &str, body: serde_json::Value) -> PortResult<()> {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .authorized(self.client.post(&url).json(&body))
            .send()
            .await
            .map_err(|e| PortError::Unexpected(format!("POST {url} failed: {e}")))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(PortError::Unexpected(format!(
                "POST {url} returned {}",
                response.status()
            )))
        }
    }
}

#[async_trait]
impl RealtimeTransport for HttpPollTransport {
    async fn connect(&self) -> PortResult<()> {
        let url = format!("{}/health", self.base_url);
        let response = self
            .authorized(self.client.get(&url))
            .send()
            .await
            .map_err(|e| PortError::Unexpected(format!("Health check failed: {e}")))?;

        if !response.status().is_success() {
            return Err(PortError::Unexpected(format!(
                "Health check returned {}",
                response.status()
            )));
        }
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) -> PortResult<()> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn join_interview(&self, interview_id: Uuid, user_id: &str) -> PortResult<()> {
        self.post_json(
            &format!("/interviews/{interview_id}/join"),
            serde_json::json!({ "userId": user_id, "timestamp": now_millis() }),
        )
        .await
    }

    async fn leave_interview(&self, interview_id: Uuid) -> PortResult<()> {
        self.post_json(
            &format!("/interviews/{interview_id}/leave"),
            serde_json::json!({ "timestamp": now_millis() }),
        )
        .await
    }

    /// Polls the upstream for updates. A failed poll is logged and yields no
    /// updates; the pump keeps its cadence rather than tearing down.
    async fn poll_updates(&self) -> PortResult<Vec<RealtimeUpdate>> {
        if !self.is_connected() {
            return Ok(Vec::new());
        }

        let url = format!("{}/updates", self.base_url);
        let response = match self.authorized(self.client.get(&url)).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Polling {url} failed: {e}");
                return Ok(Vec::new());
            }
        };

        if !response.status().is_success() {
            warn!("Polling {url} returned {}", response.status());
            return Ok(Vec::new());
        }

        response
            .json::<Vec<RealtimeUpdate>>()
            .await
            .map_err(|e| PortError::Unexpected(format!("Malformed updates payload: {e}")))
    }

    async fn send_message(&self, content: &str, kind: &str) -> PortResult<()> {
        self.post_json(
            "/messages",
            serde_json::json!({
                "type": kind,
                "content": content,
                "timestamp": now_millis(),
            }),
        )
        .await
    }

    async fn send_typing(&self, is_typing: bool) -> PortResult<()> {
        self.post_json(
            "/typing",
            serde_json::json!({ "isTyping": is_typing, "timestamp": now_millis() }),
        )
        .await
    }
}
