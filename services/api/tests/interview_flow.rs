//! End-to-end exercise of the REST surface over mock ports: create an
//! interview, talk to it, end it, and grade the persisted log.

use api_lib::adapters::{JsonFileStore, SimulatedPollTransport};
use api_lib::config::{Config, TransportMode};
use api_lib::web::{api_router, state::AppState};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use interview_core::domain::Message;
use interview_core::ports::{
    InterviewerService, PortResult, RealtimeTransport, ReplyStream, SpeechToTextService,
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower::ServiceExt;
use uuid::Uuid;

const CANNED_REPLY: &str =
    "That is a solid answer. Can you walk me through a concrete example?";
const CANNED_TRANSCRIPT: &str = "I would reach for a hash map first.";

struct CannedInterviewer;

#[async_trait]
impl InterviewerService for CannedInterviewer {
    async fn reply(
        &self,
        _candidate_text: &str,
        _history: &[Message],
        _role: &str,
    ) -> PortResult<String> {
        Ok(CANNED_REPLY.to_string())
    }

    async fn reply_streaming(
        &self,
        candidate_text: &str,
        history: &[Message],
        role: &str,
    ) -> PortResult<ReplyStream> {
        let full = self.reply(candidate_text, history, role).await?;
        Ok(Box::pin(futures::stream::iter(vec![Ok(full)])))
    }
}

struct FixedTranscriber;

#[async_trait]
impl SpeechToTextService for FixedTranscriber {
    async fn transcribe_audio(&self, _audio_data: &[u8]) -> PortResult<String> {
        Ok(CANNED_TRANSCRIPT.to_string())
    }
}

fn test_config(storage_dir: PathBuf) -> Config {
    Config {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        log_level: tracing::Level::INFO,
        storage_dir,
        cors_origin: "http://localhost:5173".to_string(),
        openai_api_key: None,
        interviewer_model: "gpt-4o-mini".to_string(),
        sst_model: "whisper-1".to_string(),
        transport_mode: TransportMode::Simulated,
        realtime_upstream: None,
        realtime_token: None,
        poll_interval_ms: 1000,
        reply_cache_ttl_secs: 300,
        stream_replies: false,
        preload_replies: false,
    }
}

async fn test_app() -> Router {
    let storage_dir = std::env::temp_dir().join(format!("interview-flow-{}", Uuid::new_v4()));
    let transport = Arc::new(SimulatedPollTransport::with_event_probability(0.0));
    transport.connect().await.unwrap();

    let app_state = Arc::new(AppState {
        store: Arc::new(JsonFileStore::new(storage_dir.clone())),
        config: Arc::new(test_config(storage_dir)),
        sst_adapter: Arc::new(FixedTranscriber),
        interviewer: Arc::new(CannedInterviewer),
        transport,
        sessions: Mutex::new(HashMap::new()),
    });
    api_router(app_state)
}

async fn request(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };
    (status, json)
}

async fn create_interview(app: &Router) -> String {
    let (status, body) = request(
        app,
        "POST",
        "/interviews",
        Some(serde_json::json!({ "kind": "technical", "role": "Backend Developer" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["interviewId"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn full_interview_flow_produces_a_persisted_score() {
    let app = test_app().await;
    let id = create_interview(&app).await;

    // The fresh session is live and already carries the connect notice.
    let (status, body) = request(&app, "GET", &format!("/interviews/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["live"], true);
    assert_eq!(body["ended"], false);
    assert_eq!(body["totalMessages"], 1);
    assert_eq!(body["role"], "Backend Developer");

    // First candidate message is answered by the model...
    let (status, body) = request(
        &app,
        "POST",
        &format!("/interviews/{id}/messages"),
        Some(serde_json::json!({ "text": "Tell me about yourself" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reply"], CANNED_REPLY);
    assert_eq!(body["cached"], false);

    // ...and the identical question is served from the reply cache.
    let (status, body) = request(
        &app,
        "POST",
        &format!("/interviews/{id}/messages"),
        Some(serde_json::json!({ "text": "Tell me about yourself" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cached"], true);

    // One system notice plus two full exchanges.
    let (status, body) =
        request(&app, "GET", &format!("/interviews/{id}/messages"), None).await;
    assert_eq!(status, StatusCode::OK);
    let messages = body.as_array().unwrap();
    assert_eq!(messages.len(), 5);
    assert_eq!(messages[0]["sender"], "system");
    assert_eq!(messages[1]["sender"], "user");
    assert_eq!(messages[2]["sender"], "interviewer");

    // Only the generated reply counts toward the rolling samples; the cache
    // hit does not.
    let (status, body) =
        request(&app, "GET", &format!("/interviews/{id}/analytics"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalResponses"], 1);
    assert_eq!(body["cacheHitRate"], 100);

    // Ending freezes the log; ending twice is rejected.
    let (status, body) = request(&app, "POST", &format!("/interviews/{id}/end"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalMessages"], 5);
    let (status, _) = request(&app, "POST", &format!("/interviews/{id}/end"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    // The persisted log grades into a full report.
    let (status, report) =
        request(&app, "GET", &format!("/interviews/{id}/score"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["conversationStats"]["totalMessages"], 5);
    assert_eq!(report["conversationStats"]["userMessages"], 2);
    assert_eq!(report["conversationStats"]["aiMessages"], 2);
    assert_eq!(report["codeQuality"], 5);
    assert!(report["overall"].as_u64().unwrap() <= 10);
    assert!(report["summary"].as_str().unwrap().len() > 20);
}

#[tokio::test]
async fn score_of_an_unknown_interview_is_null() {
    let app = test_app().await;
    let (status, body) = request(
        &app,
        "GET",
        &format!("/interviews/{}/score", Uuid::new_v4()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_null());
}

#[tokio::test]
async fn typing_indicator_lands_in_the_update_queue() {
    let app = test_app().await;
    let id = create_interview(&app).await;

    let (status, _) = request(
        &app,
        "POST",
        &format!("/interviews/{id}/typing"),
        Some(serde_json::json!({ "isTyping": true })),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) =
        request(&app, "GET", &format!("/interviews/{id}/updates"), None).await;
    assert_eq!(status, StatusCode::OK);
    let updates = body.as_array().unwrap();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0]["type"], "typing_indicator");
    assert_eq!(updates[0]["isTyping"], true);

    // Draining twice yields nothing new.
    let (_, body) = request(&app, "GET", &format!("/interviews/{id}/updates"), None).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn audio_turn_is_transcribed_and_answered() {
    let app = test_app().await;
    let id = create_interview(&app).await;

    let boundary = "interview-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        b"Content-Disposition: form-data; name=\"audio\"; filename=\"turn.raw\"\r\n",
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(&[0u8, 1, 2, 3, 4, 5, 6, 7]);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    let request = Request::builder()
        .method("POST")
        .uri(format!("/interviews/{id}/audio"))
        .header(
            "content-type",
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["transcript"], CANNED_TRANSCRIPT);
    assert_eq!(json["reply"], CANNED_REPLY);
}

#[tokio::test]
async fn malformed_interview_requests_are_rejected() {
    let app = test_app().await;

    // Unknown interview kind.
    let (status, _) = request(
        &app,
        "POST",
        "/interviews",
        Some(serde_json::json!({ "kind": "onsite" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Empty message text.
    let id = create_interview(&app).await;
    let (status, _) = request(
        &app,
        "POST",
        &format!("/interviews/{id}/messages"),
        Some(serde_json::json!({ "text": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Messages of an interview that never existed.
    let (status, _) = request(
        &app,
        "GET",
        &format!("/interviews/{}/messages", Uuid::new_v4()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
