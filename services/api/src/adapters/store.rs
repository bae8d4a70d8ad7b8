//! services/api/src/adapters/store.rs
//!
//! This module contains the conversation store adapter, the concrete
//! implementation of the `ConversationStore` port. Each record is a single
//! JSON document on disk, keyed the same way the browser client keys its
//! local storage (`conversation_<sessionId>`), so a log written here is
//! byte-compatible with one exported from the frontend.

use async_trait::async_trait;
use interview_core::{
    domain::{InterviewSession, Message},
    ports::{ConversationStore, PortError, PortResult},
};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A file-backed store that implements the `ConversationStore` port.
#[derive(Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    /// Creates a new `JsonFileStore` rooted at the given directory. The
    /// directory is created lazily on first write.
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn session_path(&self, session_id: Uuid) -> PathBuf {
        self.root.join(format!("session_{session_id}.json"))
    }

    fn conversation_path(&self, session_id: Uuid) -> PathBuf {
        self.root.join(format!("conversation_{session_id}.json"))
    }

    async fn ensure_root(&self) -> PortResult<()> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| PortError::Unexpected(format!("Failed to create storage dir: {e}")))
    }

    async fn read_json(path: &Path) -> PortResult<Option<Vec<u8>>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PortError::Unexpected(format!(
                "Failed to read {}: {e}",
                path.display()
            ))),
        }
    }
}

//=========================================================================================
// `ConversationStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl ConversationStore for JsonFileStore {
    async fn save_session(&self, session: &InterviewSession) -> PortResult<()> {
        self.ensure_root().await?;
        let json = serde_json::to_vec_pretty(session)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        tokio::fs::write(self.session_path(session.id), json)
            .await
            .map_err(|e| PortError::Unexpected(format!("Failed to write session: {e}")))
    }

    async fn load_session(&self, session_id: Uuid) -> PortResult<InterviewSession> {
        let path = self.session_path(session_id);
        let bytes = Self::read_json(&path)
            .await?
            .ok_or_else(|| PortError::NotFound(format!("session {session_id}")))?;
        serde_json::from_slice(&bytes).map_err(|e| PortError::Unexpected(e.to_string()))
    }

    /// Persists the frozen conversation log. The log is write-once: a second
    /// save under the same session id is rejected.
    async fn save_conversation(&self, session_id: Uuid, log: &[Message]) -> PortResult<()> {
        self.ensure_root().await?;
        let path = self.conversation_path(session_id);
        let exists = tokio::fs::try_exists(&path)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        if exists {
            return Err(PortError::Unexpected(format!(
                "Conversation for session {session_id} was already persisted"
            )));
        }

        let json =
            serde_json::to_vec_pretty(log).map_err(|e| PortError::Unexpected(e.to_string()))?;
        tokio::fs::write(&path, json)
            .await
            .map_err(|e| PortError::Unexpected(format!("Failed to write conversation: {e}")))
    }

    async fn load_conversation(&self, session_id: Uuid) -> PortResult<Option<Vec<Message>>> {
        let path = self.conversation_path(session_id);
        match Self::read_json(&path).await? {
            None => Ok(None),
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| PortError::Unexpected(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use interview_core::domain::{InterviewKind, Sender};

    fn scratch_store() -> JsonFileStore {
        let dir = std::env::temp_dir().join(format!("interview-store-{}", Uuid::new_v4()));
        JsonFileStore::new(dir)
    }

    fn sample_session() -> InterviewSession {
        InterviewSession {
            id: Uuid::new_v4(),
            kind: InterviewKind::Technical,
            duration: "30 min".to_string(),
            role: "Software Engineer".to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn session_records_survive_a_round_trip() {
        let store = scratch_store();
        let session = sample_session();

        store.save_session(&session).await.unwrap();
        let loaded = store.load_session(session.id).await.unwrap();

        assert_eq!(loaded.id, session.id);
        assert_eq!(loaded.kind, session.kind);
        assert_eq!(loaded.role, session.role);

        tokio::fs::remove_dir_all(&store.root).await.ok();
    }

    #[tokio::test]
    async fn missing_session_is_not_found() {
        let store = scratch_store();
        match store.load_session(Uuid::new_v4()).await {
            Err(PortError::NotFound(_)) => {}
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn conversation_log_is_write_once() {
        let store = scratch_store();
        let session_id = Uuid::new_v4();
        let log = vec![
            Message::new(Sender::User, "hello", "10:00"),
            Message::new(Sender::Interviewer, "welcome", "10:00"),
        ];

        store.save_conversation(session_id, &log).await.unwrap();
        let loaded = store.load_conversation(session_id).await.unwrap().unwrap();
        assert_eq!(loaded, log);

        // Freezing twice must fail rather than silently overwrite.
        assert!(store.save_conversation(session_id, &log).await.is_err());

        tokio::fs::remove_dir_all(&store.root).await.ok();
    }

    #[tokio::test]
    async fn absent_conversation_reads_as_none() {
        let store = scratch_store();
        let loaded = store.load_conversation(Uuid::new_v4()).await.unwrap();
        assert!(loaded.is_none());
    }
}
