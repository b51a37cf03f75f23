//! Filesystem session storage: one JSON file per session under the base
//! directory.

use super::ConversationStorage;
use crate::routing::message::Message;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;

pub struct FileSystemStorage {
    base_path: PathBuf,
}

impl FileSystemStorage {
    pub async fn new(base_path: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base_path)
            .await
            .context("failed to create storage directory")?;
        Ok(Self { base_path })
    }

    fn session_path(&self, session_id: &str) -> PathBuf {
        self.base_path.join(format!("{}.json", session_id))
    }
}

#[async_trait]
impl ConversationStorage for FileSystemStorage {
    async fn save(&self, session_id: &str, history: &[Message]) -> Result<()> {
        let path = self.session_path(session_id);
        let json = serde_json::to_string_pretty(history)
            .context("failed to serialize conversation history")?;

        fs::write(&path, json)
            .await
            .with_context(|| format!("failed to write session file {:?}", path))?;

        tracing::debug!(
            "[FileSystemStorage] saved {} messages for session '{}'",
            history.len(),
            session_id
        );
        Ok(())
    }

    async fn load(&self, session_id: &str) -> Result<Vec<Message>> {
        let path = self.session_path(session_id);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let json = fs::read_to_string(&path)
            .await
            .with_context(|| format!("failed to read session file {:?}", path))?;
        serde_json::from_str(&json).context("failed to deserialize conversation history")
    }

    async fn delete(&self, session_id: &str) -> Result<()> {
        let path = self.session_path(session_id);
        if path.exists() {
            fs::remove_file(&path)
                .await
                .with_context(|| format!("failed to delete session file {:?}", path))?;
        }
        Ok(())
    }

    async fn list_sessions(&self) -> Result<Vec<String>> {
        let mut sessions = Vec::new();
        let mut entries = fs::read_dir(&self.base_path)
            .await
            .context("failed to read storage directory")?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .context("failed to read directory entry")?
        {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) == Some("json") {
                if let Some(session_id) = path.file_stem().and_then(|s| s.to_str()) {
                    sessions.push(session_id.to_string());
                }
            }
        }

        Ok(sessions)
    }

    async fn exists(&self, session_id: &str) -> Result<bool> {
        Ok(self.session_path(session_id).exists())
    }
}
