#[cfg(test)]
mod tests;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("History file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One role-tagged turn of the conversation transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    #[inline]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    #[inline]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    #[inline]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// On-disk shape of the history file.
#[derive(Debug, Serialize, Deserialize)]
struct HistoryFile {
    messages: Vec<Message>,
    #[serde(default)]
    saved_at: Option<DateTime<Utc>>,
}

/// JSON-file persistence for the conversation transcript.
///
/// The whole transcript is rewritten after every completed exchange
/// (truncate-and-insert, matching the reference behavior). Only raw user
/// queries are ever stored; retrieval augmentation happens on the outgoing
/// request and is invisible here.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    #[inline]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored transcript. A missing file is an empty transcript.
    #[inline]
    pub fn load(&self) -> Result<Vec<Message>, HistoryError> {
        if !self.path.exists() {
            debug!("No history file at {}; starting empty", self.path.display());
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path)?;
        let file: HistoryFile = serde_json::from_str(&content)?;

        debug!(
            "Loaded {} messages from {}",
            file.messages.len(),
            self.path.display()
        );
        Ok(file.messages)
    }

    /// Replace the stored transcript with `messages`.
    #[inline]
    pub fn save(&self, messages: &[Message]) -> Result<(), HistoryError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = HistoryFile {
            messages: messages.to_vec(),
            saved_at: Some(Utc::now()),
        };
        let content = serde_json::to_string_pretty(&file)?;
        fs::write(&self.path, content)?;

        debug!(
            "Saved {} messages to {}",
            messages.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Delete the stored transcript. Succeeds if none exists.
    #[inline]
    pub fn clear(&self) -> Result<(), HistoryError> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
            info!("Cleared history at {}", self.path.display());
        }
        Ok(())
    }
}
