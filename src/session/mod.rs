
use anyhow::{Context, Result};
use std::path::Path;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::extract;
use crate::history::{HistoryStore, Message};
use crate::openrouter::OpenRouterClient;
use crate::retrieval::{DocumentIndex, Embedder, RetrievalEngine, RetrievalError};

/// What an upload did to the active index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// A fresh index was installed.
    Indexed { chunks: usize, dimension: usize },
    /// The batch had no extractable text; any prior index was discarded.
    Empty,
}

/// One user's chat session: transcript, document index, and the clients
/// that serve them.
///
/// The HTTP client and retrieval engine are built once here and reused for
/// every interaction. All state is owned exclusively by the session; there
/// is no shared mutation, so one upload or query runs start to finish
/// before the next.
pub struct ChatSession {
    config: Config,
    client: OpenRouterClient,
    engine: RetrievalEngine<OpenRouterClient>,
    active_index: Option<DocumentIndex>,
    messages: Vec<Message>,
    history: HistoryStore,
    session_id: Uuid,
}

impl ChatSession {
    /// Build a session from config, loading any persisted transcript.
    ///
    /// A corrupt history file is demoted to a warning and an empty
    /// transcript; it must not keep the user from chatting.
    #[inline]
    pub fn new(config: Config) -> Result<Self> {
        let client = OpenRouterClient::new(&config).context("Failed to initialize API client")?;
        let engine = RetrievalEngine::new(client.clone(), config.retrieval.clone());
        let history = HistoryStore::new(config.history_path());

        let messages = match history.load() {
            Ok(messages) => messages,
            Err(e) => {
                warn!("Could not load history ({}); starting empty", e);
                Vec::new()
            }
        };

        let session_id = Uuid::new_v4();
        info!(
            "Session {} started with {} stored messages",
            session_id,
            messages.len()
        );

        Ok(Self {
            config,
            client,
            engine,
            active_index: None,
            messages,
            history,
            session_id,
        })
    }

    /// Extract, chunk, embed, and index a batch of uploaded files.
    ///
    /// The new index replaces the old one entirely, and only after the whole
    /// build succeeded; on any failure the previously active index stays in
    /// place untouched.
    #[inline]
    pub fn upload<P: AsRef<Path>>(&mut self, paths: &[P]) -> Result<UploadOutcome> {
        let texts = extract::extract_documents(paths)?;
        let outcome = install_index(&self.engine, &mut self.active_index, &texts)?;
        info!("Session {}: upload outcome {:?}", self.session_id, outcome);
        Ok(outcome)
    }

    /// Ask a question, streaming reply fragments to `on_delta`.
    ///
    /// The outgoing request carries the retrieval-augmented prompt as its
    /// final user message; the stored transcript gets the raw query, so
    /// context injection never shows up in history. The exchange is only
    /// appended and persisted once the completion succeeded.
    #[inline]
    pub fn ask<F>(&mut self, query: &str, on_delta: F) -> Result<String>
    where
        F: FnMut(&str),
    {
        let augmented = self
            .engine
            .respond(query, self.active_index.as_ref())
            .context("Failed to assemble prompt")?;

        let outbound = outbound_messages(&self.messages, &augmented);
        let reply = self
            .client
            .stream_chat(&outbound, on_delta)
            .context("Completion request failed")?;

        self.messages.push(Message::user(query));
        self.messages.push(Message::assistant(&reply));

        if let Err(e) = self.history.save(&self.messages) {
            // The exchange already happened; losing persistence is not fatal.
            warn!("Failed to persist history: {}", e);
        }

        Ok(reply)
    }

    #[inline]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    #[inline]
    pub fn has_index(&self) -> bool {
        self.active_index.is_some()
    }

    #[inline]
    pub fn active_index(&self) -> Option<&DocumentIndex> {
        self.active_index.as_ref()
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Wipe the in-memory transcript and the persisted history file.
    #[inline]
    pub fn clear_history(&mut self) -> Result<()> {
        self.messages.clear();
        self.history.clear().context("Failed to clear history")?;
        info!("Session {}: history cleared", self.session_id);
        Ok(())
    }
}

/// Ingest `texts` and swap the result into `active`, only on success.
///
/// The swap happens after the whole build returned: an empty batch installs
/// `None` and so clears any prior index, a successful build replaces it
/// entirely, and a failed build leaves it in place untouched.
fn install_index<E: Embedder>(
    engine: &RetrievalEngine<E>,
    active: &mut Option<DocumentIndex>,
    texts: &[String],
) -> Result<UploadOutcome, RetrievalError> {
    let built = engine.ingest(texts)?;

    let outcome = match &built {
        Some(index) => UploadOutcome::Indexed {
            chunks: index.chunk_count(),
            dimension: index.dimension(),
        },
        None => UploadOutcome::Empty,
    };

    *active = built;
    Ok(outcome)
}

/// Transcript to submit externally: every stored message as-is, with the
/// augmented prompt as the final user turn in place of the raw query.
fn outbound_messages(transcript: &[Message], augmented_query: &str) -> Vec<Message> {
    let mut outbound = Vec::with_capacity(transcript.len() + 1);
    outbound.extend_from_slice(transcript);
    outbound.push(Message::user(augmented_query));
    outbound
}
