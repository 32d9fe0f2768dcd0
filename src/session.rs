use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rand::distributions::Alphanumeric;
use rand::Rng;
use tracing::{debug, info, warn};

use crate::api::LegalBackend;
use crate::error::{RequestError, StorageError};
use crate::loading::LoadingFlag;
use crate::storage::LocalStorage;
use crate::types::ConversationHistory;

/// Local storage key holding the client's session id.
pub const SESSION_STORAGE_KEY: &str = "legal-assistant-session-id";

const SESSION_SUFFIX_LEN: usize = 9;

/// Read the persisted session id, creating and persisting one if absent.
pub async fn get_or_create_session_id(storage: &LocalStorage) -> Result<String, StorageError> {
    let mut created = false;
    let id = storage
        .get_or_insert_with(SESSION_STORAGE_KEY, || {
            created = true;
            generate_session_id()
        })
        .await?;
    if created {
        info!(session_id = %id, path = ?storage.path(), "new session created");
    }
    Ok(id)
}

/// `session-{unix millis}-{random suffix}`. Unique in practice, not
/// cryptographically.
fn generate_session_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SESSION_SUFFIX_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();
    format!("session-{}-{}", chrono::Utc::now().timestamp_millis(), suffix)
}

/// One client's session: a stable id plus the conversation log shown to the
/// user.
///
/// Local appends are provisional. The next successful [`load_history`]
/// replaces the log with the backend's copy.
///
/// [`load_history`]: SessionManager::load_history
pub struct SessionManager {
    id: String,
    backend: Arc<dyn LegalBackend>,
    history: Mutex<ConversationHistory>,
    loading: LoadingFlag,
}

impl SessionManager {
    pub fn new(id: String, backend: Arc<dyn LegalBackend>) -> Self {
        Self {
            id,
            backend,
            history: Mutex::new(Vec::new()),
            loading: LoadingFlag::default(),
        }
    }

    /// Resolve the persisted id and pull the initial history.
    pub async fn open(storage: &LocalStorage, backend: Arc<dyn LegalBackend>) -> Result<Self, StorageError> {
        let id = get_or_create_session_id(storage).await?;
        let session = Self::new(id, backend);
        session.load_history().await;
        Ok(session)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_loading()
    }

    pub fn history(&self) -> ConversationHistory {
        self.entries().clone()
    }

    fn entries(&self) -> MutexGuard<'_, ConversationHistory> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Refresh from the backend. Failures are logged and the current log is
    /// kept.
    pub async fn load_history(&self) {
        let _loading = self.loading.begin();
        match self.backend.conversation_history(&self.id).await {
            Ok(history) => {
                debug!(session_id = %self.id, entries = history.len(), "history loaded");
                *self.entries() = history;
            }
            Err(e) => {
                warn!(session_id = %self.id, error = %e, "Failed to load conversation history");
            }
        }
    }

    /// Ask the backend to drop the history. Local entries are cleared only if
    /// it succeeds.
    pub async fn clear_history(&self) -> Result<(), RequestError> {
        let _loading = self.loading.begin();
        match self.backend.clear_conversation_history(&self.id).await {
            Ok(()) => {
                self.entries().clear();
                info!(session_id = %self.id, "conversation cleared");
                Ok(())
            }
            Err(e) => {
                warn!(session_id = %self.id, error = %e, "Failed to clear conversation");
                Err(e)
            }
        }
    }

    pub fn append_local(&self, entry: impl Into<String>) {
        self.entries().push(entry.into());
    }
}
