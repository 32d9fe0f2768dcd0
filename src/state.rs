use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{OnceCell, RwLock};
use tracing::info;

use crate::analysis::AnalysisOrchestrator;
use crate::api::LegalBackend;
use crate::error::StorageError;
use crate::health::HealthMonitor;
use crate::session::SessionManager;
use crate::storage::LocalStorage;

/// Everything one client works with: its session and its analysis state.
pub struct SessionContext {
    pub session: SessionManager,
    pub analysis: AnalysisOrchestrator,
}

impl SessionContext {
    pub async fn open(storage: &LocalStorage, backend: Arc<dyn LegalBackend>) -> Result<Self, StorageError> {
        let session = SessionManager::open(storage, backend.clone()).await?;
        Ok(Self {
            session,
            analysis: AnalysisOrchestrator::new(backend),
        })
    }
}

pub struct AppState {
    pub backend: Arc<dyn LegalBackend>,
    pub health: Arc<HealthMonitor>,
    pub data_dir: PathBuf,
    sessions: RwLock<HashMap<u64, Arc<OnceCell<Arc<SessionContext>>>>>,
}

impl AppState {
    pub fn new(backend: Arc<dyn LegalBackend>, health: Arc<HealthMonitor>, data_dir: PathBuf) -> Self {
        Self {
            backend,
            health,
            data_dir,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Session context for a Discord user, opened on first use.
    ///
    /// The map lock only guards the per-user slot. Opening, which may hit the
    /// backend, runs outside it, so a slow open blocks callers for that user
    /// only.
    pub async fn session_for(&self, user_id: u64) -> Result<Arc<SessionContext>, StorageError> {
        let slot = self.slot(user_id).await;
        let ctx = slot
            .get_or_try_init(|| async {
                let storage = LocalStorage::for_client(&self.data_dir, &user_id.to_string());
                let ctx = SessionContext::open(&storage, self.backend.clone()).await?;
                info!(user_id, session_id = ctx.session.id(), "session context opened");
                Ok::<_, StorageError>(Arc::new(ctx))
            })
            .await?;
        Ok(ctx.clone())
    }

    async fn slot(&self, user_id: u64) -> Arc<OnceCell<Arc<SessionContext>>> {
        if let Some(slot) = self.sessions.read().await.get(&user_id) {
            return slot.clone();
        }
        self.sessions.write().await.entry(user_id).or_default().clone()
    }
}

pub type Context<'a> = poise::Context<'a, AppState, anyhow::Error>;

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::error::Endpoint;
    use crate::testing::StubBackend;

    #[tokio::test]
    async fn test_session_context_is_cached_per_user() {
        let dir = tempfile::tempdir().unwrap();
        let stub = Arc::new(StubBackend::new());
        StubBackend::set(&stub.history_reply, Some(vec!["earlier".to_string()]));
        let health = Arc::new(HealthMonitor::new(stub.clone()));
        let state = AppState::new(stub.clone(), health, dir.path().to_path_buf());

        let a = state.session_for(1).await.unwrap();
        let again = state.session_for(1).await.unwrap();
        let b = state.session_for(2).await.unwrap();

        assert!(Arc::ptr_eq(&a, &again));
        assert_ne!(a.session.id(), b.session.id());
        assert_eq!(a.session.history(), vec!["earlier".to_string()]);
        assert_eq!(stub.call_count(Endpoint::GetHistory), 2);
    }

    #[tokio::test]
    async fn test_slow_open_does_not_block_other_users() {
        let dir = tempfile::tempdir().unwrap();
        let stub = Arc::new(StubBackend::new());
        StubBackend::set(&stub.history_reply, Some(Vec::new()));
        let health = Arc::new(HealthMonitor::new(stub.clone()));
        let state = Arc::new(AppState::new(stub.clone(), health, dir.path().to_path_buf()));

        let one = state.session_for(1).await.unwrap();

        let gate = Arc::new(tokio::sync::Notify::new());
        StubBackend::set(&stub.history_gate, Some(gate.clone()));
        let pending = tokio::spawn({
            let state = state.clone();
            async move { state.session_for(2).await.map(|ctx| ctx.session.id().to_string()) }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(stub.call_count(Endpoint::GetHistory), 2);

        let again = tokio::time::timeout(Duration::from_secs(1), state.session_for(1))
            .await
            .expect("cached user waited on another user's open")
            .unwrap();
        assert!(Arc::ptr_eq(&one, &again));
        assert!(!pending.is_finished());

        gate.notify_one();
        let two = pending.await.unwrap().unwrap();
        assert_ne!(two, one.session.id());
    }

    #[tokio::test]
    async fn test_concurrent_first_use_opens_once() {
        let dir = tempfile::tempdir().unwrap();
        let stub = Arc::new(StubBackend::new());
        let health = Arc::new(HealthMonitor::new(stub.clone()));
        let state = AppState::new(stub.clone(), health, dir.path().to_path_buf());

        let (a, b) = tokio::join!(state.session_for(9), state.session_for(9));
        let (a, b) = (a.unwrap(), b.unwrap());
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(stub.call_count(Endpoint::GetHistory), 1);
    }

    #[tokio::test]
    async fn test_session_id_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let stub = Arc::new(StubBackend::new());
        let health = Arc::new(HealthMonitor::new(stub.clone()));

        let first = AppState::new(stub.clone(), health.clone(), dir.path().to_path_buf());
        let id = first.session_for(7).await.unwrap().session.id().to_string();

        let second = AppState::new(stub, health, dir.path().to_path_buf());
        assert_eq!(second.session_for(7).await.unwrap().session.id(), id);
    }
}
