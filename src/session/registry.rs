//! Session registry - owns every live client and its lifecycle.

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use log::{debug, error, info, warn};
use serde_json::json;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::client::{ClientEvent, ClientFactory, MessagingClient};
use crate::store::CredentialStore;
use crate::webhook::WebhookNotifier;

use super::models::{SessionSnapshot, SessionStatus};
use super::RegistryError;

/// Tunables for session lifecycle handling.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// QR rotations allowed before the session is torn down unscanned.
    pub max_qr_retries: u32,
    /// Automatic restarts attempted after an unexpected disconnect.
    pub auto_restart_max: u32,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_qr_retries: 5,
            auto_restart_max: 2,
        }
    }
}

/// Mutable lifecycle state, guarded by the entry's lock.
struct SessionState {
    status: SessionStatus,
    qr: Option<String>,
    qr_retries: u32,
    restart_attempts: u32,
}

/// One live session: the exclusive client handle plus lifecycle state.
struct SessionEntry {
    id: String,
    client: Arc<dyn MessagingClient>,
    state: Mutex<SessionState>,
    last_activity: AtomicI64,
    terminated: AtomicBool,
}

impl SessionEntry {
    fn new(id: &str, client: Arc<dyn MessagingClient>, restart_attempts: u32) -> Self {
        Self {
            id: id.to_string(),
            client,
            state: Mutex::new(SessionState {
                status: SessionStatus::Starting,
                qr: None,
                qr_retries: 0,
                restart_attempts,
            }),
            last_activity: AtomicI64::new(Utc::now().timestamp()),
            terminated: AtomicBool::new(false),
        }
    }

    fn status(&self) -> SessionStatus {
        self.lock_state().status
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn snapshot(&self) -> SessionSnapshot {
        let state = self.lock_state();
        SessionSnapshot {
            id: self.id.clone(),
            status: state.status,
            qr_available: state.status == SessionStatus::ScanQrCode && state.qr.is_some(),
            last_activity: DateTime::from_timestamp(self.last_activity.load(Ordering::Relaxed), 0)
                .unwrap_or_else(Utc::now),
        }
    }

    fn touch(&self) {
        self.last_activity
            .store(Utc::now().timestamp(), Ordering::Relaxed);
    }
}

/// Registry of live sessions.
///
/// One entry per session id; the entry owns the only handle to its client.
/// Lifecycle events are consumed by a single task per session, so they are
/// applied in emission order.
pub struct SessionRegistry {
    entries: DashMap<String, Arc<SessionEntry>>,
    /// Per-id terminate counter. A start that was awaiting its client when a
    /// terminate ran sees the bump and aborts instead of resurrecting.
    terminations: DashMap<String, u64>,
    store: Arc<dyn CredentialStore>,
    factory: Arc<dyn ClientFactory>,
    webhooks: WebhookNotifier,
    config: RegistryConfig,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new(
        store: Arc<dyn CredentialStore>,
        factory: Arc<dyn ClientFactory>,
        webhooks: WebhookNotifier,
        config: RegistryConfig,
    ) -> Self {
        Self {
            entries: DashMap::new(),
            terminations: DashMap::new(),
            store,
            factory,
            webhooks,
            config,
        }
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no sessions are live.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Start a session, or report the current status if it is already live.
    pub async fn start(self: &Arc<Self>, id: &str) -> Result<SessionStatus, RegistryError> {
        self.start_session(id, 0).await
    }

    // Boxed because the auto-restart path re-enters this function from a
    // task spawned inside it.
    fn start_session<'a>(
        self: &'a Arc<Self>,
        id: &'a str,
        restart_attempts: u32,
    ) -> Pin<Box<dyn Future<Output = Result<SessionStatus, RegistryError>> + Send + 'a>> {
        Box::pin(async move {
            if let Some(entry) = self.entries.get(id) {
                return Ok(entry.status());
            }

            let epoch = self.termination_epoch(id);

            let (client, events_rx) = self.factory.create(id).await?;
            let entry = Arc::new(SessionEntry::new(id, client, restart_attempts));

            // A concurrent start may have won while the factory ran; the map
            // entry decides, and the loser's client is torn down.
            match self.entries.entry(id.to_string()) {
                Entry::Occupied(existing) => {
                    let status = existing.get().status();
                    let loser = entry.client.clone();
                    tokio::spawn(async move {
                        let _ = loser.disconnect().await;
                    });
                    return Ok(status);
                }
                Entry::Vacant(slot) => {
                    slot.insert(entry.clone());
                }
            }

            // A terminate that ran while the factory was creating the client
            // found no entry to remove; its epoch bump is visible here and
            // the terminate's outcome stands.
            if self.termination_epoch(id) != epoch {
                info!("Start of session {} aborted by terminate", id);
                self.entries
                    .remove_if(id, |_, live| Arc::ptr_eq(live, &entry));
                self.stop_entry(&entry).await;
                return Ok(SessionStatus::Terminated);
            }

            info!("Starting session {}", id);
            tokio::spawn(Self::run_event_pump(self.clone(), entry.clone(), events_rx));

            let connecting = entry.clone();
            let registry = self.clone();
            tokio::spawn(async move {
                if let Err(e) = connecting.client.connect().await {
                    if connecting.terminated.load(Ordering::SeqCst) {
                        return;
                    }
                    error!("Session {} failed to connect: {}", connecting.id, e);
                    connecting.lock_state().status = SessionStatus::Failed;
                    registry.webhooks.notify(
                        &connecting.id,
                        "status",
                        json!({ "status": SessionStatus::Failed, "message": e.to_string() }),
                    );
                }
            });

            Ok(SessionStatus::Starting)
        })
    }

    fn termination_epoch(&self, id: &str) -> u64 {
        self.terminations.get(id).map(|epoch| *epoch).unwrap_or(0)
    }

    /// Current status of a session.
    pub fn status(&self, id: &str) -> Result<SessionSnapshot, RegistryError> {
        self.entries
            .get(id)
            .map(|entry| entry.snapshot())
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))
    }

    /// Most recent QR payload, only while the session awaits a scan.
    pub fn qr_code(&self, id: &str) -> Result<String, RegistryError> {
        let entry = self
            .entries
            .get(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        let state = entry.lock_state();
        if state.status != SessionStatus::ScanQrCode {
            return Err(RegistryError::QrNotAvailable(id.to_string()));
        }
        state
            .qr
            .clone()
            .ok_or_else(|| RegistryError::QrNotAvailable(id.to_string()))
    }

    /// Most recent QR payload rendered as a PNG.
    pub fn qr_png(&self, id: &str) -> Result<Vec<u8>, RegistryError> {
        let payload = self.qr_code(id)?;
        Ok(crate::qr::render_png(&payload)?)
    }

    /// Tear down and start the session again.
    ///
    /// Credentials survive the restart unless authentication had failed, in
    /// which case they are wiped so the next start pairs from scratch.
    pub async fn restart(self: &Arc<Self>, id: &str) -> Result<SessionStatus, RegistryError> {
        if let Some((_, entry)) = self.entries.remove(id) {
            let failed_auth = entry.status() == SessionStatus::Failed;
            self.stop_entry(&entry).await;
            if failed_auth {
                self.delete_credentials(id).await;
            }
        }
        self.start_session(id, 0).await
    }

    /// Tear down a session and delete its credentials.
    ///
    /// Idempotent: terminating an unknown id succeeds, and the credential
    /// blob is removed even when no entry is live. A storage failure during
    /// the delete is logged and does not undo the in-memory removal.
    pub async fn terminate(&self, id: &str) {
        *self.terminations.entry(id.to_string()).or_insert(0) += 1;
        if let Some((_, entry)) = self.entries.remove(id) {
            info!("Terminating session {}", id);
            self.stop_entry(&entry).await;
        }
        self.delete_credentials(id).await;
    }

    /// Terminate every session idle for longer than `threshold`.
    /// Returns the terminated ids.
    pub async fn terminate_inactive(&self, threshold: Duration) -> Vec<String> {
        let cutoff = Utc::now().timestamp() - threshold.as_secs() as i64;
        let idle: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| entry.last_activity.load(Ordering::Relaxed) < cutoff)
            .map(|entry| entry.id.clone())
            .collect();

        for id in &idle {
            info!("Terminating idle session {}", id);
            self.terminate(id).await;
        }
        idle
    }

    /// Terminate every session. Returns the terminated ids.
    pub async fn terminate_all(&self) -> Vec<String> {
        let ids: Vec<String> = self.entries.iter().map(|e| e.id.clone()).collect();
        for id in &ids {
            self.terminate(id).await;
        }
        ids
    }

    /// Live client handle regardless of readiness, for operations that are
    /// meaningful before the session is connected (state probes).
    pub fn client(&self, id: &str) -> Result<Arc<dyn MessagingClient>, RegistryError> {
        self.entries
            .get(id)
            .map(|entry| entry.client.clone())
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))
    }

    /// Live client handle for a session that is ready to serve commands.
    pub fn get(&self, id: &str) -> Result<Arc<dyn MessagingClient>, RegistryError> {
        let entry = self
            .entries
            .get(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        let status = entry.status();
        if !status.is_ready() {
            return Err(RegistryError::NotReady {
                id: id.to_string(),
                status,
            });
        }
        Ok(entry.client.clone())
    }

    /// Refresh a session's activity timestamp. Unknown ids are ignored.
    pub fn touch(&self, id: &str) {
        if let Some(entry) = self.entries.get(id) {
            entry.touch();
        }
    }

    /// Start every session that has persisted credentials. Returns how many
    /// were brought up.
    pub async fn recover(self: &Arc<Self>) -> Result<usize, RegistryError> {
        let ids = self.store.list().await?;
        let mut recovered = 0;
        for id in ids {
            match self.start(&id).await {
                Ok(_) => recovered += 1,
                Err(e) => error!("Failed to recover session {}: {}", id, e),
            }
        }
        Ok(recovered)
    }

    /// Disconnect every session without deleting credentials, so the next
    /// boot can recover them.
    pub async fn shutdown(&self) {
        let entries: Vec<Arc<SessionEntry>> = self
            .entries
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        self.entries.clear();
        for entry in entries {
            debug!("Disconnecting session {} for shutdown", entry.id);
            self.stop_entry(&entry).await;
        }
    }

    async fn stop_entry(&self, entry: &SessionEntry) {
        entry.terminated.store(true, Ordering::SeqCst);
        {
            let mut state = entry.lock_state();
            state.status = SessionStatus::Terminated;
            state.qr = None;
        }
        if let Err(e) = entry.client.disconnect().await {
            debug!("Disconnect of session {} reported: {}", entry.id, e);
        }
    }

    async fn delete_credentials(&self, id: &str) {
        if let Err(e) = self.store.delete(id).await {
            warn!("Failed to delete credentials for session {}: {}", id, e);
        }
    }

    /// Consume one session's lifecycle events in order.
    async fn run_event_pump(
        registry: Arc<Self>,
        entry: Arc<SessionEntry>,
        mut events: mpsc::Receiver<ClientEvent>,
    ) {
        while let Some(event) = events.recv().await {
            if entry.terminated.load(Ordering::SeqCst) {
                continue;
            }
            registry.handle_event(&entry, event).await;
        }
        debug!("Event stream ended for session {}", entry.id);
    }

    /// Status moves only through [`SessionStatus::apply`]; this function owns
    /// the side effects around each transition.
    async fn handle_event(self: &Arc<Self>, entry: &Arc<SessionEntry>, event: ClientEvent) {
        let id = entry.id.as_str();
        match &event {
            ClientEvent::Qr { payload } => {
                let exceeded = {
                    let mut state = entry.lock_state();
                    if state.status.is_terminal() {
                        return;
                    }
                    state.qr_retries += 1;
                    if state.qr_retries > self.config.max_qr_retries {
                        true
                    } else {
                        state.status = state.status.apply(&event);
                        state.qr = Some(payload.clone());
                        false
                    }
                };
                if exceeded {
                    let err = RegistryError::QrRetriesExceeded(id.to_string());
                    warn!("{}; terminating", err);
                    self.webhooks.notify(
                        id,
                        "status",
                        json!({ "status": SessionStatus::Terminated, "message": err.to_string() }),
                    );
                    self.terminate(id).await;
                } else {
                    debug!("QR code issued for session {}", id);
                    self.webhooks.notify(id, "qr", json!({ "qr": payload }));
                }
            }
            ClientEvent::Authenticated => {
                {
                    let mut state = entry.lock_state();
                    if state.status.is_terminal() {
                        return;
                    }
                    state.status = state.status.apply(&event);
                    state.qr = None;
                    state.qr_retries = 0;
                }
                info!("Session {} authenticated", id);
                self.webhooks.notify(id, "authenticated", json!({}));
            }
            ClientEvent::Ready => {
                {
                    let mut state = entry.lock_state();
                    if state.status.is_terminal() {
                        return;
                    }
                    state.status = state.status.apply(&event);
                    state.qr = None;
                    state.qr_retries = 0;
                    state.restart_attempts = 0;
                }
                entry.touch();
                info!("Session {} connected", id);
                self.webhooks.notify(id, "ready", json!({}));
            }
            ClientEvent::Disconnected { reason } => {
                let attempts = {
                    let mut state = entry.lock_state();
                    if state.status.is_terminal() {
                        return;
                    }
                    state.status = state.status.apply(&event);
                    state.qr = None;
                    state.restart_attempts += 1;
                    state.restart_attempts
                };
                warn!("Session {} disconnected: {}", id, reason);
                self.webhooks
                    .notify(id, "disconnected", json!({ "reason": reason }));

                if attempts <= self.config.auto_restart_max {
                    info!(
                        "Auto-restarting session {} (attempt {}/{})",
                        id, attempts, self.config.auto_restart_max
                    );
                    let registry = self.clone();
                    let id = id.to_string();
                    tokio::spawn(async move {
                        if let Err(e) = registry.restart_after_disconnect(&id, attempts).await {
                            error!("Auto-restart of session {} failed: {}", id, e);
                        }
                    });
                } else {
                    warn!(
                        "Session {} exhausted its {} auto-restarts",
                        id, self.config.auto_restart_max
                    );
                }
            }
            ClientEvent::AuthFailure { message } => {
                {
                    let mut state = entry.lock_state();
                    if state.status.is_terminal() {
                        return;
                    }
                    state.status = state.status.apply(&event);
                    state.qr = None;
                }
                error!("Session {} authentication failed: {}", id, message);
                self.webhooks
                    .notify(id, "auth_failure", json!({ "message": message }));
            }
        }
    }

    /// Restart path for the bounded auto-restart: the attempt counter
    /// carries over so a flapping session cannot restart forever.
    async fn restart_after_disconnect(
        self: &Arc<Self>,
        id: &str,
        attempts: u32,
    ) -> Result<SessionStatus, RegistryError> {
        if let Some((_, entry)) = self.entries.remove(id) {
            self.stop_entry(&entry).await;
        }
        self.start_session(id, attempts).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ClientCommand, ClientError, ClientResult};
    use crate::store::LocalCredentialStore;
    use async_trait::async_trait;
    use serde_json::Value;
    use std::collections::HashMap;
    use std::sync::atomic::AtomicUsize;

    struct MockClient;

    #[async_trait]
    impl MessagingClient for MockClient {
        async fn connect(&self) -> ClientResult<()> {
            Ok(())
        }

        async fn execute(&self, _command: ClientCommand) -> ClientResult<Value> {
            Ok(json!({ "mock": true }))
        }

        async fn disconnect(&self) -> ClientResult<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct MockFactory {
        created: AtomicUsize,
        senders: Mutex<HashMap<String, mpsc::Sender<ClientEvent>>>,
        create_delay: Mutex<Duration>,
    }

    impl MockFactory {
        fn created(&self) -> usize {
            self.created.load(Ordering::SeqCst)
        }

        fn sender(&self, id: &str) -> mpsc::Sender<ClientEvent> {
            self.senders.lock().unwrap().get(id).cloned().unwrap()
        }

        fn set_create_delay(&self, delay: Duration) {
            *self.create_delay.lock().unwrap() = delay;
        }
    }

    #[async_trait]
    impl ClientFactory for MockFactory {
        async fn create(
            &self,
            session_id: &str,
        ) -> ClientResult<(Arc<dyn MessagingClient>, mpsc::Receiver<ClientEvent>)> {
            let delay = *self.create_delay.lock().unwrap();
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            self.created.fetch_add(1, Ordering::SeqCst);
            let (tx, rx) = mpsc::channel(16);
            self.senders
                .lock()
                .unwrap()
                .insert(session_id.to_string(), tx);
            Ok((Arc::new(MockClient), rx))
        }
    }

    struct Harness {
        registry: Arc<SessionRegistry>,
        factory: Arc<MockFactory>,
        store: Arc<LocalCredentialStore>,
        _dir: tempfile::TempDir,
    }

    fn harness(config: RegistryConfig) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(LocalCredentialStore::new(dir.path()));
        let factory = Arc::new(MockFactory::default());
        let registry = Arc::new(SessionRegistry::new(
            store.clone(),
            factory.clone(),
            WebhookNotifier::new(None),
            config,
        ));
        Harness {
            registry,
            factory,
            store,
            _dir: dir,
        }
    }

    async fn eventually(mut check: impl FnMut() -> bool) {
        for _ in 0..200 {
            if check() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not met within 1s");
    }

    #[tokio::test]
    async fn test_concurrent_start_yields_one_entry() {
        let h = harness(RegistryConfig::default());
        let (a, b) = tokio::join!(h.registry.start("alpha"), h.registry.start("alpha"));
        a.unwrap();
        b.unwrap();
        assert_eq!(h.registry.len(), 1);
    }

    #[tokio::test]
    async fn test_start_is_noop_when_live() {
        let h = harness(RegistryConfig::default());
        h.registry.start("alpha").await.unwrap();
        let created = h.factory.created();
        let status = h.registry.start("alpha").await.unwrap();
        assert_eq!(status, SessionStatus::Starting);
        assert_eq!(h.factory.created(), created);
    }

    #[tokio::test]
    async fn test_qr_then_ready_scenario() {
        let h = harness(RegistryConfig::default());
        h.registry.start("alpha").await.unwrap();

        assert!(matches!(
            h.registry.qr_code("alpha"),
            Err(RegistryError::QrNotAvailable(_))
        ));

        h.factory
            .sender("alpha")
            .send(ClientEvent::Qr {
                payload: "2@pairing".into(),
            })
            .await
            .unwrap();
        let registry = h.registry.clone();
        eventually(move || {
            registry
                .status("alpha")
                .map(|s| s.status == SessionStatus::ScanQrCode)
                .unwrap_or(false)
        })
        .await;
        assert_eq!(h.registry.qr_code("alpha").unwrap(), "2@pairing");

        h.factory
            .sender("alpha")
            .send(ClientEvent::Authenticated)
            .await
            .unwrap();
        h.factory
            .sender("alpha")
            .send(ClientEvent::Ready)
            .await
            .unwrap();
        let registry = h.registry.clone();
        eventually(move || {
            registry
                .status("alpha")
                .map(|s| s.status == SessionStatus::Connected)
                .unwrap_or(false)
        })
        .await;

        // Stale QR data is gone once authenticated.
        assert!(matches!(
            h.registry.qr_code("alpha"),
            Err(RegistryError::QrNotAvailable(_))
        ));
        assert!(h.registry.get("alpha").is_ok());
    }

    #[tokio::test]
    async fn test_terminate_is_idempotent_and_deletes_credentials() {
        let h = harness(RegistryConfig::default());
        h.store.save("alpha", b"creds").await.unwrap();
        h.registry.start("alpha").await.unwrap();

        h.registry.terminate("alpha").await;
        assert!(matches!(
            h.registry.status("alpha"),
            Err(RegistryError::NotFound(_))
        ));
        assert!(!h.store.exists("alpha").await.unwrap());

        // Unknown and repeated ids both succeed.
        h.registry.terminate("alpha").await;
        h.registry.terminate("never-started").await;
    }

    #[tokio::test]
    async fn test_qr_retry_limit_terminates() {
        let h = harness(RegistryConfig {
            max_qr_retries: 2,
            auto_restart_max: 0,
        });
        h.registry.start("alpha").await.unwrap();
        let sender = h.factory.sender("alpha");
        for _ in 0..3 {
            sender
                .send(ClientEvent::Qr {
                    payload: "2@unscanned".into(),
                })
                .await
                .unwrap();
        }
        let registry = h.registry.clone();
        eventually(move || registry.status("alpha").is_err()).await;
        assert_eq!(h.registry.len(), 0);
    }

    #[tokio::test]
    async fn test_terminate_inactive_only_reaps_idle() {
        let h = harness(RegistryConfig::default());
        h.registry.start("idle").await.unwrap();
        h.registry.start("busy").await.unwrap();

        // Backdate the idle session past the threshold.
        h.registry
            .entries
            .get("idle")
            .unwrap()
            .last_activity
            .store(Utc::now().timestamp() - 3600, Ordering::Relaxed);

        let reaped = h
            .registry
            .terminate_inactive(Duration::from_secs(600))
            .await;
        assert_eq!(reaped, vec!["idle".to_string()]);
        assert!(h.registry.status("busy").is_ok());
        assert!(h.registry.status("idle").is_err());
    }

    #[tokio::test]
    async fn test_recover_starts_all_persisted_sessions() {
        let h = harness(RegistryConfig::default());
        h.store.save("alpha", b"a").await.unwrap();
        h.store.save("beta", b"b").await.unwrap();

        let recovered = h.registry.recover().await.unwrap();
        assert_eq!(recovered, 2);
        assert_eq!(h.registry.len(), 2);
        assert_eq!(
            h.registry.status("alpha").unwrap().status,
            SessionStatus::Starting
        );
    }

    #[tokio::test]
    async fn test_disconnect_triggers_bounded_restart() {
        let h = harness(RegistryConfig {
            max_qr_retries: 5,
            auto_restart_max: 1,
        });
        h.registry.start("alpha").await.unwrap();
        assert_eq!(h.factory.created(), 1);

        h.factory
            .sender("alpha")
            .send(ClientEvent::Disconnected {
                reason: "NAVIGATION".into(),
            })
            .await
            .unwrap();

        let factory = h.factory.clone();
        eventually(move || factory.created() == 2).await;
        let registry = h.registry.clone();
        eventually(move || {
            registry
                .status("alpha")
                .map(|s| s.status == SessionStatus::Starting)
                .unwrap_or(false)
        })
        .await;
    }

    #[tokio::test]
    async fn test_shutdown_keeps_credentials() {
        let h = harness(RegistryConfig::default());
        h.store.save("alpha", b"creds").await.unwrap();
        h.registry.start("alpha").await.unwrap();

        h.registry.shutdown().await;
        assert!(h.registry.is_empty());
        assert!(h.store.exists("alpha").await.unwrap());
    }

    #[tokio::test]
    async fn test_get_distinguishes_missing_from_not_ready() {
        let h = harness(RegistryConfig::default());
        assert!(matches!(
            h.registry.get("ghost"),
            Err(RegistryError::NotFound(_))
        ));

        h.registry.start("alpha").await.unwrap();
        assert!(matches!(
            h.registry.get("alpha"),
            Err(RegistryError::NotReady { .. })
        ));
    }

    #[tokio::test]
    async fn test_terminate_wins_over_inflight_start() {
        let h = harness(RegistryConfig::default());
        h.factory.set_create_delay(Duration::from_millis(100));

        let registry = h.registry.clone();
        let starter = tokio::spawn(async move { registry.start("alpha").await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        h.registry.terminate("alpha").await;

        let status = starter.await.unwrap().unwrap();
        assert_eq!(status, SessionStatus::Terminated);
        assert!(matches!(
            h.registry.status("alpha"),
            Err(RegistryError::NotFound(_))
        ));
        assert!(h.registry.is_empty());
    }

    #[tokio::test]
    async fn test_disconnect_status_applies_without_restart() {
        let h = harness(RegistryConfig {
            auto_restart_max: 0,
            ..RegistryConfig::default()
        });
        h.registry.start("alpha").await.unwrap();
        h.factory
            .sender("alpha")
            .send(ClientEvent::Ready)
            .await
            .unwrap();
        eventually(|| h.registry.status("alpha").unwrap().status == SessionStatus::Connected)
            .await;

        h.factory
            .sender("alpha")
            .send(ClientEvent::Disconnected {
                reason: "NAVIGATION".into(),
            })
            .await
            .unwrap();
        eventually(|| h.registry.status("alpha").unwrap().status == SessionStatus::Disconnected)
            .await;
        assert_eq!(h.factory.created(), 1);
    }
}
