//! Test utilities and common setup.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use serde_json::{json, Value};
use tokio::sync::mpsc;

use wagate::api::{self, AppState};
use wagate::auth::AuthState;
use wagate::client::{ClientCommand, ClientEvent, ClientFactory, ClientResult, MessagingClient};
use wagate::db::Database;
use wagate::session::{RegistryConfig, SessionRegistry};
use wagate::store::LocalCredentialStore;
use wagate::user::{UserRepository, UserService};
use wagate::webhook::WebhookNotifier;

pub const TEST_API_KEY: &str = "test-api-key";
pub const TEST_JWT_SECRET: &str = "test-secret-for-integration-tests-minimum-32-chars";

/// Client stub that records executed commands and answers with a canned
/// payload.
pub struct MockClient {
    executed: Mutex<Vec<ClientCommand>>,
}

impl MockClient {
    fn new() -> Self {
        Self {
            executed: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl MessagingClient for MockClient {
    async fn connect(&self) -> ClientResult<()> {
        Ok(())
    }

    async fn execute(&self, command: ClientCommand) -> ClientResult<Value> {
        self.executed.lock().unwrap().push(command);
        Ok(json!({ "mock": true }))
    }

    async fn disconnect(&self) -> ClientResult<()> {
        Ok(())
    }
}

/// Factory that hands out [`MockClient`]s and keeps the event sender for
/// each session so tests can drive the lifecycle.
#[derive(Default)]
pub struct MockFactory {
    created: AtomicUsize,
    senders: Mutex<HashMap<String, mpsc::Sender<ClientEvent>>>,
}

impl MockFactory {
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn sender(&self, id: &str) -> mpsc::Sender<ClientEvent> {
        self.senders.lock().unwrap().get(id).cloned().unwrap()
    }
}

#[async_trait]
impl ClientFactory for MockFactory {
    async fn create(
        &self,
        session_id: &str,
    ) -> ClientResult<(Arc<dyn MessagingClient>, mpsc::Receiver<ClientEvent>)> {
        self.created.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::channel(16);
        self.senders
            .lock()
            .unwrap()
            .insert(session_id.to_string(), tx);
        Ok((Arc::new(MockClient::new()), rx))
    }
}

/// Everything an integration test needs: the router plus handles into the
/// fakes behind it.
pub struct TestApp {
    pub router: Router,
    pub registry: Arc<SessionRegistry>,
    pub factory: Arc<MockFactory>,
    _dir: tempfile::TempDir,
}

impl TestApp {
    /// Drive a session's event stream from the test.
    pub async fn emit(&self, session_id: &str, event: ClientEvent) {
        self.factory
            .sender(session_id)
            .send(event)
            .await
            .expect("event pump gone");
    }

    /// Poll until the condition holds or a second passes.
    pub async fn eventually(&self, mut check: impl FnMut() -> bool) {
        for _ in 0..200 {
            if check() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not met within 1s");
    }
}

/// Build an app with the standard test API key configured.
pub async fn test_app() -> TestApp {
    test_app_with_key(Some(TEST_API_KEY.to_string())).await
}

/// Build an app with a specific API key setting (`None` disables the check).
pub async fn test_app_with_key(api_key: Option<String>) -> TestApp {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(LocalCredentialStore::new(dir.path()));
    let factory = Arc::new(MockFactory::default());
    let registry = Arc::new(SessionRegistry::new(
        store,
        factory.clone(),
        WebhookNotifier::new(None),
        RegistryConfig::default(),
    ));

    let database = Database::in_memory().await.expect("in-memory database");
    let users = UserService::new(UserRepository::new(database.pool().clone()));
    let auth = AuthState::new(TEST_JWT_SECRET);

    let state = AppState {
        registry: registry.clone(),
        users,
        auth,
        api_key,
        idle_timeout: Duration::from_secs(1800),
        enable_local_callback: false,
        enable_swagger: true,
    };

    TestApp {
        router: api::create_router(state),
        registry,
        factory,
        _dir: dir,
    }
}
