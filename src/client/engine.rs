//! Client adapter for the sidecar automation engine.
//!
//! One Unix-socket connection per session, newline-delimited JSON both ways.
//! Replies are correlated by request id; lifecycle events arrive unsolicited
//! and are forwarded onto the session's event channel.

use async_trait::async_trait;
use log::{debug, warn};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::UnixStream;
use tokio::sync::{mpsc, oneshot};

use super::protocol::{ClientCommand, EngineMessage, EngineRequest};
use super::{ClientError, ClientEvent, ClientFactory, ClientResult, MessagingClient};

type PendingMap = Arc<Mutex<HashMap<u64, oneshot::Sender<ClientResult<Value>>>>>;

/// Messaging client backed by an engine connection.
pub struct EngineClient {
    session_id: String,
    auth_dir: PathBuf,
    writer: tokio::sync::Mutex<OwnedWriteHalf>,
    pending: PendingMap,
    next_id: AtomicU64,
    closed: AtomicBool,
}

impl EngineClient {
    fn new(
        session_id: &str,
        auth_dir: PathBuf,
        writer: OwnedWriteHalf,
        pending: PendingMap,
    ) -> Self {
        Self {
            session_id: session_id.to_string(),
            auth_dir,
            writer: tokio::sync::Mutex::new(writer),
            pending,
            next_id: AtomicU64::new(1),
            closed: AtomicBool::new(false),
        }
    }

    /// Session id this client is bound to.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    async fn request(&self, req: &EngineRequest, id: u64) -> ClientResult<Value> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ClientError::Closed);
        }

        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
            pending.insert(id, tx);
        }

        let mut line = serde_json::to_string(req)
            .map_err(|e| ClientError::Protocol(format!("serializing request: {e}")))?;
        line.push('\n');

        let write_result = {
            let mut writer = self.writer.lock().await;
            writer.write_all(line.as_bytes()).await
        };
        if let Err(e) = write_result {
            let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
            pending.remove(&id);
            return Err(ClientError::Transport(e));
        }

        rx.await.unwrap_or(Err(ClientError::Closed))
    }

    fn alloc_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }
}

#[async_trait]
impl MessagingClient for EngineClient {
    async fn connect(&self) -> ClientResult<()> {
        let id = self.alloc_id();
        let req = EngineRequest::Open {
            id,
            session_id: self.session_id.clone(),
            auth_dir: self.auth_dir.display().to_string(),
        };
        self.request(&req, id).await?;
        debug!("engine accepted session {}", self.session_id);
        Ok(())
    }

    async fn execute(&self, command: ClientCommand) -> ClientResult<Value> {
        let id = self.alloc_id();
        let req = EngineRequest::Command { id, command };
        self.request(&req, id).await
    }

    async fn disconnect(&self) -> ClientResult<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let id = self.alloc_id();
        // Best effort: the engine side may already be gone.
        let req = EngineRequest::Close { id };
        let mut line = serde_json::to_string(&req)
            .map_err(|e| ClientError::Protocol(format!("serializing close: {e}")))?;
        line.push('\n');
        let mut writer = self.writer.lock().await;
        if let Err(e) = writer.write_all(line.as_bytes()).await {
            debug!(
                "close write failed for session {} (engine gone?): {}",
                self.session_id, e
            );
        }
        let _ = writer.shutdown().await;
        Ok(())
    }
}

/// Pump engine messages: resolve pending requests, forward events.
async fn read_loop(
    session_id: String,
    read_half: OwnedReadHalf,
    pending: PendingMap,
    events_tx: mpsc::Sender<ClientEvent>,
) {
    let mut lines = BufReader::new(read_half).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!("engine read error for session {}: {}", session_id, e);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let msg: EngineMessage = match serde_json::from_str(&line) {
            Ok(msg) => msg,
            Err(e) => {
                warn!("undecodable engine message for session {}: {}", session_id, e);
                continue;
            }
        };

        match msg {
            EngineMessage::Result { id, data } => {
                let tx = {
                    let mut pending = pending.lock().unwrap_or_else(|e| e.into_inner());
                    pending.remove(&id)
                };
                if let Some(tx) = tx {
                    let _ = tx.send(Ok(data));
                }
            }
            EngineMessage::Error { id: Some(id), message } => {
                let tx = {
                    let mut pending = pending.lock().unwrap_or_else(|e| e.into_inner());
                    pending.remove(&id)
                };
                if let Some(tx) = tx {
                    let _ = tx.send(Err(ClientError::Engine(message)));
                }
            }
            EngineMessage::Error { id: None, message } => {
                warn!("engine stream error for session {}: {}", session_id, message);
            }
            EngineMessage::Event { event } => {
                if events_tx.send(event).await.is_err() {
                    // Registry stopped listening; keep draining replies so
                    // in-flight requests still resolve.
                    debug!("event receiver dropped for session {}", session_id);
                }
            }
        }
    }

    // Stream is gone: fail whatever is still waiting.
    let waiters: Vec<_> = {
        let mut pending = pending.lock().unwrap_or_else(|e| e.into_inner());
        pending.drain().map(|(_, tx)| tx).collect()
    };
    for tx in waiters {
        let _ = tx.send(Err(ClientError::Closed));
    }
    debug!("engine connection closed for session {}", session_id);
}

/// Factory producing [`EngineClient`]s over a shared engine socket.
#[derive(Debug, Clone)]
pub struct EngineClientFactory {
    socket_path: PathBuf,
    auth_root: PathBuf,
}

impl EngineClientFactory {
    /// Create a factory connecting to the engine at `socket_path`, with
    /// per-session credential directories under `auth_root`.
    pub fn new(socket_path: impl Into<PathBuf>, auth_root: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
            auth_root: auth_root.into(),
        }
    }

    /// Path of the engine control socket.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }
}

#[async_trait]
impl ClientFactory for EngineClientFactory {
    async fn create(
        &self,
        session_id: &str,
    ) -> ClientResult<(Arc<dyn MessagingClient>, mpsc::Receiver<ClientEvent>)> {
        let stream = UnixStream::connect(&self.socket_path).await?;
        let (read_half, write_half) = stream.into_split();

        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let (events_tx, events_rx) = mpsc::channel(64);

        tokio::spawn(read_loop(
            session_id.to_string(),
            read_half,
            pending.clone(),
            events_tx,
        ));

        let client = EngineClient::new(
            session_id,
            self.auth_root.join(session_id),
            write_half,
            pending,
        );

        Ok((Arc::new(client), events_rx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_paths() {
        let factory = EngineClientFactory::new("/run/wagate/engine.sock", "/var/lib/wagate");
        assert_eq!(
            factory.socket_path(),
            Path::new("/run/wagate/engine.sock")
        );
    }

    #[tokio::test]
    async fn test_request_reply_over_socket_pair() {
        let (ours, theirs) = UnixStream::pair().unwrap();
        let (read_half, write_half) = ours.into_split();

        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let (events_tx, mut events_rx) = mpsc::channel(8);
        tokio::spawn(read_loop(
            "abcd".to_string(),
            read_half,
            pending.clone(),
            events_tx,
        ));

        let client = EngineClient::new(
            "abcd",
            PathBuf::from("/tmp/abcd"),
            write_half,
            pending,
        );

        // Fake engine: read the open request, ack it, then emit an event.
        let engine = tokio::spawn(async move {
            let (engine_read, mut engine_write) = theirs.into_split();
            let mut lines = BufReader::new(engine_read).lines();
            let line = lines.next_line().await.unwrap().unwrap();
            let req: EngineRequest = serde_json::from_str(&line).unwrap();
            let EngineRequest::Open { id, session_id, .. } = req else {
                panic!("expected open request");
            };
            assert_eq!(session_id, "abcd");

            let reply = format!(
                "{}\n",
                serde_json::to_string(&EngineMessage::Result {
                    id,
                    data: serde_json::json!({"accepted": true}),
                })
                .unwrap()
            );
            engine_write.write_all(reply.as_bytes()).await.unwrap();

            let event = format!(
                "{}\n",
                serde_json::to_string(&EngineMessage::Event {
                    event: ClientEvent::Qr {
                        payload: "2@qr-data".to_string(),
                    },
                })
                .unwrap()
            );
            engine_write.write_all(event.as_bytes()).await.unwrap();
        });

        client.connect().await.unwrap();
        let event = events_rx.recv().await.unwrap();
        assert_eq!(
            event,
            ClientEvent::Qr {
                payload: "2@qr-data".to_string()
            }
        );
        engine.await.unwrap();
    }

    #[tokio::test]
    async fn test_pending_requests_fail_when_engine_drops() {
        let (ours, theirs) = UnixStream::pair().unwrap();
        let (read_half, write_half) = ours.into_split();

        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let (events_tx, _events_rx) = mpsc::channel(8);
        tokio::spawn(read_loop(
            "abcd".to_string(),
            read_half,
            pending.clone(),
            events_tx,
        ));

        let client = EngineClient::new(
            "abcd",
            PathBuf::from("/tmp/abcd"),
            write_half,
            pending,
        );

        drop(theirs);
        let err = client.execute(ClientCommand::GetState).await.unwrap_err();
        assert!(matches!(err, ClientError::Closed | ClientError::Transport(_)));
    }
}
