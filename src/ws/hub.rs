//! WebSocket Hub implementation
//!
//! Pushes every published snapshot to connected viewers. Records go out as
//! [`StorageItem`]s, so passwords never leave the server.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use dashmap::DashMap;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};

use crate::catalog::collect_items;
use crate::entity::{Cabinet, FileType, StorageItem};
use crate::state::AppState;
use crate::store::Snapshot;

/// Global WebSocket hub instance
pub static HUB: std::sync::LazyLock<Hub> = std::sync::LazyLock::new(Hub::new);

/// Record with its collection key
#[derive(Debug, Clone, Serialize)]
pub struct Keyed<T> {
    pub id: String,
    #[serde(flatten)]
    pub record: T,
}

/// Snapshot as seen by viewers
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicSnapshot {
    pub revision: u64,
    pub cabinets: Vec<Keyed<Cabinet>>,
    pub items: Vec<StorageItem>,
    pub file_types: Vec<Keyed<FileType>>,
}

impl From<&Snapshot> for PublicSnapshot {
    fn from(snapshot: &Snapshot) -> Self {
        Self {
            revision: snapshot.revision,
            cabinets: snapshot
                .cabinets
                .iter()
                .map(|(id, record)| Keyed {
                    id: id.clone(),
                    record: record.clone(),
                })
                .collect(),
            items: collect_items(snapshot),
            file_types: snapshot
                .file_types
                .iter()
                .map(|(id, record)| Keyed {
                    id: id.clone(),
                    record: record.clone(),
                })
                .collect(),
        }
    }
}

/// Server to client messages
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum WsMessage {
    #[serde(rename = "snapshot")]
    Snapshot(Box<PublicSnapshot>),
    #[serde(rename = "pong")]
    Pong,
}

/// Client to server messages
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "ping")]
    Ping,
}

impl WsMessage {
    fn snapshot(snapshot: &Snapshot) -> Self {
        WsMessage::Snapshot(Box::new(PublicSnapshot::from(snapshot)))
    }
}

/// WebSocket Hub
pub struct Hub {
    /// Connected clients by connection ID
    clients: DashMap<String, mpsc::UnboundedSender<WsMessage>>,
}

impl Hub {
    pub fn new() -> Self {
        Self {
            clients: DashMap::new(),
        }
    }

    /// Register a new client
    pub fn register(&self, conn_id: &str, tx: mpsc::UnboundedSender<WsMessage>) {
        self.clients.insert(conn_id.to_string(), tx);
        tracing::debug!(
            "WebSocket client {} registered, {} connected",
            conn_id,
            self.clients.len()
        );
    }

    /// Unregister a client
    pub fn unregister(&self, conn_id: &str) {
        self.clients.remove(conn_id);
        tracing::debug!("WebSocket client {} unregistered", conn_id);
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}

/// WebSocket upgrade handler
pub async fn serve_ws(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle a WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<WsMessage>();

    // Subscribe before reading the current snapshot so no revision is missed
    let mut snapshot_rx = state.store.subscribe();
    let current = state.store.snapshot().await;
    let _ = tx.send(WsMessage::snapshot(&current));

    HUB.register(&conn_id, tx.clone());

    // Spawn task to handle outgoing messages
    let send_task = tokio::spawn(async move {
        loop {
            let message = tokio::select! {
                Some(msg) = rx.recv() => msg,
                published = snapshot_rx.recv() => match published {
                    Ok(snapshot) => WsMessage::snapshot(&snapshot),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::debug!("WebSocket client lagged by {} snapshots", skipped);
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                else => break,
            };
            let text = serde_json::to_string(&message).unwrap_or_default();
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    // Handle incoming messages
    let tx_clone = tx.clone();
    let recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => {
                    if let Ok(ClientMessage::Ping) = serde_json::from_str::<ClientMessage>(&text) {
                        let _ = tx_clone.send(WsMessage::Pong);
                    }
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    // Wait for either task to complete
    tokio::select! {
        _ = send_task => {}
        _ = recv_task => {}
    }

    HUB.unregister(&conn_id);
}
