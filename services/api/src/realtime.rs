//! Per-game-session fan-out of live updates.
//!
//! A subscriber is an unbounded channel; whatever transport sits on the
//! receiving end is outside this module. Delivery failures only ever affect
//! the failing connection.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use uuid::Uuid;

use potluck_core::serde::to_rfc3339_ms;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Snapshot,
    Update,
    DrinkAdded,
    Heartbeat,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BroadcastMessage {
    #[serde(rename = "type")]
    pub kind: MessageKind,
    #[serde(serialize_with = "to_rfc3339_ms")]
    pub timestamp: DateTime<Utc>,
    pub payload: serde_json::Value,
}

impl BroadcastMessage {
    pub fn new(kind: MessageKind, payload: serde_json::Value) -> Self {
        Self {
            kind,
            timestamp: Utc::now(),
            payload,
        }
    }

    pub fn heartbeat() -> Self {
        Self::new(MessageKind::Heartbeat, serde_json::Value::Null)
    }
}

/// One live subscriber.
#[derive(Debug, Clone)]
pub struct Connection {
    pub id: Uuid,
    sender: mpsc::UnboundedSender<BroadcastMessage>,
}

impl Connection {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<BroadcastMessage>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let connection = Self {
            id: Uuid::now_v7(),
            sender,
        };
        (connection, receiver)
    }

    /// `false` once the receiving end is gone.
    pub fn send(&self, message: BroadcastMessage) -> bool {
        self.sender.send(message).is_ok()
    }
}

/// Registry of subscribers keyed by game session id.
///
/// Sessions with no connections are removed from the map, so an unknown
/// session and an emptied one look the same.
#[derive(Clone, Default)]
pub struct ConnectionBroadcaster {
    sessions: Arc<Mutex<HashMap<Uuid, Vec<Connection>>>>,
}

impl ConnectionBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, session_id: Uuid, connection: Connection) {
        self.sessions
            .lock()
            .await
            .entry(session_id)
            .or_default()
            .push(connection);
    }

    pub async fn unregister(&self, session_id: Uuid, connection_id: Uuid) {
        let mut sessions = self.sessions.lock().await;
        let Some(conns) = sessions.get_mut(&session_id) else {
            return;
        };
        conns.retain(|c| c.id != connection_id);
        if conns.is_empty() {
            sessions.remove(&session_id);
        }
    }

    /// Deliver `message` to every subscriber of `session_id`. Returns the
    /// number of connections reached; closed connections are dropped.
    pub async fn broadcast(&self, session_id: Uuid, message: &BroadcastMessage) -> usize {
        let mut sessions = self.sessions.lock().await;
        let Some(conns) = sessions.get_mut(&session_id) else {
            return 0;
        };
        let before = conns.len();
        conns.retain(|c| c.send(message.clone()));
        let delivered = conns.len();
        if delivered < before {
            tracing::debug!(
                %session_id,
                dropped = before - delivered,
                "dropped closed subscribers"
            );
        }
        if conns.is_empty() {
            sessions.remove(&session_id);
        }
        delivered
    }

    /// Deliver `message` to every subscriber of every session.
    pub async fn broadcast_all(&self, message: &BroadcastMessage) -> usize {
        let mut sessions = self.sessions.lock().await;
        let mut delivered = 0;
        sessions.retain(|_, conns| {
            conns.retain(|c| c.send(message.clone()));
            delivered += conns.len();
            !conns.is_empty()
        });
        delivered
    }

    pub async fn active_counts(&self) -> HashMap<Uuid, usize> {
        self.sessions
            .lock()
            .await
            .iter()
            .map(|(id, conns)| (*id, conns.len()))
            .collect()
    }

    /// Fan out in the background so the caller never waits on delivery.
    pub fn schedule_broadcast(&self, session_id: Uuid, message: BroadcastMessage) -> JoinHandle<usize> {
        let this = self.clone();
        tokio::spawn(async move { this.broadcast(session_id, &message).await })
    }

    /// Send a heartbeat to every subscriber each `period`.
    pub fn spawn_heartbeat(&self, period: Duration) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let reached = this.broadcast_all(&BroadcastMessage::heartbeat()).await;
                tracing::trace!(reached, "heartbeat");
            }
        })
    }
}
