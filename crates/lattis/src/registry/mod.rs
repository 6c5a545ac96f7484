//! Connection registry: live duplex connections and offline delivery queues.
//!
//! The registry maps a user identity to at most one live connection sink,
//! keeps per-identity metadata across reconnects, and parks outbound
//! frames in a bounded FIFO queue while no live sink exists. Queued
//! frames are replayed, in order, when the user reconnects.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use lattis_protocol::agent::AgentKind;
use lattis_protocol::wire::{Envelope, Features, Notice, ServerFrame};

mod sink;

pub use sink::{ConnectionSink, SinkError};

/// Upper bound on frames parked for one offline user. Oldest evicted first.
pub const MAX_QUEUED_FRAMES: usize = 100;

/// Errors surfaced by the registry. Transport-establishment failure is the
/// only one that propagates; everything else degrades into queuing.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("transport rejected handshake for {user_id}: {source}")]
    Handshake {
        user_id: String,
        #[source]
        source: SinkError,
    },
}

/// Per-identity connection bookkeeping, retained across reconnects.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionMeta {
    pub connected_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disconnected_at: Option<DateTime<Utc>>,
    pub messages_sent: u64,
    pub messages_received: u64,
    /// Conversation ids this user has engaged.
    pub conversations: Vec<String>,
}

impl ConnectionMeta {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            connected_at: now,
            last_activity: now,
            disconnected_at: None,
            messages_sent: 0,
            messages_received: 0,
            conversations: Vec::new(),
        }
    }

    fn touch(&mut self) {
        let now = Utc::now();
        // Activity never moves backwards.
        if now > self.last_activity {
            self.last_activity = now;
        }
    }
}

/// Registry-wide counters for the stats endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct RegistryStats {
    pub total_connections: u64,
    pub active_connections: usize,
    pub messages_sent: u64,
    pub messages_received: u64,
    pub queued_messages: usize,
    pub active_conversations: usize,
}

/// Per-user connection view for the info endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionInfo {
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ConnectionMeta>,
    pub queued_messages: usize,
    pub conversations: Vec<String>,
}

/// Registry of live connections plus offline queues.
///
/// Safe to call from any number of in-flight tasks; the maps shard their
/// locks internally and no operation holds a map guard across an await
/// on another user's entry.
pub struct ConnectionRegistry {
    /// User ID -> live connection. At most one per identity; connect
    /// overwrites, and each connection carries a generation so failure
    /// paths never tear down a replacement.
    live: DashMap<String, LiveConnection>,
    /// User ID -> metadata, retained after disconnect.
    meta: DashMap<String, ConnectionMeta>,
    /// User ID -> bounded outbound queue, present in all connection states.
    queues: DashMap<String, VecDeque<Envelope>>,
    next_generation: AtomicU64,
    total_connections: AtomicU64,
    messages_sent: AtomicU64,
    messages_received: AtomicU64,
    /// Pacing delay between queued-frame replays on reconnect.
    flush_delay: Duration,
}

struct LiveConnection {
    generation: u64,
    sink: Arc<dyn ConnectionSink>,
}

impl LiveConnection {
    fn parts(&self) -> (u64, Arc<dyn ConnectionSink>) {
        (self.generation, Arc::clone(&self.sink))
    }
}

impl ConnectionRegistry {
    pub fn new(flush_delay: Duration) -> Self {
        Self {
            live: DashMap::new(),
            meta: DashMap::new(),
            queues: DashMap::new(),
            next_generation: AtomicU64::new(0),
            total_connections: AtomicU64::new(0),
            messages_sent: AtomicU64::new(0),
            messages_received: AtomicU64::new(0),
            flush_delay,
        }
    }

    /// Register `sink` as the live connection for `user_id`, replacing any
    /// prior sink. Sends the welcome frame synchronously, then replays the
    /// offline queue. A rejected welcome write is re-raised; everything
    /// after that point degrades into requeuing.
    ///
    /// Returns the connection's generation, which pairs with
    /// [`disconnect_generation`](Self::disconnect_generation) so a slow
    /// transport teardown cannot drop a newer connection for the same
    /// identity.
    pub async fn connect(
        &self,
        user_id: &str,
        sink: Arc<dyn ConnectionSink>,
    ) -> Result<u64, RegistryError> {
        let now = Utc::now();
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        self.live.insert(
            user_id.to_string(),
            LiveConnection {
                generation,
                sink: Arc::clone(&sink),
            },
        );
        self.meta
            .entry(user_id.to_string())
            .and_modify(|m| {
                m.connected_at = now;
                m.disconnected_at = None;
                m.touch();
            })
            .or_insert_with(|| ConnectionMeta::new(now));

        let welcome = Envelope::new(ServerFrame::Connected {
            message: "Welcome to Lattis".to_string(),
            available_agents: AgentKind::ALL.to_vec(),
            features: Features::default(),
            user_id: user_id.to_string(),
        });
        if let Err(source) = self.write(user_id, sink.as_ref(), welcome).await {
            error!(user_id, error = %source, "welcome frame rejected");
            self.disconnect_generation(user_id, generation);
            return Err(RegistryError::Handshake {
                user_id: user_id.to_string(),
                source,
            });
        }
        // Counted only once the handshake has actually succeeded.
        self.total_connections.fetch_add(1, Ordering::Relaxed);
        info!(user_id, "connection registered");

        self.flush_queue(user_id, generation, sink.as_ref()).await;
        Ok(generation)
    }

    /// Drop the live sink for `user_id`. Metadata and the offline queue
    /// survive for reconnection.
    pub fn disconnect(&self, user_id: &str) {
        if self.live.remove(user_id).is_some() {
            self.stamp_disconnected(user_id);
        }
    }

    /// Drop the live sink for `user_id` only if it is still the connection
    /// identified by `generation`. Failure paths and transport teardown
    /// use this so they never remove a replacement connection.
    pub fn disconnect_generation(&self, user_id: &str, generation: u64) {
        let removed = self
            .live
            .remove_if(user_id, |_, conn| conn.generation == generation);
        if removed.is_some() {
            self.stamp_disconnected(user_id);
        }
    }

    fn stamp_disconnected(&self, user_id: &str) {
        if let Some(mut m) = self.meta.get_mut(user_id) {
            m.disconnected_at = Some(Utc::now());
        }
        info!(user_id, "connection dropped");
    }

    /// Deliver `envelope` to `user_id` if live, otherwise queue it.
    ///
    /// Returns whether the frame was delivered to a live connection. A
    /// stale write is treated as an implicit disconnect and the frame is
    /// queued instead of lost.
    pub async fn send(&self, user_id: &str, envelope: Envelope) -> bool {
        let live = self.live.get(user_id).map(|e| e.value().parts());
        if let Some((generation, sink)) = live {
            match self.write(user_id, sink.as_ref(), envelope.clone()).await {
                Ok(()) => return true,
                Err(err) => {
                    warn!(user_id, error = %err, "live write failed, queuing frame");
                    self.disconnect_generation(user_id, generation);
                }
            }
        }
        self.enqueue(user_id, envelope);
        false
    }

    /// Send `envelope` to every live connection not in `exclude`.
    ///
    /// Never blocks on a broken peer: failed identities are disconnected
    /// after the fan-out and the count of successful deliveries returned.
    pub async fn broadcast(&self, envelope: Envelope, exclude: &[&str]) -> usize {
        let targets: Vec<(String, u64, Arc<dyn ConnectionSink>)> = self
            .live
            .iter()
            .filter(|e| !exclude.contains(&e.key().as_str()))
            .map(|e| {
                let (generation, sink) = e.value().parts();
                (e.key().clone(), generation, sink)
            })
            .collect();

        let mut delivered = 0;
        let mut failed = Vec::new();
        for (user_id, generation, sink) in targets {
            let mut env = envelope.clone();
            env.broadcast = Some(true);
            match self.write(&user_id, sink.as_ref(), env).await {
                Ok(()) => delivered += 1,
                Err(err) => {
                    warn!(user_id, error = %err, "broadcast write failed");
                    failed.push((user_id, generation));
                }
            }
        }
        let failed_count = failed.len();
        for (user_id, generation) in failed {
            self.disconnect_generation(&user_id, generation);
        }
        info!(delivered, failed = failed_count, "broadcast complete");
        delivered
    }

    /// Close and drop every live connection idle longer than `max_idle`.
    /// Close failures are swallowed; disconnection always proceeds.
    pub async fn cleanup_idle(&self, max_idle: chrono::Duration) -> usize {
        let cutoff = Utc::now() - max_idle;
        let idle: Vec<(String, u64, Arc<dyn ConnectionSink>)> = self
            .live
            .iter()
            .filter(|e| {
                self.meta
                    .get(e.key())
                    .map(|m| m.last_activity < cutoff)
                    .unwrap_or(false)
            })
            .map(|e| {
                let (generation, sink) = e.value().parts();
                (e.key().clone(), generation, sink)
            })
            .collect();

        let count = idle.len();
        for (user_id, generation, sink) in idle {
            if let Err(err) = sink.close().await {
                debug!(user_id, error = %err, "close failed during idle cleanup");
            }
            self.disconnect_generation(&user_id, generation);
        }
        if count > 0 {
            info!(count, "cleaned up idle connections");
        }
        count
    }

    /// Close every live connection. Composition-root shutdown hook.
    pub async fn shutdown(&self) {
        let users: Vec<String> = self.live.iter().map(|e| e.key().clone()).collect();
        for user_id in &users {
            let sink = self.live.get(user_id).map(|e| Arc::clone(&e.value().sink));
            if let Some(sink) = sink {
                let _ = sink.close().await;
            }
            self.disconnect(user_id);
        }
        if !users.is_empty() {
            info!(count = users.len(), "closed all connections on shutdown");
        }
    }

    /// Record an inbound frame from `user_id`.
    pub fn note_received(&self, user_id: &str) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
        if let Some(mut m) = self.meta.get_mut(user_id) {
            m.messages_received += 1;
            m.touch();
        }
    }

    /// Remember that `user_id` participates in `conversation_id`.
    pub fn track_conversation(&self, user_id: &str, conversation_id: &str) {
        let mut m = self
            .meta
            .entry(user_id.to_string())
            .or_insert_with(|| ConnectionMeta::new(Utc::now()));
        if !m.conversations.iter().any(|c| c == conversation_id) {
            m.conversations.push(conversation_id.to_string());
        }
    }

    pub fn untrack_conversation(&self, user_id: &str, conversation_id: &str) {
        if let Some(mut m) = self.meta.get_mut(user_id) {
            m.conversations.retain(|c| c != conversation_id);
        }
    }

    /// Typing indicator convenience wrapper.
    pub async fn send_typing(&self, user_id: &str, agent: AgentKind, active: bool) -> bool {
        self.send(user_id, ServerFrame::Typing { agent, active }.into())
            .await
    }

    /// System-notification convenience wrapper.
    pub async fn notify(&self, user_id: &str, notice: Notice) -> bool {
        self.send(user_id, ServerFrame::SystemNotification { notice }.into())
            .await
    }

    pub fn is_connected(&self, user_id: &str) -> bool {
        self.live.contains_key(user_id)
    }

    pub fn queue_len(&self, user_id: &str) -> usize {
        self.queues.get(user_id).map(|q| q.len()).unwrap_or(0)
    }

    pub fn active_connections(&self) -> usize {
        self.live.len()
    }

    pub fn stats(&self) -> RegistryStats {
        let queued_messages = self.queues.iter().map(|q| q.value().len()).sum();
        let active_conversations = self
            .meta
            .iter()
            .flat_map(|m| m.value().conversations.clone())
            .collect::<HashSet<_>>()
            .len();
        RegistryStats {
            total_connections: self.total_connections.load(Ordering::Relaxed),
            active_connections: self.live.len(),
            messages_sent: self.messages_sent.load(Ordering::Relaxed),
            messages_received: self.messages_received.load(Ordering::Relaxed),
            queued_messages,
            active_conversations,
        }
    }

    pub fn connection_info(&self, user_id: &str) -> ConnectionInfo {
        let metadata = self.meta.get(user_id).map(|m| m.clone());
        let conversations = metadata
            .as_ref()
            .map(|m| m.conversations.clone())
            .unwrap_or_default();
        ConnectionInfo {
            connected: self.is_connected(user_id),
            metadata,
            queued_messages: self.queue_len(user_id),
            conversations,
        }
    }

    /// Stamp a delivery timestamp, serialize, and write one frame.
    async fn write(
        &self,
        user_id: &str,
        sink: &dyn ConnectionSink,
        mut envelope: Envelope,
    ) -> Result<(), SinkError> {
        envelope.timestamp = Some(Utc::now());
        let text = serde_json::to_string(&envelope)
            .map_err(|e| SinkError::Transport(e.to_string()))?;
        sink.send(text).await?;
        self.messages_sent.fetch_add(1, Ordering::Relaxed);
        if let Some(mut m) = self.meta.get_mut(user_id) {
            m.messages_sent += 1;
            m.touch();
        }
        Ok(())
    }

    /// Park a frame in the bounded offline queue, evicting oldest first.
    fn enqueue(&self, user_id: &str, mut envelope: Envelope) {
        envelope.queued_at = Some(Utc::now());
        let mut queue = self.queues.entry(user_id.to_string()).or_default();
        queue.push_back(envelope);
        while queue.len() > MAX_QUEUED_FRAMES {
            queue.pop_front();
        }
        debug!(user_id, depth = queue.len(), "frame queued");
    }

    /// Replay the offline queue after a successful connect: one notice
    /// carrying the queued count, then every frame in original order with
    /// a pacing delay. A failed replay requeues the remainder in order.
    async fn flush_queue(&self, user_id: &str, generation: u64, sink: &dyn ConnectionSink) {
        let queued: VecDeque<Envelope> = match self.queues.get_mut(user_id) {
            Some(mut q) if !q.is_empty() => q.drain(..).collect(),
            _ => return,
        };
        let count = queued.len();

        let notice = Envelope::new(ServerFrame::SystemNotification {
            notice: Notice {
                kind: "queued_messages".to_string(),
                count: Some(count),
                message: format!(
                    "You have {count} unread message{}",
                    if count == 1 { "" } else { "s" }
                ),
            },
        });
        if self.write(user_id, sink, notice).await.is_err() {
            for env in queued {
                self.enqueue(user_id, env);
            }
            self.disconnect_generation(user_id, generation);
            return;
        }

        let mut pending = queued;
        while let Some(mut env) = pending.pop_front() {
            env.delivered_from_queue = Some(true);
            if self.write(user_id, sink, env.clone()).await.is_err() {
                warn!(user_id, "queue replay interrupted, requeuing remainder");
                self.enqueue(user_id, env);
                for rest in pending {
                    self.enqueue(user_id, rest);
                }
                self.disconnect_generation(user_id, generation);
                return;
            }
            // Pace replays so a fresh transport is not overwhelmed.
            if !self.flush_delay.is_zero() {
                tokio::time::sleep(self.flush_delay).await;
            }
        }
        info!(user_id, count, "delivered queued frames");
    }

    #[cfg(test)]
    fn queued_frames(&self, user_id: &str) -> Vec<Envelope> {
        self.queues
            .get(user_id)
            .map(|q| q.iter().cloned().collect())
            .unwrap_or_default()
    }
}
