//! Connection bookkeeping and grace-period timers.
//!
//! Socket identity is separate from player identity: a connection id is
//! minted per websocket, while a player id survives reconnects. The maps
//! here tie the two together so intent handlers can resolve "who sent
//! this" and "where do I deliver that" without touching room state.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::Message;
use dashmap::DashMap;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::debug;
use uuid::Uuid;

/// How long a disconnected player keeps their seat before removal.
pub const DISCONNECT_GRACE: Duration = Duration::from_secs(2 * 60);
/// How long an empty room survives before deletion.
pub const ROOM_GRACE: Duration = Duration::from_secs(5 * 60);

/// Which room a connection is bound to, and as which player.
#[derive(Debug, Clone)]
pub struct Binding {
    /// Upper-cased room code.
    pub room_code: String,
    /// Stable player identity inside that room.
    pub player_id: Uuid,
}

/// Live connection registry.
#[derive(Debug, Default)]
pub struct ConnectionMap {
    /// Outbound handles, keyed by connection id.
    senders: DashMap<Uuid, UnboundedSender<Message>>,
    /// Connection id → room binding.
    bindings: DashMap<Uuid, Binding>,
    /// Player id → connection id, for delivery and rebinding.
    players: DashMap<Uuid, Uuid>,
}

impl ConnectionMap {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a freshly accepted socket's outbound handle.
    pub fn register(&self, connection_id: Uuid, tx: UnboundedSender<Message>) {
        self.senders.insert(connection_id, tx);
    }

    /// Drop a socket's outbound handle and its binding.
    ///
    /// Returns the binding that was in place, if any, so the caller can run
    /// disconnect fallout against the room. The player → connection entry is
    /// only cleared when it still points at this connection; a rebind from a
    /// reconnect must not be clobbered by the old socket's teardown.
    pub fn unregister(&self, connection_id: Uuid) -> Option<Binding> {
        self.senders.remove(&connection_id);
        let binding = self.bindings.remove(&connection_id).map(|(_, b)| b)?;
        self.players
            .remove_if(&binding.player_id, |_, conn| *conn == connection_id);
        Some(binding)
    }

    /// Bind a connection to a room seat, replacing any previous binding for
    /// that player.
    pub fn bind(&self, connection_id: Uuid, room_code: &str, player_id: Uuid) {
        self.bindings.insert(
            connection_id,
            Binding {
                room_code: room_code.to_owned(),
                player_id,
            },
        );
        if let Some(old) = self.players.insert(player_id, connection_id)
            && old != connection_id
        {
            self.bindings.remove(&old);
        }
    }

    /// Resolve the binding of a connection.
    pub fn binding(&self, connection_id: Uuid) -> Option<Binding> {
        self.bindings.get(&connection_id).map(|b| b.value().clone())
    }

    /// Outbound handle for a connection.
    pub fn sender(&self, connection_id: Uuid) -> Option<UnboundedSender<Message>> {
        self.senders.get(&connection_id).map(|tx| tx.value().clone())
    }

    /// Outbound handle for a player's current connection.
    pub fn player_sender(&self, player_id: Uuid) -> Option<UnboundedSender<Message>> {
        let conn = *self.players.get(&player_id)?.value();
        self.sender(conn)
    }
}

/// Keys identifying pending grace-period timers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TimerKey {
    /// Removal of a disconnected player.
    PlayerRemoval(Uuid),
    /// Deletion of an empty room, keyed by upper-cased code.
    RoomDeletion(String),
}

/// Cancellable one-shot timers keyed by what they are about to do.
///
/// Scheduling under an existing key replaces the pending timer. A timer
/// that fires runs its action exactly once; actions are expected to
/// re-check state under the room lock, so a fire that raced a cancel is
/// a no-op.
#[derive(Debug, Default)]
pub struct TimerRegistry {
    timers: Arc<DashMap<TimerKey, JoinHandle<()>>>,
}

impl TimerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `action` to run after `delay`, replacing any pending timer
    /// under the same key.
    pub fn schedule<F>(&self, key: TimerKey, delay: Duration, action: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let timers = self.timers.clone();
        let task_key = key.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            action.await;
            timers.remove(&task_key);
        });

        if let Some(previous) = self.timers.insert(key, handle) {
            previous.abort();
        }
    }

    /// Cancel a pending timer. Idempotent; cancelling an absent or already
    /// fired timer does nothing.
    pub fn cancel(&self, key: &TimerKey) {
        if let Some((_, handle)) = self.timers.remove(key) {
            handle.abort();
            debug!(?key, "cancelled timer");
        }
    }

    /// Number of timers still pending.
    pub fn pending(&self) -> usize {
        self.timers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::mpsc;

    #[tokio::test(start_paused = true)]
    async fn scheduled_timer_fires_after_delay() {
        let timers = TimerRegistry::new();
        let fired = Arc::new(AtomicUsize::new(0));

        let flag = fired.clone();
        timers.schedule(
            TimerKey::RoomDeletion("MANGO10".into()),
            Duration::from_secs(300),
            async move {
                flag.fetch_add(1, Ordering::SeqCst);
            },
        );

        tokio::time::sleep(Duration::from_secs(299)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(timers.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_timer_never_fires() {
        let timers = TimerRegistry::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let key = TimerKey::PlayerRemoval(Uuid::new_v4());

        let flag = fired.clone();
        timers.schedule(key.clone(), Duration::from_secs(120), async move {
            flag.fetch_add(1, Ordering::SeqCst);
        });
        timers.cancel(&key);
        timers.cancel(&key);

        tokio::time::sleep(Duration::from_secs(200)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(timers.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn rescheduling_replaces_the_pending_timer() {
        let timers = TimerRegistry::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let key = TimerKey::PlayerRemoval(Uuid::new_v4());

        let first = fired.clone();
        timers.schedule(key.clone(), Duration::from_secs(10), async move {
            first.fetch_add(1, Ordering::SeqCst);
        });
        let second = fired.clone();
        timers.schedule(key, Duration::from_secs(60), async move {
            second.fetch_add(10, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn unregister_returns_binding_once() {
        let connections = ConnectionMap::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        let conn = Uuid::new_v4();
        let player = Uuid::new_v4();

        connections.register(conn, tx);
        connections.bind(conn, "TIGER42", player);

        let binding = connections.unregister(conn).unwrap();
        assert_eq!(binding.room_code, "TIGER42");
        assert_eq!(binding.player_id, player);
        assert!(connections.unregister(conn).is_none());
        assert!(connections.player_sender(player).is_none());
    }

    #[test]
    fn rebinding_a_player_evicts_the_stale_connection() {
        let connections = ConnectionMap::new();
        let (tx_old, _rx_old) = mpsc::unbounded_channel();
        let (tx_new, _rx_new) = mpsc::unbounded_channel();
        let old_conn = Uuid::new_v4();
        let new_conn = Uuid::new_v4();
        let player = Uuid::new_v4();

        connections.register(old_conn, tx_old);
        connections.bind(old_conn, "TIGER42", player);
        connections.register(new_conn, tx_new);
        connections.bind(new_conn, "TIGER42", player);

        assert!(connections.binding(old_conn).is_none());
        assert_eq!(connections.binding(new_conn).unwrap().player_id, player);

        // The old socket closing must not unbind the new one.
        assert!(connections.unregister(old_conn).is_none());
        assert!(connections.player_sender(player).is_some());
    }
}
