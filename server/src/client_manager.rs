//! Connection registry and pending-action queue for the server.
//!
//! The registry only associates a player id with the write half of its
//! connection; the player itself lives in the world store. Both structures
//! sit behind the same lock as the world.

use log::{debug, info};
use shared::{Action, MessageWriter, PlayerId};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::AsyncWrite;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::Mutex;

pub type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Shared handle to a connection's outbound stream. Guarded separately from
/// the world so a slow write never holds the world lock.
pub type ConnectionHandle = Arc<Mutex<MessageWriter<BoxedWriter>>>;

pub fn connection_handle(writer: BoxedWriter) -> ConnectionHandle {
    Arc::new(Mutex::new(MessageWriter::new(writer)))
}

/// A connected remote player
#[derive(Clone)]
pub struct Client {
    /// Player id assigned on connect
    pub id: PlayerId,
    /// Remote address, for logging
    pub addr: SocketAddr,
    pub connected_at: Instant,
    pub writer: ConnectionHandle,
}

impl Client {
    pub fn new(id: PlayerId, addr: SocketAddr, writer: ConnectionHandle) -> Self {
        Self {
            id,
            addr,
            connected_at: Instant::now(),
            writer,
        }
    }
}

/// All currently connected players and their outbound streams
#[derive(Default)]
pub struct ClientManager {
    clients: HashMap<PlayerId, Client>,
}

impl ClientManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_client(&mut self, id: PlayerId, addr: SocketAddr, writer: ConnectionHandle) {
        info!("Client {} connected from {}", id, addr);
        self.clients.insert(id, Client::new(id, addr, writer));
    }

    /// Returns true if the client was registered.
    pub fn remove_client(&mut self, id: &PlayerId) -> bool {
        match self.clients.remove(id) {
            Some(client) => {
                info!(
                    "Client {} ({}) removed after {:.1}s",
                    client.id,
                    client.addr,
                    client.connected_at.elapsed().as_secs_f32()
                );
                true
            }
            None => false,
        }
    }

    /// Snapshot of every (player id, outbound handle) pair, used so the
    /// broadcast can write without holding the world lock.
    pub fn get_client_handles(&self) -> Vec<(PlayerId, ConnectionHandle)> {
        self.clients
            .iter()
            .map(|(id, client)| (*id, Arc::clone(&client.writer)))
            .collect()
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.clients.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

/// Bounded, never-blocking queue of recent player actions.
///
/// When full, new actions are dropped. The simulator reads live player
/// state for movement, so a dropped entry loses nothing.
pub struct ActionQueue {
    tx: mpsc::Sender<(PlayerId, Action)>,
    rx: mpsc::Receiver<(PlayerId, Action)>,
}

impl ActionQueue {
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity);
        Self { tx, rx }
    }

    /// Returns false when the action was dropped.
    pub fn try_enqueue(&self, player_id: PlayerId, action: Action) -> bool {
        match self.tx.try_send((player_id, action)) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                debug!("Action queue full, dropping action from player {}", player_id);
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }

    /// Takes every pending action.
    pub fn drain(&mut self) -> Vec<(PlayerId, Action)> {
        let mut drained = Vec::new();
        while let Ok(entry) = self.rx.try_recv() {
            drained.push(entry);
        }
        drained
    }
}
