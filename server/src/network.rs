//! Server network layer: TCP accept loop, per-connection handlers, the fixed
//! rate tick loop and the state broadcast.

use crate::client_manager::{connection_handle, BoxedWriter, ConnectionHandle};
use crate::config::ServerConfig;
use crate::game::{GameState, SharedGameState, TickSummary};
use crate::utils::get_timestamp;
use log::{debug, error, info, warn};
use shared::{encode_message, CodecError, InitData, Message, MessageReader, PlayerId};
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncRead;
use tokio::net::TcpListener;
use tokio::time::{interval, sleep, Instant, MissedTickBehavior};

pub type ServerResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

/// Outcome of fanning one snapshot out to every connection.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Connections a write was started on
    pub sent: usize,
    /// Connections still busy with an earlier snapshot
    pub skipped: usize,
}

/// One encoded snapshot plus the connections it should go to.
struct PendingBroadcast {
    record: Arc<[u8]>,
    handles: Vec<(PlayerId, ConnectionHandle)>,
}

/// Authoritative game server bound to a TCP port
pub struct Server {
    listener: TcpListener,
    config: ServerConfig,
    state: SharedGameState,
}

impl Server {
    pub async fn bind(config: ServerConfig) -> ServerResult<Self> {
        let listener = TcpListener::bind(&config.addr).await?;
        info!("Server listening on {}", listener.local_addr()?);

        Ok(Server {
            listener,
            config,
            state: GameState::new().into_shared(),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn shared_state(&self) -> SharedGameState {
        Arc::clone(&self.state)
    }

    /// Starts the tick loop and bot spawner, then accepts connections
    /// until the task is dropped.
    pub async fn run(self) -> ServerResult<()> {
        tokio::spawn(run_tick_loop(
            Arc::clone(&self.state),
            self.config.tick_duration(),
        ));
        tokio::spawn(spawn_bots_after(
            Arc::clone(&self.state),
            self.config.bot_spawn_delay,
            self.config.max_bots,
        ));

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    if let Err(e) = stream.set_nodelay(true) {
                        debug!("Could not set TCP_NODELAY for {}: {}", addr, e);
                    }
                    let (reader, writer) = stream.into_split();
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        handle_connection(state, reader, Box::new(writer), addr).await;
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                    sleep(Duration::from_millis(10)).await;
                }
            }
        }
    }
}

/// Serves one client from registration to disconnect.
///
/// The player is created and sent `init` followed by a first `state`
/// before the connection joins the broadcast set, so no tick snapshot can
/// overtake the handshake.
pub async fn handle_connection<R>(
    state: SharedGameState,
    reader: R,
    writer: BoxedWriter,
    addr: SocketAddr,
) where
    R: AsyncRead + Unpin,
{
    let handle = connection_handle(writer);

    let (player_id, snapshot) = {
        let mut game = state.lock().await;
        let player_id = game.join_player(get_timestamp());
        (player_id, game.snapshot())
    };

    let handshake = {
        let mut writer = handle.lock().await;
        let init = Message::Init(InitData {
            player_id,
            server_mode: true,
        });
        match writer.send(&init).await {
            Ok(()) => writer.send(&Message::State(snapshot)).await,
            Err(e) => Err(e),
        }
    };
    if let Err(e) = handshake {
        warn!("Handshake with {} failed: {}", addr, e);
        state.lock().await.leave_player(player_id, get_timestamp());
        return;
    }

    state
        .lock()
        .await
        .clients
        .add_client(player_id, addr, Arc::clone(&handle));

    let mut reader = MessageReader::new(reader);
    loop {
        match reader.next_message().await {
            Ok(Message::Action(action)) => {
                debug!("Player {} sent {:?}", player_id, action);
                state.lock().await.apply_action(player_id, action);
            }
            Ok(other) => {
                warn!(
                    "Ignoring unexpected {} message from player {}",
                    other.kind(),
                    player_id
                );
            }
            Err(CodecError::Closed) => {
                debug!("Player {} closed the connection", player_id);
                break;
            }
            Err(e) if e.is_fatal() => {
                warn!("Dropping player {} ({}): {}", player_id, addr, e);
                break;
            }
            Err(e) => {
                warn!("Ignoring malformed message from player {}: {}", player_id, e);
            }
        }
    }

    state.lock().await.leave_player(player_id, get_timestamp());
}

/// Advances the world at a fixed rate and pushes a snapshot after every
/// tick. The snapshot is captured under the same lock as the tick.
pub async fn run_tick_loop(state: SharedGameState, tick_duration: Duration) {
    let mut ticker = interval(tick_duration);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    // First tick fires immediately
    ticker.tick().await;
    let mut last_update = Instant::now();

    loop {
        ticker.tick().await;

        let current_time = Instant::now();
        let delta_time = (current_time - last_update).as_secs_f32();
        last_update = current_time;

        match tick_and_broadcast(&state, get_timestamp(), delta_time).await {
            Ok((summary, _)) if summary.queued_actions > 0 => debug!(
                "Tick {}: {} queued actions, {} attacks",
                summary.tick, summary.queued_actions, summary.step.attacks
            ),
            Ok(_) => {}
            Err(e) => error!("Failed to encode world state: {}", e),
        }
    }
}

/// Runs one simulation tick and sends the resulting world to every
/// registered connection. The snapshot is encoded under the tick's lock;
/// the writes start after it is released.
pub async fn tick_and_broadcast(
    state: &SharedGameState,
    now: u64,
    delta_time: f32,
) -> Result<(TickSummary, BroadcastReport), CodecError> {
    let (summary, pending) = {
        let mut game = state.lock().await;
        let summary = game.tick(now, delta_time);
        (summary, prepare_broadcast(&game)?)
    };
    Ok((summary, pending.map(dispatch).unwrap_or_default()))
}

fn prepare_broadcast(game: &GameState) -> Result<Option<PendingBroadcast>, CodecError> {
    if game.clients.is_empty() {
        return Ok(None);
    }
    let record = encode_message(&Message::State(game.snapshot()))?;
    Ok(Some(PendingBroadcast {
        record: record.into(),
        handles: game.clients.get_client_handles(),
    }))
}

/// Starts one write per connection without waiting for any of them. A
/// connection whose previous write is still in flight skips this snapshot,
/// so a slow reader only ever falls behind itself.
fn dispatch(pending: PendingBroadcast) -> BroadcastReport {
    let mut report = BroadcastReport::default();

    for (player_id, handle) in pending.handles {
        let Ok(mut writer) = handle.try_lock_owned() else {
            debug!("Player {} is still receiving, skipping snapshot", player_id);
            report.skipped += 1;
            continue;
        };
        let record = Arc::clone(&pending.record);
        tokio::spawn(async move {
            if let Err(e) = writer.send_encoded(&record).await {
                warn!("Failed to send state to player {}: {}", player_id, e);
            }
        });
        report.sent += 1;
    }
    report
}

/// Waits out the startup delay, then fills the bot pool.
pub async fn spawn_bots_after(state: SharedGameState, delay: Duration, max_bots: usize) {
    sleep(delay).await;
    let spawned = state.lock().await.spawn_bots(max_bots, get_timestamp());
    info!("Spawned {} bots", spawned.len());
}
