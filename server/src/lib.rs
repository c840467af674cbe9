//! # Game Server Library
//!
//! Authoritative server for the arena. It owns the only mutable copy of the
//! world, applies player actions as they arrive, advances the simulation at
//! a fixed tick rate and streams a full snapshot to every client after each
//! tick.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Simulation
//! Movement, attack cooldowns, damage and respawns are all decided here.
//! Clients only ever send intent (a move direction or an attack target) and
//! draw whatever the server last told them.
//!
//! ### Connection Handling
//! Each TCP connection gets its own task. On connect a player with a random
//! class is created and the client receives `init` followed by a first
//! `state`; on disconnect the player is removed and every target pointing at
//! it is cleared.
//!
//! ### Bots
//! A small pool of server-controlled players is spawned shortly after
//! startup. They wander in a random direction and attack whoever is nearest.
//!
//! ## Architecture Design
//!
//! ### Single Lock
//! World, event log, connection registry and action queue live together in
//! [`game::GameState`] behind one `tokio::sync::Mutex`. Handlers lock it only
//! to apply an action; the tick loop locks it once per tick to simulate and
//! capture the snapshot.
//!
//! ### Non-blocking Broadcast
//! The snapshot is encoded once per tick under the lock, then written to
//! each connection with the lock released. A connection still busy with the
//! previous snapshot is skipped for that tick.
//!
//! ## Module Organization
//!
//! - `world`: player store, id allocation and bot descriptors
//! - `events`: append-only log of domain events
//! - `combat`: damage, falloff, resistances and splash
//! - `bots`: bot spawning and steering
//! - `simulation`: one tick of movement, attacks and respawns
//! - `game`: the lock-guarded aggregate
//! - `client_manager`: connection registry and bounded action queue
//! - `network`: accept loop, handlers, tick loop and broadcast
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     server::run(ServerConfig::default()).await
//! }
//! ```

pub mod bots;
pub mod client_manager;
pub mod combat;
pub mod config;
pub mod events;
pub mod game;
pub mod network;
pub mod simulation;
pub mod utils;
pub mod world;

use config::ServerConfig;
use network::{Server, ServerResult};

/// Binds the listener and serves forever.
pub async fn run(config: ServerConfig) -> ServerResult<()> {
    Server::bind(config).await?.run().await
}
