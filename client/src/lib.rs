//! # Game Client Library
//!
//! Thin client for the arena. It mirrors whatever world the server last
//! sent, draws it, and turns keyboard and mouse input into actions. There
//! is no local simulation or prediction; the server is the only source of
//! truth.
//!
//! ## Threads
//!
//! The window loop must own the main thread, so networking runs on a tokio
//! runtime in a background thread. The two sides share a [`game::SharedGame`]
//! for snapshots, and actions flow from the window to the network through an
//! unbounded channel.
//!
//! ## Module Organization
//!
//! - `game`: local mirror of the world, move/attack action selection
//! - `input`: WASD and mouse sampling
//! - `network`: dialing, receive loop, send loop
//! - `rendering`: circles, labels and target lines
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::ClientConfig;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     client::launch(ClientConfig::default())
//! }
//! ```

pub mod game;
pub mod input;
pub mod network;
pub mod rendering;

use game::SharedGame;
use log::{error, info, warn};
use macroquad::prelude::{next_frame, Conf};
use network::ClientResult;
use rendering::Renderer;
use shared::{Action, FIELD_HEIGHT, FIELD_WIDTH};
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Server address, `host:port`
    pub server_addr: String,
    pub width: usize,
    pub height: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_addr: "127.0.0.1:8080".to_string(),
            width: FIELD_WIDTH as usize,
            height: FIELD_HEIGHT as usize,
        }
    }
}

fn window_conf(config: &ClientConfig) -> Conf {
    Conf {
        window_title: "Meat Grinder".to_owned(),
        window_width: config.width as i32,
        window_height: config.height as i32,
        window_resizable: false,
        ..Default::default()
    }
}

/// Dials the server, starts networking in the background and runs the
/// window on the calling thread until it is closed or the server goes away.
pub fn launch(config: ClientConfig) -> ClientResult<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    let connection = runtime.block_on(network::connect(&config.server_addr))?;

    let game = SharedGame::new();
    let (action_tx, action_rx) = mpsc::unbounded_channel();

    let mut consumer = game.clone();
    std::thread::spawn(move || {
        runtime.block_on(async move {
            let network::Connection { mut reader, writer } = connection;
            let sender = tokio::spawn(network::send_loop(writer, action_rx));

            if let Err(e) = network::receive_loop(&mut reader, &mut consumer).await {
                error!("Lost connection to server: {}", e);
            }
            sender.abort();
        });
    });

    let renderer = Renderer::new(config.width, config.height);
    macroquad::Window::from_config(window_conf(&config), run_window(game, action_tx, renderer));
    Ok(())
}

async fn run_window(game: SharedGame, actions: mpsc::UnboundedSender<Action>, renderer: Renderer) {
    info!("Controls: WASD to move, left click to attack");

    loop {
        let frame = input::capture();
        let pending = game
            .with(|game| {
                let mut pending = Vec::new();
                pending.extend(game.movement_action(frame.direction));
                if let Some(cursor) = frame.click {
                    pending.extend(game.attack_action(cursor));
                }
                pending
            })
            .unwrap_or_default();

        for action in pending {
            if actions.send(action).is_err() {
                warn!("Connection closed, exiting");
                return;
            }
        }

        game.with(|game| renderer.render(game));
        next_frame().await;
    }
}
