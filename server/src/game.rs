//! The lock-guarded server aggregate. Everything here is mutated only while
//! holding the single [`SharedGameState`] mutex.

use crate::bots;
use crate::client_manager::{ActionQueue, ClientManager};
use crate::events::{EventLog, GameEvent};
use crate::simulation::{self, StepSummary};
use crate::utils::{random_class, random_position};
use crate::world::World;
use log::debug;
use rand::rngs::StdRng;
use rand::SeedableRng;
use shared::{Action, PlayerId, WorldState, ACTION_QUEUE_CAPACITY};
use std::sync::Arc;
use tokio::sync::Mutex;

pub type SharedGameState = Arc<Mutex<GameState>>;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickSummary {
    pub tick: u64,
    pub queued_actions: usize,
    pub step: StepSummary,
}

pub struct GameState {
    pub world: World,
    pub events: EventLog,
    pub clients: ClientManager,
    pub actions: ActionQueue,
    pub tick: u64,
    rng: StdRng,
}

impl GameState {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Deterministic construction for tests.
    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            world: World::new(),
            events: EventLog::new(),
            clients: ClientManager::new(),
            actions: ActionQueue::new(ACTION_QUEUE_CAPACITY),
            tick: 0,
            rng,
        }
    }

    pub fn into_shared(self) -> SharedGameState {
        Arc::new(Mutex::new(self))
    }

    /// Creates a human player with a random class at a random spot.
    pub fn join_player(&mut self, now: u64) -> PlayerId {
        let class = random_class(&mut self.rng);
        let position = random_position(&mut self.rng);
        let player_id = self.world.create_player(class, position, now);

        self.events.record(
            now,
            GameEvent::PlayerJoined {
                player_id,
                class,
                position,
                bot: false,
            },
        );
        player_id
    }

    /// Removes a player from the world and the connection registry.
    /// Returns false if it was already gone.
    pub fn leave_player(&mut self, player_id: PlayerId, now: u64) -> bool {
        self.clients.remove_client(&player_id);
        if self.world.remove_player(player_id).is_none() {
            return false;
        }
        self.events.record(now, GameEvent::PlayerLeft { player_id });
        true
    }

    /// Routes an action from a connection into the world.
    pub fn apply_action(&mut self, player_id: PlayerId, action: Action) {
        match action {
            Action::Move { direction } => {
                if self.world.apply_direction(player_id, direction) {
                    self.actions.try_enqueue(player_id, action);
                }
            }
            Action::Attack { target } => {
                if let Some(stored) = self.world.set_attack_target(player_id, target) {
                    if stored != target {
                        debug!(
                            "Player {} requested invalid target {:?}, cleared",
                            player_id, target
                        );
                    }
                }
            }
        }
    }

    pub fn spawn_bots(&mut self, max_bots: usize, now: u64) -> Vec<PlayerId> {
        bots::spawn_bots(&mut self.world, &mut self.events, max_bots, now, &mut self.rng)
    }

    /// Advances the world by one tick of `dt` seconds.
    pub fn tick(&mut self, now: u64, dt: f32) -> TickSummary {
        let queued_actions = self.actions.drain().len();

        bots::update_bots(&mut self.world, now, &mut self.rng);
        let step = simulation::step(&mut self.world, &mut self.events, now, dt, &mut self.rng);
        self.tick += 1;

        TickSummary {
            tick: self.tick,
            queued_actions,
            step,
        }
    }

    pub fn snapshot(&self) -> WorldState {
        self.world.snapshot()
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}
