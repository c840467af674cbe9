//! Authoritative world store: every player entity, the bot descriptors and
//! the id allocator.
//!
//! The store owns no lock of its own. It lives inside the game state and is
//! only ever touched while that state's mutex is held, so every method here
//! can assume exclusive access.

use shared::{Player, PlayerClass, PlayerId, Vec2, WorldState};
use std::collections::HashMap;

/// Server-side bookkeeping for a player driven by the bot controller.
#[derive(Debug, Clone, PartialEq)]
pub struct Bot {
    pub player_id: PlayerId,
    /// Milliseconds since the UNIX epoch.
    pub last_direction_change: u64,
}

/// Every live player keyed by id, plus the subset driven by bots
///
/// A bot always has a matching entry in `players`; removing the player
/// removes the bot descriptor with it.
#[derive(Debug)]
pub struct World {
    players: HashMap<PlayerId, Player>,
    bots: HashMap<PlayerId, Bot>,
    next_player_id: PlayerId,
}

impl World {
    /// Creates an empty world whose first player will get id 1
    pub fn new() -> Self {
        Self {
            players: HashMap::new(),
            bots: HashMap::new(),
            next_player_id: 1,
        }
    }

    /// Adds a player and returns its id. Ids start at 1 and are never
    /// handed out twice, even after the holder is removed.
    pub fn create_player(&mut self, class: PlayerClass, position: Vec2, now: u64) -> PlayerId {
        let id = self.next_player_id;
        self.next_player_id += 1;

        self.players
            .insert(id, Player::new(id, class, position.clamp_to_field(), now));
        id
    }

    /// Adds a player controlled by the bot controller.
    pub fn create_bot(&mut self, class: PlayerClass, position: Vec2, now: u64) -> PlayerId {
        let id = self.create_player(class, position, now);
        self.bots.insert(
            id,
            Bot {
                player_id: id,
                last_direction_change: now,
            },
        );
        id
    }

    /// Removes a player. Targets that pointed at it are cleared so no
    /// player is left aiming at a missing id.
    pub fn remove_player(&mut self, id: PlayerId) -> Option<Player> {
        let removed = self.players.remove(&id)?;
        self.bots.remove(&id);

        for player in self.players.values_mut() {
            if player.target == Some(id) {
                player.target = None;
            }
        }
        Some(removed)
    }

    /// Sets the moving direction. Returns false if the player is unknown.
    pub fn apply_direction(&mut self, id: PlayerId, direction: Vec2) -> bool {
        match self.players.get_mut(&id) {
            Some(player) => {
                player.moving_direction = direction;
                true
            }
            None => false,
        }
    }

    /// Sets or clears the attack target. A target that does not exist, or
    /// the player itself, is stored as no target. Returns the stored value,
    /// or `None` if the player is unknown.
    pub fn set_attack_target(
        &mut self,
        id: PlayerId,
        target: Option<PlayerId>,
    ) -> Option<Option<PlayerId>> {
        let target = target.filter(|t| *t != id && self.players.contains_key(t));
        let player = self.players.get_mut(&id)?;
        player.target = target;
        Some(target)
    }

    /// Point-in-time copy of every player.
    pub fn snapshot(&self) -> WorldState {
        WorldState {
            players: self.players.clone(),
        }
    }

    /// Looks up a player by id
    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    /// Mutable lookup, used by the simulator to apply attacks and respawns
    pub fn get_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(&id)
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.players.contains_key(&id)
    }

    /// Iterates over every player in no particular order
    ///
    /// Passes that must be deterministic should walk [`World::player_ids`]
    /// instead.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    /// Mutable iteration in no particular order, for passes where order
    /// cannot change the outcome (movement, splash).
    pub fn players_mut(&mut self) -> impl Iterator<Item = &mut Player> {
        self.players.values_mut()
    }

    /// Player ids in ascending order, for deterministic passes.
    pub fn player_ids(&self) -> Vec<PlayerId> {
        let mut ids: Vec<PlayerId> = self.players.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Number of players, bots included
    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// True if the id belongs to a server-controlled player
    pub fn is_bot(&self, id: PlayerId) -> bool {
        self.bots.contains_key(&id)
    }

    pub fn bot_count(&self) -> usize {
        self.bots.len()
    }

    /// Bot ids in ascending order
    pub fn bot_ids(&self) -> Vec<PlayerId> {
        let mut ids: Vec<PlayerId> = self.bots.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Steering bookkeeping for a bot, `None` for human players
    pub fn bot(&self, id: PlayerId) -> Option<&Bot> {
        self.bots.get(&id)
    }

    pub fn bot_mut(&mut self, id: PlayerId) -> Option<&mut Bot> {
        self.bots.get_mut(&id)
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
