//! Client-side mirror of the server world.
//!
//! The client never simulates; it keeps the last snapshot it was sent and
//! turns local input into [`Action`]s.

use log::{debug, info};
use shared::{Action, InitData, Player, PlayerId, Vec2, WorldConsumer, WorldState};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Default)]
pub struct ClientGame {
    pub player_id: Option<PlayerId>,
    pub server_mode: bool,
    pub world: WorldState,
    pub states_received: u64,
}

impl ClientGame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn local_player(&self) -> Option<&Player> {
        self.player_id.and_then(|id| self.world.get(id))
    }

    fn local_player_mut(&mut self) -> Option<&mut Player> {
        let id = self.player_id?;
        self.world.players.get_mut(&id)
    }

    /// Returns a move action when `direction` differs from what the local
    /// player is currently doing, and records it locally so the same input
    /// is not resent every frame.
    pub fn movement_action(&mut self, direction: Vec2) -> Option<Action> {
        let player = self.local_player_mut()?;
        if player.moving_direction == direction {
            return None;
        }
        player.moving_direction = direction;
        Some(Action::Move { direction })
    }

    /// Picks the other player nearest to `cursor`, provided it lies within
    /// the local class's attack range of the cursor.
    pub fn target_near(&self, cursor: Vec2) -> Option<PlayerId> {
        let me = self.local_player()?;
        let range = me.class.stats().attack_range;

        self.world
            .players
            .values()
            .filter(|other| other.id != me.id)
            .map(|other| (other.id, cursor.distance(&other.position)))
            .filter(|(_, distance)| *distance <= range)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }

    /// Attack action for a click at `cursor`, if anyone is in reach.
    pub fn attack_action(&mut self, cursor: Vec2) -> Option<Action> {
        let target = self.target_near(cursor)?;
        if let Some(player) = self.local_player_mut() {
            player.target = Some(target);
        }
        debug!("Selected target {}", target);
        Some(Action::Attack {
            target: Some(target),
        })
    }

    /// Players in id order, for stable drawing.
    pub fn players_sorted(&self) -> Vec<&Player> {
        let mut players: Vec<&Player> = self.world.players.values().collect();
        players.sort_by_key(|player| player.id);
        players
    }
}

impl WorldConsumer for ClientGame {
    fn on_init(&mut self, init: InitData) {
        info!("Joined as player {}", init.player_id);
        self.player_id = Some(init.player_id);
        self.server_mode = init.server_mode;
    }

    fn on_state(&mut self, state: WorldState) {
        self.world = state;
        self.states_received += 1;
    }
}

/// [`ClientGame`] shared between the network thread and the window loop.
#[derive(Clone, Default)]
pub struct SharedGame(Arc<Mutex<ClientGame>>);

impl SharedGame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` with the game locked. `None` if the other side panicked
    /// while holding it.
    pub fn with<T>(&self, f: impl FnOnce(&mut ClientGame) -> T) -> Option<T> {
        self.0.lock().ok().map(|mut game| f(&mut *game))
    }
}

impl WorldConsumer for SharedGame {
    fn on_init(&mut self, init: InitData) {
        self.with(|game| game.on_init(init));
    }

    fn on_state(&mut self, state: WorldState) {
        self.with(|game| game.on_state(state));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::PlayerClass;

    fn game_with(players: &[(PlayerId, PlayerClass, Vec2)], me: PlayerId) -> ClientGame {
        let mut world = WorldState::new();
        for (id, class, position) in players {
            world
                .players
                .insert(*id, Player::new(*id, *class, *position, 0));
        }

        let mut game = ClientGame::new();
        game.on_init(InitData {
            player_id: me,
            server_mode: true,
        });
        game.on_state(world);
        game
    }

    #[test]
    fn test_init_then_state() {
        let game = game_with(&[(4, PlayerClass::Mage, Vec2::new(10.0, 10.0))], 4);
        assert_eq!(game.player_id, Some(4));
        assert_eq!(game.states_received, 1);
        assert_eq!(game.local_player().unwrap().class, PlayerClass::Mage);
    }

    #[test]
    fn test_move_sent_only_on_change() {
        let mut game = game_with(&[(1, PlayerClass::Warrior, Vec2::new(10.0, 10.0))], 1);
        let up = Vec2::new(0.0, -1.0);

        assert_eq!(game.movement_action(up), Some(Action::Move { direction: up }));
        assert_eq!(game.movement_action(up), None);
        assert!(game.movement_action(Vec2::ZERO).is_some());
    }

    #[test]
    fn test_no_actions_before_init() {
        let mut game = ClientGame::new();
        assert!(game.movement_action(Vec2::new(1.0, 0.0)).is_none());
        assert!(game.attack_action(Vec2::ZERO).is_none());
    }

    #[test]
    fn test_warrior_click_range() {
        let mut game = game_with(
            &[
                (1, PlayerClass::Warrior, Vec2::new(0.0, 0.0)),
                (2, PlayerClass::Mage, Vec2::new(300.0, 300.0)),
                (3, PlayerClass::Mage, Vec2::new(400.0, 300.0)),
            ],
            1,
        );

        assert_eq!(game.target_near(Vec2::new(340.0, 300.0)), Some(2));
        assert_eq!(game.target_near(Vec2::new(360.0, 300.0)), Some(3));
        assert_eq!(game.target_near(Vec2::new(300.0, 500.0)), None);

        let action = game.attack_action(Vec2::new(395.0, 305.0));
        assert_eq!(action, Some(Action::Attack { target: Some(3) }));
        assert_eq!(game.local_player().unwrap().target, Some(3));
    }

    #[test]
    fn test_mage_has_longer_reach_and_skips_self() {
        let game = game_with(
            &[
                (1, PlayerClass::Mage, Vec2::new(100.0, 100.0)),
                (2, PlayerClass::Warrior, Vec2::new(100.0, 250.0)),
            ],
            1,
        );

        assert_eq!(game.target_near(Vec2::new(100.0, 100.0)), Some(2));
        assert_eq!(game.target_near(Vec2::new(100.0, 460.0)), None);
    }

    #[test]
    fn test_players_sorted() {
        let game = game_with(
            &[
                (7, PlayerClass::Mage, Vec2::ZERO),
                (2, PlayerClass::Warrior, Vec2::ZERO),
                (5, PlayerClass::Mage, Vec2::ZERO),
            ],
            2,
        );
        let ids: Vec<_> = game.players_sorted().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2, 5, 7]);
    }

    #[test]
    fn test_shared_game_forwards_updates() {
        let mut shared = SharedGame::new();
        let view = shared.clone();

        shared.on_init(InitData {
            player_id: 9,
            server_mode: true,
        });
        shared.on_state(WorldState::new());

        assert_eq!(view.with(|game| game.player_id), Some(Some(9)));
        assert_eq!(view.with(|game| game.states_received), Some(1));
    }
}
