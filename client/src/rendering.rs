//! Immediate-mode drawing of the mirrored world with macroquad.
//!
//! Nothing here keeps state between frames: every frame clears the screen
//! and redraws all players from the latest snapshot. Target lines go down
//! first so circles and labels stay readable on top of them.

use crate::game::ClientGame;
use macroquad::prelude::*;
use shared::{Player, PlayerClass, PLAYER_RADIUS};

const BACKGROUND: Color = Color::new(0.169, 0.169, 0.169, 1.0);
const TARGET_LINE: Color = Color::new(1.0, 1.0, 1.0, 0.5);
const TARGET_HALO: Color = Color::new(1.0, 0.0, 0.0, 0.25);

/// Fill colour for a class: warriors red, mages blue
pub fn class_color(class: PlayerClass) -> Color {
    match class {
        PlayerClass::Warrior => RED,
        PlayerClass::Mage => BLUE,
    }
}

/// Label drawn above a player, e.g. `Mage 73/100`.
pub fn health_label(player: &Player) -> String {
    format!("{} {}/100", player.class.name(), player.health as i32)
}

/// Draws the world into a window of a fixed logical size
///
/// The size is only used to place overlay text; world coordinates map to
/// screen pixels one to one.
pub struct Renderer {
    width: f32,
    height: f32,
}

impl Renderer {
    pub fn new(width: usize, height: usize) -> Self {
        Renderer {
            width: width as f32,
            height: height as f32,
        }
    }

    /// Draws one frame: target lines and halos, then every player, then
    /// the waiting message if no `init` has arrived yet.
    pub fn render(&self, game: &ClientGame) {
        clear_background(BACKGROUND);

        let players = game.players_sorted();
        for player in &players {
            self.draw_target(game, player);
        }
        for player in &players {
            let is_local_player = Some(player.id) == game.player_id;
            self.draw_player(player, is_local_player);
        }

        if game.player_id.is_none() {
            draw_text(
                "Waiting for server...",
                self.width / 2.0 - 90.0,
                self.height / 2.0,
                20.0,
                WHITE,
            );
        }
    }

    fn draw_player(&self, player: &Player, is_local_player: bool) {
        let (x, y) = (player.position.x, player.position.y);
        draw_circle(x, y, PLAYER_RADIUS, class_color(player.class));

        draw_text(&health_label(player), x - 20.0, y - 30.0, 16.0, WHITE);
        if is_local_player {
            draw_text("You", x - 10.0, y + 36.0, 16.0, WHITE);
        }
    }

    fn draw_target(&self, game: &ClientGame, player: &Player) {
        let Some(target) = player.target.and_then(|id| game.world.get(id)) else {
            return;
        };
        let (from, to) = (player.position, target.position);
        draw_line(from.x, from.y, to.x, to.y, 1.0, TARGET_LINE);
        draw_circle(to.x, to.y, PLAYER_RADIUS + 5.0, TARGET_HALO);
    }
}
