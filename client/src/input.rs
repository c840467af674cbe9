//! Keyboard and mouse sampling.

use macroquad::prelude::*;
use shared::Vec2 as WorldVec;

/// What the player asked for this frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameInput {
    /// Unit-length (or zero) movement direction
    pub direction: WorldVec,
    /// Cursor position if the left button went down this frame
    pub click: Option<WorldVec>,
}

/// Turns held movement keys into a normalised direction. Opposite keys
/// cancel out.
pub fn direction_from_keys(up: bool, down: bool, left: bool, right: bool) -> WorldVec {
    let mut direction = WorldVec::ZERO;
    if up {
        direction.y -= 1.0;
    }
    if down {
        direction.y += 1.0;
    }
    if left {
        direction.x -= 1.0;
    }
    if right {
        direction.x += 1.0;
    }
    direction.normalize()
}

/// Samples WASD and the left mouse button.
pub fn capture() -> FrameInput {
    let direction = direction_from_keys(
        is_key_down(KeyCode::W),
        is_key_down(KeyCode::S),
        is_key_down(KeyCode::A),
        is_key_down(KeyCode::D),
    );

    let click = is_mouse_button_pressed(MouseButton::Left).then(|| {
        let (x, y) = mouse_position();
        WorldVec::new(x, y)
    });

    FrameInput { direction, click }
}
