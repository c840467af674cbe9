//! Message envelopes exchanged over a client connection.
//!
//! Every record on the wire is `{"message_type": ..., "data": ...}`. The
//! server sends `init` once and `state` every tick; clients only ever send
//! `action`.

use crate::{PlayerId, Vec2, WorldState};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "message_type", content = "data", rename_all = "lowercase")]
pub enum Message {
    Init(InitData),
    State(WorldState),
    Action(Action),
}

impl Message {
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Init(_) => "init",
            Message::State(_) => "state",
            Message::Action(_) => "action",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitData {
    pub player_id: PlayerId,
    pub server_mode: bool,
}

/// A player's request to change its own intent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ActionPayload", into = "ActionPayload")]
pub enum Action {
    Move { direction: Vec2 },
    /// `None` clears the current target.
    Attack { target: Option<PlayerId> },
}

/// Flat wire layout of an action. All fields are always written; readers
/// only look at the ones relevant to `action_type`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionPayload {
    pub action_type: String,
    #[serde(default)]
    pub target: Vec2,
    #[serde(default)]
    pub attack_target: PlayerId,
    #[serde(default)]
    pub direction: Vec2,
}

impl TryFrom<ActionPayload> for Action {
    type Error = String;

    fn try_from(payload: ActionPayload) -> Result<Self, Self::Error> {
        match payload.action_type.as_str() {
            "move" => {
                if !payload.direction.is_finite() {
                    return Err("move direction is not finite".to_string());
                }
                Ok(Action::Move {
                    direction: payload.direction.clamp_length(1.0),
                })
            }
            "attack" => Ok(Action::Attack {
                target: (payload.attack_target != 0).then_some(payload.attack_target),
            }),
            other => Err(format!("unknown action_type {:?}", other)),
        }
    }
}

impl From<Action> for ActionPayload {
    fn from(action: Action) -> Self {
        match action {
            Action::Move { direction } => ActionPayload {
                action_type: "move".to_string(),
                direction,
                ..Default::default()
            },
            Action::Attack { target } => ActionPayload {
                action_type: "attack".to_string(),
                attack_target: target.unwrap_or(0),
                ..Default::default()
            },
        }
    }
}
