//! Data model, tuning constants and wire protocol shared by the server and
//! client roles.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub mod codec;
pub mod protocol;

pub use codec::{encode_message, CodecError, MessageReader, MessageWriter};
pub use protocol::{Action, ActionPayload, InitData, Message};

pub const FIELD_WIDTH: f32 = 800.0;
pub const FIELD_HEIGHT: f32 = 600.0;
pub const TICK_RATE: u32 = 30;
pub const PLAYER_RADIUS: f32 = 20.0;
pub const MAX_HEALTH: f32 = 100.0;

pub const DAMAGE_RADIUS: f32 = 50.0;
pub const MAX_DAMAGE_DISTANCE: f32 = 50.0;
pub const MIN_DAMAGE_MULTIPLIER: f32 = 0.2;
pub const DAMAGE_RESISTANCE_MULTIPLIER: f32 = 2.0;
/// Attacks per second, identical for every class.
pub const PLAYER_ATTACK_SPEED: f32 = 1.0;

pub const ATTACK_RANGE_WARRIOR: f32 = 50.0;
pub const ATTACK_RANGE_MAGE: f32 = 200.0;

pub const MAX_BOTS: usize = 5;
/// Direction changes per second for each bot.
pub const BOT_UPDATE_RATE: f32 = 2.0;

pub const ACTION_QUEUE_CAPACITY: usize = 10;

pub type PlayerId = u32;

/// A 2-D vector used for positions and movement directions.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Unit vector pointing at `angle` radians.
    pub fn from_angle(angle: f32) -> Self {
        Self {
            x: angle.cos(),
            y: angle.sin(),
        }
    }

    pub fn length(&self) -> f32 {
        self.x.hypot(self.y)
    }

    pub fn distance(&self, other: &Vec2) -> f32 {
        Vec2::new(self.x - other.x, self.y - other.y).length()
    }

    pub fn normalize(&self) -> Vec2 {
        let len = self.length();
        if len == 0.0 {
            Vec2::ZERO
        } else if len.is_infinite() {
            // Both axes near f32::MAX; shrink first so the length is finite.
            let largest = self.x.abs().max(self.y.abs());
            Vec2::new(self.x / largest, self.y / largest).normalize()
        } else {
            self.scale(1.0 / len)
        }
    }

    /// Shrinks the vector to at most `max` length, keeping its heading.
    pub fn clamp_length(&self, max: f32) -> Vec2 {
        if self.length() > max {
            self.normalize().scale(max)
        } else {
            *self
        }
    }

    pub fn scale(&self, scalar: f32) -> Vec2 {
        Vec2::new(self.x * scalar, self.y * scalar)
    }

    pub fn add(&self, other: &Vec2) -> Vec2 {
        Vec2::new(self.x + other.x, self.y + other.y)
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Clamps each axis into the playing field rectangle.
    pub fn clamp_to_field(&self) -> Vec2 {
        Vec2::new(self.x.clamp(0.0, FIELD_WIDTH), self.y.clamp(0.0, FIELD_HEIGHT))
    }

    pub fn in_field(&self) -> bool {
        (0.0..=FIELD_WIDTH).contains(&self.x) && (0.0..=FIELD_HEIGHT).contains(&self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DamageType {
    Physical,
    Magical,
}

impl DamageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DamageType::Physical => "physical",
            DamageType::Magical => "magical",
        }
    }
}

impl std::fmt::Display for DamageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-class movement and damage figures.
#[derive(Debug, Clone, Copy)]
pub struct ClassStats {
    pub move_speed: f32,
    pub attack_damage: f32,
    pub attack_range: f32,
}

/// Character class. Encoded on the wire as `0` (Warrior) or `1` (Mage).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum PlayerClass {
    Warrior,
    Mage,
}

impl PlayerClass {
    pub const ALL: [PlayerClass; 2] = [PlayerClass::Warrior, PlayerClass::Mage];

    pub fn stats(&self) -> ClassStats {
        match self {
            PlayerClass::Warrior => ClassStats {
                move_speed: 100.0,
                attack_damage: 15.0,
                attack_range: ATTACK_RANGE_WARRIOR,
            },
            PlayerClass::Mage => ClassStats {
                move_speed: 80.0,
                attack_damage: 20.0,
                attack_range: ATTACK_RANGE_MAGE,
            },
        }
    }

    /// Damage type dealt by this class's attacks.
    pub fn damage_type(&self) -> DamageType {
        match self {
            PlayerClass::Warrior => DamageType::Physical,
            PlayerClass::Mage => DamageType::Magical,
        }
    }

    /// Warriors shrug off physical damage, mages magical damage.
    pub fn resists(&self, damage_type: DamageType) -> bool {
        self.damage_type() == damage_type
    }

    pub fn name(&self) -> &'static str {
        match self {
            PlayerClass::Warrior => "Warrior",
            PlayerClass::Mage => "Mage",
        }
    }
}

impl std::fmt::Display for PlayerClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl From<PlayerClass> for u8 {
    fn from(class: PlayerClass) -> Self {
        match class {
            PlayerClass::Warrior => 0,
            PlayerClass::Mage => 1,
        }
    }
}

impl TryFrom<u8> for PlayerClass {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(PlayerClass::Warrior),
            1 => Ok(PlayerClass::Mage),
            other => Err(format!("unknown player class {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub class: PlayerClass,
    pub position: Vec2,
    pub health: f32,
    #[serde(with = "optional_id")]
    pub target: Option<PlayerId>,
    /// Milliseconds since the UNIX epoch.
    pub last_attack_time: u64,
    pub moving_direction: Vec2,
}

impl Player {
    pub fn new(id: PlayerId, class: PlayerClass, position: Vec2, now: u64) -> Self {
        Self {
            id,
            class,
            position,
            health: MAX_HEALTH,
            target: None,
            last_attack_time: now,
            moving_direction: Vec2::ZERO,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }
}

/// Full world snapshot: every player keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldState {
    pub players: HashMap<PlayerId, Player>,
}

impl WorldState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

/// Anything that follows the authoritative world by receiving snapshots.
pub trait WorldConsumer {
    /// Called once with the id the server assigned to this connection.
    fn on_init(&mut self, init: InitData);

    /// Called for every snapshot, replacing whatever was held before.
    fn on_state(&mut self, state: WorldState);
}

/// Wire encoding for "player id or none": `0` stands for none.
pub mod optional_id {
    use super::PlayerId;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(id: &Option<PlayerId>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(id.unwrap_or(0))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<PlayerId>, D::Error> {
        let raw = PlayerId::deserialize(deserializer)?;
        Ok((raw != 0).then_some(raw))
    }
}
