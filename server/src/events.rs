//! Append-only record of gameplay events for the current session.

use log::{debug, info};
use serde::Serialize;
use shared::{DamageType, PlayerClass, PlayerId, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    PlayerJoined,
    PlayerLeft,
    PlayerAttack,
    SplashDamage,
    PlayerDeath,
    PlayerRespawn,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum GameEvent {
    PlayerJoined {
        player_id: PlayerId,
        class: PlayerClass,
        position: Vec2,
        bot: bool,
    },
    PlayerLeft {
        player_id: PlayerId,
    },
    PlayerAttack {
        attacker_id: PlayerId,
        target_id: PlayerId,
        damage: f32,
        damage_type: DamageType,
    },
    SplashDamage {
        attacker_id: PlayerId,
        target_id: PlayerId,
        damage: f32,
        damage_type: DamageType,
    },
    PlayerDeath {
        player_id: PlayerId,
    },
    PlayerRespawn {
        player_id: PlayerId,
        position: Vec2,
    },
}

impl GameEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            GameEvent::PlayerJoined { .. } => EventKind::PlayerJoined,
            GameEvent::PlayerLeft { .. } => EventKind::PlayerLeft,
            GameEvent::PlayerAttack { .. } => EventKind::PlayerAttack,
            GameEvent::SplashDamage { .. } => EventKind::SplashDamage,
            GameEvent::PlayerDeath { .. } => EventKind::PlayerDeath,
            GameEvent::PlayerRespawn { .. } => EventKind::PlayerRespawn,
        }
    }

    fn emit(&self) {
        match self {
            GameEvent::PlayerJoined {
                player_id,
                class,
                position,
                bot,
            } => {
                let who = if *bot { "Bot" } else { "Player" };
                info!(
                    "{} {} joined, class: {}, position: ({:.1}, {:.1})",
                    who, player_id, class, position.x, position.y
                );
            }
            GameEvent::PlayerLeft { player_id } => info!("Player {} disconnected", player_id),
            GameEvent::PlayerAttack {
                attacker_id,
                target_id,
                damage,
                damage_type,
            } => debug!(
                "Player {} attacked Player {} for {:.2} {} damage",
                attacker_id, target_id, damage, damage_type
            ),
            GameEvent::SplashDamage {
                attacker_id,
                target_id,
                damage,
                ..
            } => debug!(
                "Player {} received {:.2} splash damage from Player {}",
                target_id, damage, attacker_id
            ),
            GameEvent::PlayerDeath { player_id } => info!("Player {} died", player_id),
            GameEvent::PlayerRespawn {
                player_id,
                position,
            } => info!(
                "Player {} respawned at ({:.1}, {:.1})",
                player_id, position.x, position.y
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    /// Milliseconds since the UNIX epoch.
    pub timestamp: u64,
    #[serde(flatten)]
    pub event: GameEvent,
}

#[derive(Debug, Default)]
pub struct EventLog {
    entries: Vec<LogEntry>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an event and mirrors it to the process log.
    pub fn record(&mut self, timestamp: u64, event: GameEvent) {
        event.emit();
        self.entries.push(LogEntry { timestamp, event });
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count_of(&self, kind: EventKind) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.event.kind() == kind)
            .count()
    }

    pub fn iter_kind(&self, kind: EventKind) -> impl Iterator<Item = &LogEntry> + '_ {
        self.entries
            .iter()
            .filter(move |entry| entry.event.kind() == kind)
    }
}
