//! Per-tick world advancement: movement, attacks, then respawns.

use crate::combat::resolve_attack;
use crate::events::{EventLog, GameEvent};
use crate::utils::{random_position, seconds_between};
use crate::world::World;
use rand::Rng;
use shared::{MAX_HEALTH, PLAYER_ATTACK_SPEED};

/// Counters for a single simulation step.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StepSummary {
    pub attacks: usize,
    pub respawns: usize,
}

/// Moves every player along its direction for `dt` seconds and keeps it
/// inside the field.
pub fn integrate_movement(world: &mut World, dt: f32) {
    for player in world.players_mut() {
        if player.moving_direction.is_zero() {
            continue;
        }
        let speed = player.class.stats().move_speed;
        player.position = player
            .position
            .add(&player.moving_direction.scale(speed * dt))
            .clamp_to_field();
    }
}

/// Fires every attack whose cooldown has elapsed. Attacks on players that
/// have left are skipped and keep their cooldown.
pub fn run_attacks(world: &mut World, events: &mut EventLog, now: u64) -> usize {
    let cooldown = 1.0 / PLAYER_ATTACK_SPEED;
    let mut attacks = 0;

    for id in world.player_ids() {
        let Some((target, last_attack)) = world.get(id).map(|p| (p.target, p.last_attack_time)) else {
            continue;
        };
        let Some(target) = target else {
            continue;
        };
        if !world.contains(target) || seconds_between(last_attack, now) < cooldown {
            continue;
        }

        if resolve_attack(world, events, id, target, now).is_some() {
            attacks += 1;
            if let Some(attacker) = world.get_mut(id) {
                attacker.last_attack_time = now;
            }
        }
    }
    attacks
}

/// Brings every player at zero health straight back at full health in a
/// random spot.
pub fn respawn_dead<R: Rng + ?Sized>(
    world: &mut World,
    events: &mut EventLog,
    now: u64,
    rng: &mut R,
) -> usize {
    let mut respawns = 0;

    for id in world.player_ids() {
        let Some(player) = world.get_mut(id) else {
            continue;
        };
        if player.health > 0.0 {
            continue;
        }

        player.health = MAX_HEALTH;
        player.position = random_position(rng);
        let position = player.position;

        events.record(now, GameEvent::PlayerDeath { player_id: id });
        events.record(
            now,
            GameEvent::PlayerRespawn {
                player_id: id,
                position,
            },
        );
        respawns += 1;
    }
    respawns
}

/// One full simulation step.
pub fn step<R: Rng + ?Sized>(
    world: &mut World,
    events: &mut EventLog,
    now: u64,
    dt: f32,
    rng: &mut R,
) -> StepSummary {
    integrate_movement(world, dt);
    let attacks = run_attacks(world, events, now);
    let respawns = respawn_dead(world, events, now, rng);

    StepSummary { attacks, respawns }
}
