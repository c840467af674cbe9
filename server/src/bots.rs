//! Bot controller: spawns the bot pool and re-steers each bot a couple of
//! times per second.

use crate::events::{EventLog, GameEvent};
use crate::utils::{random_class, random_position, seconds_between};
use crate::world::World;
use rand::Rng;
use shared::{PlayerId, Vec2, BOT_UPDATE_RATE};
use std::f32::consts::TAU;

/// Tops the bot population up to `max_bots`. Returns the ids created.
pub fn spawn_bots<R: Rng + ?Sized>(
    world: &mut World,
    events: &mut EventLog,
    max_bots: usize,
    now: u64,
    rng: &mut R,
) -> Vec<PlayerId> {
    let missing = max_bots.saturating_sub(world.bot_count());
    (0..missing)
        .map(|_| {
            let class = random_class(rng);
            let position = random_position(rng);
            let id = world.create_bot(class, position, now);
            events.record(
                now,
                GameEvent::PlayerJoined {
                    player_id: id,
                    class,
                    position,
                    bot: true,
                },
            );
            id
        })
        .collect()
}

/// Nearest other player to `id`, if any.
pub fn nearest_player(world: &World, id: PlayerId) -> Option<PlayerId> {
    let origin = world.get(id)?.position;
    world
        .players()
        .filter(|other| other.id != id)
        .map(|other| (other.id, origin.distance(&other.position)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(other_id, _)| other_id)
}

/// Gives every bot whose steering interval has elapsed a fresh random
/// heading and points it at the nearest other player.
pub fn update_bots<R: Rng + ?Sized>(world: &mut World, now: u64, rng: &mut R) {
    let interval = 1.0 / BOT_UPDATE_RATE;

    for bot_id in world.bot_ids() {
        let due = world
            .bot(bot_id)
            .map(|bot| seconds_between(bot.last_direction_change, now) >= interval)
            .unwrap_or(false);
        if !due || !world.contains(bot_id) {
            continue;
        }

        let direction = Vec2::from_angle(rng.gen_range(0.0..TAU));
        world.apply_direction(bot_id, direction);
        if let Some(bot) = world.bot_mut(bot_id) {
            bot.last_direction_change = now;
        }

        if let Some(target) = nearest_player(world, bot_id) {
            world.set_attack_target(bot_id, Some(target));
        }
    }
}
