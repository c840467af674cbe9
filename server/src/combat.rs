//! Damage resolution: class damage, distance falloff, resistances and splash.

use crate::events::{EventLog, GameEvent};
use crate::world::World;
use shared::{
    DamageType, PlayerClass, PlayerId, DAMAGE_RADIUS, DAMAGE_RESISTANCE_MULTIPLIER,
    MAX_DAMAGE_DISTANCE, MIN_DAMAGE_MULTIPLIER,
};

/// Result of one resolved attack.
#[derive(Debug, Clone, PartialEq)]
pub struct AttackOutcome {
    pub damage: f32,
    pub damage_type: DamageType,
    /// Secondary victims and the damage each took.
    pub splashed: Vec<(PlayerId, f32)>,
}

/// Full damage up to `MAX_DAMAGE_DISTANCE`, then a linear drop that bottoms
/// out at `MIN_DAMAGE_MULTIPLIER` once the distance reaches twice that.
pub fn distance_multiplier(distance: f32) -> f32 {
    if distance <= MAX_DAMAGE_DISTANCE {
        return 1.0;
    }
    let falloff = (distance - MAX_DAMAGE_DISTANCE) / MAX_DAMAGE_DISTANCE;
    (1.0 - falloff * (1.0 - MIN_DAMAGE_MULTIPLIER)).max(MIN_DAMAGE_MULTIPLIER)
}

pub fn resistance_multiplier(target: PlayerClass, damage_type: DamageType) -> f32 {
    if target.resists(damage_type) {
        1.0 / DAMAGE_RESISTANCE_MULTIPLIER
    } else {
        1.0
    }
}

/// Damage dealt by `attacker` to a `target` standing `distance` away.
pub fn attack_damage(attacker: PlayerClass, target: PlayerClass, distance: f32) -> f32 {
    let damage_type = attacker.damage_type();
    attacker.stats().attack_damage
        * distance_multiplier(distance)
        * resistance_multiplier(target, damage_type)
}

/// Splash taken by a bystander of class `class` from a hit of `damage`.
pub fn splash_damage(damage: f32, class: PlayerClass, damage_type: DamageType) -> f32 {
    damage * resistance_multiplier(class, damage_type)
}

/// Applies one attack from `attacker_id` to `target_id` and splashes every
/// other living player near the target. Returns `None` without touching the
/// world when either player no longer exists.
pub fn resolve_attack(
    world: &mut World,
    events: &mut EventLog,
    attacker_id: PlayerId,
    target_id: PlayerId,
    now: u64,
) -> Option<AttackOutcome> {
    let (attacker_class, attacker_position) = {
        let attacker = world.get(attacker_id)?;
        (attacker.class, attacker.position)
    };
    let damage_type = attacker_class.damage_type();

    let target = world.get_mut(target_id)?;
    let distance = attacker_position.distance(&target.position);
    let damage = attack_damage(attacker_class, target.class, distance);
    target.health = (target.health - damage).max(0.0);
    let impact = target.position;

    events.record(
        now,
        GameEvent::PlayerAttack {
            attacker_id,
            target_id,
            damage,
            damage_type,
        },
    );

    let mut splashed = Vec::new();
    for other in world.players_mut() {
        if other.id == target_id || !other.is_alive() {
            continue;
        }
        if other.position.distance(&impact) >= DAMAGE_RADIUS {
            continue;
        }

        let splash = splash_damage(damage, other.class, damage_type);
        other.health = (other.health - splash).max(0.0);
        splashed.push((other.id, splash));
    }

    for (victim, splash) in &splashed {
        events.record(
            now,
            GameEvent::SplashDamage {
                attacker_id,
                target_id: *victim,
                damage: *splash,
                damage_type,
            },
        );
    }

    Some(AttackOutcome {
        damage,
        damage_type,
        splashed,
    })
}
