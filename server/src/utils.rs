//! Small helpers shared by the simulation and the bot controller: wall-clock
//! timestamps and the random draws used when placing new players.
//!
//! Every random helper takes the caller's generator so tests can pass a
//! seeded `StdRng` and get repeatable worlds.

use rand::Rng;
use shared::{PlayerClass, Vec2, FIELD_HEIGHT, FIELD_WIDTH};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

// Get current timestamp in milliseconds
pub fn get_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::from_secs(0))
        .as_millis() as u64
}

// Seconds elapsed between two millisecond timestamps, zero if `now` is earlier
pub fn seconds_between(earlier: u64, now: u64) -> f32 {
    now.saturating_sub(earlier) as f32 / 1000.0
}

// Uniformly random point inside the playing field
pub fn random_position<R: Rng + ?Sized>(rng: &mut R) -> Vec2 {
    Vec2::new(
        rng.gen::<f32>() * FIELD_WIDTH,
        rng.gen::<f32>() * FIELD_HEIGHT,
    )
}

// Uniformly random class, used for humans and bots alike
pub fn random_class<R: Rng + ?Sized>(rng: &mut R) -> PlayerClass {
    PlayerClass::ALL[rng.gen_range(0..PlayerClass::ALL.len())]
}
