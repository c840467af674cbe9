use shared::{MAX_BOTS, TICK_RATE};
use std::time::Duration;

/// Runtime settings for the server.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Address to listen on, `host:port`
    pub addr: String,
    /// Simulation ticks per second
    pub tick_rate: u32,
    pub max_bots: usize,
    /// Delay between startup and the bot pool being filled
    pub bot_spawn_delay: Duration,
}

impl ServerConfig {
    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs_f32(1.0 / self.tick_rate.max(1) as f32)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:8080".to_string(),
            tick_rate: TICK_RATE,
            max_bots: MAX_BOTS,
            bot_spawn_delay: Duration::from_secs(2),
        }
    }
}
