use clap::Parser;
use log::{error, info};
use server::config::ServerConfig;
use server::network::ServerResult;
use std::time::Duration;

/// Command line arguments
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Server IP address to bind to
    #[clap(short = 'H', long, default_value = "0.0.0.0")]
    host: String,
    /// Server port to listen on
    #[clap(short, long, default_value = "8080")]
    port: u16,
    /// Tick rate (updates per second)
    #[clap(short, long, default_value = "30")]
    tick_rate: u32,
    /// Number of server-controlled players
    #[clap(short, long, default_value = "5")]
    max_bots: usize,
    /// Delay before bots are spawned, in milliseconds
    #[clap(long, default_value = "2000")]
    bot_delay_ms: u64,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        ServerConfig {
            addr: format!("{}:{}", args.host, args.port),
            tick_rate: args.tick_rate,
            max_bots: args.max_bots,
            bot_spawn_delay: Duration::from_millis(args.bot_delay_ms),
        }
    }
}

#[tokio::main]
async fn main() -> ServerResult<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ServerConfig::from(Args::parse());

    tokio::select! {
        result = server::run(config) => {
            if let Err(e) = &result {
                error!("Server stopped: {}", e);
            }
            result
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
            Ok(())
        }
    }
}
