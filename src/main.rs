//! Single entry point for both roles. `SERVER=1` runs the authoritative
//! server; anything else opens a client window. `GRINDER_ADDR` overrides
//! the listen or dial address.

use client::ClientConfig;
use log::{error, info};
use server::config::ServerConfig;
use std::error::Error;

type MainResult = Result<(), Box<dyn Error + Send + Sync>>;

fn server_mode() -> bool {
    std::env::var("SERVER").map(|value| value == "1").unwrap_or(false)
}

fn addr_override() -> Option<String> {
    std::env::var("GRINDER_ADDR").ok().filter(|addr| !addr.is_empty())
}

fn run_server() -> MainResult {
    let mut config = ServerConfig::default();
    if let Some(addr) = addr_override() {
        config.addr = addr;
    }

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        tokio::select! {
            result = server::run(config) => result,
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down");
                Ok(())
            }
        }
    })
}

fn run_client() -> MainResult {
    let mut config = ClientConfig::default();
    if let Some(addr) = addr_override() {
        config.server_addr = addr;
    }
    client::launch(config)
}

fn main() -> MainResult {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let result = if server_mode() {
        info!("Starting in server mode");
        run_server()
    } else {
        info!("Starting in client mode");
        run_client()
    };

    if let Err(e) = &result {
        error!("{}", e);
    }
    result
}
