use dotenv::dotenv;
use std::sync::Arc;
use tokio::sync::oneshot;

mod channels;
mod config;
mod db;
mod discord_hooks;
mod engine;
mod integrations;
mod logging;
mod models;

use config::Config;
use db::Database;
use engine::LibraryEngine;
use integrations::steam_client::SteamClient;

/// Log a startup failure and exit non-zero
fn fail(message: String) -> ! {
    log::error!("{}", message);
    std::process::exit(1);
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    logging::init(config::log_file_from_env().as_deref());

    let config = Config::from_env();

    let Some(bot_token) = config.discord_token.clone() else {
        fail(format!("{} is not set", config::env_vars::DISCORD_TOKEN));
    };

    if !config.steam.has_api_key() {
        log::warn!(
            "{} is not set: linking by custom URL and library sync will fail",
            config::env_vars::STEAM_API_KEY
        );
    }

    log::info!("Initializing database at {}", config.database_url);
    let db = match Database::new(&config.database_url) {
        Ok(db) => Arc::new(db),
        Err(e) => fail(format!("Failed to initialize database: {}", e)),
    };
    log::info!(
        "Database ready ({} linked accounts)",
        db.count_linked_accounts().unwrap_or_default()
    );

    let steam = match SteamClient::new(&config.steam) {
        Ok(client) => Arc::new(client),
        Err(e) => fail(e),
    };

    let engine = Arc::new(LibraryEngine::new(
        db,
        steam.clone(),
        steam,
        config.search_limit,
    ));

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(());
        }
    });

    if let Err(e) = channels::start_discord_listener(bot_token, engine, config.command_prefix, shutdown_rx).await {
        fail(e);
    }

    log::info!("Shutdown complete");
}
