use anyhow::Result;
use dotenvy::dotenv;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::update_listeners::Polling;

use hubbot::cli::{Cli, Commands};
use hubbot::telegram::{create_bot, fetch_me, schema, setup_bot_commands, TeloxideTransport};
use hubcore::core::{config, init_logger, log_hub_configuration};
use hubcore::storage::{create_pool, SqliteStore};
use hubcore::{Hub, HubConfig};

/// Main entry point for the hub bot
///
/// Parses CLI arguments and dispatches to the selected subcommand.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Log panics from handler tasks instead of losing them
    std::panic::set_hook(Box::new(|panic_info| {
        log::error!("Panic caught: {:?}", panic_info);
        if let Some(location) = panic_info.location() {
            log::error!("Panic at {}:{}:{}", location.file(), location.line(), location.column());
        }
    }));

    // Load environment variables from .env if present
    let _ = dotenv();

    init_logger(&config::LOG_FILE_PATH)?;

    match cli.command {
        Some(Commands::Migrate { database }) => run_migrate(database),
        Some(Commands::Run) => run_bot().await,
        None => {
            log::info!("No command specified, running bot in default mode");
            run_bot().await
        }
    }
}

/// Opens the database, which creates or upgrades the schema
fn run_migrate(database: Option<String>) -> Result<()> {
    let path = database.unwrap_or_else(|| config::DATABASE_PATH.clone());
    create_pool(&path).map_err(|e| anyhow::anyhow!("Failed to create database pool: {}", e))?;
    log::info!("Database schema at {} is up to date", path);
    Ok(())
}

async fn run_bot() -> Result<()> {
    let started = std::time::Instant::now();
    log::info!("Starting bot...");

    let bot = create_bot()?;
    let me = fetch_me(&bot).await?;
    let username = me.username.clone().unwrap_or_default();
    log::info!("Bot username: {:?}, Bot ID: {}", username, me.id);

    if let Err(e) = setup_bot_commands(&bot).await {
        log::warn!("Failed to set bot commands: {}", e);
    }

    let pool = create_pool(&config::DATABASE_PATH).map_err(|e| anyhow::anyhow!("Failed to create database pool: {}", e))?;
    let store = Arc::new(SqliteStore::new(pool));
    let transport = Arc::new(TeloxideTransport::new(bot.clone(), username.clone()));

    let hub_config = HubConfig::from_env();
    log_hub_configuration(&hub_config);
    let hub = Arc::new(Hub::new(transport, store, hub_config).with_bot_username(username));
    let _maintenance = hub.spawn_maintenance();

    log::info!("Bot initialization complete in {:.2}s", started.elapsed().as_secs_f64());

    let listener = Polling::builder(bot.clone()).drop_pending_updates().build();
    Dispatcher::builder(bot, schema(hub))
        .enable_ctrlc_handler()
        .build()
        .dispatch_with_listener(
            listener,
            LoggingErrorHandler::with_custom_text("An error from the update listener"),
        )
        .await;

    log::info!("Dispatcher shutdown gracefully");
    Ok(())
}
