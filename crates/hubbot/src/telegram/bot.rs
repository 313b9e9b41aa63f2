//! Bot instance creation and startup helpers

use reqwest::ClientBuilder;
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::types::{BotCommand, Me};

use hubcore::core::config;

/// Attempts at `get_me` while the Bot API is still starting.
const STARTUP_RETRIES: u32 = 60;
const STARTUP_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Creates a Bot instance with custom or default API URL
pub fn create_bot() -> anyhow::Result<Bot> {
    let token = config::BOT_TOKEN.as_str();
    if token.is_empty() {
        return Err(anyhow::anyhow!("BOT_TOKEN environment variable not set"));
    }

    let client = ClientBuilder::new().timeout(config::network::timeout()).build()?;
    let bot = Bot::with_client(token, client);

    let bot = match config::BOT_API_URL.as_deref() {
        Some(bot_api_url) => {
            log::info!("Using custom Bot API URL: {}", bot_api_url);
            let url = url::Url::parse(bot_api_url).map_err(|e| anyhow::anyhow!("Invalid BOT_API_URL: {}", e))?;
            bot.set_api_url(url)
        }
        None => bot,
    };

    Ok(bot)
}

/// Calls `get_me`, retrying while the Bot API is unreachable.
pub async fn fetch_me(bot: &Bot) -> anyhow::Result<Me> {
    let mut attempt = 0;
    loop {
        match bot.get_me().await {
            Ok(me) => return Ok(me),
            Err(e) => {
                let err_str = e.to_string();
                let is_retryable = err_str.contains("restart")
                    || err_str.contains("network")
                    || err_str.contains("connection")
                    || err_str.contains("timed out");

                attempt += 1;
                if attempt >= STARTUP_RETRIES || !is_retryable {
                    return Err(anyhow::anyhow!("Failed to connect to Bot API after {} attempts: {}", attempt, e));
                }

                log::warn!(
                    "Bot API not ready (attempt {}/{}): {}. Retrying in {:?}...",
                    attempt,
                    STARTUP_RETRIES,
                    err_str,
                    STARTUP_RETRY_DELAY
                );
                tokio::time::sleep(STARTUP_RETRY_DELAY).await;
            }
        }
    }
}

/// Sets up the command list shown in the Telegram UI
pub async fn setup_bot_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    bot.set_my_commands(vec![
        BotCommand::new("hub", "open the hub menu"),
        BotCommand::new("help", "list commands"),
        BotCommand::new("account", "manage your account"),
        BotCommand::new("games", "play cointoss, rock paper scissors or connect 4"),
        BotCommand::new("stats", "XP leaderboards"),
        BotCommand::new("pfp", "profile pictures"),
    ])
    .await?;

    Ok(())
}
