use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;

/// Bot token
/// Read from BOT_TOKEN or TELOXIDE_TOKEN environment variable
pub static BOT_TOKEN: Lazy<String> = Lazy::new(|| {
    env::var("BOT_TOKEN")
        .or_else(|_| env::var("TELOXIDE_TOKEN"))
        .unwrap_or_else(|_| String::new())
});

/// Database file path
/// Read from DATABASE_PATH environment variable
/// Default: hub.sqlite
pub static DATABASE_PATH: Lazy<String> =
    Lazy::new(|| env::var("DATABASE_PATH").unwrap_or_else(|_| "hub.sqlite".to_string()));

/// Log file path
/// Read from LOG_FILE_PATH environment variable
/// Default: hub.log
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| env::var("LOG_FILE_PATH").unwrap_or_else(|_| "hub.log".to_string()));

/// Custom Bot API server URL (optional)
pub static BOT_API_URL: Lazy<Option<String>> = Lazy::new(|| env::var("BOT_API_URL").ok());

/// Comma-separated Telegram user ids allowed to manage profile pictures
pub static ADMIN_IDS: Lazy<Vec<i64>> = Lazy::new(|| {
    env::var("ADMIN_IDS")
        .map(|raw| parse_id_list(&raw))
        .unwrap_or_default()
});

/// Fixed RNG seed for reproducible games (optional, debugging only)
pub static RNG_SEED: Lazy<Option<u64>> = Lazy::new(|| env::var("HUB_RNG_SEED").ok().and_then(|s| s.parse().ok()));

fn parse_id_list(raw: &str) -> Vec<i64> {
    raw.split(',').filter_map(|s| s.trim().parse().ok()).collect()
}

/// Interactive session lifetimes (wallet editing, profile uploads)
pub mod session {
    use super::Duration;

    /// Lifetime of account/profile sessions (in seconds)
    pub const TTL_SECS: u64 = 300;

    pub fn ttl() -> Duration {
        Duration::from_secs(TTL_SECS)
    }
}

/// Mini-game timings and rewards
pub mod games {
    use super::Duration;

    /// Coin toss and rock-paper-scissors lifetime (in seconds)
    pub const SHORT_GAME_TTL_SECS: u64 = 300;

    /// Connect-Four lifetime (in seconds)
    pub const CONNECT_FOUR_TTL_SECS: u64 = 1200;

    /// Pause after every accepted move (in milliseconds)
    pub const MOVE_THROTTLE_MS: u64 = 500;

    /// Rounds in a rock-paper-scissors match
    pub const RPS_ROUNDS: u32 = 3;

    /// XP granted per win (multiplied by the round margin for rock-paper-scissors)
    pub const WIN_REWARD_XP: i64 = 100;

    pub fn short_game_ttl() -> Duration {
        Duration::from_secs(SHORT_GAME_TTL_SECS)
    }

    pub fn connect_four_ttl() -> Duration {
        Duration::from_secs(CONNECT_FOUR_TTL_SECS)
    }

    pub fn move_throttle() -> Duration {
        Duration::from_millis(MOVE_THROTTLE_MS)
    }
}

/// Public chat cooldowns
pub mod cooldown {
    use super::Duration;

    /// Games menu re-render cooldown in group chats (in seconds)
    pub const GAMES_MENU_SECS: u64 = 3;

    /// `/help` cooldown in group chats (in seconds)
    pub const HELP_SECS: u64 = 5;

    /// How often stale cooldown locks are tidied (in seconds)
    pub const TIDY_INTERVAL_SECS: u64 = 1800;

    pub fn games_menu() -> Duration {
        Duration::from_secs(GAMES_MENU_SECS)
    }

    pub fn help() -> Duration {
        Duration::from_secs(HELP_SECS)
    }

    pub fn tidy_interval() -> Duration {
        Duration::from_secs(TIDY_INTERVAL_SECS)
    }
}

/// Message-reply hooks
pub mod hooks {
    use super::Duration;

    /// Upper bound for any hook lifespan (in seconds)
    pub const MAX_LIFESPAN_SECS: u64 = 3600;

    pub fn max_lifespan() -> Duration {
        Duration::from_secs(MAX_LIFESPAN_SECS)
    }
}

/// XP accounting
pub mod xp {
    /// Title for engagement XP earned by chatting in groups
    pub const ENGAGE_TITLE: &str = "💕 Engage XP";

    /// Title for XP earned by winning games
    pub const GAMES_TITLE: &str = "🎮 Games XP";

    /// XP per group message
    pub const ENGAGE_PER_MESSAGE: i64 = 10;

    /// Rows shown on a leaderboard
    pub const LEADERBOARD_SIZE: usize = 15;
}

/// Network configuration
pub mod network {
    use super::Duration;

    /// HTTP request timeout for Bot API calls (in seconds)
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;

    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }
}

/// Runtime configuration handed to the hub at construction.
///
/// Defaults mirror the constants above; tests shrink the timings.
#[derive(Debug, Clone)]
pub struct HubConfig {
    pub session_ttl: Duration,
    pub cointoss_ttl: Duration,
    pub rps_ttl: Duration,
    pub connect_four_ttl: Duration,
    pub move_throttle: Duration,
    pub rps_rounds: u32,
    pub win_reward: i64,
    pub engage_reward: i64,
    pub games_menu_cooldown: Duration,
    pub help_cooldown: Duration,
    pub admin_ids: Vec<i64>,
    pub rng_seed: Option<u64>,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            session_ttl: session::ttl(),
            cointoss_ttl: games::short_game_ttl(),
            rps_ttl: games::short_game_ttl(),
            connect_four_ttl: games::connect_four_ttl(),
            move_throttle: games::move_throttle(),
            rps_rounds: games::RPS_ROUNDS,
            win_reward: games::WIN_REWARD_XP,
            engage_reward: xp::ENGAGE_PER_MESSAGE,
            games_menu_cooldown: cooldown::games_menu(),
            help_cooldown: cooldown::help(),
            admin_ids: Vec::new(),
            rng_seed: None,
        }
    }
}

impl HubConfig {
    /// Defaults plus the environment-provided admin list and RNG seed
    pub fn from_env() -> Self {
        Self {
            admin_ids: ADMIN_IDS.clone(),
            rng_seed: *RNG_SEED,
            ..Self::default()
        }
    }

    pub fn is_admin(&self, user_id: i64) -> bool {
        self.admin_ids.contains(&user_id)
    }
}
