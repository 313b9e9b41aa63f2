//! Persistence collaborator: users, wallets, XP ledger and stored files.

pub mod dates;
pub mod db;

use chrono::NaiveDate;
use strum::{Display, EnumIter, EnumString};

use crate::core::error::HubResult;
use crate::transport::Actor;

pub use db::{create_memory_pool, create_pool, get_connection, DbConnection, DbPool, SqliteStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: String,
    pub wallet: Option<String>,
}

impl User {
    pub fn from_actor(actor: &Actor) -> Self {
        Self {
            id: actor.id,
            username: actor.username.clone(),
            first_name: actor.first_name.clone(),
            wallet: None,
        }
    }

    pub fn display_name(&self) -> String {
        match &self.username {
            Some(username) => format!("@{username}"),
            None => self.first_name.clone(),
        }
    }
}

/// Leaderboard window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum XpPeriod {
    All,
    Month,
    Week,
}

impl XpPeriod {
    pub fn label(self) -> &'static str {
        match self {
            XpPeriod::All => "All-Time",
            XpPeriod::Month => "Monthly",
            XpPeriod::Week => "This Week",
        }
    }
}

/// One (user, title) row of the XP ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserXp {
    pub user_id: i64,
    pub title: String,
    pub xp: i64,
    pub month_xp: i64,
    pub week_xp: i64,
    pub month_from: NaiveDate,
    pub week_from: NaiveDate,
}

impl UserXp {
    pub fn for_period(&self, period: XpPeriod) -> i64 {
        match period {
            XpPeriod::All => self.xp,
            XpPeriod::Month => self.month_xp,
            XpPeriod::Week => self.week_xp,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardRow {
    pub user_id: i64,
    pub name: String,
    pub xp: i64,
}

/// A file (profile picture) remembered by its platform ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub unique_id: String,
    pub file_id: String,
    pub prefix: String,
    pub name: String,
}

/// Storage operations used by the hub. Synchronous; every call is short.
pub trait UserStore: Send + Sync {
    fn get_user(&self, id: i64) -> HubResult<Option<User>>;

    /// Inserts or fully replaces a user row.
    fn save_user(&self, user: &User) -> HubResult<()>;

    /// Adds `delta` to all three counters of (user, title), rolling the week
    /// and month windows first. Counters never drop below zero.
    fn shift_xp(&self, user_id: i64, title: &str, delta: i64) -> HubResult<UserXp>;

    /// Distinct XP titles present in the ledger.
    fn xp_titles(&self) -> HubResult<Vec<String>>;

    /// Every title row of one user, with stale windows read as zero.
    fn user_xp(&self, user_id: i64) -> HubResult<Vec<UserXp>>;

    fn top_xp(&self, title: &str, period: XpPeriod, limit: usize) -> HubResult<Vec<LeaderboardRow>>;

    fn save_file(&self, file: &StoredFile) -> HubResult<()>;

    fn list_files(&self, prefix: &str) -> HubResult<Vec<StoredFile>>;

    fn get_file(&self, unique_id: &str) -> HubResult<Option<StoredFile>>;

    fn delete_file(&self, unique_id: &str) -> HubResult<bool>;
}
