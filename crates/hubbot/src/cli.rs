use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "hubbot")]
#[command(author, version, about = "Telegram hub bot: menus, XP leaderboards and mini-games", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the bot with long polling
    Run,

    /// Create or upgrade the database schema and exit
    Migrate {
        /// Database file, defaults to DATABASE_PATH
        #[arg(short, long)]
        database: Option<String>,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
