pub mod bot;
pub mod convert;
pub mod schema;
pub mod transport;

pub use bot::{create_bot, fetch_me, setup_bot_commands};
pub use schema::{schema, HandlerError};
pub use transport::TeloxideTransport;

pub type Bot = teloxide::Bot;
