//! Hubbot - Telegram front-end for the hub
//!
//! - `cli`: command line interface
//! - `telegram`: bot creation, the update schema and the Telegram transport

pub mod cli;
pub mod telegram;
