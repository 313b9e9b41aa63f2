//! Hub features mounted under the root menu.

pub mod account;
pub mod games;
pub mod hub_menu;
pub mod pfp;
pub mod stats;
