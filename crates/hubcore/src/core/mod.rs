pub mod config;
pub mod cooldown;
pub mod error;
pub mod logging;

pub use cooldown::CooldownLocks;
pub use error::{HubError, HubResult};
pub use logging::{init_logger, log_hub_configuration};
