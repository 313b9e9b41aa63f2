//! Interactive session core: payload paths, interactions, registries and
//! message-reply hooks.

pub mod hook;
pub mod input;
pub mod interaction;
pub mod manager;
pub mod path;
pub mod registry;

pub use hook::{HookTable, MessageHook};
pub use interaction::{Interaction, Interactive};
pub use manager::SessionManager;
pub use path::CommandPath;
pub use registry::{SessionRegistry, Slot};
