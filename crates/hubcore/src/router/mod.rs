//! Payload routing: menu trees for button presses, text commands and inline
//! queries.

pub mod command;
pub mod keyboard;
pub mod menu;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use std::future::Future;
use std::sync::Arc;

use crate::hub::Ctx;
use crate::session::path::CommandPath;

pub use command::{CommandAction, CommandTable, InlineAction, InlineTable};
pub use keyboard::{Button, ButtonAction, Keyboard, OptionRow, Options};
pub use menu::Router;

/// A routed button handler. Receives the path already advanced past the
/// segment that selected it.
pub type Action = Arc<dyn Fn(Ctx, CommandPath) -> BoxFuture<'static, ()> + Send + Sync>;

/// Wraps an async fn or closure as an [`Action`].
pub fn action<F, Fut>(f: F) -> Action
where
    F: Fn(Ctx, CommandPath) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move |ctx: Ctx, path: CommandPath| f(ctx, path).boxed())
}

/// Action delegating to a sub-menu.
pub fn mount(router: Arc<Router>) -> Action {
    action(move |ctx, path| {
        let router = Arc::clone(&router);
        async move { router.select(ctx, path).await }
    })
}
