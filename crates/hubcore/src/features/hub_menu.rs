//! The root menu, text commands and inline queries.

use std::sync::Arc;

use super::{account, games, pfp, stats};
use crate::core::config::HubConfig;
use crate::hub::Ctx;
use crate::router::command::{CommandTable, InlineTable};
use crate::router::keyboard::{self, Options, DELETE_BUILTIN};
use crate::router::menu::Router;
use crate::router::{action, mount};
use crate::session::path::CommandPath;
use crate::transport::InlineArticle;

pub const TITLE: &str = "🚀 Hub";

const PRIVATE_HELP: &str = "Hey, it's the Hub 🚀

What can I help you with?

🐾 /hub 🚀 - We all prefer buttons
🐾 /help 😣 - You've made it this far
🐾 /account 💻 - Manage your account
🐾 /games 🎮 - Let's goooo
🐾 /stats 📊 - Who's on top
🐾 /pfp 🎨 - Profile pictures";

/// Sub-menus listed on the root, with whether they only work in private.
const ENTRIES: [(&str, &str, bool); 3] = [
    (account::TITLE, account::PATH, true),
    (games::TITLE, games::PATH, false),
    (stats::TITLE, stats::PATH, false),
];

pub fn root(config: &HubConfig) -> Arc<Router> {
    Arc::new(
        Router::new(TITLE, "")
            .action(account::PATH, mount(account::router()))
            .action(games::PATH, mount(games::router(config)))
            .action(stats::PATH, mount(stats::router()))
            .action(pfp::PATH, action(pfp::dispatch))
            .dynamic_options(|ctx: &Ctx, _path: &CommandPath| root_options(ctx)),
    )
}

/// Private-only entries become deep links when rendered in a group.
fn root_options(ctx: &Ctx) -> Options {
    let public = !ctx.is_private();
    let mut options: Options = ENTRIES
        .iter()
        .map(|&(title, path, private_only)| {
            let target = if private_only && public {
                keyboard::link(&ctx.transport().private_link(path))
            } else {
                path.to_string()
            };
            keyboard::row(&[(title, target.as_str())])
        })
        .collect();
    options.push(keyboard::row(&[("👋 Done", DELETE_BUILTIN)]));
    options
}

fn public_help(ctx: &Ctx) -> String {
    format!(
        "Welcome to the Hub 🚀

Wanna talk? {}

Public commands: try em!

🐾 /hub 🚀
🐾 /help 😣
🐾 /account 💻
🐾 /games 🎮
🐾 /stats 📊
🐾 /pfp 🎨",
        ctx.transport().private_link("hub")
    )
}

async fn send_help(ctx: Ctx) {
    let text = if ctx.is_private() {
        PRIVATE_HELP.to_string()
    } else {
        let key = format!("{} help", ctx.chat.id);
        if !ctx.hub.cooldowns().try_lock_for(&key, ctx.config().help_cooldown) {
            return;
        }
        public_help(&ctx)
    };

    if let Err(e) = ctx.send(&text, None).await {
        log::warn!("Failed to send help to chat {}: {}", ctx.chat.id, e);
    }
}

/// Routes `/name arg1 arg2` into the menu tree as `cmd|name/arg1/arg2`.
async fn route_command(ctx: Ctx, name: &str, args: Vec<String>) {
    let mut raw = format!("cmd|{name}");
    for arg in &args {
        raw.push('/');
        raw.push_str(arg);
    }
    ctx.hub.root().select(ctx, CommandPath::parse(&raw)).await;
}

pub fn commands() -> CommandTable {
    let mut table = CommandTable::new();

    table.register("start", |ctx: Ctx, args: Vec<String>| async move {
        match args.first() {
            // deep link from a private-only redirect
            Some(target) => route_command(ctx, target, Vec::new()).await,
            None => send_help(ctx).await,
        }
    });
    table.register("help", |ctx: Ctx, _args: Vec<String>| send_help(ctx));
    table.register("hub", |ctx: Ctx, args: Vec<String>| async move {
        if args.is_empty() {
            let root = ctx.hub.root();
            root.expose(&ctx, &CommandPath::parse("")).await;
        } else {
            let raw = format!("cmd|{}", args.join("/"));
            ctx.hub.root().select(ctx, CommandPath::parse(&raw)).await;
        }
    });
    for name in [account::PATH, games::PATH, stats::PATH, pfp::PATH] {
        table.register(name, move |ctx: Ctx, args: Vec<String>| route_command(ctx, name, args));
    }

    table
}

pub fn inline_queries() -> InlineTable {
    let mut table = InlineTable::new();
    for (query, title) in [("hub", TITLE), ("games", games::TITLE)] {
        table.register(query, move |ctx: Ctx, query_id: String| async move {
            let article = InlineArticle {
                id: query_id.clone(),
                title: title.to_string(),
                description: format!("Post /{query} in this chat"),
                text: format!("/{query}"),
            };
            if let Err(e) = ctx.transport().answer_inline(&query_id, &[article]).await {
                log::warn!("Failed to answer inline query {:?}: {}", query, e);
            }
        });
    }
    table
}
