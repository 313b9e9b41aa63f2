//! Private account menu: wallet address and personal XP.

use futures_util::FutureExt;
use std::fmt::Write as _;
use std::sync::Arc;

use crate::hub::Ctx;
use crate::router::keyboard::{self, Keyboard};
use crate::router::menu::Router;
use crate::router::{action, mount};
use crate::session::hook::MessageHook;
use crate::session::interaction::{Interaction, Interactive};
use crate::session::path::CommandPath;
use crate::storage::XpPeriod;
use crate::transport::{escape_html, IncomingMessage};

pub const TITLE: &str = "💻 Account";
pub const PATH: &str = "account";

pub const WALLET_TITLE: &str = "💳 Wallet";
pub const XP_TITLE: &str = "📈 My XP";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletStep {
    Idle,
    /// Waiting for the new address
    Update,
}

pub type WalletFlow = Interaction<WalletStep>;

pub fn router() -> Arc<Router> {
    let wallet = Router::new(WALLET_TITLE, format!("{PATH}/wallet"))
        .action("view", action(view_wallet))
        .action("update", action(update_wallet))
        .action("remove", action(remove_wallet))
        .private_options(vec![
            keyboard::row(&[("✏️ Update", "update")]),
            keyboard::row(&[("👀 View", "view"), ("🗑️ Remove", "remove")]),
            keyboard::nav_row(".."),
        ])
        .private_only();

    Arc::new(
        Router::new(TITLE, PATH)
            .action("wallet", mount(Arc::new(wallet)))
            .private_options(vec![keyboard::row(&[(WALLET_TITLE, "wallet")]), keyboard::nav_row("..")])
            .private_only()
            .extend(XP_TITLE, "xp", action(show_xp)),
    )
}

/// Single "back to account" button owned by the acting user.
fn account_button(ctx: &Ctx) -> Keyboard {
    let owner = ctx.user.id.to_string();
    Keyboard::from_options(&vec![keyboard::row(&[(TITLE, PATH)])], &[("user", owner.as_str())])
}

async fn view_wallet(ctx: Ctx, _path: CommandPath) {
    let text = match ctx.store().get_user(ctx.user.id) {
        Ok(Some(user)) => match user.wallet {
            Some(wallet) if !wallet.is_empty() => format!("<code>{}</code>", escape_html(&wallet)),
            _ => "No wallet saved yet.".to_string(),
        },
        Ok(None) => "No wallet saved yet.".to_string(),
        Err(e) => {
            log::warn!("Failed to load user {}: {}", ctx.user.id, e);
            return;
        }
    };

    if let Err(e) = ctx.send(&text, None).await {
        log::warn!("Failed to send wallet to user {}: {}", ctx.user.id, e);
    }
}

async fn update_wallet(ctx: Ctx, _path: CommandPath) {
    let flow = ctx.sessions().wallets.open(ctx.user.id, || WalletFlow::new(WalletStep::Idle));
    let prompt = "Okay! Send me a public wallet address to associate to your account.";
    let anchor = match ctx.send(prompt, None).await {
        Ok(anchor) => anchor,
        Err(e) => {
            log::warn!("Failed to prompt user {} for a wallet: {}", ctx.user.id, e);
            return;
        }
    };
    flow.lock().await.mutate(WalletStep::Update, Some(anchor));

    let hook = MessageHook::new(ctx.config().session_ttl, |ctx: Ctx, message: IncomingMessage| {
        save_wallet(ctx, message).boxed()
    });
    ctx.hub.hooks().set_chat_hook(ctx.chat.id, hook);
}

/// Chat hook armed by `update`. Returns `true` once the address is stored
/// or the flow is gone.
async fn save_wallet(ctx: Ctx, message: IncomingMessage) -> bool {
    let Some(flow) = ctx.sessions().wallets.get(&ctx.user.id) else {
        log::debug!("Wallet flow of user {} expired", ctx.user.id);
        return true;
    };
    let mut flow = flow.lock().await;
    if !flow.is(WalletStep::Update) {
        return true;
    }

    let Some(address) = message.text.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
        if let Err(e) = ctx.send("Send the address as plain text.", None).await {
            log::warn!("Failed to re-prompt user {}: {}", ctx.user.id, e);
        }
        return false;
    };

    let saved = match ctx.store().get_user(ctx.user.id) {
        Ok(Some(mut user)) => {
            user.wallet = Some(address.to_string());
            ctx.store().save_user(&user)
        }
        Ok(None) => {
            let mut user = crate::storage::User::from_actor(&ctx.user);
            user.wallet = Some(address.to_string());
            ctx.store().save_user(&user)
        }
        Err(e) => Err(e),
    };
    flow.mutate(WalletStep::Idle, None);

    let reply = match saved {
        Ok(()) => ctx.send("✅ Saved", Some(&account_button(&ctx))).await,
        Err(e) => {
            log::warn!("Failed to save wallet of user {}: {}", ctx.user.id, e);
            ctx.send("Something went wrong updating your wallet details", None).await
        }
    };
    if let Err(e) = reply {
        log::warn!("Failed to confirm wallet of user {}: {}", ctx.user.id, e);
    }
    true
}

async fn remove_wallet(ctx: Ctx, _path: CommandPath) {
    let removed = match ctx.store().get_user(ctx.user.id) {
        Ok(Some(mut user)) => {
            user.wallet = None;
            ctx.store().save_user(&user)
        }
        Ok(None) => Ok(()),
        Err(e) => Err(e),
    };

    let reply = match removed {
        Ok(()) => ctx.reply("✅ Deleted", Some(&account_button(&ctx))).await,
        Err(e) => {
            log::warn!("Failed to remove wallet of user {}: {}", ctx.user.id, e);
            ctx.send("Something went wrong deleting your wallet details.", None).await
        }
    };
    if let Err(e) = reply {
        log::warn!("Failed to confirm wallet removal for user {}: {}", ctx.user.id, e);
    }
}

/// Personal table of every XP title: week, month and all-time.
pub fn xp_table(rows: &[crate::storage::UserXp]) -> String {
    let width = rows.iter().map(|r| r.title.chars().count()).max().unwrap_or(0).max(5);
    let mut text = format!("{:<width$} {:>6} {:>6} {:>6}\n", "Title", "Week", "Month", "All");
    for row in rows {
        let _ = writeln!(
            text,
            "{:<width$} {:>6} {:>6} {:>6}",
            row.title,
            row.for_period(XpPeriod::Week),
            row.for_period(XpPeriod::Month),
            row.for_period(XpPeriod::All),
        );
    }
    text
}

async fn show_xp(ctx: Ctx, _path: CommandPath) {
    let rows = match ctx.store().user_xp(ctx.user.id) {
        Ok(rows) => rows,
        Err(e) => {
            log::warn!("Failed to load XP of user {}: {}", ctx.user.id, e);
            return;
        }
    };

    let text = if rows.is_empty() {
        format!("<b>{XP_TITLE}</b>\n\nNo XP yet. Go play some /games!")
    } else {
        format!("<b>{XP_TITLE}</b>\n\n<pre>{}</pre>", escape_html(&xp_table(&rows)))
    };
    let owner = ctx.user.id.to_string();
    let markup = Keyboard::from_options(&vec![keyboard::nav_row(PATH)], &[("user", owner.as_str())]);

    if let Err(e) = ctx.reply(&text, Some(&markup)).await {
        log::warn!("Failed to show XP of user {}: {}", ctx.user.id, e);
    }
}
