//! Leaderboards, one sub-menu per XP title.

use std::fmt::Write as _;
use std::sync::Arc;

use crate::core::config;
use crate::hub::Ctx;
use crate::router::keyboard::{self, Keyboard, Options};
use crate::router::menu::Router;
use crate::router::{action, mount, Action};
use crate::session::path::CommandPath;
use crate::storage::{LeaderboardRow, XpPeriod};
use crate::transport::escape_html;

pub const TITLE: &str = "📊 Stats";
pub const PATH: &str = "stats";

fn titles(ctx: &Ctx) -> Vec<String> {
    match ctx.store().xp_titles() {
        Ok(titles) => titles,
        Err(e) => {
            log::warn!("Failed to list XP titles: {}", e);
            Vec::new()
        }
    }
}

fn period_icon(period: XpPeriod) -> &'static str {
    match period {
        XpPeriod::All => "⏳",
        XpPeriod::Month => "📆",
        XpPeriod::Week => "📰",
    }
}

pub fn router() -> Arc<Router> {
    Arc::new(
        Router::new(TITLE, PATH)
            .dynamic_actions(|ctx: &Ctx, _path: &CommandPath| {
                titles(ctx)
                    .into_iter()
                    .map(|title| {
                        let board = title_router(&title);
                        (title, board)
                    })
                    .collect()
            })
            .dynamic_options(|ctx: &Ctx, _path: &CommandPath| {
                let mut options: Options = titles(ctx)
                    .iter()
                    .map(|title| keyboard::row(&[(title.as_str(), title.as_str())]))
                    .collect();
                options.push(keyboard::nav_row(".."));
                options
            }),
    )
}

/// All-time, monthly and weekly tables of one title.
fn title_router(title: &str) -> Action {
    let mut router = Router::new(title, format!("{PATH}/{title}"))
        .public_options(vec![
            keyboard::row(&[("⏳ All-Time", "all")]),
            keyboard::row(&[("📆 Monthly", "month")]),
            keyboard::row(&[("📰 This Week", "week")]),
            keyboard::nav_row(".."),
        ])
        .public_only();

    for period in [XpPeriod::All, XpPeriod::Month, XpPeriod::Week] {
        let title = title.to_string();
        router = router.action(
            period.to_string(),
            action(move |ctx: Ctx, _path: CommandPath| {
                let title = title.clone();
                async move { send_table(ctx, &title, period).await }
            }),
        );
    }
    mount(Arc::new(router))
}

pub fn render_table(title: &str, period: XpPeriod, rows: &[LeaderboardRow]) -> String {
    let mut text = format!(
        "<b>{} {} - {}</b>\n\n",
        period_icon(period),
        period.label(),
        escape_html(title)
    );
    if rows.is_empty() {
        text.push_str("Nobody here yet.");
        return text;
    }
    for (i, row) in rows.iter().enumerate() {
        let name = escape_html(&row.name);
        if i == 0 {
            let _ = writeln!(text, "👑 {} - {}", name, row.xp);
        } else {
            let _ = writeln!(text, "{}. {} - {}", i + 1, name, row.xp);
        }
    }
    text
}

async fn send_table(ctx: Ctx, title: &str, period: XpPeriod) {
    let rows = match ctx.store().top_xp(title, period, config::xp::LEADERBOARD_SIZE) {
        Ok(rows) => rows,
        Err(e) => {
            log::warn!("Failed to load {} leaderboard for {}: {}", period, title, e);
            return;
        }
    };

    let owner = ctx.user.id.to_string();
    let back = format!("{PATH}/{title}");
    let markup = Keyboard::from_options(&vec![keyboard::nav_row(&back)], &[("user", owner.as_str())]);

    if let Err(e) = ctx.reply(&render_table(title, period, &rows), Some(&markup)).await {
        log::warn!("Failed to send {} leaderboard: {}", title, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_table_crowns_first_place() {
        let rows = vec![
            LeaderboardRow {
                user_id: 1,
                name: "@ann".into(),
                xp: 300,
            },
            LeaderboardRow {
                user_id: 2,
                name: "Bob <3".into(),
                xp: 100,
            },
        ];
        assert_eq!(
            render_table("🎮 Games XP", XpPeriod::Week, &rows),
            "<b>📰 This Week - 🎮 Games XP</b>\n\n👑 @ann - 300\n2. Bob &lt;3 - 100\n"
        );
    }

    #[test]
    fn test_render_empty_table() {
        assert!(render_table("x", XpPeriod::All, &[]).ends_with("Nobody here yet."));
    }
}
