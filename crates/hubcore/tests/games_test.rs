//! Game flows driven through the hub, the way button presses arrive.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::time::Duration;

use common::{ann, bob, group, Fixture, GROUP};
use hubcore::testing::Sent;
use hubcore::MessageRef;

const INVITE: MessageRef = MessageRef {
    chat_id: GROUP,
    message_id: 1,
};

async fn open(fx: &Fixture, game: &str) {
    fx.press(group(), &ann(), None, &format!("games/{game}")).await;
    assert_eq!(fx.last().at(), Some(INVITE));
}

fn edits(fx: &Fixture) -> Vec<Sent> {
    fx.transport
        .sent()
        .into_iter()
        .filter(|s| matches!(s, Sent::Edit { .. }))
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_cointoss_end_to_end() {
    let fx = Fixture::new();
    open(&fx, "cointoss").await;
    assert_eq!(fx.last_text(), "Ann wants to toss a coin...");
    let accept = fx.button("Play!");
    assert_eq!(accept, "games/cointoss/accept/1");

    // the initiator cannot accept in a group
    fx.press(group(), &ann(), Some(INVITE), &accept).await;
    assert_eq!(fx.transport.sent().len(), 1);

    fx.press(group(), &bob(), Some(INVITE), &accept).await;
    let prompt = fx.last_text();
    assert!(prompt.ends_with(", heads or tails?"), "{prompt}");
    let (chooser, other) = if prompt.starts_with("Ann") { (ann(), bob()) } else { (bob(), ann()) };

    // only the chooser may call
    let heads = fx.button("Heads");
    fx.press(group(), &other, Some(INVITE), &heads).await;
    assert_eq!(edits(&fx).len(), 1);

    fx.press(group(), &chooser, Some(INVITE), &heads).await;
    let calls = edits(&fx);
    assert_eq!(calls.len(), 4);
    let result = fx.last_text();
    assert!(result.contains("chooses 🙉"));
    assert!(result.contains("The coin lands..."));
    assert!(result.ends_with("wins! +100 XP"), "{result}");

    let winner = if result.contains("Ann wins!") { ann() } else { bob() };
    let loser = if winner.id == ann().id { bob() } else { ann() };
    assert_eq!(fx.games_xp(winner.id), 100);
    assert_eq!(fx.games_xp(loser.id), 0);
    assert!(fx.hub.sessions().cointoss.is_empty());

    // a finished game ignores further presses
    fx.press(group(), &chooser, Some(INVITE), &heads).await;
    assert_eq!(edits(&fx).len(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_cointoss_unannounced_win_earns_nothing() {
    let fx = Fixture::new();
    open(&fx, "cointoss").await;
    let accept = fx.button("Play!");
    fx.press(group(), &bob(), Some(INVITE), &accept).await;
    let chooser = if fx.last_text().starts_with("Ann") { ann() } else { bob() };

    // call and outcome edits land, the winner announcement does not
    fx.transport.fail_edits_after(2, 1);
    let heads = fx.button("Heads");
    fx.press(group(), &chooser, Some(INVITE), &heads).await;

    let result = fx.last_text();
    assert!(result.contains("The coin lands..."), "{result}");
    assert!(!result.contains("wins!"), "{result}");
    assert_eq!(edits(&fx).len(), 3);
    assert_eq!(fx.games_xp(ann().id), 0);
    assert_eq!(fx.games_xp(bob().id), 0);
    assert!(fx.hub.sessions().cointoss.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_one_live_game_per_initiator() {
    let fx = Fixture::new();
    open(&fx, "cointoss").await;
    fx.press(group(), &ann(), None, "games/cointoss").await;
    assert_eq!(fx.transport.sent().len(), 1);
    assert_eq!(fx.hub.sessions().cointoss.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_expired_invite_is_dropped() {
    let fx = Fixture::new();
    open(&fx, "cointoss").await;
    let accept = fx.button("Play!");

    tokio::time::advance(fx.hub.config().cointoss_ttl + Duration::from_secs(1)).await;
    fx.press(group(), &bob(), Some(INVITE), &accept).await;

    assert_eq!(fx.transport.sent().len(), 1);
    assert!(fx.hub.sessions().cointoss.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_failed_invite_discards_game() {
    let fx = Fixture::new();
    fx.transport.fail_sends(1);
    fx.press(group(), &ann(), None, "games/connect4").await;
    assert!(fx.transport.sent().is_empty());
    assert!(fx.hub.sessions().connect_four.is_empty());

    open(&fx, "connect4").await;
}

#[tokio::test(start_paused = true)]
async fn test_rps_best_of_three() {
    let fx = Fixture::new();
    open(&fx, "rockpaperscissors").await;
    fx.press(group(), &bob(), Some(INVITE), "games/rockpaperscissors/accept/1").await;

    let mv = |name: &str, seat: usize| format!("games/rockpaperscissors/{name}/1/{seat}");
    let rounds = [("rock", "scissors"), ("paper", "paper"), ("scissors", "paper")];

    // Bob cannot press on Ann's column
    fx.press(group(), &bob(), Some(INVITE), &mv("rock", 0)).await;
    assert_eq!(edits(&fx).len(), 1);

    for (a, b) in rounds {
        fx.press(group(), &ann(), Some(INVITE), &mv(a, 0)).await;
        // a second move in the same round is refused
        fx.press(group(), &ann(), Some(INVITE), &mv("rock", 0)).await;
        fx.press(group(), &bob(), Some(INVITE), &mv(b, 1)).await;
    }

    let result = fx.last_text();
    assert!(result.contains("🪨 ✂️ | 🟢 🔴"), "{result}");
    assert!(result.contains("📜 📜 | ⚪️ ⚪️"), "{result}");
    assert!(result.contains("Ann 2 - 0 Bob"), "{result}");
    assert!(result.ends_with("Ann wins! +200 XP"), "{result}");
    assert!(fx.last().keyboard().is_none());
    assert_eq!(fx.games_xp(1), 200);
    assert!(fx.hub.sessions().rps.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_duplicate_move_applies_once() {
    let fx = Fixture::new();
    open(&fx, "rockpaperscissors").await;
    fx.press(group(), &bob(), Some(INVITE), "games/rockpaperscissors/accept/1").await;
    fx.transport.clear();
    fx.transport.set_delay(Duration::from_millis(100));

    let player = ann();
    let rock = fx.press(group(), &player, Some(INVITE), "games/rockpaperscissors/rock/1/0");
    let paper = fx.press(group(), &player, Some(INVITE), "games/rockpaperscissors/paper/1/0");
    tokio::join!(rock, paper);

    let sent = fx.transport.sent();
    assert_eq!(sent.len(), 1);
    let keyboard = sent[0].keyboard().unwrap();
    assert!(keyboard.rows[0][0].text.starts_with("✅"));
}

#[tokio::test(start_paused = true)]
async fn test_connect_four_vertical_win() {
    let fx = Fixture::new();
    open(&fx, "connect4").await;
    fx.press(group(), &bob(), Some(INVITE), "games/connect4/accept/1").await;
    assert!(fx.last_text().starts_with("🟣🟠 Connect 4\n(P1) Ann vs Bob (P2)"));

    // out of turn
    fx.press(group(), &bob(), Some(INVITE), "games/connect4/1/1").await;
    assert_eq!(edits(&fx).len(), 1);

    for _ in 0..3 {
        fx.press(group(), &ann(), Some(INVITE), "games/connect4/0/1").await;
        fx.press(group(), &bob(), Some(INVITE), "games/connect4/1/1").await;
    }
    fx.press(group(), &ann(), Some(INVITE), "games/connect4/0/1").await;

    let result = fx.last_text();
    assert_eq!(result.matches("🟢").count(), 4);
    assert!(result.ends_with("Ann wins! 🟣 +100 XP"), "{result}");
    assert_eq!(fx.games_xp(1), 100);
    assert!(fx.hub.sessions().connect_four.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_connect_four_failed_edit_rolls_back() {
    let fx = Fixture::new();
    open(&fx, "connect4").await;
    fx.press(group(), &bob(), Some(INVITE), "games/connect4/accept/1").await;

    fx.transport.fail_edits(1);
    fx.press(group(), &ann(), Some(INVITE), "games/connect4/3/1").await;
    assert_eq!(edits(&fx).len(), 1);

    // still Ann's turn, and the column is still empty
    fx.press(group(), &ann(), Some(INVITE), "games/connect4/3/1").await;
    let board = fx.last_text();
    assert_eq!(board.matches("🟣").count(), 2);
    assert_eq!(board.matches("🟠").count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_games_menu_cooldown_in_groups() {
    let fx = Fixture::new();
    fx.say(group(), &ann(), "/games").await;
    assert_eq!(fx.last_text(), "<b>🎮 Games</b>");
    let before = fx.transport.sent().len();

    fx.say(group(), &bob(), "/games").await;
    assert_eq!(fx.transport.sent().len(), before);

    tokio::time::advance(fx.hub.config().games_menu_cooldown).await;
    fx.say(group(), &bob(), "/games").await;
    assert_eq!(fx.transport.sent().len(), before + 1);
}
