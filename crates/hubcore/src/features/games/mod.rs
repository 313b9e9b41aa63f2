//! Turn-based games sharing one request / accept / play protocol.
//!
//! Payloads look like `games/<game>/<action>/<game id>[/args]`, where the game
//! id is the initiating user's id. Every move takes the game's own lock
//! without waiting; a move that finds the lock taken is dropped.

pub mod board;
pub mod cointoss;
pub mod connect_four;
pub mod rps;

use async_trait::async_trait;
use std::sync::Arc;

use crate::core::config;
use crate::core::error::HubResult;
use crate::hub::Ctx;
use crate::router::keyboard::{self, Keyboard, Options};
use crate::router::menu::Router;
use crate::router::{action, Action};
use crate::session::interaction::{Interaction, Interactive};
use crate::session::manager::SessionManager;
use crate::session::path::CommandPath;
use crate::session::registry::SessionRegistry;
use crate::transport::{Actor, MessageRef};

pub use cointoss::CoinToss;
pub use connect_four::ConnectFour;
pub use rps::RockPaperScissors;

pub const TITLE: &str = "🎮 Games";
pub const PATH: &str = "games";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameState {
    /// Created, invite not posted yet
    Request,
    /// Invite posted, waiting for a second player
    Accept,
    Play,
    /// Coin toss only: waiting for the chooser's call
    Toss,
    Done,
}

/// Live games of one kind, keyed by the initiating user's id.
pub type GameTable<G> = SessionRegistry<i64, G>;

/// The two seats of a game. Seat 0 is the initiator.
#[derive(Debug, Clone)]
pub struct Seats {
    players: [Option<Actor>; 2],
}

impl Seats {
    pub fn new(host: Actor) -> Self {
        Self {
            players: [Some(host), None],
        }
    }

    pub fn host(&self) -> Option<&Actor> {
        self.players[0].as_ref()
    }

    pub fn get(&self, seat: usize) -> Option<&Actor> {
        self.players.get(seat)?.as_ref()
    }

    pub fn seat(&mut self, guest: Actor) {
        self.players[1] = Some(guest);
    }

    pub fn unseat(&mut self) {
        self.players[1] = None;
    }

    pub fn is_full(&self) -> bool {
        self.players.iter().all(Option::is_some)
    }

    /// Whether `user_id` sits on `seat`.
    pub fn holds(&self, seat: usize, user_id: i64) -> bool {
        self.get(seat).is_some_and(|p| p.id == user_id)
    }

    /// Both seats held by different users.
    pub fn distinct(&self) -> bool {
        match (&self.players[0], &self.players[1]) {
            (Some(a), Some(b)) => a.id != b.id,
            _ => false,
        }
    }

    pub fn name(&self, seat: usize) -> String {
        self.get(seat).map(Actor::display_name).unwrap_or_else(|| "?".to_string())
    }

    /// Plain-text name for button labels.
    pub fn label(&self, seat: usize) -> String {
        match self.get(seat) {
            Some(Actor {
                username: Some(username), ..
            }) => format!("@{username}"),
            Some(actor) => actor.first_name.clone(),
            None => "?".to_string(),
        }
    }

    /// `@host vs @guest`
    pub fn versus(&self) -> String {
        format!("{} vs {}", self.name(0), self.name(1))
    }
}

/// Common fields of every game.
#[derive(Debug, Clone)]
pub struct GameCore {
    pub interaction: Interaction<GameState>,
    pub id: i64,
    pub seats: Seats,
}

impl GameCore {
    pub fn new(host: Actor) -> Self {
        Self {
            interaction: Interaction::new(GameState::Request),
            id: host.id,
            seats: Seats::new(host),
        }
    }

    /// In groups the initiator cannot accept their own invite.
    pub fn can_accept(&self, ctx: &Ctx) -> bool {
        ctx.is_private() || ctx.user.id != self.id
    }
}

#[async_trait]
pub trait Game: Interactive<State = GameState> + Send + Sized + 'static {
    /// Path segment under `games/`.
    const SEGMENT: &'static str;
    const TITLE: &'static str;

    /// A fresh game initiated by `ctx.user`.
    fn create(ctx: &Ctx) -> Self;

    fn table(sessions: &SessionManager) -> &GameTable<Self>;

    /// Posts the invite. On error the game is discarded.
    async fn request(&mut self, ctx: &Ctx) -> HubResult<()>;

    /// Applies one move. `path` holds whatever follows the game id.
    /// Returns `true` if the move was accepted.
    async fn on_action(&mut self, ctx: &Ctx, action: &str, path: &mut CommandPath) -> bool;
}

pub fn payload(segment: &str, action: &str, id: i64) -> String {
    format!("{PATH}/{segment}/{action}/{id}")
}

pub fn invite_keyboard(segment: &str, id: i64) -> Keyboard {
    let accept = payload(segment, "accept", id);
    Keyboard::from_options(&vec![keyboard::row(&[("Play!", accept.as_str())])], &[])
}

/// Edits the game's message, or posts it when the game has none yet.
pub async fn show(ctx: &Ctx, anchor: Option<MessageRef>, text: &str, markup: Option<&Keyboard>) -> HubResult<MessageRef> {
    match anchor {
        Some(anchor) => {
            ctx.transport().send_edit(anchor, text, markup).await?;
            Ok(anchor)
        }
        None => ctx.reply(text, markup).await,
    }
}

/// Grants the win reward. Games between one user and themselves earn nothing.
pub fn reward(ctx: &Ctx, seats: &Seats, winner: usize, xp: i64) -> Option<i64> {
    if !seats.distinct() || xp <= 0 {
        return None;
    }
    let player = seats.get(winner)?;
    ctx.hub.award_xp(player.id, config::xp::GAMES_TITLE, xp);
    Some(xp)
}

/// Routes one game payload.
pub async fn desk<G: Game>(ctx: Ctx, mut path: CommandPath) {
    let table = G::table(ctx.sessions());
    table.sweep();

    let action = path.take();
    if action.is_empty() {
        open::<G>(&ctx).await;
        return;
    }

    let raw_id = path.take();
    let Ok(id) = raw_id.parse::<i64>() else {
        log::debug!("{}: invalid game id {:?}", G::TITLE, raw_id);
        return;
    };

    let Some(slot) = table.get(&id) else {
        log::debug!("{}: game {} does not exist", G::TITLE, id);
        return;
    };

    let Ok(mut game) = slot.try_lock() else {
        log::debug!("{}: game {} busy, dropped {:?} from user {}", G::TITLE, id, action, ctx.user.id);
        return;
    };

    if !game.on_action(&ctx, &action, &mut path).await {
        return;
    }

    if game.is(GameState::Done) {
        table.remove(&id);
        log::info!("{}: game {} finished", G::TITLE, id);
    }

    tokio::time::sleep(ctx.config().move_throttle).await;
}

async fn open<G: Game>(ctx: &Ctx) {
    let table = G::table(ctx.sessions());
    let Some(slot) = table.try_create(ctx.user.id, G::create(ctx)) else {
        log::debug!("{}: user {} already has a live game", G::TITLE, ctx.user.id);
        return;
    };

    let mut game = slot.lock().await;
    if let Err(e) = game.request(ctx).await {
        log::warn!("{}: failed to post invite for user {}: {}", G::TITLE, ctx.user.id, e);
        drop(game);
        table.remove(&ctx.user.id);
    }
}

fn desk_action<G: Game>() -> Action {
    action(desk::<G>)
}

pub fn router(config: &config::HubConfig) -> Arc<Router> {
    let options: Options = vec![
        keyboard::row(&[(CoinToss::TITLE, CoinToss::SEGMENT)]),
        keyboard::row(&[(RockPaperScissors::TITLE, RockPaperScissors::SEGMENT)]),
        keyboard::row(&[(ConnectFour::TITLE, ConnectFour::SEGMENT)]),
        keyboard::nav_row(".."),
    ];

    Arc::new(
        Router::new(TITLE, PATH)
            .action(CoinToss::SEGMENT, desk_action::<CoinToss>())
            .action(RockPaperScissors::SEGMENT, desk_action::<RockPaperScissors>())
            .action(ConnectFour::SEGMENT, desk_action::<ConnectFour>())
            .public_options(options)
            .public_cooldown(config.games_menu_cooldown)
            .public_only(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_layout() {
        assert_eq!(payload("connect4", "3", 42), "games/connect4/3/42");
        let markup = invite_keyboard("cointoss", 7);
        assert_eq!(markup.rows[0][0].data(), Some("games/cointoss/accept/7"));
    }

    #[test]
    fn test_seats() {
        let mut seats = Seats::new(Actor::new(1, "Ann"));
        assert!(!seats.is_full());
        assert!(!seats.distinct());
        seats.seat(Actor::new(1, "Ann"));
        assert!(seats.is_full());
        assert!(!seats.distinct());
        seats.seat(Actor::new(2, "Bob"));
        assert!(seats.distinct());
        assert!(seats.holds(1, 2));
        assert!(!seats.holds(0, 2));
        assert_eq!(seats.versus(), "Ann vs Bob");
        seats.unseat();
        assert!(seats.get(1).is_none());
    }
}
