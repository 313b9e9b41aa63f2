use async_trait::async_trait;

use super::board::{Board, Disc, COLUMNS, ROWS};
use super::{invite_keyboard, payload, reward, show, Game, GameCore, GameState, GameTable};
use crate::core::error::HubResult;
use crate::hub::Ctx;
use crate::router::keyboard::{Button, Keyboard};
use crate::session::interaction::{Interaction, Interactive};
use crate::session::manager::SessionManager;
use crate::session::path::CommandPath;

const COLOURS: [&str; 2] = ["🟣", "🟠"];
const WINNING: &str = "🟢";
const EMPTY: &str = "⚪️";

/// Payload action for inert buttons.
const IGNORE: &str = "ignore";

pub struct ConnectFour {
    core: GameCore,
    board: Board,
    turn: Disc,
}

impl ConnectFour {
    fn colour(disc: Disc) -> &'static str {
        COLOURS[disc.seat()]
    }

    fn text(&self) -> String {
        let mut text = format!("{}\n(P1) {} (P2)\n\n", Self::TITLE, self.core.seats.versus());
        for row in (0..ROWS).rev() {
            for col in 0..COLUMNS {
                let cell = match self.board.cell(col, row) {
                    Some(node) if node.winning => WINNING,
                    Some(node) => Self::colour(node.disc),
                    None => EMPTY,
                };
                text.push_str("  ");
                text.push_str(cell);
                text.push_str("  ");
            }
            text.push_str("\n\n");
        }
        text
    }

    fn keyboard(&self) -> Keyboard {
        let id = self.core.id;
        let columns = (0..COLUMNS)
            .map(|col| {
                if self.board.is_column_full(col) {
                    Button::callback("✅", payload(Self::SEGMENT, IGNORE, id))
                } else {
                    Button::callback("⬆️", payload(Self::SEGMENT, &col.to_string(), id))
                }
            })
            .collect();
        let turn = Button::callback(
            format!("{} {}", self.core.seats.label(self.turn.seat()), Self::colour(self.turn)),
            payload(Self::SEGMENT, IGNORE, id),
        );
        Keyboard::new(vec![columns, vec![turn]])
    }

    async fn accept(&mut self, ctx: &Ctx) -> bool {
        if !self.is(GameState::Accept) || !self.core.can_accept(ctx) {
            return false;
        }

        self.core.seats.seat(ctx.user.clone());
        self.mutate(GameState::Play, None);

        if let Err(e) = show(ctx, self.anchor(), &self.text(), Some(&self.keyboard())).await {
            log::warn!("Connect four {}: failed to start: {}", self.core.id, e);
            self.core.seats.unseat();
            self.mutate(GameState::Accept, None);
            return false;
        }
        true
    }

    async fn drop_disc(&mut self, ctx: &Ctx, col: usize) -> bool {
        if !self.is(GameState::Play) || !self.core.seats.holds(self.turn.seat(), ctx.user.id) {
            return false;
        }

        let snapshot = (self.board.clone(), self.turn);
        let mover = self.turn;
        let Some(outcome) = self.board.drop_disc(col, mover) else {
            return false;
        };

        let prize = ctx.config().win_reward;
        let mut text = self.text();
        let markup = if let Some(win) = &outcome.win {
            log::debug!("Connect four {}: {:?} wins on {}", self.core.id, mover, win.axis);
            let xp = if self.core.seats.distinct() {
                format!(" +{prize} XP")
            } else {
                String::new()
            };
            text.push_str(&format!(
                "{} wins! {}{}",
                self.core.seats.name(mover.seat()),
                Self::colour(mover),
                xp
            ));
            None
        } else if outcome.full {
            text.push_str("Draw 🥴");
            None
        } else {
            self.turn = mover.other();
            Some(self.keyboard())
        };

        if let Err(e) = show(ctx, self.anchor(), &text, markup.as_ref()).await {
            log::warn!("Connect four {}: failed to show move: {}", self.core.id, e);
            (self.board, self.turn) = snapshot;
            return false;
        }

        if outcome.win.is_some() {
            reward(ctx, &self.core.seats, mover.seat(), prize);
        }
        if outcome.win.is_some() || outcome.full {
            self.mutate(GameState::Done, None);
        } else {
            self.touch();
        }
        true
    }
}

impl Interactive for ConnectFour {
    type State = GameState;

    fn interaction(&self) -> &Interaction<GameState> {
        &self.core.interaction
    }

    fn interaction_mut(&mut self) -> &mut Interaction<GameState> {
        &mut self.core.interaction
    }
}

#[async_trait]
impl Game for ConnectFour {
    const SEGMENT: &'static str = "connect4";
    const TITLE: &'static str = "🟣🟠 Connect 4";

    fn create(ctx: &Ctx) -> Self {
        Self {
            core: GameCore::new(ctx.user.clone()),
            board: Board::new(),
            turn: Disc::First,
        }
    }

    fn table(sessions: &SessionManager) -> &GameTable<Self> {
        &sessions.connect_four
    }

    async fn request(&mut self, ctx: &Ctx) -> HubResult<()> {
        let text = format!("{} wants to play 🟣🟠🟣🟠", self.core.seats.name(0));
        let anchor = ctx.reply(&text, Some(&invite_keyboard(Self::SEGMENT, self.core.id))).await?;
        self.mutate(GameState::Accept, Some(anchor));
        Ok(())
    }

    async fn on_action(&mut self, ctx: &Ctx, action: &str, _path: &mut CommandPath) -> bool {
        match action {
            "accept" => self.accept(ctx).await,
            IGNORE => false,
            column => match column.parse::<usize>() {
                Ok(col) if col < COLUMNS => self.drop_disc(ctx, col).await,
                _ => false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::Actor;

    fn game() -> ConnectFour {
        let mut core = GameCore::new(Actor::new(1, "Ann"));
        core.seats.seat(Actor::new(2, "Bob"));
        ConnectFour {
            core,
            board: Board::new(),
            turn: Disc::First,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_column_renders_inert_button() {
        let mut game = game();
        for i in 0..ROWS {
            game.board.drop_disc(2, Disc::from_seat(i % 2));
        }
        let markup = game.keyboard();
        assert_eq!(markup.rows[0].len(), COLUMNS);
        assert_eq!(markup.rows[0][2].text, "✅");
        assert_eq!(markup.rows[0][2].data(), Some("games/connect4/ignore/1"));
        assert_eq!(markup.rows[0][3].data(), Some("games/connect4/3/1"));
        assert_eq!(markup.rows[1][0].text, "Ann 🟣");
    }

    #[tokio::test(start_paused = true)]
    async fn test_winning_run_is_highlighted() {
        let mut game = game();
        for _ in 0..3 {
            game.board.drop_disc(0, Disc::First);
            game.board.drop_disc(1, Disc::Second);
        }
        assert!(game.board.drop_disc(0, Disc::First).unwrap().win.is_some());
        let text = game.text();
        assert_eq!(text.matches(WINNING).count(), 4);
        assert_eq!(text.matches(COLOURS[1]).count(), 3 + 1);
        assert!(text.starts_with("🟣🟠 Connect 4\n(P1) Ann vs Bob (P2)"));
    }
}
