use async_trait::async_trait;
use std::cmp::Ordering;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use super::{invite_keyboard, payload, reward, show, Game, GameCore, GameState, GameTable};
use crate::core::error::HubResult;
use crate::hub::Ctx;
use crate::router::keyboard::{Button, Keyboard};
use crate::session::interaction::{Interaction, Interactive};
use crate::session::manager::SessionManager;
use crate::session::path::CommandPath;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Move {
    Rock,
    Paper,
    Scissors,
}

impl Move {
    pub fn emoji(self) -> &'static str {
        match self {
            Move::Rock => "🪨",
            Move::Paper => "📜",
            Move::Scissors => "✂️",
        }
    }

    fn beats(self, other: Move) -> bool {
        matches!(
            (self, other),
            (Move::Rock, Move::Scissors) | (Move::Scissors, Move::Paper) | (Move::Paper, Move::Rock)
        )
    }
}

/// `1` if `a` beats `b`, `-1` if `b` beats `a`, `0` on a tie.
pub fn compare(a: Move, b: Move) -> i8 {
    if a.beats(b) {
        1
    } else if b.beats(a) {
        -1
    } else {
        0
    }
}

/// Round wins per seat.
pub fn tally(rounds: &[[Option<Move>; 2]]) -> (u32, u32) {
    rounds.iter().fold((0, 0), |(a, b), round| match round {
        [Some(x), Some(y)] => match compare(*x, *y) {
            1 => (a + 1, b),
            -1 => (a, b + 1),
            _ => (a, b),
        },
        _ => (a, b),
    })
}

pub struct RockPaperScissors {
    core: GameCore,
    total_rounds: usize,
    /// Index of the round being played
    round: usize,
    moves: Vec<[Option<Move>; 2]>,
}

impl RockPaperScissors {
    fn current(&self) -> Option<&[Option<Move>; 2]> {
        self.moves.get(self.round)
    }

    fn text(&self) -> String {
        let mut text = format!("{}\n(P1) {} (P2)\n\n", Self::TITLE, self.core.seats.versus());
        for [a, b] in self.moves.iter().take(self.round) {
            if let (Some(a), Some(b)) = (a, b) {
                let result = match compare(*a, *b) {
                    1 => "🟢 🔴",
                    -1 => "🔴 🟢",
                    _ => "⚪️ ⚪️",
                };
                text.push_str(&format!("{} {} | {}\n", a.emoji(), b.emoji(), result));
            }
        }
        text
    }

    /// One row per move; each seat presses on its own column.
    fn keyboard(&self) -> Keyboard {
        let played = self.current().copied().unwrap_or([None, None]);
        let label = |seat: usize| {
            if played[seat].is_some() {
                "✅".to_string()
            } else {
                self.core.seats.label(seat)
            }
        };
        let (left, right) = (label(0), label(1));

        let rows = Move::iter()
            .map(|mv| {
                let data = payload(Self::SEGMENT, &mv.to_string(), self.core.id);
                vec![
                    Button::callback(format!("{} {}", left, mv.emoji()), format!("{data}/0")),
                    Button::callback(format!("{} {}", mv.emoji(), right), format!("{data}/1")),
                ]
            })
            .collect();
        Keyboard::new(rows)
    }

    async fn accept(&mut self, ctx: &Ctx) -> bool {
        if !self.is(GameState::Accept) || !self.core.can_accept(ctx) {
            return false;
        }

        self.core.seats.seat(ctx.user.clone());
        self.mutate(GameState::Play, None);

        if let Err(e) = show(ctx, self.anchor(), &self.text(), Some(&self.keyboard())).await {
            log::warn!("RPS {}: failed to start: {}", self.core.id, e);
            self.core.seats.unseat();
            self.mutate(GameState::Accept, None);
            return false;
        }
        true
    }

    async fn play(&mut self, ctx: &Ctx, mv: Move, seat: usize) -> bool {
        if !self.is(GameState::Play) || !self.core.seats.holds(seat, ctx.user.id) {
            return false;
        }
        let round = self.round;
        if self.moves.get(round).map_or(true, |m| m[seat].is_some()) {
            return false;
        }

        self.moves[round][seat] = Some(mv);
        if let Err(e) = show(ctx, self.anchor(), &self.text(), Some(&self.keyboard())).await {
            log::warn!("RPS {}: failed to record move: {}", self.core.id, e);
            self.moves[round][seat] = None;
            return false;
        }
        self.touch();

        if self.moves[round].iter().all(Option::is_some) {
            tokio::time::sleep(ctx.config().move_throttle).await;
            self.next_round(ctx).await;
        }
        true
    }

    async fn next_round(&mut self, ctx: &Ctx) {
        self.round += 1;
        if self.round >= self.total_rounds {
            self.finish(ctx).await;
            return;
        }

        self.mutate(GameState::Play, None);
        // stale keyboards carry the same payloads, so the game goes on even if this edit fails
        if let Err(e) = show(ctx, self.anchor(), &self.text(), Some(&self.keyboard())).await {
            log::warn!("RPS {}: failed to show round {}: {}", self.core.id, self.round + 1, e);
        }
    }

    async fn finish(&mut self, ctx: &Ctx) {
        self.mutate(GameState::Done, None);

        let (a, b) = tally(&self.moves);
        let mut text = self.text();
        text.push_str(&format!(
            "\n{} {} - {} {}\n",
            self.core.seats.name(0),
            a,
            b,
            self.core.seats.name(1)
        ));

        let outcome = match a.cmp(&b) {
            Ordering::Greater => Some((0, a - b)),
            Ordering::Less => Some((1, b - a)),
            Ordering::Equal => None,
        };
        match outcome {
            Some((winner, margin)) => {
                let xp = reward(ctx, &self.core.seats, winner, ctx.config().win_reward * i64::from(margin))
                    .map(|xp| format!(" +{xp} XP"))
                    .unwrap_or_default();
                text.push_str(&format!("{} wins!{}", self.core.seats.name(winner), xp));
            }
            None => text.push_str("Draw 🥴"),
        }

        if let Err(e) = show(ctx, self.anchor(), &text, None).await {
            log::warn!("RPS {}: failed to announce result: {}", self.core.id, e);
        }
    }
}

impl Interactive for RockPaperScissors {
    type State = GameState;

    fn interaction(&self) -> &Interaction<GameState> {
        &self.core.interaction
    }

    fn interaction_mut(&mut self) -> &mut Interaction<GameState> {
        &mut self.core.interaction
    }
}

#[async_trait]
impl Game for RockPaperScissors {
    const SEGMENT: &'static str = "rockpaperscissors";
    const TITLE: &'static str = "🪨 Rock, 📜 Paper, ✂️ Scissors";

    fn create(ctx: &Ctx) -> Self {
        let total_rounds = ctx.config().rps_rounds.max(1) as usize;
        Self {
            core: GameCore::new(ctx.user.clone()),
            total_rounds,
            round: 0,
            moves: vec![[None, None]; total_rounds],
        }
    }

    fn table(sessions: &SessionManager) -> &GameTable<Self> {
        &sessions.rps
    }

    async fn request(&mut self, ctx: &Ctx) -> HubResult<()> {
        let text = format!("{} wants to play 🪨 📜 ✂️", self.core.seats.name(0));
        let anchor = ctx.reply(&text, Some(&invite_keyboard(Self::SEGMENT, self.core.id))).await?;
        self.mutate(GameState::Accept, Some(anchor));
        Ok(())
    }

    async fn on_action(&mut self, ctx: &Ctx, action: &str, path: &mut CommandPath) -> bool {
        if action == "accept" {
            return self.accept(ctx).await;
        }
        let Ok(mv) = action.parse::<Move>() else {
            return false;
        };
        let Ok(seat) = path.take().parse::<usize>() else {
            return false;
        };
        self.play(ctx, mv, seat).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_is_antisymmetric() {
        for a in Move::iter() {
            assert_eq!(compare(a, a), 0);
            for b in Move::iter() {
                assert_eq!(compare(a, b), -compare(b, a), "{a} vs {b}");
            }
        }
        assert_eq!(compare(Move::Rock, Move::Scissors), 1);
        assert_eq!(compare(Move::Scissors, Move::Paper), 1);
        assert_eq!(compare(Move::Paper, Move::Rock), 1);
    }

    #[test]
    fn test_tally_counts_round_wins() {
        use Move::*;
        let rounds = [
            [Some(Rock), Some(Scissors)],
            [Some(Paper), Some(Paper)],
            [Some(Rock), Some(Paper)],
            [Some(Scissors), Some(Paper)],
        ];
        assert_eq!(tally(&rounds), (2, 1));
        assert_eq!(tally(&[[Some(Rock), None]]), (0, 0));
    }

    #[test]
    fn test_moves_parse_from_payload() {
        assert_eq!("scissors".parse::<Move>().unwrap(), Move::Scissors);
        assert_eq!(Move::Paper.to_string(), "paper");
    }
}
