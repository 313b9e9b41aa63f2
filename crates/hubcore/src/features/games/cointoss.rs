use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use strum::{Display, EnumIter, EnumString};

use super::{invite_keyboard, payload, reward, show, Game, GameCore, GameState, GameTable};
use crate::core::error::HubResult;
use crate::hub::Ctx;
use crate::router::keyboard::{self, Keyboard};
use crate::session::interaction::{Interaction, Interactive};
use crate::session::manager::SessionManager;
use crate::session::path::CommandPath;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Coin {
    Heads,
    Tails,
}

impl Coin {
    pub fn emoji(self) -> &'static str {
        match self {
            Coin::Heads => "🙉",
            Coin::Tails => "🐒",
        }
    }
}

/// One fair flip.
pub fn flip<R: Rng + ?Sized>(rng: &mut R) -> Coin {
    if rng.gen_bool(0.5) {
        Coin::Heads
    } else {
        Coin::Tails
    }
}

/// Seat of the winner: the chooser if the call was right, else the other seat.
pub fn resolve(chooser: usize, call: Coin, outcome: Coin) -> usize {
    if call == outcome {
        chooser
    } else {
        1 - chooser
    }
}

pub struct CoinToss {
    core: GameCore,
    chooser: Option<usize>,
    rng: StdRng,
}

impl CoinToss {
    /// Seat that calls the toss, drawn on first access.
    fn chooser(&mut self) -> usize {
        *self.chooser.get_or_insert_with(|| self.rng.gen_range(0..2))
    }

    async fn accept(&mut self, ctx: &Ctx) -> bool {
        if !self.is(GameState::Accept) || !self.core.can_accept(ctx) {
            return false;
        }

        self.core.seats.seat(ctx.user.clone());
        let chooser = self.chooser();
        let id = self.core.id;
        let heads = payload(Self::SEGMENT, "heads", id);
        let tails = payload(Self::SEGMENT, "tails", id);
        let markup = Keyboard::from_options(&vec![keyboard::row(&[
            ("🙉 Heads", heads.as_str()),
            ("🐒 Tails", tails.as_str()),
        ])], &[]);
        let text = format!("{}, heads or tails?", self.core.seats.name(chooser));

        if let Err(e) = show(ctx, self.anchor(), &text, Some(&markup)).await {
            log::warn!("Cointoss {}: failed to start: {}", id, e);
            self.core.seats.unseat();
            return false;
        }

        self.mutate(GameState::Toss, None);
        true
    }

    async fn toss(&mut self, ctx: &Ctx, call: Coin) -> bool {
        if !self.is(GameState::Toss) {
            return false;
        }
        let chooser = self.chooser();
        if !self.core.seats.holds(chooser, ctx.user.id) {
            log::debug!("Cointoss {}: user {} is not the chooser", self.core.id, ctx.user.id);
            return false;
        }

        let anchor = self.anchor();
        let mut text = format!(
            "{}: {}\n{} chooses {} ...",
            Self::TITLE,
            self.core.seats.versus(),
            self.core.seats.name(chooser),
            call.emoji()
        );
        if let Err(e) = show(ctx, anchor, &text, None).await {
            log::warn!("Cointoss {}: failed to show call: {}", self.core.id, e);
            return false;
        }
        self.mutate(GameState::Done, None);

        let throttle = ctx.config().move_throttle;
        tokio::time::sleep(throttle).await;

        let outcome = flip(&mut self.rng);
        let winner = resolve(chooser, call, outcome);
        let prize = ctx.config().win_reward;
        let xp = if self.core.seats.distinct() && prize > 0 {
            format!(" +{prize} XP")
        } else {
            String::new()
        };

        text.push_str(&format!("\n\nThe coin lands... {}", outcome.emoji()));
        if let Err(e) = show(ctx, anchor, &text, None).await {
            log::warn!("Cointoss {}: failed to show outcome: {}", self.core.id, e);
        }
        tokio::time::sleep(throttle).await;

        text.push_str(&format!("\n\n{} wins!{}", self.core.seats.name(winner), xp));
        match show(ctx, anchor, &text, None).await {
            Ok(_) => {
                reward(ctx, &self.core.seats, winner, prize);
            }
            Err(e) => log::warn!("Cointoss {}: failed to announce winner: {}", self.core.id, e),
        }
        true
    }
}

impl Interactive for CoinToss {
    type State = GameState;

    fn interaction(&self) -> &Interaction<GameState> {
        &self.core.interaction
    }

    fn interaction_mut(&mut self) -> &mut Interaction<GameState> {
        &mut self.core.interaction
    }
}

#[async_trait]
impl Game for CoinToss {
    const SEGMENT: &'static str = "cointoss";
    const TITLE: &'static str = "🪙 Cointoss";

    fn create(ctx: &Ctx) -> Self {
        Self {
            core: GameCore::new(ctx.user.clone()),
            chooser: None,
            rng: StdRng::seed_from_u64(ctx.hub.next_seed()),
        }
    }

    fn table(sessions: &SessionManager) -> &GameTable<Self> {
        &sessions.cointoss
    }

    async fn request(&mut self, ctx: &Ctx) -> HubResult<()> {
        let text = format!("{} wants to toss a coin...", self.core.seats.name(0));
        let anchor = ctx.reply(&text, Some(&invite_keyboard(Self::SEGMENT, self.core.id))).await?;
        self.mutate(GameState::Accept, Some(anchor));
        Ok(())
    }

    async fn on_action(&mut self, ctx: &Ctx, action: &str, _path: &mut CommandPath) -> bool {
        if action == "accept" {
            return self.accept(ctx).await;
        }
        match action.parse::<Coin>() {
            Ok(call) => self.toss(ctx, call).await,
            Err(_) => false,
        }
    }
}
