//! The hub: collaborators, session registries and routing tables shared by
//! every inbound event, plus the per-event [`Ctx`].

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::sync::{Arc, Mutex};

use crate::core::config::HubConfig;
use crate::core::cooldown::CooldownLocks;
use crate::core::error::HubResult;
use crate::features;
use crate::router::command::{CommandTable, InlineTable, ParsedCommand};
use crate::router::keyboard::Keyboard;
use crate::router::menu::Router;
use crate::session::hook::HookTable;
use crate::session::manager::SessionManager;
use crate::session::path::CommandPath;
use crate::storage::{User, UserStore};
use crate::transport::{Actor, ChatRef, IncomingMessage, MessageRef, Transport};

pub struct Hub {
    transport: Arc<dyn Transport>,
    store: Arc<dyn UserStore>,
    config: HubConfig,
    sessions: SessionManager,
    hooks: HookTable<Ctx>,
    cooldowns: CooldownLocks,
    root: Arc<Router>,
    commands: CommandTable,
    inline: InlineTable,
    bot_username: Option<String>,
    seeds: Mutex<StdRng>,
}

impl Hub {
    pub fn new(transport: Arc<dyn Transport>, store: Arc<dyn UserStore>, config: HubConfig) -> Self {
        let seeds = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            transport,
            store,
            sessions: SessionManager::new(&config),
            hooks: HookTable::new(),
            cooldowns: CooldownLocks::new(),
            root: features::hub_menu::root(&config),
            commands: features::hub_menu::commands(),
            inline: features::hub_menu::inline_queries(),
            bot_username: None,
            seeds: Mutex::new(seeds),
            config,
        }
    }

    /// Username used to recognise `/cmd@username` in groups.
    pub fn with_bot_username(mut self, username: impl Into<String>) -> Self {
        self.bot_username = Some(username.into());
        self
    }

    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    pub fn store(&self) -> &dyn UserStore {
        self.store.as_ref()
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn hooks(&self) -> &HookTable<Ctx> {
        &self.hooks
    }

    pub fn cooldowns(&self) -> &CooldownLocks {
        &self.cooldowns
    }

    pub fn root(&self) -> Arc<Router> {
        Arc::clone(&self.root)
    }

    pub fn bot_username(&self) -> Option<&str> {
        self.bot_username.as_deref()
    }

    /// Seed for one game's private RNG.
    pub fn next_seed(&self) -> u64 {
        let mut seeds = self.seeds.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        seeds.next_u64()
    }

    /// Drops expired cooldown locks, sessions and hooks. Expiry never
    /// depends on it; every lookup sweeps on its own.
    pub fn tidy(&self) -> usize {
        self.cooldowns.tidy() + self.sessions.sweep() + self.hooks.sweep()
    }

    /// Spawns the periodic tidy loop.
    pub fn spawn_maintenance(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let hub = Arc::clone(self);
        let every = crate::core::config::cooldown::tidy_interval();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            // first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = hub.tidy();
                if removed > 0 {
                    log::debug!("Tidied {} expired locks, sessions and hooks", removed);
                }
            }
        })
    }

    /// Adds `delta` XP under `title`. Failures are logged, never surfaced.
    pub fn award_xp(&self, user_id: i64, title: &str, delta: i64) {
        match self.store.shift_xp(user_id, title, delta) {
            Ok(row) => log::debug!("User {} now has {} {}", user_id, row.xp, title),
            Err(e) => log::warn!("Failed to award {} {} to user {}: {}", delta, title, user_id, e),
        }
    }

    /// Creates the user row on first contact and keeps names current.
    pub fn ensure_user(&self, actor: &Actor) {
        let result = match self.store.get_user(actor.id) {
            Ok(Some(mut user)) => {
                if user.username == actor.username && user.first_name == actor.first_name {
                    return;
                }
                user.username = actor.username.clone();
                user.first_name = actor.first_name.clone();
                self.store.save_user(&user)
            }
            Ok(None) => self.store.save_user(&User::from_actor(actor)),
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            log::warn!("Failed to record user {}: {}", actor.id, e);
        }
    }

    fn ctx(self: &Arc<Self>, chat: ChatRef, user: Actor, anchor: Option<MessageRef>) -> Ctx {
        Ctx {
            hub: Arc::clone(self),
            chat,
            user,
            anchor,
        }
    }

    /// Button press carrying `data`, attached to `anchor`.
    pub async fn handle_callback(self: &Arc<Self>, chat: ChatRef, user: Actor, anchor: Option<MessageRef>, data: &str) {
        self.ensure_user(&user);
        log::debug!("Callback {:?} from user {} in chat {}", data, user.id, chat.id);

        let path = CommandPath::parse(data);
        let ctx = self.ctx(chat, user, anchor);
        self.root().select(ctx, path).await;
    }

    /// Text or photo message.
    pub async fn handle_message(self: &Arc<Self>, chat: ChatRef, user: Actor, message: IncomingMessage) {
        self.ensure_user(&user);

        if !chat.is_private() {
            self.award_xp(user.id, crate::core::config::xp::ENGAGE_TITLE, self.config.engage_reward);
        }

        let ctx = self.ctx(chat, user, None);
        if self.hooks.dispatch(ctx.clone(), ctx.chat.id, ctx.user.id, &message).await {
            return;
        }

        let Some(text) = message.text.as_deref() else {
            return;
        };
        let Some(command) = ParsedCommand::parse(text, self.bot_username()) else {
            return;
        };
        if !self.commands.select(ctx, command.clone()).await {
            log::debug!("Unknown command /{}", command.name);
        }
    }

    /// Inline query typed in any chat.
    pub async fn handle_inline(self: &Arc<Self>, user: Actor, query_id: String, query: &str) {
        let ctx = self.ctx(ChatRef::private(user.id), user, None);
        if !self.inline.select(ctx, query_id, query).await {
            log::debug!("No inline answer for {:?}", query);
        }
    }
}

/// Per-event context handed to every action, hook and game.
#[derive(Clone)]
pub struct Ctx {
    pub hub: Arc<Hub>,
    pub chat: ChatRef,
    pub user: Actor,
    /// Message carrying the pressed button, if the event was a press.
    pub anchor: Option<MessageRef>,
}

impl Ctx {
    pub fn is_private(&self) -> bool {
        self.chat.is_private()
    }

    pub fn sessions(&self) -> &SessionManager {
        self.hub.sessions()
    }

    pub fn store(&self) -> &dyn UserStore {
        self.hub.store()
    }

    pub fn transport(&self) -> &dyn Transport {
        self.hub.transport()
    }

    pub fn config(&self) -> &HubConfig {
        self.hub.config()
    }

    /// Edits the anchor message when there is one, otherwise sends anew.
    pub async fn reply(&self, text: &str, keyboard: Option<&Keyboard>) -> HubResult<MessageRef> {
        match self.anchor {
            Some(anchor) => {
                self.transport().send_edit(anchor, text, keyboard).await?;
                Ok(anchor)
            }
            None => self.transport().send_new(self.chat.id, text, keyboard).await,
        }
    }

    /// Always sends a new message to the current chat.
    pub async fn send(&self, text: &str, keyboard: Option<&Keyboard>) -> HubResult<MessageRef> {
        self.transport().send_new(self.chat.id, text, keyboard).await
    }

    /// Same context without an anchor, so [`Ctx::reply`] sends a new message.
    pub fn detached(&self) -> Ctx {
        Ctx {
            anchor: None,
            ..self.clone()
        }
    }
}
