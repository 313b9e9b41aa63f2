//! Menu routers.
//!
//! A router owns one level of the menu tree. It maps the segment under the
//! path cursor to an action, falling back to fuzzy matching, generated help,
//! built-ins, and finally to re-rendering itself.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Arc;
use tokio::time::Duration;

use super::keyboard::{self, Keyboard, OptionRow, Options, DELETE_BUILTIN};
use super::Action;
use crate::hub::Ctx;
use crate::session::path::CommandPath;
use crate::transport::escape_html;

/// Actions computed per invocation (for example one per XP title).
pub type DynamicActions = Arc<dyn Fn(&Ctx, &CommandPath) -> Vec<(String, Action)> + Send + Sync>;

/// Options computed per render.
pub type DynamicOptions = Arc<dyn Fn(&Ctx, &CommandPath) -> Options + Send + Sync>;

pub struct Router {
    title: String,
    path: String,
    actions: BTreeMap<String, Action>,
    dynamic_actions: Option<DynamicActions>,
    dynamic_options: Option<DynamicOptions>,
    public_options: Options,
    private_options: Options,
    extensions: Options,
    public_cooldown: Duration,
    public_only: bool,
    private_only: bool,
}

impl Router {
    /// `path` is the router's absolute location, `""` for the root and
    /// `account/wallet` for a nested menu.
    pub fn new(title: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            path: path.into(),
            actions: BTreeMap::new(),
            dynamic_actions: None,
            dynamic_options: None,
            public_options: Vec::new(),
            private_options: Vec::new(),
            extensions: Vec::new(),
            public_cooldown: Duration::ZERO,
            public_only: false,
            private_only: false,
        }
    }

    pub fn action(mut self, key: impl Into<String>, action: Action) -> Self {
        self.actions.insert(key.into(), action);
        self
    }

    /// Same options in private and public chats.
    pub fn options(mut self, options: Options) -> Self {
        self.public_options = options.clone();
        self.private_options = options;
        self
    }

    pub fn public_options(mut self, options: Options) -> Self {
        self.public_options = options;
        self
    }

    pub fn private_options(mut self, options: Options) -> Self {
        self.private_options = options;
        self
    }

    pub fn dynamic_actions<F>(mut self, f: F) -> Self
    where
        F: Fn(&Ctx, &CommandPath) -> Vec<(String, Action)> + Send + Sync + 'static,
    {
        self.dynamic_actions = Some(Arc::new(f));
        self
    }

    pub fn dynamic_options<F>(mut self, f: F) -> Self
    where
        F: Fn(&Ctx, &CommandPath) -> Options + Send + Sync + 'static,
    {
        self.dynamic_options = Some(Arc::new(f));
        self
    }

    /// Minimum gap between two renders of this menu in the same group chat.
    pub fn public_cooldown(mut self, cooldown: Duration) -> Self {
        self.public_cooldown = cooldown;
        self
    }

    pub fn public_only(mut self) -> Self {
        self.public_only = true;
        self
    }

    pub fn private_only(mut self) -> Self {
        self.private_only = true;
        self
    }

    /// Adds an entry owned by another feature: a button labelled `title`
    /// routing to `segment`, handled by `action`.
    pub fn extend(mut self, title: &str, segment: &str, action: Action) -> Self {
        self.actions.insert(segment.to_string(), action);
        self.extensions.push(keyboard::row(&[(title, segment)]));
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_private_only(&self) -> bool {
        self.private_only
    }

    /// Routes `path` from the segment under its cursor.
    pub async fn select(&self, ctx: Ctx, mut path: CommandPath) {
        if self.private_only && !ctx.is_private() {
            self.private_redirect(&ctx).await;
            return;
        }

        if let Some(owner) = path.tag("user") {
            if owner.parse::<i64>().ok() != Some(ctx.user.id) {
                log::info!("User {} cannot use keyboard owned by {}", ctx.user.id, owner);
                return;
            }
        }

        let dynamic = match &self.dynamic_actions {
            Some(f) => f(&ctx, &path),
            None => Vec::new(),
        };

        let segment = path.get().to_string();
        if segment.is_empty() {
            self.expose(&ctx, &path).await;
            return;
        }

        let matched = {
            let table = self.merged(&dynamic);
            match table.get(segment.as_str()) {
                Some(found) => {
                    log::debug!("Direct match in {}: {}", self.title, segment);
                    Some(Arc::clone(found))
                }
                None if path.has_tag("cmd") => {
                    let needle = segment.to_lowercase();
                    table
                        .iter()
                        .find(|(key, _)| key.to_lowercase().contains(&needle))
                        .map(|(key, found)| {
                            log::debug!("Partial match in {}: {} -> {}", self.title, segment, key);
                            Arc::clone(found)
                        })
                }
                None => None,
            }
        };

        if let Some(found) = matched {
            path.next();
            found(ctx, path).await;
            return;
        }

        if segment == "help" || segment == "?" {
            self.send_help(&ctx, &dynamic).await;
            return;
        }

        if path.path() == DELETE_BUILTIN {
            delete_anchor(&ctx).await;
            return;
        }

        self.expose(&ctx, &path).await;
    }

    /// Static and per-invocation actions in key order. Dynamic entries win.
    fn merged<'a>(&'a self, dynamic: &'a [(String, Action)]) -> BTreeMap<&'a str, &'a Action> {
        let mut table: BTreeMap<&str, &Action> = self.actions.iter().map(|(k, v)| (k.as_str(), v)).collect();
        for (key, found) in dynamic {
            table.insert(key.as_str(), found);
        }
        table
    }

    /// Renders this menu: edits the pressed message, or sends a new one.
    pub async fn expose(&self, ctx: &Ctx, path: &CommandPath) {
        let private = ctx.is_private();
        let lock_key = format!("{} {}", ctx.chat.id, self.title);
        if !private && !ctx.hub.cooldowns().try_lock_for(&lock_key, self.public_cooldown) {
            log::debug!("{} menu on cooldown in chat {}", self.title, ctx.chat.id);
            return;
        }

        let options = self.resolve_options(self.current_options(ctx, path));
        let owner = ctx.user.id.to_string();
        let keyboard = Keyboard::from_options(&options, &[("user", owner.as_str())]);
        let text = format!("<b>{}</b>", escape_html(&self.title));

        if let Err(e) = ctx.reply(&text, Some(&keyboard)).await {
            log::warn!("Error sending {:?} menu: {}", self.title, e);
        }
    }

    fn current_options(&self, ctx: &Ctx, path: &CommandPath) -> Options {
        if let Some(dynamic) = &self.dynamic_options {
            let mut options = self.extensions.clone();
            options.extend(dynamic(ctx, path));
            return options;
        }

        let mut options = if ctx.is_private() && !self.public_only {
            self.private_options.clone()
        } else {
            self.public_options.clone()
        };

        if !self.extensions.is_empty() {
            // keep a trailing back/done row last
            let footer = options
                .last()
                .filter(|row| row.iter().any(|(_, v)| v == DELETE_BUILTIN))
                .cloned();
            if footer.is_some() {
                options.pop();
            }
            options.extend(self.extensions.iter().cloned());
            options.extend(footer);
        }
        options
    }

    /// Rewrites option targets relative to this router into absolute paths.
    ///
    /// `_`-prefixed built-ins and `!!` codes pass through, `..` points at the
    /// parent menu and anything else is joined onto this router's path.
    pub fn resolve_options(&self, options: Options) -> Options {
        options
            .into_iter()
            .filter(|row| !row.is_empty())
            .map(|row| -> OptionRow {
                row.into_iter()
                    .map(|(label, value)| {
                        let target = self.resolve(&value);
                        (label, target)
                    })
                    .collect()
            })
            .collect()
    }

    fn resolve(&self, value: &str) -> String {
        if value.starts_with('_') || value.starts_with("!!") {
            return value.to_string();
        }
        if value == ".." {
            return match self.path.rfind('/') {
                Some(i) => format!("{}/", &self.path[..i]),
                None => "/".to_string(),
            };
        }
        if self.path.is_empty() {
            value.to_string()
        } else {
            format!("{}/{}", self.path, value)
        }
    }

    /// Lists the commands reachable from this menu.
    pub async fn send_help(&self, ctx: &Ctx, dynamic: &[(String, Action)]) {
        let root = self.path.is_empty();
        let prefix = if root {
            "/".to_string()
        } else {
            format!("/{} ", self.path.replace('/', " "))
        };

        let mut text = format!("<b>{}</b> - Commands:\n\n", escape_html(&self.title));
        for key in self.merged(dynamic).keys().filter(|k| !k.starts_with('_')) {
            let _ = writeln!(text, "    {}{}", prefix, escape_html(key));
        }

        if root {
            text.push_str(
                "\nYou can access most sub-menus using just commands.\n    <b>/stats games week</b>\n\n\
                 To see available sub-commands, use:\n    <b>/cmd help</b>, or <b>/cmd ?</b>\n",
            );
        } else if self.dynamic_actions.is_some() {
            let _ = write!(
                text,
                "\nPartial matches are supported!\n\nSo, if the command text is \"🚀 Space stuff\"\nYou could use:\n    {prefix}space\n    {prefix}🚀\n"
            );
        }

        if let Err(e) = ctx.reply(&text, None).await {
            log::warn!("Error sending {:?} help: {}", self.title, e);
        }
    }

    /// Points a group chat at the private chat for private-only menus.
    async fn private_redirect(&self, ctx: &Ctx) {
        let dest = match self.path.find('/') {
            Some(i) => &self.path[..i],
            None => self.path.as_str(),
        };
        let target = keyboard::link(&ctx.hub.transport().private_link(dest));
        let markup = Keyboard::from_options(&vec![keyboard::row(&[(self.title.as_str(), target.as_str())])], &[]);

        if let Err(e) = ctx.reply("🤫 Shhh.. You're in public", Some(&markup)).await {
            log::warn!("Error sending private redirect for {:?}: {}", self.title, e);
        }
    }
}

/// Built-in `_DEL`: removes the message the button was attached to.
async fn delete_anchor(ctx: &Ctx) {
    let Some(anchor) = ctx.anchor else {
        return;
    };
    if let Err(e) = ctx.hub.transport().delete(anchor).await {
        log::warn!("Failed to delete message {:?}: {}", anchor, e);
    }
}
