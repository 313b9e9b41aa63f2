//! Slash commands and inline queries.

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use crate::hub::Ctx;

/// Handler for `/name arg1 arg2 ...`; receives the arguments.
pub type CommandAction = Arc<dyn Fn(Ctx, Vec<String>) -> BoxFuture<'static, ()> + Send + Sync>;

/// Handler for an inline query; receives the query id to answer.
pub type InlineAction = Arc<dyn Fn(Ctx, String) -> BoxFuture<'static, ()> + Send + Sync>;

/// A parsed slash command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub name: String,
    pub args: Vec<String>,
}

impl ParsedCommand {
    /// Parses `/name[@bot] args...`.
    ///
    /// Returns `None` for plain text and for commands addressed to another
    /// bot (`/help@other_bot`).
    pub fn parse(text: &str, bot_username: Option<&str>) -> Option<Self> {
        let mut words = text.split_whitespace();
        let head = words.next()?.strip_prefix('/')?;

        let name = match head.split_once('@') {
            Some((name, target)) => {
                let ours = bot_username.is_some_and(|me| me.eq_ignore_ascii_case(target));
                if !ours {
                    return None;
                }
                name
            }
            None => head,
        };

        if name.is_empty() {
            return None;
        }

        Some(Self {
            name: name.to_lowercase(),
            args: words.map(str::to_string).collect(),
        })
    }
}

#[derive(Default, Clone)]
pub struct CommandTable {
    actions: BTreeMap<String, CommandAction>,
}

impl CommandTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F, Fut>(&mut self, name: &str, f: F)
    where
        F: Fn(Ctx, Vec<String>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let wrapped: CommandAction = Arc::new(move |ctx: Ctx, args: Vec<String>| f(ctx, args).boxed());
        self.actions.insert(name.to_lowercase(), wrapped);
    }

    pub fn get(&self, name: &str) -> Option<CommandAction> {
        self.actions.get(&name.to_lowercase()).cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }

    /// Runs `command` if registered. Unknown commands are ignored.
    pub async fn select(&self, ctx: Ctx, command: ParsedCommand) -> bool {
        match self.get(&command.name) {
            Some(found) => {
                log::info!("Command /{} from user {}", command.name, ctx.user.id);
                found(ctx, command.args).await;
                true
            }
            None => false,
        }
    }
}

/// Exact-match inline query table.
#[derive(Default, Clone)]
pub struct InlineTable {
    actions: BTreeMap<String, InlineAction>,
}

impl InlineTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F, Fut>(&mut self, query: &str, f: F)
    where
        F: Fn(Ctx, String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let wrapped: InlineAction = Arc::new(move |ctx: Ctx, id: String| f(ctx, id).boxed());
        self.actions.insert(query.to_string(), wrapped);
    }

    pub async fn select(&self, ctx: Ctx, query_id: String, query: &str) -> bool {
        match self.actions.get(query.trim()).cloned() {
            Some(found) => {
                found(ctx, query_id).await;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_command() {
        let cmd = ParsedCommand::parse("/Stats games  week", None).unwrap();
        assert_eq!(cmd.name, "stats");
        assert_eq!(cmd.args, vec!["games", "week"]);
    }

    #[test]
    fn test_parse_addressed_command() {
        let ours = ParsedCommand::parse("/help@HubBot", Some("hubbot")).unwrap();
        assert_eq!(ours.name, "help");
        assert!(ParsedCommand::parse("/help@other_bot", Some("hubbot")).is_none());
        assert!(ParsedCommand::parse("/help@hubbot", None).is_none());
    }

    #[test]
    fn test_parse_rejects_plain_text() {
        assert!(ParsedCommand::parse("hello /start", None).is_none());
        assert!(ParsedCommand::parse("/", None).is_none());
        assert!(ParsedCommand::parse("", None).is_none());
    }
}
