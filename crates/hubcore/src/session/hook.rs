//! Message-reply hooks: continuations waiting for the next plain-text
//! message of a chat or a user.

use dashmap::DashMap;
use futures_util::future::BoxFuture;
use std::sync::Arc;
use tokio::time::{Duration, Instant};

use crate::core::config;
use crate::transport::IncomingMessage;

/// Hook body. Returns `true` once it has what it wanted; `false` keeps the
/// hook armed for the next message.
pub type HookCallback<C> = Arc<dyn Fn(C, IncomingMessage) -> BoxFuture<'static, bool> + Send + Sync>;

pub struct MessageHook<C> {
    expires_at: Instant,
    callback: HookCallback<C>,
}

impl<C> Clone for MessageHook<C> {
    fn clone(&self) -> Self {
        Self {
            expires_at: self.expires_at,
            callback: Arc::clone(&self.callback),
        }
    }
}

impl<C> MessageHook<C> {
    /// Packs a callback with a lifespan, capped at one hour.
    pub fn new<F>(lifespan: Duration, callback: F) -> Self
    where
        F: Fn(C, IncomingMessage) -> BoxFuture<'static, bool> + Send + Sync + 'static,
    {
        let lifespan = lifespan.min(config::hooks::max_lifespan());
        Self {
            expires_at: Instant::now() + lifespan,
            callback: Arc::new(callback),
        }
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    pub async fn execute(&self, ctx: C, message: IncomingMessage) -> bool {
        (self.callback)(ctx, message).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Chat,
    User,
}

/// Chat-keyed and user-keyed hook tables.
pub struct HookTable<C> {
    by_chat: DashMap<i64, MessageHook<C>>,
    by_user: DashMap<i64, MessageHook<C>>,
}

impl<C> Default for HookTable<C> {
    fn default() -> Self {
        Self {
            by_chat: DashMap::new(),
            by_user: DashMap::new(),
        }
    }
}

impl<C: Clone + Send + 'static> HookTable<C> {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self, scope: Scope) -> &DashMap<i64, MessageHook<C>> {
        match scope {
            Scope::Chat => &self.by_chat,
            Scope::User => &self.by_user,
        }
    }

    /// Arms `hook` for the next message in `chat_id`, replacing any previous one.
    pub fn set_chat_hook(&self, chat_id: i64, hook: MessageHook<C>) {
        self.by_chat.insert(chat_id, hook);
    }

    /// Arms `hook` for the next message from `user_id` in any chat.
    pub fn set_user_hook(&self, user_id: i64, hook: MessageHook<C>) {
        self.by_user.insert(user_id, hook);
    }

    pub fn clear_chat_hook(&self, chat_id: i64) -> bool {
        self.by_chat.remove(&chat_id).is_some()
    }

    pub fn clear_user_hook(&self, user_id: i64) -> bool {
        self.by_user.remove(&user_id).is_some()
    }

    pub fn has_chat_hook(&self, chat_id: i64) -> bool {
        self.by_chat.get(&chat_id).is_some_and(|h| !h.is_expired())
    }

    pub fn has_user_hook(&self, user_id: i64) -> bool {
        self.by_user.get(&user_id).is_some_and(|h| !h.is_expired())
    }

    /// Offers `message` to the chat hook, then to the user hook.
    ///
    /// Returns `true` when at least one live hook ran, in which case the
    /// message must not be handled as a command.
    pub async fn dispatch(&self, ctx: C, chat_id: i64, user_id: i64, message: &IncomingMessage) -> bool {
        let mut consumed = false;
        for (scope, key) in [(Scope::Chat, chat_id), (Scope::User, user_id)] {
            if self.run_one(scope, key, ctx.clone(), message).await {
                consumed = true;
            }
        }
        consumed
    }

    async fn run_one(&self, scope: Scope, key: i64, ctx: C, message: &IncomingMessage) -> bool {
        // Taking the hook out makes it invisible to a concurrent message.
        let Some((_, hook)) = self.table(scope).remove(&key) else {
            return false;
        };

        if hook.is_expired() {
            log::debug!("Dropped expired {:?} hook for {}", scope, key);
            return false;
        }

        let done = hook.execute(ctx, message.clone()).await;
        if !done {
            // Re-arm unless a fresher hook was registered meanwhile.
            self.table(scope).entry(key).or_insert(hook);
        }
        true
    }

    /// Drops expired hooks from both tables.
    pub fn sweep(&self) -> usize {
        Self::sweep_table(&self.by_chat) + Self::sweep_table(&self.by_user)
    }

    fn sweep_table(table: &DashMap<i64, MessageHook<C>>) -> usize {
        let mut removed = 0;
        table.retain(|_, hook| {
            let live = !hook.is_expired();
            removed += usize::from(!live);
            live
        });
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::FutureExt;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn text(s: &str) -> IncomingMessage {
        IncomingMessage {
            text: Some(s.to_string()),
            ..IncomingMessage::default()
        }
    }

    /// Hook that succeeds only on "ok", counting every call.
    fn counting_hook(calls: Arc<AtomicUsize>, lifespan: Duration) -> MessageHook<()> {
        MessageHook::new(lifespan, move |_ctx: (), msg: IncomingMessage| {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                msg.text.as_deref() == Some("ok")
            }
            .boxed()
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_unhandled_hook_stays_armed() {
        let table = HookTable::new();
        let calls = Arc::new(AtomicUsize::new(0));
        table.set_chat_hook(1, counting_hook(Arc::clone(&calls), Duration::from_secs(60)));

        assert!(table.dispatch((), 1, 9, &text("nope")).await);
        assert!(table.has_chat_hook(1));

        assert!(table.dispatch((), 1, 9, &text("ok")).await);
        assert!(!table.has_chat_hook(1));
        assert!(!table.dispatch((), 1, 9, &text("ok")).await);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_hook_is_dropped_unexecuted() {
        let table = HookTable::new();
        let calls = Arc::new(AtomicUsize::new(0));
        table.set_user_hook(9, counting_hook(Arc::clone(&calls), Duration::from_secs(5)));

        tokio::time::advance(Duration::from_secs(6)).await;
        assert!(!table.dispatch((), 1, 9, &text("ok")).await);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(!table.has_user_hook(9));
    }

    #[tokio::test(start_paused = true)]
    async fn test_lifespan_is_capped_at_one_hour() {
        let hook = counting_hook(Arc::new(AtomicUsize::new(0)), Duration::from_secs(7200));
        assert_eq!(hook.expires_at() - Instant::now(), Duration::from_secs(3600));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_does_not_clobber_fresher_hook() {
        let table: Arc<HookTable<()>> = Arc::new(HookTable::new());
        let fresh_calls = Arc::new(AtomicUsize::new(0));

        let inner_table = Arc::clone(&table);
        let inner_calls = Arc::clone(&fresh_calls);
        // this hook replaces itself while running and reports "not done"
        let hook = MessageHook::new(Duration::from_secs(60), move |_ctx: (), _msg| {
            let table = Arc::clone(&inner_table);
            let calls = Arc::clone(&inner_calls);
            async move {
                table.set_chat_hook(1, counting_hook(calls, Duration::from_secs(60)));
                false
            }
            .boxed()
        });
        table.set_chat_hook(1, hook);

        table.dispatch((), 1, 9, &text("first")).await;
        table.dispatch((), 1, 9, &text("ok")).await;
        assert_eq!(fresh_calls.load(Ordering::SeqCst), 1);
        assert!(!table.has_chat_hook(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_chat_and_user_hooks_both_run() {
        let table = HookTable::new();
        let calls = Arc::new(AtomicUsize::new(0));
        table.set_chat_hook(1, counting_hook(Arc::clone(&calls), Duration::from_secs(60)));
        table.set_user_hook(9, counting_hook(Arc::clone(&calls), Duration::from_secs(60)));

        assert!(table.dispatch((), 1, 9, &text("ok")).await);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(table.sweep(), 0);
    }

    #[test]
    fn test_sweep_counts_only_its_own_removals() {
        let table: HookTable<()> = HookTable::new();
        let calls = Arc::new(AtomicUsize::new(0));
        for user in 0..100 {
            table.set_user_hook(user, counting_hook(Arc::clone(&calls), Duration::ZERO));
        }

        let removed = std::thread::scope(|scope| {
            scope.spawn(|| {
                for chat in 0..1_000 {
                    table.set_chat_hook(chat, counting_hook(Arc::clone(&calls), Duration::from_secs(60)));
                }
            });
            (0..50).map(|_| table.sweep()).sum::<usize>()
        });

        assert_eq!(removed + table.sweep(), 100);
        assert!(table.has_chat_hook(999));
    }
}
