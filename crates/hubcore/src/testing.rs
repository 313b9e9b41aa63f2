//! In-memory [`Transport`] and hub builders for tests and dry runs.

use async_trait::async_trait;
use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::core::config::HubConfig;
use crate::core::error::{HubError, HubResult};
use crate::hub::Hub;
use crate::router::keyboard::Keyboard;
use crate::storage::{create_memory_pool, SqliteStore};
use crate::transport::{InlineArticle, MessageRef, Transport};

/// One call made against a [`RecordingTransport`].
#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    New {
        at: MessageRef,
        text: String,
        keyboard: Option<Keyboard>,
    },
    Edit {
        at: MessageRef,
        text: String,
        keyboard: Option<Keyboard>,
    },
    Delete {
        at: MessageRef,
    },
    Photo {
        at: MessageRef,
        file_id: String,
        caption: Option<String>,
    },
    Inline {
        query_id: String,
        articles: Vec<InlineArticle>,
    },
}

impl Sent {
    pub fn text(&self) -> Option<&str> {
        match self {
            Sent::New { text, .. } | Sent::Edit { text, .. } => Some(text),
            _ => None,
        }
    }

    pub fn keyboard(&self) -> Option<&Keyboard> {
        match self {
            Sent::New { keyboard, .. } | Sent::Edit { keyboard, .. } => keyboard.as_ref(),
            _ => None,
        }
    }

    pub fn at(&self) -> Option<MessageRef> {
        match self {
            Sent::New { at, .. } | Sent::Edit { at, .. } | Sent::Delete { at } | Sent::Photo { at, .. } => Some(*at),
            Sent::Inline { .. } => None,
        }
    }
}

/// Records every call and hands out increasing message ids.
///
/// Failures can be injected: the next N sends or edits return
/// [`HubError::Transport`] and are not recorded.
#[derive(Default)]
pub struct RecordingTransport {
    log: Mutex<Vec<Sent>>,
    next_id: AtomicI32,
    failing_sends: AtomicUsize,
    failing_edits: AtomicUsize,
    passing_edits: AtomicUsize,
    delay: Mutex<Option<Duration>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, Vec<Sent>> {
        self.log.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Every call so far, oldest first.
    pub fn sent(&self) -> Vec<Sent> {
        self.entries().clone()
    }

    pub fn last(&self) -> Option<Sent> {
        self.entries().last().cloned()
    }

    pub fn clear(&self) {
        self.entries().clear();
    }

    /// Makes the next `n` `send_new`/`send_photo` calls fail.
    pub fn fail_sends(&self, n: usize) {
        self.failing_sends.store(n, Ordering::SeqCst);
    }

    /// Makes the next `n` `send_edit` calls fail.
    pub fn fail_edits(&self, n: usize) {
        self.fail_edits_after(0, n);
    }

    /// Lets `skip` edits through, then fails the following `n`.
    pub fn fail_edits_after(&self, skip: usize, n: usize) {
        self.passing_edits.store(skip, Ordering::SeqCst);
        self.failing_edits.store(n, Ordering::SeqCst);
    }

    /// Every call sleeps this long before answering.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(delay);
    }

    async fn pause(&self) {
        let delay = *self.delay.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    /// Decrements `counter` if it is positive.
    fn take_one(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn allocate(&self, chat_id: i64) -> MessageRef {
        MessageRef::new(chat_id, self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send_new(&self, chat_id: i64, text: &str, keyboard: Option<&Keyboard>) -> HubResult<MessageRef> {
        self.pause().await;
        if Self::take_one(&self.failing_sends) {
            return Err(HubError::Transport("injected send failure".into()));
        }
        let at = self.allocate(chat_id);
        self.entries().push(Sent::New {
            at,
            text: text.to_string(),
            keyboard: keyboard.cloned(),
        });
        Ok(at)
    }

    async fn send_edit(&self, anchor: MessageRef, text: &str, keyboard: Option<&Keyboard>) -> HubResult<()> {
        self.pause().await;
        let passes = Self::take_one(&self.passing_edits);
        if !passes && Self::take_one(&self.failing_edits) {
            return Err(HubError::Transport("injected edit failure".into()));
        }
        self.entries().push(Sent::Edit {
            at: anchor,
            text: text.to_string(),
            keyboard: keyboard.cloned(),
        });
        Ok(())
    }

    async fn delete(&self, anchor: MessageRef) -> HubResult<()> {
        self.pause().await;
        self.entries().push(Sent::Delete { at: anchor });
        Ok(())
    }

    async fn send_photo(&self, chat_id: i64, file_id: &str, caption: Option<&str>) -> HubResult<MessageRef> {
        self.pause().await;
        if Self::take_one(&self.failing_sends) {
            return Err(HubError::Transport("injected send failure".into()));
        }
        let at = self.allocate(chat_id);
        self.entries().push(Sent::Photo {
            at,
            file_id: file_id.to_string(),
            caption: caption.map(str::to_string),
        });
        Ok(at)
    }

    async fn answer_inline(&self, query_id: &str, articles: &[InlineArticle]) -> HubResult<()> {
        self.entries().push(Sent::Inline {
            query_id: query_id.to_string(),
            articles: articles.to_vec(),
        });
        Ok(())
    }

    fn private_link(&self, start: &str) -> String {
        format!("https://t.me/hubbot?start={start}")
    }
}

/// Hub over a [`RecordingTransport`] and a fresh in-memory database.
pub fn memory_hub(config: HubConfig) -> HubResult<(Arc<Hub>, Arc<RecordingTransport>, Arc<SqliteStore>)> {
    let transport = Arc::new(RecordingTransport::new());
    let store = Arc::new(SqliteStore::new(create_memory_pool()?));
    let hub = Hub::new(transport.clone(), store.clone(), config).with_bot_username("hubbot");
    Ok((Arc::new(hub), transport, store))
}

/// Defaults with a fixed seed and admin `1`.
pub fn test_config() -> HubConfig {
    HubConfig {
        admin_ids: vec![1],
        rng_seed: Some(7),
        ..HubConfig::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_injected_failures_are_consumed() {
        let transport = RecordingTransport::new();
        transport.fail_sends(1);
        assert!(transport.send_new(5, "a", None).await.is_err());
        let at = transport.send_new(5, "b", None).await.unwrap();
        assert_eq!(at, MessageRef::new(5, 1));
        assert_eq!(transport.sent().len(), 1);
        assert_eq!(transport.last().unwrap().text(), Some("b"));
    }

    #[tokio::test]
    async fn test_edit_failures_after_skipped_edits() {
        let transport = RecordingTransport::new();
        let at = MessageRef::new(5, 1);
        transport.fail_edits_after(2, 1);
        assert!(transport.send_edit(at, "a", None).await.is_ok());
        assert!(transport.send_edit(at, "b", None).await.is_ok());
        assert!(transport.send_edit(at, "c", None).await.is_err());
        assert!(transport.send_edit(at, "d", None).await.is_ok());
        assert_eq!(transport.sent().len(), 3);
    }
}
