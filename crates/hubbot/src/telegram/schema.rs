//! Dispatcher schema: every update is converted and handed to the hub on
//! its own task, so a slow game move never blocks the chat's queue.

use std::sync::Arc;

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::{InlineQuery, Message};

use super::convert::{actor, chat_ref, incoming};
use super::Bot;
use hubcore::transport::{ChatRef, MessageRef};
use hubcore::Hub;

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Creates the dispatcher handler tree
pub fn schema(hub: Arc<Hub>) -> UpdateHandler<HandlerError> {
    dptree::entry()
        .branch(message_handler(Arc::clone(&hub)))
        .branch(callback_handler(Arc::clone(&hub)))
        .branch(inline_handler(hub))
}

fn message_handler(hub: Arc<Hub>) -> UpdateHandler<HandlerError> {
    Update::filter_message().endpoint(move |msg: Message| {
        let hub = Arc::clone(&hub);
        async move {
            let Some(user) = msg.from.as_ref().and_then(actor) else {
                return Ok(());
            };
            let chat = chat_ref(&msg.chat);
            let message = incoming(&msg);
            tokio::spawn(async move { hub.handle_message(chat, user, message).await });
            Ok(())
        }
    })
}

fn callback_handler(hub: Arc<Hub>) -> UpdateHandler<HandlerError> {
    Update::filter_callback_query().endpoint(move |bot: Bot, q: CallbackQuery| {
        let hub = Arc::clone(&hub);
        async move {
            // Stops the client-side spinner; the outcome is shown by editing the message.
            if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
                log::debug!("Failed to answer callback query: {}", e);
            }

            let (Some(user), Some(data)) = (actor(&q.from), q.data.clone()) else {
                return Ok(());
            };
            let (chat, anchor) = match q.message.as_ref() {
                Some(message) => (
                    chat_ref(message.chat()),
                    Some(MessageRef::new(message.chat().id.0, message.id().0)),
                ),
                None => (ChatRef::private(user.id), None),
            };
            tokio::spawn(async move { hub.handle_callback(chat, user, anchor, &data).await });
            Ok(())
        }
    })
}

fn inline_handler(hub: Arc<Hub>) -> UpdateHandler<HandlerError> {
    Update::filter_inline_query().endpoint(move |q: InlineQuery| {
        let hub = Arc::clone(&hub);
        async move {
            let Some(user) = actor(&q.from) else {
                return Ok(());
            };
            let query_id = q.id.0.clone();
            let query = q.query.clone();
            tokio::spawn(async move { hub.handle_inline(user, query_id, &query).await });
            Ok(())
        }
    })
}
