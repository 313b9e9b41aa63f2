//! [`Transport`] over the Telegram Bot API.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{
    FileId, InlineQueryId, InlineQueryResult, InlineQueryResultArticle, InputFile, InputMessageContent,
    InputMessageContentText, MessageId, ParseMode,
};

use super::convert::markup;
use hubcore::router::keyboard::Keyboard;
use hubcore::transport::{InlineArticle, MessageRef, Transport};
use hubcore::HubResult;

/// Sends HTML messages through a teloxide [`Bot`].
pub struct TeloxideTransport {
    bot: Bot,
    username: String,
}

impl TeloxideTransport {
    pub fn new(bot: Bot, username: impl Into<String>) -> Self {
        Self {
            bot,
            username: username.into(),
        }
    }

    fn message_ref(msg: &Message) -> MessageRef {
        MessageRef::new(msg.chat.id.0, msg.id.0)
    }
}

#[async_trait]
impl Transport for TeloxideTransport {
    async fn send_new(&self, chat_id: i64, text: &str, keyboard: Option<&Keyboard>) -> HubResult<MessageRef> {
        let mut request = self.bot.send_message(ChatId(chat_id), text).parse_mode(ParseMode::Html);
        if let Some(keyboard) = keyboard {
            request = request.reply_markup(markup(keyboard));
        }
        let msg = request.await?;
        Ok(Self::message_ref(&msg))
    }

    async fn send_edit(&self, anchor: MessageRef, text: &str, keyboard: Option<&Keyboard>) -> HubResult<()> {
        let mut request = self
            .bot
            .edit_message_text(ChatId(anchor.chat_id), MessageId(anchor.message_id), text)
            .parse_mode(ParseMode::Html);
        if let Some(keyboard) = keyboard {
            request = request.reply_markup(markup(keyboard));
        }
        request.await?;
        Ok(())
    }

    async fn delete(&self, anchor: MessageRef) -> HubResult<()> {
        self.bot
            .delete_message(ChatId(anchor.chat_id), MessageId(anchor.message_id))
            .await?;
        Ok(())
    }

    async fn send_photo(&self, chat_id: i64, file_id: &str, caption: Option<&str>) -> HubResult<MessageRef> {
        let mut request = self
            .bot
            .send_photo(ChatId(chat_id), InputFile::file_id(FileId(file_id.to_string())));
        if let Some(caption) = caption {
            request = request.caption(caption);
        }
        let msg = request.await?;
        Ok(Self::message_ref(&msg))
    }

    async fn answer_inline(&self, query_id: &str, articles: &[InlineArticle]) -> HubResult<()> {
        let results = articles.iter().map(|article| {
            let content = InputMessageContent::Text(InputMessageContentText::new(article.text.clone()));
            InlineQueryResult::Article(
                InlineQueryResultArticle::new(article.id.clone(), article.title.clone(), content)
                    .description(article.description.clone()),
            )
        });
        self.bot
            .answer_inline_query(InlineQueryId(query_id.to_string()), results)
            .await?;
        Ok(())
    }

    fn private_link(&self, start: &str) -> String {
        format!("https://t.me/{}?start={}", self.username, start)
    }
}
