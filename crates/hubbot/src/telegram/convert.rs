//! Conversions between teloxide types and the hub's platform-neutral ones.

use teloxide::types::{Chat, InlineKeyboardButton, InlineKeyboardMarkup, Message, User};

use hubcore::router::keyboard::{ButtonAction, Keyboard};
use hubcore::transport::{Actor, ChatRef, IncomingMessage, PhotoRef};

pub fn actor(user: &User) -> Option<Actor> {
    let id = i64::try_from(user.id.0).ok()?;
    Some(Actor {
        id,
        first_name: user.first_name.clone(),
        username: user.username.clone(),
    })
}

pub fn chat_ref(chat: &Chat) -> ChatRef {
    if chat.is_private() {
        ChatRef::private(chat.id.0)
    } else {
        ChatRef::public(chat.id.0)
    }
}

pub fn incoming(msg: &Message) -> IncomingMessage {
    // Telegram lists sizes smallest first
    let photo = msg.photo().and_then(|sizes| sizes.last()).map(|size| PhotoRef {
        file_id: size.file.id.0.clone(),
        unique_id: size.file.unique_id.0.clone(),
    });

    IncomingMessage {
        message_id: msg.id.0,
        text: msg.text().map(str::to_string),
        caption: msg.caption().map(str::to_string),
        photo,
    }
}

/// Renders a keyboard. Buttons with an unparsable URL are dropped.
pub fn markup(keyboard: &Keyboard) -> InlineKeyboardMarkup {
    let rows = keyboard.rows.iter().map(|row| {
        row.iter()
            .filter_map(|button| match &button.action {
                ButtonAction::Callback(data) => Some(InlineKeyboardButton::callback(button.text.clone(), data.clone())),
                ButtonAction::Url(raw) => match url::Url::parse(raw) {
                    Ok(url) => Some(InlineKeyboardButton::url(button.text.clone(), url)),
                    Err(e) => {
                        log::warn!("Dropping button {:?} with invalid URL {:?}: {}", button.text, raw, e);
                        None
                    }
                },
                ButtonAction::SwitchInline(query) => Some(InlineKeyboardButton::switch_inline_query_current_chat(
                    button.text.clone(),
                    query.clone(),
                )),
            })
            .collect::<Vec<_>>()
    });
    InlineKeyboardMarkup::new(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hubcore::router::keyboard::Button;
    use teloxide::types::InlineKeyboardButtonKind;

    #[test]
    fn test_markup_keeps_layout_and_payloads() {
        let keyboard = Keyboard::new(vec![
            vec![Button::callback("Play!", "games/cointoss/accept/1")],
            vec![
                Button::url("Chat", "https://t.me/hubbot?start=account"),
                Button::url("Broken", "not a url"),
            ],
        ]);
        let markup = markup(&keyboard);

        assert_eq!(markup.inline_keyboard.len(), 2);
        assert_eq!(markup.inline_keyboard[1].len(), 1);
        match &markup.inline_keyboard[0][0].kind {
            InlineKeyboardButtonKind::CallbackData(data) => assert_eq!(data, "games/cointoss/accept/1"),
            other => panic!("unexpected button {:?}", other),
        }
        assert!(matches!(markup.inline_keyboard[1][0].kind, InlineKeyboardButtonKind::Url(_)));
    }
}
