//! Inline keyboards.
//!
//! Menus describe their buttons as [`Options`]: rows of `(label, value)`
//! pairs. A value is normally a routed payload; two codes render other
//! button kinds instead:
//!
//! - `!!l(<url>)` - URL button
//! - `!!s(<query>)` - switch-inline-query button

use crate::session::path::CommandPath;

pub type OptionRow = Vec<(String, String)>;
pub type Options = Vec<OptionRow>;

pub const DELETE_BUILTIN: &str = "_DEL";

const LINK_PREFIX: &str = "!!l(";
const SWITCH_PREFIX: &str = "!!s(";

/// Builds an option row from borrowed pairs.
pub fn row(items: &[(&str, &str)]) -> OptionRow {
    items.iter().map(|(l, v)| (l.to_string(), v.to_string())).collect()
}

/// Option value rendering a URL button.
pub fn link(url: &str) -> String {
    format!("{LINK_PREFIX}{url})")
}

/// Option value rendering a switch-inline-query button.
pub fn switch_inline(query: &str) -> String {
    format!("{SWITCH_PREFIX}{query})")
}

/// Standard "back / done" footer.
pub fn nav_row(back: &str) -> OptionRow {
    row(&[("👈 Back", back), ("👋 Done", DELETE_BUILTIN)])
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonAction {
    Callback(String),
    Url(String),
    SwitchInline(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub text: String,
    pub action: ButtonAction,
}

impl Button {
    pub fn callback(text: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            action: ButtonAction::Callback(data.into()),
        }
    }

    pub fn url(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            action: ButtonAction::Url(url.into()),
        }
    }

    pub fn data(&self) -> Option<&str> {
        match &self.action {
            ButtonAction::Callback(data) => Some(data.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    pub fn new(rows: Vec<Vec<Button>>) -> Self {
        Self { rows }
    }

    /// Renders `options`, prefixing every routed payload with `tags`
    /// (for example `user=42`). Empty rows are skipped.
    pub fn from_options(options: &Options, tags: &[(&str, &str)]) -> Self {
        let rows = options
            .iter()
            .filter(|row| !row.is_empty())
            .map(|row| {
                row.iter()
                    .map(|(label, value)| Self::button(label, value, tags))
                    .collect()
            })
            .collect();
        Self { rows }
    }

    fn button(label: &str, value: &str, tags: &[(&str, &str)]) -> Button {
        if let Some(url) = unwrap_code(value, LINK_PREFIX) {
            return Button::url(label, url);
        }
        if let Some(query) = unwrap_code(value, SWITCH_PREFIX) {
            return Button {
                text: label.to_string(),
                action: ButtonAction::SwitchInline(query.to_string()),
            };
        }
        Button::callback(label, CommandPath::encode(tags, value))
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(Vec::is_empty)
    }

    pub fn buttons(&self) -> impl Iterator<Item = &Button> {
        self.rows.iter().flatten()
    }

    /// First button whose label contains `text`.
    pub fn find(&self, text: &str) -> Option<&Button> {
        self.buttons().find(|b| b.text.contains(text))
    }
}

fn unwrap_code<'a>(value: &'a str, prefix: &str) -> Option<&'a str> {
    value.strip_prefix(prefix)?.strip_suffix(')')
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_from_options_tags_routed_buttons_only() {
        let options = vec![
            row(&[("Wallet", "account/wallet/")]),
            vec![],
            row(&[
                ("Site", link("https://example.org").as_str()),
                ("Share", switch_inline("hub").as_str()),
            ]),
            nav_row("/"),
        ];
        let keyboard = Keyboard::from_options(&options, &[("user", "5")]);

        assert_eq!(keyboard.rows.len(), 3);
        assert_eq!(keyboard.rows[0][0].data(), Some("user=5|account/wallet/"));
        assert_eq!(keyboard.rows[1][0].action, ButtonAction::Url("https://example.org".into()));
        assert_eq!(keyboard.rows[1][1].action, ButtonAction::SwitchInline("hub".into()));
        assert_eq!(keyboard.find("Done").and_then(Button::data), Some("user=5|_DEL"));
    }

    #[test]
    fn test_untagged_options_pass_through() {
        let keyboard = Keyboard::from_options(&vec![row(&[("A", "a/")])], &[]);
        assert_eq!(keyboard.rows[0][0].data(), Some("a/"));
        assert!(!keyboard.is_empty());
        assert!(Keyboard::default().is_empty());
    }
}
