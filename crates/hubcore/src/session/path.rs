//! Button payload parsing.
//!
//! A payload is a `/`-delimited path with an optional tag prefix:
//!
//! - `account/wallet/` - no tags
//! - `cmd|stats/games/` - bare flag (`cmd` -> `cmd`)
//! - `user=158,cmd|games/cointoss/` - mixed tags
//!
//! Routers consume the path one segment at a time through a cursor that only
//! moves forward.

use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandPath {
    raw: String,
    cursor: usize,
    tags: HashMap<String, String>,
}

impl CommandPath {
    pub fn parse(input: &str) -> Self {
        let mut tags = HashMap::new();
        let mut raw = input;

        let first_segment_end = input.find('/').unwrap_or(input.len());
        if let Some(bar) = input[..first_segment_end].find('|') {
            if bar + 1 < input.len() {
                for tag in input[..bar].split(',').filter(|t| !t.is_empty()) {
                    match tag.split_once('=') {
                        Some((key, value)) => tags.insert(key.to_string(), value.to_string()),
                        None => tags.insert(tag.to_string(), tag.to_string()),
                    };
                }
                raw = &input[bar + 1..];
            }
        }

        Self {
            raw: raw.to_string(),
            cursor: 0,
            tags,
        }
    }

    /// Builds a payload string from tags and a path, the inverse of `parse`.
    pub fn encode(tags: &[(&str, &str)], path: &str) -> String {
        if tags.is_empty() {
            return path.to_string();
        }
        let prefix: Vec<String> = tags
            .iter()
            .map(|(k, v)| if k == v { k.to_string() } else { format!("{k}={v}") })
            .collect();
        format!("{}|{}", prefix.join(","), path)
    }

    /// The full path without tags, regardless of the cursor.
    pub fn path(&self) -> &str {
        &self.raw
    }

    /// The unconsumed remainder of the path.
    pub fn tail(&self) -> &str {
        &self.raw[self.cursor..]
    }

    /// The segment under the cursor. Empty at end-of-path or on an empty
    /// segment (`a//b`).
    pub fn get(&self) -> &str {
        let tail = self.tail();
        match tail.find('/') {
            Some(end) => &tail[..end],
            None => tail,
        }
    }

    /// Moves the cursor past the current segment. Idempotent at the end.
    pub fn next(&mut self) -> &mut Self {
        match self.tail().find('/') {
            Some(end) => self.cursor += end + 1,
            None => self.cursor = self.raw.len(),
        }
        self
    }

    /// Consumes the current segment and returns it.
    pub fn take(&mut self) -> String {
        let segment = self.get().to_string();
        self.next();
        segment
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.raw.len()
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    pub fn has_tag(&self, key: &str) -> bool {
        self.tags.contains_key(key)
    }

    pub fn tags(&self) -> &HashMap<String, String> {
        &self.tags
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_consumes_segments_in_order() {
        let mut path = CommandPath::parse("games/cointoss/heads/42/");
        let mut seen = Vec::new();
        while !path.is_exhausted() {
            seen.push(path.take());
        }
        assert_eq!(seen, vec!["games", "cointoss", "heads", "42"]);
        assert_eq!(path.get(), "");
        path.next();
        path.next();
        assert_eq!(path.get(), "");
        assert_eq!(path.tail(), "");
    }

    #[test]
    fn test_last_segment_without_trailing_slash() {
        let mut path = CommandPath::parse("account/wallet");
        assert_eq!(path.take(), "account");
        assert_eq!(path.get(), "wallet");
        path.next();
        assert!(path.is_exhausted());
    }

    #[test]
    fn test_tags_are_split_off() {
        let path = CommandPath::parse("user=5,cmd|a/b/");
        assert_eq!(path.tag("user"), Some("5"));
        assert_eq!(path.tag("cmd"), Some("cmd"));
        assert_eq!(path.path(), "a/b/");
        assert_eq!(path.get(), "a");
    }

    #[test]
    fn test_bar_after_first_segment_is_not_a_tag_prefix() {
        let path = CommandPath::parse("wallet/a|b");
        assert!(path.tags().is_empty());
        assert_eq!(path.path(), "wallet/a|b");
    }

    #[test]
    fn test_trailing_bar_is_kept() {
        let path = CommandPath::parse("cmd|");
        assert!(path.tags().is_empty());
        assert_eq!(path.get(), "cmd|");
    }

    #[test]
    fn test_empty_segment_reads_as_empty() {
        let mut path = CommandPath::parse("a//b");
        path.next();
        assert_eq!(path.get(), "");
        path.next();
        assert_eq!(path.get(), "b");
    }

    #[test]
    fn test_encode_round_trips_tags() {
        let raw = CommandPath::encode(&[("user", "7"), ("cmd", "cmd")], "stats/");
        assert_eq!(raw, "user=7,cmd|stats/");
        let path = CommandPath::parse(&raw);
        assert_eq!(path.tag("user"), Some("7"));
        assert!(path.has_tag("cmd"));
        assert_eq!(CommandPath::encode(&[], "x/"), "x/");
    }
}
