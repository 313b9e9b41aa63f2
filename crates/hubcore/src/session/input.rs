//! Free-text collectors built on message hooks.
//!
//! Each collector returns a hook to arm and a receiver that yields the parsed
//! value once the user sends something valid. Invalid input gets a hint and
//! the hook stays armed.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone};
use futures_util::FutureExt;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use tokio::time::Duration;

use super::hook::MessageHook;
use crate::core::error::{HubError, HubResult};
use crate::hub::Ctx;
use crate::transport::IncomingMessage;

pub const DURATION_HINT: &str = "Invalid duration. Accepted units are 'h', 'm' and 's'.";

pub const TIME_HINT: &str = "<pre>
Could not get a valid time from your message. Format should be like:

- 20 Jul 99              (Assumes 00:00 +0000)
- 20 Jul 99 07:00        (Assumes UTC)
- 20 Jul 99 07:00 BST    (British Summer Time)
- 20 Jul 99 07:00 +0100  (UTC+1)
</pre>";

/// Parses `24h`, `1h30m` or `3h 15m 30 s`. Whitespace is ignored.
pub fn parse_duration(input: &str) -> HubResult<Duration> {
    let compact: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Err(HubError::Validation("empty duration".into()));
    }

    let mut total = 0f64;
    let mut number = String::new();
    for c in compact.chars() {
        if c.is_ascii_digit() || c == '.' {
            number.push(c);
            continue;
        }

        let unit = match c {
            'h' => 3600.0,
            'm' => 60.0,
            's' => 1.0,
            other => return Err(HubError::Validation(format!("unknown unit {other:?}"))),
        };
        let value: f64 = number
            .parse()
            .map_err(|_| HubError::Validation(format!("missing number before {c:?}")))?;
        total += value * unit;
        number.clear();
    }

    if !number.is_empty() {
        return Err(HubError::Validation(format!("{number} has no unit")));
    }
    Duration::try_from_secs_f64(total).map_err(|_| HubError::Validation(format!("{input:?} is out of range")))
}

fn zone_offset(zone: &str) -> Option<FixedOffset> {
    let hours = match zone.to_ascii_uppercase().as_str() {
        "UTC" | "GMT" | "Z" => 0,
        "BST" | "CET" => 1,
        "CEST" => 2,
        "EST" => -5,
        "EDT" => -4,
        "PST" => -8,
        "PDT" => -7,
        numeric => return numeric_offset(numeric),
    };
    FixedOffset::east_opt(hours * 3600)
}

/// `+0100` / `-0530`
fn numeric_offset(raw: &str) -> Option<FixedOffset> {
    let (sign, digits) = if let Some(rest) = raw.strip_prefix('+') {
        (1, rest)
    } else {
        (-1, raw.strip_prefix('-')?)
    };
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Parses `20 Jul 99 [07:00 [BST|+0100]]`. Missing time is 00:00, missing
/// zone is UTC.
pub fn parse_time(input: &str) -> HubResult<DateTime<FixedOffset>> {
    let invalid = || HubError::Validation(format!("not a time: {input:?}"));
    let tokens: Vec<&str> = input.split_whitespace().collect();
    if tokens.len() < 3 || tokens.len() > 5 {
        return Err(invalid());
    }

    let date = NaiveDate::parse_from_str(&tokens[..3].join(" "), "%d %b %y").map_err(|_| invalid())?;
    let time = match tokens.get(3) {
        Some(raw) => NaiveTime::parse_from_str(raw, "%H:%M").map_err(|_| invalid())?,
        None => NaiveTime::MIN,
    };
    let offset = match tokens.get(4) {
        Some(zone) => zone_offset(zone).ok_or_else(invalid)?,
        None => FixedOffset::east_opt(0).ok_or_else(invalid)?,
    };

    offset
        .from_local_datetime(&date.and_time(time))
        .single()
        .ok_or_else(invalid)
}

/// Hook delivering the first well-formed value of `parse` through a channel.
fn collector<T, P>(lifespan: Duration, parse: P, hint: &'static str) -> (MessageHook<Ctx>, oneshot::Receiver<T>)
where
    T: Send + 'static,
    P: Fn(&str) -> HubResult<T> + Send + Sync + 'static,
{
    let (tx, rx) = oneshot::channel();
    let tx = Arc::new(Mutex::new(Some(tx)));
    let parse = Arc::new(parse);

    let hook = MessageHook::new(lifespan, move |ctx: Ctx, message: IncomingMessage| {
        let tx = Arc::clone(&tx);
        let parse = Arc::clone(&parse);
        async move {
            let parsed = message.body().map(|text| (*parse)(text));
            match parsed {
                Some(Ok(value)) => {
                    let sender = tx.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).take();
                    if let Some(sender) = sender {
                        // receiver may be gone; the input was still consumed
                        let _ = sender.send(value);
                    }
                    true
                }
                _ => {
                    if let Err(e) = ctx.send(hint, None).await {
                        log::warn!("Failed to send input hint to chat {}: {}", ctx.chat.id, e);
                    }
                    false
                }
            }
        }
        .boxed()
    });

    (hook, rx)
}

/// Collects a duration such as `1h30m`.
pub fn duration_hook(lifespan: Duration) -> (MessageHook<Ctx>, oneshot::Receiver<Duration>) {
    collector(lifespan, parse_duration, DURATION_HINT)
}

/// Collects a date-time such as `20 Jul 99 07:00 BST`.
pub fn time_hook(lifespan: Duration) -> (MessageHook<Ctx>, oneshot::Receiver<DateTime<FixedOffset>>) {
    collector(lifespan, parse_time, TIME_HINT)
}
