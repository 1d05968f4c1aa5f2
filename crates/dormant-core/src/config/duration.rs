//! ISO-8601 duration parsing (`PnDTnHnMn.nS`).
//!
//! Accepts the day-time subset: an optional sign, `P`, an optional day
//! component, and an optional `T` section with hours, minutes, and
//! (fractional) seconds. Year, month, and week designators are rejected
//! because they have no fixed length.

use chrono::Duration;

use crate::error::AppError;
use crate::result::AppResult;

/// Parse an ISO-8601 duration such as `P60D`, `PT1H`, or `P1DT2H30M0.5S`.
pub fn parse_iso8601(input: &str) -> AppResult<Duration> {
    let text = input.trim().to_ascii_uppercase();
    let invalid = || AppError::validation(format!("Invalid ISO-8601 duration: '{input}'"));

    let (negative, rest) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text.as_str()),
    };
    let rest = rest.strip_prefix('P').ok_or_else(invalid)?;

    let (date_part, time_part) = match rest.split_once('T') {
        Some((date, time)) => {
            if time.is_empty() {
                return Err(invalid());
            }
            (date, Some(time))
        }
        None => (rest, None),
    };

    let mut total = Duration::zero();
    let mut seen_component = false;

    if !date_part.is_empty() {
        let days = date_part.strip_suffix('D').ok_or_else(invalid)?;
        let days: i64 = parse_integer(days).ok_or_else(invalid)?;
        total = Duration::try_days(days)
            .and_then(|d| total.checked_add(&d))
            .ok_or_else(invalid)?;
        seen_component = true;
    }

    if let Some(time) = time_part {
        let mut remaining = time;
        let mut last_unit = 0u8;
        while !remaining.is_empty() {
            let split = remaining
                .find(|c: char| c.is_ascii_alphabetic())
                .ok_or_else(invalid)?;
            let (number, tail) = remaining.split_at(split);
            let unit = tail.as_bytes()[0];
            remaining = &tail[1..];

            let order = match unit {
                b'H' => 1,
                b'M' => 2,
                b'S' => 3,
                _ => return Err(invalid()),
            };
            if order <= last_unit {
                return Err(invalid());
            }
            last_unit = order;

            let component = match unit {
                b'H' => parse_integer(number).and_then(Duration::try_hours),
                b'M' => parse_integer(number).and_then(Duration::try_minutes),
                _ => parse_seconds(number),
            }
            .ok_or_else(invalid)?;
            total = total.checked_add(&component).ok_or_else(invalid)?;
            seen_component = true;
        }
    }

    if !seen_component {
        return Err(invalid());
    }
    Ok(if negative { -total } else { total })
}

/// Parse a period given either as plain seconds (`"3600"`) or as an
/// ISO-8601 duration (`"PT1H"`).
pub fn parse_period(input: &str) -> AppResult<Duration> {
    let trimmed = input.trim();
    if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) {
        let seconds: i64 = trimmed
            .parse()
            .map_err(|_| AppError::validation(format!("Invalid period: '{input}'")))?;
        return Duration::try_seconds(seconds)
            .ok_or_else(|| AppError::validation(format!("Period out of range: '{input}'")));
    }
    parse_iso8601(trimmed)
}

fn parse_integer(text: &str) -> Option<i64> {
    let digits = text.strip_prefix(['-', '+']).unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

fn parse_seconds(text: &str) -> Option<Duration> {
    let (whole, fraction) = match text.split_once(['.', ',']) {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (text, None),
    };
    let negative = whole.starts_with('-');
    let seconds = Duration::try_seconds(parse_integer(whole)?)?;

    let nanos = match fraction {
        None => 0,
        Some(f) if f.is_empty() || f.len() > 9 || !f.bytes().all(|b| b.is_ascii_digit()) => {
            return None;
        }
        Some(f) => {
            let padded = format!("{f:0<9}");
            padded.parse::<i64>().ok()?
        }
    };
    let fractional = Duration::nanoseconds(nanos);
    if negative {
        seconds.checked_sub(&fractional)
    } else {
        seconds.checked_add(&fractional)
    }
}
